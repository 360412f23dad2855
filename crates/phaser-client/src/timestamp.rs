//! Date-time values carried by job and cavity notifications.
//!
//! The server sends ISO-8601 date-times, usually without a UTC offset
//! (`2023-09-12T10:26:21`). When an offset is present it is kept; when it is
//! absent the value stays a wall-clock reading and no zone is invented.

use std::fmt;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// A parsed server timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    datetime: PrimitiveDateTime,
    offset: Option<UtcOffset>,
}

impl Timestamp {
    /// Parses an ISO-8601 date-time with optional fractional seconds and
    /// optional UTC offset.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the text matches neither form.
    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        if let Ok(zoned) = OffsetDateTime::parse(text, &Rfc3339) {
            return Ok(Self {
                datetime: PrimitiveDateTime::new(zoned.date(), zoned.time()),
                offset: Some(zoned.offset()),
            });
        }

        let datetime = PrimitiveDateTime::parse(
            text,
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
            ),
        )?;
        Ok(Self {
            datetime,
            offset: None,
        })
    }

    /// Wall-clock date and time as sent by the server.
    #[must_use]
    pub const fn datetime(&self) -> PrimitiveDateTime {
        self.datetime
    }

    /// UTC offset, when the server supplied one.
    #[must_use]
    pub const fn offset(&self) -> Option<UtcOffset> {
        self.offset
    }

    /// Resolves to an absolute instant, using `fallback` when the server did
    /// not supply an offset.
    #[must_use]
    pub fn to_offset_datetime(&self, fallback: UtcOffset) -> OffsetDateTime {
        self.datetime.assume_offset(self.offset.unwrap_or(fallback))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self.offset {
            Some(offset) => self.datetime.assume_offset(offset).format(&Rfc3339),
            None if self.datetime.nanosecond() == 0 => self
                .datetime
                .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")),
            None => self.datetime.format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
            )),
        }
        .map_err(|_| fmt::Error)?;
        formatter.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use time::macros::{datetime, offset};

    use super::*;

    #[rstest]
    fn parses_local_datetime() {
        let timestamp = Timestamp::parse("2023-09-12T10:26:21").expect("timestamp should parse");

        assert_eq!(timestamp.datetime(), datetime!(2023-09-12 10:26:21));
        assert_eq!(timestamp.offset(), None);
        assert_eq!(timestamp.to_string(), "2023-09-12T10:26:21");
    }

    #[rstest]
    fn parses_fractional_seconds() {
        let timestamp =
            Timestamp::parse("2014-06-25T13:30:00.250").expect("timestamp should parse");

        assert_eq!(timestamp.datetime(), datetime!(2014-06-25 13:30:00.250));
    }

    #[rstest]
    #[case("2023-09-12T10:26:21Z", offset!(UTC))]
    #[case("2023-09-12T10:26:21-04:00", offset!(-4))]
    fn keeps_supplied_offsets(#[case] text: &str, #[case] expected: UtcOffset) {
        let timestamp = Timestamp::parse(text).expect("timestamp should parse");

        assert_eq!(timestamp.offset(), Some(expected));
        assert_eq!(timestamp.datetime(), datetime!(2023-09-12 10:26:21));
    }

    #[rstest]
    fn resolves_missing_offset_with_fallback() {
        let timestamp = Timestamp::parse("2023-09-12T10:26:21").expect("timestamp should parse");

        assert_eq!(
            timestamp.to_offset_datetime(offset!(+1)),
            datetime!(2023-09-12 10:26:21 +1)
        );
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2023-13-12T10:26:21")]
    #[case("2023-09-12 10:26")]
    fn rejects_malformed_text(#[case] text: &str) {
        assert!(Timestamp::parse(text).is_err());
    }
}
