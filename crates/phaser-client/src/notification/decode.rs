//! Document-to-notification decoding.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{JobNotification, JobState, Notification};
use crate::decoder::{Document, json_type_name};
use crate::job::JobSpecification;
use crate::timestamp::Timestamp;

/// Errors raised while decoding a notification document.
#[derive(Debug, Error)]
pub enum NotificationDecodeError {
    /// The document has no `notification` field.
    #[error("document carries no notification type")]
    MissingType,

    /// The `notification` value names no known notification.
    #[error("unrecognised notification type '{kind}'")]
    UnknownType {
        /// The unrecognised type name.
        kind: String,
    },

    /// A field has the wrong JSON type.
    #[error("field '{field}' should be {expected}, found {found}")]
    WrongType {
        /// Field name.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
        /// JSON type that was found.
        found: &'static str,
    },

    /// An integer field is fractional or does not fit its target type.
    #[error("field '{field}' holds {value}, which is not a valid integer here")]
    InvalidInteger {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: serde_json::Number,
    },

    /// A timestamp field could not be parsed.
    #[error("field '{field}' is not a valid timestamp")]
    InvalidTimestamp {
        /// Field name.
        field: &'static str,
        /// Parser error.
        #[source]
        source: time::error::Parse,
    },

    /// The embedded job object is incomplete or malformed.
    #[error("invalid job description")]
    InvalidJob(#[source] serde_json::Error),
}

impl NotificationDecodeError {
    /// Whether the error only reports an unknown notification type.
    #[must_use]
    pub const fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType { .. })
    }
}

/// Decodes a document tagged with a `notification` field.
///
/// # Errors
///
/// Returns [`NotificationDecodeError::UnknownType`] for type names outside
/// the protocol and other variants for fields that cannot be decoded.
pub fn decode_notification(document: &Document) -> Result<Notification, NotificationDecodeError> {
    let fields = Fields(document);
    let kind = fields
        .string("notification")?
        .ok_or(NotificationDecodeError::MissingType)?;

    match kind.as_str() {
        "status" => Ok(Notification::Status {
            message: fields.string("message")?,
            error: fields.boolean("error")?,
        }),
        "job" => decode_job(fields).map(Notification::Job),
        "paused" => Ok(Notification::Paused {
            paused: fields.boolean("paused")?,
        }),
        "loop" => Ok(Notification::Loop {
            count: fields.int("count")?,
        }),
        "cavity" => Ok(Notification::Cavity {
            name: fields.string("name")?,
            start: fields.timestamp("start")?,
        }),
        "progress" => Ok(Notification::Progress {
            value: fields.int("value")?,
            label: fields.string("label")?,
        }),
        _ => Err(NotificationDecodeError::UnknownType { kind }),
    }
}

fn decode_job(fields: Fields<'_>) -> Result<JobNotification, NotificationDecodeError> {
    // Sibling fields are ignored entirely when there is no job.
    let Some(job) = fields.present("job") else {
        return Ok(JobNotification::idle());
    };
    let job = JobSpecification::deserialize(job).map_err(NotificationDecodeError::InvalidJob)?;

    Ok(JobNotification::running(JobState {
        job,
        job_id: fields.long("job-id")?,
        start: fields.timestamp("start")?,
        paused: fields.boolean("paused")?,
        loop_count: fields.int("loop")?,
        cavity: fields.string("cavity")?,
        cavity_start: fields.timestamp("cavity-start")?,
        progress: fields.int("progress")?,
        label: fields.string("label")?,
    }))
}

#[derive(Clone, Copy)]
struct Fields<'a>(&'a Document);

impl<'a> Fields<'a> {
    fn present(self, field: &'static str) -> Option<&'a Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    fn string(self, field: &'static str) -> Result<Option<String>, NotificationDecodeError> {
        self.present(field)
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| wrong_type(field, "a string", value))
            })
            .transpose()
    }

    fn boolean(self, field: &'static str) -> Result<Option<bool>, NotificationDecodeError> {
        self.present(field)
            .map(|value| {
                value
                    .as_bool()
                    .ok_or_else(|| wrong_type(field, "a boolean", value))
            })
            .transpose()
    }

    fn long(self, field: &'static str) -> Result<Option<i64>, NotificationDecodeError> {
        self.present(field)
            .map(|value| {
                let Value::Number(number) = value else {
                    return Err(wrong_type(field, "an integer", value));
                };
                number
                    .as_i64()
                    .ok_or_else(|| NotificationDecodeError::InvalidInteger {
                        field,
                        value: number.clone(),
                    })
            })
            .transpose()
    }

    fn int(self, field: &'static str) -> Result<Option<i32>, NotificationDecodeError> {
        let Some(wide) = self.long(field)? else {
            return Ok(None);
        };
        i32::try_from(wide)
            .map(Some)
            .map_err(|_| NotificationDecodeError::InvalidInteger {
                field,
                value: wide.into(),
            })
    }

    fn timestamp(self, field: &'static str) -> Result<Option<Timestamp>, NotificationDecodeError> {
        self.string(field)?
            .map(|text| {
                Timestamp::parse(&text)
                    .map_err(|source| NotificationDecodeError::InvalidTimestamp { field, source })
            })
            .transpose()
    }
}

fn wrong_type(field: &'static str, expected: &'static str, value: &Value) -> NotificationDecodeError {
    NotificationDecodeError::WrongType {
        field,
        expected,
        found: json_type_name(value),
    }
}
