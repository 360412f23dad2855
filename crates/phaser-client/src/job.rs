//! Job specifications and result identifiers exchanged with the server.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest maximum momentum error (dp/p) the server accepts.
pub const MIN_MOMENTUM_ERROR: f32 = 0.000_000_1;

/// Largest maximum momentum error (dp/p) the server accepts.
pub const MAX_MOMENTUM_ERROR: f32 = 1.0;

/// Immutable job parameters as understood by the phaser server.
///
/// Cavities form an ordered set: insertion order is execution order and
/// repeated names collapse onto their first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "JobWire", from = "JobWire")]
pub struct JobSpecification {
    correct: bool,
    continuous: bool,
    max_phase_error: f32,
    max_momentum_error: f32,
    kick_samples: i32,
    cavities: IndexSet<String>,
}

impl JobSpecification {
    /// Creates a specification from already validated values.
    #[must_use]
    pub fn new<I, S>(
        correct: bool,
        continuous: bool,
        max_phase_error: f32,
        max_momentum_error: f32,
        kick_samples: i32,
        cavities: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            correct,
            continuous,
            max_phase_error,
            max_momentum_error,
            kick_samples,
            cavities: cavities.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether corrections are applied, as opposed to measuring only.
    #[must_use]
    pub const fn correct(&self) -> bool {
        self.correct
    }

    /// Whether the job loops over its cavities until stopped.
    #[must_use]
    pub const fn continuous(&self) -> bool {
        self.continuous
    }

    /// Initial maximum phase angle error.
    #[must_use]
    pub const fn max_phase_error(&self) -> f32 {
        self.max_phase_error
    }

    /// Initial maximum momentum error (dp/p).
    #[must_use]
    pub const fn max_momentum_error(&self) -> f32 {
        self.max_momentum_error
    }

    /// Number of samples per kick.
    #[must_use]
    pub const fn kick_samples(&self) -> i32 {
        self.kick_samples
    }

    /// Cavities in execution order.
    #[must_use]
    pub const fn cavities(&self) -> &IndexSet<String> {
        &self.cavities
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct JobWire {
    correct: bool,
    continuous: bool,
    max_phase_error: f32,
    max_momentum_error: f32,
    kick_samples: i32,
    cavities: Vec<String>,
}

impl From<JobSpecification> for JobWire {
    fn from(job: JobSpecification) -> Self {
        Self {
            correct: job.correct,
            continuous: job.continuous,
            max_phase_error: job.max_phase_error,
            max_momentum_error: job.max_momentum_error,
            kick_samples: job.kick_samples,
            cavities: job.cavities.into_iter().collect(),
        }
    }
}

impl From<JobWire> for JobSpecification {
    fn from(wire: JobWire) -> Self {
        Self::new(
            wire.correct,
            wire.continuous,
            wire.max_phase_error,
            wire.max_momentum_error,
            wire.kick_samples,
            wire.cavities,
        )
    }
}

/// Raw job parameters as typed by an operator.
#[derive(Debug, Clone, Default)]
pub struct JobInput {
    /// Apply corrections rather than only measuring.
    pub correct: bool,
    /// Loop over the cavities until stopped.
    pub continuous: bool,
    /// Maximum phase error text.
    pub max_phase_error: String,
    /// Maximum momentum error text.
    pub max_momentum_error: String,
    /// Samples per kick text.
    pub kick_samples: String,
    /// Selected cavity names, in execution order.
    pub cavities: Vec<String>,
}

/// Operator-facing names of validated job fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    /// Maximum phase error.
    MaxPhaseError,
    /// Maximum momentum error.
    MaxMomentumError,
    /// Samples per kick.
    KickSamples,
}

impl fmt::Display for JobField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MaxPhaseError => "Max Phase Error",
            Self::MaxMomentumError => "Max Momentum Error",
            Self::KickSamples => "Kick Samples",
        };
        formatter.write_str(label)
    }
}

/// Reasons operator input cannot become a [`JobSpecification`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A required field was left blank.
    #[error("{field} must not be empty")]
    Empty {
        /// The blank field.
        field: JobField,
    },
    /// A field that must be a finite number was not.
    #[error("{field} must be a number")]
    NotANumber {
        /// The offending field.
        field: JobField,
    },
    /// A field that must be a whole number was not.
    #[error("{field} must be an integer")]
    NotAnInteger {
        /// The offending field.
        field: JobField,
    },
    /// The momentum error lies outside the accepted range.
    #[error("Max Momentum Error must be between {MIN_MOMENTUM_ERROR} and {MAX_MOMENTUM_ERROR}")]
    MomentumErrorOutOfRange {
        /// The rejected value.
        value: f32,
    },
    /// No cavities were selected.
    #[error("No cavities have been selected")]
    NoCavities,
}

impl TryFrom<JobInput> for JobSpecification {
    type Error = ValidationError;

    fn try_from(input: JobInput) -> Result<Self, Self::Error> {
        let max_phase_error = parse_float(&input.max_phase_error, JobField::MaxPhaseError)?;
        let max_momentum_error =
            parse_float(&input.max_momentum_error, JobField::MaxMomentumError)?;
        if !(MIN_MOMENTUM_ERROR..=MAX_MOMENTUM_ERROR).contains(&max_momentum_error) {
            return Err(ValidationError::MomentumErrorOutOfRange {
                value: max_momentum_error,
            });
        }
        let kick_samples = parse_integer(&input.kick_samples, JobField::KickSamples)?;
        if input.cavities.is_empty() {
            return Err(ValidationError::NoCavities);
        }

        Ok(Self::new(
            input.correct,
            input.continuous,
            max_phase_error,
            max_momentum_error,
            kick_samples,
            input.cavities,
        ))
    }
}

fn require_text(text: &str, field: JobField) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

fn parse_float(text: &str, field: JobField) -> Result<f32, ValidationError> {
    require_text(text, field)?
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(ValidationError::NotANumber { field })
}

fn parse_integer(text: &str, field: JobField) -> Result<i32, ValidationError> {
    require_text(text, field)?
        .parse::<i32>()
        .map_err(|_| ValidationError::NotAnInteger { field })
}

/// Identifier of a stored phasing result, used by `apply-corrections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(u64);

impl ResultId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResultId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ResultId {
    type Err = ParseIntError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input.trim().parse().map(Self)
    }
}
