//! Typed server notifications.
//!
//! Notifications are pushed by the server without being asked for. Every
//! field is optional on the wire and stays optional here; absence is never
//! replaced by a sentinel because zero progress and empty labels are both
//! meaningful values.
//!
//! Job notifications are the exception to independent optionality: the
//! job-scoped fields only exist alongside a job. [`JobNotification`] stores
//! them inside the optional [`JobState`], so an idle notification cannot
//! carry a stale job id, cavity or progress value.

mod decode;

use std::fmt;

pub use decode::{NotificationDecodeError, decode_notification};

use crate::job::JobSpecification;
use crate::timestamp::Timestamp;

/// Message sent when a document is neither a response nor a notification.
pub const UNRECOGNISED_MESSAGE: &str = "Server protocol not understood (unrecognized message)";

/// Message sent when a notification could not be decoded.
pub const UNPARSEABLE_MESSAGE: &str =
    "Server protocol not understood (unable to parse server message)";

/// One decoded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Free-form status text, optionally flagged as an error.
    Status {
        /// Status text.
        message: Option<String>,
        /// Whether the status reports a failure.
        error: Option<bool>,
    },
    /// Snapshot of the current job, or of the absence of one.
    Job(JobNotification),
    /// The running job was paused or resumed.
    Paused {
        /// New pause state.
        paused: Option<bool>,
    },
    /// A continuous job started another pass over its cavities.
    Loop {
        /// Pass number.
        count: Option<i32>,
    },
    /// The job moved on to another cavity.
    Cavity {
        /// Cavity name.
        name: Option<String>,
        /// When work on the cavity began.
        start: Option<Timestamp>,
    },
    /// Progress through the current cavity.
    Progress {
        /// Percentage complete, nominally `0..=100`.
        value: Option<i32>,
        /// Description of the current step.
        label: Option<String>,
    },
}

impl Notification {
    /// Builds an error status with the given message.
    #[must_use]
    pub fn status_error(message: impl Into<String>) -> Self {
        Self::Status {
            message: Some(message.into()),
            error: Some(true),
        }
    }

    /// Wire name of the notification type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Job(_) => "job",
            Self::Paused { .. } => "paused",
            Self::Loop { .. } => "loop",
            Self::Cavity { .. } => "cavity",
            Self::Progress { .. } => "progress",
        }
    }
}

/// Job notification payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobNotification {
    state: Option<JobState>,
}

/// The job and its job-scoped fields, present only while a job exists.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    /// The job being executed.
    pub job: JobSpecification,
    /// Server-assigned job identifier.
    pub job_id: Option<i64>,
    /// When the job started.
    pub start: Option<Timestamp>,
    /// Whether the job is paused.
    pub paused: Option<bool>,
    /// Current pass of a continuous job.
    pub loop_count: Option<i32>,
    /// Cavity being worked on.
    pub cavity: Option<String>,
    /// When work on the cavity began.
    pub cavity_start: Option<Timestamp>,
    /// Percentage complete for the current cavity.
    pub progress: Option<i32>,
    /// Description of the current step.
    pub label: Option<String>,
}

impl JobState {
    /// Creates a state for `job` with every job-scoped field unset.
    #[must_use]
    pub const fn new(job: JobSpecification) -> Self {
        Self {
            job,
            job_id: None,
            start: None,
            paused: None,
            loop_count: None,
            cavity: None,
            cavity_start: None,
            progress: None,
            label: None,
        }
    }
}

impl JobNotification {
    /// A notification reporting that no job is running.
    #[must_use]
    pub const fn idle() -> Self {
        Self { state: None }
    }

    /// A notification describing a running job.
    #[must_use]
    pub const fn running(state: JobState) -> Self {
        Self { state: Some(state) }
    }

    /// Full job state, when a job exists.
    #[must_use]
    pub const fn state(&self) -> Option<&JobState> {
        self.state.as_ref()
    }

    /// The job specification.
    #[must_use]
    pub fn job(&self) -> Option<&JobSpecification> {
        self.state.as_ref().map(|state| &state.job)
    }

    /// Server-assigned job identifier.
    #[must_use]
    pub fn job_id(&self) -> Option<i64> {
        self.state.as_ref().and_then(|state| state.job_id)
    }

    /// Job start time.
    #[must_use]
    pub fn start(&self) -> Option<Timestamp> {
        self.state.as_ref().and_then(|state| state.start)
    }

    /// Whether the job is paused.
    #[must_use]
    pub fn paused(&self) -> Option<bool> {
        self.state.as_ref().and_then(|state| state.paused)
    }

    /// Current pass of a continuous job.
    #[must_use]
    pub fn loop_count(&self) -> Option<i32> {
        self.state.as_ref().and_then(|state| state.loop_count)
    }

    /// Cavity being worked on.
    #[must_use]
    pub fn cavity(&self) -> Option<&str> {
        self.state.as_ref().and_then(|state| state.cavity.as_deref())
    }

    /// When work on the current cavity began.
    #[must_use]
    pub fn cavity_start(&self) -> Option<Timestamp> {
        self.state.as_ref().and_then(|state| state.cavity_start)
    }

    /// Progress through the current cavity.
    #[must_use]
    pub fn progress(&self) -> Option<i32> {
        self.state.as_ref().and_then(|state| state.progress)
    }

    /// Description of the current step.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.state.as_ref().and_then(|state| state.label.as_deref())
    }
}

struct Optional<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Optional<'_, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = self.0 else {
            return formatter.write_str("-");
        };
        fmt::Display::fmt(value, formatter)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { message, error } => write!(
                formatter,
                "status message={} error={}",
                Optional(message),
                Optional(error)
            ),
            Self::Job(notification) => fmt::Display::fmt(notification, formatter),
            Self::Paused { paused } => write!(formatter, "paused {}", Optional(paused)),
            Self::Loop { count } => write!(formatter, "loop {}", Optional(count)),
            Self::Cavity { name, start } => write!(
                formatter,
                "cavity name={} start={}",
                Optional(name),
                Optional(start)
            ),
            Self::Progress { value, label } => write!(
                formatter,
                "progress value={} label={}",
                Optional(value),
                Optional(label)
            ),
        }
    }
}

impl fmt::Display for JobNotification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(state) = &self.state else {
            return formatter.write_str("job none");
        };
        write!(
            formatter,
            "job id={} start={} paused={} loop={} cavity={} cavity-start={} progress={} label={} cavities={}",
            Optional(&state.job_id),
            Optional(&state.start),
            Optional(&state.paused),
            Optional(&state.loop_count),
            Optional(&state.cavity),
            Optional(&state.cavity_start),
            Optional(&state.progress),
            Optional(&state.label),
            state.job.cavities().len()
        )
    }
}
