//! Outgoing command documents.

use serde::Serialize;

use crate::job::{JobSpecification, ResultId};

/// A command understood by the phaser server.
///
/// Serialises to a single JSON object tagged by its `command` field, for
/// example `{"command":"apply-corrections","results":[4,9]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Query the server version.
    Version,
    /// Query the cavities the server can phase.
    Cavities,
    /// Start a new job.
    Start {
        /// Job to run.
        job: JobSpecification,
    },
    /// Pause the running job.
    Pause,
    /// Resume a paused job.
    Resume,
    /// Stop the running job.
    Stop,
    /// Skip the current cavity.
    Skip,
    /// Apply the corrections recorded in stored results.
    ApplyCorrections {
        /// Results whose corrections are applied.
        results: Vec<ResultId>,
    },
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Cavities => "cavities",
            Self::Start { .. } => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Skip => "skip",
            Self::ApplyCorrections { .. } => "apply-corrections",
        }
    }
}
