//! Command failures.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Why a command did not complete.
///
/// Every variant renders a message suitable for showing to an operator.
/// Nothing is retried by the console.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not be written to the connection.
    #[error("unable to send '{command}' command: {source}")]
    Send {
        /// Wire name of the command.
        command: &'static str,
        /// Transport failure.
        #[source]
        source: io::Error,
    },

    /// No response arrived within the response timeout.
    #[error("no response received for '{command}' command within {timeout:?}")]
    Timeout {
        /// Wire name of the command.
        command: &'static str,
        /// How long the console waited.
        timeout: Duration,
    },

    /// The server answered with something other than `ok`.
    #[error("{}", .message.as_deref().unwrap_or("server rejected the command"))]
    Rejected {
        /// Wire name of the command.
        command: &'static str,
        /// Explanation supplied by the server.
        message: Option<String>,
    },

    /// The connection closed while waiting for the response.
    #[error("no response received for '{command}' command: connection closed")]
    Interrupted {
        /// Wire name of the command.
        command: &'static str,
    },

    /// A successful response lacks a required field.
    #[error("response to '{command}' command is missing '{field}'")]
    MissingField {
        /// Wire name of the command.
        command: &'static str,
        /// Absent field.
        field: &'static str,
    },

    /// A successful response holds a field of the wrong shape.
    #[error("response to '{command}' command has an invalid '{field}'")]
    InvalidField {
        /// Wire name of the command.
        command: &'static str,
        /// Malformed field.
        field: &'static str,
    },

    /// The command could not be encoded.
    #[error("unable to encode '{command}' command")]
    Serialise {
        /// Wire name of the command.
        command: &'static str,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl CommandError {
    /// Wire name of the failed command.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Send { command, .. }
            | Self::Timeout { command, .. }
            | Self::Rejected { command, .. }
            | Self::Interrupted { command }
            | Self::MissingField { command, .. }
            | Self::InvalidField { command, .. }
            | Self::Serialise { command, .. } => *command,
        }
    }

    /// Explanation supplied by the server when it rejected the command.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether no response arrived, by timeout or by disconnection.
    #[must_use]
    pub const fn is_no_response(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Interrupted { .. })
    }
}
