//! Synchronous command facade over the shared connection.
//!
//! One connection carries both command traffic and unsolicited
//! notifications. Commands have no correlation id, so the console allows
//! exactly one outstanding command: the whole transaction (housekeeping,
//! write, wait) runs under a single mutex, and the next caller blocks until
//! the previous one has its answer, its timeout or its write failure.
//!
//! Issuing a command from a listener callback on the network thread cannot
//! succeed: that thread is the one that would deliver the response, so the
//! call ends in [`CommandError::Timeout`].

mod command;
mod error;
mod slot;

use std::sync::Mutex;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use indexmap::IndexSet;
use serde_json::Value;
use tracing::{debug, warn};

pub use command::Command;
pub use error::CommandError;
pub use slot::ResponseFeeder;

use self::slot::{ResponseSlot, pending_response};
use crate::decoder::Document;
use crate::job::{JobSpecification, ResultId};
use crate::transport::LineSink;

/// Tracing target for console operations.
pub(crate) const CONSOLE_TARGET: &str = "phaser_client::console";

/// How long a command waits for its response unless configured otherwise.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A successful (`"response": "ok"`) server answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    command: &'static str,
    document: Document,
}

impl Response {
    /// Full response document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Consumes the response, yielding its document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    fn required(&self, field: &'static str) -> Result<&Value, CommandError> {
        self.document
            .get(field)
            .filter(|value| !value.is_null())
            .ok_or(CommandError::MissingField {
                command: self.command,
                field,
            })
    }

    fn invalid(&self, field: &'static str) -> CommandError {
        CommandError::InvalidField {
            command: self.command,
            field,
        }
    }
}

/// Operations offered by a phaser server.
///
/// Implementors provide [`send_command`](Self::send_command); the typed
/// operations build on it.
pub trait CommandConsole: Send + Sync {
    /// Sends one command and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the command cannot be written, when no
    /// response arrives in time, or when the server rejects it.
    fn send_command(&self, command: &Command) -> Result<Response, CommandError>;

    /// Cavities known to the server, in server order without duplicates.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command), or when the response
    /// lacks a `cavities` array of strings.
    fn cavities(&self) -> Result<IndexSet<String>, CommandError> {
        let response = self.send_command(&Command::Cavities)?;
        let Value::Array(items) = response.required("cavities")? else {
            return Err(response.invalid("cavities"));
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| response.invalid("cavities"))
            })
            .collect()
    }

    /// Applies the corrections recorded in the given results.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn apply_corrections(&self, results: &[ResultId]) -> Result<(), CommandError> {
        self.send_command(&Command::ApplyCorrections {
            results: results.to_vec(),
        })
        .map(drop)
    }

    /// Starts a job.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn start(&self, job: &JobSpecification) -> Result<(), CommandError> {
        self.send_command(&Command::Start { job: job.clone() })
            .map(drop)
    }

    /// Pauses the running job.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn pause(&self) -> Result<(), CommandError> {
        self.send_command(&Command::Pause).map(drop)
    }

    /// Resumes a paused job.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn resume(&self) -> Result<(), CommandError> {
        self.send_command(&Command::Resume).map(drop)
    }

    /// Stops the running job.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn stop(&self) -> Result<(), CommandError> {
        self.send_command(&Command::Stop).map(drop)
    }

    /// Skips the current cavity.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command).
    fn skip(&self) -> Result<(), CommandError> {
        self.send_command(&Command::Skip).map(drop)
    }

    /// Server name and version.
    ///
    /// # Errors
    ///
    /// Fails like [`send_command`](Self::send_command), or when the response
    /// lacks a string `version`.
    fn server_version(&self) -> Result<String, CommandError> {
        let response = self.send_command(&Command::Version)?;
        response
            .required("version")?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| response.invalid("version"))
    }
}

/// [`CommandConsole`] speaking newline-delimited JSON over a [`LineSink`].
#[derive(Debug)]
pub struct JsonCommandConsole<S> {
    sink: S,
    slot: Mutex<ResponseSlot>,
    timeout: Duration,
}

impl<S: LineSink> JsonCommandConsole<S> {
    /// Creates a console writing to `sink`.
    ///
    /// The returned feeder must be registered as a response listener on the
    /// dispatcher reading the same connection.
    #[must_use]
    pub fn new(sink: S, timeout: Duration) -> (Self, ResponseFeeder) {
        let (slot, feeder) = pending_response();
        let console = Self {
            sink,
            slot: Mutex::new(slot),
            timeout,
        };
        (console, feeder)
    }

    /// Response timeout applied to every command.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: LineSink> CommandConsole for JsonCommandConsole<S> {
    fn send_command(&self, command: &Command) -> Result<Response, CommandError> {
        let name = command.name();
        let line = serde_json::to_string(command).map_err(|source| CommandError::Serialise {
            command: name,
            source,
        })?;

        let slot = self
            .slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let discarded = slot.drain_stray();
        if discarded > 0 {
            warn!(
                target: CONSOLE_TARGET,
                command = name,
                discarded,
                "recovered from unsolicited responses before sending"
            );
        }

        let awaiting = slot.begin();
        debug!(target: CONSOLE_TARGET, command = name, "sending command");
        self.sink
            .send_line(&line)
            .map_err(|source| CommandError::Send {
                command: name,
                source,
            })?;

        let outcome = slot.wait(self.timeout);
        drop(awaiting);
        let document = outcome.map_err(|wait_error| match wait_error {
            RecvTimeoutError::Timeout => CommandError::Timeout {
                command: name,
                timeout: self.timeout,
            },
            RecvTimeoutError::Disconnected => CommandError::Interrupted { command: name },
        })?;

        classify(name, document)
    }
}

fn classify(command: &'static str, document: Document) -> Result<Response, CommandError> {
    if document.get("response").and_then(Value::as_str) == Some("ok") {
        debug!(target: CONSOLE_TARGET, command, "command accepted");
        return Ok(Response { command, document });
    }
    let message = document
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned);
    debug!(
        target: CONSOLE_TARGET,
        command,
        reason = message.as_deref().unwrap_or_default(),
        "command rejected"
    );
    Err(CommandError::Rejected { command, message })
}
