//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use phaser_client::transport::TransportError;
use phaser_client::{CommandError, SessionError, ValidationError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to open session: {0}")]
    Session(#[from] SessionError),
    #[error("{command} failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: CommandError,
    },
    #[error("invalid job: {0}")]
    InvalidJob(#[from] ValidationError),
    #[error("unknown cavity {name}")]
    UnknownCavity { name: String },
    #[error("connection to the server failed: {0}")]
    Connection(#[source] TransportError),
    #[error("connection reader stopped unexpectedly")]
    ReaderPanicked,
    #[error("failed to write output: {0}")]
    WriteOutput(#[from] io::Error),
}

impl From<CommandError> for AppError {
    fn from(source: CommandError) -> Self {
        Self::Command {
            command: source.command(),
            source,
        }
    }
}
