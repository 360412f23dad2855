//! Error types for the line transport.

use std::io;
use std::str::Utf8Error;

use thiserror::Error;

use crate::decoder::DecodeError;

/// Errors raised while opening a connection to the server.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The host name could not be resolved.
    #[error("failed to resolve phaser server {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The TCP connection could not be established in time.
    #[error("failed to connect to phaser server {endpoint}: {source}")]
    Connect {
        /// Endpoint being connected.
        endpoint: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// The connected socket could not be configured.
    #[error("failed to configure connection to {endpoint}: {source}")]
    Configure {
        /// Connected endpoint.
        endpoint: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
}

/// Errors that end the reader loop.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from the socket failed.
    #[error("failed to read from phaser server: {0}")]
    Io(#[from] io::Error),
    /// A line exceeded the frame limit.
    #[error("server sent a line longer than {limit} bytes")]
    FrameTooLong {
        /// Configured frame limit in bytes.
        limit: usize,
    },
    /// A line was not valid UTF-8.
    #[error("server sent a line that is not valid UTF-8")]
    InvalidUtf8(#[from] Utf8Error),
    /// A line was not a JSON object.
    #[error("server sent an undecodable line")]
    Decode(#[from] DecodeError),
}
