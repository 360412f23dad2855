//! Blocking newline-delimited TCP transport.
//!
//! Outbound lines go through a [`LineSink`]; inbound lines are read on a
//! dedicated thread and handed to a [`ProtocolDispatcher`](crate::ProtocolDispatcher).

mod errors;
mod reader;
mod tcp;

use std::io;
use std::sync::Arc;

pub use errors::{ConnectError, TransportError};
pub use reader::{ReaderExit, ReaderHandle, read_lines, spawn_reader};
pub use tcp::{TcpLineWriter, connect};

/// Tracing target for transport activity.
pub(crate) const TRANSPORT_TARGET: &str = "phaser_client::transport";

/// Destination for outbound protocol lines.
pub trait LineSink: Send + Sync {
    /// Writes `line` followed by a newline and flushes it.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the line cannot be written.
    fn send_line(&self, line: &str) -> io::Result<()>;
}

impl<T: LineSink + ?Sized> LineSink for Arc<T> {
    fn send_line(&self, line: &str) -> io::Result<()> {
        (**self).send_line(line)
    }
}
