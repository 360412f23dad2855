//! TCP connection set-up and the outbound writer.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Mutex;
use std::time::Duration;

use phaser_config::ServerEndpoint;
use tracing::{debug, info};

use super::{ConnectError, LineSink, TRANSPORT_TARGET};

/// Opens a TCP connection to `endpoint`, failing after `timeout`.
///
/// The same timeout bounds every subsequent write on the stream.
///
/// # Errors
///
/// Returns [`ConnectError`] when the host cannot be resolved, the connection
/// cannot be established, or the socket cannot be configured.
pub fn connect(endpoint: &ServerEndpoint, timeout: Duration) -> Result<TcpStream, ConnectError> {
    let addr = endpoint.resolve().map_err(|source| ConnectError::Resolve {
        endpoint: endpoint.to_string(),
        source,
    })?;
    let stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|source| ConnectError::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
    let configure = |source| ConnectError::Configure {
        endpoint: endpoint.to_string(),
        source,
    };
    stream.set_nodelay(true).map_err(configure)?;
    stream.set_write_timeout(Some(timeout)).map_err(configure)?;
    info!(
        target: TRANSPORT_TARGET,
        endpoint = %endpoint,
        %addr,
        "connected to phaser server"
    );
    Ok(stream)
}

/// [`LineSink`] writing to a TCP stream.
#[derive(Debug)]
pub struct TcpLineWriter {
    stream: Mutex<TcpStream>,
}

impl TcpLineWriter {
    /// Wraps the write half of a connection.
    #[must_use]
    pub const fn new(stream: TcpStream) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }

    /// Shuts the connection down in both directions, which also ends the
    /// reader loop.
    ///
    /// # Errors
    ///
    /// Returns the socket error, except when the peer already disconnected.
    pub fn shutdown(&self) -> io::Result<()> {
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        match stream.shutdown(Shutdown::Both) {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(error),
            _ => Ok(()),
        }
    }
}

impl LineSink for TcpLineWriter {
    fn send_line(&self, line: &str) -> io::Result<()> {
        let mut frame = String::with_capacity(line.len() + 1);
        frame.push_str(line);
        frame.push('\n');

        let mut stream = self
            .stream
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        stream.write_all(frame.as_bytes())?;
        stream.flush()?;
        debug!(target: TRANSPORT_TARGET, bytes = frame.len(), "line sent");
        Ok(())
    }
}
