//! Connection lifecycle: connect, wire, handshake, close.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use phaser_config::{Config, ServerEndpoint};
use thiserror::Error;
use tracing::{info, warn};

use crate::cavity_cache::CavityCache;
use crate::console::{CommandConsole, CommandError, JsonCommandConsole};
use crate::dispatcher::ProtocolDispatcher;
use crate::listener::NotificationListener;
use crate::transport::{
    ConnectError, ReaderExit, ReaderHandle, TcpLineWriter, connect, spawn_reader,
};

/// Tracing target for session lifecycle events.
pub(crate) const SESSION_TARGET: &str = "phaser_client::session";

/// Connection parameters for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Server address.
    pub endpoint: ServerEndpoint,
    /// Time allowed for establishing the connection.
    pub connect_timeout: Duration,
    /// Time each command waits for its response.
    pub response_timeout: Duration,
    /// Largest inbound line accepted, in bytes.
    pub max_frame_length: usize,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint(),
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
            max_frame_length: config.max_frame_length(),
        }
    }
}

/// Errors raised while opening a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server could not be reached.
    #[error(transparent)]
    Connect(#[from] ConnectError),
    /// The connection could not be split or the reader could not start.
    #[error("failed to start connection reader: {0}")]
    Io(#[from] io::Error),
    /// The start-up exchange with the server failed.
    #[error("handshake with phaser server failed: {0}")]
    Handshake(#[source] CommandError),
}

/// An open connection to a phaser server.
///
/// Holds the command console, the reader thread and the cavity cache for
/// one connection. Dropping the session shuts the socket down without
/// waiting for the reader.
#[derive(Debug)]
pub struct Session {
    console: JsonCommandConsole<TcpLineWriter>,
    reader: Option<ReaderHandle>,
    cavities: CavityCache,
    server_version: String,
}

impl Session {
    /// Opens a session with a fresh cavity cache.
    ///
    /// # Errors
    ///
    /// See [`Session::open_with_cache`].
    pub fn open(
        settings: &SessionSettings,
        listeners: Vec<Arc<dyn NotificationListener>>,
    ) -> Result<Self, SessionError> {
        Self::open_with_cache(settings, listeners, CavityCache::new())
    }

    /// Connects, registers `listeners`, starts the reader, then queries the
    /// server version and fills `cavities`.
    ///
    /// Listeners are registered before the first line is read, so they see
    /// every notification the server sends.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the connection cannot be opened or the
    /// server does not answer the start-up commands.
    pub fn open_with_cache(
        settings: &SessionSettings,
        listeners: Vec<Arc<dyn NotificationListener>>,
        cavities: CavityCache,
    ) -> Result<Self, SessionError> {
        let stream = connect(&settings.endpoint, settings.connect_timeout)?;
        let read_half = stream.try_clone()?;

        let (console, feeder) =
            JsonCommandConsole::new(TcpLineWriter::new(stream), settings.response_timeout);
        let dispatcher = Arc::new(ProtocolDispatcher::new());
        dispatcher.add_response_listener(Arc::new(feeder));
        for listener in listeners {
            dispatcher.add_notification_listener(listener);
        }
        let reader = spawn_reader(read_half, dispatcher, settings.max_frame_length)?;

        let mut session = Self {
            console,
            reader: Some(reader),
            cavities,
            server_version: String::new(),
        };
        if let Err(error) = session.handshake() {
            let exit = session.close();
            warn!(
                target: SESSION_TARGET,
                error = %error,
                reader = ?exit,
                "handshake failed"
            );
            return Err(SessionError::Handshake(error));
        }
        info!(
            target: SESSION_TARGET,
            endpoint = %settings.endpoint,
            version = %session.server_version,
            cavities = session.cavities.len(),
            "session open"
        );
        Ok(session)
    }

    fn handshake(&mut self) -> Result<(), CommandError> {
        self.server_version = self.console.server_version()?;
        self.refresh_cavities()?;
        Ok(())
    }

    /// Re-reads the cavity list from the server into the cache.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] from the `cavities` command; the cache is
    /// left untouched on failure.
    pub fn refresh_cavities(&self) -> Result<(), CommandError> {
        let names = self.console.cavities()?;
        self.cavities.replace(names);
        Ok(())
    }

    /// The command console for this connection.
    #[must_use]
    pub const fn console(&self) -> &JsonCommandConsole<TcpLineWriter> {
        &self.console
    }

    /// Cavity names reported by the server.
    #[must_use]
    pub const fn cavities(&self) -> &CavityCache {
        &self.cavities
    }

    /// Version string reported during the handshake.
    #[must_use]
    pub fn server_version(&self) -> &str {
        self.server_version.as_str()
    }

    /// Blocks until the server closes the connection.
    #[must_use]
    pub fn wait(mut self) -> ReaderExit {
        self.reader
            .take()
            .map_or(ReaderExit::Closed, ReaderHandle::join)
    }

    /// Shuts the connection down and waits for the reader to stop.
    #[must_use]
    pub fn close(mut self) -> ReaderExit {
        self.shutdown();
        self.reader
            .take()
            .map_or(ReaderExit::Closed, ReaderHandle::join)
    }

    fn shutdown(&self) {
        if let Err(error) = self.console.sink().shutdown() {
            warn!(target: SESSION_TARGET, error = %error, "socket shutdown failed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.reader.is_some() {
            self.shutdown();
        }
    }
}
