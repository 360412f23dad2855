//! Shared configuration for the phaser control-room client.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional TOML file (`--config-path` or `PHASER_CONFIG_PATH`), then
//! `PHASER_*` environment variables, then command-line flags. The resolved
//! [`Config`] tells the client where the phaser server lives, how long to
//! wait on it, and how to log.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_LENGTH,
    DEFAULT_RESPONSE_TIMEOUT_SECS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, default_log_filter,
    default_log_format,
};
pub use endpoint::{EndpointParseError, ServerEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PHASER")]
#[serde(default)]
pub struct Config {
    /// Host name of the phaser server.
    pub server_host: String,
    /// TCP port of the phaser server.
    pub server_port: u16,
    /// Seconds allowed for establishing the connection.
    pub connect_timeout_secs: u64,
    /// Seconds a command waits for its response.
    pub response_timeout_secs: u64,
    /// Largest inbound line accepted from the server, in bytes.
    pub max_frame_length: usize,
    /// `tracing` filter directive applied to log output.
    pub log_filter: String,
    /// Output format for log records.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: defaults::default_server_host(),
            server_port: DEFAULT_SERVER_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            response_timeout_secs: DEFAULT_RESPONSE_TIMEOUT_SECS,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Address of the phaser server.
    #[must_use]
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.server_host.as_str(), self.server_port)
    }

    /// Time allowed for establishing the connection.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Time a command waits for its response.
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    /// Largest inbound line accepted from the server.
    #[must_use]
    pub const fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }

    /// Log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
