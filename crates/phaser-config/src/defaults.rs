use crate::logging::LogFormat;

/// Host name used when no server host is configured.
pub const DEFAULT_SERVER_HOST: &str = "localhost";

/// TCP port the phaser server listens on by default.
pub const DEFAULT_SERVER_PORT: u16 = 2048;

/// Seconds allowed for the TCP connection to be established.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Seconds a command waits for its response before failing.
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Largest inbound line accepted from the server, in bytes.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1_048_576;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned default host name used where allocation is required (e.g. serde).
pub fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.to_owned()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
