use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use thiserror::Error;

/// TCP address of the phaser server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    host: String,
    port: u16,
}

impl ServerEndpoint {
    /// Builds an endpoint from a host name and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address literal.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the endpoint to the first usable socket address.
    ///
    /// # Errors
    ///
    /// Returns the resolver error, or `AddrNotAvailable` when resolution
    /// yields no addresses.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tcp://{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerEndpoint {
    type Err = EndpointParseError;

    /// Accepts `host:port`, optionally prefixed with `tcp://`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let address = input.strip_prefix("tcp://").unwrap_or(input);
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(EndpointParseError::MissingHost(input.to_owned()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointParseError::InvalidPort(input.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing a [`ServerEndpoint`] from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    /// Host name was missing.
    #[error("missing server host in '{0}'")]
    MissingHost(String),
    /// Port separator was missing.
    #[error("missing server port in '{0}'")]
    MissingPort(String),
    /// Port was not a number between 0 and 65535.
    #[error("invalid server port in '{0}'")]
    InvalidPort(String),
}
