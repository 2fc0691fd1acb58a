//! Errors raised by the client engine.
//!
//! Only failures the caller must react to are raised. A connect timeout
//! or a read timeout is an expected condition and is reported through
//! the [`ClientHandler`](crate::net::ClientHandler) instead.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to create a socket. No handler callback ran.
    #[error("error opening socket: {0}")]
    SocketCreate(#[source] io::Error),

    /// The OS reported a definitive connect failure. The socket has
    /// already been released.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The readiness check itself failed. The connection should be
    /// considered unreliable and closed by the caller.
    #[error("error selecting from socket: {0}")]
    Select(#[source] io::Error),

    /// The configured address did not resolve to any socket address.
    #[error("could not resolve {address}:{port}: {source}")]
    Resolve {
        address: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The configuration was rejected before any socket was created.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not read configuration from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
