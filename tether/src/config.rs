//! Client configuration.
//!
//! A [`ClientConfig`] carries everything the engine needs before
//! [`TcpClient::open`](crate::net::TcpClient::open): the target endpoint,
//! the data threshold and both timeouts. It can be assembled in code
//! through [`ClientBuilder`] or loaded from a TOML document:
//!
//! ```toml
//! address = "127.0.0.1"
//! port = 8080
//! read_min_length = 4
//! read_timeout_ms = 5000
//! connect_timeout_ms = 250
//! ```

use crate::error::{Error, Result};
use crate::net::{ClientHandler, TcpClient};

use serde::Deserialize;

use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default number of bytes that must be available before `data` fires.
pub const DEFAULT_READ_MIN_LENGTH: usize = 1;

/// Largest accepted threshold. The peek buffer is allocated up front and
/// a single `recv` cannot report more than this.
pub const MAX_READ_MIN_LENGTH: usize = i32::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Target host name or IP literal.
    pub address: String,

    /// Target port.
    pub port: u16,

    /// Minimum peekable bytes before the handler is told data is ready.
    #[serde(default = "default_read_min_length")]
    pub read_min_length: usize,

    /// Inactivity window in milliseconds, `0` disables it.
    #[serde(default)]
    pub read_timeout_ms: u64,

    /// Handshake deadline in milliseconds, `0` selects a blocking connect.
    #[serde(default)]
    pub connect_timeout_ms: u64,
}

fn default_read_min_length() -> usize {
    DEFAULT_READ_MIN_LENGTH
}

impl ClientConfig {
    /// Creates a configuration for `address:port` with every other
    /// option at its default.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            read_min_length: DEFAULT_READ_MIN_LENGTH,
            read_timeout_ms: 0,
            connect_timeout_ms: 0,
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidConfig("address must not be empty".into()));
        }

        if self.port == 0 {
            return Err(Error::InvalidConfig("port must be > 0".into()));
        }

        if self.read_min_length == 0 {
            return Err(Error::InvalidConfig("read_min_length must be >= 1".into()));
        }

        if self.read_min_length > MAX_READ_MIN_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "read_min_length must be <= {MAX_READ_MIN_LENGTH}"
            )));
        }

        Ok(())
    }

    /// The inactivity window, or `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// The handshake deadline, or `None` for a blocking connect.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

/// Builder for configuring and creating a [`TcpClient`].
///
/// # Examples
///
/// ```rust,ignore
/// let client = ClientBuilder::new("127.0.0.1", 8080)
///     .read_min_length(4)
///     .connect_timeout(Duration::from_millis(250))
///     .build(MyHandler::default())?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a builder targeting `address:port`.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            config: ClientConfig::new(address, port),
        }
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets how many bytes must be peekable before `data` fires.
    pub fn read_min_length(mut self, n: usize) -> Self {
        self.config.read_min_length = n;
        self
    }

    /// Sets the inactivity window. `Duration::ZERO` disables it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Sets the handshake deadline. `Duration::ZERO` selects a blocking
    /// connect.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Returns the configuration assembled so far.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validates the configuration and binds `handler` to a new client.
    pub fn build<H: ClientHandler>(self, handler: H) -> Result<TcpClient<H>> {
        TcpClient::new(self.config, handler)
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_apply() {
        let config = ClientConfig::from_toml_str(
            r#"
            address = "example.org"
            port = 80
            "#,
        )
        .unwrap();

        assert_eq!(config, ClientConfig::new("example.org", 80));
        assert_eq!(config.read_timeout(), None);
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn toml_full_document() {
        let config = ClientConfig::from_toml_str(
            r#"
            address = "10.0.0.1"
            port = 4573
            read_min_length = 8
            read_timeout_ms = 1500
            connect_timeout_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.read_min_length, 8);
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = ClientConfig::from_toml_str(
            r#"
            address = "10.0.0.1"
            port = 1
            handler = "MyHandler"
            "#,
        );

        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn zero_threshold_is_invalid() {
        let mut config = ClientConfig::new("localhost", 1);
        config.read_min_length = 0;

        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn oversized_threshold_is_invalid() {
        let mut config = ClientConfig::new("localhost", 1);
        config.read_min_length = usize::MAX;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.read_min_length = MAX_READ_MIN_LENGTH + 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.read_min_length = MAX_READ_MIN_LENGTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_oversized_threshold_without_allocating() {
        struct Nop;

        impl ClientHandler for Nop {
            fn data(&mut self, _conn: &mut crate::net::Connection) {}
        }

        let result = ClientBuilder::new("127.0.0.1", 80)
            .read_min_length(usize::MAX)
            .build(Nop);

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn empty_address_and_zero_port_are_invalid() {
        assert!(ClientConfig::new("", 80).validate().is_err());
        assert!(ClientConfig::new("localhost", 0).validate().is_err());
    }

    #[test]
    fn builder_converts_durations() {
        let builder = ClientBuilder::new("localhost", 9000)
            .read_timeout(Duration::from_secs(2))
            .connect_timeout(Duration::from_millis(10))
            .read_min_length(3);

        let config = builder.config();
        assert_eq!(config.read_timeout_ms, 2000);
        assert_eq!(config.connect_timeout_ms, 10);
        assert_eq!(config.read_min_length, 3);
    }

    #[test]
    fn missing_file_reports_path() {
        let result = ClientConfig::load("/definitely/not/here.toml");

        match result {
            Err(Error::ConfigRead { path, .. }) => {
                assert!(path.ends_with("here.toml"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
