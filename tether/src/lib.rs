//! # Tether
//!
//! **Tether** is a non-blocking TCP client engine driven by explicit
//! polling.
//!
//! A [`TcpClient`](net::TcpClient) owns exactly one connection and one
//! [`ClientHandler`](net::ClientHandler). It opens its socket without
//! blocking past a configurable deadline, and from then on must be
//! polled by the caller: each poll checks for data, notices a peer that
//! went away, and enforces an inactivity timeout, invoking the handler
//! for each of these events. The engine never spawns a thread and never
//! consumes bytes itself; the handler decides how much to read.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tether::ClientBuilder;
//! use tether::net::{ClientHandler, Connection};
//! use std::time::Duration;
//!
//! struct Printer;
//!
//! impl ClientHandler for Printer {
//!     fn connect(&mut self, conn: &mut Connection) {
//!         let _ = conn.write(b"hello\n");
//!     }
//!
//!     fn data(&mut self, conn: &mut Connection) {
//!         let mut buffer = [0u8; 1024];
//!         if let Ok(n) = conn.read(&mut buffer) {
//!             println!("{}", String::from_utf8_lossy(&buffer[..n]));
//!         }
//!     }
//! }
//!
//! let mut client = ClientBuilder::new("127.0.0.1", 7)
//!     .connect_timeout(Duration::from_millis(500))
//!     .read_timeout(Duration::from_secs(5))
//!     .build(Printer)?;
//!
//! client.open()?;
//! while client.is_connected() {
//!     client.poll()?;
//!     std::thread::sleep(Duration::from_millis(1));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`net`] — The client engine, its connection state and handler trait
//! - [`config`] — Configuration, builder and TOML loading
//! - [`driver`] — A ready-made poll loop for callers without one
//! - [`error`] — Errors raised by `open` and `poll`

mod sys;

pub mod config;
pub mod driver;
pub mod error;
pub mod net;
pub mod trace;

pub use config::{ClientBuilder, ClientConfig};
pub use driver::{Driver, Stop};
pub use error::{Error, Result};
pub use net::{ClientHandler, ConnectOutcome, Connection, ConnectionState, PollEvent, TcpClient};
