//! TCP client networking.
//!
//! This module exposes the polled client engine and the handler
//! capability it drives:
//! - [`TcpClient`]: opens the socket, runs the handshake and is polled,
//! - [`Connection`]: the per-connection state lent to handlers,
//! - [`ClientHandler`]: the application callbacks.
//!
//! All socket operations happen synchronously inside `open`, `poll`
//! and `close`; nothing runs in the background.

mod handler;
mod tcp;

pub use handler::ClientHandler;
pub use tcp::client::{ConnectOutcome, PollEvent, TcpClient};
pub use tcp::connection::{Connection, ConnectionState};
