//! TCP client implementation.
//!
//! It is split into:
//! - [`client`]: the handshake and the poll operation,
//! - [`connection`]: socket ownership, read/write primitives and state.

pub mod client;
pub mod connection;
