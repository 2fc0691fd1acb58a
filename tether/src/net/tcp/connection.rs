use crate::config::ClientConfig;
use crate::sys::Socket;

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Lifecycle of a [`Connection`].
///
/// A failed or timed out handshake returns to `Idle`. `Closed` is
/// terminal for the current socket but the client may be opened again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Idle,

    /// Socket created, handshake running.
    Connecting,

    /// Handshake completed.
    Connected,

    /// Closed by either side.
    Closed,
}

/// Mutable state of one client connection.
///
/// A `Connection` is owned by its [`TcpClient`](super::client::TcpClient)
/// and lent to the handler during callbacks. Handlers use it to move
/// bytes and to close the connection; they cannot reopen it or change
/// its state directly.
#[derive(Debug)]
pub struct Connection {
    config: ClientConfig,
    socket: Option<Socket>,
    remote: Option<SocketAddr>,
    state: ConnectionState,

    /// Baseline for the read timeout.
    last_data_read: Instant,

    /// A close happened and `disconnect` has not been delivered yet.
    disconnect_pending: bool,
}

impl Connection {
    pub(crate) fn new(config: ClientConfig) -> Self {
        Self {
            config,
            socket: None,
            remote: None,
            state: ConnectionState::Idle,
            last_data_read: Instant::now(),
            disconnect_pending: false,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` between a completed handshake and the next close.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The resolved address of the current or last attempted peer.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// The local address of the socket, if one exists.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket()
            .ok_or_else(not_connected)
            .and_then(Socket::local_addr)
    }

    /// The remote address as seen by the OS, if one exists.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket()
            .ok_or_else(not_connected)
            .and_then(Socket::peer_addr)
    }

    /// Reads up to `buffer.len()` bytes, removing them from the socket.
    ///
    /// `Ok(0)` means the peer closed the connection. The socket is
    /// non-blocking once connected, so `WouldBlock` is returned when
    /// nothing is queued; callers should treat it as transient.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.socket()
            .ok_or_else(not_connected)?
            .recv(buffer, false)
    }

    /// Like [`read`](Self::read) but leaves the bytes queued for a
    /// subsequent read.
    pub fn peek(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.socket().ok_or_else(not_connected)?.recv(buffer, true)
    }

    /// Sends `bytes`, returning how many were accepted.
    ///
    /// Partial writes are not retried; a caller needing full delivery
    /// must resubmit the remainder.
    pub fn write(&self, bytes: &[u8]) -> io::Result<usize> {
        self.socket().ok_or_else(not_connected)?.send(bytes)
    }

    /// Closes the connection.
    ///
    /// Returns `false` and does nothing unless the connection is
    /// currently connected. When called from inside a handler callback
    /// the `disconnect` callback runs as soon as that callback returns.
    pub fn close(&mut self) -> bool {
        if !self.is_connected() {
            return false;
        }

        self.state = ConnectionState::Closed;
        self.disconnect_pending = true;
        true
    }

    pub(crate) fn socket(&self) -> Option<&Socket> {
        self.socket.as_ref()
    }

    pub(crate) fn begin_connecting(&mut self, socket: Socket, remote: SocketAddr) {
        self.socket = Some(socket);
        self.remote = Some(remote);
        self.state = ConnectionState::Connecting;
    }

    pub(crate) fn mark_connected(&mut self) {
        self.touch();
        self.state = ConnectionState::Connected;
    }

    /// Drops the socket after an abandoned or failed handshake.
    pub(crate) fn abort_connecting(&mut self) {
        self.socket = None;
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Idle;
        }
    }

    pub(crate) fn take_disconnect_pending(&mut self) -> bool {
        std::mem::take(&mut self.disconnect_pending)
    }

    pub(crate) fn release_socket(&mut self) {
        self.socket = None;
    }

    #[cfg(test)]
    pub(crate) fn forget_socket(&mut self) {
        std::mem::forget(self.socket.take());
    }

    /// Rebases the read timeout window to now.
    pub(crate) fn touch(&mut self) {
        self.last_data_read = self.last_data_read.max(Instant::now());
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_data_read.elapsed()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "socket is not open")
}
