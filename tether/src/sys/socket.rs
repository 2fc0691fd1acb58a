use super::common::{Interest, Readiness};
use super::platform::{
    RawFd, sys_close, sys_connect, sys_local_addr, sys_peer_addr, sys_poll, sys_recv, sys_send,
    sys_set_nonblocking, sys_socket, sys_take_socket_error,
};

use std::ffi::c_int;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// An owned TCP socket.
///
/// The descriptor is closed when the `Socket` is dropped, so releasing
/// a socket is simply dropping it.
#[derive(Debug)]
pub(crate) struct Socket {
    fd: RawFd,
}

impl Socket {
    /// Creates a blocking stream socket for the given address family.
    pub(crate) fn new(domain: c_int) -> io::Result<Self> {
        sys_socket(domain).map(|fd| Self { fd })
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    pub(crate) fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        sys_set_nonblocking(self.fd, nonblocking)
    }

    pub(crate) fn connect(&self, addr: &SocketAddr) -> io::Result<()> {
        sys_connect(self.fd, addr)
    }

    /// Waits at most `timeout` for the requested readiness.
    pub(crate) fn poll(&self, interest: Interest, timeout: Duration) -> io::Result<Readiness> {
        sys_poll(self.fd, interest, timeout)
    }

    /// Takes the error left behind by a failed non-blocking connect.
    pub(crate) fn take_error(&self) -> io::Result<()> {
        sys_take_socket_error(self.fd)
    }

    pub(crate) fn recv(&self, buffer: &mut [u8], peek: bool) -> io::Result<usize> {
        sys_recv(self.fd, buffer, peek)
    }

    pub(crate) fn send(&self, buffer: &[u8]) -> io::Result<usize> {
        sys_send(self.fd, buffer)
    }

    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_local_addr(self.fd)
    }

    pub(crate) fn peer_addr(&self) -> io::Result<SocketAddr> {
        sys_peer_addr(self.fd)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
