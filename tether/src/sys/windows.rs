//! Windows platform abstraction layer.
//!
//! This module mirrors the Unix platform layer on top of WinSock and
//! exposes identical function names and semantics where possible.

use super::common::{Interest, Readiness};

use std::ffi::c_int;
use std::io;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::sync::Once;
use std::time::Duration;

use windows_sys::Win32::Networking::WinSock::{
    AF_INET, AF_INET6, FIONBIO, INVALID_SOCKET, MSG_PEEK, POLLERR, POLLHUP, POLLNVAL, POLLRDNORM,
    POLLWRNORM, SO_ERROR, SOCK_STREAM, SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6, SOCKADDR_STORAGE,
    SOCKET, SOCKET_ERROR, SOL_SOCKET, WSADATA, WSAEALREADY, WSAEINTR, WSAEINVAL, WSAEISCONN,
    WSAEWOULDBLOCK, WSAPOLLFD, WSAPoll, WSAStartup, closesocket, connect, getpeername,
    getsockname, getsockopt, ioctlsocket, recv, send, socket,
};

/// Raw socket type on Windows.
pub type RawFd = std::os::windows::io::RawSocket;

/// Creates a MAKEWORD value for Winsock version.
#[inline]
const fn makeword(low: u8, high: u8) -> u16 {
    ((high as u16) << 8) | (low as u16)
}

/// Winsock initialization guard.
static WINSOCK_INIT: Once = Once::new();

/// Initialize Winsock if not already initialized.
pub(crate) fn ensure_winsock() {
    WINSOCK_INIT.call_once(|| unsafe {
        let mut data: WSADATA = mem::zeroed();
        let rc = WSAStartup(makeword(2, 2), &mut data as *mut _);
        assert_eq!(rc, 0, "WSAStartup failed: {}", rc);
    });
}

/// Returns the address family matching `addr`.
pub(crate) fn sys_domain(addr: &SocketAddr) -> c_int {
    match addr {
        SocketAddr::V4(_) => AF_INET as c_int,
        SocketAddr::V6(_) => AF_INET6 as c_int,
    }
}

/// Creates a blocking stream socket.
pub(crate) fn sys_socket(domain: c_int) -> io::Result<RawFd> {
    ensure_winsock();
    unsafe {
        let fd = socket(domain, SOCK_STREAM, 0);
        if fd == INVALID_SOCKET {
            return Err(io::Error::last_os_error());
        }
        Ok(fd as RawFd)
    }
}

/// Switches a socket between blocking and non-blocking mode.
pub(crate) fn sys_set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    unsafe {
        let mut mode: u32 = if nonblocking { 1 } else { 0 };
        if ioctlsocket(fd as SOCKET, FIONBIO, &mut mode) != 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

/// Closes a socket.
pub(crate) fn sys_close(fd: RawFd) {
    unsafe {
        let _ = closesocket(fd as SOCKET);
    }
}

/// Issues `connect`.
pub(crate) fn sys_connect(fd: RawFd, addr: &SocketAddr) -> io::Result<()> {
    ensure_winsock();
    let (storage, len) = socketaddr_to_storage(addr);
    unsafe {
        if connect(fd as SOCKET, &storage as *const _ as *const SOCKADDR, len) == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// Whether a connect error only means the handshake has not finished yet.
///
/// WinSock reports a repeated connect on a pending socket as `WSAEINVAL`.
pub(crate) fn sys_connect_in_progress(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(WSAEWOULDBLOCK | WSAEALREADY | WSAEINVAL | WSAEINTR)
    )
}

/// Whether a connect error reports that the handshake already completed.
pub(crate) fn sys_already_connected(err: &io::Error) -> bool {
    err.raw_os_error() == Some(WSAEISCONN)
}

/// Checks a single socket for readiness, waiting at most `timeout`.
pub(crate) fn sys_poll(fd: RawFd, interest: Interest, timeout: Duration) -> io::Result<Readiness> {
    let mut events = 0;
    if interest.read {
        events |= POLLRDNORM;
    }
    if interest.write {
        events |= POLLWRNORM;
    }

    let mut pfd = WSAPOLLFD {
        fd: fd as SOCKET,
        events,
        revents: 0,
    };

    let timeout = timeout.as_millis().min(i32::MAX as u128) as i32;

    let rc = unsafe { WSAPoll(&mut pfd, 1, timeout) };
    if rc == SOCKET_ERROR {
        return Err(io::Error::last_os_error());
    }

    let re = pfd.revents as i32;

    Ok(Readiness {
        readable: re & POLLRDNORM as i32 != 0,
        writable: re & POLLWRNORM as i32 != 0,
        hangup: re & POLLHUP as i32 != 0,
        error: re & POLLERR as i32 != 0,
        invalid: re & POLLNVAL as i32 != 0,
    })
}

/// Takes the pending socket error via `SO_ERROR`.
pub(crate) fn sys_take_socket_error(fd: RawFd) -> io::Result<()> {
    unsafe {
        let mut err: i32 = 0;
        let mut len: i32 = mem::size_of::<i32>() as i32;

        let rc = getsockopt(
            fd as SOCKET,
            SOL_SOCKET,
            SO_ERROR,
            &mut err as *mut _ as *mut u8,
            &mut len,
        );

        if rc != 0 {
            Err(io::Error::last_os_error())
        } else if err != 0 {
            Err(io::Error::from_raw_os_error(err))
        } else {
            Ok(())
        }
    }
}

/// Receives into `buffer`, leaving the data queued when `peek` is set.
pub(crate) fn sys_recv(fd: RawFd, buffer: &mut [u8], peek: bool) -> io::Result<usize> {
    let flags = if peek { MSG_PEEK } else { 0 };
    let len = buffer.len().min(i32::MAX as usize) as i32;

    let rc = unsafe { recv(fd as SOCKET, buffer.as_mut_ptr(), len, flags) };
    if rc == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Sends as much of `buffer` as the stack accepts right now.
pub(crate) fn sys_send(fd: RawFd, buffer: &[u8]) -> io::Result<usize> {
    let len = buffer.len().min(i32::MAX as usize) as i32;

    let rc = unsafe { send(fd as SOCKET, buffer.as_ptr(), len, 0) };
    if rc == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Returns the local address of a socket.
pub(crate) fn sys_local_addr(fd: RawFd) -> io::Result<SocketAddr> {
    unsafe {
        let mut storage: SOCKADDR_STORAGE = mem::zeroed();
        let mut len = mem::size_of::<SOCKADDR_STORAGE>() as i32;
        if getsockname(
            fd as SOCKET,
            &mut storage as *mut _ as *mut SOCKADDR,
            &mut len,
        ) != 0
        {
            Err(io::Error::last_os_error())
        } else {
            sockaddr_storage_to_socketaddr(&storage)
        }
    }
}

/// Returns the remote address of a connected socket.
pub(crate) fn sys_peer_addr(fd: RawFd) -> io::Result<SocketAddr> {
    unsafe {
        let mut storage: SOCKADDR_STORAGE = mem::zeroed();
        let mut len = mem::size_of::<SOCKADDR_STORAGE>() as i32;
        if getpeername(
            fd as SOCKET,
            &mut storage as *mut _ as *mut SOCKADDR,
            &mut len,
        ) != 0
        {
            Err(io::Error::last_os_error())
        } else {
            sockaddr_storage_to_socketaddr(&storage)
        }
    }
}

/// Converts a SOCKADDR_STORAGE to a SocketAddr.
pub(crate) fn sockaddr_storage_to_socketaddr(storage: &SOCKADDR_STORAGE) -> io::Result<SocketAddr> {
    unsafe {
        match storage.ss_family {
            AF_INET => {
                let sin = &*(storage as *const _ as *const SOCKADDR_IN);
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.S_un.S_addr));
                Ok(SocketAddr::V4(SocketAddrV4::new(
                    ip,
                    u16::from_be(sin.sin_port),
                )))
            }
            AF_INET6 => {
                let sin6 = &*(storage as *const _ as *const SOCKADDR_IN6);
                let ip = Ipv6Addr::from(sin6.sin6_addr.u.Byte);
                Ok(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    u16::from_be(sin6.sin6_port),
                    0,
                    sin6.Anonymous.sin6_scope_id,
                )))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unsupported family",
            )),
        }
    }
}

/// Converts a SocketAddr to a SOCKADDR_STORAGE.
pub(crate) fn socketaddr_to_storage(addr: &SocketAddr) -> (SOCKADDR_STORAGE, i32) {
    let mut storage: SOCKADDR_STORAGE = unsafe { mem::zeroed() };
    match addr {
        SocketAddr::V4(v4) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN) };
            sa.sin_family = AF_INET;
            sa.sin_port = v4.port().to_be();
            sa.sin_addr.S_un.S_addr = u32::from(*v4.ip()).to_be();
            (storage, mem::size_of::<SOCKADDR_IN>() as i32)
        }
        SocketAddr::V6(v6) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN6) };
            sa.sin6_family = AF_INET6;
            sa.sin6_port = v6.port().to_be();
            sa.sin6_addr.u.Byte = v6.ip().octets();
            sa.Anonymous.sin6_scope_id = v6.scope_id();
            (storage, mem::size_of::<SOCKADDR_IN6>() as i32)
        }
    }
}
