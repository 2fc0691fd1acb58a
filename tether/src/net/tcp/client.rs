use super::connection::{Connection, ConnectionState};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::net::ClientHandler;
use crate::sys::platform::{sys_already_connected, sys_connect_in_progress, sys_domain};
use crate::sys::{Interest, Socket};

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

/// Wait between two connect attempts. One attempt is made per
/// millisecond of connect timeout.
const CONNECT_TICK: Duration = Duration::from_millis(1);

/// Writability wait used to finish an interrupted blocking connect.
const RESUME_TICK: Duration = Duration::from_millis(100);

/// How a call to [`TcpClient::open`] ended without raising.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The handshake completed and `connect` was delivered.
    Connected,

    /// The budget ran out and `connect_timeout` was delivered.
    TimedOut,
}

/// What a call to [`TcpClient::poll`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollEvent {
    /// Nothing to report, or the client is not connected.
    Idle,

    /// The read threshold was met and `data` was delivered.
    Data,

    /// The read timeout window elapsed and `read_timeout` was delivered.
    ReadTimeout,

    /// The peer went away and the connection was closed.
    Closed,
}

/// A non-blocking TCP client driven by explicit polling.
///
/// `TcpClient` owns one [`Connection`] and one [`ClientHandler`]. It has
/// no thread or timer of its own: the caller runs the handshake with
/// [`open`](Self::open) and then invokes [`poll`](Self::poll) often
/// enough for the configured timeouts to be meaningful.
///
/// # Examples
///
/// ```rust,ignore
/// let mut client = ClientBuilder::new("127.0.0.1", 8080)
///     .connect_timeout(Duration::from_millis(250))
///     .build(Echo)?;
///
/// client.open()?;
/// while client.is_connected() {
///     client.poll()?;
///     std::thread::sleep(Duration::from_millis(1));
/// }
/// ```
#[derive(Debug)]
pub struct TcpClient<H> {
    conn: Connection,
    handler: H,

    /// Peek buffer sized to the read threshold.
    scratch: Vec<u8>,
}

impl<H: ClientHandler> TcpClient<H> {
    /// Validates `config` and binds `handler` for the client's lifetime.
    pub fn new(config: ClientConfig, handler: H) -> Result<Self> {
        config.validate()?;

        let scratch = vec![0; config.read_min_length];

        Ok(Self {
            conn: Connection::new(config),
            handler,
            scratch,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.conn.config()
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Opens the connection.
    ///
    /// With a connect timeout of `n` milliseconds the socket is put in
    /// non-blocking mode and up to `n` connect attempts are made, each
    /// followed by a writability wait of at most one millisecond. With
    /// no timeout a single blocking connect is made.
    ///
    /// An exhausted budget is not an error: `connect_timeout` is
    /// delivered, the socket released, and [`ConnectOutcome::TimedOut`]
    /// returned. Opening a client that is still connected closes the
    /// current connection first.
    ///
    /// # Errors
    ///
    /// - [`Error::Resolve`] if the address does not resolve,
    /// - [`Error::SocketCreate`] if no socket could be created,
    /// - [`Error::Connect`] if the OS rejects the connection.
    pub fn open(&mut self) -> Result<ConnectOutcome> {
        if self.conn.is_connected() {
            debug!("reopening a connected client, closing first");
            self.close();
        }
        self.conn.abort_connecting();

        let addr = self.resolve()?;

        let socket = Socket::new(sys_domain(&addr)).map_err(Error::SocketCreate)?;

        let budget = self.conn.config().connect_timeout_ms;
        socket
            .set_nonblocking(budget > 0)
            .map_err(Error::SocketCreate)?;

        debug!(%addr, fd = ?socket.fd(), budget_ms = budget, "connecting");

        self.conn.begin_connecting(socket, addr);
        self.dispatch(|handler, conn| handler.before_connect(conn));

        let started = Instant::now();

        let result = match self.conn.socket() {
            Some(socket) if budget > 0 => connect_bounded(socket, &addr, budget),
            Some(socket) => connect_blocking(socket, &addr),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket released during handshake",
            )),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(true) => {}
            Ok(false) => {
                debug!(%addr, elapsed_ms, "connect timed out");
                self.dispatch(|handler, conn| handler.connect_timeout(conn));
                self.conn.abort_connecting();
                return Ok(ConnectOutcome::TimedOut);
            }
            Err(source) => {
                debug!(%addr, elapsed_ms, error = %source, "connect failed");
                self.conn.abort_connecting();
                return Err(Error::Connect { addr, source });
            }
        }

        if let Some(Err(source)) = self.conn.socket().map(|s| s.set_nonblocking(true)) {
            self.conn.abort_connecting();
            return Err(Error::Connect { addr, source });
        }

        self.conn.mark_connected();
        debug!(%addr, elapsed_ms, "connected");

        self.dispatch(|handler, conn| handler.connect(conn));

        Ok(ConnectOutcome::Connected)
    }

    /// Checks the connection once without blocking.
    ///
    /// If at least `read_min_length` bytes can be peeked, `data` is
    /// delivered and nothing is consumed. An orderly shutdown by the
    /// peer closes the connection. Otherwise the read timeout is
    /// evaluated; after it fires the window restarts from now, so a
    /// silent peer triggers `read_timeout` at a steady cadence.
    ///
    /// Does nothing unless connected.
    ///
    /// # Errors
    ///
    /// [`Error::Select`] if the readiness check itself fails. The
    /// connection should be closed by the caller.
    pub fn poll(&mut self) -> Result<PollEvent> {
        if !self.conn.is_connected() {
            return Ok(PollEvent::Idle);
        }

        let Some(socket) = self.conn.socket() else {
            return Ok(PollEvent::Idle);
        };

        let readiness = socket
            .poll(Interest::READ, Duration::ZERO)
            .map_err(Error::Select)?;

        if readiness.invalid {
            return Err(Error::Select(io::Error::new(
                io::ErrorKind::InvalidInput,
                "socket descriptor is not open",
            )));
        }

        if readiness.can_receive() {
            let threshold = self.conn.config().read_min_length;
            self.scratch.resize(threshold, 0);

            match socket.recv(&mut self.scratch, true) {
                Ok(0) => {
                    debug!(fd = ?socket.fd(), "peer closed the connection");
                    self.close();
                    return Ok(PollEvent::Closed);
                }
                Ok(n) if n >= threshold => {
                    self.conn.touch();
                    self.dispatch(|handler, conn| handler.data(conn));
                    return Ok(PollEvent::Data);
                }
                Ok(n) => {
                    trace!(available = n, threshold, "below read threshold");
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    warn!(fd = ?socket.fd(), error = %e, "peek failed, closing connection");
                    self.close();
                    return Ok(PollEvent::Closed);
                }
            }
        }

        if let Some(window) = self.conn.config().read_timeout() {
            let idle = self.conn.idle_for();
            if idle > window {
                trace!(idle_ms = idle.as_millis() as u64, "read timeout");
                self.conn.touch();
                self.dispatch(|handler, conn| handler.read_timeout(conn));
                return Ok(PollEvent::ReadTimeout);
            }
        }

        Ok(PollEvent::Idle)
    }

    /// Reads up to `buffer.len()` bytes. See [`Connection::read`].
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.conn.read(buffer)
    }

    /// Peeks up to `buffer.len()` bytes. See [`Connection::peek`].
    pub fn peek(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.conn.peek(buffer)
    }

    /// Sends `bytes`. See [`Connection::write`].
    pub fn write(&self, bytes: &[u8]) -> io::Result<usize> {
        self.conn.write(bytes)
    }

    /// Closes the connection, delivering `disconnect` once.
    ///
    /// Returns `false` if the client was not connected; in that case the
    /// handler is not called.
    pub fn close(&mut self) -> bool {
        let closed = self.conn.close();
        self.flush_disconnect();
        closed
    }

    fn resolve(&self) -> Result<SocketAddr> {
        let config = self.conn.config();
        let resolve_error = |source| Error::Resolve {
            address: config.address.clone(),
            port: config.port,
            source,
        };

        (config.address.as_str(), config.port)
            .to_socket_addrs()
            .map_err(resolve_error)?
            .next()
            .ok_or_else(|| {
                resolve_error(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses returned",
                ))
            })
    }

    /// Runs one handler callback, then delivers a `disconnect` the
    /// callback may have caused.
    fn dispatch(&mut self, callback: impl FnOnce(&mut H, &mut Connection)) {
        callback(&mut self.handler, &mut self.conn);
        self.flush_disconnect();
    }

    fn flush_disconnect(&mut self) {
        if self.conn.take_disconnect_pending() {
            debug!(addr = ?self.conn.remote_addr(), "disconnected");
            self.handler.disconnect(&mut self.conn);
            self.conn.release_socket();
        }
    }
}

/// Retries a non-blocking connect once per millisecond of budget.
///
/// Returns `Ok(false)` when the budget runs out.
fn connect_bounded(socket: &Socket, addr: &SocketAddr, budget_ms: u64) -> io::Result<bool> {
    for _ in 0..budget_ms {
        match socket.connect(addr) {
            Ok(()) => return Ok(true),
            Err(e) if sys_already_connected(&e) => return Ok(true),
            Err(e) if sys_connect_in_progress(&e) => {}
            Err(e) => return Err(e),
        }

        let readiness = socket.poll(Interest::WRITE, CONNECT_TICK)?;
        if readiness.writable || readiness.error || readiness.hangup {
            socket.take_error()?;

            if readiness.writable && !readiness.hangup {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

fn connect_blocking(socket: &Socket, addr: &SocketAddr) -> io::Result<bool> {
    match socket.connect(addr) {
        Ok(()) => Ok(true),
        Err(e) if sys_already_connected(&e) => Ok(true),
        Err(e) if sys_connect_in_progress(&e) => {
            trace!(%addr, error = %e, "blocking connect interrupted, waiting");
            await_connected(socket)
        }
        Err(e) => Err(e),
    }
}

/// Waits without a deadline for a handshake the kernel kept running
/// after `connect` returned early, then reads its outcome from
/// `SO_ERROR`.
fn await_connected(socket: &Socket) -> io::Result<bool> {
    loop {
        let readiness = socket.poll(Interest::WRITE, RESUME_TICK)?;
        if !(readiness.writable || readiness.error || readiness.hangup) {
            continue;
        }

        socket.take_error()?;

        if readiness.hangup {
            return Err(io::ErrorKind::ConnectionReset.into());
        }
        return Ok(true);
    }
}
