use super::tcp::connection::Connection;

/// Application behavior bound to a [`TcpClient`](super::TcpClient).
///
/// The engine invokes these callbacks synchronously from inside
/// [`open`](super::TcpClient::open), [`poll`](super::TcpClient::poll) and
/// [`close`](super::TcpClient::close). Each one receives the
/// [`Connection`] so the handler can read, write or close re-entrantly.
///
/// Only [`data`](Self::data) is required; the engine never consumes
/// bytes on its own, so a handler that ignores `data` would be polled
/// with the same pending bytes forever.
pub trait ClientHandler {
    /// Called once per `open`, after the socket exists and before the
    /// first connect attempt.
    fn before_connect(&mut self, _conn: &mut Connection) {}

    /// Called once the handshake has completed.
    fn connect(&mut self, _conn: &mut Connection) {}

    /// Called when the handshake exhausted its budget. The socket is
    /// released right after this returns.
    fn connect_timeout(&mut self, _conn: &mut Connection) {}

    /// Called whenever at least `read_min_length` bytes can be peeked.
    ///
    /// The bytes are still queued in the socket; consume them with
    /// [`Connection::read`].
    fn data(&mut self, conn: &mut Connection);

    /// Called when no qualifying data arrived within the read timeout
    /// window. Fires again every window while the peer stays silent.
    fn read_timeout(&mut self, _conn: &mut Connection) {}

    /// Called exactly once per successful close, whoever initiated it.
    fn disconnect(&mut self, _conn: &mut Connection) {}
}

impl<H: ClientHandler + ?Sized> ClientHandler for Box<H> {
    fn before_connect(&mut self, conn: &mut Connection) {
        (**self).before_connect(conn)
    }

    fn connect(&mut self, conn: &mut Connection) {
        (**self).connect(conn)
    }

    fn connect_timeout(&mut self, conn: &mut Connection) {
        (**self).connect_timeout(conn)
    }

    fn data(&mut self, conn: &mut Connection) {
        (**self).data(conn)
    }

    fn read_timeout(&mut self, conn: &mut Connection) {
        (**self).read_timeout(conn)
    }

    fn disconnect(&mut self, conn: &mut Connection) {
        (**self).disconnect(conn)
    }
}
