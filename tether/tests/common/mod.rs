#![allow(dead_code)]

use tether::net::{ClientHandler, Connection, PollEvent, TcpClient};

use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    BeforeConnect,
    Connect,
    ConnectTimeout,
    Data,
    ReadTimeout,
    Disconnect,
}

/// Records every callback and optionally consumes or closes on data.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<(Event, Instant)>,
    pub received: Vec<u8>,
    pub consume: bool,
    pub close_on_data: bool,
    pub connected_during_disconnect: Option<bool>,
}

impl Recorder {
    pub fn consuming() -> Self {
        Self {
            consume: true,
            ..Self::default()
        }
    }

    pub fn kinds(&self) -> Vec<Event> {
        self.events.iter().map(|(event, _)| *event).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.iter().filter(|(e, _)| *e == event).count()
    }

    pub fn times(&self, event: Event) -> Vec<Instant> {
        self.events
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, at)| *at)
            .collect()
    }

    fn record(&mut self, event: Event) {
        self.events.push((event, Instant::now()));
    }
}

impl ClientHandler for Recorder {
    fn before_connect(&mut self, _conn: &mut Connection) {
        self.record(Event::BeforeConnect);
    }

    fn connect(&mut self, _conn: &mut Connection) {
        self.record(Event::Connect);
    }

    fn connect_timeout(&mut self, _conn: &mut Connection) {
        self.record(Event::ConnectTimeout);
    }

    fn data(&mut self, conn: &mut Connection) {
        self.record(Event::Data);

        if self.consume {
            let mut buffer = [0u8; 4096];
            if let Ok(n) = conn.read(&mut buffer) {
                self.received.extend_from_slice(&buffer[..n]);
            }
        }

        if self.close_on_data {
            conn.close();
        }
    }

    fn read_timeout(&mut self, _conn: &mut Connection) {
        self.record(Event::ReadTimeout);
    }

    fn disconnect(&mut self, conn: &mut Connection) {
        self.connected_during_disconnect = Some(conn.is_connected());
        self.record(Event::Disconnect);
    }
}

pub fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    (listener, addr)
}

/// Returns a loopback port nothing listens on.
pub fn closed_port() -> u16 {
    let (listener, addr) = listener();
    drop(listener);
    addr.port()
}

/// Polls every millisecond until `done` holds or `limit` elapses.
pub fn poll_until<H, F>(client: &mut TcpClient<H>, limit: Duration, mut done: F) -> bool
where
    H: ClientHandler,
    F: FnMut(&TcpClient<H>, PollEvent) -> bool,
{
    let started = Instant::now();

    while started.elapsed() < limit {
        let event = client.poll().expect("poll failed");
        if done(&*client, event) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }

    false
}

/// Polls every millisecond for `period`, collecting non-idle events.
pub fn poll_for<H: ClientHandler>(client: &mut TcpClient<H>, period: Duration) -> Vec<PollEvent> {
    let mut seen = Vec::new();
    poll_until(client, period, |_, event| {
        if event != PollEvent::Idle {
            seen.push(event);
        }
        false
    });
    seen
}
