//! A minimal poll loop.
//!
//! The client never schedules itself. Callers that already own an event
//! loop or a timer should call [`TcpClient::poll`] from it. Callers that
//! do not can use a [`Driver`], which polls on the current thread at a
//! fixed interval until told to stop.

use crate::error::Result;
use crate::net::{ClientHandler, TcpClient};

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

/// Default pause between two polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1);

/// Why [`Driver::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    /// The caller's predicate returned `true`.
    Condition,

    /// The client is no longer connected.
    Disconnected,

    /// The driver's deadline passed.
    Deadline,
}

/// Polls a [`TcpClient`] repeatedly on the calling thread.
///
/// # Examples
///
/// ```rust,ignore
/// let stop = Driver::new()
///     .interval(Duration::from_millis(5))
///     .deadline(Duration::from_secs(10))
///     .run(&mut client, |client| client.handler().done)?;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Driver {
    interval: Duration,
    deadline: Option<Duration>,
}

impl Driver {
    /// Creates a driver polling every [`DEFAULT_INTERVAL`] with no deadline.
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            deadline: None,
        }
    }

    /// Sets the pause between two polls.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Bounds the total time spent in [`run`](Self::run).
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Polls `client` until `until` returns `true`, the client
    /// disconnects, or the deadline passes.
    ///
    /// `until` is checked after every poll, so it observes the effects
    /// of the callbacks that poll delivered.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`TcpClient::poll`].
    pub fn run<H, F>(&self, client: &mut TcpClient<H>, mut until: F) -> Result<Stop>
    where
        H: ClientHandler,
        F: FnMut(&TcpClient<H>) -> bool,
    {
        let started = Instant::now();

        let stop = loop {
            if !client.is_connected() {
                break Stop::Disconnected;
            }

            client.poll()?;

            if until(&*client) {
                break Stop::Condition;
            }

            if self.deadline.is_some_and(|deadline| started.elapsed() >= deadline) {
                break Stop::Deadline;
            }

            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        };

        debug!(?stop, elapsed_ms = started.elapsed().as_millis() as u64, "driver stopped");

        Ok(stop)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}
