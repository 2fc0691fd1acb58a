//! Platform-specific socket primitives.
//!
//! This module provides a unified interface over the raw socket calls
//! the client engine needs: creation, blocking mode, connect, a
//! single-descriptor readiness check, peekable receive and send.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

pub(crate) mod common;
pub(crate) mod socket;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
pub(crate) use windows as platform;

pub(crate) use common::Interest;
pub(crate) use socket::Socket;
