//! Log output setup.
//!
//! The crate logs through the `tracing` facade and never installs a
//! subscriber on its own. Binaries and demos that want output can call
//! [`init_tracing`] when the `subscriber` feature is enabled.

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `tether=debug`.
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tether=debug"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "subscriber"))]
pub const fn init_tracing() {}
