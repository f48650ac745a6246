//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` backs the live server: real monotonic time, Tokio sleep,
//! and OS cryptographic randomness via getrandom. Behavior is
//! non-deterministic by design - first-player selection must not be
//! replayable.
//!
//! # Panics
//!
//! Panics if the OS RNG fails. This is intentional - a server that
//! cannot draw secure randomness would hand out guessable session and
//! room identifiers, and RNG failure indicates OS-level breakage.

use std::time::Duration;

use crate::env::Environment;

/// Production environment using system time and cryptographic RNG.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - server cannot operate securely");
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }
}
