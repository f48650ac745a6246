//! Deterministic environment for unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::env::Environment;

/// Environment with a pinned coin flip and counter-based "randomness".
///
/// Room identifiers stay distinct (the counter advances on every draw)
/// while first-player selection is forced, so tests can assert on who
/// starts.
#[derive(Clone)]
pub struct FixedEnv {
    host_first: bool,
    counter: Arc<AtomicU64>,
}

impl FixedEnv {
    /// Environment where the host always wins the coin flip.
    pub fn new() -> Self {
        Self::first_player_host(true)
    }

    /// Pin the first-player coin flip.
    pub fn first_player_host(host_first: bool) -> Self {
        Self { host_first, counter: Arc::new(AtomicU64::new(1)) }
    }
}

impl Environment for FixedEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let draw = self.counter.fetch_add(1, Ordering::Relaxed).to_be_bytes();
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = draw[i % draw.len()];
        }
    }

    fn wall_clock_secs(&self) -> u64 {
        // 2023-11-14, week 2810.
        1_700_000_000
    }

    fn random_bool(&self) -> bool {
        self.host_first
    }
}
