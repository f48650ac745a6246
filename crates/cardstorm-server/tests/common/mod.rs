//! Shared test support: a seeded environment and sample payloads.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use cardstorm_proto::{CardPlay, StateSnapshot, TurnSnapshot};
use cardstorm_server::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic environment driven by a seeded ChaCha RNG.
///
/// Every draw (room IDs, the first-player coin flip) is reproducible
/// from the seed.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    wall_clock_secs: u64,
}

impl SimEnv {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            wall_clock_secs: 1_700_000_000,
        }
    }
}

impl Environment for SimEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap().fill_bytes(buffer);
    }

    fn wall_clock_secs(&self) -> u64 {
        self.wall_clock_secs
    }
}

pub fn sample_play(card_id: &str, damage: i32) -> CardPlay {
    CardPlay {
        card_id: card_id.to_string(),
        card_name: None,
        damage,
        effects: serde_json::Value::Null,
        attacker_hp: 20,
        attacker_shield: 0,
        new_opponent_hp: 20 - damage,
        new_opponent_shield: 0,
    }
}

pub fn sample_turn_snapshot(hp: i32) -> TurnSnapshot {
    TurnSnapshot {
        hp,
        shield: 0,
        status_effects: serde_json::Value::Null,
        energy: 3,
        turn: 1,
    }
}

pub fn sample_state_snapshot(hp: i32) -> StateSnapshot {
    StateSnapshot {
        hp,
        shield: 2,
        status_effects: serde_json::Value::Null,
        energy: 1,
        turn: 2,
        boss_hp: 15,
        boss_shield: 1,
    }
}
