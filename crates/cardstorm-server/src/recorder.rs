//! Match recorder: the persistent-statistics collaborator.
//!
//! When a match finishes, the driver emits a `RecordMatch` action and
//! the runtime hands the result to a [`MatchRecorder`]. The
//! coordination core holds no historical data and computes no
//! rankings - it only reports `(winner, loser, week)` once per
//! finished match.
//!
//! The trait is synchronous and `Clone` (implementations share state
//! via `Arc`), matching the shape of the rest of the sans-IO core.

use std::sync::{Arc, Mutex};

/// Seconds in one week.
const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

/// Week identifier for a wall-clock timestamp: whole weeks since the
/// Unix epoch. Opaque to the core; the statistics store groups records
/// by it.
pub fn epoch_week(wall_clock_secs: u64) -> u64 {
    wall_clock_secs / WEEK_SECS
}

/// Errors from recording a match result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecorderError {
    /// The backing store rejected the write.
    #[error("failed to record match: {0}")]
    WriteFailed(String),
}

/// One reported match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRecord {
    /// Connection identity of the winner.
    pub winner: u64,
    /// Connection identity of the loser.
    pub loser: u64,
    /// Week identifier (see [`epoch_week`]).
    pub week: u64,
}

/// Win/loss recorder collaborator.
///
/// Must be `Clone + Send + Sync` so the runtime can share it across
/// connection tasks; implementations typically wrap shared state in
/// `Arc`.
pub trait MatchRecorder: Clone + Send + Sync + 'static {
    /// Record one finished match.
    fn record_match(&self, record: MatchRecord) -> Result<(), RecorderError>;
}

/// In-memory recorder for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<MatchRecord>>>,
}

impl MemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records reported so far.
    #[allow(clippy::expect_used)]
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().expect("recorder mutex poisoned").clone()
    }

    /// Wins recorded for a player.
    #[allow(clippy::expect_used)]
    pub fn wins(&self, player: u64) -> usize {
        self.records
            .lock()
            .expect("recorder mutex poisoned")
            .iter()
            .filter(|r| r.winner == player)
            .count()
    }
}

impl MatchRecorder for MemoryRecorder {
    #[allow(clippy::expect_used)]
    fn record_match(&self, record: MatchRecord) -> Result<(), RecorderError> {
        self.records.lock().expect("recorder mutex poisoned").push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_week_boundaries() {
        assert_eq!(epoch_week(0), 0);
        assert_eq!(epoch_week(WEEK_SECS - 1), 0);
        assert_eq!(epoch_week(WEEK_SECS), 1);
        // 2023-11-14 ≈ week 2810
        assert_eq!(epoch_week(1_700_000_000), 1_700_000_000 / WEEK_SECS);
    }

    #[test]
    fn memory_recorder_accumulates() {
        let recorder = MemoryRecorder::new();

        recorder.record_match(MatchRecord { winner: 1, loser: 2, week: 2810 }).unwrap();
        recorder.record_match(MatchRecord { winner: 1, loser: 3, week: 2810 }).unwrap();
        recorder.record_match(MatchRecord { winner: 2, loser: 1, week: 2811 }).unwrap();

        assert_eq!(recorder.records().len(), 3);
        assert_eq!(recorder.wins(1), 2);
        assert_eq!(recorder.wins(3), 0);
    }
}
