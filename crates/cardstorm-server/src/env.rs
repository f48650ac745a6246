//! Environment abstraction for deterministic testing.
//!
//! Decouples coordination logic from system resources (time,
//! randomness). Production uses [`crate::SystemEnv`]; tests supply a
//! seeded environment so first-player selection and room identifiers
//! are reproducible.

use std::time::Duration;

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in
///   production (session and room identifiers must be unguessable)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulation
    /// environments may substitute virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// The only async method in the trait; used by runtime code only,
    /// never by coordination logic.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Seconds since the Unix epoch (wall clock).
    ///
    /// Used for room creation timestamps and the week identifier
    /// reported to the match recorder. Unlike `now()`, this is not
    /// monotonic.
    fn wall_clock_secs(&self) -> u64;

    /// Generates a random `u64`.
    ///
    /// Convenience for session identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random `u128`.
    ///
    /// Convenience for room identifiers.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }

    /// One unbiased random bit.
    ///
    /// The single source of "who goes first"; must not be
    /// deterministic or replayable in production.
    fn random_bool(&self) -> bool {
        let mut byte = [0u8; 1];
        self.random_bytes(&mut byte);
        byte[0] & 1 == 1
    }
}
