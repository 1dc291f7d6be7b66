//! Monotonic time sources for stamping key signals.
//!
//! All timestamps handled by the capture core are `f64` seconds relative to
//! an arbitrary origin. Only differences between timestamps are meaningful.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic clock reading seconds.
pub trait Clock: Send + Sync {
    /// Current reading in seconds. Never decreases between calls.
    fn now(&self) -> f64;
}

/// Thread-safe shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-independent clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Create a shared handle to a fresh monotonic clock.
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock for deterministic tests and scripted sessions.
///
/// The reading is stored as raw `f64` bits so the clock can be shared
/// across threads without a lock.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `0.0`.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Create a clock reading `secs`.
    pub fn starting_at(secs: f64) -> Self {
        Self {
            bits: AtomicU64::new(secs.to_bits()),
        }
    }

    /// Set the reading. Moving backwards is allowed here; the recorder
    /// clamps out-of-order timestamps.
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    /// Move the reading forward by `secs`.
    pub fn advance(&self, secs: f64) {
        let next = self.now() + secs;
        self.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), 0.0);

        clock.set(1.5);
        assert_eq!(clock.now(), 1.5);

        clock.advance(0.25);
        assert_eq!(clock.now(), 1.75);
    }

    #[test]
    fn test_manual_clock_as_shared() {
        let clock = Arc::new(ManualClock::starting_at(2.0));
        let shared: SharedClock = clock.clone();
        clock.advance(1.0);
        assert_eq!(shared.now(), 3.0);
    }
}
