//! Tick clock
//!
//! The state machine accounts time in hardware ticks. [`SystemTickClock`]
//! maps the host monotonic clock onto that tick domain; tests substitute
//! their own [`TickClock`] to make throughput figures deterministic.

use std::time::{Duration, Instant};

use blethru_core::TICKS_PER_SECOND;

/// Source of the current time in hardware ticks
pub trait TickClock: Send {
    fn now_ticks(&self) -> u64;
}

/// Tick clock backed by the host monotonic clock
pub struct SystemTickClock {
    origin: Instant,
}

impl SystemTickClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock for SystemTickClock {
    fn now_ticks(&self) -> u64 {
        duration_to_ticks(self.origin.elapsed())
    }
}

/// Convert a wall duration into hardware ticks
pub fn duration_to_ticks(duration: Duration) -> u64 {
    duration.as_micros() as u64 * TICKS_PER_SECOND as u64 / 1_000_000
}

/// Convert hardware ticks into a wall duration
pub fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::from_micros(ticks * 1_000_000 / TICKS_PER_SECOND as u64)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_conversion_round_trips_whole_seconds() {
        assert_eq!(duration_to_ticks(Duration::from_secs(1)), TICKS_PER_SECOND as u64);
        assert_eq!(
            ticks_to_duration(TICKS_PER_SECOND as u64),
            Duration::from_secs(1)
        );
        assert_eq!(duration_to_ticks(Duration::from_secs(0)), 0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemTickClock::new();
        let a = clock.now_ticks();
        let b = clock.now_ticks();
        assert!(b >= a);
    }
}
