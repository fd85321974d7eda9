//! Throughput accounting
//!
//! Tracks bits sent and elapsed hardware ticks across one transmission burst.
//! Counters are reset at burst start and the throughput figure is derived
//! once, when the burst ends.

use serde::{Deserialize, Serialize};

/// Hardware clock ticks per second
pub const TICKS_PER_SECOND: u32 = 32_768;

// ----------------------------------------------------------------------------
// Transfer Statistics
// ----------------------------------------------------------------------------

/// Per-burst transfer counters and the last computed throughput
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    /// Bits transferred in the current burst
    pub bits_sent: u64,
    /// Tick at which the burst started
    pub start_tick: u64,
    /// Throughput of the last completed burst, bits per second
    pub throughput_bps: u32,
    /// Messages transferred in the current burst
    pub message_count: u32,
}

impl TransferStats {
    /// Begin a new burst at `now`: zero the counters, keep nothing
    pub fn start_burst(&mut self, now: u64) {
        self.bits_sent = 0;
        self.throughput_bps = 0;
        self.message_count = 0;
        self.start_tick = now;
    }

    /// Account one transferred message of `payload_len` bytes
    pub fn record_message(&mut self, payload_len: usize) {
        self.bits_sent += payload_len as u64 * 8;
        self.message_count += 1;
    }

    /// End the burst at `now` and derive the throughput figure. Zero elapsed
    /// time yields zero throughput rather than a division error.
    pub fn finish_burst(&mut self, now: u64) -> u32 {
        let elapsed = now.saturating_sub(self.start_tick);
        self.throughput_bps = if elapsed == 0 {
            0
        } else {
            (self.bits_sent * TICKS_PER_SECOND as u64 / elapsed) as u32
        };
        self.throughput_bps
    }

    /// Reset everything, as done on disconnection
    pub fn reset(&mut self) {
        *self = TransferStats::default();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_bits_over_elapsed_seconds() {
        let mut stats = TransferStats::default();
        stats.start_burst(0);
        for _ in 0..100 {
            stats.record_message(250);
        }
        // 100 messages * 250 bytes * 8 = 200_000 bits over 2 seconds
        let bps = stats.finish_burst(2 * TICKS_PER_SECOND as u64);
        assert_eq!(bps, 100_000);
        assert_eq!(stats.message_count, 100);
    }

    #[test]
    fn zero_elapsed_time_yields_zero_throughput() {
        let mut stats = TransferStats::default();
        stats.start_burst(1000);
        stats.record_message(100);
        assert_eq!(stats.finish_burst(1000), 0);
    }

    #[test]
    fn burst_start_clears_previous_counters() {
        let mut stats = TransferStats::default();
        stats.start_burst(0);
        stats.record_message(100);
        stats.finish_burst(TICKS_PER_SECOND as u64);
        assert!(stats.throughput_bps > 0);

        stats.start_burst(5000);
        assert_eq!(stats.bits_sent, 0);
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.throughput_bps, 0);
        assert_eq!(stats.start_tick, 5000);
    }
}
