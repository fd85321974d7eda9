//! Display snapshot
//!
//! Read-only view of session and transfer state consumed by the display
//! collaborator. The core never renders anything; it only exposes this
//! struct, refreshed by the runtime after every loop iteration.

use serde::{Deserialize, Serialize};

use crate::types::{Phy, Role};

// ----------------------------------------------------------------------------
// Link Status
// ----------------------------------------------------------------------------

/// Coarse link status for the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    /// Advertising or scanning, no connection
    Disconnected,
    /// Connection open
    Connected,
}

// ----------------------------------------------------------------------------
// Status Snapshot
// ----------------------------------------------------------------------------

/// One refresh of everything the display shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub role: Role,
    pub link: LinkStatus,
    pub phy: Phy,
    /// Connection interval in 1.25 ms units; 0 until negotiated
    pub interval: u16,
    pub pdu_size: u16,
    pub mtu: u16,
    /// Negotiated best-effort message size
    pub best_effort_size: u16,
    /// Negotiated ack message size
    pub ack_size: u16,
    pub best_effort_subscribed: bool,
    pub ack_subscribed: bool,
    /// Throughput of the last completed burst, bits per second
    pub throughput_bps: u32,
    /// Messages transferred in the current or last burst
    pub message_count: u32,
    /// Last link-quality sample, if any
    pub rssi: Option<i8>,
    /// Transmit power setpoint, 0.1 dBm units
    pub tx_power: i16,
}

impl StatusSnapshot {
    /// Connection interval in milliseconds, for human-readable output
    pub fn interval_ms(&self) -> f32 {
        self.interval as f32 * 1.25
    }
}
