//! Core types for the blethru link tester
//!
//! Fundamental identifiers and enumerations shared by the state machine, the
//! radio-stack channel types, and the display snapshot.

use core::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Role
// ----------------------------------------------------------------------------

/// Connection role of this peer.
///
/// The responder advertises, accepts the connection, and sources data. The
/// initiator scans, connects, subscribes, and sinks data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Initiator,
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}

// ----------------------------------------------------------------------------
// Connection Handle
// ----------------------------------------------------------------------------

/// Opaque per-connection handle assigned by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle(pub u8);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Device Address
// ----------------------------------------------------------------------------

/// Six-byte link-layer device address, as reported in scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BdAddr(pub [u8; 6]);

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ----------------------------------------------------------------------------
// PHY
// ----------------------------------------------------------------------------

/// Physical-layer transmission mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phy {
    /// 1 Mbit/s uncoded
    OneM,
    /// 2 Mbit/s uncoded
    TwoM,
    /// 125 kbit/s long-range coded (S=8)
    CodedS8,
}

impl Phy {
    /// Next PHY in the user-facing change cycle: 1M -> 2M -> Coded S8 -> 1M
    pub fn next(self) -> Phy {
        match self {
            Phy::OneM => Phy::TwoM,
            Phy::TwoM => Phy::CodedS8,
            Phy::CodedS8 => Phy::OneM,
        }
    }

    /// Toggle between the two PHYs usable for scanning (1M and Coded S8)
    pub fn toggled_scan_phy(self) -> Phy {
        match self {
            Phy::CodedS8 => Phy::OneM,
            _ => Phy::CodedS8,
        }
    }

    /// PHY to request the connection on. The 2M PHY cannot carry the initial
    /// connection, so a 2M preference connects on 1M and upgrades afterwards.
    pub fn connect_phy(self) -> Phy {
        match self {
            Phy::TwoM => Phy::OneM,
            other => other,
        }
    }

    /// Canonical connection interval for this PHY, in 1.25 ms units
    pub fn canonical_interval(self) -> u16 {
        match self {
            Phy::OneM => 40,    // 50 ms
            Phy::TwoM => 20,    // 25 ms
            Phy::CodedS8 => 160, // 200 ms
        }
    }

    /// Canonical supervision timeout for this PHY, in 10 ms units
    pub fn supervision_timeout(self) -> u16 {
        match self {
            Phy::OneM | Phy::TwoM => 100, // 1000 ms
            Phy::CodedS8 => 200,          // 2000 ms
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phy::OneM => "1M",
            Phy::TwoM => "2M",
            Phy::CodedS8 => "CODED S8",
        }
    }
}

impl fmt::Display for Phy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ----------------------------------------------------------------------------
// Data Channels
// ----------------------------------------------------------------------------

/// The two logical data-subscription channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Unacknowledged high-rate stream
    BestEffort,
    /// Flow-controlled stream with per-message delivery confirmation
    Ack,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::BestEffort => write!(f, "best-effort"),
            ChannelId::Ack => write!(f, "ack"),
        }
    }
}

// ----------------------------------------------------------------------------
// Soft Timers
// ----------------------------------------------------------------------------

/// Handles for the soft timers armed through the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerId {
    /// Periodic status-refresh tick (link quality read + display update)
    DisplayRefresh,
    /// One-shot fixed-duration burst limit
    FixedTransfer,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phy_change_cycle_covers_all_modes() {
        assert_eq!(Phy::OneM.next(), Phy::TwoM);
        assert_eq!(Phy::TwoM.next(), Phy::CodedS8);
        assert_eq!(Phy::CodedS8.next(), Phy::OneM);
    }

    #[test]
    fn two_m_connects_on_one_m() {
        assert_eq!(Phy::TwoM.connect_phy(), Phy::OneM);
        assert_eq!(Phy::OneM.connect_phy(), Phy::OneM);
        assert_eq!(Phy::CodedS8.connect_phy(), Phy::CodedS8);
    }

    #[test]
    fn scan_phy_toggles_between_one_m_and_coded() {
        assert_eq!(Phy::OneM.toggled_scan_phy(), Phy::CodedS8);
        assert_eq!(Phy::CodedS8.toggled_scan_phy(), Phy::OneM);
        // 2M is not a scanning PHY, toggling from it lands on coded
        assert_eq!(Phy::TwoM.toggled_scan_phy(), Phy::CodedS8);
    }
}
