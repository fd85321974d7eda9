//! Tester configuration
//!
//! All knobs are resolved once at startup. The mutually exclusive fixed-count
//! and fixed-duration burst limits are a single enum, so the conflict can only
//! arise while parsing user input, where it is a fatal configuration error.

use serde::{Deserialize, Serialize};

use crate::types::{Phy, Role};
use crate::{CoreError, Result};

/// Device name advertised by the responder and matched by the initiator
pub const DEVICE_NAME: &str = "Throughput Tester";

/// Message-size limit ceiling requested from the stack at boot
pub const MAX_MTU: u16 = 250;

/// Default transmit power setpoint, in 0.1 dBm units
pub const TX_POWER: i16 = 100;

/// Advertising interval, in 0.625 ms units (100 ms)
pub const ADV_INTERVAL: u16 = 160;

/// Scan interval and window, in 0.625 ms units (10 ms)
pub const SCAN_INTERVAL: u16 = 16;
pub const SCAN_WINDOW: u16 = 16;

// ----------------------------------------------------------------------------
// Burst Limit
// ----------------------------------------------------------------------------

/// How a transmission burst ends, beyond an explicit stop or disconnection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstLimit {
    /// Burst runs until explicitly stopped
    #[default]
    Unbounded,
    /// Burst ends after this many messages
    FixedCount(u32),
    /// Burst ends after this many hardware ticks
    FixedDuration(u32),
}

impl BurstLimit {
    /// Whether the given progress has reached the count limit
    pub fn count_reached(self, messages_sent: u32) -> bool {
        matches!(self, BurstLimit::FixedCount(n) if messages_sent >= n)
    }

    /// Duration limit in ticks, if one is configured
    pub fn duration_ticks(self) -> Option<u32> {
        match self {
            BurstLimit::FixedDuration(ticks) => Some(ticks),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Tester Configuration
// ----------------------------------------------------------------------------

/// Resolved startup configuration for one tester instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterConfig {
    /// Connection role of this peer
    pub role: Role,
    /// Peer identity string matched against scan results
    pub device_name: String,
    /// PHY preference at boot
    pub initial_phy: Phy,
    /// Burst termination policy
    pub burst_limit: BurstLimit,
    /// Best-effort payload cap; 0 lets the size negotiator pack packets
    pub best_effort_cap: u16,
    /// Ack payload cap; 0 uses the full negotiated limit
    pub ack_cap: u16,
    /// Transmit power setpoint, in 0.1 dBm units
    pub tx_power: i16,
}

impl TesterConfig {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            device_name: DEVICE_NAME.to_string(),
            initial_phy: Phy::OneM,
            burst_limit: BurstLimit::Unbounded,
            best_effort_cap: 0,
            ack_cap: 0,
            tx_power: TX_POWER,
        }
    }

    /// Validate the configuration. Caps beyond the buffer capacity can never
    /// be honored and are rejected up front.
    pub fn validate(&self) -> Result<()> {
        let capacity = crate::payload::DATA_CAPACITY as u16;
        if self.best_effort_cap > capacity || self.ack_cap > capacity {
            return Err(CoreError::Configuration(format!(
                "payload cap exceeds buffer capacity {capacity}"
            )));
        }
        if self.device_name.is_empty() {
            return Err(CoreError::Configuration(
                "device name must not be empty".into(),
            ));
        }
        if let BurstLimit::FixedCount(0) | BurstLimit::FixedDuration(0) = self.burst_limit {
            return Err(CoreError::Configuration(
                "burst limit must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TesterConfig::new(Role::Responder).validate().is_ok());
        assert!(TesterConfig::new(Role::Initiator).validate().is_ok());
    }

    #[test]
    fn oversized_cap_is_rejected() {
        let mut config = TesterConfig::new(Role::Responder);
        config.best_effort_cap = 512;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = TesterConfig::new(Role::Responder);
        config.burst_limit = BurstLimit::FixedCount(0);
        assert!(config.validate().is_err());
    }
}
