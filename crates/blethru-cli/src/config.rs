//! CLI configuration
//!
//! Settings come from an optional TOML file layered under the command-line
//! arguments: CLI args > config file > defaults. The merged result resolves
//! into the core [`TesterConfig`] for each spawned role.

use std::path::Path;

use serde::{Deserialize, Serialize};

use blethru_core::{config, BurstLimit, Phy, Role, TesterConfig, TICKS_PER_SECOND};

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the blethru CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Advertised device name the initiator matches against
    pub device_name: String,

    /// PHY preference for the connection
    pub phy: Phy,

    /// Best-effort payload cap in bytes; 0 lets the negotiator pack packets
    pub best_effort_cap: u16,

    /// Ack payload cap in bytes; 0 uses the full negotiated limit
    pub ack_cap: u16,

    /// How a burst ends
    pub burst: BurstConfig,

    /// How long an unbounded demo burst is held open, in seconds
    pub hold_seconds: u32,
}

/// Burst termination settings. Setting both `count` and `seconds` is a
/// fatal configuration error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BurstConfig {
    /// End the burst after this many messages
    pub count: Option<u32>,

    /// End the burst after this many seconds
    pub seconds: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_name: config::DEVICE_NAME.to_string(),
            phy: Phy::OneM,
            best_effort_cap: 0,
            ack_cap: 0,
            burst: BurstConfig::default(),
            hold_seconds: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Resolve the burst settings into the core limit
    pub fn burst_limit(&self) -> Result<BurstLimit> {
        match (self.burst.count, self.burst.seconds) {
            (Some(_), Some(_)) => Err(CliError::Config(
                "burst count and burst seconds are mutually exclusive".into(),
            )),
            (Some(count), None) => Ok(BurstLimit::FixedCount(count)),
            (None, Some(seconds)) => Ok(BurstLimit::FixedDuration(
                seconds.saturating_mul(TICKS_PER_SECOND),
            )),
            (None, None) => Ok(BurstLimit::Unbounded),
        }
    }

    /// Build the core configuration for one role
    pub fn tester_config(&self, role: Role) -> Result<TesterConfig> {
        let mut tester = TesterConfig::new(role);
        tester.device_name = self.device_name.clone();
        tester.initial_phy = self.phy;
        tester.best_effort_cap = self.best_effort_cap;
        tester.ack_cap = self.ack_cap;
        tester.burst_limit = self.burst_limit()?;
        tester.validate()?;
        Ok(tester)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_an_unbounded_tester() {
        let config = AppConfig::default();
        let tester = config.tester_config(Role::Responder).unwrap();
        assert_eq!(tester.device_name, "Throughput Tester");
        assert_eq!(tester.burst_limit, BurstLimit::Unbounded);
    }

    #[test]
    fn toml_file_settings_parse() {
        let config: AppConfig = toml::from_str(
            r#"
            device_name = "Bench Rig"
            phy = "TwoM"
            ack_cap = 100

            [burst]
            count = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.device_name, "Bench Rig");
        assert_eq!(config.phy, Phy::TwoM);
        assert_eq!(config.burst_limit().unwrap(), BurstLimit::FixedCount(500));
    }

    #[test]
    fn seconds_resolve_to_ticks() {
        let mut config = AppConfig::default();
        config.burst.seconds = Some(2);
        assert_eq!(
            config.burst_limit().unwrap(),
            BurstLimit::FixedDuration(2 * TICKS_PER_SECOND)
        );
    }

    #[test]
    fn conflicting_limits_are_a_fatal_error() {
        let mut config = AppConfig::default();
        config.burst.count = Some(10);
        config.burst.seconds = Some(5);
        assert!(matches!(config.burst_limit(), Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: core::result::Result<AppConfig, _> = toml::from_str("unknown_key = 1");
        assert!(result.is_err());
    }
}
