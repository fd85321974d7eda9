//! Blethru Core Protocol Logic
//!
//! This crate contains the connection-role logic of the blethru two-peer link
//! throughput tester: the initiator/responder state machines, PHY negotiation,
//! subscription-channel management, payload generation, message-size
//! negotiation, and throughput accounting.
//!
//! Everything here is pure, synchronous, single-owner state. The radio stack
//! is an external collaborator reached only through the typed [`RadioEvent`] /
//! [`RadioCommand`] channel types, so the whole machine can be exercised in
//! tests without any radio or async runtime.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod adv;
pub mod command;
pub mod config;
pub mod event;
pub mod machine;
pub mod payload;
pub mod session;
pub mod sizing;
pub mod snapshot;
pub mod stats;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use command::{CommandOutcome, ConnParams, RadioCommand};
pub use config::{BurstLimit, TesterConfig};
pub use event::{BurstControl, RadioEvent, Signal};
pub use machine::{Machine, TesterState};
pub use payload::PayloadBuffer;
pub use session::Session;
pub use snapshot::{LinkStatus, StatusSnapshot};
pub use stats::{TransferStats, TICKS_PER_SECOND};
pub use types::{BdAddr, ChannelId, ConnectionHandle, Phy, Role, TimerId};

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Core error types for the blethru protocol logic
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = core::result::Result<T, CoreError>;
