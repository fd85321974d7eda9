//! Radio-stack command types
//!
//! Commands are the only side effects the state machine produces. The runtime
//! hands them to the radio-stack collaborator, which reports acceptance
//! through [`CommandOutcome`]; a transiently busy stack is retried by the
//! runtime's bounded-retry policy rather than an unbounded spin.

use serde::{Deserialize, Serialize};

use crate::event::BurstControl;
use crate::types::{BdAddr, ChannelId, ConnectionHandle, Phy, TimerId};

// ----------------------------------------------------------------------------
// Connection Parameters
// ----------------------------------------------------------------------------

/// Connection-parameter set negotiated for a PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnParams {
    /// Min/max connection interval, in 1.25 ms units (pinned equal)
    pub interval: u16,
    /// Peripheral latency in skippable intervals
    pub latency: u16,
    /// Supervision timeout in 10 ms units
    pub supervision_timeout: u16,
}

impl ConnParams {
    /// Canonical parameters for a PHY
    pub fn for_phy(phy: Phy) -> Self {
        Self {
            interval: phy.canonical_interval(),
            latency: 0,
            supervision_timeout: phy.supervision_timeout(),
        }
    }
}

// ----------------------------------------------------------------------------
// Command: Core -> Radio Stack
// ----------------------------------------------------------------------------

/// Commands issued to the radio-stack collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioCommand {
    /// Begin connectable advertising (responder)
    StartAdvertising {
        /// Advertising interval, in 0.625 ms units
        interval: u16,
    },
    /// Stop all advertising sets
    StopAdvertising,
    /// Begin observation scanning on the given PHY (initiator)
    StartScanning {
        phy: Phy,
        /// Scan interval and window, in 0.625 ms units
        interval: u16,
        window: u16,
    },
    /// Stop the scanning procedure
    StopScanning,
    /// Initiate a connection to a scanned peer
    Connect { address: BdAddr, phy: Phy },
    /// Close the open connection
    Disconnect { handle: ConnectionHandle },
    /// Request a PHY change on the open connection
    RequestPhy { handle: ConnectionHandle, phy: Phy },
    /// Negotiate connection parameters
    SetConnParams {
        handle: ConnectionHandle,
        params: ConnParams,
    },
    /// Subscribe to a data channel on the peer
    Subscribe { channel: ChannelId },
    /// Request the negotiated message-size limit ceiling
    SetMaxMtu { mtu: u16 },
    /// Set the transmit power setpoint, in 0.1 dBm units
    SetTxPower { half_db: i16 },
    /// Post one best-effort message
    SendBestEffort { payload: Vec<u8> },
    /// Post one ack-channel message; the stack delivers a
    /// [`RadioEvent::DeliveryConfirmed`] once the peer confirms it
    ///
    /// [`RadioEvent::DeliveryConfirmed`]: crate::event::RadioEvent::DeliveryConfirmed
    SendAck { payload: Vec<u8> },
    /// Confirm a received ack-channel message back to the sender
    ConfirmAck { handle: ConnectionHandle },
    /// Write the shared burst-control attribute on the peer
    WriteControl { control: BurstControl },
    /// Publish the computed throughput figure for the peer to read
    PublishResult { throughput_bps: u32 },
    /// Read the current link quality; answered by an `RssiSample` event
    ReadLinkQuality { handle: ConnectionHandle },
    /// Arm a soft timer for `ticks` hardware ticks
    StartTimer {
        id: TimerId,
        ticks: u32,
        one_shot: bool,
    },
    /// Disarm a soft timer
    StopTimer { id: TimerId },
    /// Reset the device into firmware-maintenance mode
    ResetToMaintenance,
}

// ----------------------------------------------------------------------------
// Command Outcome
// ----------------------------------------------------------------------------

/// Result of submitting a command to the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// The stack accepted the command
    Accepted,
    /// The stack is transiently busy; the command may be retried
    Busy,
    /// The stack rejected the command outright
    Error,
}

impl CommandOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }
}
