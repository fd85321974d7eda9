//! Radio-stack event types
//!
//! Everything the core reacts to arrives as one of these pre-decoded,
//! discrete events. Button presses and timer expirations are marshalled into
//! the same stream by the collaborator, so the machine never sees interrupt
//! context. An event whose tag is not meaningful in the current state is
//! ignored, never an error.

use serde::{Deserialize, Serialize};

use crate::types::{BdAddr, ChannelId, ConnectionHandle, Phy, TimerId};

// ----------------------------------------------------------------------------
// Control Attribute
// ----------------------------------------------------------------------------

/// Values a peer can write to the shared burst-control attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstControl {
    /// Begin a burst on the given channel
    Start(ChannelId),
    /// End the burst in progress
    Stop,
}

// ----------------------------------------------------------------------------
// External Signals
// ----------------------------------------------------------------------------

/// Externally-injected user-input signals
///
/// These are produced by button interrupts on the original hardware and reach
/// the core as ordinary events, processed in order by the single event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Responder: begin a best-effort burst (button press)
    BestEffortStart,
    /// Responder: end the best-effort burst (button release)
    BestEffortStop,
    /// Responder: begin an ack burst and hold it open (button press)
    AckStart,
    /// Responder: release the ack burst hold (button release)
    AckStop,
    /// Initiator, connected: request the next PHY in the cycle
    PhyChange,
    /// Initiator, unconnected: toggle the scanning PHY
    ScanPhyChange,
}

// ----------------------------------------------------------------------------
// Event: Radio Stack -> Core
// ----------------------------------------------------------------------------

/// Events consumed by the connection-role state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioEvent {
    /// Radio stack finished booting
    Boot,
    /// A connection was opened; carries the stack-assigned handle
    ConnectionOpened { handle: ConnectionHandle },
    /// The connection was closed (peer action, timeout, or local request)
    ConnectionClosed,
    /// Connection parameters settled: link-layer packet size and interval
    ConnectionParams { pdu_size: u16, interval: u16 },
    /// PHY change completed (or spurious status echo)
    PhyStatus { phy: Phy },
    /// An advertisement was observed while scanning
    ScanResult { address: BdAddr, data: Vec<u8> },
    /// The peer subscribed to or unsubscribed from a data channel
    SubscriptionStatus { channel: ChannelId, subscribed: bool },
    /// A channel-subscription procedure we started has completed
    ProcedureComplete,
    /// The peer wrote the burst-control attribute
    ControlWrite { control: BurstControl },
    /// The peer requested the firmware-maintenance mode
    MaintenanceRequest,
    /// A data message arrived on one of the channels
    MessageReceived { channel: ChannelId, payload: Vec<u8> },
    /// The peer confirmed delivery of the last ack-channel message
    DeliveryConfirmed,
    /// Message-size limit negotiation finished
    MtuExchanged { mtu: u16 },
    /// A link-quality sample, in response to a read-link-quality command
    RssiSample { rssi: i8 },
    /// A marshalled user-input signal
    Signal(Signal),
    /// A soft timer armed through the stack fired
    TimerFired(TimerId),
}
