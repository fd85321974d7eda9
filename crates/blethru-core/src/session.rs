//! Shared session state
//!
//! Single source of truth for the open connection: handle, PHY in use and
//! requested, negotiated sizes, interval, and per-channel subscription flags.
//! Owned by the [`Machine`](crate::machine::Machine) and mutated only from
//! the event loop.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, ConnectionHandle, Phy, Role};

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Connection role of this peer
    pub role: Role,
    /// Handle of the open connection; `None` while disconnected
    pub handle: Option<ConnectionHandle>,
    /// PHY currently in use
    pub phy_in_use: Phy,
    /// Pending PHY change; at most one in flight, cleared on confirmation
    pub phy_requested: Option<Phy>,
    /// Negotiated link-layer packet size; 0 until known
    pub pdu_size: u16,
    /// Negotiated message-size limit; 0 until known
    pub mtu: u16,
    /// Connection interval, in 1.25 ms units; 0 until known
    pub interval: u16,
    /// Peer subscription to the best-effort channel
    pub best_effort_subscribed: bool,
    /// Peer subscription to the ack channel
    pub ack_subscribed: bool,
}

impl Session {
    pub fn new(role: Role, initial_phy: Phy) -> Self {
        Self {
            role,
            handle: None,
            phy_in_use: initial_phy,
            phy_requested: None,
            pdu_size: 0,
            mtu: 0,
            interval: 0,
            best_effort_subscribed: false,
            ack_subscribed: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Subscription flag for one channel
    pub fn subscribed(&self, channel: ChannelId) -> bool {
        match channel {
            ChannelId::BestEffort => self.best_effort_subscribed,
            ChannelId::Ack => self.ack_subscribed,
        }
    }

    pub fn set_subscribed(&mut self, channel: ChannelId, subscribed: bool) {
        match channel {
            ChannelId::BestEffort => self.best_effort_subscribed = subscribed,
            ChannelId::Ack => self.ack_subscribed = subscribed,
        }
    }

    /// Reset everything negotiated, keeping role and current PHY. The caller
    /// decides whether the PHY carries over as the next preference.
    pub fn reset(&mut self) {
        self.handle = None;
        self.phy_requested = None;
        self.pdu_size = 0;
        self.mtu = 0;
        self.interval = 0;
        self.best_effort_subscribed = false;
        self.ack_subscribed = false;
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_negotiated_state_but_keeps_role_and_phy() {
        let mut session = Session::new(Role::Initiator, Phy::TwoM);
        session.handle = Some(ConnectionHandle(1));
        session.pdu_size = 251;
        session.mtu = 247;
        session.interval = 20;
        session.set_subscribed(ChannelId::BestEffort, true);
        session.phy_requested = Some(Phy::CodedS8);

        session.reset();

        assert_eq!(session.role, Role::Initiator);
        assert_eq!(session.phy_in_use, Phy::TwoM);
        assert!(!session.is_connected());
        assert_eq!(session.pdu_size, 0);
        assert_eq!(session.mtu, 0);
        assert_eq!(session.interval, 0);
        assert!(!session.best_effort_subscribed);
        assert!(!session.ack_subscribed);
        assert!(session.phy_requested.is_none());
    }
}
