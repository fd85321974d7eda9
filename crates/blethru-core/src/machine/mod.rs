//! Connection-role state machine
//!
//! One [`Machine`] owns the whole mutable state of the tester: session,
//! transfer statistics, payload buffers, and the current [`TesterState`].
//! Each event-loop iteration calls [`Machine::step`] with the next radio
//! event (or `None` when the stack had nothing), which dispatches through the
//! role-specific transition table and then, unconditionally, through the
//! universal handler. All side effects come back as [`RadioCommand`]s.
//!
//! The machine is deliberately free of I/O so every transition can be tested
//! by feeding events and inspecting the returned commands.

mod initiator;
mod responder;
mod universal;

use tracing::debug;

use crate::command::{ConnParams, RadioCommand};
use crate::config::{self, BurstLimit, TesterConfig};
use crate::event::{BurstControl, RadioEvent};
use crate::payload::PayloadBuffer;
use crate::session::Session;
use crate::sizing;
use crate::snapshot::{LinkStatus, StatusSnapshot};
use crate::stats::{TransferStats, TICKS_PER_SECOND};
use crate::types::{ChannelId, Phy, Role, TimerId};
use crate::Result;

// ----------------------------------------------------------------------------
// Tester State
// ----------------------------------------------------------------------------

/// The sole driver of which actions are legal.
///
/// There is no terminal state: disconnection always returns to
/// `AwaitingConnection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesterState {
    /// Advertising (responder) or scanning (initiator)
    AwaitingConnection,
    /// Connection open, no channel subscribed yet
    Connected,
    SubscribedBestEffort,
    SubscribedAck,
    /// Both channels subscribed (the initiator's fully-subscribed state)
    SubscribedBoth,
    /// Initiator-only: counting received data during a burst
    Receiving,
    /// Responder-only: streaming unacknowledged messages
    SendingBestEffort,
    /// Responder-only: one ack message in flight at a time
    SendingAck,
}

impl TesterState {
    /// Whether a responder burst is in progress
    pub fn is_sending(self) -> bool {
        matches!(self, TesterState::SendingBestEffort | TesterState::SendingAck)
    }

    /// Whether at least one channel subscription is established
    pub fn is_subscribed(self) -> bool {
        matches!(
            self,
            TesterState::SubscribedBestEffort
                | TesterState::SubscribedAck
                | TesterState::SubscribedBoth
        )
    }
}

/// Commands produced by one dispatch
pub type Effects = Vec<RadioCommand>;

// ----------------------------------------------------------------------------
// Machine
// ----------------------------------------------------------------------------

/// The connection-role state machine and all state it mutates
#[derive(Debug)]
pub struct Machine {
    pub(crate) config: TesterConfig,
    pub(crate) state: TesterState,
    pub(crate) session: Session,
    pub(crate) stats: TransferStats,
    pub(crate) best_effort: PayloadBuffer,
    pub(crate) ack: PayloadBuffer,
    /// Advertising stopped once a subscription was established
    pub(crate) adv_stopped: bool,
    /// An ack message is in flight, unconfirmed
    pub(crate) waiting_for_confirmation: bool,
    /// The ack-burst button is held down
    pub(crate) ack_button_held: bool,
    /// Ack burst was started by a peer write, keep going until told to stop
    pub(crate) ack_burst_latched: bool,
    /// The fixed-duration burst timer has fired
    pub(crate) fixed_time_expired: bool,
    /// Peer requested maintenance mode; acted on at connection close
    pub(crate) maintenance_requested: bool,
    pub(crate) rssi: Option<i8>,
}

impl Machine {
    pub fn new(config: TesterConfig) -> Result<Self> {
        config.validate()?;
        let session = Session::new(config.role, config.initial_phy);
        Ok(Self {
            config,
            state: TesterState::AwaitingConnection,
            session,
            stats: TransferStats::default(),
            best_effort: PayloadBuffer::new(),
            ack: PayloadBuffer::new(),
            adv_stopped: false,
            waiting_for_confirmation: false,
            ack_button_held: false,
            ack_burst_latched: false,
            fixed_time_expired: false,
            maintenance_requested: false,
            rssi: None,
        })
    }

    pub fn state(&self) -> TesterState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    /// One event-loop iteration: per-state housekeeping, role dispatch for
    /// the event (if any), then the universal handler.
    pub fn step(&mut self, now: u64, event: Option<&RadioEvent>, out: &mut Effects) {
        self.drive(out);
        if let Some(event) = event {
            let before = self.state;
            match self.session.role {
                Role::Responder => responder::dispatch(self, now, event, out),
                Role::Initiator => initiator::dispatch(self, now, event, out),
            }
            universal::dispatch(self, now, event, out);
            if self.state != before {
                debug!(from = ?before, to = ?self.state, "state transition");
            }
        }
    }

    /// Feedback from the runtime: the stack accepted a send command. For the
    /// best-effort stream this is where a message is accounted and the next
    /// payload generated; for the ack stream it arms the confirmation wait.
    pub fn note_sent(&mut self, channel: ChannelId, now: u64, out: &mut Effects) {
        match (channel, self.state) {
            (ChannelId::BestEffort, TesterState::SendingBestEffort) => {
                self.stats.record_message(self.best_effort.len());
                self.best_effort.regenerate();
                if self.config.burst_limit.count_reached(self.stats.message_count) {
                    self.finish_burst(now, true, out);
                    self.state = self.fallback_subscribed_state();
                }
            }
            (ChannelId::Ack, TesterState::SendingAck) => {
                self.waiting_for_confirmation = true;
            }
            _ => {}
        }
    }

    /// Read-only view for the display collaborator
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            role: self.session.role,
            link: if self.session.is_connected() {
                LinkStatus::Connected
            } else {
                LinkStatus::Disconnected
            },
            phy: self.session.phy_in_use,
            interval: self.session.interval,
            pdu_size: self.session.pdu_size,
            mtu: self.session.mtu,
            best_effort_size: self.best_effort.len() as u16,
            ack_size: self.ack.len() as u16,
            best_effort_subscribed: self.session.best_effort_subscribed,
            ack_subscribed: self.session.ack_subscribed,
            throughput_bps: self.stats.throughput_bps,
            message_count: self.stats.message_count,
            rssi: self.rssi,
            tx_power: self.config.tx_power,
        }
    }

    // ------------------------------------------------------------------
    // Per-iteration housekeeping
    // ------------------------------------------------------------------

    /// State-dependent work performed every iteration, event or not
    fn drive(&mut self, out: &mut Effects) {
        match self.session.role {
            Role::Responder => {
                // Advertising stays up until the first subscription so a
                // second observer can still find the device.
                if self.state.is_subscribed() && !self.adv_stopped {
                    out.push(RadioCommand::StopAdvertising);
                    self.adv_stopped = true;
                }
                if self.state == TesterState::SendingBestEffort {
                    out.push(RadioCommand::SendBestEffort {
                        payload: self.best_effort.bytes().to_vec(),
                    });
                }
            }
            Role::Initiator => {
                if matches!(self.state, TesterState::Connected | TesterState::SubscribedBoth) {
                    if let (Some(handle), Some(phy)) =
                        (self.session.handle, self.session.phy_requested)
                    {
                        out.push(RadioCommand::RequestPhy { handle, phy });
                    }
                }
                // Subscribe once the PHY change settled and the interval
                // reached the PHY's canonical value.
                if self.state == TesterState::Connected
                    && self.session.phy_requested.is_none()
                    && self.session.interval != 0
                    && self.session.interval == self.session.phy_in_use.canonical_interval()
                {
                    out.push(RadioCommand::Subscribe {
                        channel: ChannelId::BestEffort,
                    });
                    self.state = TesterState::SubscribedBestEffort;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Shared helpers for the role dispatchers
    // ------------------------------------------------------------------

    /// Full reset on boot or disconnection, then resume advertising or
    /// scanning. The last-used PHY carries over as the next connection's
    /// change preference.
    pub(crate) fn reset_and_resume(&mut self, out: &mut Effects) {
        let last_phy = self.session.phy_in_use;
        self.session.reset();
        self.stats.reset();
        self.best_effort.clear();
        self.ack.clear();
        self.adv_stopped = false;
        self.waiting_for_confirmation = false;
        self.ack_button_held = false;
        self.ack_burst_latched = false;
        self.fixed_time_expired = false;
        self.rssi = None;
        self.state = TesterState::AwaitingConnection;

        if self.maintenance_requested {
            out.push(RadioCommand::ResetToMaintenance);
            return;
        }

        self.session.phy_requested = Some(last_phy);
        out.push(RadioCommand::SetMaxMtu { mtu: config::MAX_MTU });
        out.push(RadioCommand::SetTxPower {
            half_db: self.config.tx_power,
        });
        out.push(RadioCommand::StartTimer {
            id: TimerId::DisplayRefresh,
            ticks: TICKS_PER_SECOND,
            one_shot: false,
        });
        self.setup_adv_scan(out);
    }

    /// Resume the role's discovery side: advertise or scan
    pub(crate) fn setup_adv_scan(&mut self, out: &mut Effects) {
        match self.session.role {
            Role::Responder => {
                self.adv_stopped = false;
                out.push(RadioCommand::StartAdvertising {
                    interval: config::ADV_INTERVAL,
                });
            }
            Role::Initiator => {
                let phy = match self.session.phy_in_use {
                    Phy::CodedS8 => Phy::CodedS8,
                    _ => Phy::OneM,
                };
                out.push(RadioCommand::StartScanning {
                    phy,
                    interval: config::SCAN_INTERVAL,
                    window: config::SCAN_WINDOW,
                });
            }
        }
    }

    /// Begin a burst on `channel`: zero the counters, tell the peer to stop
    /// refreshing its display, and arm the fixed-duration timer if one is
    /// configured.
    pub(crate) fn start_burst(&mut self, now: u64, channel: ChannelId, out: &mut Effects) {
        self.stats.start_burst(now);
        out.push(RadioCommand::WriteControl {
            control: BurstControl::Start(channel),
        });
        out.push(RadioCommand::StopTimer {
            id: TimerId::DisplayRefresh,
        });
        if let Some(ticks) = self.config.burst_limit.duration_ticks() {
            self.fixed_time_expired = false;
            out.push(RadioCommand::StartTimer {
                id: TimerId::FixedTransfer,
                ticks,
                one_shot: true,
            });
        }
    }

    /// End the burst: derive the throughput figure, resume the display
    /// timer, and publish the result. `notify_peer` writes the stop marker
    /// to the peer and is skipped when the peer ended the burst itself.
    pub(crate) fn finish_burst(&mut self, now: u64, notify_peer: bool, out: &mut Effects) {
        let throughput_bps = self.stats.finish_burst(now);
        if notify_peer {
            out.push(RadioCommand::WriteControl {
                control: BurstControl::Stop,
            });
        }
        if self.config.burst_limit.duration_ticks().is_some() {
            out.push(RadioCommand::StopTimer {
                id: TimerId::FixedTransfer,
            });
        }
        out.push(RadioCommand::StartTimer {
            id: TimerId::DisplayRefresh,
            ticks: TICKS_PER_SECOND,
            one_shot: false,
        });
        out.push(RadioCommand::PublishResult { throughput_bps });
    }

    /// The subscribed state matching the current channel flags
    pub(crate) fn fallback_subscribed_state(&self) -> TesterState {
        match (
            self.session.best_effort_subscribed,
            self.session.ack_subscribed,
        ) {
            (true, true) => TesterState::SubscribedBoth,
            (true, false) => TesterState::SubscribedBestEffort,
            (false, true) => TesterState::SubscribedAck,
            (false, false) => TesterState::Connected,
        }
    }

    /// Record a completed (or spurious) PHY change without renegotiating
    /// connection parameters.
    pub(crate) fn apply_phy_status(&mut self, phy: Phy) {
        self.session.phy_requested = None;
        self.session.phy_in_use = phy;
    }

    /// Record a PHY change and renegotiate the connection parameters to the
    /// PHY's canonical interval and timeout (initiator).
    pub(crate) fn apply_phy_status_and_renegotiate(&mut self, phy: Phy, out: &mut Effects) {
        self.apply_phy_status(phy);
        if let Some(handle) = self.session.handle {
            out.push(RadioCommand::SetConnParams {
                handle,
                params: ConnParams::for_phy(phy),
            });
        }
    }

    /// Re-derive the best-effort message size from the current parameters
    pub(crate) fn recompute_best_effort_size(&mut self) {
        let size = sizing::best_effort_size(
            self.session.pdu_size,
            self.session.mtu,
            self.config.best_effort_cap,
        );
        self.best_effort.set_len(size);
    }

    /// Re-derive the ack message size from the current parameters
    pub(crate) fn recompute_ack_size(&mut self) {
        let size = sizing::ack_size(self.session.mtu, self.config.ack_cap);
        self.ack.set_len(size);
    }

    /// Whether the configured burst limit has been hit
    pub(crate) fn burst_limit_reached(&self) -> bool {
        match self.config.burst_limit {
            BurstLimit::Unbounded => false,
            BurstLimit::FixedCount(n) => self.stats.message_count >= n,
            BurstLimit::FixedDuration(_) => self.fixed_time_expired,
        }
    }
}
