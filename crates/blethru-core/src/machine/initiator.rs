//! Initiator (data sink) transition table
//!
//! The initiator scans for the expected peer identity, connects, drives the
//! PHY to its preference, subscribes to both data channels in sequence, and
//! then counts whatever the responder streams at it, confirming each
//! ack-channel message individually.

use tracing::info;

use crate::adv;
use crate::event::{BurstControl, RadioEvent};
use crate::machine::{Effects, Machine, TesterState};
use crate::stats::TICKS_PER_SECOND;
use crate::types::{ChannelId, ConnectionHandle, TimerId};
use crate::RadioCommand;

/// Dispatch one event through the initiator's state-specific table
pub(super) fn dispatch(machine: &mut Machine, now: u64, event: &RadioEvent, out: &mut Effects) {
    match machine.state {
        TesterState::AwaitingConnection => match event {
            RadioEvent::Boot => machine.reset_and_resume(out),
            RadioEvent::ScanResult { address, data } => {
                // Non-matching advertisements are simply not selected;
                // scanning continues.
                if adv::local_name_matches(data, &machine.config.device_name) {
                    info!(peer = %address, "matching peer found, connecting");
                    out.push(RadioCommand::StopScanning);
                    out.push(RadioCommand::Connect {
                        address: *address,
                        phy: machine.session.phy_in_use.connect_phy(),
                    });
                }
            }
            RadioEvent::ConnectionOpened { handle } => on_opened(machine, *handle),
            _ => {}
        },

        TesterState::Connected => {
            if let RadioEvent::PhyStatus { phy } = event {
                machine.apply_phy_status_and_renegotiate(*phy, out);
            }
        }

        TesterState::SubscribedBestEffort => match event {
            RadioEvent::ProcedureComplete => {
                machine.session.best_effort_subscribed = true;
                out.push(RadioCommand::Subscribe {
                    channel: ChannelId::Ack,
                });
                machine.state = TesterState::SubscribedAck;
            }
            RadioEvent::PhyStatus { phy } => machine.apply_phy_status(*phy),
            _ => {}
        },

        TesterState::SubscribedAck => match event {
            RadioEvent::ProcedureComplete => {
                machine.session.ack_subscribed = true;
                machine.state = TesterState::SubscribedBoth;
            }
            RadioEvent::PhyStatus { phy } => machine.apply_phy_status(*phy),
            _ => {}
        },

        TesterState::SubscribedBoth => match event {
            RadioEvent::ControlWrite {
                control: BurstControl::Start(_),
            } => {
                // Burst incoming: zero the counters and quiet the display
                // refresh until it ends.
                machine.stats.start_burst(now);
                out.push(RadioCommand::StopTimer {
                    id: TimerId::DisplayRefresh,
                });
                machine.state = TesterState::Receiving;
            }
            RadioEvent::PhyStatus { phy } => {
                machine.apply_phy_status_and_renegotiate(*phy, out);
            }
            _ => {}
        },

        TesterState::Receiving => match event {
            RadioEvent::MessageReceived { channel, payload } => {
                machine.stats.record_message(payload.len());
                if *channel == ChannelId::Ack {
                    if let Some(handle) = machine.session.handle {
                        out.push(RadioCommand::ConfirmAck { handle });
                    }
                }
            }
            RadioEvent::ControlWrite {
                control: BurstControl::Stop,
            } => {
                machine.stats.finish_burst(now);
                out.push(RadioCommand::StartTimer {
                    id: TimerId::DisplayRefresh,
                    ticks: TICKS_PER_SECOND,
                    one_shot: false,
                });
                machine.state = TesterState::SubscribedBoth;
            }
            _ => {}
        },

        // Responder-only states, unreachable in this role
        TesterState::SendingBestEffort | TesterState::SendingAck => {}
    }
}

fn on_opened(machine: &mut Machine, handle: ConnectionHandle) {
    machine.session.handle = Some(handle);
    machine.state = TesterState::Connected;
}
