//! Universal event handler
//!
//! Runs after every state-specific dispatch, regardless of the current
//! state: user-input signals, soft timers, parameter and MTU negotiation
//! results, link-quality samples, maintenance requests, and the full reset
//! on connection close.

use tracing::info;

use crate::event::{RadioEvent, Signal};
use crate::machine::{Effects, Machine, TesterState};
use crate::types::{ChannelId, Role, TimerId};
use crate::RadioCommand;

/// Cross-cutting reactions applied to every event
pub(super) fn dispatch(machine: &mut Machine, now: u64, event: &RadioEvent, out: &mut Effects) {
    match event {
        RadioEvent::Signal(signal) => handle_signal(machine, now, *signal, out),

        RadioEvent::TimerFired(TimerId::DisplayRefresh) => {
            if let Some(handle) = machine.session.handle {
                out.push(RadioCommand::ReadLinkQuality { handle });
            }
        }

        RadioEvent::TimerFired(TimerId::FixedTransfer) => {
            if !machine.state.is_sending() {
                return;
            }
            machine.fixed_time_expired = true;
            if machine.state == TesterState::SendingAck && machine.waiting_for_confirmation {
                // Never truncate an in-flight ack message: the confirmation
                // handler ends the burst once it arrives.
                return;
            }
            machine.ack_burst_latched = false;
            machine.finish_burst(now, true, out);
            machine.state = machine.fallback_subscribed_state();
        }

        RadioEvent::ConnectionParams { pdu_size, interval } => {
            machine.session.pdu_size = *pdu_size;
            machine.session.interval = *interval;
            machine.recompute_best_effort_size();
        }

        RadioEvent::MtuExchanged { mtu } => {
            machine.session.mtu = *mtu;
            machine.recompute_best_effort_size();
            machine.recompute_ack_size();
        }

        RadioEvent::RssiSample { rssi } => {
            machine.rssi = Some(*rssi);
        }

        RadioEvent::MaintenanceRequest => {
            machine.maintenance_requested = true;
            if let Some(handle) = machine.session.handle {
                out.push(RadioCommand::Disconnect { handle });
            }
        }

        RadioEvent::ConnectionClosed => {
            info!("connection closed, resetting session");
            machine.reset_and_resume(out);
        }

        _ => {}
    }
}

/// Button signals act independently of the primary state machine so the
/// local user can be the burst trigger rather than only a peer write.
fn handle_signal(machine: &mut Machine, now: u64, signal: Signal, out: &mut Effects) {
    match (machine.session.role, signal) {
        (Role::Responder, Signal::BestEffortStart) => {
            if matches!(
                machine.state,
                TesterState::SubscribedBoth | TesterState::SubscribedBestEffort
            ) {
                machine.state = TesterState::SendingBestEffort;
                machine.best_effort.regenerate();
                machine.start_burst(now, ChannelId::BestEffort, out);
            }
        }

        (Role::Responder, Signal::BestEffortStop) => {
            // Release ends the burst only in the hold-to-send mode; fixed
            // limits run to completion.
            if machine.state == TesterState::SendingBestEffort
                && machine.config.burst_limit == crate::config::BurstLimit::Unbounded
            {
                machine.finish_burst(now, true, out);
                machine.state = machine.fallback_subscribed_state();
            }
        }

        (Role::Responder, Signal::AckStart) => {
            if matches!(
                machine.state,
                TesterState::SubscribedBoth | TesterState::SubscribedAck
            ) {
                machine.state = TesterState::SendingAck;
                machine.ack_button_held = true;
                machine.ack.regenerate();
                machine.start_burst(now, ChannelId::Ack, out);
                out.push(RadioCommand::SendAck {
                    payload: machine.ack.bytes().to_vec(),
                });
            }
        }

        (Role::Responder, Signal::AckStop) => {
            // The burst itself ends at the next confirmation, once nothing
            // is holding it open.
            machine.ack_button_held = false;
        }

        (Role::Initiator, Signal::PhyChange) => {
            if machine.session.is_connected() {
                machine.session.phy_requested = Some(machine.session.phy_in_use.next());
            }
        }

        (Role::Initiator, Signal::ScanPhyChange) => {
            if machine.state == TesterState::AwaitingConnection {
                out.push(RadioCommand::StopScanning);
                let phy = machine.session.phy_in_use.toggled_scan_phy();
                machine.session.phy_in_use = phy;
                out.push(RadioCommand::StartScanning {
                    phy,
                    interval: crate::config::SCAN_INTERVAL,
                    window: crate::config::SCAN_WINDOW,
                });
            }
        }

        _ => {}
    }
}
