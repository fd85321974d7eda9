//! Responder (data source) transition table
//!
//! The responder advertises, accepts the connection, and streams payload on
//! whichever channels the peer subscribed to. Bursts begin on a peer write of
//! the burst-control attribute or on a local start signal, and end on the
//! stop marker, a configured limit, or disconnection.

use crate::event::{BurstControl, RadioEvent};
use crate::machine::{Effects, Machine, TesterState};
use crate::types::{ChannelId, ConnectionHandle};
use crate::RadioCommand;

/// Dispatch one event through the responder's state-specific table
pub(super) fn dispatch(machine: &mut Machine, now: u64, event: &RadioEvent, out: &mut Effects) {
    match machine.state {
        TesterState::AwaitingConnection => match event {
            RadioEvent::Boot => machine.reset_and_resume(out),
            RadioEvent::ConnectionOpened { handle } => on_opened(machine, *handle),
            _ => {}
        },

        TesterState::Connected => match event {
            RadioEvent::PhyStatus { phy } => machine.apply_phy_status(*phy),
            RadioEvent::SubscriptionStatus {
                channel,
                subscribed,
            } => update_subscription(machine, *channel, *subscribed),
            _ => {}
        },

        TesterState::SubscribedBestEffort
        | TesterState::SubscribedAck
        | TesterState::SubscribedBoth => match event {
            RadioEvent::ControlWrite {
                control: BurstControl::Start(channel),
            } => start_requested_burst(machine, now, *channel, out),
            RadioEvent::SubscriptionStatus {
                channel,
                subscribed,
            } => update_subscription(machine, *channel, *subscribed),
            RadioEvent::PhyStatus { phy } => machine.apply_phy_status(*phy),
            _ => {}
        },

        TesterState::SendingBestEffort => match event {
            RadioEvent::ControlWrite {
                control: BurstControl::Stop,
            } => {
                // Peer ended the burst; no stop marker written back.
                machine.finish_burst(now, false, out);
                machine.state = machine.fallback_subscribed_state();
            }
            RadioEvent::SubscriptionStatus {
                channel,
                subscribed,
            } => update_subscription(machine, *channel, *subscribed),
            _ => {}
        },

        TesterState::SendingAck => match event {
            RadioEvent::ControlWrite {
                control: BurstControl::Stop,
            } => {
                machine.ack_burst_latched = false;
                machine.finish_burst(now, false, out);
                machine.state = machine.fallback_subscribed_state();
            }
            RadioEvent::DeliveryConfirmed => on_ack_confirmed(machine, now, out),
            RadioEvent::SubscriptionStatus {
                channel,
                subscribed,
            } => update_subscription(machine, *channel, *subscribed),
            _ => {}
        },

        // Initiator-only states, unreachable in this role
        TesterState::Receiving => {}
    }
}

fn on_opened(machine: &mut Machine, handle: ConnectionHandle) {
    machine.session.handle = Some(handle);
    machine.state = TesterState::Connected;
}

/// Toggle a channel flag and re-derive the aggregate subscribed state.
/// Sending states keep their state mid-burst; only the flags change, which
/// the ack continue-condition observes.
fn update_subscription(machine: &mut Machine, channel: ChannelId, subscribed: bool) {
    machine.session.set_subscribed(channel, subscribed);
    if machine.state.is_sending() {
        return;
    }
    machine.state = machine.fallback_subscribed_state();
}

/// A peer write asked for a burst on `channel`; only legal if that channel
/// is subscribed.
fn start_requested_burst(
    machine: &mut Machine,
    now: u64,
    channel: ChannelId,
    out: &mut Effects,
) {
    if !machine.session.subscribed(channel) {
        return;
    }
    match channel {
        ChannelId::BestEffort => {
            machine.state = TesterState::SendingBestEffort;
            machine.best_effort.regenerate();
            machine.start_burst(now, ChannelId::BestEffort, out);
        }
        ChannelId::Ack => {
            machine.state = TesterState::SendingAck;
            machine.ack_burst_latched = true;
            machine.ack.regenerate();
            machine.start_burst(now, ChannelId::Ack, out);
            out.push(RadioCommand::SendAck {
                payload: machine.ack.bytes().to_vec(),
            });
        }
    }
}

/// The peer confirmed the in-flight ack message. Account it, then either
/// finish the burst (limit reached, or the driving condition no longer
/// holds) or generate and post the next message.
fn on_ack_confirmed(machine: &mut Machine, now: u64, out: &mut Effects) {
    if !machine.waiting_for_confirmation {
        // Spurious confirmation, nothing in flight
        return;
    }
    machine.stats.record_message(machine.ack.len());
    machine.waiting_for_confirmation = false;

    if machine.burst_limit_reached() {
        machine.ack_burst_latched = false;
        machine.finish_burst(now, true, out);
        machine.state = machine.fallback_subscribed_state();
        return;
    }

    let keep_going = match machine.config.burst_limit {
        // A fixed limit drives the burst by itself
        crate::config::BurstLimit::FixedCount(_) | crate::config::BurstLimit::FixedDuration(_) => {
            true
        }
        crate::config::BurstLimit::Unbounded => {
            machine.session.ack_subscribed
                && (machine.ack_button_held || machine.ack_burst_latched)
        }
    };

    if keep_going {
        machine.ack.regenerate();
        out.push(RadioCommand::SendAck {
            payload: machine.ack.bytes().to_vec(),
        });
    } else {
        machine.finish_burst(now, true, out);
        machine.state = machine.fallback_subscribed_state();
    }
}
