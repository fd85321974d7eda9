//! In-process loopback link
//!
//! Two [`LoopbackStack`] halves wired back to back: commands submitted on
//! one side turn into the events a real radio stack would deliver, on the
//! submitting side, the peer side, or both. This is enough to run a full
//! initiator/responder exchange inside one process, which is how the
//! integration tests and the demo mode exercise the event loop.
//!
//! Soft timers run as real tokio tasks with tick counts converted to wall
//! durations, so a fixed-duration burst over the loopback takes real time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use blethru_core::adv;
use blethru_core::{
    BdAddr, ChannelId, CommandOutcome, ConnectionHandle, RadioCommand, RadioEvent, TimerId,
};

use crate::clock::ticks_to_duration;
use crate::radio::RadioStack;

// ----------------------------------------------------------------------------
// Shared Link State
// ----------------------------------------------------------------------------

#[derive(Default)]
struct SideState {
    /// Advertisement payload while advertising
    advertising: Option<Vec<u8>>,
    scanning: bool,
    /// Last throughput figure this side published
    last_result: Option<u32>,
}

#[derive(Default)]
struct LinkShared {
    connected: bool,
    sides: [SideState; 2],
}

// ----------------------------------------------------------------------------
// Loopback Stack
// ----------------------------------------------------------------------------

/// One half of an in-process radio link
pub struct LoopbackStack {
    side: usize,
    address: BdAddr,
    peer_address: BdAddr,
    adv_payload: Vec<u8>,
    events: mpsc::UnboundedReceiver<RadioEvent>,
    self_tx: mpsc::UnboundedSender<RadioEvent>,
    peer_tx: mpsc::UnboundedSender<RadioEvent>,
    shared: Arc<Mutex<LinkShared>>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    /// Remaining submits forced to report `Busy`
    busy_budget: Arc<AtomicU32>,
}

impl LoopbackStack {
    /// Build both halves of a link whose responder advertises `device_name`.
    /// Each half starts with a `Boot` event already queued.
    pub fn pair(device_name: &str) -> (LoopbackStack, LoopbackStack) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(LinkShared::default()));
        let adv_payload = adv::complete_local_name(device_name);

        let _ = a_tx.send(RadioEvent::Boot);
        let _ = b_tx.send(RadioEvent::Boot);

        let a = LoopbackStack {
            side: 0,
            address: BdAddr([0x11; 6]),
            peer_address: BdAddr([0x22; 6]),
            adv_payload: adv_payload.clone(),
            events: a_rx,
            self_tx: a_tx.clone(),
            peer_tx: b_tx.clone(),
            shared: Arc::clone(&shared),
            timers: HashMap::new(),
            busy_budget: Arc::new(AtomicU32::new(0)),
        };
        let b = LoopbackStack {
            side: 1,
            address: BdAddr([0x22; 6]),
            peer_address: BdAddr([0x11; 6]),
            adv_payload,
            events: b_rx,
            self_tx: b_tx,
            peer_tx: a_tx,
            shared,
            timers: HashMap::new(),
            busy_budget: Arc::new(AtomicU32::new(0)),
        };
        (a, b)
    }

    /// Observer handle that stays usable after the stack moves into an
    /// event loop
    pub fn probe(&self) -> LoopbackProbe {
        LoopbackProbe {
            side: self.side,
            shared: Arc::clone(&self.shared),
            busy_budget: Arc::clone(&self.busy_budget),
        }
    }

    fn to_self(&self, event: RadioEvent) {
        let _ = self.self_tx.send(event);
    }

    fn to_peer(&self, event: RadioEvent) {
        let _ = self.peer_tx.send(event);
    }

    fn to_both(&self, event: RadioEvent) {
        self.to_self(event.clone());
        self.to_peer(event);
    }

    fn start_timer(&mut self, id: TimerId, ticks: u32, one_shot: bool) {
        self.stop_timer(id);
        let tx = self.self_tx.clone();
        let period = ticks_to_duration(ticks as u64);
        let task = tokio::spawn(async move {
            if one_shot {
                tokio::time::sleep(period).await;
                let _ = tx.send(RadioEvent::TimerFired(id));
            } else {
                let mut interval = tokio::time::interval(period);
                interval.tick().await; // first tick is immediate, skip it
                loop {
                    interval.tick().await;
                    if tx.send(RadioEvent::TimerFired(id)).is_err() {
                        break;
                    }
                }
            }
        });
        self.timers.insert(id, task);
    }

    fn stop_timer(&mut self, id: TimerId) {
        if let Some(task) = self.timers.remove(&id) {
            task.abort();
        }
    }

    fn handle(&mut self, command: RadioCommand) {
        match command {
            RadioCommand::StartAdvertising { .. } => {
                let mut shared = self.shared.lock().unwrap();
                shared.sides[self.side].advertising = Some(self.adv_payload.clone());
                if shared.sides[1 - self.side].scanning {
                    drop(shared);
                    self.to_peer(RadioEvent::ScanResult {
                        address: self.address,
                        data: self.adv_payload.clone(),
                    });
                }
            }
            RadioCommand::StopAdvertising => {
                self.shared.lock().unwrap().sides[self.side].advertising = None;
            }
            RadioCommand::StartScanning { .. } => {
                let mut shared = self.shared.lock().unwrap();
                shared.sides[self.side].scanning = true;
                let peer_adv = shared.sides[1 - self.side].advertising.clone();
                drop(shared);
                if let Some(data) = peer_adv {
                    self.to_self(RadioEvent::ScanResult {
                        address: self.peer_address,
                        data,
                    });
                }
            }
            RadioCommand::StopScanning => {
                self.shared.lock().unwrap().sides[self.side].scanning = false;
            }
            RadioCommand::Connect { .. } => {
                self.shared.lock().unwrap().connected = true;
                self.to_both(RadioEvent::ConnectionOpened {
                    handle: ConnectionHandle(1),
                });
                self.to_both(RadioEvent::MtuExchanged { mtu: 247 });
                self.to_both(RadioEvent::ConnectionParams {
                    pdu_size: 251,
                    interval: 40,
                });
            }
            RadioCommand::Disconnect { .. } => {
                let mut shared = self.shared.lock().unwrap();
                if shared.connected {
                    shared.connected = false;
                    drop(shared);
                    self.to_both(RadioEvent::ConnectionClosed);
                }
            }
            RadioCommand::RequestPhy { phy, .. } => {
                self.to_both(RadioEvent::PhyStatus { phy });
            }
            RadioCommand::SetConnParams { params, .. } => {
                self.to_both(RadioEvent::ConnectionParams {
                    pdu_size: 251,
                    interval: params.interval,
                });
            }
            RadioCommand::Subscribe { channel } => {
                self.to_peer(RadioEvent::SubscriptionStatus {
                    channel,
                    subscribed: true,
                });
                self.to_self(RadioEvent::ProcedureComplete);
            }
            RadioCommand::SendBestEffort { payload } => {
                self.to_peer(RadioEvent::MessageReceived {
                    channel: ChannelId::BestEffort,
                    payload,
                });
            }
            RadioCommand::SendAck { payload } => {
                self.to_peer(RadioEvent::MessageReceived {
                    channel: ChannelId::Ack,
                    payload,
                });
            }
            RadioCommand::ConfirmAck { .. } => {
                self.to_peer(RadioEvent::DeliveryConfirmed);
            }
            RadioCommand::WriteControl { control } => {
                self.to_peer(RadioEvent::ControlWrite { control });
            }
            RadioCommand::ReadLinkQuality { .. } => {
                self.to_self(RadioEvent::RssiSample { rssi: -42 });
            }
            RadioCommand::PublishResult { throughput_bps } => {
                self.shared.lock().unwrap().sides[self.side].last_result = Some(throughput_bps);
            }
            RadioCommand::StartTimer { id, ticks, one_shot } => {
                self.start_timer(id, ticks, one_shot);
            }
            RadioCommand::StopTimer { id } => self.stop_timer(id),
            RadioCommand::SetMaxMtu { .. }
            | RadioCommand::SetTxPower { .. }
            | RadioCommand::ResetToMaintenance => {}
        }
    }
}

#[async_trait]
impl RadioStack for LoopbackStack {
    async fn next_event(&mut self) -> Option<RadioEvent> {
        self.events.recv().await
    }

    async fn submit(&mut self, command: RadioCommand) -> CommandOutcome {
        if self.busy_budget.load(Ordering::SeqCst) > 0 {
            self.busy_budget.fetch_sub(1, Ordering::SeqCst);
            return CommandOutcome::Busy;
        }
        trace!(side = self.side, ?command, "loopback submit");
        self.handle(command);
        CommandOutcome::Accepted
    }
}

impl Drop for LoopbackStack {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Probe
// ----------------------------------------------------------------------------

/// Read/poke access to one side of the link from outside the event loop
#[derive(Clone)]
pub struct LoopbackProbe {
    side: usize,
    shared: Arc<Mutex<LinkShared>>,
    busy_budget: Arc<AtomicU32>,
}

impl LoopbackProbe {
    /// The last throughput figure this side published
    pub fn last_published(&self) -> Option<u32> {
        self.shared.lock().unwrap().sides[self.side].last_result
    }

    /// Whether the link is currently connected
    pub fn connected(&self) -> bool {
        self.shared.lock().unwrap().connected
    }

    /// Force the next `count` submits on this side to report `Busy`
    pub fn inject_busy(&self, count: u32) {
        self.busy_budget.store(count, Ordering::SeqCst);
    }
}
