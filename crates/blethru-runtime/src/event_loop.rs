//! Runtime event loop
//!
//! Owns one [`Machine`] and one [`RadioStack`], and runs the
//! event-in/commands-out cycle as a spawned tokio task. User-input signals
//! arrive over a channel and enter the machine as ordinary events; every
//! iteration ends by publishing a fresh [`StatusSnapshot`] on a watch
//! channel for the display side to render.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use blethru_core::{
    ChannelId, CommandOutcome, Machine, RadioCommand, RadioEvent, Signal, StatusSnapshot,
    TesterState,
};

use crate::clock::TickClock;
use crate::error::{Result, RuntimeError};
use crate::radio::{RadioStack, RetryPolicy};

// ----------------------------------------------------------------------------
// Runtime Handle
// ----------------------------------------------------------------------------

/// Handle to a spawned event loop
pub struct RuntimeHandle {
    signals: mpsc::UnboundedSender<Signal>,
    shutdown: mpsc::Sender<()>,
    snapshots: watch::Receiver<StatusSnapshot>,
    task: JoinHandle<Result<()>>,
}

impl RuntimeHandle {
    /// Inject a user-input signal; ignored once the loop has stopped
    pub fn send_signal(&self, signal: Signal) {
        let _ = self.signals.send(signal);
    }

    /// Latest published status snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch receiver for snapshot updates
    pub fn watch_snapshots(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshots.clone()
    }

    /// Ask the loop to stop and wait for it to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(()).await;
        self.task
            .await
            .map_err(|err| RuntimeError::TaskFailed(err.to_string()))?
    }

    /// Wait for the loop to finish on its own (maintenance reset or stack
    /// shutdown)
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|err| RuntimeError::TaskFailed(err.to_string()))?
    }
}

// ----------------------------------------------------------------------------
// Event Loop
// ----------------------------------------------------------------------------

/// The machine/stack cycle, generic over the stack binding and clock
pub struct EventLoop<S, C> {
    machine: Machine,
    stack: S,
    clock: C,
    retry: RetryPolicy,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
    shutdown_rx: mpsc::Receiver<()>,
    snapshot_tx: watch::Sender<StatusSnapshot>,
}

impl<S, C> EventLoop<S, C>
where
    S: RadioStack + 'static,
    C: TickClock + 'static,
{
    /// Spawn the loop as a tokio task and return its handle
    pub fn spawn(machine: Machine, stack: S, clock: C, retry: RetryPolicy) -> RuntimeHandle {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let event_loop = EventLoop {
            machine,
            stack,
            clock,
            retry,
            signal_rx,
            shutdown_rx,
            snapshot_tx,
        };
        let task = tokio::spawn(event_loop.run());

        RuntimeHandle {
            signals: signal_tx,
            shutdown: shutdown_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Run until shutdown, stack closure, or a maintenance reset
    pub async fn run(mut self) -> Result<()> {
        loop {
            let event = match self.next_input().await? {
                ControlFlow::Continue(event) => event,
                ControlFlow::Break(()) => return Ok(()),
            };
            if let ControlFlow::Break(()) = self.step(event).await? {
                return Ok(());
            }
        }
    }

    /// Wait for the next input. While the best-effort stream is running the
    /// wait is non-blocking, so an idle stack cannot stall the stream.
    async fn next_input(&mut self) -> Result<ControlFlow<(), Option<RadioEvent>>> {
        let streaming = self.machine.state() == TesterState::SendingBestEffort;
        let event = tokio::select! {
            biased;
            // A closed shutdown channel means the handle is gone; stop too.
            _ = self.shutdown_rx.recv() => return Ok(ControlFlow::Break(())),
            Some(signal) = self.signal_rx.recv() => {
                Some(RadioEvent::Signal(signal))
            }
            maybe = self.stack.next_event() => {
                Some(maybe.ok_or(RuntimeError::StackClosed)?)
            }
            _ = tokio::task::yield_now(), if streaming => None,
        };
        Ok(ControlFlow::Continue(event))
    }

    /// One iteration: step the machine, execute its commands, publish the
    /// refreshed snapshot.
    async fn step(&mut self, event: Option<RadioEvent>) -> Result<ControlFlow<()>> {
        let now = self.clock.now_ticks();
        let mut effects = Vec::new();
        self.machine.step(now, event.as_ref(), &mut effects);
        let flow = self.execute(now, effects).await;
        self.snapshot_tx.send_replace(self.machine.snapshot());
        Ok(flow)
    }

    /// Execute commands in order, feeding send acceptances back into the
    /// machine. Follow-up commands produced by that feedback join the queue.
    async fn execute(&mut self, now: u64, effects: Vec<RadioCommand>) -> ControlFlow<()> {
        let mut queue: VecDeque<RadioCommand> = effects.into();
        while let Some(command) = queue.pop_front() {
            let sent_channel = match &command {
                RadioCommand::SendBestEffort { .. } => Some(ChannelId::BestEffort),
                RadioCommand::SendAck { .. } => Some(ChannelId::Ack),
                _ => None,
            };
            let is_reset = command == RadioCommand::ResetToMaintenance;

            match self.submit_with_retry(command).await {
                CommandOutcome::Accepted => {
                    if let Some(channel) = sent_channel {
                        let mut follow_up = Vec::new();
                        self.machine.note_sent(channel, now, &mut follow_up);
                        queue.extend(follow_up);
                    }
                    if is_reset {
                        debug!("maintenance reset accepted, stopping event loop");
                        return ControlFlow::Break(());
                    }
                }
                CommandOutcome::Busy => {
                    warn!(attempts = self.retry.max_attempts, "command dropped, stack busy");
                }
                CommandOutcome::Error => {
                    warn!("command rejected by stack");
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Submit one command, retrying a busy stack up to the policy's bound
    async fn submit_with_retry(&mut self, command: RadioCommand) -> CommandOutcome {
        let mut attempt = 1;
        loop {
            let outcome = self.stack.submit(command.clone()).await;
            if outcome != CommandOutcome::Busy || attempt >= self.retry.max_attempts {
                return outcome;
            }
            attempt += 1;
            tokio::time::sleep(self.retry.backoff).await;
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blethru_core::{Role, TesterConfig};

    /// Stack that is busy a fixed number of times, then accepts everything
    struct BusyThenAccept {
        busy_remaining: u32,
        submitted: Vec<RadioCommand>,
        events: VecDeque<RadioEvent>,
    }

    #[async_trait]
    impl RadioStack for BusyThenAccept {
        async fn next_event(&mut self) -> Option<RadioEvent> {
            match self.events.pop_front() {
                Some(event) => Some(event),
                // Park forever once scripted events run out
                None => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }

        async fn submit(&mut self, command: RadioCommand) -> CommandOutcome {
            if self.busy_remaining > 0 {
                self.busy_remaining -= 1;
                return CommandOutcome::Busy;
            }
            self.submitted.push(command);
            CommandOutcome::Accepted
        }
    }

    struct ZeroClock;

    impl TickClock for ZeroClock {
        fn now_ticks(&self) -> u64 {
            0
        }
    }

    fn test_loop(stack: BusyThenAccept) -> EventLoop<BusyThenAccept, ZeroClock> {
        let machine = Machine::new(TesterConfig::new(Role::Responder)).unwrap();
        let (_, signal_rx) = mpsc::unbounded_channel();
        let (_, shutdown_rx) = mpsc::channel(1);
        let (snapshot_tx, _) = watch::channel(machine.snapshot());
        EventLoop {
            machine,
            stack,
            clock: ZeroClock,
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: std::time::Duration::from_millis(1),
            },
            signal_rx,
            shutdown_rx,
            snapshot_tx,
        }
    }

    #[tokio::test]
    async fn busy_stack_is_retried_within_bounds() {
        let stack = BusyThenAccept {
            busy_remaining: 2,
            submitted: Vec::new(),
            events: VecDeque::new(),
        };
        let mut event_loop = test_loop(stack);
        let outcome = event_loop
            .submit_with_retry(RadioCommand::StartAdvertising { interval: 160 })
            .await;
        assert_eq!(outcome, CommandOutcome::Accepted);
        assert_eq!(event_loop.stack.submitted, vec![RadioCommand::StartAdvertising { interval: 160 }]);
    }

    #[tokio::test]
    async fn persistently_busy_stack_exhausts_the_retry_budget() {
        let stack = BusyThenAccept {
            busy_remaining: 100,
            submitted: Vec::new(),
            events: VecDeque::new(),
        };
        let mut event_loop = test_loop(stack);
        let outcome = event_loop
            .submit_with_retry(RadioCommand::StartAdvertising { interval: 160 })
            .await;
        assert_eq!(outcome, CommandOutcome::Busy);
        // 3 attempts were made, none recorded as submitted
        assert_eq!(event_loop.stack.busy_remaining, 97);
        assert!(event_loop.stack.submitted.is_empty());
    }

    #[tokio::test]
    async fn maintenance_reset_stops_the_loop() {
        let stack = BusyThenAccept {
            busy_remaining: 0,
            submitted: Vec::new(),
            events: VecDeque::new(),
        };
        let mut event_loop = test_loop(stack);
        let flow = event_loop
            .execute(0, vec![RadioCommand::ResetToMaintenance])
            .await;
        assert_eq!(flow, ControlFlow::Break(()));
    }
}
