//! End-to-end exchanges over the in-process loopback link
//!
//! Each test spawns a responder and an initiator event loop wired back to
//! back and observes the run through the published status snapshots.

use std::time::Duration;

use blethru_core::{
    BurstLimit, Machine, Phy, Role, Signal, StatusSnapshot, TesterConfig,
};
use blethru_runtime::{EventLoop, LoopbackStack, RetryPolicy, RuntimeHandle, SystemTickClock};

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

fn spawn_role(config: TesterConfig, stack: LoopbackStack) -> RuntimeHandle {
    let machine = Machine::new(config).unwrap();
    EventLoop::spawn(machine, stack, SystemTickClock::new(), RetryPolicy::default())
}

/// Spawn a linked responder/initiator pair
fn spawn_pair(
    responder_config: TesterConfig,
) -> (RuntimeHandle, RuntimeHandle, blethru_runtime::LoopbackProbe) {
    let (responder_stack, initiator_stack) = LoopbackStack::pair(&responder_config.device_name);
    let responder_probe = responder_stack.probe();
    let responder = spawn_role(responder_config, responder_stack);
    let initiator = spawn_role(TesterConfig::new(Role::Initiator), initiator_stack);
    (responder, initiator, responder_probe)
}

/// Wait until a published snapshot satisfies `pred`, with a hard timeout
async fn wait_for<F>(handle: &RuntimeHandle, what: &str, mut pred: F) -> StatusSnapshot
where
    F: FnMut(&StatusSnapshot) -> bool,
{
    let mut snapshots = handle.watch_snapshots();
    let found = async {
        loop {
            {
                let snapshot = snapshots.borrow();
                if pred(&snapshot) {
                    return snapshot.clone();
                }
            }
            snapshots
                .changed()
                .await
                .expect("event loop stopped before the condition held");
        }
    };
    tokio::time::timeout(Duration::from_secs(5), found)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

fn fully_subscribed(snapshot: &StatusSnapshot) -> bool {
    snapshot.best_effort_subscribed && snapshot.ack_subscribed
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn pair_connects_and_subscribes_both_channels() {
    let (responder, initiator, _probe) = spawn_pair(TesterConfig::new(Role::Responder));

    let snapshot = wait_for(&initiator, "initiator subscriptions", fully_subscribed).await;
    assert_eq!(snapshot.mtu, 247);
    assert_eq!(snapshot.pdu_size, 251);
    assert_eq!(snapshot.interval, 40);

    // The responder sees the same subscriptions and negotiated sizes
    let snapshot = wait_for(&responder, "responder subscriptions", fully_subscribed).await;
    assert_eq!(snapshot.best_effort_size, 244);
    assert_eq!(snapshot.ack_size, 244);

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}

#[tokio::test]
async fn fixed_count_ack_burst_is_counted_by_the_initiator() {
    let mut config = TesterConfig::new(Role::Responder);
    config.burst_limit = BurstLimit::FixedCount(10);
    let (responder, initiator, probe) = spawn_pair(config);

    wait_for(&responder, "responder subscriptions", fully_subscribed).await;
    responder.send_signal(Signal::AckStart);

    // One message per confirmation round trip, exactly ten of them
    let snapshot = wait_for(&initiator, "burst completion", |s| {
        s.throughput_bps > 0 || s.message_count >= 10
    })
    .await;
    assert_eq!(snapshot.message_count, 10);

    // The responder accounted the same count and published its figure
    let snapshot = wait_for(&responder, "published result", |s| s.message_count == 10).await;
    assert_eq!(snapshot.message_count, 10);
    assert!(probe.last_published().is_some());

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}

#[tokio::test]
async fn fixed_count_best_effort_burst_reaches_the_initiator() {
    let mut config = TesterConfig::new(Role::Responder);
    config.burst_limit = BurstLimit::FixedCount(25);
    let (responder, initiator, _probe) = spawn_pair(config);

    wait_for(&responder, "responder subscriptions", fully_subscribed).await;
    responder.send_signal(Signal::BestEffortStart);

    let snapshot = wait_for(&initiator, "stream completion", |s| s.message_count >= 25).await;
    assert_eq!(snapshot.message_count, 25);

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}

#[tokio::test]
async fn transiently_busy_stack_does_not_lose_the_burst() {
    let mut config = TesterConfig::new(Role::Responder);
    config.burst_limit = BurstLimit::FixedCount(5);
    let (responder, initiator, probe) = spawn_pair(config);

    wait_for(&responder, "responder subscriptions", fully_subscribed).await;

    // Three busy responses fit inside the default retry budget
    probe.inject_busy(3);
    responder.send_signal(Signal::AckStart);

    let snapshot = wait_for(&initiator, "burst completion", |s| s.message_count >= 5).await;
    assert_eq!(snapshot.message_count, 5);

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}

#[tokio::test]
async fn phy_change_signal_propagates_to_both_sides() {
    let (responder, initiator, _probe) = spawn_pair(TesterConfig::new(Role::Responder));

    wait_for(&initiator, "initiator subscriptions", fully_subscribed).await;
    initiator.send_signal(Signal::PhyChange);

    let snapshot = wait_for(&initiator, "initiator on 2M", |s| s.phy == Phy::TwoM).await;
    assert_eq!(snapshot.interval, 20);
    wait_for(&responder, "responder on 2M", |s| s.phy == Phy::TwoM).await;

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}

#[tokio::test]
async fn release_ends_a_held_ack_burst() {
    let (responder, initiator, _probe) = spawn_pair(TesterConfig::new(Role::Responder));

    wait_for(&responder, "responder subscriptions", fully_subscribed).await;
    responder.send_signal(Signal::AckStart);
    wait_for(&initiator, "first messages", |s| s.message_count >= 3).await;

    responder.send_signal(Signal::AckStop);
    // The burst closes out; the initiator gets the stop marker and derives
    // its own throughput figure.
    wait_for(&initiator, "stop marker", |s| s.throughput_bps > 0).await;

    responder.shutdown().await.unwrap();
    initiator.shutdown().await.unwrap();
}
