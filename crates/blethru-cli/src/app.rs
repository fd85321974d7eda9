//! Demo orchestration
//!
//! Runs both connection roles over the in-process loopback link: spawn the
//! two event loops, wait for the subscriptions to settle, trigger one burst
//! on the requested channel, and report both sides' view of the run.

use std::time::Duration;

use tracing::info;

use blethru_core::{
    BurstLimit, ChannelId, Machine, Role, Signal, StatusSnapshot,
};
use blethru_runtime::{EventLoop, LoopbackStack, RetryPolicy, RuntimeHandle, SystemTickClock};

use crate::config::AppConfig;
use crate::error::{CliError, Result};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run one demo burst on `channel` and print the report
    pub async fn run_demo(&self, channel: ChannelId) -> Result<()> {
        let responder_config = self.config.tester_config(Role::Responder)?;
        let initiator_config = self.config.tester_config(Role::Initiator)?;
        let burst_limit = responder_config.burst_limit;

        let (responder_stack, initiator_stack) =
            LoopbackStack::pair(&responder_config.device_name);
        let responder = EventLoop::spawn(
            Machine::new(responder_config)?,
            responder_stack,
            SystemTickClock::new(),
            RetryPolicy::default(),
        );
        let initiator = EventLoop::spawn(
            Machine::new(initiator_config)?,
            initiator_stack,
            SystemTickClock::new(),
            RetryPolicy::default(),
        );

        info!("waiting for the link to settle");
        wait_for(&responder, "responder subscriptions", |s| {
            s.best_effort_subscribed && s.ack_subscribed
        })
        .await?;
        wait_for(&initiator, "initiator subscriptions", |s| {
            s.best_effort_subscribed && s.ack_subscribed
        })
        .await?;

        let (start, stop) = match channel {
            ChannelId::BestEffort => (Signal::BestEffortStart, Signal::BestEffortStop),
            ChannelId::Ack => (Signal::AckStart, Signal::AckStop),
        };

        info!(?channel, "starting burst");
        responder.send_signal(start);

        if burst_limit == BurstLimit::Unbounded {
            // Hold-to-send mode: keep the burst open, then release
            tokio::time::sleep(Duration::from_secs(self.config.hold_seconds as u64)).await;
            responder.send_signal(stop);
        }

        let received = wait_for(&initiator, "burst completion", |s| {
            s.throughput_bps > 0
        })
        .await?;
        let sent = responder.snapshot();

        print_report(&sent, &received);

        responder.shutdown().await?;
        initiator.shutdown().await?;
        Ok(())
    }
}

/// Wait until a handle publishes a snapshot satisfying `pred`
async fn wait_for<F>(handle: &RuntimeHandle, what: &str, mut pred: F) -> Result<StatusSnapshot>
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
            if snapshots.changed().await.is_err() {
                return snapshots.borrow().clone();
            }
        }
    };
    tokio::time::timeout(SETTLE_TIMEOUT, found)
        .await
        .map_err(|_| CliError::Timeout(what.to_string()))
}

// ----------------------------------------------------------------------------
// Report Output
// ----------------------------------------------------------------------------

fn print_report(sent: &StatusSnapshot, received: &StatusSnapshot) {
    println!();
    println!(
        "Link: {} PHY, interval {:.2} ms, MTU {}",
        sent.phy,
        sent.interval_ms(),
        sent.mtu
    );
    println!(
        "Message sizes: best-effort {} B, ack {} B",
        sent.best_effort_size, sent.ack_size
    );
    println!(
        "Responder sent {} messages: {}",
        sent.message_count,
        format_bps(sent.throughput_bps)
    );
    println!(
        "Initiator received {} messages: {}",
        received.message_count,
        format_bps(received.throughput_bps)
    );
}

/// Human-readable bits per second
pub fn format_bps(bps: u32) -> String {
    if bps >= 1_000_000 {
        format!("{:.2} Mbit/s", bps as f64 / 1_000_000.0)
    } else if bps >= 1_000 {
        format!("{:.1} kbit/s", bps as f64 / 1_000.0)
    } else {
        format!("{bps} bit/s")
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_formatting_picks_the_right_unit() {
        assert_eq!(format_bps(750), "750 bit/s");
        assert_eq!(format_bps(1_300_000), "1.30 Mbit/s");
        assert_eq!(format_bps(96_500), "96.5 kbit/s");
    }

    #[tokio::test]
    async fn fixed_count_demo_runs_to_completion() {
        let mut config = AppConfig::default();
        config.burst.count = Some(20);
        let app = App::new(config);
        app.run_demo(ChannelId::Ack).await.unwrap();
    }
}
