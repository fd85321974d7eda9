//! Radio-stack collaborator trait
//!
//! The state machine only ever talks to the radio through [`RadioCommand`]
//! and [`RadioEvent`]; this trait is the seam where a real stack binding, or
//! the in-process [`loopback`] link, plugs in.
//!
//! [`loopback`]: crate::loopback

use std::time::Duration;

use async_trait::async_trait;

use blethru_core::{CommandOutcome, RadioCommand, RadioEvent};

/// One side of a radio link.
///
/// `next_event` must be cancel safe: the event loop polls it inside
/// `tokio::select!` and a cancelled poll must not lose an event.
#[async_trait]
pub trait RadioStack: Send {
    /// Wait for the next event from the stack. `None` means the stack shut
    /// down and the event loop should stop.
    async fn next_event(&mut self) -> Option<RadioEvent>;

    /// Submit one command to the stack
    async fn submit(&mut self, command: RadioCommand) -> CommandOutcome;
}

// ----------------------------------------------------------------------------
// Retry Policy
// ----------------------------------------------------------------------------

/// Bounded retry for a transiently busy stack.
///
/// A busy stack gets `max_attempts` tries with `backoff` between them; after
/// that the command is dropped and logged rather than spun on forever.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(5),
        }
    }
}
