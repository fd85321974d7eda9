//! Blethru Runtime
//!
//! The async engine around the pure state machine in `blethru-core`: it owns
//! one [`Machine`], pulls events from a [`RadioStack`] implementation, feeds
//! them through the machine, and executes the commands the machine returns,
//! with a bounded retry policy for a transiently busy stack.
//!
//! The crate also ships [`loopback`], an in-process radio stack that links
//! two runtimes together so the whole initiator/responder exchange can run
//! end to end without hardware.
//!
//! [`Machine`]: blethru_core::Machine

pub mod clock;
pub mod error;
pub mod event_loop;
pub mod loopback;
pub mod radio;

pub use clock::{SystemTickClock, TickClock};
pub use error::{Result, RuntimeError};
pub use event_loop::{EventLoop, RuntimeHandle};
pub use loopback::{LoopbackProbe, LoopbackStack};
pub use radio::{RadioStack, RetryPolicy};
