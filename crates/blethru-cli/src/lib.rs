//! Blethru CLI
//!
//! Command-line front end for the link throughput tester: a demo mode that
//! runs both connection roles over the in-process loopback link, and a
//! sizing utility that prints the negotiated message sizes for a given set
//! of link parameters.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{CliError, Result};
