//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use blethru_core::{ChannelId, Phy};

#[derive(Parser)]
#[command(name = "blethru", author, version, about = "Two-peer link throughput tester", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both connection roles over the in-process loopback link
    Demo {
        /// Data channel to exercise
        #[arg(long, value_enum, default_value_t = ChannelArg::Ack)]
        channel: ChannelArg,

        /// End the burst after this many messages
        #[arg(long, conflicts_with = "seconds")]
        count: Option<u32>,

        /// End the burst after this many seconds
        #[arg(long)]
        seconds: Option<u32>,

        /// Advertised device name the initiator matches against
        #[arg(short, long)]
        name: Option<String>,

        /// PHY preference for the connection
        #[arg(short, long, value_enum)]
        phy: Option<PhyArg>,
    },
    /// Print the negotiated message sizes for a set of link parameters
    Sizes {
        /// Data-channel PDU size in bytes
        #[arg(long, default_value_t = 251)]
        pdu: u16,

        /// Negotiated MTU in bytes
        #[arg(long, default_value_t = 247)]
        mtu: u16,

        /// Requested best-effort payload size (0 = as large as fits)
        #[arg(long, default_value_t = 0)]
        best_effort_cap: u16,

        /// Requested ack payload size (0 = as large as fits)
        #[arg(long, default_value_t = 0)]
        ack_cap: u16,
    },
}

// ----------------------------------------------------------------------------
// Argument Enums
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    BestEffort,
    Ack,
}

impl From<ChannelArg> for ChannelId {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::BestEffort => ChannelId::BestEffort,
            ChannelArg::Ack => ChannelId::Ack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhyArg {
    /// 1M PHY
    #[value(name = "1m")]
    OneM,
    /// 2M PHY
    #[value(name = "2m")]
    TwoM,
    /// Coded PHY, S=8
    #[value(name = "coded")]
    CodedS8,
}

impl From<PhyArg> for Phy {
    fn from(arg: PhyArg) -> Self {
        match arg {
            PhyArg::OneM => Phy::OneM,
            PhyArg::TwoM => Phy::TwoM,
            PhyArg::CodedS8 => Phy::CodedS8,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_arguments_parse() {
        let cli = Cli::try_parse_from([
            "blethru", "demo", "--channel", "ack", "--count", "100", "--phy", "2m",
        ])
        .unwrap();
        match cli.command {
            Commands::Demo {
                channel,
                count,
                seconds,
                phy,
                ..
            } => {
                assert_eq!(channel, ChannelArg::Ack);
                assert_eq!(count, Some(100));
                assert_eq!(seconds, None);
                assert_eq!(phy, Some(PhyArg::TwoM));
            }
            _ => panic!("expected demo command"),
        }
    }

    #[test]
    fn count_and_seconds_conflict() {
        let result =
            Cli::try_parse_from(["blethru", "demo", "--count", "10", "--seconds", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn sizes_defaults_match_the_common_link() {
        let cli = Cli::try_parse_from(["blethru", "sizes"]).unwrap();
        match cli.command {
            Commands::Sizes { pdu, mtu, .. } => {
                assert_eq!(pdu, 251);
                assert_eq!(mtu, 247);
            }
            _ => panic!("expected sizes command"),
        }
    }
}
