//! Blethru CLI entry point

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blethru_cli::{
    app::App,
    cli::{Cli, Commands},
    config::AppConfig,
};
use blethru_core::sizing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Demo {
            channel,
            count,
            seconds,
            name,
            phy,
        } => {
            // CLI arguments win over the config file
            if let Some(name) = name {
                config.device_name = name;
            }
            if let Some(phy) = phy {
                config.phy = phy.into();
            }
            if count.is_some() {
                config.burst.count = count;
                config.burst.seconds = None;
            } else if seconds.is_some() {
                config.burst.seconds = seconds;
                config.burst.count = None;
            }

            let app = App::new(config);
            app.run_demo(channel.into()).await?;
            info!("demo finished");
        }
        Commands::Sizes {
            pdu,
            mtu,
            best_effort_cap,
            ack_cap,
        } => {
            println!(
                "best-effort message: {} B",
                sizing::best_effort_size(pdu, mtu, best_effort_cap)
            );
            println!("ack message: {} B", sizing::ack_size(mtu, ack_cap));
        }
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}
