//! Headless transcription agent.
//!
//! Attaches to the control service's `/ws` endpoint through the shared
//! `ControlChannel` and logs every start/stop command it receives. Stands
//! in for the local process that performs the transcription work and posts
//! results back over `/api/transcription`.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use transcribe_control::{ChannelConfig, Config, ControlChannel};

#[derive(Debug, Parser)]
#[command(name = "agent", about = "Control channel agent")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/transcribe-control")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let channel = ControlChannel::new(ChannelConfig {
        url: cfg.control.url.clone(),
        reconnect_delay: Duration::from_millis(cfg.control.reconnect_delay_ms),
    });

    let _consumer = channel
        .attach(
            Arc::new(|| info!("transcription start requested")),
            Arc::new(|| info!("transcription stop requested")),
        )
        .await;

    channel.connect().await;
    info!(url = %cfg.control.url, "agent attached to control channel");

    tokio::signal::ctrl_c().await?;
    channel.disconnect().await;

    Ok(())
}
