use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;
use transcribe_control::{create_router, AppState, Config};

#[derive(Debug, Parser)]
#[command(name = "transcribe-control", about = "Transcription session control service")]
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

    info!("{} v0.1.0", cfg.service.name);

    let state = AppState::new(Duration::from_millis(cfg.control.stop_timeout_ms));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    info!("Control channel upgrades on /ws");

    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}
