use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub control: ControlConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ControlConfig {
    /// Control endpoint the agent connects to
    pub url: String,

    /// Delay before an automatic reconnect attempt
    pub reconnect_delay_ms: u64,

    /// How long /api/stop waits for the next transcription
    pub stop_timeout_ms: u64,
}

impl Config {
    /// Load configuration from a file, falling back to built-in defaults
    /// for anything the file does not set (or if the file is absent).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "transcribe-control")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080_i64)?
            .set_default("control.url", "ws://127.0.0.1:8080/ws")?
            .set_default("control.reconnect_delay_ms", 5000_i64)?
            .set_default("control.stop_timeout_ms", 30_000_i64)?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
