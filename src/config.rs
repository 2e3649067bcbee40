//! Runtime configuration from command-line flags and environment variables.

use clap::Parser;

use crate::router::DEFAULT_MAX_BODY_BYTES;

/// In-memory user CRUD service.
#[derive(Parser, Debug, Clone)]
#[command(name = "roster", version, about)]
pub struct Config {
    /// Address to listen on (`host:port`).
    #[arg(long, env = "ROSTER_ADDR", default_value = "localhost:8080")]
    pub addr: String,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "ROSTER_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `roster=debug`).
    #[arg(long, env = "ROSTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "ROSTER_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}
