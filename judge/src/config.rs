//! Worker configuration read from the environment (and `.env`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use tracing::warn;

use crate::sandbox::SandboxConfig;

const DEFAULT_CHALLENGES_PATH: &str = "./files/challenges.toml";
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONCURRENT_RUNS: usize = 16;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub challenges_path: PathBuf,
    pub http_addr: SocketAddr,
    /// Queue worker is only started when set
    pub redis_url: Option<String>,
    pub max_concurrent_runs: usize,
    pub sandbox: SandboxConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.into());
        let http_addr = http_addr
            .parse()
            .with_context(|| format!("Invalid HTTP_ADDR: {}", http_addr))?;

        let defaults = SandboxConfig::default();
        let sandbox = SandboxConfig {
            time_limit_ms: parse_or(&lookup, "RUN_TIME_LIMIT_MS", defaults.time_limit_ms),
            max_source_bytes: parse_or(&lookup, "MAX_SOURCE_BYTES", defaults.max_source_bytes),
            max_output_bytes: parse_or(&lookup, "MAX_OUTPUT_BYTES", defaults.max_output_bytes),
            max_heap_bytes: parse_or(&lookup, "MAX_HEAP_BYTES", defaults.max_heap_bytes),
        };

        Ok(Self {
            challenges_path: lookup("CHALLENGES_PATH")
                .unwrap_or_else(|| DEFAULT_CHALLENGES_PATH.into())
                .into(),
            http_addr,
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            max_concurrent_runs: parse_or(
                &lookup,
                "MAX_CONCURRENT_RUNS",
                DEFAULT_MAX_CONCURRENT_RUNS,
            ),
            sandbox,
        })
    }
}

/// Parse a numeric variable, keeping the default (with a warning) when it is malformed
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
    }
}
