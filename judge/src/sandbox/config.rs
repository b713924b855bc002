//! Sandbox configuration
//!
//! Resource limits for the script sandbox, loaded once at startup.

use std::sync::OnceLock;
use tracing::warn;

/// Resource limits applied to a single script execution
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Wall-clock time limit in milliseconds (default: 1000ms)
    pub time_limit_ms: u32,
    /// Maximum accepted source size in bytes (default: 64KB)
    pub max_source_bytes: usize,
    /// Maximum captured output in bytes (default: 64KB)
    pub max_output_bytes: usize,
    /// V8 heap limit in bytes (default: 64MB)
    pub max_heap_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 1000,
            max_source_bytes: 64 * 1024,
            max_output_bytes: 64 * 1024,
            max_heap_bytes: 64 * 1024 * 1024,
        }
    }
}

impl SandboxConfig {
    /// Copy of this config with a different time limit
    pub fn with_time_limit(&self, time_limit_ms: u32) -> Self {
        let mut config = self.clone();
        config.time_limit_ms = time_limit_ms;
        config
    }
}

/// Global sandbox configuration
static SANDBOX_CONFIG: OnceLock<SandboxConfig> = OnceLock::new();

/// Initialize sandbox configuration
pub fn init_config(config: SandboxConfig) -> anyhow::Result<()> {
    SANDBOX_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Sandbox configuration already initialized"))?;

    Ok(())
}

/// Get sandbox configuration
pub fn get_config() -> &'static SandboxConfig {
    SANDBOX_CONFIG.get().unwrap_or_else(|| {
        static DEFAULT: OnceLock<SandboxConfig> = OnceLock::new();

        warn!("Sandbox configuration not initialized, using default");
        DEFAULT.get_or_init(SandboxConfig::default)
    })
}
