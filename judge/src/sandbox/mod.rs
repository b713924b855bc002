//! Sandbox module - V8 isolate for untrusted snippets
//!
//! This module runs one submitted script in a fresh V8 isolate.
//! It handles:
//! - Building the isolate, injecting `console.log` and removing host bindings
//! - Time, heap and output limits
//! - Telling syntax errors, uncaught exceptions and limit breaches apart
//!
//! The sandbox module does NOT:
//! - Manage the async side of timeouts or concurrency (that's the runner's job)
//! - Compare outputs or decide verdicts

pub mod capture;
pub mod config;
pub mod error;
mod isolate;
mod ops;


use std::sync::atomic::AtomicBool;

// Re-exports for convenience
pub use config::{get_config, init_config, SandboxConfig};
pub use error::ScriptError;

/// Run `source` to completion and return everything it printed.
///
/// Blocks the calling thread, which also owns the isolate. Raising `cancel`
/// terminates the script with [`ScriptError::Timeout`]. `Err` means the worker
/// could not host the run at all.
pub fn run_script(
    source: &str,
    config: &SandboxConfig,
    cancel: &AtomicBool,
) -> anyhow::Result<Result<String, ScriptError>> {
    if source.len() > config.max_source_bytes {
        return Ok(Err(ScriptError::Syntax(format!(
            "Source exceeds the {} byte limit",
            config.max_source_bytes
        ))));
    }
    isolate::run_in_isolate(source, config, cancel)
}
