//! Entry point for running one submitted snippet under the configured limits

use anyhow::Result;

use crate::runner::{ExecutionResult, Runner};
use crate::sandbox::get_config;

/// Execute `code` with a wall-clock limit of `timeout_ms`.
///
/// Every other limit comes from the process-wide sandbox configuration.
pub async fn execute(runner: &dyn Runner, code: &str, timeout_ms: u32) -> Result<ExecutionResult> {
    let limits = get_config().with_time_limit(timeout_ms);
    runner.run(code, &limits).await
}
