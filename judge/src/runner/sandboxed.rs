//! Sandboxed runner implementation using V8 isolates
//!
//! Every run gets a fresh OS thread with its own isolate, globals and output
//! buffer. A semaphore bounds how many of those threads are alive at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, warn};

use super::{ExecutionResult, Runner};
use crate::sandbox::{run_script, SandboxConfig, ScriptError};

/// Stack reserved for each isolate thread. V8 stops JS recursion well below it.
const SANDBOX_STACK_BYTES: usize = 8 * 1024 * 1024;

/// Extra wait past the script's own deadline before the async side gives up.
/// Covers isolate startup, which the script's deadline does not.
const GRACE: Duration = Duration::from_secs(1);

/// Raises the cancel flag when the waiting side goes away
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Runner that executes scripts on dedicated isolate threads
pub struct SandboxedRunner {
    semaphore: Arc<Semaphore>,
}

impl SandboxedRunner {
    /// Create a runner allowing `max_concurrent` live sandbox threads
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run a script in the sandbox
    pub async fn execute(&self, source: &str, limits: &SandboxConfig) -> Result<ExecutionResult> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Sandbox semaphore closed")?;

        let cancel = Arc::new(AtomicBool::new(false));
        let _cancel_guard = CancelOnDrop(cancel.clone());
        let (tx, rx) = oneshot::channel();

        let thread_cancel = cancel.clone();
        let thread_limits = limits.clone();
        let source = source.to_owned();
        std::thread::Builder::new()
            .name("sandbox".into())
            .stack_size(SANDBOX_STACK_BYTES)
            .spawn(move || {
                // Held until the isolate thread is done, not just until we reply
                let _permit = permit;
                let result = run_script(&source, &thread_limits, &thread_cancel);
                let _ = tx.send(result);
            })
            .context("Failed to spawn sandbox thread")?;

        let wait = Duration::from_millis(u64::from(limits.time_limit_ms)) + GRACE;
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(outcome)) => {
                let result = outcome?;
                if let Err(ref e) = result {
                    debug!("Script failed: kind={}, message={}", e.kind(), e);
                }
                Ok(ExecutionResult::from(result))
            }
            Ok(Err(_)) => anyhow::bail!("Sandbox thread panicked"),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(
                    "Sandbox thread missed its {}ms deadline; cancel flag raised",
                    limits.time_limit_ms
                );
                Ok(ExecutionResult::failed(ScriptError::Timeout(
                    limits.time_limit_ms,
                )))
            }
        }
    }
}

#[async_trait]
impl Runner for SandboxedRunner {
    async fn run(&self, source: &str, limits: &SandboxConfig) -> Result<ExecutionResult> {
        self.execute(source, limits).await
    }
}
