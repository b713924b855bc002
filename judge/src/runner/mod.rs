//! Runner module - Execution abstraction layer
//!
//! This module provides a unified interface for running submitted scripts:
//! - `SandboxedRunner`: runs each script on its own thread inside a V8 isolate
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about challenge-specific logic
//! - Validate request fields

pub mod sandboxed;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sandbox::{SandboxConfig, ScriptError};

/// Outcome of running a script.
///
/// When `error_message` is set, `output` is empty: partial output of a failed
/// run is never returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub output: String,
    pub error_message: Option<String>,
    /// Failure class, kept for verdict classification
    #[serde(skip)]
    pub failure: Option<ScriptError>,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error_message: None,
            failure: None,
        }
    }

    pub fn failed(error: ScriptError) -> Self {
        Self {
            output: String::new(),
            error_message: Some(error.to_string()),
            failure: Some(error),
        }
    }
}

impl From<Result<String, ScriptError>> for ExecutionResult {
    fn from(result: Result<String, ScriptError>) -> Self {
        match result {
            Ok(output) => Self::succeeded(output),
            Err(error) => Self::failed(error),
        }
    }
}

/// Runner trait for executing scripts.
///
/// `Err` is reserved for faults of the worker itself; everything the script
/// does wrong comes back as a failed [`ExecutionResult`].
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, source: &str, limits: &SandboxConfig) -> Result<ExecutionResult>;
}

// Re-exports
pub use sandboxed::SandboxedRunner;
