//! Script failure types

use thiserror::Error;

/// Why a script did not run to completion.
///
/// Every variant is a property of the submitted code, never of the worker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The source did not parse; nothing ran
    #[error("{0}")]
    Syntax(String),

    /// An exception escaped the top level of the script
    #[error("{message}")]
    Uncaught { name: String, message: String },

    #[error("Script execution timed out after {0}ms")]
    Timeout(u32),

    #[error("Memory limit exceeded")]
    MemoryLimit,

    #[error("Output limit of {0} bytes exceeded")]
    OutputLimit(usize),
}

impl ScriptError {
    /// Short machine-readable class used in logs
    pub fn kind(&self) -> &str {
        match self {
            ScriptError::Syntax(_) => "SyntaxError",
            ScriptError::Uncaught { name, .. } => name,
            ScriptError::Timeout(_) => "Timeout",
            ScriptError::MemoryLimit => "MemoryLimit",
            ScriptError::OutputLimit(_) => "OutputLimit",
        }
    }
}
