use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sandbox::ScriptError;

/// Verdict class from judging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Accepted,
    WrongAnswer,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
}

impl VerdictKind {
    /// Classify a failed run
    pub fn from_failure(error: &ScriptError) -> Self {
        match error {
            ScriptError::Syntax(_) => VerdictKind::CompileError,
            ScriptError::Uncaught { .. } => VerdictKind::RuntimeError,
            ScriptError::Timeout(_) => VerdictKind::TimeLimitExceeded,
            ScriptError::MemoryLimit => VerdictKind::MemoryLimitExceeded,
            ScriptError::OutputLimit(_) => VerdictKind::OutputLimitExceeded,
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerdictKind::Accepted => "accepted",
            VerdictKind::WrongAnswer => "wrong_answer",
            VerdictKind::CompileError => "compile_error",
            VerdictKind::RuntimeError => "runtime_error",
            VerdictKind::TimeLimitExceeded => "time_limit_exceeded",
            VerdictKind::MemoryLimitExceeded => "memory_limit_exceeded",
            VerdictKind::OutputLimitExceeded => "output_limit_exceeded",
        };
        write!(f, "{}", s)
    }
}

/// Judged outcome of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub verdict: VerdictKind,
    pub is_correct: bool,
    /// Normalized actual output; empty when the run failed
    pub output: String,
    /// Stored expected output, as written
    pub expected_output: String,
    pub error: Option<String>,
    pub points: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_name() {
        for kind in [
            VerdictKind::Accepted,
            VerdictKind::WrongAnswer,
            VerdictKind::TimeLimitExceeded,
            VerdictKind::OutputLimitExceeded,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_failure_classes() {
        assert_eq!(
            VerdictKind::from_failure(&ScriptError::Syntax("Unexpected token".into())),
            VerdictKind::CompileError
        );
        assert_eq!(
            VerdictKind::from_failure(&ScriptError::Timeout(1000)),
            VerdictKind::TimeLimitExceeded
        );
        assert_eq!(
            VerdictKind::from_failure(&ScriptError::MemoryLimit),
            VerdictKind::MemoryLimitExceeded
        );
    }
}
