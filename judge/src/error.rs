//! Submission pipeline errors

use serde::Serialize;
use thiserror::Error;

/// Why a submission produced no verdict
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A required request field was missing or empty
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Code exceeds the {0} byte limit")]
    SourceTooLarge(usize),

    #[error("{0}")]
    NotFound(String),

    /// Infrastructure fault; details stay in the logs
    #[error(transparent)]
    System(#[from] anyhow::Error),
}

impl SubmitError {
    pub fn status_code(&self) -> u16 {
        match self {
            SubmitError::MissingField(_) | SubmitError::SourceTooLarge(_) => 400,
            SubmitError::NotFound(_) => 404,
            SubmitError::System(_) => 500,
        }
    }

    /// Body sent to the caller
    pub fn to_response(&self, system_message: &str) -> FailureResponse {
        let error = match self {
            SubmitError::System(_) => system_message.to_string(),
            other => other.to_string(),
        };
        FailureResponse {
            success: false,
            error,
        }
    }
}

/// `{ success: false, error }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

/// Status code and JSON body for a pipeline outcome
pub fn into_reply<T: Serialize>(
    outcome: Result<T, SubmitError>,
    system_message: &str,
) -> (u16, serde_json::Value) {
    let (status, body) = match outcome {
        Ok(response) => (200, serde_json::to_value(response)),
        Err(e) => {
            if let SubmitError::System(ref cause) = e {
                tracing::error!("{}: {:#}", system_message, cause);
            }
            (e.status_code(), serde_json::to_value(e.to_response(system_message)))
        }
    };
    match body {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!("Failed to serialize reply: {}", e);
            (
                500,
                serde_json::json!({ "success": false, "error": system_message }),
            )
        }
    }
}
