//! Logic-circuit answer checking
//!
//! A circuit answer is correct when the submitted gate sequence is exactly the
//! stored one. Nothing is executed.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::challenges::{ChallengeRepository, LogicCircuit};
use crate::error::SubmitError;
use crate::judger::{is_falsy, RecordId};

const MISSING_CIRCUIT_FIELDS: &str = "Circuit ID and sequence required";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitRequest {
    #[serde(default, rename = "circuitId", alias = "circuit_id")]
    pub circuit_id: Option<serde_json::Value>,
    #[serde(default, rename = "playerSequence", alias = "player_sequence")]
    pub player_sequence: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitVerdict {
    pub is_correct: bool,
    pub expected_output: serde_json::Value,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitResponse {
    pub success: bool,
    #[serde(flatten)]
    pub verdict: CircuitVerdict,
}

/// Compare a player's gate sequence with the circuit's solution
pub fn validate_circuit(circuit: &LogicCircuit, player_sequence: &serde_json::Value) -> CircuitVerdict {
    let is_correct = match player_sequence.as_array() {
        Some(gates) => {
            gates.len() == circuit.correct_sequence.len()
                && gates
                    .iter()
                    .zip(&circuit.correct_sequence)
                    .all(|(given, expected)| given.as_str() == Some(expected.as_str()))
        }
        None => false,
    };
    CircuitVerdict {
        is_correct,
        expected_output: circuit.expected_output.clone(),
        points: if is_correct { circuit.points } else { 0 },
    }
}

/// Validate and check one circuit answer
pub async fn submit_circuit(
    repo: &dyn ChallengeRepository,
    request: &CircuitRequest,
) -> Result<CircuitResponse, SubmitError> {
    let player_sequence = match &request.player_sequence {
        Some(sequence) if !is_falsy(Some(sequence)) => sequence,
        _ => return Err(SubmitError::MissingField(MISSING_CIRCUIT_FIELDS)),
    };
    let circuit_id = match RecordId::parse(request.circuit_id.as_ref()) {
        RecordId::Missing => return Err(SubmitError::MissingField(MISSING_CIRCUIT_FIELDS)),
        RecordId::Unknown => return Err(SubmitError::NotFound("Circuit not found".into())),
        RecordId::Id(id) => id,
    };

    let circuit = repo
        .get_circuit(circuit_id)
        .await?
        .ok_or_else(|| SubmitError::NotFound("Circuit not found".into()))?;

    let verdict = validate_circuit(&circuit, player_sequence);
    info!(
        "Circuit check: circuit_id={}, correct={}, points={}",
        circuit_id, verdict.is_correct, verdict.points
    );

    Ok(CircuitResponse {
        success: true,
        verdict,
    })
}
