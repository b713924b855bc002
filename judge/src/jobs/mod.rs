//! Queue jobs and their processing

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::circuit::{submit_circuit, CircuitRequest};
use crate::error::into_reply;
use crate::judger::{JudgeContext, RunRequest};

/// Worker job enum - represents different types of jobs the worker can process
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum WorkerJob {
    /// Run and judge a Debug Dash submission
    #[serde(rename = "run")]
    Run(RunJob),
    /// Check a logic-circuit answer
    #[serde(rename = "validate_circuit")]
    ValidateCircuit(CircuitJob),
}

impl WorkerJob {
    pub fn request_id(&self) -> &str {
        match self {
            WorkerJob::Run(job) => &job.request_id,
            WorkerJob::ValidateCircuit(job) => &job.request_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunJob {
    pub request_id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub challenge_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CircuitJob {
    pub request_id: String,
    #[serde(default)]
    pub circuit_id: Option<serde_json::Value>,
    #[serde(default)]
    pub player_sequence: Option<serde_json::Value>,
}

/// Result stored and published for a job.
///
/// `reply` carries the same body the HTTP surface would return.
#[derive(Debug, Serialize)]
pub struct JobResult {
    pub request_id: String,
    pub status_code: u16,
    #[serde(flatten)]
    pub reply: serde_json::Value,
}

/// Process one job. Never fails: faults become a 500 reply
pub async fn process_job(job: WorkerJob, ctx: &JudgeContext) -> JobResult {
    match job {
        WorkerJob::Run(job) => {
            info!("Received run job: request_id={}", job.request_id);
            let request = RunRequest {
                code: job.code,
                challenge_id: job.challenge_id,
            };
            let (status_code, reply) =
                into_reply(ctx.submit_run(&request).await, "Error executing code");
            JobResult {
                request_id: job.request_id,
                status_code,
                reply,
            }
        }
        WorkerJob::ValidateCircuit(job) => {
            info!("Received circuit job: request_id={}", job.request_id);
            let request = CircuitRequest {
                circuit_id: job.circuit_id,
                player_sequence: job.player_sequence,
            };
            let (status_code, reply) = into_reply(
                submit_circuit(ctx.repo.as_ref(), &request).await,
                "Error validating solution",
            );
            JobResult {
                request_id: job.request_id,
                status_code,
                reply,
            }
        }
    }
}
