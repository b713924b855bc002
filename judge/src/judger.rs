//! Judger module for processing Debug Dash submissions
//!
//! This module handles the core judging logic: validating a run request,
//! executing the code in the sandbox and comparing its output with the
//! challenge's expected output.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::challenges::{Challenge, ChallengeRepository};
use crate::core::{normalize, outputs_match, Verdict, VerdictKind};
use crate::error::SubmitError;
use crate::executor::execute;
use crate::runner::{ExecutionResult, Runner};
use crate::sandbox::SandboxConfig;

const MISSING_RUN_FIELDS: &str = "Code and challengeId required";

/// Everything a request handler needs to judge submissions
#[derive(Clone)]
pub struct JudgeContext {
    pub repo: Arc<dyn ChallengeRepository>,
    pub runner: Arc<dyn Runner>,
    pub limits: SandboxConfig,
}

impl JudgeContext {
    pub async fn submit_run(&self, request: &RunRequest) -> Result<RunResponse, SubmitError> {
        submit_run(self.repo.as_ref(), self.runner.as_ref(), &self.limits, request).await
    }
}

/// Run request as received from a caller. Fields are optional so that
/// missing ones are rejected here instead of by the deserializer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "challengeId", alias = "challenge_id")]
    pub challenge_id: Option<serde_json::Value>,
}

/// `{ success: true, ...verdict }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResponse {
    pub success: bool,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Caller-supplied record id
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RecordId {
    /// Absent or falsy (`null`, `0`, `""`, `false`)
    Missing,
    /// Present but cannot name any record
    Unknown,
    Id(i64),
}

/// Absent, or a value a JS truthiness check rejects (`null`, `false`, `0`, `""`)
pub(crate) fn is_falsy(value: Option<&serde_json::Value>) -> bool {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl RecordId {
    pub(crate) fn parse(value: Option<&serde_json::Value>) -> Self {
        use serde_json::Value;
        if is_falsy(value) {
            return RecordId::Missing;
        }
        match value {
            None => RecordId::Missing,
            Some(Value::Number(n)) => n.as_i64().map(RecordId::Id).unwrap_or(RecordId::Unknown),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(RecordId::Id)
                .unwrap_or(RecordId::Unknown),
            Some(_) => RecordId::Unknown,
        }
    }
}

/// Judge an execution result against a challenge
pub fn judge(result: &ExecutionResult, challenge: &Challenge) -> Verdict {
    if let Some(message) = &result.error_message {
        let kind = result
            .failure
            .as_ref()
            .map(VerdictKind::from_failure)
            .unwrap_or(VerdictKind::RuntimeError);
        return Verdict {
            verdict: kind,
            is_correct: false,
            output: String::new(),
            expected_output: challenge.expected_output.clone(),
            error: Some(message.clone()),
            points: 0,
        };
    }

    let is_correct = outputs_match(&result.output, &challenge.expected_output);
    let output = normalize(&result.output);
    Verdict {
        verdict: if is_correct {
            VerdictKind::Accepted
        } else {
            VerdictKind::WrongAnswer
        },
        is_correct,
        output: output.to_string(),
        expected_output: challenge.expected_output.clone(),
        error: None,
        points: if is_correct { challenge.points } else { 0 },
    }
}

/// Hex SHA-256 of submitted code, logged in place of the code itself
pub fn code_fingerprint(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate, execute and judge one run request
pub async fn submit_run(
    repo: &dyn ChallengeRepository,
    runner: &dyn Runner,
    limits: &SandboxConfig,
    request: &RunRequest,
) -> Result<RunResponse, SubmitError> {
    let code = match request.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(SubmitError::MissingField(MISSING_RUN_FIELDS)),
    };
    let challenge_id = match RecordId::parse(request.challenge_id.as_ref()) {
        RecordId::Missing => return Err(SubmitError::MissingField(MISSING_RUN_FIELDS)),
        RecordId::Unknown => return Err(SubmitError::NotFound("Challenge not found".into())),
        RecordId::Id(id) => id,
    };
    if code.len() > limits.max_source_bytes {
        return Err(SubmitError::SourceTooLarge(limits.max_source_bytes));
    }

    let challenge = repo
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| SubmitError::NotFound("Challenge not found".into()))?;

    let started = Instant::now();
    let result = execute(runner, code, limits.time_limit_ms).await.map_err(|e| {
        warn!("Sandbox fault for challenge_id={}: {:#}", challenge_id, e);
        SubmitError::System(e)
    })?;
    let verdict = judge(&result, &challenge);

    info!(
        "Run summary: challenge_id={}, code_sha256={}, code_bytes={}, verdict={}, points={}, elapsed_ms={}",
        challenge_id,
        code_fingerprint(code),
        code.len(),
        verdict.verdict,
        verdict.points,
        started.elapsed().as_millis()
    );

    Ok(RunResponse {
        success: true,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenges::FileChallengeRepository;
    use crate::runner::SandboxedRunner;
    use crate::sandbox::ScriptError;
    use async_trait::async_trait;
    use serde_json::json;

    fn challenge(expected_output: &str, points: u32) -> Challenge {
        Challenge {
            id: 1,
            title: "Sum".into(),
            description: String::new(),
            starter_code: String::new(),
            expected_output: expected_output.into(),
            points,
        }
    }

    fn repo() -> FileChallengeRepository {
        FileChallengeRepository::from_toml(
            r#"
[[challenges]]
id = 1
title = "Sum"
expected_output = "5"
points = 10

[[challenges]]
id = 2
title = "Lines"
expected_output = "a\nb\n"
"#,
        )
        .unwrap()
    }

    fn request(code: Option<&str>, challenge_id: serde_json::Value) -> RunRequest {
        RunRequest {
            code: code.map(String::from),
            challenge_id: Some(challenge_id),
        }
    }

    fn limits() -> SandboxConfig {
        SandboxConfig::default().with_time_limit(1000)
    }

    #[test]
    fn test_judge_accepts_after_trimming() {
        let verdict = judge(&ExecutionResult::succeeded("5\n"), &challenge(" 5 ", 10));
        assert!(verdict.is_correct);
        assert_eq!(verdict.verdict, VerdictKind::Accepted);
        assert_eq!(verdict.points, 10);
        assert_eq!(verdict.output, "5");
        assert_eq!(verdict.expected_output, " 5 ");
        assert_eq!(verdict.error, None);
    }

    #[test]
    fn test_judge_is_case_sensitive() {
        let verdict = judge(&ExecutionResult::succeeded("hello\n"), &challenge("Hello", 10));
        assert!(!verdict.is_correct);
        assert_eq!(verdict.verdict, VerdictKind::WrongAnswer);
        assert_eq!(verdict.points, 0);
        assert_eq!(verdict.output, "hello");
    }

    #[test]
    fn test_judge_failure_scores_zero() {
        let result = ExecutionResult::failed(ScriptError::Timeout(1000));
        let verdict = judge(&result, &challenge("", 10));
        assert!(!verdict.is_correct);
        assert_eq!(verdict.verdict, VerdictKind::TimeLimitExceeded);
        assert_eq!(verdict.output, "");
        assert_eq!(
            verdict.error.as_deref(),
            Some("Script execution timed out after 1000ms")
        );
        assert_eq!(verdict.points, 0);
    }

    #[test]
    fn test_judge_is_deterministic() {
        let result = ExecutionResult::succeeded(" 5 \n");
        let c = challenge("5", 7);
        assert_eq!(judge(&result, &c), judge(&result, &c));
    }

    #[test]
    fn test_record_id_parsing() {
        assert_eq!(RecordId::parse(None), RecordId::Missing);
        assert_eq!(RecordId::parse(Some(&json!(0))), RecordId::Missing);
        assert_eq!(RecordId::parse(Some(&json!(""))), RecordId::Missing);
        assert_eq!(RecordId::parse(Some(&json!(3))), RecordId::Id(3));
        assert_eq!(RecordId::parse(Some(&json!("3"))), RecordId::Id(3));
        assert_eq!(RecordId::parse(Some(&json!("abc"))), RecordId::Unknown);
        assert_eq!(RecordId::parse(Some(&json!(1.5))), RecordId::Unknown);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = RunResponse {
            success: true,
            verdict: judge(&ExecutionResult::succeeded("5"), &challenge("5", 10)),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "verdict": "accepted",
                "isCorrect": true,
                "output": "5",
                "expectedOutput": "5",
                "error": null,
                "points": 10
            })
        );
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            code_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_submit_correct_code() {
        let runner = SandboxedRunner::new(2);
        let response = submit_run(
            &repo(),
            &runner,
            &limits(),
            &request(Some("console.log(2 + 3)"), json!(1)),
        )
        .await
        .unwrap();
        assert!(response.success);
        assert!(response.verdict.is_correct);
        assert_eq!(response.verdict.points, 10);
    }

    #[tokio::test]
    async fn test_submit_multi_line_output_with_default_points() {
        let runner = SandboxedRunner::new(2);
        let response = submit_run(
            &repo(),
            &runner,
            &limits(),
            &request(Some("['a', 'b'].forEach(x => console.log(x))"), json!("2")),
        )
        .await
        .unwrap();
        assert!(response.verdict.is_correct);
        assert_eq!(response.verdict.points, 15);
    }

    #[tokio::test]
    async fn test_submit_throwing_code_is_judged() {
        let runner = SandboxedRunner::new(2);
        let response = submit_run(
            &repo(),
            &runner,
            &limits(),
            &request(Some("console.log('x'); undefinedVariable;"), json!(1)),
        )
        .await
        .unwrap();
        assert!(response.success);
        assert!(!response.verdict.is_correct);
        assert_eq!(response.verdict.output, "");
        assert_eq!(response.verdict.verdict, VerdictKind::RuntimeError);
        assert_eq!(
            response.verdict.error.as_deref(),
            Some("undefinedVariable is not defined")
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let runner = SandboxedRunner::new(1);
        for req in [
            request(None, json!(1)),
            request(Some(""), json!(1)),
            RunRequest {
                code: Some("console.log(1)".into()),
                challenge_id: None,
            },
        ] {
            let err = submit_run(&repo(), &runner, &limits(), &req)
                .await
                .unwrap_err();
            assert!(matches!(err, SubmitError::MissingField(_)));
            assert_eq!(err.to_string(), "Code and challengeId required");
        }
    }

    #[tokio::test]
    async fn test_submit_unknown_challenge() {
        let runner = SandboxedRunner::new(1);
        let err = submit_run(&repo(), &runner, &limits(), &request(Some("1"), json!(42)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Challenge not found");
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_code() {
        let runner = SandboxedRunner::new(1);
        let mut small = limits();
        small.max_source_bytes = 8;
        let err = submit_run(&repo(), &runner, &small, &request(Some("console.log(1)"), json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::SourceTooLarge(8)));
    }

    #[tokio::test]
    async fn test_shipped_starter_code_needs_fixing() {
        let repo = FileChallengeRepository::load(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/files/challenges.toml"
        ))
        .unwrap();
        let runner = SandboxedRunner::new(4);
        for challenge in repo.list_challenges().await.unwrap() {
            let result = runner.run(&challenge.starter_code, &limits()).await.unwrap();
            assert!(result.error_message.is_none(), "{}", challenge.title);
            assert!(!judge(&result, &challenge).is_correct, "{}", challenge.title);
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl ChallengeRepository for BrokenRepository {
        async fn get_challenge(&self, _id: i64) -> anyhow::Result<Option<Challenge>> {
            anyhow::bail!("connection refused")
        }
        async fn list_challenges(&self) -> anyhow::Result<Vec<Challenge>> {
            anyhow::bail!("connection refused")
        }
        async fn get_circuit(
            &self,
            _id: i64,
        ) -> anyhow::Result<Option<crate::challenges::LogicCircuit>> {
            anyhow::bail!("connection refused")
        }
        async fn list_circuits(&self) -> anyhow::Result<Vec<crate::challenges::LogicCircuit>> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_repository_failure_is_a_system_fault() {
        let runner = SandboxedRunner::new(1);
        let err = submit_run(&BrokenRepository, &runner, &limits(), &request(Some("1"), json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::System(_)));
        assert_eq!(err.status_code(), 500);
    }
}
