//! HTTP routes for the game endpoints
//!
//! Callers are authenticated upstream; these handlers trust the request.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::challenges::ChallengeSummary;
use crate::circuit::{submit_circuit, CircuitRequest};
use crate::error::into_reply;
use crate::judger::{JudgeContext, RunRequest};

type ApiReply = (StatusCode, Json<Value>);

pub fn router(ctx: JudgeContext) -> Router {
    Router::new()
        .route("/api/test", get(health))
        .route("/api/games/debug-challenges", get(list_challenges))
        .route("/api/games/run", post(run_code))
        .route("/api/games/logic-circuits", get(list_circuits))
        .route("/api/games/validate-circuit", post(validate_circuit))
        .with_state(ctx)
}

fn reply((status, body): (u16, Value)) -> ApiReply {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body))
}

fn server_error(message: &str) -> ApiReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message })),
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "message": "API is working!" }))
}

async fn list_challenges(State(ctx): State<JudgeContext>) -> ApiReply {
    match ctx.repo.list_challenges().await {
        Ok(challenges) => {
            let challenges: Vec<ChallengeSummary> =
                challenges.iter().map(ChallengeSummary::from).collect();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "challenges": challenges })),
            )
        }
        Err(e) => {
            tracing::error!("Error fetching debug challenges: {:#}", e);
            server_error("Error loading challenges")
        }
    }
}

async fn run_code(State(ctx): State<JudgeContext>, Json(request): Json<RunRequest>) -> ApiReply {
    reply(into_reply(
        ctx.submit_run(&request).await,
        "Error executing code",
    ))
}

async fn list_circuits(State(ctx): State<JudgeContext>) -> ApiReply {
    match ctx.repo.list_circuits().await {
        Ok(circuits) => (
            StatusCode::OK,
            Json(json!({ "success": true, "circuits": circuits })),
        ),
        Err(e) => {
            tracing::error!("Error fetching logic circuits: {:#}", e);
            server_error("Error loading circuits")
        }
    }
}

async fn validate_circuit(
    State(ctx): State<JudgeContext>,
    Json(request): Json<CircuitRequest>,
) -> ApiReply {
    reply(into_reply(
        submit_circuit(ctx.repo.as_ref(), &request).await,
        "Error validating solution",
    ))
}
