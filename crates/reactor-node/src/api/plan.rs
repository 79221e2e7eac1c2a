//! Plan execution endpoint.

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, Json};
use reactor_plan::{ExecContext, Plan};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::state::AppState;

/// Request to execute a plan.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// The tree to execute.
    pub plan: Plan,

    /// Deadline for the whole execution.
    pub timeout_ms: Option<u64>,
}

/// Response after executing a plan.
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub execution_id: Uuid,
    pub plan: String,
    pub dispatches: usize,
    pub elapsed_ms: u64,
}

/// `POST {base}/plan`
pub async fn execute_plan(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, (StatusCode, String)> {
    req.plan
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut ctx = ExecContext::new();
    if let Some(timeout_ms) = req.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(timeout_ms));
    }

    let description = req.plan.describe();
    info!(execution_id = %ctx.execution_id(), plan = %description, "executing plan");

    let started = Instant::now();
    // Transport failures are swallowed during execution; only a malformed
    // plan can surface here.
    req.plan
        .execute(&ctx, &state.dispatcher)
        .await
        .map_err(|e| {
            error!(execution_id = %ctx.execution_id(), error = %e, "plan execution failed");
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    Ok(Json(ExecuteResponse {
        execution_id: ctx.execution_id(),
        plan: description,
        dispatches: req.plan.dispatch_count(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    }))
}
