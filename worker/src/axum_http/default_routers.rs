use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::info;

use crate::services::expiry_sweep_loop::{SharedSweepStatus, SweepStatus};

#[derive(Debug, Serialize)]
pub struct WorkerHealth {
    pub status: &'static str,
    pub expiry_sweep: SweepStatus,
}

pub async fn not_found() -> impl IntoResponse {
    info!("worker: unknown route requested");
    (StatusCode::NOT_FOUND, "NOT_FOUND").into_response()
}

/// Always 200 while the process is up; sweep failures show in the body.
pub async fn health_check(State(status): State<SharedSweepStatus>) -> impl IntoResponse {
    let expiry_sweep = status.read().await.clone();
    Json(WorkerHealth {
        status: "OK",
        expiry_sweep,
    })
    .into_response()
}
