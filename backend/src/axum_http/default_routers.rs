use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use crates::infra::db::postgres::postgres_connection::{self, PgPoolSquad};
use tracing::{error, info};

pub async fn not_found() -> impl IntoResponse {
    info!("Not found route accessed");
    (StatusCode::NOT_FOUND, "NOT_FOUND").into_response()
}

pub async fn health_check() -> impl IntoResponse {
    info!("Health check route accessed");
    (StatusCode::OK, "OK").into_response()
}

/// Runs `SELECT 1` on a pooled connection.
pub async fn db_health_check(State(db_pool): State<Arc<PgPoolSquad>>) -> impl IntoResponse {
    let outcome = tokio::task::spawn_blocking(move || postgres_connection::ping(&db_pool)).await;

    match outcome {
        Ok(Ok(())) => (StatusCode::OK, "OK").into_response(),
        Ok(Err(err)) => {
            error!(db_error = ?err, "health: database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_UNAVAILABLE").into_response()
        }
        Err(err) => {
            error!(error = ?err, "health: database ping panicked");
            (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_UNAVAILABLE").into_response()
        }
    }
}
