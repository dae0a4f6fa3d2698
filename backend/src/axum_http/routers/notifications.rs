use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad,
    repositories::notifications::NotificationPostgres,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppError,
    usecases::notifications::NotificationUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let notification_repository = NotificationPostgres::new(Arc::clone(&db_pool));
    let usecase = NotificationUseCase::new(Arc::new(notification_repository));

    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:id/read", patch(mark_read))
        .with_state(Arc::new(usecase))
}

pub async fn list(
    State(usecase): State<Arc<NotificationUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse {
    match usecase.list(user_id).await {
        Ok(dto) => Json(dto).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn mark_read(
    State(usecase): State<Arc<NotificationUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> impl IntoResponse {
    match usecase.mark_read(user_id, notification_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn mark_all_read(
    State(usecase): State<Arc<NotificationUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse {
    match usecase.mark_all_read(user_id).await {
        Ok(dto) => Json(dto).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
