use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, put},
};
use crates::{
    domain::value_objects::song_queue::{QueueOrderModel, UpdateSongStatusModel},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{events::EventPostgres, song_requests::SongRequestPostgres},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppError,
    usecases::song_queue::SongQueueUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let event_repository = EventPostgres::new(Arc::clone(&db_pool));
    let song_request_repository = SongRequestPostgres::new(Arc::clone(&db_pool));
    let usecase =
        SongQueueUseCase::new(Arc::new(event_repository), Arc::new(song_request_repository));

    Router::new()
        .route("/events/:id/queue", get(queue))
        .route("/events/:id/queue/order", put(reorder))
        .route(
            "/events/:id/requests/:request_id/status",
            patch(update_status),
        )
        .with_state(Arc::new(usecase))
}

pub async fn queue(
    State(usecase): State<Arc<SongQueueUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    match usecase.queue(user_id, event_id).await {
        Ok(view) => Json(view).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn update_status(
    State(usecase): State<Arc<SongQueueUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path((event_id, request_id)): Path<(Uuid, Uuid)>,
    Json(model): Json<UpdateSongStatusModel>,
) -> impl IntoResponse {
    info!(
        %user_id,
        %event_id,
        %request_id,
        status = model.status.as_str(),
        "song_queue: status change request received"
    );
    match usecase
        .update_status(user_id, event_id, request_id, model.status)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn reorder(
    State(usecase): State<Arc<SongQueueUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(model): Json<QueueOrderModel>,
) -> impl IntoResponse {
    match usecase
        .reorder(user_id, event_id, model.song_request_ids)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
