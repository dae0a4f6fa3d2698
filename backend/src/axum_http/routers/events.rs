use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use crates::{
    domain::value_objects::events::{CreateEventModel, EventSettingsModel, SetEventActiveModel},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{events::EventPostgres, song_requests::SongRequestPostgres},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::{events::EventUseCase, plan_cache::PlanCache},
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    plan_cache: Arc<PlanCache>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let event_repository = EventPostgres::new(Arc::clone(&db_pool));
    let song_request_repository = SongRequestPostgres::new(Arc::clone(&db_pool));
    let usecase = EventUseCase::new(
        Arc::new(event_repository),
        Arc::new(song_request_repository),
        plan_cache,
        config.attendee.default_request_limit,
    );

    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id/active", patch(set_active))
        .route("/events/:id/settings", patch(update_settings))
        .route("/dashboard", get(dashboard))
        .with_state(Arc::new(usecase))
}

pub async fn create_event(
    State(usecase): State<Arc<EventUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CreateEventModel>,
) -> impl IntoResponse {
    info!(%user_id, "events: create request received");
    match usecase.create_event(user_id, model).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn list_events(
    State(usecase): State<Arc<EventUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse {
    match usecase.list_events(user_id).await {
        Ok(events) => Json(events).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn set_active(
    State(usecase): State<Arc<EventUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(model): Json<SetEventActiveModel>,
) -> impl IntoResponse {
    info!(%user_id, %event_id, active = model.active, "events: toggle request received");
    match usecase.set_active(user_id, event_id, model.active).await {
        Ok(event) => Json(event).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn update_settings(
    State(usecase): State<Arc<EventUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(model): Json<EventSettingsModel>,
) -> impl IntoResponse {
    match usecase
        .update_settings(user_id, event_id, model.request_limit)
        .await
    {
        Ok(event) => Json(event).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn dashboard(
    State(usecase): State<Arc<EventUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse {
    match usecase.dashboard(user_id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
