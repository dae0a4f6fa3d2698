use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::dj_users::DjUserRepository,
        value_objects::song_submissions::SubmitSongModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            attendees::AttendeePostgres, events::EventPostgres, song_requests::SongRequestPostgres,
        },
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AttendeeId, axum_http::error_responses::AppError,
    usecases::attendee_requests::AttendeeUseCase,
};

/// Public pages are unauthenticated; attendees are told apart by `X-Attendee-Id`.
pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    users: Arc<dyn DjUserRepository + Send + Sync>,
) -> Router {
    let usecase = AttendeeUseCase::new(
        Arc::new(EventPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SongRequestPostgres::new(Arc::clone(&db_pool))),
        Arc::new(AttendeePostgres::new(Arc::clone(&db_pool))),
        users,
    );

    Router::new()
        .route("/public/events/:id", get(event_page))
        .route(
            "/public/events/:id/requests",
            get(list_requests).post(submit_request),
        )
        .route(
            "/public/events/:id/requests/:request_id/vote",
            post(toggle_vote),
        )
        .with_state(Arc::new(usecase))
}

pub async fn event_page(
    State(usecase): State<Arc<AttendeeUseCase>>,
    Path(event_id): Path<Uuid>,
    attendee: Option<AttendeeId>,
) -> impl IntoResponse {
    match usecase.event_page(event_id, attendee.map(|a| a.0)).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn list_requests(
    State(usecase): State<Arc<AttendeeUseCase>>,
    Path(event_id): Path<Uuid>,
    attendee: Option<AttendeeId>,
) -> impl IntoResponse {
    match usecase.list_requests(event_id, attendee.map(|a| a.0)).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn submit_request(
    State(usecase): State<Arc<AttendeeUseCase>>,
    Path(event_id): Path<Uuid>,
    AttendeeId(attendee_id): AttendeeId,
    Json(model): Json<SubmitSongModel>,
) -> impl IntoResponse {
    info!(%event_id, %attendee_id, "attendee: song request received");
    match usecase.submit(event_id, attendee_id, model).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn toggle_vote(
    State(usecase): State<Arc<AttendeeUseCase>>,
    Path((event_id, request_id)): Path<(Uuid, Uuid)>,
    AttendeeId(attendee_id): AttendeeId,
) -> impl IntoResponse {
    match usecase.toggle_vote(event_id, request_id, attendee_id).await {
        Ok(toggle) => Json(toggle).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
