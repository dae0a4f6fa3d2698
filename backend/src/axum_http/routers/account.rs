use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use crates::domain::{
    repositories::dj_users::DjUserRepository, value_objects::profiles::UpdateProfileModel,
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{plan_cache::PlanCache, profile::AccountUseCase},
};

pub fn routes(
    users: Arc<dyn DjUserRepository + Send + Sync>,
    plan_cache: Arc<PlanCache>,
) -> Router {
    let usecase = AccountUseCase::new(users, plan_cache);

    Router::new()
        .route("/plan", get(plan))
        .route("/profile", put(update_profile))
        .with_state(Arc::new(usecase))
}

pub async fn plan(
    State(usecase): State<Arc<AccountUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse {
    match usecase.plan(user_id).await {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn update_profile(
    State(usecase): State<Arc<AccountUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<UpdateProfileModel>,
) -> impl IntoResponse {
    info!(%user_id, "account: profile update received");
    match usecase.update_profile(user_id, model).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
