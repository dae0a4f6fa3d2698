use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::AUTHORIZATION,
    },
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use crates::{
    domain::{
        repositories::{dj_users::DjUserRepository, notifications::NotificationRepository},
        value_objects::checkout::{
            CancelSubscriptionModel, CheckUserExistsModel, CreateCheckoutModel, RedeemCodeModel,
            StartTrialModel, UserExistsDto,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::notifications::NotificationPostgres,
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::{
        billing::{BillingSettings, BillingUseCase},
        expiry_sweep::ExpirySweepUseCase,
        plan_cache::PlanCache,
    },
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Clone)]
pub struct RouteState {
    pub config: Arc<DotEnvyConfig>,
    pub billing: Arc<BillingUseCase>,
    pub sweep: Arc<ExpirySweepUseCase>,
}

pub fn billing_settings(config: &DotEnvyConfig) -> BillingSettings {
    BillingSettings {
        monthly_price_cents: config.stripe.monthly_price_cents,
        yearly_price_cents: config.stripe.yearly_price_cents,
        currency: config.stripe.currency.clone(),
        trial_days: config.stripe.trial_days,
        redeem_code_digests: config.redeem.code_digests.clone(),
    }
}

/// Mounted at the service root, next to the versioned API.
pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    users: Arc<dyn DjUserRepository + Send + Sync>,
    plan_cache: Arc<PlanCache>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let stripe = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
    );
    let notifications: Arc<dyn NotificationRepository + Send + Sync> =
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool)));

    let billing = BillingUseCase::new(
        Arc::new(stripe),
        Arc::clone(&users),
        Arc::clone(&notifications),
        Arc::clone(&plan_cache),
        billing_settings(&config),
    );
    let sweep = ExpirySweepUseCase::new(users, notifications).with_plan_cache(plan_cache);

    let state = RouteState {
        config,
        billing: Arc::new(billing),
        sweep: Arc::new(sweep),
    };

    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/webhook", post(webhook))
        .route("/downgrade-expired", post(downgrade_expired))
        .route("/check-user-exists", post(check_user_exists))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/start-trial", post(start_trial))
        .route("/redeem-code", post(redeem_code))
        .with_state(state)
}

pub async fn create_checkout_session(
    State(state): State<RouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CreateCheckoutModel>,
) -> impl IntoResponse {
    info!(%user_id, plan = %model.plan, period = %model.period, "billing: checkout requested");
    match state.billing.create_checkout_session(user_id, model).await {
        Ok(session) => Json(session).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Stripe needs the raw body to verify the signature.
pub async fn webhook(
    State(state): State<RouteState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.billing.handle_webhook(&body, signature).await {
        Ok(()) => Json(json!({ "received": true })).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn downgrade_expired(
    State(state): State<RouteState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = state.config.internal.task_token.as_deref() {
        if let Err(status) = authorize_bearer(&headers, token) {
            warn!("billing: downgrade-expired called without a valid task token");
            return (status, "Unauthorized").into_response();
        }
    }

    match state.sweep.run(Utc::now()).await {
        Ok(report) => {
            info!(
                scanned = report.scanned,
                downgraded = report.downgraded,
                failed = report.failed,
                "billing: downgrade-expired finished"
            );
            (StatusCode::OK, "Downgrade completed").into_response()
        }
        Err(err) => {
            error!(error = ?err, "billing: downgrade-expired failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

pub async fn check_user_exists(
    State(state): State<RouteState>,
    Json(model): Json<CheckUserExistsModel>,
) -> impl IntoResponse {
    match state.billing.check_user_exists(&model.email).await {
        Ok(user_exists) => Json(UserExistsDto { user_exists }).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn cancel_subscription(
    State(state): State<RouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CancelSubscriptionModel>,
) -> impl IntoResponse {
    info!(%user_id, "billing: cancellation requested");
    match state
        .billing
        .cancel_subscription(user_id, model.user_id)
        .await
    {
        Ok(dto) => Json(dto).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn start_trial(
    State(state): State<RouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<StartTrialModel>,
) -> impl IntoResponse {
    info!(%user_id, "billing: trial requested");
    match state.billing.start_trial(user_id, model).await {
        Ok(session) => Json(session).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn redeem_code(
    State(state): State<RouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<RedeemCodeModel>,
) -> impl IntoResponse {
    match state.billing.redeem_code(user_id, &model.code).await {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
