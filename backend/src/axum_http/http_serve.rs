use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    domain::repositories::dj_users::DjUserRepository,
    infra::{
        db::postgres::postgres_connection::PgPoolSquad,
        supabase::auth_admin::{DEFAULT_PAGE_SIZE, SupabaseAuthAdmin, SupabaseAuthConfig},
    },
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    auth::{ATTENDEE_ID_HEADER, SupabaseJwtSecret},
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::plan_cache::PlanCache,
};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let users: Arc<dyn DjUserRepository + Send + Sync> =
        Arc::new(SupabaseAuthAdmin::new(SupabaseAuthConfig {
            project_url: config.supabase.project_url.clone(),
            service_role_key: config.supabase.service_role_key.clone(),
            timeout_secs: config.supabase.http_timeout_secs,
            page_size: DEFAULT_PAGE_SIZE,
        })?);
    let plan_cache = Arc::new(PlanCache::new(
        Arc::clone(&users),
        Duration::from_secs(config.plan_cache.ttl_secs),
        config.plan_cache.max_capacity,
    ));

    let api = Router::new()
        .merge(routers::events::routes(
            Arc::clone(&db_pool),
            Arc::clone(&plan_cache),
            Arc::clone(&config),
        ))
        .merge(routers::song_queue::routes(Arc::clone(&db_pool)))
        .merge(routers::attendee::routes(
            Arc::clone(&db_pool),
            Arc::clone(&users),
        ))
        .merge(routers::notifications::routes(Arc::clone(&db_pool)))
        .merge(routers::account::routes(
            Arc::clone(&users),
            Arc::clone(&plan_cache),
        ))
        .route("/health-check", get(default_routers::health_check))
        .route(
            "/health-check/db",
            get(default_routers::db_health_check).with_state(Arc::clone(&db_pool)),
        );

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1", api)
        .merge(routers::billing::routes(
            Arc::clone(&db_pool),
            users,
            plan_cache,
            Arc::clone(&config),
        ))
        .layer(Extension(SupabaseJwtSecret::new(&config.supabase.jwt_secret)))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([
                    AUTHORIZATION,
                    CONTENT_TYPE,
                    HeaderName::from_static(ATTENDEE_ID_HEADER),
                ])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(stage = ?config.stage, "Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to listen for ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
