use std::{sync::Arc, time::Duration};

use anyhow::Result;
use backend::usecases::expiry_sweep::ExpirySweepUseCase;
use crates::{
    domain::repositories::{dj_users::DjUserRepository, notifications::NotificationRepository},
    infra::{
        db::{postgres::postgres_connection, repositories::notifications::NotificationPostgres},
        supabase::auth_admin::{DEFAULT_PAGE_SIZE, SupabaseAuthAdmin, SupabaseAuthConfig},
    },
};
use tracing::{error, info};
use worker::{
    axum_http, config,
    services::expiry_sweep_loop::{self, SharedSweepStatus},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(stage = ?dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");
    let db_pool_arc = Arc::new(postgres_pool);

    let supa = &dotenvy_env.supabase;
    let users: Arc<dyn DjUserRepository + Send + Sync> =
        Arc::new(SupabaseAuthAdmin::new(SupabaseAuthConfig {
            project_url: supa.project_url.clone(),
            service_role_key: supa.service_role_key.clone(),
            timeout_secs: supa.http_timeout_secs,
            page_size: DEFAULT_PAGE_SIZE,
        })?);
    let notifications: Arc<dyn NotificationRepository + Send + Sync> =
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool_arc)));

    let sweep_usecase = Arc::new(ExpirySweepUseCase::new(users, notifications));
    let sweep_status = SharedSweepStatus::default();
    let sweep_loop = tokio::spawn(expiry_sweep_loop::run_expiry_sweep_loop(
        sweep_usecase,
        Arc::clone(&sweep_status),
        Duration::from_secs(dotenvy_env.expiry_sweep.interval_secs),
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let health_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, sweep_status).await
    });

    tokio::select! {
        result = sweep_loop => result??,
        result = health_server => result??,
    };
    Ok(())
}
