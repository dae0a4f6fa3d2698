use std::{process::ExitCode, sync::Arc};

use anyhow::Result;
use backend::{axum_http::http_serve, config::config_loader};
use crates::infra::db::postgres::postgres_connection;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    if let Err(err) = crates::observability::init_observability("backend") {
        eprintln!("backend: failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "backend: exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Arc::new(config_loader::load()?);
    info!(
        stage = ?config.stage,
        port = config.backend_server.port,
        "backend: configuration loaded"
    );

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &config.database.url,
    )?);
    info!("backend: postgres pool established");

    http_serve::start(config, db_pool).await
}
