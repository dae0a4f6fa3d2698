use anyhow::{Result, bail};
use backend::config::config_loader::{get_stage, optional_parse, required, required_parse};

use super::config_model::{Database, DotEnvyConfig, ExpirySweep, Supabase, WorkerServer};

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: required_parse("SERVER_PORT_WORKER")?,
        body_limit: optional_parse("SERVER_BODY_LIMIT", 1)?,
        timeout: optional_parse("SERVER_TIMEOUT", 30)?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let supabase = Supabase {
        project_url: required("SUPABASE_PROJECT_URL")?,
        service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
        http_timeout_secs: optional_parse("SUPABASE_HTTP_TIMEOUT_SECS", 15)?,
    };

    let interval_secs = optional_parse("EXPIRY_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
    if interval_secs == 0 {
        bail!("EXPIRY_SWEEP_INTERVAL_SECS must be greater than zero");
    }

    Ok(DotEnvyConfig {
        worker_server,
        database,
        supabase,
        expiry_sweep: ExpirySweep { interval_secs },
        stage: get_stage(),
    })
}
