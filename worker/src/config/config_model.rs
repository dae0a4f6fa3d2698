use backend::config::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub supabase: Supabase,
    pub expiry_sweep: ExpirySweep,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub service_role_key: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ExpirySweep {
    pub interval_secs: u64,
}
