use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub stripe: Stripe,
    pub attendee: Attendee,
    pub plan_cache: PlanCacheConfig,
    pub redeem: Redeem,
    pub internal: Internal,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub service_role_key: String,
    pub jwt_secret: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub monthly_price_cents: i64,
    pub yearly_price_cents: i64,
    pub currency: String,
    pub trial_days: i64,
}

#[derive(Debug, Clone)]
pub struct Attendee {
    pub default_request_limit: i32,
}

#[derive(Debug, Clone)]
pub struct PlanCacheConfig {
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone)]
pub struct Redeem {
    /// Lowercase hex SHA-256 digests of accepted lifetime codes.
    pub code_digests: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Internal {
    /// Bearer token guarding `/downgrade-expired`. Unset leaves the route open.
    pub task_token: Option<String>,
}
