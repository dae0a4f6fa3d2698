use std::{env, str::FromStr};

use anyhow::{Context, Result};

use super::{
    config_model::{
        Attendee, BackendServer, Database, DotEnvyConfig, Internal, PlanCacheConfig, Redeem,
        Stripe, Supabase,
    },
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required_parse("SERVER_PORT_BACKEND")?,
        body_limit: required_parse("SERVER_BODY_LIMIT")?,
        timeout: required_parse("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let supabase = Supabase {
        project_url: required("SUPABASE_PROJECT_URL")?,
        service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
        http_timeout_secs: optional_parse("SUPABASE_HTTP_TIMEOUT_SECS", 15)?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        success_url: required("STRIPE_SUCCESS_URL")?,
        cancel_url: required("STRIPE_CANCEL_URL")?,
        monthly_price_cents: optional_parse("STRIPE_MONTHLY_PRICE_CENTS", 999)?,
        yearly_price_cents: optional_parse("STRIPE_YEARLY_PRICE_CENTS", 9999)?,
        currency: optional("STRIPE_CURRENCY").unwrap_or_else(|| "usd".to_string()),
        trial_days: optional_parse("TRIAL_DAYS", 7)?,
    };

    let attendee = Attendee {
        default_request_limit: optional_parse("ATTENDEE_REQUEST_LIMIT", 3)?,
    };

    let plan_cache = PlanCacheConfig {
        ttl_secs: optional_parse("PLAN_CACHE_TTL_SECS", 60)?,
        max_capacity: optional_parse("PLAN_CACHE_MAX_CAPACITY", 10_000)?,
    };

    let redeem = Redeem {
        code_digests: optional("REDEEM_CODE_SHA256")
            .map(|raw| {
                raw.split(',')
                    .map(|digest| digest.trim().to_ascii_lowercase())
                    .filter(|digest| !digest.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let internal = Internal {
        task_token: optional("INTERNAL_TASK_TOKEN"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        stripe,
        attendee,
        plan_cache,
        redeem,
        internal,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = env::var("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

pub fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} is invalid"))
}

pub fn optional(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|v| {
        let trimmed = v.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

pub fn required_parse<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

pub fn optional_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
