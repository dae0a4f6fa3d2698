use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::enums::{billing_periods::BillingPeriod, subscription_plans::SubscriptionPlan};

/// Free-form metadata Supabase keeps on each DJ account. Every field is optional
/// and decoded leniently: values written by older clients in an unexpected shape
/// read as absent instead of failing the whole user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub dj_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: Option<Value>,
    #[serde(default, deserialize_with = "lenient_plan")]
    pub subscription_plan: Option<SubscriptionPlan>,
    #[serde(default, deserialize_with = "lenient_period")]
    pub subscription_period: Option<BillingPeriod>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub subscription_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub subscription_expires: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subscription_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub trial_used: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub subscription_cancelled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plan_source: Option<String>,
}

impl UserMetadata {
    pub fn trial_used(&self) -> bool {
        self.trial_used.unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.subscription_cancelled.unwrap_or(false)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_plan<'de, D>(deserializer: D) -> Result<Option<SubscriptionPlan>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.and_then(|s| SubscriptionPlan::parse(&s)))
}

fn lenient_period<'de, D>(deserializer: D) -> Result<Option<BillingPeriod>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.and_then(|s| BillingPeriod::parse(&s)))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Partial update for `user_metadata`. Supabase merges the keys into the stored
/// object and removes keys whose value is `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataPatch(Map<String, Value>);

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn clear(mut self, key: &str) -> Self {
        self.0.insert(key.to_string(), Value::Null);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn activate_plan(
        plan: SubscriptionPlan,
        period: BillingPeriod,
        start: DateTime<Utc>,
        expires: Option<DateTime<Utc>>,
        subscription_id: Option<String>,
    ) -> Self {
        let patch = Self::new()
            .set("subscription_plan", plan.as_str())
            .set("subscription_period", period.as_str())
            .set("subscription_start", start.to_rfc3339())
            .clear("subscription_cancelled");

        let patch = match expires {
            Some(expires) => patch.set("subscription_expires", expires.to_rfc3339()),
            None => patch.clear("subscription_expires"),
        };

        match subscription_id {
            Some(id) => patch.set("subscription_id", id),
            None => patch.clear("subscription_id"),
        }
    }

    /// Drops every plan field so the account falls back to the free tier.
    /// `trial_used` survives so a trial can only be taken once.
    pub fn clear_subscription() -> Self {
        Self::lapse_plan().clear("subscription_id")
    }

    /// Falls back to the free tier but keeps `subscription_id`, so a Stripe
    /// subscription that is still billing can be renewed or cancelled later.
    pub fn lapse_plan() -> Self {
        Self::new()
            .clear("subscription_plan")
            .clear("subscription_period")
            .clear("subscription_start")
            .clear("subscription_expires")
            .clear("subscription_cancelled")
    }

    /// A paid renewal. `subscription_start` is left alone.
    pub fn renew_plan(
        period: BillingPeriod,
        expires: DateTime<Utc>,
        subscription_id: &str,
    ) -> Self {
        Self::new()
            .set("subscription_plan", SubscriptionPlan::Pro.as_str())
            .set("subscription_period", period.as_str())
            .set("subscription_expires", expires.to_rfc3339())
            .set("subscription_id", subscription_id)
    }

    pub fn mark_cancelled() -> Self {
        Self::new().set("subscription_cancelled", true)
    }

    /// Applies the patch the same way Supabase does and returns the result.
    pub fn merged_into(&self, base: &UserMetadata) -> UserMetadata {
        let mut object = match serde_json::to_value(base) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        for (key, value) in &self.0 {
            if value.is_null() {
                object.remove(key);
            } else {
                object.insert(key.clone(), value.clone());
            }
        }

        serde_json::from_value(Value::Object(object)).unwrap_or_else(|_| base.clone())
    }
}
