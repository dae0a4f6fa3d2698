use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Paid or granted plans stored in `user_metadata.subscription_plan`.
/// The absence of a plan is the free tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Trial,
    Pro,
    Lifetime,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Trial => "trial",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Lifetime => "lifetime",
        }
    }

    /// Older clients wrote `"free"` or `"none"`; both mean no plan.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trial" => Some(SubscriptionPlan::Trial),
            "pro" => Some(SubscriptionPlan::Pro),
            "lifetime" => Some(SubscriptionPlan::Lifetime),
            _ => None,
        }
    }
}

impl Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
