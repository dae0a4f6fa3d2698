use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{billing_periods::BillingPeriod, subscription_plans::SubscriptionPlan};

pub const META_USER_ID: &str = "userId";
pub const META_PLAN: &str = "plan";
pub const META_PERIOD: &str = "period";
pub const META_EMAIL: &str = "email";
pub const META_NAME: &str = "name";
pub const META_TRIAL: &str = "trial";

/// What the service stores on a Stripe Checkout Session so the webhook can
/// apply the purchase without any local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub period: BillingPeriod,
    pub email: Option<String>,
    pub name: Option<String>,
    pub trial: bool,
}

impl CheckoutMetadata {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            (META_USER_ID.to_string(), self.user_id.to_string()),
            (META_PLAN.to_string(), self.plan.as_str().to_string()),
            (META_PERIOD.to_string(), self.period.as_str().to_string()),
            (META_TRIAL.to_string(), self.trial.to_string()),
        ];
        if let Some(email) = &self.email {
            pairs.push((META_EMAIL.to_string(), email.clone()));
        }
        if let Some(name) = &self.name {
            pairs.push((META_NAME.to_string(), name.clone()));
        }
        pairs
    }

    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, String> {
        let user_id = map
            .get(META_USER_ID)
            .ok_or_else(|| format!("missing {META_USER_ID}"))?;
        let user_id =
            Uuid::parse_str(user_id).map_err(|_| format!("invalid {META_USER_ID}: {user_id}"))?;

        let plan = map
            .get(META_PLAN)
            .and_then(|p| SubscriptionPlan::parse(p))
            .ok_or_else(|| format!("missing or unknown {META_PLAN}"))?;
        let period = map
            .get(META_PERIOD)
            .and_then(|p| BillingPeriod::parse(p))
            .ok_or_else(|| format!("missing or unknown {META_PERIOD}"))?;

        Ok(Self {
            user_id,
            plan,
            period,
            email: map.get(META_EMAIL).cloned(),
            name: map.get(META_NAME).cloned(),
            trial: map.get(META_TRIAL).is_some_and(|t| t == "true"),
        })
    }
}

/// Body of `POST /create-checkout-session`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutModel {
    pub plan: String,
    pub period: String,
    #[serde(default)]
    pub email: Option<String>,
    pub user_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTrialModel {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionModel {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckUserExistsModel {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedeemCodeModel {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckoutSessionDto {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CancelSubscriptionDto {
    pub success: bool,
    pub canceled: bool,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserExistsDto {
    pub user_exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_metadata_without_user() {
        let mut map = HashMap::new();
        map.insert(META_PLAN.to_string(), "pro".to_string());
        map.insert(META_PERIOD.to_string(), "monthly".to_string());
        assert!(CheckoutMetadata::from_map(&map).is_err());
    }

    #[test]
    fn reads_pairs_back() {
        let metadata = CheckoutMetadata {
            user_id: Uuid::new_v4(),
            plan: SubscriptionPlan::Trial,
            period: BillingPeriod::Weekly,
            email: Some("dj@example.com".into()),
            name: None,
            trial: true,
        };
        let map: HashMap<_, _> = metadata.to_pairs().into_iter().collect();
        assert_eq!(CheckoutMetadata::from_map(&map), Ok(metadata));
    }
}
