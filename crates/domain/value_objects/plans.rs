use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    enums::{billing_periods::BillingPeriod, subscription_plans::SubscriptionPlan},
    user_metadata::UserMetadata,
};

/// Active events a free-tier DJ may have at once.
pub const FREE_MAX_ACTIVE_EVENTS: i64 = 1;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Trial,
    Pro,
    Lifetime,
}

impl From<SubscriptionPlan> for PlanTier {
    fn from(plan: SubscriptionPlan) -> Self {
        match plan {
            SubscriptionPlan::Trial => PlanTier::Trial,
            SubscriptionPlan::Pro => PlanTier::Pro,
            SubscriptionPlan::Lifetime => PlanTier::Lifetime,
        }
    }
}

/// Limits attached to a tier.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PlanFeatures {
    /// `None` means unlimited.
    pub max_active_events: Option<i64>,
}

impl PlanFeatures {
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => Self {
                max_active_events: Some(FREE_MAX_ACTIVE_EVENTS),
            },
            PlanTier::Trial | PlanTier::Pro | PlanTier::Lifetime => Self {
                max_active_events: None,
            },
        }
    }
}

/// What a DJ's metadata means right now.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanState {
    pub plan: Option<SubscriptionPlan>,
    pub period: Option<BillingPeriod>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub cancelled: bool,
    pub trial_used: bool,
    pub tier: PlanTier,
    pub features: PlanFeatures,
}

impl PlanState {
    pub fn from_metadata(metadata: &UserMetadata, now: DateTime<Utc>) -> Self {
        let plan = metadata.subscription_plan;
        let expires_at = metadata.subscription_expires;

        let expired = match (plan, expires_at) {
            (Some(SubscriptionPlan::Lifetime), _) | (None, _) | (_, None) => false,
            (Some(_), Some(expires_at)) => expires_at < now,
        };

        let tier = match plan {
            Some(plan) if !expired => PlanTier::from(plan),
            _ => PlanTier::Free,
        };

        Self {
            plan,
            period: metadata.subscription_period,
            started_at: metadata.subscription_start,
            expires_at,
            expired,
            cancelled: metadata.is_cancelled(),
            trial_used: metadata.trial_used(),
            tier,
            features: PlanFeatures::for_tier(tier),
        }
    }

    pub fn free() -> Self {
        Self::from_metadata(&UserMetadata::default(), Utc::now())
    }

    pub fn can_create_event(&self, active_events: i64) -> bool {
        match self.features.max_active_events {
            Some(max) => active_events < max,
            None => true,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.tier != PlanTier::Free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_plan_is_free_tier() {
        let state = PlanState::from_metadata(&UserMetadata::default(), now());
        assert_eq!(state.tier, PlanTier::Free);
        assert!(!state.expired);
        assert!(state.can_create_event(0));
        assert!(!state.can_create_event(1));
    }

    #[test]
    fn past_expiry_downgrades_to_free_before_the_sweep_runs() {
        let metadata = UserMetadata {
            subscription_plan: Some(SubscriptionPlan::Pro),
            subscription_period: Some(BillingPeriod::Monthly),
            subscription_expires: Some(now() - Duration::minutes(1)),
            ..Default::default()
        };
        let state = PlanState::from_metadata(&metadata, now());
        assert!(state.expired);
        assert_eq!(state.tier, PlanTier::Free);
        assert_eq!(state.plan, Some(SubscriptionPlan::Pro));
    }

    #[test]
    fn future_expiry_keeps_tier() {
        let metadata = UserMetadata {
            subscription_plan: Some(SubscriptionPlan::Trial),
            subscription_expires: Some(now() + Duration::days(3)),
            trial_used: Some(true),
            ..Default::default()
        };
        let state = PlanState::from_metadata(&metadata, now());
        assert_eq!(state.tier, PlanTier::Trial);
        assert!(state.trial_used);
        assert!(state.can_create_event(5));
    }

    #[test]
    fn lifetime_never_expires() {
        let metadata = UserMetadata {
            subscription_plan: Some(SubscriptionPlan::Lifetime),
            subscription_period: Some(BillingPeriod::Unlimited),
            subscription_expires: Some(now() - Duration::days(400)),
            ..Default::default()
        };
        let state = PlanState::from_metadata(&metadata, now());
        assert!(!state.expired);
        assert_eq!(state.tier, PlanTier::Lifetime);
    }
}
