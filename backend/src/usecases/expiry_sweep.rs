use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::dj_users::DjUserEntity,
    repositories::{dj_users::DjUserRepository, notifications::NotificationRepository},
    value_objects::{
        enums::subscription_plans::SubscriptionPlan, notifications::SystemNotification,
        user_metadata::MetadataPatch,
    },
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::plan_cache::PlanCache;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub downgraded: usize,
    pub failed: usize,
}

/// Lifetime plans and plans without an expiry never lapse.
pub fn is_lapsed(user: &DjUserEntity, now: DateTime<Utc>) -> bool {
    let metadata = &user.user_metadata;
    match (metadata.subscription_plan, metadata.subscription_expires) {
        (Some(SubscriptionPlan::Lifetime), _) | (None, _) | (_, None) => false,
        (Some(_), Some(expires)) => expires < now,
    }
}

/// Walks every DJ account and moves lapsed plans back to the free tier.
/// Renewals come in through the Stripe webhook and push the expiry forward.
pub struct ExpirySweepUseCase {
    users: Arc<dyn DjUserRepository + Send + Sync>,
    notifications: Arc<dyn NotificationRepository + Send + Sync>,
    plan_cache: Option<Arc<PlanCache>>,
}

impl ExpirySweepUseCase {
    pub fn new(
        users: Arc<dyn DjUserRepository + Send + Sync>,
        notifications: Arc<dyn NotificationRepository + Send + Sync>,
    ) -> Self {
        Self {
            users,
            notifications,
            plan_cache: None,
        }
    }

    /// Evicts downgraded users from an in-process plan cache.
    pub fn with_plan_cache(mut self, plan_cache: Arc<PlanCache>) -> Self {
        self.plan_cache = Some(plan_cache);
        self
    }

    /// Fails only when the user list itself cannot be read; per-user failures
    /// are counted in the report and the sweep moves on.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let users = self.users.list_all_users().await.inspect_err(|err| {
            error!(baas_error = ?err, "expiry_sweep: failed to list users");
        })?;

        let mut report = SweepReport {
            scanned: users.len(),
            ..Default::default()
        };

        for user in users.iter().filter(|user| is_lapsed(user, now)) {
            let user_id = user.id;
            let plan = user.user_metadata.subscription_plan;

            // A subscription that was never cancelled may still renew.
            let metadata = &user.user_metadata;
            let patch = if metadata.subscription_id.is_some() && !metadata.is_cancelled() {
                MetadataPatch::lapse_plan()
            } else {
                MetadataPatch::clear_subscription()
            };

            if let Err(err) = self.users.update_metadata(user_id, patch).await
            {
                error!(%user_id, baas_error = ?err, "expiry_sweep: failed to clear plan");
                report.failed += 1;
                continue;
            }
            report.downgraded += 1;

            if let Some(cache) = &self.plan_cache {
                cache.invalidate(user_id).await;
            }

            let notice = SystemNotification::SubscriptionExpired.to_insert(user_id, now);
            if let Err(err) = self.notifications.create(notice).await {
                warn!(%user_id, db_error = ?err, "expiry_sweep: plan cleared but notification failed");
            }

            info!(%user_id, plan = ?plan, "expiry_sweep: plan downgraded");
        }

        info!(
            scanned = report.scanned,
            downgraded = report.downgraded,
            failed = report.failed,
            "expiry_sweep: run finished"
        );
        Ok(report)
    }
}
