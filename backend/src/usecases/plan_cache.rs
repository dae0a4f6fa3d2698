use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::dj_users::DjUserEntity,
    repositories::dj_users::DjUserRepository,
    value_objects::{plans::PlanState, user_metadata::UserMetadata},
};
use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

/// DJ plan metadata read from Supabase and kept for a short TTL. The plan is
/// resolved against the clock on every read, so an expiry passing while an
/// entry is cached takes effect at once.
/// Every write to plan metadata must call [`PlanCache::invalidate`] or
/// [`PlanCache::prime`].
pub struct PlanCache {
    users: Arc<dyn DjUserRepository + Send + Sync>,
    entries: Cache<Uuid, UserMetadata>,
}

impl PlanCache {
    pub fn new(
        users: Arc<dyn DjUserRepository + Send + Sync>,
        ttl: Duration,
        max_capacity: u64,
    ) -> Self {
        let entries = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { users, entries }
    }

    pub async fn plan_state(&self, user_id: Uuid) -> Result<PlanState> {
        self.plan_state_at(user_id, Utc::now()).await
    }

    /// Unknown users resolve to the free tier and are not cached.
    pub async fn plan_state_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<PlanState> {
        if let Some(metadata) = self.entries.get(&user_id).await {
            debug!(%user_id, "plan_cache: hit");
            return Ok(PlanState::from_metadata(&metadata, now));
        }

        debug!(%user_id, "plan_cache: miss, loading metadata");
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(PlanState::free());
        };

        self.entries
            .insert(user.id, user.user_metadata.clone())
            .await;
        Ok(PlanState::from_metadata(&user.user_metadata, now))
    }

    /// Stores a freshly written user record and returns its current plan.
    pub async fn prime(&self, user: &DjUserEntity) -> PlanState {
        self.entries
            .insert(user.id, user.user_metadata.clone())
            .await;
        PlanState::from_metadata(&user.user_metadata, Utc::now())
    }

    pub async fn invalidate(&self, user_id: Uuid) {
        self.entries.invalidate(&user_id).await;
    }
}
