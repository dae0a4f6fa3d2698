use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    repositories::dj_users::DjUserRepository,
    value_objects::{
        plans::PlanState,
        profiles::{DjProfile, ProfileError, UpdateProfileModel},
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::plan_cache::PlanCache;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    InvalidProfile(#[from] ProfileError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::InvalidProfile(_) => StatusCode::BAD_REQUEST,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccountError::InvalidProfile(_) => "INVALID_PROFILE",
            AccountError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDto {
    #[serde(flatten)]
    pub profile: DjProfile,
    pub plan: PlanState,
}

/// The signed-in DJ's own account: plan lookup and profile edits.
pub struct AccountUseCase {
    users: Arc<dyn DjUserRepository + Send + Sync>,
    plan_cache: Arc<PlanCache>,
}

impl AccountUseCase {
    pub fn new(users: Arc<dyn DjUserRepository + Send + Sync>, plan_cache: Arc<PlanCache>) -> Self {
        Self { users, plan_cache }
    }

    pub async fn plan(&self, user_id: Uuid) -> Result<PlanState, AccountError> {
        self.plan_cache.plan_state(user_id).await.map_err(|err| {
            error!(%user_id, baas_error = ?err, "account: failed to resolve plan");
            AccountError::Internal(err)
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        model: UpdateProfileModel,
    ) -> Result<ProfileDto, AccountError> {
        let patch = model.to_patch().inspect_err(|err| {
            warn!(%user_id, reason = %err, status = 400, "account: rejected profile update");
        })?;

        let user = self
            .users
            .update_metadata(user_id, patch)
            .await
            .map_err(|err| {
                error!(%user_id, baas_error = ?err, "account: failed to write profile");
                AccountError::Internal(err)
            })?;

        let plan = self.plan_cache.prime(&user).await;
        info!(%user_id, "account: profile updated");
        Ok(ProfileDto {
            profile: DjProfile::from(&user.user_metadata),
            plan,
        })
    }
}
