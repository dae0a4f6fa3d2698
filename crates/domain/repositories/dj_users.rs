use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::dj_users::DjUserEntity, value_objects::user_metadata::MetadataPatch,
};

/// DJ accounts live in the hosted auth service; this is the admin view of them.
#[automock]
#[async_trait]
pub trait DjUserRepository: Send + Sync {
    /// Every account, across all pages.
    async fn list_all_users(&self) -> Result<Vec<DjUserEntity>>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<DjUserEntity>>;
    /// Case-insensitive match on the account email.
    async fn find_by_email(&self, email: &str) -> Result<Option<DjUserEntity>>;
    async fn update_metadata(&self, user_id: Uuid, patch: MetadataPatch) -> Result<DjUserEntity>;
}
