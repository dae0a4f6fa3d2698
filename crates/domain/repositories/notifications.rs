use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::notifications::{InsertNotificationEntity, NotificationEntity};

#[automock]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: InsertNotificationEntity) -> Result<Uuid>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<NotificationEntity>>;
    /// Returns false when the notification does not exist or belongs to someone else.
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize>;
}
