use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::events::{EventEntity, InsertEventEntity},
    value_objects::{dashboard::EventRequestCount, events::EventWithCount},
};

#[automock]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: InsertEventEntity) -> Result<EventEntity>;
    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<EventEntity>>;
    async fn list_by_dj(&self, dj_id: Uuid) -> Result<Vec<EventWithCount>>;
    async fn count_active_by_dj(&self, dj_id: Uuid) -> Result<i64>;
    async fn set_active(&self, event_id: Uuid, active: bool) -> Result<EventEntity>;
    async fn set_request_limit(&self, event_id: Uuid, request_limit: i32) -> Result<EventEntity>;
    async fn request_counts_by_dj(&self, dj_id: Uuid) -> Result<Vec<EventRequestCount>>;
}
