use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::attendees::VoteToggle;

#[automock]
#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    async fn requests_made(&self, event_id: Uuid, attendee_id: Uuid) -> Result<i32>;
    /// Uses one request from the attendee's quota if any is left and returns the
    /// new count, or `None` once `limit` is reached.
    async fn try_consume_request(
        &self,
        event_id: Uuid,
        attendee_id: Uuid,
        limit: i32,
    ) -> Result<Option<i32>>;
    async fn release_request(&self, event_id: Uuid, attendee_id: Uuid) -> Result<()>;
    async fn toggle_vote(&self, song_request_id: Uuid, attendee_id: Uuid) -> Result<VoteToggle>;
    async fn voted_request_ids(&self, event_id: Uuid, attendee_id: Uuid) -> Result<Vec<Uuid>>;
}
