use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::song_requests::{InsertSongRequestEntity, SongRequestEntity},
    value_objects::{dashboard::TopRequest, enums::song_statuses::SongStatus},
};

#[automock]
#[async_trait]
pub trait SongRequestRepository: Send + Sync {
    /// Rows of one event ordered by creation time, oldest first.
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<SongRequestEntity>>;
    async fn find_by_id(&self, song_request_id: Uuid) -> Result<Option<SongRequestEntity>>;
    /// Exact, case-sensitive match on both fields.
    async fn find_by_title_artist(
        &self,
        event_id: Uuid,
        title: &str,
        artist: &str,
    ) -> Result<Option<SongRequestEntity>>;
    async fn insert(&self, song_request: InsertSongRequestEntity) -> Result<SongRequestEntity>;
    async fn increment_votes(&self, song_request_id: Uuid) -> Result<SongRequestEntity>;
    /// Sets the status on every row sharing the title and artist of
    /// `song_request_id` and clears their manual rank. Returns the number of rows changed.
    async fn update_status_for_group(
        &self,
        song_request_id: Uuid,
        status: SongStatus,
    ) -> Result<usize>;
    /// Clears every rank of the event, then applies `assignments`.
    async fn set_manual_ranks(&self, event_id: Uuid, assignments: Vec<(Uuid, i32)>) -> Result<()>;
    async fn top_requests(&self, limit: i64, dj_id: Option<Uuid>) -> Result<Vec<TopRequest>>;
}
