use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::song_requests::SongRequestEntity,
    repositories::{events::EventRepository, song_requests::SongRequestRepository},
    value_objects::{
        enums::song_statuses::SongStatus,
        song_queue::{QueueOrderError, QueueView, build_queue_view, plan_manual_order},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SongRequestError {
    #[error("event not found")]
    EventNotFound,
    #[error("song request not found")]
    SongRequestNotFound,
    #[error(transparent)]
    InvalidOrder(#[from] QueueOrderError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SongRequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SongRequestError::EventNotFound | SongRequestError::SongRequestNotFound => {
                StatusCode::NOT_FOUND
            }
            SongRequestError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            SongRequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SongRequestError::EventNotFound => "EVENT_NOT_FOUND",
            SongRequestError::SongRequestNotFound => "SONG_REQUEST_NOT_FOUND",
            SongRequestError::InvalidOrder(_) => "INVALID_QUEUE_ORDER",
            SongRequestError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SongRequestError>;

/// The DJ's side of an event: the grouped queue and what can be done to it.
pub struct SongQueueUseCase {
    events: Arc<dyn EventRepository + Send + Sync>,
    song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
}

impl SongQueueUseCase {
    pub fn new(
        events: Arc<dyn EventRepository + Send + Sync>,
        song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
    ) -> Self {
        Self {
            events,
            song_requests,
        }
    }

    async fn ensure_owner(&self, dj_id: Uuid, event_id: Uuid) -> UseCaseResult<()> {
        let event = self.events.find_by_id(event_id).await.map_err(|err| {
            error!(%event_id, db_error = ?err, "song_queue: failed to load event");
            SongRequestError::Internal(err)
        })?;

        match event {
            Some(event) if event.dj_id == dj_id => Ok(()),
            _ => {
                let err = SongRequestError::EventNotFound;
                warn!(
                    %dj_id,
                    %event_id,
                    status = err.status_code().as_u16(),
                    "song_queue: event missing or owned by another DJ"
                );
                Err(err)
            }
        }
    }

    async fn rows(&self, event_id: Uuid) -> UseCaseResult<Vec<SongRequestEntity>> {
        self.song_requests
            .list_by_event(event_id)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "song_queue: failed to list requests");
                SongRequestError::Internal(err)
            })
    }

    pub async fn queue(&self, dj_id: Uuid, event_id: Uuid) -> UseCaseResult<QueueView> {
        self.ensure_owner(dj_id, event_id).await?;
        let rows = self.rows(event_id).await?;
        Ok(build_queue_view(&rows))
    }

    /// Applies `status` to the whole `(title, artist)` group of `request_id`.
    pub async fn update_status(
        &self,
        dj_id: Uuid,
        event_id: Uuid,
        request_id: Uuid,
        status: SongStatus,
    ) -> UseCaseResult<QueueView> {
        self.ensure_owner(dj_id, event_id).await?;

        let request = self
            .song_requests
            .find_by_id(request_id)
            .await
            .map_err(|err| {
                error!(%request_id, db_error = ?err, "song_queue: failed to load request");
                SongRequestError::Internal(err)
            })?;
        if !matches!(&request, Some(r) if r.event_id == event_id) {
            let err = SongRequestError::SongRequestNotFound;
            warn!(
                %event_id,
                %request_id,
                status = err.status_code().as_u16(),
                "song_queue: request not in event"
            );
            return Err(err);
        }

        let updated = self
            .song_requests
            .update_status_for_group(request_id, status)
            .await
            .map_err(|err| {
                error!(%request_id, db_error = ?err, "song_queue: failed to update status");
                SongRequestError::Internal(err)
            })?;
        info!(%event_id, %request_id, status = status.as_str(), updated, "song_queue: status changed");

        self.queue_after_write(event_id).await
    }

    /// Stores the DJ's order for pending groups; groups left out follow in vote order.
    pub async fn reorder(
        &self,
        dj_id: Uuid,
        event_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> UseCaseResult<QueueView> {
        self.ensure_owner(dj_id, event_id).await?;

        let rows = self.rows(event_id).await?;
        let view = build_queue_view(&rows);
        let assignments = plan_manual_order(&view, &ordered_ids).map_err(|err| {
            warn!(%event_id, reason = %err, status = 400, "song_queue: rejected order");
            SongRequestError::InvalidOrder(err)
        })?;

        let ranked = assignments.len();
        self.song_requests
            .set_manual_ranks(event_id, assignments)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "song_queue: failed to store order");
                SongRequestError::Internal(err)
            })?;
        info!(%event_id, groups = ordered_ids.len(), ranked, "song_queue: order stored");

        self.queue_after_write(event_id).await
    }

    async fn queue_after_write(&self, event_id: Uuid) -> UseCaseResult<QueueView> {
        let rows = self.rows(event_id).await?;
        Ok(build_queue_view(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crates::domain::{
        entities::events::EventEntity,
        repositories::{events::MockEventRepository, song_requests::MockSongRequestRepository},
    };
    use mockall::predicate::eq;

    fn event(id: Uuid, dj_id: Uuid) -> EventEntity {
        EventEntity {
            id,
            dj_id,
            name: "Club".to_string(),
            active: true,
            start_time: None,
            end_time: None,
            location: None,
            request_limit: 3,
            created_at: Utc::now(),
        }
    }

    fn row(event_id: Uuid, title: &str, votes: i32, minute: i64) -> SongRequestEntity {
        SongRequestEntity {
            id: Uuid::new_v4(),
            event_id,
            title: title.to_string(),
            artist: "Artist".to_string(),
            votes,
            played: false,
            rejected: false,
            song_link: None,
            manual_rank: None,
            created_at: Utc::now() + Duration::minutes(minute),
        }
    }

    fn owned_events(dj_id: Uuid) -> MockEventRepository {
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(move |id| Ok(Some(event(id, dj_id))));
        events
    }

    #[tokio::test]
    async fn queue_groups_duplicates_for_the_owner() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let rows = vec![
            row(event_id, "One More Time", 2, 0),
            row(event_id, "Around the World", 4, 1),
            row(event_id, "One More Time", 3, 2),
        ];

        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_list_by_event()
            .with(eq(event_id))
            .returning(move |_| Ok(rows.clone()));

        let view = SongQueueUseCase::new(Arc::new(owned_events(dj_id)), Arc::new(song_requests))
            .queue(dj_id, event_id)
            .await
            .unwrap();

        assert_eq!(view.queue.len(), 2);
        assert_eq!(view.queue[0].title, "One More Time");
        assert_eq!(view.queue[0].votes, 5);
        assert_eq!(view.queue[0].request_count, 2);
        assert_eq!(view.queue[0].queue_position, Some(1));
    }

    #[tokio::test]
    async fn other_djs_cannot_read_the_queue() {
        let mut song_requests = MockSongRequestRepository::new();
        song_requests.expect_list_by_event().never();

        let err = SongQueueUseCase::new(
            Arc::new(owned_events(Uuid::new_v4())),
            Arc::new(song_requests),
        )
        .queue(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_change_targets_the_group() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let target = row(event_id, "Windowlicker", 1, 0);
        let target_id = target.id;

        let mut song_requests = MockSongRequestRepository::new();
        let found = target.clone();
        song_requests
            .expect_find_by_id()
            .with(eq(target_id))
            .returning(move |_| Ok(Some(found.clone())));
        song_requests
            .expect_update_status_for_group()
            .with(eq(target_id), eq(SongStatus::Played))
            .times(1)
            .returning(|_, _| Ok(2));
        song_requests.expect_list_by_event().returning(move |_| {
            let mut played = target.clone();
            played.played = true;
            Ok(vec![played])
        });

        let view = SongQueueUseCase::new(Arc::new(owned_events(dj_id)), Arc::new(song_requests))
            .update_status(dj_id, event_id, target_id, SongStatus::Played)
            .await
            .unwrap();
        assert!(view.queue.is_empty());
        assert_eq!(view.played.len(), 1);
    }

    #[tokio::test]
    async fn status_change_rejects_requests_from_other_events() {
        let dj_id = Uuid::new_v4();
        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_find_by_id()
            .returning(|_| Ok(Some(row(Uuid::new_v4(), "Elsewhere", 1, 0))));
        song_requests.expect_update_status_for_group().never();

        let err = SongQueueUseCase::new(Arc::new(owned_events(dj_id)), Arc::new(song_requests))
            .update_status(dj_id, Uuid::new_v4(), Uuid::new_v4(), SongStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, SongRequestError::SongRequestNotFound));
    }

    #[tokio::test]
    async fn reorder_ranks_every_row_of_each_listed_group() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let first = row(event_id, "A", 5, 0);
        let duplicate = row(event_id, "A", 1, 1);
        let second = row(event_id, "B", 1, 2);
        let expected = vec![(second.id, 1), (first.id, 2), (duplicate.id, 2)];
        let order = vec![second.id, first.id];
        let rows = vec![first, duplicate, second];

        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_list_by_event()
            .returning(move |_| Ok(rows.clone()));
        song_requests
            .expect_set_manual_ranks()
            .with(eq(event_id), eq(expected))
            .times(1)
            .returning(|_, _| Ok(()));

        SongQueueUseCase::new(Arc::new(owned_events(dj_id)), Arc::new(song_requests))
            .reorder(dj_id, event_id, order)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reorder_with_unknown_id_is_a_bad_request() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let rows = vec![row(event_id, "A", 1, 0)];

        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_list_by_event()
            .returning(move |_| Ok(rows.clone()));
        song_requests.expect_set_manual_ranks().never();

        let err = SongQueueUseCase::new(Arc::new(owned_events(dj_id)), Arc::new(song_requests))
            .reorder(dj_id, event_id, vec![Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
