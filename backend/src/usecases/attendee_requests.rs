use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use crates::domain::{
    entities::{
        events::EventEntity,
        song_requests::{InsertSongRequestEntity, SongRequestEntity},
    },
    repositories::{
        attendees::AttendeeRepository, dj_users::DjUserRepository, events::EventRepository,
        song_requests::SongRequestRepository,
    },
    value_objects::{
        attendees::{
            AttendeeSongRow, RequestQuota, SubmissionOutcome, SubmissionResult, VoteToggle,
            attendee_rows,
        },
        profiles::DjProfile,
        song_submissions::{SongSubmission, SubmissionError, SubmitSongModel},
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AttendeeError {
    #[error("event not found")]
    EventNotFound,
    #[error("this event has ended")]
    EventEnded,
    #[error("song request not found")]
    SongRequestNotFound,
    #[error(transparent)]
    InvalidSubmission(#[from] SubmissionError),
    #[error("you have used all of your requests for this event")]
    RequestLimitReached,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AttendeeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AttendeeError::EventNotFound | AttendeeError::SongRequestNotFound => {
                StatusCode::NOT_FOUND
            }
            AttendeeError::EventEnded => StatusCode::GONE,
            AttendeeError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            AttendeeError::RequestLimitReached => StatusCode::TOO_MANY_REQUESTS,
            AttendeeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AttendeeError::EventNotFound => "EVENT_NOT_FOUND",
            AttendeeError::EventEnded => "EVENT_ENDED",
            AttendeeError::SongRequestNotFound => "SONG_REQUEST_NOT_FOUND",
            AttendeeError::InvalidSubmission(_) => "INVALID_SUBMISSION",
            AttendeeError::RequestLimitReached => "REQUEST_LIMIT_REACHED",
            AttendeeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AttendeeError>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicEventDto {
    pub event: EventEntity,
    pub dj: DjProfile,
    /// Present when the caller identified itself with an attendee id.
    pub quota: Option<RequestQuota>,
    pub remaining: Option<i32>,
}

/// Everything an anonymous attendee can do at an event.
pub struct AttendeeUseCase {
    events: Arc<dyn EventRepository + Send + Sync>,
    song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
    attendees: Arc<dyn AttendeeRepository + Send + Sync>,
    users: Arc<dyn DjUserRepository + Send + Sync>,
}

impl AttendeeUseCase {
    pub fn new(
        events: Arc<dyn EventRepository + Send + Sync>,
        song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
        attendees: Arc<dyn AttendeeRepository + Send + Sync>,
        users: Arc<dyn DjUserRepository + Send + Sync>,
    ) -> Self {
        Self {
            events,
            song_requests,
            attendees,
            users,
        }
    }

    async fn event(&self, event_id: Uuid) -> UseCaseResult<EventEntity> {
        let event = self.events.find_by_id(event_id).await.map_err(|err| {
            error!(%event_id, db_error = ?err, "attendee: failed to load event");
            AttendeeError::Internal(err)
        })?;
        event.ok_or_else(|| {
            let err = AttendeeError::EventNotFound;
            warn!(%event_id, status = err.status_code().as_u16(), "attendee: unknown event");
            err
        })
    }

    async fn active_event(&self, event_id: Uuid) -> UseCaseResult<EventEntity> {
        let event = self.event(event_id).await?;
        if !event.active {
            let err = AttendeeError::EventEnded;
            warn!(%event_id, status = err.status_code().as_u16(), "attendee: event has ended");
            return Err(err);
        }
        Ok(event)
    }

    async fn quota(&self, event: &EventEntity, attendee_id: Uuid) -> UseCaseResult<RequestQuota> {
        let used = self
            .attendees
            .requests_made(event.id, attendee_id)
            .await
            .map_err(|err| {
                error!(event_id = %event.id, %attendee_id, db_error = ?err, "attendee: failed to read quota");
                AttendeeError::Internal(err)
            })?;
        Ok(RequestQuota::new(event.request_limit, used))
    }

    pub async fn event_page(
        &self,
        event_id: Uuid,
        attendee_id: Option<Uuid>,
    ) -> UseCaseResult<PublicEventDto> {
        let event = self.active_event(event_id).await?;

        // Profile lookup failures degrade to an empty profile.
        let dj = match self.users.find_by_id(event.dj_id).await {
            Ok(Some(user)) => DjProfile::from(&user.user_metadata),
            Ok(None) => DjProfile::default(),
            Err(err) => {
                warn!(dj_id = %event.dj_id, error = ?err, "attendee: DJ profile unavailable");
                DjProfile::default()
            }
        };

        let quota = match attendee_id {
            Some(attendee_id) => Some(self.quota(&event, attendee_id).await?),
            None => None,
        };

        Ok(PublicEventDto {
            remaining: quota.map(|q| q.remaining()),
            quota,
            event,
            dj,
        })
    }

    pub async fn list_requests(
        &self,
        event_id: Uuid,
        attendee_id: Option<Uuid>,
    ) -> UseCaseResult<Vec<AttendeeSongRow>> {
        self.event(event_id).await?;

        let rows = self
            .song_requests
            .list_by_event(event_id)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "attendee: failed to list requests");
                AttendeeError::Internal(err)
            })?;

        let voted = match attendee_id {
            Some(attendee_id) => self
                .attendees
                .voted_request_ids(event_id, attendee_id)
                .await
                .map_err(|err| {
                    error!(%event_id, %attendee_id, db_error = ?err, "attendee: failed to load votes");
                    AttendeeError::Internal(err)
                })?,
            None => Vec::new(),
        };

        Ok(attendee_rows(rows, &voted))
    }

    /// New songs are inserted with one vote; a song already requested at the event
    /// gains a vote instead. Either way one unit of the attendee's quota is used.
    pub async fn submit(
        &self,
        event_id: Uuid,
        attendee_id: Uuid,
        model: SubmitSongModel,
    ) -> UseCaseResult<SubmissionResult> {
        let submission = SongSubmission::try_from(model).inspect_err(|err| {
            warn!(%event_id, reason = %err, status = 400, "attendee: invalid submission");
        })?;
        let event = self.active_event(event_id).await?;

        let used = self
            .attendees
            .try_consume_request(event_id, attendee_id, event.request_limit)
            .await
            .map_err(|err| {
                error!(%event_id, %attendee_id, db_error = ?err, "attendee: failed to consume quota");
                AttendeeError::Internal(err)
            })?;
        let Some(used) = used else {
            let err = AttendeeError::RequestLimitReached;
            warn!(
                %event_id,
                %attendee_id,
                limit = event.request_limit,
                status = err.status_code().as_u16(),
                "attendee: request limit reached"
            );
            return Err(err);
        };

        let (outcome, song_request) = match self.store_submission(event_id, submission).await {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(release_err) = self.attendees.release_request(event_id, attendee_id).await {
                    error!(%event_id, %attendee_id, db_error = ?release_err, "attendee: failed to release quota");
                }
                return Err(err);
            }
        };

        info!(
            %event_id,
            song_request_id = %song_request.id,
            outcome = ?outcome,
            "attendee: submission stored"
        );
        Ok(SubmissionResult {
            outcome,
            song_request,
            remaining: RequestQuota::new(event.request_limit, used).remaining(),
        })
    }

    async fn store_submission(
        &self,
        event_id: Uuid,
        submission: SongSubmission,
    ) -> UseCaseResult<(SubmissionOutcome, SongRequestEntity)> {
        let existing = self
            .song_requests
            .find_by_title_artist(event_id, &submission.title, &submission.artist)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "attendee: duplicate lookup failed");
                AttendeeError::Internal(err)
            })?;

        if let Some(existing) = existing {
            let updated = self
                .song_requests
                .increment_votes(existing.id)
                .await
                .map_err(|err| {
                    error!(song_request_id = %existing.id, db_error = ?err, "attendee: failed to add vote");
                    AttendeeError::Internal(err)
                })?;
            return Ok((SubmissionOutcome::Voted, updated));
        }

        let inserted = self
            .song_requests
            .insert(InsertSongRequestEntity {
                event_id,
                title: submission.title,
                artist: submission.artist,
                votes: 1,
                played: false,
                rejected: false,
                song_link: submission.song_link,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "attendee: failed to insert request");
                AttendeeError::Internal(err)
            })?;
        Ok((SubmissionOutcome::Created, inserted))
    }

    pub async fn toggle_vote(
        &self,
        event_id: Uuid,
        song_request_id: Uuid,
        attendee_id: Uuid,
    ) -> UseCaseResult<VoteToggle> {
        self.active_event(event_id).await?;

        let request = self
            .song_requests
            .find_by_id(song_request_id)
            .await
            .map_err(|err| {
                error!(%song_request_id, db_error = ?err, "attendee: failed to load request");
                AttendeeError::Internal(err)
            })?;
        if !matches!(&request, Some(r) if r.event_id == event_id) {
            let err = AttendeeError::SongRequestNotFound;
            warn!(%event_id, %song_request_id, status = err.status_code().as_u16(), "attendee: vote on unknown request");
            return Err(err);
        }

        self.attendees
            .toggle_vote(song_request_id, attendee_id)
            .await
            .map_err(|err| {
                error!(%song_request_id, %attendee_id, db_error = ?err, "attendee: failed to toggle vote");
                AttendeeError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use anyhow::anyhow;
    use crates::domain::{
        entities::dj_users::DjUserEntity,
        repositories::{
            attendees::MockAttendeeRepository, dj_users::MockDjUserRepository,
            events::MockEventRepository, song_requests::MockSongRequestRepository,
        },
        value_objects::user_metadata::UserMetadata,
    };
    use mockall::predicate::eq;

    fn event(id: Uuid, active: bool) -> EventEntity {
        EventEntity {
            id,
            dj_id: Uuid::nil(),
            name: "Rooftop".to_string(),
            active,
            start_time: None,
            end_time: None,
            location: None,
            request_limit: 3,
            created_at: Utc::now(),
        }
    }

    fn stored(insert: InsertSongRequestEntity) -> SongRequestEntity {
        SongRequestEntity {
            id: Uuid::new_v4(),
            event_id: insert.event_id,
            title: insert.title,
            artist: insert.artist,
            votes: insert.votes,
            played: false,
            rejected: false,
            song_link: insert.song_link,
            manual_rank: None,
            created_at: insert.created_at,
        }
    }

    fn submit_model(title: &str) -> SubmitSongModel {
        SubmitSongModel {
            title: title.to_string(),
            artist: "Daft Punk".to_string(),
            song_link: None,
        }
    }

    fn active_events() -> MockEventRepository {
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(|id| Ok(Some(event(id, true))));
        events
    }

    /// Quota ledger keyed by (event, attendee), enforcing the limit like the table does.
    fn counting_attendees() -> MockAttendeeRepository {
        let counts: Arc<Mutex<HashMap<(Uuid, Uuid), i32>>> = Arc::default();
        let mut attendees = MockAttendeeRepository::new();
        attendees
            .expect_try_consume_request()
            .returning(move |event_id, attendee_id, limit| {
                let mut counts = counts.lock().unwrap();
                let used = counts.entry((event_id, attendee_id)).or_insert(0);
                if *used >= limit {
                    return Ok(None);
                }
                *used += 1;
                Ok(Some(*used))
            });
        attendees
    }

    fn inserting_song_requests() -> MockSongRequestRepository {
        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_find_by_title_artist()
            .returning(|_, _, _| Ok(None));
        song_requests
            .expect_insert()
            .returning(|insert| Ok(stored(insert)));
        song_requests
    }

    fn usecase(
        events: MockEventRepository,
        song_requests: MockSongRequestRepository,
        attendees: MockAttendeeRepository,
        users: MockDjUserRepository,
    ) -> AttendeeUseCase {
        AttendeeUseCase::new(
            Arc::new(events),
            Arc::new(song_requests),
            Arc::new(attendees),
            Arc::new(users),
        )
    }

    #[tokio::test]
    async fn three_requests_per_event_then_limit_reached() {
        let uc = usecase(
            active_events(),
            inserting_song_requests(),
            counting_attendees(),
            MockDjUserRepository::new(),
        );
        let attendee = Uuid::new_v4();
        let first_event = Uuid::new_v4();
        let second_event = Uuid::new_v4();

        let mut remaining = Vec::new();
        for n in 0..3 {
            let result = uc
                .submit(first_event, attendee, submit_model(&format!("Song {n}")))
                .await
                .unwrap();
            assert_eq!(result.outcome, SubmissionOutcome::Created);
            remaining.push(result.remaining);
        }
        assert_eq!(remaining, vec![2, 1, 0]);

        let err = uc
            .submit(first_event, attendee, submit_model("Song 4"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "REQUEST_LIMIT_REACHED");

        let other = uc
            .submit(second_event, attendee, submit_model("Song 4"))
            .await
            .unwrap();
        assert_eq!(other.remaining, 2);
    }

    #[tokio::test]
    async fn duplicate_submission_votes_for_the_existing_song() {
        let event_id = Uuid::new_v4();
        let existing = stored(InsertSongRequestEntity {
            event_id,
            title: "Digital Love".to_string(),
            artist: "Daft Punk".to_string(),
            votes: 4,
            played: false,
            rejected: false,
            song_link: None,
            created_at: Utc::now(),
        });
        let existing_id = existing.id;

        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_find_by_title_artist()
            .with(eq(event_id), eq("Digital Love"), eq("Daft Punk"))
            .returning(move |_, _, _| Ok(Some(existing.clone())));
        song_requests.expect_insert().never();
        song_requests
            .expect_increment_votes()
            .with(eq(existing_id))
            .returning(|id| {
                let mut row = stored(InsertSongRequestEntity {
                    event_id: Uuid::nil(),
                    title: "Digital Love".to_string(),
                    artist: "Daft Punk".to_string(),
                    votes: 5,
                    played: false,
                    rejected: false,
                    song_link: None,
                    created_at: Utc::now(),
                });
                row.id = id;
                Ok(row)
            });

        let result = usecase(
            active_events(),
            song_requests,
            counting_attendees(),
            MockDjUserRepository::new(),
        )
        .submit(event_id, Uuid::new_v4(), submit_model(" Digital Love "))
        .await
        .unwrap();

        assert_eq!(result.outcome, SubmissionOutcome::Voted);
        assert_eq!(result.song_request.votes, 5);
        assert_eq!(result.remaining, 2);
    }

    #[tokio::test]
    async fn invalid_submission_does_not_touch_the_quota() {
        let mut attendees = MockAttendeeRepository::new();
        attendees.expect_try_consume_request().never();

        let model = SubmitSongModel {
            title: "Track".to_string(),
            artist: "Artist".to_string(),
            song_link: Some("https://evil.example.com/track".to_string()),
        };
        let err = usecase(
            active_events(),
            MockSongRequestRepository::new(),
            attendees,
            MockDjUserRepository::new(),
        )
        .submit(Uuid::new_v4(), Uuid::new_v4(), model)
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_insert_gives_the_request_back() {
        let mut attendees = MockAttendeeRepository::new();
        attendees
            .expect_try_consume_request()
            .returning(|_, _, _| Ok(Some(1)));
        attendees
            .expect_release_request()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_find_by_title_artist()
            .returning(|_, _, _| Ok(None));
        song_requests
            .expect_insert()
            .returning(|_| Err(anyhow!("connection reset")));

        let err = usecase(active_events(), song_requests, attendees, MockDjUserRepository::new())
            .submit(Uuid::new_v4(), Uuid::new_v4(), submit_model("Aerodynamic"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn ended_event_page_is_gone() {
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(|id| Ok(Some(event(id, false))));

        let err = usecase(
            events,
            MockSongRequestRepository::new(),
            MockAttendeeRepository::new(),
            MockDjUserRepository::new(),
        )
        .event_page(Uuid::new_v4(), None)
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn unknown_event_page_is_not_found() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(None));

        let err = usecase(
            events,
            MockSongRequestRepository::new(),
            MockAttendeeRepository::new(),
            MockDjUserRepository::new(),
        )
        .event_page(Uuid::new_v4(), None)
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn event_page_shows_profile_and_remaining_quota() {
        let attendee = Uuid::new_v4();
        let mut users = MockDjUserRepository::new();
        users.expect_find_by_id().returning(|id| {
            Ok(Some(DjUserEntity {
                id,
                email: None,
                user_metadata: UserMetadata {
                    dj_name: Some("DJ Koze".to_string()),
                    ..Default::default()
                },
                created_at: None,
            }))
        });
        let mut attendees = MockAttendeeRepository::new();
        attendees
            .expect_requests_made()
            .withf(move |_, a| *a == attendee)
            .returning(|_, _| Ok(2));

        let page = usecase(
            active_events(),
            MockSongRequestRepository::new(),
            attendees,
            users,
        )
        .event_page(Uuid::new_v4(), Some(attendee))
        .await
        .unwrap();

        assert_eq!(page.dj.dj_name.as_deref(), Some("DJ Koze"));
        assert_eq!(page.remaining, Some(1));
    }

    #[tokio::test]
    async fn vote_on_request_from_another_event_is_not_found() {
        let mut song_requests = MockSongRequestRepository::new();
        song_requests.expect_find_by_id().returning(|_| {
            Ok(Some(stored(InsertSongRequestEntity {
                event_id: Uuid::new_v4(),
                title: "t".to_string(),
                artist: "a".to_string(),
                votes: 1,
                played: false,
                rejected: false,
                song_link: None,
                created_at: Utc::now(),
            })))
        });
        let mut attendees = MockAttendeeRepository::new();
        attendees.expect_toggle_vote().never();

        let err = usecase(active_events(), song_requests, attendees, MockDjUserRepository::new())
            .toggle_vote(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendeeError::SongRequestNotFound));
    }

    #[tokio::test]
    async fn vote_toggle_passes_through_the_ledger_result() {
        let event_id = Uuid::new_v4();
        let mut song_requests = MockSongRequestRepository::new();
        song_requests.expect_find_by_id().returning(move |id| {
            let mut row = stored(InsertSongRequestEntity {
                event_id,
                title: "t".to_string(),
                artist: "a".to_string(),
                votes: 1,
                played: false,
                rejected: false,
                song_link: None,
                created_at: Utc::now(),
            });
            row.id = id;
            Ok(Some(row))
        });
        let mut attendees = MockAttendeeRepository::new();
        attendees
            .expect_toggle_vote()
            .returning(|_, _| Ok(VoteToggle { voted: true, votes: 2 }));

        let toggle = usecase(active_events(), song_requests, attendees, MockDjUserRepository::new())
            .toggle_vote(event_id, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(toggle, VoteToggle { voted: true, votes: 2 });
    }
}
