use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use crates::domain::{
    entities::events::{EventEntity, InsertEventEntity},
    repositories::{events::EventRepository, song_requests::SongRequestRepository},
    value_objects::{
        attendees::MAX_REQUEST_LIMIT,
        dashboard::{DashboardStats, TOP_REQUESTS_LIMIT},
        events::{CreateEventModel, EventListDto},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::plan_cache::PlanCache;

pub const MAX_EVENT_NAME_LENGTH: usize = 100;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event name is required")]
    NameRequired,
    #[error("event name must be at most 100 characters")]
    NameTooLong,
    #[error("request limit must be between 1 and 50")]
    InvalidRequestLimit,
    #[error("event not found")]
    NotFound,
    #[error("your plan does not allow another active event")]
    LimitReached,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EventError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EventError::NameRequired
            | EventError::NameTooLong
            | EventError::InvalidRequestLimit => StatusCode::BAD_REQUEST,
            EventError::NotFound => StatusCode::NOT_FOUND,
            EventError::LimitReached => StatusCode::FORBIDDEN,
            EventError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EventError::NameRequired | EventError::NameTooLong => "INVALID_EVENT_NAME",
            EventError::InvalidRequestLimit => "INVALID_REQUEST_LIMIT",
            EventError::NotFound => "EVENT_NOT_FOUND",
            EventError::LimitReached => "EVENT_LIMIT_REACHED",
            EventError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, EventError>;

fn validate_request_limit(limit: i32) -> UseCaseResult<i32> {
    if (1..=MAX_REQUEST_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(EventError::InvalidRequestLimit)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct EventUseCase {
    events: Arc<dyn EventRepository + Send + Sync>,
    song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
    plan_cache: Arc<PlanCache>,
    default_request_limit: i32,
}

impl EventUseCase {
    pub fn new(
        events: Arc<dyn EventRepository + Send + Sync>,
        song_requests: Arc<dyn SongRequestRepository + Send + Sync>,
        plan_cache: Arc<PlanCache>,
        default_request_limit: i32,
    ) -> Self {
        Self {
            events,
            song_requests,
            plan_cache,
            default_request_limit,
        }
    }

    /// Loads an event and checks that `dj_id` owns it. Foreign events look missing.
    async fn owned_event(&self, dj_id: Uuid, event_id: Uuid) -> UseCaseResult<EventEntity> {
        let event = self.events.find_by_id(event_id).await.map_err(|err| {
            error!(%event_id, db_error = ?err, "events: failed to load event");
            EventError::Internal(err)
        })?;

        match event {
            Some(event) if event.dj_id == dj_id => Ok(event),
            _ => {
                let err = EventError::NotFound;
                warn!(
                    %dj_id,
                    %event_id,
                    status = err.status_code().as_u16(),
                    "events: event missing or owned by another DJ"
                );
                Err(err)
            }
        }
    }

    async fn ensure_can_activate(&self, dj_id: Uuid) -> UseCaseResult<()> {
        let plan = self.plan_cache.plan_state(dj_id).await.map_err(|err| {
            error!(%dj_id, db_error = ?err, "events: failed to resolve plan");
            EventError::Internal(err)
        })?;
        let active = self.events.count_active_by_dj(dj_id).await.map_err(|err| {
            error!(%dj_id, db_error = ?err, "events: failed to count active events");
            EventError::Internal(err)
        })?;

        if plan.can_create_event(active) {
            return Ok(());
        }

        let err = EventError::LimitReached;
        warn!(
            %dj_id,
            active,
            tier = ?plan.tier,
            status = err.status_code().as_u16(),
            "events: active event limit reached"
        );
        Err(err)
    }

    pub async fn create_event(
        &self,
        dj_id: Uuid,
        model: CreateEventModel,
    ) -> UseCaseResult<EventEntity> {
        let name = model.name.trim().to_string();
        if name.is_empty() {
            return Err(EventError::NameRequired);
        }
        if name.chars().count() > MAX_EVENT_NAME_LENGTH {
            return Err(EventError::NameTooLong);
        }
        let request_limit = match model.request_limit {
            Some(limit) => validate_request_limit(limit)?,
            None => self.default_request_limit,
        };

        self.ensure_can_activate(dj_id).await?;

        let event = self
            .events
            .create(InsertEventEntity {
                dj_id,
                name,
                active: true,
                start_time: blank_to_none(model.start_time),
                end_time: blank_to_none(model.end_time),
                location: blank_to_none(model.location),
                request_limit,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%dj_id, db_error = ?err, "events: failed to create event");
                EventError::Internal(err)
            })?;

        info!(%dj_id, event_id = %event.id, "events: event created");
        Ok(event)
    }

    pub async fn list_events(&self, dj_id: Uuid) -> UseCaseResult<EventListDto> {
        let events = self.events.list_by_dj(dj_id).await.map_err(|err| {
            error!(%dj_id, db_error = ?err, "events: failed to list events");
            EventError::Internal(err)
        })?;
        Ok(EventListDto::new(events))
    }

    pub async fn set_active(
        &self,
        dj_id: Uuid,
        event_id: Uuid,
        active: bool,
    ) -> UseCaseResult<EventEntity> {
        let event = self.owned_event(dj_id, event_id).await?;
        if event.active == active {
            return Ok(event);
        }
        if active {
            self.ensure_can_activate(dj_id).await?;
        }

        let event = self.events.set_active(event_id, active).await.map_err(|err| {
            error!(%event_id, db_error = ?err, "events: failed to toggle event");
            EventError::Internal(err)
        })?;

        info!(%dj_id, %event_id, active, "events: event toggled");
        Ok(event)
    }

    pub async fn update_settings(
        &self,
        dj_id: Uuid,
        event_id: Uuid,
        request_limit: i32,
    ) -> UseCaseResult<EventEntity> {
        let request_limit = validate_request_limit(request_limit).inspect_err(|err| {
            warn!(
                %event_id,
                request_limit,
                status = err.status_code().as_u16(),
                "events: rejected request limit"
            );
        })?;
        self.owned_event(dj_id, event_id).await?;

        self.events
            .set_request_limit(event_id, request_limit)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "events: failed to update settings");
                EventError::Internal(err)
            })
    }

    pub async fn dashboard(&self, dj_id: Uuid) -> UseCaseResult<DashboardStats> {
        let requests_by_event = self.events.request_counts_by_dj(dj_id).await.map_err(|err| {
            error!(%dj_id, db_error = ?err, "events: failed to count requests");
            EventError::Internal(err)
        })?;

        let top_requests_all_djs = self
            .song_requests
            .top_requests(TOP_REQUESTS_LIMIT, None)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "events: failed to load global top requests");
                EventError::Internal(err)
            })?;

        let top_requests_my_events = self
            .song_requests
            .top_requests(TOP_REQUESTS_LIMIT, Some(dj_id))
            .await
            .map_err(|err| {
                error!(%dj_id, db_error = ?err, "events: failed to load top requests");
                EventError::Internal(err)
            })?;

        Ok(DashboardStats {
            active_events: requests_by_event.iter().filter(|e| e.active).count() as i64,
            total_requests: requests_by_event.iter().map(|e| e.total_requests).sum(),
            requests_by_event,
            top_requests_all_djs,
            top_requests_my_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crates::domain::{
        entities::dj_users::DjUserEntity,
        repositories::{
            dj_users::MockDjUserRepository, events::MockEventRepository,
            song_requests::MockSongRequestRepository,
        },
        value_objects::{
            dashboard::{EventRequestCount, TopRequest},
            enums::subscription_plans::SubscriptionPlan,
            user_metadata::UserMetadata,
        },
    };
    use mockall::predicate::eq;

    fn user(id: Uuid, plan: Option<SubscriptionPlan>) -> DjUserEntity {
        DjUserEntity {
            id,
            email: None,
            user_metadata: UserMetadata {
                subscription_plan: plan,
                subscription_expires: plan
                    .filter(|p| *p != SubscriptionPlan::Lifetime)
                    .map(|_| Utc::now() + chrono::Duration::days(30)),
                ..Default::default()
            },
            created_at: None,
        }
    }

    fn plan_cache(id: Uuid, plan: Option<SubscriptionPlan>) -> Arc<PlanCache> {
        let mut users = MockDjUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user(id, plan))));
        Arc::new(PlanCache::new(Arc::new(users), Duration::from_secs(60), 10))
    }

    fn event(id: Uuid, dj_id: Uuid, active: bool) -> EventEntity {
        EventEntity {
            id,
            dj_id,
            name: "Friday Night".to_string(),
            active,
            start_time: None,
            end_time: None,
            location: None,
            request_limit: 3,
            created_at: Utc::now(),
        }
    }

    fn usecase(
        events: MockEventRepository,
        song_requests: MockSongRequestRepository,
        cache: Arc<PlanCache>,
    ) -> EventUseCase {
        EventUseCase::new(Arc::new(events), Arc::new(song_requests), cache, 3)
    }

    fn create_model(name: &str) -> CreateEventModel {
        CreateEventModel {
            name: name.to_string(),
            start_time: None,
            end_time: None,
            location: Some("  ".to_string()),
            request_limit: None,
        }
    }

    #[tokio::test]
    async fn free_dj_with_an_active_event_cannot_create_another() {
        let dj_id = Uuid::new_v4();
        let mut events = MockEventRepository::new();
        events.expect_count_active_by_dj().returning(|_| Ok(1));
        events.expect_create().never();

        let err = usecase(events, MockSongRequestRepository::new(), plan_cache(dj_id, None))
            .create_event(dj_id, create_model("Second"))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::LimitReached));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "EVENT_LIMIT_REACHED");
    }

    #[tokio::test]
    async fn pro_dj_creates_with_default_limit() {
        let dj_id = Uuid::new_v4();
        let mut events = MockEventRepository::new();
        events.expect_count_active_by_dj().returning(|_| Ok(4));
        events
            .expect_create()
            .withf(move |insert| {
                insert.dj_id == dj_id
                    && insert.active
                    && insert.request_limit == 3
                    && insert.location.is_none()
                    && insert.name == "Warehouse"
            })
            .returning(|insert| {
                let mut created = event(Uuid::new_v4(), insert.dj_id, true);
                created.name = insert.name;
                Ok(created)
            });

        let created = usecase(
            events,
            MockSongRequestRepository::new(),
            plan_cache(dj_id, Some(SubscriptionPlan::Pro)),
        )
        .create_event(dj_id, create_model("  Warehouse "))
        .await
        .unwrap();

        assert_eq!(created.name, "Warehouse");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let dj_id = Uuid::new_v4();
        let err = usecase(
            MockEventRepository::new(),
            MockSongRequestRepository::new(),
            plan_cache(dj_id, None),
        )
        .create_event(dj_id, create_model("   "))
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reactivation_is_gated_by_the_plan() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .with(eq(event_id))
            .returning(move |id| Ok(Some(event(id, dj_id, false))));
        events.expect_count_active_by_dj().returning(|_| Ok(1));
        events.expect_set_active().never();

        let err = usecase(events, MockSongRequestRepository::new(), plan_cache(dj_id, None))
            .set_active(dj_id, event_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::LimitReached));
    }

    #[tokio::test]
    async fn deactivating_skips_the_plan_check() {
        let dj_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(move |id| Ok(Some(event(id, dj_id, true))));
        events.expect_count_active_by_dj().never();
        events
            .expect_set_active()
            .with(eq(event_id), eq(false))
            .returning(move |id, active| Ok(event(id, dj_id, active)));

        let updated = usecase(events, MockSongRequestRepository::new(), plan_cache(dj_id, None))
            .set_active(dj_id, event_id, false)
            .await
            .unwrap();
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn another_djs_event_is_not_found() {
        let dj_id = Uuid::new_v4();
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(|id| Ok(Some(event(id, Uuid::new_v4(), true))));

        let err = usecase(events, MockSongRequestRepository::new(), plan_cache(dj_id, None))
            .update_settings(dj_id, Uuid::new_v4(), 10)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_limit_outside_range_is_rejected() {
        let dj_id = Uuid::new_v4();
        let uc = usecase(
            MockEventRepository::new(),
            MockSongRequestRepository::new(),
            plan_cache(dj_id, None),
        );
        for limit in [0, 51, -2] {
            let err = uc.update_settings(dj_id, Uuid::new_v4(), limit).await.unwrap_err();
            assert!(matches!(err, EventError::InvalidRequestLimit));
        }
    }

    #[tokio::test]
    async fn dashboard_totals_come_from_per_event_counts() {
        let dj_id = Uuid::new_v4();
        let count = |active: bool, total_requests: i64| EventRequestCount {
            event_id: Uuid::new_v4(),
            event_name: "e".to_string(),
            active,
            created_at: Utc::now(),
            total_requests,
        };
        let counts = vec![count(true, 4), count(false, 9), count(true, 0)];

        let mut events = MockEventRepository::new();
        events
            .expect_request_counts_by_dj()
            .returning(move |_| Ok(counts.clone()));

        let top = TopRequest {
            id: Uuid::new_v4(),
            title: "Strobe".to_string(),
            artist: "deadmau5".to_string(),
            votes: 12,
            event_id: Uuid::new_v4(),
            event_name: "e".to_string(),
        };
        let mut song_requests = MockSongRequestRepository::new();
        song_requests
            .expect_top_requests()
            .with(eq(TOP_REQUESTS_LIMIT), eq(None::<Uuid>))
            .returning(move |_, _| Ok(vec![top.clone()]));
        song_requests
            .expect_top_requests()
            .with(eq(TOP_REQUESTS_LIMIT), eq(Some(dj_id)))
            .returning(|_, _| Ok(vec![]));

        let stats = usecase(events, song_requests, plan_cache(dj_id, None))
            .dashboard(dj_id)
            .await
            .unwrap();

        assert_eq!(stats.active_events, 2);
        assert_eq!(stats.total_requests, 13);
        assert_eq!(stats.requests_by_event.len(), 3);
        assert_eq!(stats.top_requests_all_djs.len(), 1);
        assert!(stats.top_requests_my_events.is_empty());
    }
}
