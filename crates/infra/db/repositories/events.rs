use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use diesel::{dsl::count_star, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{events, song_requests},
    },
};
use domain::{
    entities::events::{EventEntity, InsertEventEntity},
    repositories::events::EventRepository,
    value_objects::{dashboard::EventRequestCount, events::EventWithCount},
};

pub struct EventPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EventPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn request_counts(
        conn: &mut PgConnection,
        event_ids: &[Uuid],
    ) -> QueryResult<HashMap<Uuid, i64>> {
        let counts = song_requests::table
            .filter(song_requests::event_id.eq_any(event_ids))
            .group_by(song_requests::event_id)
            .select((song_requests::event_id, count_star()))
            .load::<(Uuid, i64)>(conn)?;

        Ok(counts.into_iter().collect())
    }

    fn load_with_counts(
        conn: &mut PgConnection,
        dj_id: Uuid,
    ) -> QueryResult<Vec<(EventEntity, i64)>> {
        let rows = events::table
            .filter(events::dj_id.eq(dj_id))
            .order(events::created_at.desc())
            .select(EventEntity::as_select())
            .load::<EventEntity>(conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|e| e.id).collect();
        let counts = Self::request_counts(conn, &ids)?;

        Ok(rows
            .into_iter()
            .map(|event| {
                let count = counts.get(&event.id).copied().unwrap_or(0);
                (event, count)
            })
            .collect())
    }
}

#[async_trait]
impl EventRepository for EventPostgres {
    async fn create(&self, event: InsertEventEntity) -> Result<EventEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(events::table)
            .values(&event)
            .returning(EventEntity::as_returning())
            .get_result::<EventEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<EventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = events::table
            .find(event_id)
            .select(EventEntity::as_select())
            .first::<EventEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_dj(&self, dj_id: Uuid) -> Result<Vec<EventWithCount>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = Self::load_with_counts(&mut conn, dj_id)?
            .into_iter()
            .map(|(event, request_count)| EventWithCount {
                event,
                request_count,
            })
            .collect();

        Ok(results)
    }

    async fn count_active_by_dj(&self, dj_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = events::table
            .filter(events::dj_id.eq(dj_id))
            .filter(events::active.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn set_active(&self, event_id: Uuid, active: bool) -> Result<EventEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(events::table.find(event_id))
            .set(events::active.eq(active))
            .returning(EventEntity::as_returning())
            .get_result::<EventEntity>(&mut conn)?;

        Ok(result)
    }

    async fn set_request_limit(&self, event_id: Uuid, request_limit: i32) -> Result<EventEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(events::table.find(event_id))
            .set(events::request_limit.eq(request_limit))
            .returning(EventEntity::as_returning())
            .get_result::<EventEntity>(&mut conn)?;

        Ok(result)
    }

    async fn request_counts_by_dj(&self, dj_id: Uuid) -> Result<Vec<EventRequestCount>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = Self::load_with_counts(&mut conn, dj_id)?
            .into_iter()
            .map(|(event, total_requests)| EventRequestCount {
                event_id: event.id,
                event_name: event.name,
                active: event.active,
                created_at: event.created_at,
                total_requests,
            })
            .collect();

        Ok(results)
    }
}
