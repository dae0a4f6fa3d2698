use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{delete, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{attendee_quotas, song_requests, song_votes},
    },
};
use domain::{
    repositories::attendees::AttendeeRepository, value_objects::attendees::VoteToggle,
};

pub struct AttendeePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AttendeePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AttendeeRepository for AttendeePostgres {
    async fn requests_made(&self, event_id: Uuid, attendee_id: Uuid) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let used = attendee_quotas::table
            .find((event_id, attendee_id))
            .select(attendee_quotas::requests_made)
            .first::<i32>(&mut conn)
            .optional()?;

        Ok(used.unwrap_or(0))
    }

    async fn try_consume_request(
        &self,
        event_id: Uuid,
        attendee_id: Uuid,
        limit: i32,
    ) -> Result<Option<i32>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        // The row lock serialises concurrent submissions from the same attendee.
        let consumed = conn.transaction::<Option<i32>, diesel::result::Error, _>(|conn| {
            insert_into(attendee_quotas::table)
                .values((
                    attendee_quotas::event_id.eq(event_id),
                    attendee_quotas::attendee_id.eq(attendee_id),
                    attendee_quotas::requests_made.eq(0),
                    attendee_quotas::updated_at.eq(now),
                ))
                .on_conflict_do_nothing()
                .execute(conn)?;

            let used = attendee_quotas::table
                .find((event_id, attendee_id))
                .select(attendee_quotas::requests_made)
                .for_update()
                .first::<i32>(conn)?;

            if used >= limit {
                return Ok(None);
            }

            update(attendee_quotas::table.find((event_id, attendee_id)))
                .set((
                    attendee_quotas::requests_made.eq(used + 1),
                    attendee_quotas::updated_at.eq(now),
                ))
                .execute(conn)?;

            Ok(Some(used + 1))
        })?;

        Ok(consumed)
    }

    async fn release_request(&self, event_id: Uuid, attendee_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(attendee_quotas::table.find((event_id, attendee_id)))
            .filter(attendee_quotas::requests_made.gt(0))
            .set((
                attendee_quotas::requests_made.eq(attendee_quotas::requests_made - 1),
                attendee_quotas::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn toggle_vote(&self, song_request_id: Uuid, attendee_id: Uuid) -> Result<VoteToggle> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let toggle = conn.transaction::<VoteToggle, diesel::result::Error, _>(|conn| {
            let votes = song_requests::table
                .find(song_request_id)
                .select(song_requests::votes)
                .for_update()
                .first::<i32>(conn)?;

            let removed = delete(song_votes::table.find((song_request_id, attendee_id)))
                .execute(conn)?;

            let (voted, votes) = if removed > 0 {
                (false, (votes - 1).max(0))
            } else {
                insert_into(song_votes::table)
                    .values((
                        song_votes::song_request_id.eq(song_request_id),
                        song_votes::attendee_id.eq(attendee_id),
                        song_votes::created_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                (true, votes + 1)
            };

            update(song_requests::table.find(song_request_id))
                .set(song_requests::votes.eq(votes))
                .execute(conn)?;

            Ok(VoteToggle { voted, votes })
        })?;

        Ok(toggle)
    }

    async fn voted_request_ids(&self, event_id: Uuid, attendee_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = song_votes::table
            .inner_join(song_requests::table)
            .filter(song_requests::event_id.eq(event_id))
            .filter(song_votes::attendee_id.eq(attendee_id))
            .select(song_votes::song_request_id)
            .load::<Uuid>(&mut conn)?;

        Ok(results)
    }
}
