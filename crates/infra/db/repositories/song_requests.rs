use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{events, song_requests},
    },
};
use domain::{
    entities::song_requests::{InsertSongRequestEntity, SongRequestEntity},
    repositories::song_requests::SongRequestRepository,
    value_objects::{dashboard::TopRequest, enums::song_statuses::SongStatus},
};

pub struct SongRequestPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SongRequestPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SongRequestRepository for SongRequestPostgres {
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<SongRequestEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = song_requests::table
            .filter(song_requests::event_id.eq(event_id))
            .order((song_requests::created_at.asc(), song_requests::id.asc()))
            .select(SongRequestEntity::as_select())
            .load::<SongRequestEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, song_request_id: Uuid) -> Result<Option<SongRequestEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = song_requests::table
            .find(song_request_id)
            .select(SongRequestEntity::as_select())
            .first::<SongRequestEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_title_artist(
        &self,
        event_id: Uuid,
        title: &str,
        artist: &str,
    ) -> Result<Option<SongRequestEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = song_requests::table
            .filter(song_requests::event_id.eq(event_id))
            .filter(song_requests::title.eq(title))
            .filter(song_requests::artist.eq(artist))
            .order(song_requests::created_at.asc())
            .select(SongRequestEntity::as_select())
            .first::<SongRequestEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, song_request: InsertSongRequestEntity) -> Result<SongRequestEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(song_requests::table)
            .values(&song_request)
            .returning(SongRequestEntity::as_returning())
            .get_result::<SongRequestEntity>(&mut conn)?;

        Ok(result)
    }

    async fn increment_votes(&self, song_request_id: Uuid) -> Result<SongRequestEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(song_requests::table.find(song_request_id))
            .set(song_requests::votes.eq(song_requests::votes + 1))
            .returning(SongRequestEntity::as_returning())
            .get_result::<SongRequestEntity>(&mut conn)?;

        Ok(result)
    }

    async fn update_status_for_group(
        &self,
        song_request_id: Uuid,
        status: SongStatus,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let (played, rejected) = status.to_flags();

        let changed = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let anchor = song_requests::table
                .find(song_request_id)
                .select(SongRequestEntity::as_select())
                .first::<SongRequestEntity>(conn)
                .optional()?;

            let Some(anchor) = anchor else {
                return Ok(0);
            };

            update(song_requests::table)
                .filter(song_requests::event_id.eq(anchor.event_id))
                .filter(song_requests::title.eq(&anchor.title))
                .filter(song_requests::artist.eq(&anchor.artist))
                .set((
                    song_requests::played.eq(played),
                    song_requests::rejected.eq(rejected),
                    song_requests::manual_rank.eq(None::<i32>),
                ))
                .execute(conn)
        })?;

        Ok(changed)
    }

    async fn set_manual_ranks(&self, event_id: Uuid, assignments: Vec<(Uuid, i32)>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<(), anyhow::Error, _>(|conn| {
            update(song_requests::table)
                .filter(song_requests::event_id.eq(event_id))
                .set(song_requests::manual_rank.eq(None::<i32>))
                .execute(conn)?;

            for (song_request_id, rank) in &assignments {
                let updated = update(song_requests::table.find(song_request_id))
                    .filter(song_requests::event_id.eq(event_id))
                    .set(song_requests::manual_rank.eq(Some(*rank)))
                    .execute(conn)?;

                if updated == 0 {
                    return Err(anyhow!(
                        "song request {song_request_id} does not belong to event {event_id}"
                    ));
                }
            }

            Ok(())
        })?;

        Ok(())
    }

    async fn top_requests(&self, limit: i64, dj_id: Option<Uuid>) -> Result<Vec<TopRequest>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = song_requests::table
            .inner_join(events::table)
            .select((
                song_requests::id,
                song_requests::title,
                song_requests::artist,
                song_requests::votes,
                song_requests::event_id,
                events::name,
            ))
            .order((song_requests::votes.desc(), song_requests::created_at.asc()))
            .limit(limit)
            .into_boxed();

        if let Some(dj_id) = dj_id {
            query = query.filter(events::dj_id.eq(dj_id));
        }

        let rows = query.load::<(Uuid, String, String, i32, Uuid, String)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(id, title, artist, votes, event_id, event_name)| TopRequest {
                id,
                title,
                artist,
                votes,
                event_id,
                event_name,
            })
            .collect())
    }
}
