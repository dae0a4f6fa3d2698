use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::song_statuses::SongStatus,
    infra::db::postgres::schema::song_requests,
};

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = song_requests)]
pub struct SongRequestEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub artist: String,
    pub votes: i32,
    pub played: bool,
    pub rejected: bool,
    pub song_link: Option<String>,
    pub manual_rank: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl SongRequestEntity {
    pub fn status(&self) -> SongStatus {
        SongStatus::from_flags(self.played, self.rejected)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = song_requests)]
pub struct InsertSongRequestEntity {
    pub event_id: Uuid,
    pub title: String,
    pub artist: String,
    pub votes: i32,
    pub played: bool,
    pub rejected: bool,
    pub song_link: Option<String>,
    pub created_at: DateTime<Utc>,
}
