use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::song_requests::SongRequestEntity, value_objects::enums::song_statuses::SongStatus,
};

/// One song in the queue. Requests sharing the exact `(title, artist)` pair are
/// collapsed into a single item; `id` is the earliest request of the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub artist: String,
    pub song_link: Option<String>,
    pub votes: i64,
    pub request_count: u32,
    pub status: SongStatus,
    pub queue_position: Option<u32>,
    pub manual_rank: Option<i32>,
    pub request_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueView {
    pub queue: Vec<QueueItem>,
    pub played: Vec<QueueItem>,
    pub rejected: Vec<QueueItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UpdateSongStatusModel {
    pub status: SongStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueueOrderModel {
    pub song_request_ids: Vec<Uuid>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueOrderError {
    #[error("song request {0} is not in this event's queue")]
    UnknownSong(Uuid),
    #[error("song request {0} is listed more than once")]
    DuplicateSong(Uuid),
    #[error("song request {0} is no longer pending")]
    NotPending(Uuid),
}

/// Collapses rows into groups in first-appearance order. The group takes its
/// status, link and id from its first row; votes are summed over all rows.
pub fn group_requests(rows: &[SongRequestEntity]) -> Vec<QueueItem> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<QueueItem> = Vec::new();

    for row in rows {
        let key = (row.title.as_str(), row.artist.as_str());
        match index.get(&key) {
            Some(&at) => {
                let group = &mut groups[at];
                group.votes += i64::from(row.votes);
                group.request_count += 1;
                group.request_ids.push(row.id);
                if group.song_link.is_none() {
                    group.song_link = row.song_link.clone();
                }
                group.manual_rank = match (group.manual_rank, row.manual_rank) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
            None => {
                index.insert(key, groups.len());
                groups.push(QueueItem {
                    id: row.id,
                    event_id: row.event_id,
                    title: row.title.clone(),
                    artist: row.artist.clone(),
                    song_link: row.song_link.clone(),
                    votes: i64::from(row.votes),
                    request_count: 1,
                    status: row.status(),
                    queue_position: None,
                    manual_rank: row.manual_rank,
                    request_ids: vec![row.id],
                    created_at: row.created_at,
                });
            }
        }
    }

    groups
}

/// Builds the DJ's view of an event. Rows are expected in creation order so that
/// equal vote totals keep their first-appearance order.
///
/// Pending groups with a manual rank come first in rank order; the rest follow by
/// votes, descending. Positions `1..=N` are assigned to pending groups only.
pub fn build_queue_view(rows: &[SongRequestEntity]) -> QueueView {
    let mut groups = group_requests(rows);
    groups.sort_by(|a, b| b.votes.cmp(&a.votes));

    let mut view = QueueView::default();
    let mut ranked = Vec::new();
    let mut unranked = Vec::new();

    for group in groups {
        match group.status {
            SongStatus::Played => view.played.push(group),
            SongStatus::Rejected => view.rejected.push(group),
            SongStatus::Pending if group.manual_rank.is_some() => ranked.push(group),
            SongStatus::Pending => unranked.push(group),
        }
    }

    ranked.sort_by_key(|g| g.manual_rank);
    view.queue = ranked.into_iter().chain(unranked).collect();

    for (i, item) in view.queue.iter_mut().enumerate() {
        item.queue_position = Some(i as u32 + 1);
    }

    view
}

/// Turns a DJ-supplied order of pending groups into `(row id, rank)` pairs for every
/// row of every listed group. Groups left out fall back to vote order.
pub fn plan_manual_order(
    view: &QueueView,
    ordered_ids: &[Uuid],
) -> Result<Vec<(Uuid, i32)>, QueueOrderError> {
    let pending: HashMap<Uuid, &QueueItem> = view.queue.iter().map(|g| (g.id, g)).collect();
    let settled: HashSet<Uuid> = view
        .played
        .iter()
        .chain(view.rejected.iter())
        .map(|g| g.id)
        .collect();

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();

    for (rank, id) in ordered_ids.iter().enumerate() {
        if !seen.insert(*id) {
            return Err(QueueOrderError::DuplicateSong(*id));
        }
        let group = match pending.get(id) {
            Some(group) => group,
            None if settled.contains(id) => return Err(QueueOrderError::NotPending(*id)),
            None => return Err(QueueOrderError::UnknownSong(*id)),
        };
        for row_id in &group.request_ids {
            assignments.push((*row_id, rank as i32 + 1));
        }
    }

    Ok(assignments)
}
