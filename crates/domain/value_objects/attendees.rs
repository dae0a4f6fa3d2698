use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::song_requests::SongRequestEntity;

pub const DEFAULT_REQUEST_LIMIT: i32 = 3;
pub const MAX_REQUEST_LIMIT: i32 = 50;

/// How many requests an attendee has used at one event.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RequestQuota {
    pub limit: i32,
    pub used: i32,
}

impl RequestQuota {
    pub fn new(limit: i32, used: i32) -> Self {
        Self { limit, used }
    }

    pub fn remaining(&self) -> i32 {
        (self.limit - self.used).max(0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VoteToggle {
    pub voted: bool,
    pub votes: i32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionOutcome {
    /// A new row was inserted.
    Created,
    /// The song already existed at this event and gained a vote instead.
    Voted,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionResult {
    pub outcome: SubmissionOutcome,
    pub song_request: SongRequestEntity,
    pub remaining: i32,
}

/// A request row as shown to one attendee.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttendeeSongRow {
    #[serde(flatten)]
    pub song_request: SongRequestEntity,
    pub voted: bool,
}

/// Orders rows by votes, most first, keeping creation order on ties.
pub fn attendee_rows(mut rows: Vec<SongRequestEntity>, voted_ids: &[Uuid]) -> Vec<AttendeeSongRow> {
    rows.sort_by(|a, b| b.votes.cmp(&a.votes));
    rows.into_iter()
        .map(|song_request| AttendeeSongRow {
            voted: voted_ids.contains(&song_request.id),
            song_request,
        })
        .collect()
}
