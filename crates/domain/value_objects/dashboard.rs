use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Number of entries in each top-requests list.
pub const TOP_REQUESTS_LIMIT: i64 = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventRequestCount {
    pub event_id: Uuid,
    pub event_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub total_requests: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopRequest {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub votes: i32,
    pub event_id: Uuid,
    pub event_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub active_events: i64,
    pub total_requests: i64,
    pub requests_by_event: Vec<EventRequestCount>,
    pub top_requests_all_djs: Vec<TopRequest>,
    pub top_requests_my_events: Vec<TopRequest>,
}
