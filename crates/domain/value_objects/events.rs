use serde::{Deserialize, Serialize};

use crate::domain::entities::events::EventEntity;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventModel {
    pub name: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub request_limit: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetEventActiveModel {
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSettingsModel {
    pub request_limit: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventWithCount {
    #[serde(flatten)]
    pub event: EventEntity,
    pub request_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventListDto {
    pub events: Vec<EventWithCount>,
    pub total: usize,
    pub active: usize,
    pub ended: usize,
}

impl EventListDto {
    pub fn new(events: Vec<EventWithCount>) -> Self {
        let active = events.iter().filter(|e| e.event.active).count();
        Self {
            total: events.len(),
            active,
            ended: events.len() - active,
            events,
        }
    }
}
