use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::value_objects::user_metadata::UserMetadata;

/// A DJ account as stored by Supabase Auth. The service never owns this record;
/// it only reads it and patches `user_metadata` through the admin API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DjUserEntity {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    pub created_at: Option<DateTime<Utc>>,
}
