use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::notifications::NotificationEntity,
    repositories::notifications::NotificationRepository,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NotificationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NotificationError::NotFound => StatusCode::NOT_FOUND,
            NotificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            NotificationError::NotFound => "NOTIFICATION_NOT_FOUND",
            NotificationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationListDto {
    pub notifications: Vec<NotificationEntity>,
    pub unread: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MarkAllReadDto {
    pub updated: usize,
}

pub struct NotificationUseCase {
    notifications: Arc<dyn NotificationRepository + Send + Sync>,
}

impl NotificationUseCase {
    pub fn new(notifications: Arc<dyn NotificationRepository + Send + Sync>) -> Self {
        Self { notifications }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<NotificationListDto, NotificationError> {
        let notifications = self
            .notifications
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "notifications: failed to list");
                NotificationError::Internal(err)
            })?;
        let unread = notifications.iter().filter(|n| !n.read).count();
        Ok(NotificationListDto {
            notifications,
            unread,
        })
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), NotificationError> {
        let found = self
            .notifications
            .mark_read(user_id, notification_id)
            .await
            .map_err(|err| {
                error!(%user_id, %notification_id, db_error = ?err, "notifications: failed to mark read");
                NotificationError::Internal(err)
            })?;

        if !found {
            let err = NotificationError::NotFound;
            warn!(
                %user_id,
                %notification_id,
                status = err.status_code().as_u16(),
                "notifications: nothing to mark"
            );
            return Err(err);
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<MarkAllReadDto, NotificationError> {
        let updated = self
            .notifications
            .mark_all_read(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "notifications: failed to mark all read");
                NotificationError::Internal(err)
            })?;
        info!(%user_id, updated, "notifications: marked all read");
        Ok(MarkAllReadDto { updated })
    }
}
