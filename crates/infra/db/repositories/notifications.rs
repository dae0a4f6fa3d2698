use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::notifications},
};
use domain::{
    entities::notifications::{InsertNotificationEntity, NotificationEntity},
    repositories::notifications::NotificationRepository,
};

pub struct NotificationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationPostgres {
    async fn create(&self, notification: InsertNotificationEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(notifications::table)
            .values(&notification)
            .returning(notifications::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<NotificationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .select(NotificationEntity::as_select())
            .load::<NotificationEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(notifications::table.find(notification_id))
            .filter(notifications::user_id.eq(user_id))
            .set(notifications::read.eq(true))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(notifications::table)
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::read.eq(false))
            .set(notifications::read.eq(true))
            .execute(&mut conn)?;

        Ok(updated)
    }
}
