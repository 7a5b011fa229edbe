use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// In-app notification persisted for a user. Delivery (push, realtime) is a
/// separate concern and out of scope here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub link: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub related_entity_type: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub link: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub related_entity_type: Option<String>,
}

const SELECT_COLS: &str = "id, user_id, title, message, notification_type, link, \
     related_entity_id, related_entity_type, read, created_at";

impl Notification {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateNotification,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO notifications \
                 (id, user_id, title, message, notification_type, link, related_entity_id, related_entity_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SELECT_COLS}"
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.user_id)
            .bind(&data.title)
            .bind(&data.message)
            .bind(&data.notification_type)
            .bind(&data.link)
            .bind(data.related_entity_id)
            .bind(&data.related_entity_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_unread_by_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM notifications \
             WHERE user_id = $1 AND read = 0 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_read(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
