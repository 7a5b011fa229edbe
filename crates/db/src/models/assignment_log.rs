use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Outcome recorded for one assignment attempt.
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentAction {
    Assigned,
    Skipped,
    Reverted,
    Error,
}

/// Audit trail for automatic and manual assignment decisions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct AssignmentLog {
    pub id: Uuid,
    pub site_visit_id: Uuid,
    pub collector_id: Option<Uuid>,
    pub action: AssignmentAction,
    pub tier: Option<String>,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SELECT_COLS: &str =
    "id, site_visit_id, collector_id, action, tier, reasoning, created_at";

impl AssignmentLog {
    pub async fn create(
        pool: &SqlitePool,
        site_visit_id: Uuid,
        collector_id: Option<Uuid>,
        action: AssignmentAction,
        tier: Option<String>,
        reasoning: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO assignment_logs (id, site_visit_id, collector_id, action, tier, reasoning) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SELECT_COLS}"
        );
        sqlx::query_as::<_, AssignmentLog>(&sql)
            .bind(Uuid::new_v4())
            .bind(site_visit_id)
            .bind(collector_id)
            .bind(action)
            .bind(tier)
            .bind(reasoning)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_site_visit_id(
        pool: &SqlitePool,
        site_visit_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM assignment_logs \
             WHERE site_visit_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, AssignmentLog>(&sql)
            .bind(site_visit_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM assignment_logs \
             ORDER BY created_at DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, AssignmentLog>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
