use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dispatch::{Coordinates, VisitTarget};
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
pub enum VisitStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    PermitVerified,
}

/// A site visit: the unit of assignable field work.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SiteVisit {
    pub id: Uuid,
    pub site_name: String,
    pub state: String,
    pub locality: String,
    pub hub: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fee_total: f64,
    pub fee_currency: String,
    pub status: VisitStatus,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSiteVisit {
    pub site_name: String,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub hub: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fee_total: Option<f64>,
    pub fee_currency: Option<String>,
}

const SELECT_COLS: &str = "id, site_name, state, locality, hub, latitude, longitude, fee_total, \
     fee_currency, status, assigned_to, assigned_by, assigned_at, created_at, updated_at";

impl SiteVisit {
    /// Coordinates as reported at creation; validity is the resolver's call.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Projection handed to the assignment resolver.
    pub fn target(&self) -> VisitTarget {
        VisitTarget {
            state: self.state.clone(),
            locality: self.locality.clone(),
            hub: self.hub.clone(),
            coordinates: self.coordinates(),
        }
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateSiteVisit,
        visit_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO site_visits (id, site_name, state, locality, hub, latitude, longitude, fee_total, fee_currency) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SELECT_COLS}"
        );
        sqlx::query_as::<_, SiteVisit>(&sql)
            .bind(visit_id)
            .bind(&data.site_name)
            .bind(data.state.as_deref().unwrap_or(""))
            .bind(data.locality.as_deref().unwrap_or(""))
            .bind(data.hub.as_deref().unwrap_or(""))
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(data.fee_total.unwrap_or(0.0))
            .bind(data.fee_currency.as_deref().unwrap_or("SDG"))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLS} FROM site_visits WHERE id = $1");
        sqlx::query_as::<_, SiteVisit>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLS} FROM site_visits ORDER BY created_at DESC");
        sqlx::query_as::<_, SiteVisit>(&sql).fetch_all(pool).await
    }

    pub async fn find_unassigned_pending(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM site_visits \
             WHERE status = 'pending' AND assigned_to IS NULL \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, SiteVisit>(&sql).fetch_all(pool).await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: VisitStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE site_visits SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Compare-and-swap assignment: only a still-pending visit can be
    /// claimed, so two concurrent resolutions cannot both win. Returns
    /// `false` when a concurrent writer got there first.
    pub async fn try_assign(
        pool: &SqlitePool,
        id: Uuid,
        collector_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE site_visits \
             SET status = 'assigned', assigned_to = $2, assigned_by = $3, \
                 assigned_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(collector_id)
        .bind(assigned_by)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revert an assigned visit to pending (confirmation deadline expired).
    /// Guarded the same way as `try_assign`.
    pub async fn unassign(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE site_visits \
             SET status = 'pending', assigned_to = NULL, assigned_by = NULL, \
                 assigned_at = NULL, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND status = 'assigned'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active-assignment count per collector, for workload ranking.
    pub async fn active_counts_by_assignee(
        pool: &SqlitePool,
    ) -> Result<HashMap<Uuid, u32>, sqlx::Error> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT assigned_to, COUNT(*) FROM site_visits \
             WHERE assigned_to IS NOT NULL AND status IN ('assigned', 'in_progress') \
             GROUP BY assigned_to",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id, n)| (id, n as u32)).collect())
    }

    /// Visits stuck in `assigned` longer than the confirmation deadline.
    pub async fn find_stalled_assigned(
        pool: &SqlitePool,
        timeout_minutes: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let cutoff = format!("-{timeout_minutes} minutes");
        let sql = format!(
            "SELECT {SELECT_COLS} FROM site_visits \
             WHERE status = 'assigned' \
               AND assigned_at IS NOT NULL \
               AND datetime(assigned_at) < datetime('now', $1) \
             ORDER BY assigned_at ASC"
        );
        sqlx::query_as::<_, SiteVisit>(&sql)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
