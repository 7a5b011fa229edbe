use chrono::{DateTime, Utc};
use dispatch::{Candidate, Coordinates};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Role granting eligibility for site-visit assignment.
pub const DATA_COLLECTOR_ROLE: &str = "data_collector";

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    Online,
    #[default]
    Offline,
}

/// A field worker's profile. Home state/locality/hub drive the match tiers;
/// coordinates come from the worker's last reported device location.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CollectorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub home_state: Option<String>,
    pub home_locality: Option<String>,
    pub home_hub: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub availability: Availability,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCollectorProfile {
    pub full_name: String,
    pub home_state: Option<String>,
    pub home_locality: Option<String>,
    pub home_hub: Option<String>,
}

const SELECT_COLS: &str = "id, full_name, home_state, home_locality, home_hub, latitude, \
     longitude, availability, created_at, updated_at";

impl CollectorProfile {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id,
            home_state: self.home_state.clone(),
            home_locality: self.home_locality.clone(),
            home_hub: self.home_hub.clone(),
            coordinates: self.coordinates(),
        }
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateCollectorProfile,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO collector_profiles (id, full_name, home_state, home_locality, home_hub) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLS}"
        );
        sqlx::query_as::<_, CollectorProfile>(&sql)
            .bind(id)
            .bind(&data.full_name)
            .bind(&data.home_state)
            .bind(&data.home_locality)
            .bind(&data.home_hub)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLS} FROM collector_profiles WHERE id = $1");
        sqlx::query_as::<_, CollectorProfile>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Profiles holding the data-collector role. This is the caller-side
    /// role filter the resolver expects; availability is intentionally not
    /// filtered here.
    pub async fn find_data_collectors(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = "SELECT p.id, p.full_name, p.home_state, p.home_locality, p.home_hub, \
                   p.latitude, p.longitude, p.availability, p.created_at, p.updated_at \
             FROM collector_profiles p \
             JOIN collector_roles r ON r.user_id = p.id \
             WHERE r.role = $1 \
             ORDER BY p.created_at ASC";
        sqlx::query_as::<_, CollectorProfile>(sql)
            .bind(DATA_COLLECTOR_ROLE)
            .fetch_all(pool)
            .await
    }

    pub async fn grant_role(pool: &SqlitePool, user_id: Uuid, role: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO collector_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update_location(
        pool: &SqlitePool,
        id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE collector_profiles \
             SET latitude = $2, longitude = $3, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_availability(
        pool: &SqlitePool,
        id: Uuid,
        availability: Availability,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE collector_profiles \
             SET availability = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1",
        )
        .bind(id)
        .bind(availability)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    async fn seed_collector(db: &DBService, name: &str, grant: bool) -> CollectorProfile {
        let id = Uuid::new_v4();
        let profile = CollectorProfile::create(
            &db.pool,
            &CreateCollectorProfile {
                full_name: name.to_string(),
                home_state: Some("Khartoum".to_string()),
                home_locality: Some("Bahri".to_string()),
                home_hub: None,
            },
            id,
        )
        .await
        .unwrap();
        if grant {
            CollectorProfile::grant_role(&db.pool, id, DATA_COLLECTOR_ROLE)
                .await
                .unwrap();
        }
        profile
    }

    #[tokio::test]
    async fn find_data_collectors_filters_by_role() {
        let db = DBService::new_in_memory().await.unwrap();
        let eligible = seed_collector(&db, "Amal", true).await;
        seed_collector(&db, "No Role", false).await;

        let collectors = CollectorProfile::find_data_collectors(&db.pool)
            .await
            .unwrap();
        assert_eq!(collectors.len(), 1);
        assert_eq!(collectors[0].id, eligible.id);
    }

    #[tokio::test]
    async fn location_update_round_trips_into_candidate() {
        let db = DBService::new_in_memory().await.unwrap();
        let profile = seed_collector(&db, "Amal", true).await;
        assert!(profile.coordinates().is_none());

        CollectorProfile::update_location(&db.pool, profile.id, 15.6, 32.5)
            .await
            .unwrap();

        let stored = CollectorProfile::find_by_id(&db.pool, profile.id)
            .await
            .unwrap()
            .unwrap();
        let candidate = stored.to_candidate();
        assert_eq!(candidate.coordinates, Some(Coordinates::new(15.6, 32.5)));
        assert_eq!(candidate.home_state.as_deref(), Some("Khartoum"));
    }
}
