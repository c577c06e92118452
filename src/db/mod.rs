use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Coordinate, EmergencyAlert};

pub mod memory;
pub mod queries;

pub use memory::MemoryAlertStore;

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Persistence seam for emergency alerts. The one invariant every
/// implementation upholds: at most one `active` alert per user.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn active_alert(&self, user_id: Uuid) -> Result<Option<EmergencyAlert>, StoreError>;

    /// Creates the user's active alert, or refreshes the coordinates of the
    /// existing one. Never inserts a second active row.
    async fn upsert_active(
        &self,
        user_id: Uuid,
        location: &Coordinate,
    ) -> Result<EmergencyAlert, StoreError>;

    async fn update_location(
        &self,
        alert_id: Uuid,
        location: &Coordinate,
    ) -> Result<(), StoreError>;

    /// Marks every active alert of the user as resolved.
    async fn resolve_active(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// Postgres-backed alert store.
pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn active_alert(&self, user_id: Uuid) -> Result<Option<EmergencyAlert>, StoreError> {
        let alert = sqlx::query_as::<_, EmergencyAlert>(queries::SELECT_ACTIVE_ALERT)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(alert)
    }

    async fn upsert_active(
        &self,
        user_id: Uuid,
        location: &Coordinate,
    ) -> Result<EmergencyAlert, StoreError> {
        // Lock the active row so concurrent activations cannot both insert.
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, EmergencyAlert>(queries::SELECT_ACTIVE_ALERT_FOR_UPDATE)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let alert_id = match existing {
            Some(alert) => {
                sqlx::query(queries::UPDATE_ALERT_LOCATION)
                    .bind(alert.id)
                    .bind(location.latitude)
                    .bind(location.longitude)
                    .execute(&mut *tx)
                    .await?;
                alert.id
            }
            None => {
                let alert_id = Uuid::new_v4();
                sqlx::query(queries::INSERT_ALERT)
                    .bind(alert_id)
                    .bind(user_id)
                    .bind(location.latitude)
                    .bind(location.longitude)
                    .execute(&mut *tx)
                    .await?;
                alert_id
            }
        };

        let alert = sqlx::query_as::<_, EmergencyAlert>(queries::SELECT_ALERT_BY_ID)
            .bind(alert_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(alert)
    }

    async fn update_location(
        &self,
        alert_id: Uuid,
        location: &Coordinate,
    ) -> Result<(), StoreError> {
        sqlx::query(queries::UPDATE_ALERT_LOCATION)
            .bind(alert_id)
            .bind(location.latitude)
            .bind(location.longitude)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn resolve_active(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(queries::RESOLVE_ACTIVE_ALERTS)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
