//! In-memory alert store for unit tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use super::AlertStore;
use crate::error::StoreError;
use crate::models::{Coordinate, EmergencyAlert, STATUS_ACTIVE, STATUS_RESOLVED};

#[derive(Clone, Default)]
pub struct MemoryAlertStore {
    alerts: Arc<Mutex<Vec<EmergencyAlert>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored alert, in insertion order.
    pub fn all(&self) -> Vec<EmergencyAlert> {
        self.alerts.lock().clone()
    }

    /// Seeds a pre-existing alert row.
    pub fn insert(&self, alert: EmergencyAlert) {
        self.alerts.lock().push(alert);
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn active_alert(&self, user_id: Uuid) -> Result<Option<EmergencyAlert>, StoreError> {
        let alerts = self.alerts.lock();
        Ok(alerts
            .iter()
            .find(|a| a.user_id == user_id && a.is_active())
            .cloned())
    }

    async fn upsert_active(
        &self,
        user_id: Uuid,
        location: &Coordinate,
    ) -> Result<EmergencyAlert, StoreError> {
        let mut alerts = self.alerts.lock();
        if let Some(alert) = alerts
            .iter_mut()
            .find(|a| a.user_id == user_id && a.is_active())
        {
            alert.latitude = location.latitude;
            alert.longitude = location.longitude;
            alert.updated_at = Utc::now();
            return Ok(alert.clone());
        }

        let now = Utc::now();
        let alert = EmergencyAlert {
            id: Uuid::new_v4(),
            user_id,
            latitude: location.latitude,
            longitude: location.longitude,
            status: STATUS_ACTIVE.to_string(),
            created_at: now,
            updated_at: now,
        };
        alerts.push(alert.clone());
        Ok(alert)
    }

    async fn update_location(
        &self,
        alert_id: Uuid,
        location: &Coordinate,
    ) -> Result<(), StoreError> {
        let mut alerts = self.alerts.lock();
        if let Some(alert) = alerts.iter_mut().find(|a| a.id == alert_id && a.is_active()) {
            alert.latitude = location.latitude;
            alert.longitude = location.longitude;
            alert.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn resolve_active(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut alerts = self.alerts.lock();
        for alert in alerts
            .iter_mut()
            .filter(|a| a.user_id == user_id && a.is_active())
        {
            alert.status = STATUS_RESOLVED.to_string();
            alert.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon, 10.0)
    }

    #[tokio::test]
    async fn upsert_reuses_the_active_row() {
        let store = MemoryAlertStore::new();
        let user = Uuid::new_v4();

        let first = store.upsert_active(user, &fix(40.71, -74.00)).await.unwrap();
        let second = store.upsert_active(user, &fix(40.72, -74.01)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.all().len(), 1);
        assert_eq!(second.latitude, 40.72);
    }

    #[tokio::test]
    async fn resolve_then_activate_creates_a_new_row() {
        let store = MemoryAlertStore::new();
        let user = Uuid::new_v4();

        let first = store.upsert_active(user, &fix(40.71, -74.00)).await.unwrap();
        store.resolve_active(user).await.unwrap();
        let second = store.upsert_active(user, &fix(40.73, -74.02)).await.unwrap();

        assert_ne!(first.id, second.id);
        let rows = store.all();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, STATUS_RESOLVED);
        assert_eq!(rows[1].status, STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn update_location_ignores_resolved_rows() {
        let store = MemoryAlertStore::new();
        let user = Uuid::new_v4();

        let alert = store.upsert_active(user, &fix(40.71, -74.00)).await.unwrap();
        store.resolve_active(user).await.unwrap();
        store
            .update_location(alert.id, &fix(41.00, -75.00))
            .await
            .unwrap();

        assert_eq!(store.all()[0].latitude, 40.71);
    }
}
