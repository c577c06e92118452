use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_RESOLVED: &str = "resolved";

/// Persisted SOS event. At most one `active` row per user at a time;
/// re-broadcast ticks mutate the location fields and `updated_at`.
#[derive(Debug, Clone, FromRow)]
pub struct EmergencyAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String, // Enum in DB, map to String
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmergencyAlert {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}
