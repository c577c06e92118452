use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub osrm_base_url: String,
    pub nearby_radius_km: f64,
    pub rebroadcast_interval_secs: u64,
    pub narration_step_delay_ms: u64,
    pub location_timeout_secs: u64,
    pub speech_lang: String,
    /// User the service shares a live location for.
    pub sos_user_id: Option<Uuid>,
    /// Position reported when no device GPS is attached.
    pub share_latitude: f64,
    pub share_longitude: f64,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let osrm_base_url = env::var("OSRM_BASE_URL")
            .unwrap_or_else(|_| "https://router.project-osrm.org/route/v1".to_string());
        let nearby_radius_km = env::var("NEARBY_RADIUS_KM")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5.0);
        let rebroadcast_interval_secs = env::var("SOS_REBROADCAST_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);
        let narration_step_delay_ms = env::var("NARRATION_STEP_DELAY_MS")
            .unwrap_or_else(|_| "3500".to_string())
            .parse()
            .unwrap_or(3500);
        let location_timeout_secs = env::var("LOCATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let speech_lang = env::var("SPEECH_LANG").unwrap_or_else(|_| "en-US".to_string());
        let sos_user_id = env::var("SOS_USER_ID")
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok());
        let share_latitude = env::var("SHARE_LATITUDE")
            .unwrap_or_else(|_| "40.7128".to_string())
            .parse()
            .unwrap_or(40.7128);
        let share_longitude = env::var("SHARE_LONGITUDE")
            .unwrap_or_else(|_| "-74.0060".to_string())
            .parse()
            .unwrap_or(-74.0060);

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "healthpoint".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "healthpoint".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "healthpoint".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            osrm_base_url,
            nearby_radius_km,
            rebroadcast_interval_secs,
            narration_step_delay_ms,
            location_timeout_secs,
            speech_lang,
            sos_user_id,
            share_latitude,
            share_longitude,
            log_level,
        })
    }
}
