use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use emergency_sos::config::AppConfig;
use emergency_sos::db::{self, PgAlertStore};
use emergency_sos::facilities::{FacilityResolver, StaticDirectory};
use emergency_sos::location::{LocationProvider, StaticLocationProvider};
use emergency_sos::map_view::MapView;
use emergency_sos::models::{Coordinate, FacilityCategory};
use emergency_sos::routing::{OsrmClient, RoutePlanner};
use emergency_sos::sos::SosManager;
use emergency_sos::speech::{LogAnnouncer, Narrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Emergency SOS service...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let store = Arc::new(PgAlertStore::new(pool));
    let location: Arc<dyn LocationProvider> = Arc::new(StaticLocationProvider::new(
        config.share_latitude,
        config.share_longitude,
        30.0,
    ));
    let announcer = Arc::new(LogAnnouncer);

    let manager = SosManager::new(
        store,
        location.clone(),
        announcer.clone(),
        Duration::from_secs(config.rebroadcast_interval_secs),
        Duration::from_secs(config.location_timeout_secs),
        config.speech_lang.clone(),
    );

    let user = config
        .sos_user_id
        .context("SOS_USER_ID must be set to activate an emergency session")?;
    let alert = manager.start(Some(user)).await?;
    info!(alert_id = %alert.id, "Live location sharing active");

    // Map setup: follow the user, escalate while the SOS is active.
    let fix = location.request_once().await?;
    let mut map = MapView::new(fix.point(), 15);
    map.update_user(&fix);
    map.set_sos_active(true);

    // Route the user to the closest hospital in range.
    let resolver = FacilityResolver::new(Arc::new(StaticDirectory::bundled()));
    let nearby = resolver
        .resolve(&fix, config.nearby_radius_km, Some(FacilityCategory::Hospital))
        .await;
    if let Some(error) = &nearby.error {
        warn!("nearby facility lookup degraded: {error}");
    }

    if let Some(nearest) = nearby.facilities.first() {
        info!(
            name = %nearest.name,
            distance_km = nearest.distance_km.unwrap_or_default(),
            "routing to nearest hospital"
        );
        map.set_destination(nearest.point());

        let narrator = Narrator::new(
            announcer,
            config.speech_lang.clone(),
            Duration::from_millis(config.narration_step_delay_ms),
        );
        let planner = RoutePlanner::new(Arc::new(OsrmClient::new(&config.osrm_base_url)), narrator);
        let destination = Coordinate::new(nearest.latitude, nearest.longitude, 0.0);
        match planner.compute_route(fix, destination).await {
            Ok(Some(route)) => {
                map.install_route(&route);
                info!(
                    distance_m = route.total_distance_m,
                    duration_s = route.total_duration_s,
                    steps = route.instructions.len(),
                    "route installed"
                );
            }
            Ok(None) => {}
            Err(e) => {
                map.clear_route();
                warn!("route unavailable, showing markers only: {e}");
            }
        }

        tokio::signal::ctrl_c().await?;
        planner.cancel_narration();
    } else {
        warn!("no hospital within {} km", config.nearby_radius_km);
        tokio::signal::ctrl_c().await?;
    }

    manager.stop().await?;
    info!("SOS session resolved. Shutting down.");
    Ok(())
}
