//! SOS session manager: activation, periodic live-location re-broadcast,
//! and deactivation of the persisted emergency alert.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::AlertStore;
use crate::error::{LocationError, SosError};
use crate::location::LocationProvider;
use crate::models::{Coordinate, EmergencyAlert};
use crate::speech::SpeechAnnouncer;

const ACTIVATION_MESSAGE: &str = "Emergency SOS activated. Sharing your live location.";
const DEACTIVATION_MESSAGE: &str = "Emergency SOS deactivated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosState {
    Idle,
    Activating,
    Active,
    Deactivating,
}

struct SessionInner {
    state: SosState,
    user_id: Option<Uuid>,
    alert_id: Option<Uuid>,
    rebroadcast: Option<JoinHandle<()>>,
}

/// One SOS session per manager. At most one re-broadcast task runs at any
/// time; starting a new SOS while one is active stops the old one first.
pub struct SosManager {
    store: Arc<dyn AlertStore>,
    location: Arc<dyn LocationProvider>,
    announcer: Arc<dyn SpeechAnnouncer>,
    rebroadcast_interval: Duration,
    location_timeout: Duration,
    lang: String,
    inner: Mutex<SessionInner>,
}

/// Fresh fix with an upper bound on how long the provider may take.
async fn fresh_fix(
    location: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinate, LocationError> {
    match tokio::time::timeout(timeout, location.request_once()).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    }
}

impl SosManager {
    pub fn new(
        store: Arc<dyn AlertStore>,
        location: Arc<dyn LocationProvider>,
        announcer: Arc<dyn SpeechAnnouncer>,
        rebroadcast_interval: Duration,
        location_timeout: Duration,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            store,
            location,
            announcer,
            rebroadcast_interval,
            location_timeout,
            lang: lang.into(),
            inner: Mutex::new(SessionInner {
                state: SosState::Idle,
                user_id: None,
                alert_id: None,
                rebroadcast: None,
            }),
        }
    }

    pub async fn state(&self) -> SosState {
        self.inner.lock().await.state
    }

    /// Alert owned by the current session, if one is active.
    pub async fn active_alert_id(&self) -> Option<Uuid> {
        self.inner.lock().await.alert_id
    }

    /// Activates the SOS: fresh fix, create-or-reuse the user's active
    /// alert, announce, and start the periodic re-broadcast.
    pub async fn start(&self, user: Option<Uuid>) -> Result<EmergencyAlert, SosError> {
        let user_id = user.ok_or(SosError::Unauthenticated)?;
        let mut inner = self.inner.lock().await;

        if inner.state == SosState::Active {
            // No leaked timers: the existing session goes down first.
            self.deactivate(&mut inner).await?;
        }
        inner.state = SosState::Activating;

        let fix = match fresh_fix(self.location.as_ref(), self.location_timeout).await {
            Ok(fix) => fix,
            Err(e) => {
                inner.state = SosState::Idle;
                return Err(SosError::LocationUnavailable(e));
            }
        };

        let alert = match self.store.upsert_active(user_id, &fix).await {
            Ok(alert) => alert,
            Err(e) => {
                inner.state = SosState::Idle;
                return Err(SosError::Persistence(e));
            }
        };

        info!(alert_id = %alert.id, user_id = %user_id, "SOS activated");
        self.announcer.speak(ACTIVATION_MESSAGE, &self.lang).await;

        inner.user_id = Some(user_id);
        inner.alert_id = Some(alert.id);
        inner.rebroadcast = Some(self.spawn_rebroadcast(alert.id));
        inner.state = SosState::Active;
        Ok(alert)
    }

    /// Deactivates the SOS. Calling `stop` while already idle is a no-op
    /// and touches neither the store nor the announcer.
    pub async fn stop(&self) -> Result<(), SosError> {
        let mut inner = self.inner.lock().await;
        if inner.state == SosState::Idle {
            return Ok(());
        }
        self.deactivate(&mut inner).await
    }

    async fn deactivate(&self, inner: &mut MutexGuard<'_, SessionInner>) -> Result<(), SosError> {
        inner.state = SosState::Deactivating;
        if let Some(task) = inner.rebroadcast.take() {
            task.abort();
        }
        inner.alert_id = None;

        let resolved = match inner.user_id.take() {
            Some(user_id) => self.store.resolve_active(user_id).await,
            None => Ok(()),
        };
        inner.state = SosState::Idle;
        resolved?;

        self.announcer.speak(DEACTIVATION_MESSAGE, &self.lang).await;
        info!("SOS deactivated");
        Ok(())
    }

    fn spawn_rebroadcast(&self, alert_id: Uuid) -> JoinHandle<()> {
        let store = self.store.clone();
        let location = self.location.clone();
        let interval = self.rebroadcast_interval;
        let timeout = self.location_timeout;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Each write completes before the next tick is taken, so at most
            // one re-broadcast is ever in flight.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Activation already wrote the first fix.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let fix = match fresh_fix(location.as_ref(), timeout).await {
                    Ok(fix) => fix,
                    Err(e) => {
                        warn!("live location update skipped: {e}");
                        continue;
                    }
                };
                if let Err(e) = store.update_location(alert_id, &fix).await {
                    // Transient write failure never tears down the session;
                    // the next tick retries independently.
                    warn!("failed to re-broadcast location: {e}");
                }
            }
        })
    }
}

impl Drop for SosManager {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(task) = inner.rebroadcast.take() {
            task.abort();
        }
    }
}
