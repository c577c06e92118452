//! Device geolocation seam: one-shot fixes and cancellable continuous watches.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::LocationError;
use crate::models::Coordinate;

/// Callback invoked for every delivered fix while a watch is live.
pub type WatchSink = Box<dyn Fn(Coordinate) + Send + Sync>;

/// Subscription to a continuous watch. `cancel` is idempotent and safe after
/// natural completion; a cancelled watch never delivers another update.
/// Dropping the handle cancels the watch, so it cannot outlive its owner.
pub struct WatchHandle {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn new(active: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self {
            active,
            task: Some(task),
        }
    }

    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Device geolocation collaborator.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Single-shot fresh fix; cached results are never accepted.
    async fn request_once(&self) -> Result<Coordinate, LocationError>;

    /// Continuous observation at the provider's native update rate.
    /// The caller must cancel the returned handle when done.
    fn watch(&self, on_update: WatchSink) -> WatchHandle;
}

/// Fixed-position provider for headless deployments where no device GPS is
/// attached (the service shares a configured location instead).
pub struct StaticLocationProvider {
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
    update_interval: Duration,
}

impl StaticLocationProvider {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            update_interval: Duration::from_secs(5),
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn request_once(&self) -> Result<Coordinate, LocationError> {
        Ok(Coordinate::new(self.latitude, self.longitude, self.accuracy_m))
    }

    fn watch(&self, on_update: WatchSink) -> WatchHandle {
        let active = Arc::new(AtomicBool::new(true));
        let gate = active.clone();
        let (latitude, longitude, accuracy_m) = (self.latitude, self.longitude, self.accuracy_m);
        let interval = self.update_interval;
        let task = tokio::spawn(async move {
            loop {
                if !gate.load(Ordering::SeqCst) {
                    break;
                }
                on_update(Coordinate::new(latitude, longitude, accuracy_m));
                tokio::time::sleep(interval).await;
            }
        });
        WatchHandle::new(active, task)
    }
}
