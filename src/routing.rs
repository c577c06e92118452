//! Driving-route computation against an external routing engine, with
//! narrated turn-by-turn guidance.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::RouteError;
use crate::models::{Coordinate, Point, Route, RouteInstruction};
use crate::speech::Narrator;

/// Routing collaborator: origin/destination in, full route out. Best-effort;
/// callers must tolerate `Unavailable`.
#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Route, RouteError>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: longitude first.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

fn instruction_text(step: &OsrmStep) -> String {
    let name = step.name.trim();
    let modifier = step.maneuver.modifier.as_deref();
    match step.maneuver.kind.as_str() {
        "depart" => {
            if name.is_empty() {
                "Head out".to_string()
            } else {
                format!("Head out on {name}")
            }
        }
        "arrive" => "You have arrived at your destination".to_string(),
        "turn" | "end of road" | "fork" => {
            let direction = modifier.unwrap_or("ahead");
            if name.is_empty() {
                format!("Turn {direction}")
            } else {
                format!("Turn {direction} onto {name}")
            }
        }
        "roundabout" | "rotary" => {
            if name.is_empty() {
                "Take the roundabout".to_string()
            } else {
                format!("Take the roundabout onto {name}")
            }
        }
        "merge" => {
            if name.is_empty() {
                "Merge".to_string()
            } else {
                format!("Merge onto {name}")
            }
        }
        "on ramp" => "Take the ramp".to_string(),
        "off ramp" => "Take the exit".to_string(),
        _ => {
            if name.is_empty() {
                "Continue ahead".to_string()
            } else {
                format!("Continue on {name}")
            }
        }
    }
}

fn build_route(
    origin: Coordinate,
    destination: Coordinate,
    body: OsrmResponse,
) -> Result<Route, RouteError> {
    if body.code != "Ok" {
        return Err(RouteError::Unavailable(format!(
            "no route found ({})",
            body.code
        )));
    }
    let osrm = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::Unavailable("empty route set".to_string()))?;

    let geometry = osrm
        .geometry
        .coordinates
        .iter()
        .map(|&[longitude, latitude]| Point {
            latitude,
            longitude,
        })
        .collect();
    let instructions = osrm
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| RouteInstruction {
            text: instruction_text(step),
        })
        .collect();

    Ok(Route {
        waypoints: [origin, destination],
        geometry,
        total_distance_m: osrm.distance,
        total_duration_s: osrm.duration,
        instructions,
    })
}

/// OSRM v1 HTTP client, driving profile.
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RoutingService for OsrmClient {
    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Route, RouteError> {
        let url = format!(
            "{}/driving/{:.6},{:.6};{:.6},{:.6}",
            self.base_url,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "true"),
            ])
            .send()
            .await
            .map_err(|e| RouteError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RouteError::Unavailable(format!(
                "HTTP {} from routing service",
                response.status()
            )));
        }
        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| RouteError::Unavailable(e.to_string()))?;

        build_route(*origin, *destination, body)
    }
}

/// Coordinates route requests for one session. Only the most recently
/// requested route is authoritative: a response that arrives after a newer
/// request has started is discarded, and narration always belongs to the
/// latest route.
pub struct RoutePlanner {
    service: Arc<dyn RoutingService>,
    narrator: Narrator,
    generation: AtomicU64,
}

impl RoutePlanner {
    pub fn new(service: Arc<dyn RoutingService>, narrator: Narrator) -> Self {
        Self {
            service,
            narrator,
            generation: AtomicU64::new(0),
        }
    }

    /// Computes a driving route and starts narrating its instructions.
    /// Returns `Ok(None)` when this request was superseded while in flight.
    pub async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<Route>, RouteError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.narrator.cancel();

        let result = self.service.route(&origin, &destination).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer request started while this one was in flight.
            return Ok(None);
        }

        let route = result?;
        info!(
            distance_m = route.total_distance_m,
            duration_s = route.total_duration_s,
            "route computed"
        );
        self.narrator.narrate(&route.instructions);
        Ok(Some(route))
    }

    /// Stops any guidance in progress (route teardown, session end).
    pub fn cancel_narration(&self) {
        self.narrator.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::SpeechAnnouncer;
    use parking_lot::Mutex;
    use std::time::Duration;

    const OSRM_FIXTURE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 5420.3,
            "duration": 780.5,
            "geometry": {
                "type": "LineString",
                "coordinates": [[-74.0060, 40.7128], [-73.9900, 40.7300], [-73.9680, 40.7489]]
            },
            "legs": [{
                "steps": [
                    {"name": "Broadway", "maneuver": {"type": "depart"}},
                    {"name": "E 42nd Street", "maneuver": {"type": "turn", "modifier": "right"}},
                    {"name": "", "maneuver": {"type": "arrive"}}
                ]
            }]
        }]
    }"#;

    fn origin() -> Coordinate {
        Coordinate::new(40.7128, -74.0060, 10.0)
    }

    fn destination() -> Coordinate {
        Coordinate::new(40.7489, -73.9680, 10.0)
    }

    #[test]
    fn parses_osrm_response_into_route() {
        // One fix per endpoint: every `Coordinate::new` stamps a fresh
        // capture time, and waypoint equality includes it.
        let origin = origin();
        let destination = destination();
        let body: OsrmResponse = serde_json::from_str(OSRM_FIXTURE).unwrap();
        let route = build_route(origin, destination, body).unwrap();

        assert_eq!(route.waypoints, [origin, destination]);
        assert!(route.total_distance_m >= 0.0);
        assert!(route.total_duration_s >= 0.0);
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0].latitude, 40.7128);
        assert_eq!(route.instructions[0].text, "Head out on Broadway");
        assert_eq!(route.instructions[1].text, "Turn right onto E 42nd Street");
        assert_eq!(
            route.instructions[2].text,
            "You have arrived at your destination"
        );
    }

    #[test]
    fn non_ok_code_is_route_unavailable() {
        let body: OsrmResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "routes": []}"#).unwrap();
        let err = build_route(origin(), destination(), body).unwrap_err();
        assert!(matches!(err, RouteError::Unavailable(_)));
    }

    #[derive(Default)]
    struct RecordingAnnouncer {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechAnnouncer for RecordingAnnouncer {
        async fn speak(&self, text: &str, _lang: &str) {
            self.spoken.lock().push(text.to_string());
        }

        fn cancel_all(&self) {}
    }

    /// Service whose first request stalls long enough to be superseded.
    struct StallingService {
        calls: AtomicU64,
    }

    impl StallingService {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
            }
        }

        fn make_route(origin: &Coordinate, destination: &Coordinate, label: &str) -> Route {
            Route {
                waypoints: [*origin, *destination],
                geometry: vec![origin.point(), destination.point()],
                total_distance_m: 1000.0,
                total_duration_s: 120.0,
                instructions: vec![RouteInstruction {
                    text: format!("Continue on {label}"),
                }],
            }
        }
    }

    #[async_trait]
    impl RoutingService for StallingService {
        async fn route(
            &self,
            origin: &Coordinate,
            destination: &Coordinate,
        ) -> Result<Route, RouteError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Self::make_route(origin, destination, "stale road"))
            } else {
                Ok(Self::make_route(origin, destination, "fresh road"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_route_response_is_discarded() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let narrator = Narrator::new(announcer.clone(), "en-US", Duration::from_millis(3500));
        let planner = Arc::new(RoutePlanner::new(Arc::new(StallingService::new()), narrator));

        let first = tokio::spawn({
            let planner = planner.clone();
            async move { planner.compute_route(origin(), destination()).await }
        });
        // Let the first request start and park on the slow service call.
        tokio::task::yield_now().await;

        let second_destination = Coordinate::new(40.7580, -73.9855, 10.0);
        let fresh = planner
            .compute_route(origin(), second_destination)
            .await
            .unwrap()
            .expect("latest route must be installed");
        assert_eq!(fresh.waypoints[1], second_destination);

        // The stalled response arrives afterwards and must be discarded.
        tokio::time::advance(Duration::from_secs(60)).await;
        let stale = first.await.unwrap().unwrap();
        assert!(stale.is_none());

        // Narration belongs to the latest route only.
        tokio::task::yield_now().await;
        let spoken = announcer.spoken.lock().clone();
        assert_eq!(spoken, vec!["Continue on fresh road"]);
    }

    struct FailingService;

    #[async_trait]
    impl RoutingService for FailingService {
        async fn route(
            &self,
            _origin: &Coordinate,
            _destination: &Coordinate,
        ) -> Result<Route, RouteError> {
            Err(RouteError::Unavailable("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_computation_surfaces_route_unavailable() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let narrator = Narrator::new(announcer, "en-US", Duration::from_millis(3500));
        let planner = RoutePlanner::new(Arc::new(FailingService), narrator);

        let err = planner
            .compute_route(origin(), destination())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Unavailable(_)));
    }
}
