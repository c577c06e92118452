//! Map presentation state: markers, follow camera, and the route overlay.
//! Purely presentational; owns no persisted state.

use crate::models::{Coordinate, Point, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Normal,
    /// Pulsing/highlighted marker while an SOS is active.
    Pulsing,
}

/// Route line overlay, tagged with the pair it was computed for so a stale
/// overlay can never survive an origin/destination change.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub origin: Point,
    pub destination: Point,
    pub geometry: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct MapView {
    center: Point,
    zoom: u8,
    user: Option<Point>,
    destination: Option<Point>,
    overlay: Option<RouteOverlay>,
    sos_active: bool,
}

impl MapView {
    pub fn new(center: Point, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            user: None,
            destination: None,
            overlay: None,
            sos_active: false,
        }
    }

    /// Moves the user marker and recenters the camera on it, preserving the
    /// current zoom (follow behavior).
    pub fn update_user(&mut self, fix: &Coordinate) {
        let point = fix.point();
        self.user = Some(point);
        self.center = point;
    }

    /// Changing the destination tears down any overlay computed for the
    /// previous one.
    pub fn set_destination(&mut self, destination: Point) {
        if self.destination != Some(destination) {
            self.overlay = None;
        }
        self.destination = Some(destination);
    }

    /// Installs the route's line overlay, replacing any existing one.
    pub fn install_route(&mut self, route: &Route) {
        self.overlay = Some(RouteOverlay {
            origin: route.waypoints[0].point(),
            destination: route.waypoints[1].point(),
            geometry: route.geometry.clone(),
        });
    }

    /// Removes the overlay; called on route failure or teardown.
    pub fn clear_route(&mut self) {
        self.overlay = None;
    }

    pub fn set_sos_active(&mut self, active: bool) {
        self.sos_active = active;
    }

    pub fn destination_style(&self) -> MarkerStyle {
        if self.sos_active {
            MarkerStyle::Pulsing
        } else {
            MarkerStyle::Normal
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn user(&self) -> Option<Point> {
        self.user
    }

    pub fn destination(&self) -> Option<Point> {
        self.destination
    }

    pub fn overlay(&self) -> Option<&RouteOverlay> {
        self.overlay.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteInstruction;

    fn point(latitude: f64, longitude: f64) -> Point {
        Point {
            latitude,
            longitude,
        }
    }

    fn route(origin: Coordinate, destination: Coordinate) -> Route {
        Route {
            waypoints: [origin, destination],
            geometry: vec![origin.point(), destination.point()],
            total_distance_m: 1500.0,
            total_duration_s: 200.0,
            instructions: vec![RouteInstruction {
                text: "Continue ahead".to_string(),
            }],
        }
    }

    #[test]
    fn follow_recenters_and_preserves_zoom() {
        let mut map = MapView::new(point(40.7128, -74.0060), 15);
        let fix = Coordinate::new(40.7200, -74.0000, 8.0);

        map.update_user(&fix);

        assert_eq!(map.center(), fix.point());
        assert_eq!(map.user(), Some(fix.point()));
        assert_eq!(map.zoom(), 15);
    }

    #[test]
    fn new_route_replaces_the_old_overlay() {
        let origin = Coordinate::new(40.7128, -74.0060, 8.0);
        let first_dest = Coordinate::new(40.7392, -73.9753, 8.0);
        let second_dest = Coordinate::new(40.7489, -73.9680, 8.0);

        let mut map = MapView::new(origin.point(), 15);
        map.set_destination(first_dest.point());
        map.install_route(&route(origin, first_dest));

        map.set_destination(second_dest.point());
        assert!(map.overlay().is_none(), "stale overlay must be torn down");

        map.install_route(&route(origin, second_dest));
        assert_eq!(map.overlay().unwrap().destination, second_dest.point());
    }

    #[test]
    fn failed_route_leaves_markers_without_a_line() {
        let origin = Coordinate::new(40.7128, -74.0060, 8.0);
        let dest = Coordinate::new(40.7392, -73.9753, 8.0);

        let mut map = MapView::new(origin.point(), 15);
        map.update_user(&origin);
        map.set_destination(dest.point());
        map.install_route(&route(origin, dest));

        // Route recomputation failed: the old line must not linger.
        map.clear_route();

        assert!(map.overlay().is_none());
        assert_eq!(map.user(), Some(origin.point()));
        assert_eq!(map.destination(), Some(dest.point()));
    }

    #[test]
    fn sos_escalates_the_destination_marker() {
        let mut map = MapView::new(point(40.7128, -74.0060), 15);
        assert_eq!(map.destination_style(), MarkerStyle::Normal);
        map.set_sos_active(true);
        assert_eq!(map.destination_style(), MarkerStyle::Pulsing);
        map.set_sos_active(false);
        assert_eq!(map.destination_style(), MarkerStyle::Normal);
    }
}
