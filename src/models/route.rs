use super::coordinate::{Coordinate, Point};

/// A computed driving path. Recomputed in full on every origin/destination
/// change; owned exclusively by the routing request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Origin and destination, in that order.
    pub waypoints: [Coordinate; 2],
    pub geometry: Vec<Point>,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub instructions: Vec<RouteInstruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteInstruction {
    pub text: String,
}
