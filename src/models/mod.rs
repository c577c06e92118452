pub mod coordinate;
pub mod emergency_alert;
pub mod facility;
pub mod route;

pub use coordinate::{haversine_km, Coordinate, Point};
pub use emergency_alert::{EmergencyAlert, STATUS_ACTIVE, STATUS_RESOLVED};
pub use facility::{Facility, FacilityCategory};
pub use route::{Route, RouteInstruction};
