//! Emergency SOS and live-routing subsystem for the patient-facing app.
//!
//! Coordinates device geolocation, nearby-facility lookup, driving-route
//! computation with voice guidance, and the persisted emergency alert that
//! responder-facing systems observe.

pub mod config;
pub mod db;
pub mod error;
pub mod facilities;
pub mod location;
pub mod map_view;
pub mod models;
pub mod routing;
pub mod sos;
pub mod speech;
