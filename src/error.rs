use thiserror::Error;

/// Device geolocation failures, normalized from the platform provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied. Please enable location services.")]
    PermissionDenied,
    #[error("Location information unavailable.")]
    PositionUnavailable,
    #[error("Location request timed out.")]
    Timeout,
}

/// Routing collaborator unreachable or no path found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("routing service unavailable: {0}")]
    Unavailable(String),
}

/// Facility directory unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("facility directory unreachable: {0}")]
pub struct DirectoryError(pub String);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures surfaced by the SOS session manager.
#[derive(Debug, Error)]
pub enum SosError {
    #[error("You must be logged in to use SOS")]
    Unauthenticated,
    #[error("could not acquire location: {0}")]
    LocationUnavailable(#[from] LocationError),
    #[error("failed to persist emergency alert: {0}")]
    Persistence(#[from] StoreError),
}
