//! Nearby-facility resolution: haversine-ranked lookup against a facility
//! directory.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

use crate::error::DirectoryError;
use crate::models::{haversine_km, Coordinate, Facility, FacilityCategory};

/// Facility directory collaborator. `candidates` may over-fetch; the
/// resolver owns the radius/category filtering and ranking.
#[async_trait]
pub trait FacilityDirectory: Send + Sync {
    async fn candidates(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Facility>, DirectoryError>;
}

/// In-process facility catalog.
pub struct StaticDirectory {
    facilities: Vec<Facility>,
}

impl StaticDirectory {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }

    /// Catalog shipped with the service.
    pub fn bundled() -> Self {
        fn entry(
            id: &str,
            name: &str,
            category: FacilityCategory,
            address: &str,
            phone: &str,
            latitude: f64,
            longitude: f64,
            rating: Option<f64>,
            hours: Option<&str>,
        ) -> Facility {
            Facility {
                id: id.to_string(),
                name: name.to_string(),
                category,
                address: address.to_string(),
                phone: phone.to_string(),
                latitude,
                longitude,
                distance_km: None,
                rating,
                hours: hours.map(str::to_string),
            }
        }

        Self::new(vec![
            entry(
                "nyp-lower-manhattan",
                "NewYork-Presbyterian Lower Manhattan Hospital",
                FacilityCategory::Hospital,
                "170 William St, New York, NY 10038",
                "+1 212-312-5000",
                40.7103,
                -74.0054,
                Some(4.1),
                Some("Open 24 hours"),
            ),
            entry(
                "bellevue",
                "Bellevue Hospital Center",
                FacilityCategory::Hospital,
                "462 1st Ave, New York, NY 10016",
                "+1 212-562-5555",
                40.7392,
                -73.9753,
                Some(3.9),
                Some("Open 24 hours"),
            ),
            entry(
                "mount-sinai-beth-israel",
                "Mount Sinai Beth Israel",
                FacilityCategory::Emergency,
                "281 1st Ave, New York, NY 10003",
                "+1 212-420-2000",
                40.7320,
                -73.9843,
                Some(3.7),
                Some("Open 24 hours"),
            ),
            entry(
                "citymd-fidi",
                "CityMD Financial District Urgent Care",
                FacilityCategory::Clinic,
                "67 Wall St, New York, NY 10005",
                "+1 212-962-1700",
                40.7055,
                -74.0086,
                Some(4.3),
                Some("8am-8pm"),
            ),
            entry(
                "duane-reade-broadway",
                "Duane Reade Pharmacy",
                FacilityCategory::Pharmacy,
                "100 Broadway, New York, NY 10005",
                "+1 212-791-7163",
                40.7080,
                -74.0110,
                None,
                Some("7am-10pm"),
            ),
            entry(
                "nyc-well",
                "NYC Well Crisis Support Center",
                FacilityCategory::MentalHealth,
                "50 Water St, New York, NY 10004",
                "+1 888-692-9355",
                40.7027,
                -74.0091,
                None,
                Some("Open 24 hours"),
            ),
        ])
    }
}

#[async_trait]
impl FacilityDirectory for StaticDirectory {
    async fn candidates(
        &self,
        _origin: &Coordinate,
        _radius_km: f64,
    ) -> Result<Vec<Facility>, DirectoryError> {
        Ok(self.facilities.clone())
    }
}

/// Result shape for callers that degrade gracefully: a directory failure
/// yields an empty list plus an error description, never a crash.
#[derive(Debug)]
pub struct NearbyResult {
    pub facilities: Vec<Facility>,
    pub error: Option<String>,
}

pub struct FacilityResolver {
    directory: Arc<dyn FacilityDirectory>,
}

impl FacilityResolver {
    pub fn new(directory: Arc<dyn FacilityDirectory>) -> Self {
        Self { directory }
    }

    /// Ranks directory candidates by haversine distance from `origin`,
    /// keeping those within `radius_km` (optionally of one category),
    /// sorted ascending with ties in input order.
    pub async fn resolve(
        &self,
        origin: &Coordinate,
        radius_km: f64,
        category: Option<FacilityCategory>,
    ) -> NearbyResult {
        let candidates = match self.directory.candidates(origin, radius_km).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("facility lookup failed: {e}");
                return NearbyResult {
                    facilities: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut facilities: Vec<Facility> = Vec::new();
        for mut facility in candidates {
            if let Some(wanted) = category {
                if facility.category != wanted {
                    continue;
                }
            }
            let distance = haversine_km(origin.point(), facility.point());
            if distance <= radius_km {
                facility.distance_km = Some(distance);
                facilities.push(facility);
            }
        }
        // Stable sort keeps input order for equal distances.
        facilities.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
        });

        NearbyResult {
            facilities,
            error: None,
        }
    }
}
