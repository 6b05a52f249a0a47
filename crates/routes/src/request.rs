//! Routes API request and response shapes.
//!
//! Only the fields this tool sends or reads are modeled.

use serde::{Deserialize, Serialize};

use crate::config::TravelMode;

/// Routes API `computeRoutes` endpoint.
pub const COMPUTE_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

/// Response field mask; duration and distance are all the tool needs.
pub const FIELD_MASK: &str = "routes.duration,routes.distanceMeters";

const LANGUAGE_CODE: &str = "en-US";

/// Body of a `computeRoutes` call.
///
/// The serialized form doubles as the cache payload, so every field that
/// distinguishes two queries (origin, destination, travel mode) lives here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin: Waypoint,
    pub destination: Destination,
    pub travel_mode: TravelMode,
    pub routing_preference: RoutingPreference,
    pub compute_alternative_routes: bool,
    pub language_code: &'static str,
    pub units: Units,
}

impl RouteRequest {
    pub fn new(
        latitude: f64,
        longitude: f64,
        destination: impl Into<String>,
        travel_mode: TravelMode,
    ) -> Self {
        Self {
            origin: Waypoint {
                location: Location {
                    lat_lng: LatLng {
                        latitude,
                        longitude,
                    },
                },
            },
            destination: Destination {
                address: destination.into(),
            },
            travel_mode,
            routing_preference: RoutingPreference::TrafficAware,
            compute_alternative_routes: false,
            language_code: LANGUAGE_CODE,
            units: Units::Metric,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingPreference {
    TrafficAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Units {
    Metric,
}

/// Successful `computeRoutes` reply. A missing `routes` key means no route.
#[derive(Debug, Default, Deserialize)]
pub struct RoutesResponse {
    #[serde(default)]
    pub routes: Vec<RouteSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    /// Duration like `"1200s"`.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub distance_meters: Option<u64>,
}
