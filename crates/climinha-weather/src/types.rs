use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Place name used when reverse geocoding yields neither city nor region.
pub const UNKNOWN_PLACE: &str = "Localização desconhecida";

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to `other` in metres.
    pub fn distance_meters(&self, other: &Position) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// One reverse geocoding result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub city: Option<String>,
    pub region: Option<String>,
}

/// Derive the display name from reverse geocoding results.
///
/// Only the first candidate is considered: its city, else its region, else
/// [`UNKNOWN_PLACE`]. Blank fields count as missing.
pub fn place_name(candidates: &[PlaceCandidate]) -> String {
    candidates
        .first()
        .and_then(|c| non_blank(&c.city).or_else(|| non_blank(&c.region)))
        .unwrap_or_else(|| UNKNOWN_PLACE.to_string())
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Requested accuracy tier for position reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Lowest,
    Low,
    Balanced,
    #[default]
    High,
    Highest,
    BestForNavigation,
}

/// Thresholds for continuous position updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub accuracy: Accuracy,
    pub min_interval: Duration,
    pub min_distance_meters: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_interval: Duration::from_millis(5000),
            min_distance_meters: 10.0,
        }
    }
}

/// Outcome of a location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Current weather conditions at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_celsius: f64,
    /// Raw provider description, in English
    pub condition_description: String,
    pub wind_speed_mps: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Lifecycle of the weather fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl FetchState {
    pub fn is_loading(self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// True if a new fetch can be started.
    pub fn can_start_fetch(self) -> bool {
        !self.is_loading()
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Reverse geocoding failed: {0}")]
    Geocode(String),
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned HTTP {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Weather request timed out")]
    Timeout,
}

/// Errors surfaced by [`crate::WeatherFetcher::fetch`]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No location available")]
    NoLocation,
    #[error("A weather fetch is already in progress")]
    AlreadyInFlight,
    #[error("Weather unavailable: {0}")]
    WeatherUnavailable(#[from] WeatherError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(city: Option<&str>, region: Option<&str>) -> PlaceCandidate {
        PlaceCandidate {
            city: city.map(String::from),
            region: region.map(String::from),
        }
    }

    #[test]
    fn test_place_name_prefers_city() {
        let name = place_name(&[candidate(Some("Springfield"), Some("Illinois"))]);
        assert_eq!(name, "Springfield");
    }

    #[test]
    fn test_place_name_falls_back_to_region() {
        let name = place_name(&[candidate(None, Some("Minas Gerais"))]);
        assert_eq!(name, "Minas Gerais");
    }

    #[test]
    fn test_place_name_sentinel_without_city_or_region() {
        assert_eq!(place_name(&[candidate(None, None)]), UNKNOWN_PLACE);
        assert_eq!(place_name(&[]), UNKNOWN_PLACE);
    }

    #[test]
    fn test_place_name_blank_city_is_missing() {
        let name = place_name(&[candidate(Some(""), Some("Bahia"))]);
        assert_eq!(name, "Bahia");
    }

    #[test]
    fn test_place_name_uses_first_candidate_only() {
        let name = place_name(&[candidate(None, None), candidate(Some("Recife"), None)]);
        assert_eq!(name, UNKNOWN_PLACE);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Position::new(-23.55, -46.63);
        assert!(p.distance_meters(&p) < 1e-6);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(1.0, 0.0);
        let d = a.distance_meters(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_fetch_state_blocks_while_loading() {
        assert!(FetchState::Idle.can_start_fetch());
        assert!(FetchState::Loaded.can_start_fetch());
        assert!(FetchState::Failed.can_start_fetch());
        assert!(!FetchState::Loading.can_start_fetch());
    }

    #[test]
    fn test_watch_options_default() {
        let opts = WatchOptions::default();
        assert_eq!(opts.accuracy, Accuracy::High);
        assert_eq!(opts.min_interval, Duration::from_millis(5000));
        assert_eq!(opts.min_distance_meters, 10.0);
    }
}
