//! Weather and location services for Climinha
//!
//! Tracks the device position, resolves place names, and fetches current
//! weather from OpenWeatherMap on demand.

pub mod fetcher;
pub mod geo;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod tracker;
pub mod translate;
pub mod types;

pub use fetcher::{FetchStatus, WeatherFetcher};
pub use geo::{GeoService, PositionStream};
pub use geocode::NominatimGeocoder;
pub use location::NetworkGeoService;
pub use provider::{WeatherProvider, WeatherSource};
pub use tracker::{resolve_place_name, LocationTracker, Subscription, TrackerEvent};
pub use translate::translate_condition;
pub use types::*;
