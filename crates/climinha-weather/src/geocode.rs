//! Reverse geocoding: convert coordinates to place candidates.
//! Backed by OpenStreetMap Nominatim, which needs no API key.

use crate::types::{LocationError, PlaceCandidate, Position};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("Climinha/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
}

impl From<NominatimAddress> for PlaceCandidate {
    fn from(addr: NominatimAddress) -> Self {
        // Nominatim splits settlements by size; any of them is the "city" here.
        let city = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality);

        PlaceCandidate {
            city,
            region: addr.state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Result<Self, LocationError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Other(format!("Failed to create geocoding client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Reverse geocode a position. Returns zero or one candidate.
    pub async fn reverse(&self, position: &Position) -> Result<Vec<PlaceCandidate>, LocationError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    LocationError::Geocode(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LocationError::Geocode(format!(
                "Reverse geocode returned status {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Geocode(format!("Reverse geocode parse error: {}", e)))?;

        Ok(body.address.map(PlaceCandidate::from).into_iter().collect())
    }
}
