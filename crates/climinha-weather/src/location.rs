//! Network-backed [`GeoService`] for machines without a positioning device.
//!
//! Position comes from IP geolocation (ip-api.com compatible JSON), place
//! names from Nominatim. Permission is the user's configured consent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::geo::{GeoService, PositionStream};
use crate::geocode::NominatimGeocoder;
use crate::types::{
    Accuracy, LocationError, PermissionStatus, PlaceCandidate, Position, WatchOptions,
};

pub const IP_API_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NetworkGeoService {
    client: Client,
    lookup_url: String,
    geocoder: NominatimGeocoder,
    consent: bool,
}

impl NetworkGeoService {
    pub fn new(
        lookup_url: &str,
        geocoder: NominatimGeocoder,
        consent: bool,
        timeout: Duration,
    ) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(format!("Failed to create location client: {}", e)))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.to_string(),
            geocoder,
            consent,
        })
    }
}

async fn lookup(client: &Client, url: &str) -> Result<Position, LocationError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            LocationError::Timeout
        } else {
            tracing::debug!("IP lookup request failed: {}", e);
            LocationError::ServiceUnavailable
        }
    })?;

    if !response.status().is_success() {
        tracing::debug!("IP lookup returned status {}", response.status());
        return Err(LocationError::ServiceUnavailable);
    }

    let body: IpLookupResponse = response
        .json()
        .await
        .map_err(|e| LocationError::Other(format!("IP lookup parse error: {}", e)))?;

    if body.status.as_deref() == Some("fail") {
        return Err(LocationError::Other(
            body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
        ));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Ok(Position::new(lat, lon)),
        _ => Err(LocationError::Other(
            "IP lookup response has no coordinates".to_string(),
        )),
    }
}

/// Floor for the poll period; a zero period would make `interval` panic.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Poll every `min_interval`; emit when moved at least `min_distance_meters`.
///
/// The first poll runs immediately and only records a baseline. The caller
/// already reported the initial fix through `current_position`.
async fn poll_positions(
    client: Client,
    url: String,
    options: WatchOptions,
    tx: mpsc::UnboundedSender<Position>,
) {
    let mut interval = tokio::time::interval(options.min_interval.max(MIN_POLL_INTERVAL));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last: Option<Position> = None;

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            _ = interval.tick() => {}
        }

        let position = match lookup(&client, &url).await {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!("Position poll failed: {}", e);
                continue;
            }
        };

        let Some(prev) = last else {
            tracing::debug!(
                lat = position.latitude,
                lon = position.longitude,
                "Position watch baseline"
            );
            last = Some(position);
            continue;
        };

        if prev.distance_meters(&position) < options.min_distance_meters {
            continue;
        }
        last = Some(position);
        if tx.send(position).is_err() {
            break;
        }
    }

    tracing::debug!("Position polling stopped");
}

#[async_trait]
impl GeoService for NetworkGeoService {
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(if self.consent {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    async fn current_position(&self, accuracy: Accuracy) -> Result<Position, LocationError> {
        tracing::debug!(?accuracy, "IP lookup has a single accuracy tier");
        lookup(&self.client, &self.lookup_url).await
    }

    async fn reverse_geocode(
        &self,
        position: &Position,
    ) -> Result<Vec<PlaceCandidate>, LocationError> {
        self.geocoder.reverse(position).await
    }

    fn watch_position(&self, options: &WatchOptions) -> Result<PositionStream, LocationError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| LocationError::Other("No async runtime for position watch".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(poll_positions(
            self.client.clone(),
            self.lookup_url.clone(),
            *options,
            tx,
        ));
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{LocationTracker, TrackerEvent};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, consent: bool) -> NetworkGeoService {
        let geocoder = NominatimGeocoder::new(&format!("{}/reverse", server.uri())).unwrap();
        NetworkGeoService::new(
            &format!("{}/json", server.uri()),
            geocoder,
            consent,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn ip_body(lat: f64, lon: f64) -> serde_json::Value {
        serde_json::json!({
            "status": "success",
            "city": "Springfield",
            "regionName": "Illinois",
            "lat": lat,
            "lon": lon
        })
    }

    async fn next_position(stream: &mut PositionStream) -> Position {
        tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_permission_follows_consent() {
        let server = MockServer::start().await;
        assert_eq!(
            service(&server, true).request_permission().await.unwrap(),
            PermissionStatus::Granted
        );
        assert_eq!(
            service(&server, false).request_permission().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_current_position_from_ip_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(10.0, 20.0)))
            .mount(&server)
            .await;

        let position = service(&server, true)
            .current_position(Accuracy::High)
            .await
            .unwrap();

        assert_eq!(position, Position::new(10.0, 20.0));
    }

    #[tokio::test]
    async fn test_current_position_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let err = service(&server, true)
            .current_position(Accuracy::High)
            .await
            .unwrap_err();

        assert_eq!(err, LocationError::Other("private range".to_string()));
    }

    #[tokio::test]
    async fn test_current_position_server_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service(&server, true)
            .current_position(Accuracy::High)
            .await
            .unwrap_err();

        assert_eq!(err, LocationError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_reverse_geocode_delegates_to_nominatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "city": "Springfield", "state": "Illinois" }
            })))
            .mount(&server)
            .await;

        let candidates = service(&server, true)
            .reverse_geocode(&Position::new(10.0, 20.0))
            .await
            .unwrap();

        assert_eq!(candidates[0].city.as_deref(), Some("Springfield"));
    }

    #[tokio::test]
    async fn test_watch_emits_only_on_displacement() {
        let server = MockServer::start().await;
        // Baseline, then one poll at the same spot.
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(10.0, 20.0)))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(10.5, 20.0)))
            .with_priority(2)
            .mount(&server)
            .await;

        let options = WatchOptions {
            min_interval: Duration::from_millis(20),
            min_distance_meters: 10.0,
            ..WatchOptions::default()
        };
        let mut stream = service(&server, true).watch_position(&options).unwrap();

        // The unmoved baseline is never emitted.
        assert_eq!(next_position(&mut stream).await, Position::new(10.5, 20.0));
        // Every later poll repeats the last position.
        let quiet = tokio::time::timeout(Duration::from_millis(150), stream.recv()).await;
        assert!(quiet.is_err(), "unexpected update: {:?}", quiet);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(10.0, 20.0)))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(11.0, 20.0)))
            .with_priority(2)
            .mount(&server)
            .await;

        let options = WatchOptions {
            min_interval: Duration::ZERO,
            ..WatchOptions::default()
        };
        let mut stream = service(&server, true).watch_position(&options).unwrap();

        assert_eq!(next_position(&mut stream).await, Position::new(11.0, 20.0));
    }

    #[tokio::test]
    async fn test_tracker_reports_initial_fix_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ip_body(10.0, 20.0)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "city": "Springfield", "state": "Illinois" }
            })))
            .mount(&server)
            .await;

        let (tx, mut events) = mpsc::unbounded_channel();
        let tracker = LocationTracker::new(Arc::new(service(&server, true)), tx);
        tracker.initialize().await.unwrap();
        let mut subscription = tracker.subscribe(WatchOptions::default());

        // Well inside the first 5 s interval.
        tokio::time::sleep(Duration::from_millis(300)).await;
        subscription.cancel();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                TrackerEvent::PositionChanged(Position::new(10.0, 20.0)),
                TrackerEvent::PlaceResolved("Springfield".to_string()),
            ]
        );

        let geocodes = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/reverse")
            .count();
        assert_eq!(geocodes, 1);
    }
}
