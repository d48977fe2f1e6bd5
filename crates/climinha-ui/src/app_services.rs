//! Wiring: builds the services the app loop needs from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use climinha_core::{Config, LocationAccuracy, LocationConfig};
use climinha_weather::{
    Accuracy, GeoService, LocationTracker, NetworkGeoService, NominatimGeocoder, TrackerEvent,
    WatchOptions, WeatherFetcher, WeatherProvider, WeatherSource,
};
use tokio::sync::mpsc;

use crate::models::AppStore;
use crate::services::WeatherService;

/// Everything `app::run` consumes.
pub struct AppServices {
    pub service: Arc<WeatherService>,
    pub tracker: LocationTracker,
    pub events: mpsc::UnboundedReceiver<TrackerEvent>,
    pub watch: WatchOptions,
}

impl AppServices {
    /// Build with the network backends named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let location_timeout = Duration::from_secs(config.location.timeout_secs);

        let geocoder =
            NominatimGeocoder::with_timeout(&config.location.geocoder_url, location_timeout)
                .context("Failed to create reverse geocoder")?;
        let geo = NetworkGeoService::new(
            &config.location.ip_lookup_url,
            geocoder,
            config.location.enabled,
            location_timeout,
        )
        .context("Failed to create location service")?;

        let provider = WeatherProvider::with_timeout(
            &config.weather.base_url,
            Duration::from_secs(config.weather.timeout_secs),
        )
        .context("Failed to create weather provider")?;

        let api_key = config.resolve_api_key().unwrap_or_else(|| {
            tracing::warn!("No weather API key configured, fetches will fail");
            String::new()
        });

        Ok(Self::assemble(
            config,
            Arc::new(geo),
            Arc::new(provider),
            api_key,
        ))
    }

    /// Build around arbitrary location and weather backends.
    pub fn assemble(
        config: &Config,
        geo: Arc<dyn GeoService>,
        source: Arc<dyn WeatherSource>,
        api_key: String,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();

        let tracker = LocationTracker::new(geo, events_tx)
            .with_accuracy(accuracy(config.location.accuracy))
            .with_lookup_timeout(Duration::from_secs(config.location.timeout_secs));

        let fetcher = WeatherFetcher::new(source)
            .with_timeout(Duration::from_secs(config.weather.timeout_secs));

        let service = WeatherService::new(
            Arc::new(AppStore::new()),
            Arc::new(fetcher),
            api_key,
            config.ui.title.clone(),
        );

        Self {
            service: Arc::new(service),
            tracker,
            events,
            watch: watch_options(&config.location),
        }
    }
}

pub fn accuracy(accuracy: LocationAccuracy) -> Accuracy {
    match accuracy {
        LocationAccuracy::Lowest => Accuracy::Lowest,
        LocationAccuracy::Low => Accuracy::Low,
        LocationAccuracy::Balanced => Accuracy::Balanced,
        LocationAccuracy::High => Accuracy::High,
        LocationAccuracy::Highest => Accuracy::Highest,
        LocationAccuracy::BestForNavigation => Accuracy::BestForNavigation,
    }
}

pub fn watch_options(config: &LocationConfig) -> WatchOptions {
    WatchOptions {
        accuracy: accuracy(config.accuracy),
        min_interval: Duration::from_millis(config.min_interval_ms),
        min_distance_meters: config.min_distance_meters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_options_from_config() {
        let config = LocationConfig {
            accuracy: LocationAccuracy::Balanced,
            min_interval_ms: 2500,
            min_distance_meters: 50.0,
            ..LocationConfig::default()
        };

        let opts = watch_options(&config);

        assert_eq!(opts.accuracy, Accuracy::Balanced);
        assert_eq!(opts.min_interval, Duration::from_millis(2500));
        assert_eq!(opts.min_distance_meters, 50.0);
    }

    #[test]
    fn default_config_matches_default_watch_options() {
        let opts = watch_options(&LocationConfig::default());
        assert_eq!(opts, WatchOptions::default());
    }

    #[tokio::test]
    async fn from_config_builds_with_defaults() {
        let services = AppServices::from_config(&Config::default()).unwrap();
        let state = services.service.snapshot();
        assert_eq!(state.title, "Climinha");
        assert!(state.place_name.is_none());
    }
}
