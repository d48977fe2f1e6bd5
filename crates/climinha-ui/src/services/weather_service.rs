//! Weather coordinator: applies tracker events and runs user-triggered fetches.
//! Fetches run off the UI loop; results land in the store and the fetcher.

use std::sync::Arc;

use climinha_core::AppError;
use climinha_weather::{FetchError, FetchStatus, LocationError, TrackerEvent, WeatherFetcher};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{AppState, AppStore, Notice};

/// User input understood by the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FetchWeather,
    Quit,
}

/// Error type for weather screen operations
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherServiceError {
    PermissionDenied,
    Location(String),
    NoLocation,
    Unavailable(String),
}

impl WeatherServiceError {
    /// `None` for a trigger swallowed because a fetch is already running.
    pub fn from_fetch(e: FetchError) -> Option<Self> {
        match e {
            FetchError::NoLocation => Some(Self::NoLocation),
            FetchError::AlreadyInFlight => None,
            FetchError::WeatherUnavailable(cause) => Some(Self::Unavailable(cause.to_string())),
        }
    }
}

impl From<&LocationError> for WeatherServiceError {
    fn from(e: &LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => Self::PermissionDenied,
            other => Self::Location(other.to_string()),
        }
    }
}

impl std::fmt::Display for WeatherServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "Location permission denied"),
            Self::Location(s) => write!(f, "Location error: {}", s),
            Self::NoLocation => write!(f, "No location available"),
            Self::Unavailable(s) => write!(f, "Weather error: {}", s),
        }
    }
}

impl std::error::Error for WeatherServiceError {}

pub struct WeatherService {
    store: Arc<AppStore>,
    fetcher: Arc<WeatherFetcher>,
    api_key: String,
    title: String,
}

impl WeatherService {
    pub fn new(
        store: Arc<AppStore>,
        fetcher: Arc<WeatherFetcher>,
        api_key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            api_key: api_key.into(),
            title: title.into(),
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn subscribe_fetch_status(&self) -> watch::Receiver<FetchStatus> {
        self.fetcher.subscribe_status()
    }

    /// Apply a tracker event. Position changes never trigger a fetch.
    pub fn apply(&self, event: TrackerEvent) {
        match event {
            TrackerEvent::PositionChanged(position) => self.store.set_position(position),
            TrackerEvent::PlaceResolved(name) => {
                tracing::info!("Current place: {}", name);
                self.store.set_place_name(name);
            }
        }
    }

    pub fn report_location_error(&self, e: &LocationError) {
        match WeatherServiceError::from(e) {
            WeatherServiceError::PermissionDenied => {
                let err = AppError::from(WeatherServiceError::PermissionDenied);
                self.store.set_notice(Some(Notice::from(&err)));
            }
            // Without an initial fix there is nothing to fetch weather for yet.
            other => tracing::warn!("Initial location unavailable: {}", other),
        }
    }

    /// Fetch weather for the latest stored position and record the outcome.
    pub async fn fetch_weather(&self) {
        self.store.set_notice(None);

        let position = self.store.position();
        if let Err(e) = self.fetcher.fetch(position, &self.api_key).await {
            if let Some(err) = WeatherServiceError::from_fetch(e) {
                self.store.set_notice(Some(Notice::from(&AppError::from(err))));
            }
        }
    }

    /// Spawn a fetch unless one is already running.
    pub fn request_fetch(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.fetcher.state().can_start_fetch() {
            tracing::debug!("Fetch trigger ignored while loading");
            return None;
        }

        let service = Arc::clone(self);
        Some(tokio::spawn(async move { service.fetch_weather().await }))
    }

    pub fn snapshot(&self) -> AppState {
        let FetchStatus { state, reading } = self.fetcher.status();
        AppState {
            title: self.title.clone(),
            position: self.store.position(),
            place_name: self.store.place_name(),
            reading,
            fetch_state: state,
            notice: self.store.notice(),
        }
    }
}
