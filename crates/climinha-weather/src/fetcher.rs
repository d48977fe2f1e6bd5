//! On-demand weather fetching with a published [`FetchState`].
//!
//! Only one fetch runs at a time. The Loading flag is reset by a drop guard,
//! so a panicking source or an abandoned future cannot leave it stuck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::provider::WeatherSource;
use crate::types::{FetchError, FetchState, Position, WeatherError, WeatherReading};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch state and the latest successful reading, published as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchStatus {
    pub state: FetchState,
    pub reading: Option<WeatherReading>,
}

pub struct WeatherFetcher {
    source: Arc<dyn WeatherSource>,
    timeout: Duration,
    status: watch::Sender<FetchStatus>,
    in_flight: AtomicBool,
}

impl WeatherFetcher {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        let (status, _) = watch::channel(FetchStatus::default());
        Self {
            source,
            timeout: DEFAULT_FETCH_TIMEOUT,
            status,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> FetchState {
        self.status.borrow().state
    }

    /// Latest successful reading, if any.
    pub fn reading(&self) -> Option<WeatherReading> {
        self.status.borrow().reading.clone()
    }

    /// State and reading taken together, so `Loaded` always comes with its reading.
    pub fn status(&self) -> FetchStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe_status(&self) -> watch::Receiver<FetchStatus> {
        self.status.subscribe()
    }

    /// Fetch current weather for `position`.
    ///
    /// An absent position fails with [`FetchError::NoLocation`] before any
    /// request is made and leaves the state untouched. A call made while
    /// another is outstanding fails with [`FetchError::AlreadyInFlight`].
    pub async fn fetch(
        &self,
        position: Option<Position>,
        api_key: &str,
    ) -> Result<WeatherReading, FetchError> {
        let Some(position) = position else {
            return Err(FetchError::NoLocation);
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Weather fetch already in flight, ignoring trigger");
            return Err(FetchError::AlreadyInFlight);
        }

        let guard = LoadingGuard::begin(self);

        let request = self.source.current(&position, api_key);
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(WeatherError::Timeout),
        };

        match result {
            Ok(reading) => {
                tracing::info!(
                    temp = reading.temperature_celsius,
                    condition = %reading.condition_description,
                    "Weather data fetched successfully"
                );
                guard.finish(FetchState::Loaded, Some(reading.clone()));
                Ok(reading)
            }
            Err(e) => {
                tracing::error!("Failed to fetch weather: {}", e);
                guard.finish(FetchState::Failed, None);
                Err(FetchError::WeatherUnavailable(e))
            }
        }
    }
}

/// Holds the fetcher in Loading; publishes the outcome when dropped.
struct LoadingGuard<'a> {
    fetcher: &'a WeatherFetcher,
    outcome: FetchState,
    reading: Option<WeatherReading>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(fetcher: &'a WeatherFetcher) -> Self {
        fetcher.status.send_modify(|s| s.state = FetchState::Loading);
        Self {
            fetcher,
            outcome: FetchState::Failed,
            reading: None,
        }
    }

    fn finish(mut self, outcome: FetchState, reading: Option<WeatherReading>) {
        self.outcome = outcome;
        self.reading = reading;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome;
        let reading = self.reading.take();
        let in_flight = &self.fetcher.in_flight;

        // Released under the channel lock: whoever sees the outcome may fetch
        // again, and the next Loading is always published after it.
        self.fetcher.status.send_modify(|s| {
            s.state = outcome;
            if reading.is_some() {
                s.reading = reading;
            }
            in_flight.store(false, Ordering::Release);
        });
    }
}
