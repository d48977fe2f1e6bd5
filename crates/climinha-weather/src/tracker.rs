//! Location tracking: permission, initial fix, and continuous updates.
//!
//! The tracker never touches UI state. It emits [`TrackerEvent`]s on a channel
//! and whoever owns the receiver applies them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::geo::{GeoService, PositionStream};
use crate::types::{
    place_name, Accuracy, LocationError, PermissionStatus, Position, WatchOptions, UNKNOWN_PLACE,
};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A new position replaced the previous one.
    PositionChanged(Position),
    /// Place name for the most recent position.
    PlaceResolved(String),
}

pub struct LocationTracker {
    geo: Arc<dyn GeoService>,
    events: mpsc::UnboundedSender<TrackerEvent>,
    permission: OnceCell<Result<PermissionStatus, LocationError>>,
    accuracy: Accuracy,
    lookup_timeout: Duration,
}

impl LocationTracker {
    pub fn new(geo: Arc<dyn GeoService>, events: mpsc::UnboundedSender<TrackerEvent>) -> Self {
        Self {
            geo,
            events,
            permission: OnceCell::new(),
            accuracy: Accuracy::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Bound for the initial position read and each reverse geocode.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// True once permission has been requested and granted.
    pub fn is_permitted(&self) -> bool {
        matches!(self.permission.get(), Some(Ok(status)) if status.is_granted())
    }

    /// Request permission, then emit the initial position and its place name.
    ///
    /// Permission is requested at most once per tracker; later calls reuse
    /// the first answer. A denial stops here with
    /// [`LocationError::PermissionDenied`] and nothing is emitted.
    pub async fn initialize(&self) -> Result<(), LocationError> {
        let status = self
            .permission
            .get_or_init(|| async {
                tracing::info!("Requesting location permission");
                self.geo.request_permission().await
            })
            .await
            .clone()?;

        if !status.is_granted() {
            tracing::warn!(?status, "Location permission not granted");
            return Err(LocationError::PermissionDenied);
        }

        let position = tokio::time::timeout(
            self.lookup_timeout,
            self.geo.current_position(self.accuracy),
        )
        .await
        .map_err(|_| LocationError::Timeout)??;

        tracing::info!(
            lat = position.latitude,
            lon = position.longitude,
            "Got initial position"
        );
        let _ = self.events.send(TrackerEvent::PositionChanged(position));

        let name = resolve_place_name(self.geo.as_ref(), &position, self.lookup_timeout).await;
        let _ = self.events.send(TrackerEvent::PlaceResolved(name));

        Ok(())
    }

    /// Observe position changes until the returned subscription is cancelled.
    ///
    /// Without granted permission, or if the service refuses to watch, the
    /// subscription is inactive and cancelling it does nothing.
    pub fn subscribe(&self, options: WatchOptions) -> Subscription {
        if !self.is_permitted() {
            tracing::debug!("Skipping position watch, permission not granted");
            return Subscription::inactive();
        }

        let stream = match self.geo.watch_position(&options) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to start position watch: {}", e);
                return Subscription::inactive();
            }
        };

        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(()));
        let emitter = Emitter {
            events: self.events.clone(),
            token: token.clone(),
            gate: gate.clone(),
        };

        tracing::info!(
            interval_ms = options.min_interval.as_millis() as u64,
            distance_m = options.min_distance_meters,
            accuracy = ?options.accuracy,
            "Watching position"
        );

        let handle = tokio::spawn(watch_loop(
            self.geo.clone(),
            stream,
            emitter,
            self.lookup_timeout,
        ));

        Subscription {
            active: Some(ActiveWatch {
                token,
                gate,
                handle,
            }),
        }
    }
}

/// Reverse geocode `position` into a display name.
///
/// Failures and timeouts fall back to [`UNKNOWN_PLACE`]; they are logged, never
/// propagated.
pub async fn resolve_place_name(
    geo: &dyn GeoService,
    position: &Position,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, geo.reverse_geocode(position)).await {
        Ok(Ok(candidates)) => {
            let name = place_name(&candidates);
            tracing::debug!("Reverse geocoded to: {}", name);
            name
        }
        Ok(Err(e)) => {
            tracing::warn!("Reverse geocode failed: {}", e);
            UNKNOWN_PLACE.to_string()
        }
        Err(_) => {
            tracing::warn!("Reverse geocode timed out");
            UNKNOWN_PLACE.to_string()
        }
    }
}

/// Sends events only while the subscription is live.
struct Emitter {
    events: mpsc::UnboundedSender<TrackerEvent>,
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl Emitter {
    fn emit(&self, event: TrackerEvent) -> bool {
        let _held = self.gate.lock();
        if self.token.is_cancelled() {
            return false;
        }
        self.events.send(event).is_ok()
    }
}

async fn watch_loop(
    geo: Arc<dyn GeoService>,
    mut stream: PositionStream,
    emitter: Emitter,
    lookup_timeout: Duration,
) {
    let token = emitter.token.clone();

    loop {
        let position = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = stream.recv() => match next {
                Some(position) => position,
                None => {
                    tracing::debug!("Position stream ended");
                    break;
                }
            },
        };

        tracing::debug!(
            lat = position.latitude,
            lon = position.longitude,
            "Position update"
        );
        if !emitter.emit(TrackerEvent::PositionChanged(position)) {
            break;
        }

        // Resolved inline so an older lookup can never land after a newer one.
        let name = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            name = resolve_place_name(geo.as_ref(), &position, lookup_timeout) => name,
        };
        if !emitter.emit(TrackerEvent::PlaceResolved(name)) {
            break;
        }
    }
}

struct ActiveWatch {
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
    handle: JoinHandle<()>,
}

/// Handle to a running position watch.
pub struct Subscription {
    active: Option<ActiveWatch>,
}

impl Subscription {
    /// A subscription that was never started.
    pub fn inactive() -> Self {
        Self { active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.token.is_cancelled())
    }

    /// Stop the watch. No event is emitted after this returns.
    ///
    /// Safe to call more than once and on an inactive subscription.
    pub fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        {
            let _held = active.gate.lock();
            active.token.cancel();
        }
        active.handle.abort();
        tracing::info!("Position watch cancelled");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
