//! Port to the platform geolocation capability.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::{Accuracy, LocationError, PermissionStatus, PlaceCandidate, Position, WatchOptions};

/// Positions emitted by a watch. Dropping the receiver stops the watch.
pub type PositionStream = mpsc::UnboundedReceiver<Position>;

#[async_trait]
pub trait GeoService: Send + Sync {
    /// Ask the user for foreground location access.
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    /// One-shot position read.
    async fn current_position(&self, accuracy: Accuracy) -> Result<Position, LocationError>;

    /// Place candidates for a position, best match first.
    async fn reverse_geocode(&self, position: &Position)
        -> Result<Vec<PlaceCandidate>, LocationError>;

    /// Start continuous updates honoring the thresholds in `options`.
    fn watch_position(&self, options: &WatchOptions) -> Result<PositionStream, LocationError>;
}
