//! Application state: the single store the controller writes and the view reads.

use climinha_core::AppError;
use climinha_weather::{FetchState, Position, WeatherReading};
use parking_lot::RwLock;
use tokio::sync::watch;

/// A message shown to the user until the next action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl From<&AppError> for Notice {
    fn from(e: &AppError) -> Self {
        Self {
            title: e.title().to_string(),
            message: e.user_message().to_string(),
        }
    }
}

/// Immutable snapshot handed to the view.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub title: String,
    pub position: Option<Position>,
    pub place_name: Option<String>,
    pub reading: Option<WeatherReading>,
    pub fetch_state: FetchState,
    pub notice: Option<Notice>,
}

impl AppState {
    /// The fetch trigger is disabled while a fetch is in flight.
    pub fn fetch_enabled(&self) -> bool {
        self.fetch_state.can_start_fetch()
    }
}

#[derive(Debug, Default)]
struct LocationCell {
    position: Option<Position>,
    place_name: Option<String>,
}

/// Location and notice state, each behind its own lock.
///
/// Weather state lives in the fetcher; see `WeatherService::snapshot`.
pub struct AppStore {
    location: RwLock<LocationCell>,
    notice: RwLock<Option<Notice>>,
    changes: watch::Sender<u64>,
}

impl AppStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            location: RwLock::new(LocationCell::default()),
            notice: RwLock::new(None),
            changes,
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.location.read().position
    }

    pub fn place_name(&self) -> Option<String> {
        self.location.read().place_name.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.read().clone()
    }

    /// Replace the stored position. Latest wins.
    pub fn set_position(&self, position: Position) {
        self.location.write().position = Some(position);
        self.bump();
    }

    pub fn set_place_name(&self, name: String) {
        self.location.write().place_name = Some(name);
        self.bump();
    }

    pub fn set_notice(&self, notice: Option<Notice>) {
        let changed = {
            let mut current = self.notice.write();
            let changed = *current != notice;
            *current = notice;
            changed
        };
        if changed {
            self.bump();
        }
    }

    /// Receiver notified whenever any cell changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn bump(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_latest_wins() {
        let store = AppStore::new();
        assert_eq!(store.position(), None);

        store.set_position(Position::new(1.0, 2.0));
        store.set_position(Position::new(3.0, 4.0));

        assert_eq!(store.position(), Some(Position::new(3.0, 4.0)));
    }

    #[test]
    fn writes_notify_subscribers() {
        let store = AppStore::new();
        let mut rx = store.subscribe();

        store.set_place_name("Springfield".to_string());

        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();
        store.set_notice(None);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn notice_from_app_error() {
        let notice = Notice::from(&AppError::NoLocation);
        assert_eq!(notice.title, "Erro");
        assert_eq!(notice.message, "Localização não disponível");
    }
}
