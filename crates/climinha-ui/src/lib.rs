pub mod app;
pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod services;
pub mod terminal;
pub mod view;

pub use app::run;
pub use app_services::AppServices;
pub use models::{AppState, AppStore, Notice};
pub use services::{Command, WeatherService};
