pub mod weather_model;

pub use weather_model::{AppState, AppStore, Notice};
