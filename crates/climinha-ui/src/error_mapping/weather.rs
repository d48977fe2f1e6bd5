use crate::services::weather_service::WeatherServiceError;
use climinha_core::AppError;

impl From<WeatherServiceError> for AppError {
    fn from(e: WeatherServiceError) -> Self {
        match e {
            WeatherServiceError::PermissionDenied => AppError::PermissionDenied,
            WeatherServiceError::NoLocation => AppError::NoLocation,
            WeatherServiceError::Unavailable(s) => AppError::WeatherUnavailable(s),
            WeatherServiceError::Location(s) => AppError::Other(anyhow::anyhow!(s)),
        }
    }
}
