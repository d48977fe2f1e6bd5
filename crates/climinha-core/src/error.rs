//! Application error taxonomy.
//!
//! Every failure the user can see ends up as an [`AppError`]. The UI shows
//! `title()` and `user_message()`; the `Display` form is for logs.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The user refused location access. Terminal for the session.
    #[error("Location permission denied")]
    PermissionDenied,

    /// A weather fetch was requested before any position was known.
    #[error("No location available")]
    NoLocation,

    /// The weather provider could not produce a reading.
    #[error("Weather unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short heading for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::PermissionDenied => "Permissão negada",
            _ => "Erro",
        }
    }

    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::PermissionDenied => "Não foi possível acessar a localização.",
            AppError::NoLocation => "Localização não disponível",
            AppError::WeatherUnavailable(_) => "Não foi possível obter os dados do clima",
            AppError::Config(e) => e.user_message(),
            AppError::Other(_) => "Ocorreu um erro inesperado. Tente novamente.",
        }
    }
}

/// Why the configuration could not be used at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be located, read, parsed or created.
    #[error("Failed to load configuration: {0:#}")]
    Load(#[from] anyhow::Error),

    /// The file parsed but failed validation. Holds the error summary.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Load(_) => "Não foi possível ler o arquivo de configuração.",
            ConfigError::Invalid(_) => "Configuração inválida. Verifique suas definições.",
        }
    }
}
