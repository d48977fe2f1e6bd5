use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CLIMINHA_CONFIG";

/// Environment variable holding the OpenWeatherMap API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// One problem found by [`Config::validate`], keyed by its dotted setting name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.field)
    }
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ConfigIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn warn(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ConfigIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// All errors on one line, for the startup failure message.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Location tracking settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Display settings
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. `OPENWEATHER_API_KEY` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Current-weather endpoint
    #[serde(default = "default_weather_url")]
    pub base_url: String,

    /// Upper bound for a single weather request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Requested position accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationAccuracy {
    Lowest,
    Low,
    Balanced,
    #[default]
    High,
    Highest,
    BestForNavigation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// User consent for location access. `false` behaves like a denied permission.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub accuracy: LocationAccuracy,

    /// Minimum time between position updates
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Minimum displacement between position updates
    #[serde(default = "default_min_distance_meters")]
    pub min_distance_meters: f64,

    /// IP geolocation endpoint (ip-api.com compatible)
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Reverse geocoding endpoint (Nominatim compatible)
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_min_distance_meters() -> f64 {
    10.0
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            accuracy: LocationAccuracy::default(),
            min_interval_ms: default_min_interval_ms(),
            min_distance_meters: default_min_distance_meters(),
            ip_lookup_url: default_ip_lookup_url(),
            geocoder_url: default_geocoder_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Title shown at the top of the panel
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "Climinha".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("climinha");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `CLIMINHA_CONFIG` or the default location,
    /// creating a default file if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it with defaults if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !config_path.exists() {
            let config = Self {
                config_dir,
                ..Self::default()
            };
            config.save_to(config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_dir = config_dir;

        Ok(config)
    }

    /// [`Config::load`] followed by [`Config::validate`].
    ///
    /// Fails on any validation error. Warnings are logged and handed back.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    pub fn load_validated_from(
        config_path: &Path,
    ) -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.summary()));
        }

        for issue in &validation.warnings {
            tracing::warn!(field = %issue.field, "{}", issue.message);
        }

        Ok((config, validation))
    }

    /// The API key to send to the weather provider.
    ///
    /// The environment wins over the file; blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        let non_blank = |k: String| {
            let k = k.trim().to_string();
            (!k.is_empty()).then_some(k)
        };

        std::env::var(API_KEY_ENV)
            .ok()
            .and_then(non_blank)
            .or_else(|| self.weather.api_key.clone().and_then(non_blank))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (field, raw) in [
            ("weather.base_url", &self.weather.base_url),
            ("location.ip_lookup_url", &self.location.ip_lookup_url),
            ("location.geocoder_url", &self.location.geocoder_url),
        ] {
            check_endpoint(&mut result, field, raw);
        }

        if self.weather.timeout_secs == 0 {
            result.error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 120 {
            result.warn("weather.timeout_secs", "Timeout is unusually long (>120s)");
        }

        if self.location.timeout_secs == 0 {
            result.error("location.timeout_secs", "Timeout must be greater than 0");
        }

        if self.location.min_interval_ms == 0 {
            result.error(
                "location.min_interval_ms",
                "Update interval must be greater than 0",
            );
        }

        if !self.location.min_distance_meters.is_finite()
            || self.location.min_distance_meters < 0.0
        {
            result.error(
                "location.min_distance_meters",
                "Distance must be a non-negative number",
            );
        }

        if !self.location.enabled {
            result.warn(
                "location.enabled",
                "Location access disabled - weather cannot be fetched",
            );
        }

        if self.resolve_api_key().is_none() {
            result.warn(
                "weather.api_key",
                format!("No API key configured (set {} or weather.api_key)", API_KEY_ENV),
            );
        }

        result
    }

    /// Save configuration to config.toml inside `config_dir`
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.config_dir.join("config.toml"))
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("climinha");

        Ok(config_dir.join("config.toml"))
    }
}

fn check_endpoint(result: &mut ValidationResult, field: &str, raw: &str) {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => return result.error(field, format!("not a valid URL: {}", e)),
    };

    if !matches!(url.scheme(), "http" | "https") {
        result.error(
            field,
            format!("unsupported scheme '{}', use http or https", url.scheme()),
        );
    }
    if url.host_str().is_none() {
        result.error(field, "URL has no host");
    }
}
