//! Configuration management for the `lifecost` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::LifeCostError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `lifecost` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeCostConfig {
    /// Upstream data provider configuration
    pub api: ApiConfig,
    /// Pacing of the ETL run
    pub etl: EtlConfig,
    /// Reference-data store configuration
    pub store: StoreConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// OpenTelemetry export
    pub telemetry: TelemetryConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// Upstream data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// RapidAPI key shared by the air quality and cost of living providers
    pub rapidapi_key: Option<String>,
    pub air_quality_host: String,
    pub cost_of_living_host: String,
    pub world_bank_base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub air_quality_delay_ms: u64,
    pub cost_of_living_delay_ms: u64,
    pub life_expectancy_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of the city database
    pub path: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache TTL in hours
    pub ttl_hours: u32,
    /// Cache directory location
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// OTLP/HTTP collector endpoint; export is disabled when unset
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the front-end bundle served for non-API paths
    pub static_dir: Option<String>,
    pub request_timeout_seconds: u32,
    pub max_body_bytes: usize,
}

// Default value functions
fn default_air_quality_host() -> String {
    "weather-api167.p.rapidapi.com".to_string()
}

fn default_cost_of_living_host() -> String {
    "find-places-to-live.p.rapidapi.com".to_string()
}

fn default_world_bank_base_url() -> String {
    "https://api.worldbank.org/v2".to_string()
}

fn default_api_timeout() -> u32 {
    30
}

fn default_api_max_retries() -> u32 {
    3
}

fn default_store_path() -> String {
    "~/.local/share/lifecost/store".to_string()
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    "~/.cache/lifecost".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_service_name() -> String {
    "lifecost".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: None,
            air_quality_host: default_air_quality_host(),
            cost_of_living_host: default_cost_of_living_host(),
            world_bank_base_url: default_world_bank_base_url(),
            timeout_seconds: default_api_timeout(),
            max_retries: default_api_max_retries(),
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            air_quality_delay_ms: 500,
            cost_of_living_delay_ms: 300,
            life_expectancy_delay_ms: 200,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            request_timeout_seconds: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Expand a leading `~/` to the user's home directory
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl LifeCostConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // LIFECOST_API__TIMEOUT_SECONDS=10 overrides api.timeout_seconds
        builder = builder.add_source(
            Environment::with_prefix("LIFECOST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: LifeCostConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.api.rapidapi_key.is_none() {
            config.api.rapidapi_key = std::env::var("RAPIDAPI_KEY").ok().filter(|k| !k.is_empty());
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lifecost").join("config.toml"))
    }

    /// Apply default values to fields left empty
    pub fn apply_defaults(&mut self) {
        if self.api.air_quality_host.is_empty() {
            self.api.air_quality_host = default_air_quality_host();
        }
        if self.api.cost_of_living_host.is_empty() {
            self.api.cost_of_living_host = default_cost_of_living_host();
        }
        if self.api.world_bank_base_url.is_empty() {
            self.api.world_bank_base_url = default_world_bank_base_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_api_timeout();
        }
        if self.store.path.is_empty() {
            self.store.path = default_store_path();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is optional: without it only the World Bank data is fetched
        if let Some(api_key) = &self.api.rapidapi_key {
            if api_key.is_empty() {
                return Err(LifeCostError::config(
                    "RapidAPI key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(LifeCostError::config(
                    "RapidAPI key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(LifeCostError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.api.max_retries > 10 {
            return Err(LifeCostError::config("API max retries cannot exceed 10").into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                LifeCostError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(LifeCostError::config("Server request timeout must be positive").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(LifeCostError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(LifeCostError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let is_http = |url: &str| url.starts_with("http://") || url.starts_with("https://");
        if !is_http(&self.api.world_bank_base_url) {
            return Err(LifeCostError::config(
                "World Bank base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }
        if let Some(endpoint) = &self.telemetry.otlp_endpoint
            && !is_http(endpoint)
        {
            return Err(
                LifeCostError::config("OTLP endpoint must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }

    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.store.path)
    }

    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        expand_path(&self.cache.location)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache.ttl_hours) * 3600)
    }

    /// Deadline for one HTTP request to the API server
    #[must_use]
    pub fn server_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.server.request_timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LifeCostConfig::default();
        assert_eq!(config.api.world_bank_base_url, "https://api.worldbank.org/v2");
        assert_eq!(config.api.air_quality_host, "weather-api167.p.rapidapi.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.etl.air_quality_delay_ms, 500);
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8080);
        assert!(config.api.rapidapi_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = LifeCostConfig::default();
        config.api.rapidapi_key = Some("abc".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());

        config.api.rapidapi_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = LifeCostConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = LifeCostConfig::default();
        config.api.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_otlp_endpoint() {
        let mut config = LifeCostConfig::default();
        config.telemetry.otlp_endpoint = Some("collector:4318".to_string());
        assert!(config.validate().is_err());
        config.telemetry.otlp_endpoint = Some("http://collector:4318".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[logging]\nformat = \"json\"\n\n[cache]\nttl_hours = 0"
        )
        .unwrap();

        let config = LifeCostConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, "json");
        // Zero is treated as unset
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.api.max_retries, 3);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/var/lib/x"), PathBuf::from("/var/lib/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/data"), home.join("data"));
        }
    }

    #[test]
    fn test_config_path_generation() {
        let path = LifeCostConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("lifecost"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
