//! Service Configuration
//!
//! Layered: built-in defaults, then an optional `weather.toml` (path from
//! `WEATHER_CONFIG`), then `WEATHER_*` environment variables using `__`
//! between sections, e.g. `WEATHER_SERVER__PORT=3000`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    pub ingest: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Single operator account and session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub email: String,
    pub password: String,
    pub session_ttl_seconds: u64,
    pub cookie_name: String,
    /// Live sessions kept before the oldest is evicted
    pub max_sessions: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "admin@admin.com".to_string(),
            password: "pass".to_string(),
            session_ttl_seconds: 86_400,
            cookie_name: "session".to_string(),
            max_sessions: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WEATHER_CONFIG").unwrap_or_else(|_| "weather".to_string());

        Self::defaults()?
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("WEATHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub(crate) fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder().add_source(Config::try_from(&ApiConfig::default())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:3000");
        assert_eq!(config.auth.email, "admin@admin.com");
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.auth.max_sessions, 1024);
        assert!(!config.rate_limit.enabled);
        assert!(!config.ingest.enabled);
        assert_eq!(config.ingest.humidity_range, (0.0, 100.0));
    }

    #[test]
    fn test_defaults_survive_round_trip() {
        let config: ApiConfig = ApiConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [server]
            port = 8081

            [auth]
            password = "hunter2"
            max_sessions = 8

            [ingest]
            enabled = true

            [logging]
            json = true
        "#;

        let config: ApiConfig = ApiConfig::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.password, "hunter2");
        assert_eq!(config.auth.email, "admin@admin.com");
        assert_eq!(config.auth.max_sessions, 8);
        assert!(config.ingest.enabled);
        assert!(config.logging.json);
    }
}
