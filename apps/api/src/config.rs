//! API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional
//! `comanda.toml` (or the file named by `COMANDA_CONFIG`), then `COMANDA_*`
//! environment variables (`COMANDA_PORT=8080`, `COMANDA_JWT_SECRET=...`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "comanda.toml";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file (`:memory:` for a throwaway database)
    pub database_path: String,

    /// Pool size
    pub database_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Origins allowed by CORS; empty allows any
    pub cors_origins: Vec<String>,

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "data/comanda.db".to_string(),
            database_max_connections: 5,
            jwt_secret: "comanda-dev-secret-change-in-production".to_string(),
            jwt_lifetime_secs: 86_400, // 1 day
            cors_origins: vec!["http://localhost:5173".to_string()],
            log_filter: "info,comanda_api=debug,comanda_db=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("COMANDA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&file))
    }

    /// Same as [`AppConfig::load`] with an explicit config file path.
    /// A missing file is not an error.
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let config: AppConfig = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("COMANDA")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue("database_max_connections".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// `host:port` as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.jwt_lifetime_secs, 86_400);
    }

    #[test]
    fn test_rejects_empty_secret() {
        let config = AppConfig {
            jwt_secret: "  ".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_lifetime() {
        let config = AppConfig {
            jwt_lifetime_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
