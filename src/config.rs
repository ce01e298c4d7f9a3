//! Runtime configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "SHORTCUT_SEARCH_CONFIG";
/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "SHORTCUT_SEARCH_PORT";
/// Environment variable overriding the engine store path.
pub const REGISTRY_ENV: &str = "SHORTCUT_SEARCH_REGISTRY";

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding the engine store.
    pub registry_path: PathBuf,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// OpenSearch discovery settings.
    pub discovery: DiscoveryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("engines.json"),
            server: ServerConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config file; absent keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load from the file named by [`CONFIG_ENV`] (if set), apply the
    /// environment overrides and validate.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{PORT_ENV} is not a port: {port}")))?;
        }
        if let Some(path) = std::env::var_os(REGISTRY_ENV) {
            config.registry_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the engine store path.
    #[must_use]
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Set the discovery request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.discovery.request_timeout = timeout;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }
        if self.discovery.request_timeout.is_zero() || self.discovery.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "discovery timeouts must be > 0".to_string(),
            ));
        }
        if self.discovery.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "discovery.max_document_bytes must be > 0".to_string(),
            ));
        }
        if self.discovery.cache.enabled && self.discovery.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "discovery.cache.max_entries must be > 0 when caching".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: crate::server::DEFAULT_PORT,
        }
    }
}

/// Settings for the HTTP transport used by discovery.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Bytes of a response body kept for scanning.
    pub max_document_bytes: usize,
    /// Result cache.
    pub cache: CacheConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("shortcut-search/{}", env!("CARGO_PKG_VERSION")),
            max_document_bytes: 2 * 1024 * 1024,
            cache: CacheConfig::default(),
        }
    }
}

/// Discovery result cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// TTL for discovered results (seconds).
    pub ttl_seconds: u64,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 256,
        }
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.registry_path, PathBuf::from("engines.json"));
        assert!(config.discovery.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AppConfig::new()
            .with_port(8080)
            .with_timeout(Duration::from_secs(60))
            .with_registry_path("/tmp/engines.json");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.discovery.request_timeout, Duration::from_secs(60));
        assert_eq!(config.registry_path, PathBuf::from("/tmp/engines.json"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"discovery": {"request_timeout": 3}}"#).unwrap();
        assert_eq!(config.discovery.request_timeout, Duration::from_secs(3));
        assert_eq!(config.discovery.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(AppConfig::new().with_port(0).validate().is_err());
        assert!(AppConfig::new().with_timeout(Duration::ZERO).validate().is_err());

        let mut config = AppConfig::new();
        config.discovery.max_document_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"registry_path": "e.json", "server": {"port": 9000}}"#).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.registry_path, PathBuf::from("e.json"));
    }
}
