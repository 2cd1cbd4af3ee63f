use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::limits;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `"pretty"` (default) or `"json"`
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/portfolio.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Idle minutes before a session expires. 0 keeps the session until the
    /// browser closes.
    pub session_inactivity_minutes: i64,

    /// Maximum accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            secure_cookies: true,
            session_inactivity_minutes: 0,
            max_upload_bytes: limits::MAX_REQUEST_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every gallery image.
    pub upload_path: String,

    /// URL prefix the upload directory is served under.
    pub public_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_path: "static/uploads".to_string(),
            public_prefix: "/static/uploads".to_string(),
        }
    }
}

/// Credentials seeded on first start when the users table is empty.
///
/// These defaults are insecure and must be changed for any deployment that is
/// reachable from outside localhost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub default_username: String,

    pub default_password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            default_username: "admin".to_string(),
            default_password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            admin: AdminConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, or defaults when none exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            return Self::load_from_path(path);
        }

        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("folio").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".folio").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing(path: Option<&Path>) -> Result<bool> {
        let path = path.map_or_else(Self::default_config_path, Path::to_path_buf);
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.upload_path.trim().is_empty() {
            anyhow::bail!("storage.upload_path cannot be empty");
        }

        let prefix = &self.storage.public_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            anyhow::bail!("storage.public_prefix must start with '/' and name a sub-path");
        }

        if self.server.port == 0 {
            anyhow::bail!("server.port must be > 0");
        }

        if self.admin.default_username.is_empty() || self.admin.default_password.is_empty() {
            anyhow::bail!("Default admin credentials cannot be empty");
        }

        Ok(())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.storage.public_prefix, "/static/uploads");
        assert_eq!(config.admin.default_username, "admin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[admin]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [storage]
            upload_path = "/srv/gallery"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.storage.upload_path, "/srv/gallery");

        assert_eq!(config.storage.public_prefix, "/static/uploads");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_validate_rejects_relative_prefix() {
        let mut config = Config::default();
        config.storage.public_prefix = "uploads".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.public_prefix = "/".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.admin.default_password = String::new();
        assert!(config.validate().is_err());
    }
}
