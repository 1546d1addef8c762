use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    #[serde(default)]
    pub collaborators: Vec<CollaboratorConfig>,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    /// tracing filter directive, e.g. "info" or "accountd=debug,info".
    pub log_level: String,

    /// Tokio worker threads. 0 means let the runtime decide.
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "data/accountd.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn database_url(&self) -> String {
        if self.database_path.starts_with("sqlite:") {
            self.database_path.clone()
        } else {
            format!("sqlite:{}", self.database_path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Set the `Secure` attribute on session cookies. Leave on everywhere
    /// except local plain-http development.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7040,
            cors_allowed_origins: Vec::new(),
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC key for access-token signing. Must be overridden in production;
    /// `validate` rejects the empty default.
    pub jwt_secret: String,

    pub access_ttl_minutes: i64,

    pub refresh_ttl_days: i64,

    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
            argon2_memory_cost_kib: 19 * 1024,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

/// One sibling service reachable over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    pub name: String,

    pub base_url: String,

    #[serde(default = "default_collaborator_timeout")]
    pub timeout_secs: u64,
}

const fn default_collaborator_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        for path in Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(&path);
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

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        if let Ok(path) = std::env::var("ACCOUNTD_CONFIG") {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("config.toml"));
        paths.push(PathBuf::from("/etc/accountd/config.toml"));

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.is_empty() {
            anyhow::bail!("security.jwt_secret must be set");
        }

        if self.security.access_ttl_minutes <= 0 || self.security.refresh_ttl_days <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }

        for collaborator in &self.collaborators {
            if collaborator.base_url.is_empty() {
                anyhow::bail!("collaborator '{}' has an empty base_url", collaborator.name);
            }
        }

        Ok(())
    }

    /// Collaborator entry by name, if configured.
    #[must_use]
    pub fn find_collaborator(&self, name: &str) -> Option<&CollaboratorConfig> {
        self.collaborators.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 7040);
        assert_eq!(config.security.access_ttl_minutes, 15);
        assert_eq!(config.security.refresh_ttl_days, 7);
        assert!(config.server.secure_cookies);
    }

    #[test]
    fn validate_rejects_empty_jwt_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_collaborator_list() {
        let toml = r#"
            [security]
            jwt_secret = "test-secret"

            [[collaborators]]
            name = "profile"
            base_url = "http://127.0.0.1:7041"

            [[collaborators]]
            name = "notification"
            base_url = "http://127.0.0.1:7042"
            timeout_secs = 3
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.collaborators.len(), 2);
        assert_eq!(config.find_collaborator("profile").unwrap().timeout_secs, 10);
        assert_eq!(
            config.find_collaborator("notification").unwrap().timeout_secs,
            3
        );
    }
}
