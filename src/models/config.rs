//! Application configuration structures.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream site and HTTP client settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Cache location
    #[serde(default)]
    pub cache: CacheConfig,

    /// Periodic background sync
    #[serde(default)]
    pub sync: SyncConfig,

    /// HTTP API listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Accepted API bearer tokens
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        url::Url::parse(&self.crawler.base_url)
            .map_err(|e| AppError::validation(format!("crawler.base_url is invalid: {e}")))?;
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.sync.interval_secs == 0 {
            return Err(AppError::validation("sync.interval_secs must be > 0"));
        }
        self.server.socket_addr()?;
        if self.auth.tokens.iter().any(|t| t.token.trim().is_empty()) {
            return Err(AppError::validation("auth.tokens contains an empty token"));
        }
        Ok(())
    }
}

/// HTTP client and upstream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Upstream page that every request is issued against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests within one category sync
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay after each completed request in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: 0,
        }
    }
}

/// Where cache entries live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: defaults::cache_dir(),
        }
    }
}

/// Periodic sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Run the periodic sync alongside the API server
    #[serde(default = "defaults::sync_enabled")]
    pub enabled: bool,

    /// Seconds to sleep between two full cycles
    #[serde(default = "defaults::sync_interval")]
    pub interval_secs: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::sync_enabled(),
            interval_secs: defaults::sync_interval(),
        }
    }
}

/// HTTP API listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| AppError::validation(format!("server.bind '{}': {e}", self.bind)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Static bearer tokens accepted by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

/// A named bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    /// Principal name reported for requests using this token
    pub name: String,
    pub token: String,
}

mod defaults {
    use std::path::PathBuf;

    pub fn base_url() -> String {
        "http://vitibrasil.cnpuv.embrapa.br/index.php".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; vitistat/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("storage/cache")
    }
    pub fn sync_enabled() -> bool {
        true
    }
    pub fn sync_interval() -> u64 {
        600
    }
    pub fn bind() -> String {
        "127.0.0.1:8000".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_bind_and_base_url() {
        let mut config = Config::default();
        config.server.bind = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawler.base_url = "::nope".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_token() {
        let mut config = Config::default();
        config.auth.tokens.push(ApiToken {
            name: "ci".to_string(),
            token: " ".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 3

            [[auth.tokens]]
            name = "local"
            token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.timeout_secs, 3);
        assert_eq!(config.crawler.max_concurrent, 4);
        assert_eq!(config.sync.interval_secs, 600);
        assert_eq!(config.cache.dir, PathBuf::from("storage/cache"));
        assert_eq!(config.auth.tokens[0].name, "local");
    }
}
