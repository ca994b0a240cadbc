//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration (only needed by the Redis cache backend).
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Page cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication collaborator configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`PostgreSQL` in production).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Which page cache implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Process-local cache.
    #[default]
    Memory,
    /// Shared Redis cache.
    Redis,
}

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache backend.
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// How long a rendered index page stays cached.
    #[serde(default = "default_index_ttl_secs")]
    pub index_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            index_ttl_secs: default_index_ttl_secs(),
        }
    }
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// URL prefix uploaded files are served under.
    #[serde(default = "default_media_url")]
    pub media_url: String,
    /// Maximum accepted request body size for uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            media_url: default_media_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Settings shared with the external authentication subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Where unauthenticated callers are redirected.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            session_cookie: default_session_cookie(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_redis_prefix() -> String {
    "yatube".to_string()
}

const fn default_index_ttl_secs() -> u64 {
    20
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_login_url() -> String {
    "/auth/login/".to_string()
}

fn default_session_cookie() -> String {
    "sessionid".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `YATUBE_ENV`)
    /// 4. Environment variables with `YATUBE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("YATUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            url = "http://localhost:8000"

            [database]
            url = "postgres://localhost/yatube"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.index_ttl_secs, 20);
        assert_eq!(config.auth.login_url, "/auth/login/");
        assert_eq!(config.storage.media_root, PathBuf::from("./media"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_redis_cache_backend() {
        let config = parse(
            r#"
            [server]
            url = "http://localhost:8000"

            [database]
            url = "postgres://localhost/yatube"

            [redis]
            url = "redis://localhost:6379"

            [cache]
            backend = "redis"
            index_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, CacheBackendKind::Redis);
        assert_eq!(config.cache.index_ttl_secs, 60);
        assert_eq!(config.redis.unwrap().prefix, "yatube");
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let result = parse(
            r#"
            [server]
            url = "http://localhost:8000"
            "#,
        );
        assert!(result.is_err());
    }
}
