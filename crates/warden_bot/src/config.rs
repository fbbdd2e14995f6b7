//! Bot configuration.
//!
//! Sources are merged in order, later ones winning:
//! - Bundled defaults (include_str! from warden.toml)
//! - `~/.config/warden/warden.toml`
//! - `./warden.toml`
//! - An explicit file, usually from `--config`
//! - `WARDEN_<SECTION>__<KEY>` environment variables

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};
use warden_cache::TtlCacheConfig;
use warden_error::{ConfigError, WardenResult};
use warden_moderation::ModerationConfig;
use warden_social::TELEGRAM_API_URL;

const DEFAULT_CONFIG: &str = include_str!("../../../warden.toml");

/// Top-level bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Getters)]
pub struct BotConfig {
    /// Bot API access
    #[serde(default)]
    telegram: TelegramSection,
    /// Lookup caches
    #[serde(default)]
    cache: CacheSection,
    /// Moderation behaviour and commands
    #[serde(default)]
    moderation: ModerationConfig,
    /// State persistence
    #[serde(default)]
    store: StoreSection,
    /// Health API
    #[serde(default)]
    http: HttpSection,
    /// Log output
    #[serde(default)]
    logging: LoggingSection,
}

/// `[telegram]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct TelegramSection {
    /// Bot token
    #[serde(default)]
    token: String,
    /// Bot API base URL
    #[serde(default = "default_api_url")]
    api_url: String,
    /// Long-poll wait (seconds)
    #[serde(default = "default_poll_timeout_secs")]
    poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSection")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl TelegramSection {
    /// Long-poll wait as a duration.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn default_api_url() -> String {
    TELEGRAM_API_URL.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CacheSection {
    /// TTL for quarantine and group lookups (seconds)
    #[serde(default = "default_ttl_secs")]
    default_ttl_secs: u64,
    /// Sweep period for all caches (seconds)
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,
    /// TTL for cached admin checks (seconds)
    #[serde(default = "default_admin_ttl_secs")]
    admin_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            admin_ttl_secs: default_admin_ttl_secs(),
        }
    }
}

impl CacheSection {
    /// Settings for the quarantine and group caches.
    pub fn ttl_config(&self) -> TtlCacheConfig {
        TtlCacheConfig::default()
            .with_default_ttl_secs(self.default_ttl_secs)
            .with_sweep_interval_secs(self.sweep_interval_secs)
    }

    /// Settings for the admin-check cache.
    pub fn admin_config(&self) -> TtlCacheConfig {
        TtlCacheConfig::default()
            .with_default_ttl_secs(self.admin_ttl_secs)
            .with_sweep_interval_secs(self.sweep_interval_secs)
    }
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_admin_ttl_secs() -> u64 {
    60
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Getters)]
pub struct StoreSection {
    /// JSON snapshot file; in-memory only when unset
    #[serde(default)]
    path: Option<PathBuf>,
}

/// `[http]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct HttpSection {
    /// Serve the health API
    #[serde(default = "default_http_enabled")]
    enabled: bool,
    /// Listen address
    #[serde(default = "default_bind")]
    bind: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind: default_bind(),
        }
    }
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Log output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    level: String,
    /// Output format
    #[serde(default)]
    format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl BotConfig {
    /// Load configuration from every source, `path` included if given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a source cannot be read or parsed, or
    /// if the result fails [`BotConfig::validate`].
    pub fn load(path: Option<&Path>) -> WardenResult<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`BotConfig::load`], reading `WARDEN_*` variables from `env`
    /// instead of the process environment when given.
    #[instrument(skip(env))]
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> WardenResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/warden/warden.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("warden").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load only the bundled defaults and one file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> WardenResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the bot cannot start with.
    pub fn validate(&self) -> WardenResult<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::new(
                "telegram.token is required (set WARDEN_TELEGRAM__TOKEN)",
            ).into());
        }
        if self.telegram.api_url.trim().is_empty() {
            return Err(ConfigError::new("telegram.api_url must not be empty").into());
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::new("cache.sweep_interval_secs must be positive").into());
        }
        if self.cache.default_ttl_secs == 0 || self.cache.admin_ttl_secs == 0 {
            return Err(ConfigError::new("cache TTLs must be positive").into());
        }
        if self.moderation.quarantine_command().trim().is_empty()
            || self.moderation.release_command().trim().is_empty()
        {
            return Err(ConfigError::new("moderation commands must not be empty").into());
        }
        if self.http.enabled {
            self.bind_addr()?;
        }
        Ok(())
    }

    /// Parsed `http.bind`.
    pub fn bind_addr(&self) -> WardenResult<SocketAddr> {
        self.http.bind.parse().map_err(|e| {
            ConfigError::new(format!("http.bind '{}' is not an address: {}", self.http.bind, e))
                .into()
        })
    }

    /// Replace the token, as done for `--token`-style overrides in tests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.telegram.token = token.into();
        self
    }

    /// Replace the health API bind address.
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.http.bind = bind.into();
        self
    }
}
