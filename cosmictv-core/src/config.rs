use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub channels: ChannelsConfig,
    pub presence: PresenceConfig,
    pub auth: AuthConfig,
    pub sessions: SessionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 5000,
        }
    }
}

/// Playlist directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Directory scanned for *.m3u / *.m3u8 playlist files
    pub dir: String,
    /// Poll interval for the directory watcher, in seconds
    pub watch_interval_seconds: u64,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            dir: "./channels".to_string(),
            watch_interval_seconds: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// A viewer without a touch for longer than this is no longer live
    pub viewer_ttl_seconds: u64,
    /// How often stale presence/session entries are physically removed
    pub sweep_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            viewer_ttl_seconds: 60,
            sweep_interval_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path to the users.json account file
    pub users_file: String,
    /// Shared secret for the admin API; admin routes reject everything when unset
    pub admin_api_key: Option<String>,
    /// Trial window reported at login for accounts without an expiry
    pub trial_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_file: "./users.json".to_string(),
            admin_api_key: None,
            trial_days: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Whether to mirror per-user active session counts back into users.json
    pub persist_active_counts: bool,
    /// Interval between persistence passes, in seconds
    pub persist_interval_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            persist_active_counts: true,
            persist_interval_seconds: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (COSMICTV_SERVER_HOST, etc.)
        builder = builder.add_source(
            Environment::with_prefix("COSMICTV")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Get HTTP bind address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Fail fast on nonsensical values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.channels.watch_interval_seconds == 0 {
            errors.push("channels.watch_interval_seconds must be at least 1".to_string());
        }
        if self.presence.viewer_ttl_seconds == 0 {
            errors.push("presence.viewer_ttl_seconds must be at least 1".to_string());
        }
        if self.presence.sweep_interval_seconds == 0 {
            errors.push("presence.sweep_interval_seconds must be at least 1".to_string());
        }
        if self.auth.admin_api_key.as_deref() == Some("") {
            errors.push("auth.admin_api_key must not be empty when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
