use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tracking: TrackingConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Upper bound in milliseconds for a single store call (default: 5000)
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
}

fn default_store_timeout() -> u64 {
    5000 // 5 seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Step a new form session starts on. Steps 1-2 happen before tracking begins.
    #[serde(default = "default_initial_step")]
    pub initial_step: u32,
    /// Analytics window used when a request doesn't name one
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
    /// Minutes of inactivity after which a visitor's next page view opens a new session
    #[serde(default = "default_visitor_idle")]
    pub visitor_idle_minutes: u64,
}

fn default_initial_step() -> u32 {
    3
}

fn default_window_days() -> u32 {
    30
}

fn default_visitor_idle() -> u64 {
    30 // 30 minutes
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            initial_step: default_initial_step(),
            default_window_days: default_window_days(),
            visitor_idle_minutes: default_visitor_idle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub data: String,
}

/// Which record store backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// JSON documents under `paths.data`
    #[default]
    File,
    /// Process-local; everything is lost on exit
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether the API server logs to a file under the data directory (false = stderr)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    false
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".leadtrack/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the service runs without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/leadtrack/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("leadtrack").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. LEADTRACK__SERVER__PORT=8080
        builder = builder.add_source(
            config::Environment::with_prefix("LEADTRACK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .leadtrack/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::local_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Write config as TOML to `config_path`, creating parent directories
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Render the effective config as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to the data directory
    pub fn data_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.data);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.data_path().join("logs")
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.server.store_timeout_ms)
    }

    /// Idle gap that ends a visitor session; absurd values saturate
    pub fn visitor_idle_gap(&self) -> chrono::TimeDelta {
        i64::try_from(self.tracking.visitor_idle_minutes)
            .ok()
            .and_then(chrono::TimeDelta::try_minutes)
            .unwrap_or(chrono::TimeDelta::MAX)
    }

    /// Resolve an optional request window against the configured default
    pub fn window_days(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.tracking.default_window_days)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: crate::rest::DEFAULT_PORT,
                store_timeout_ms: default_store_timeout(),
            },
            tracking: TrackingConfig::default(),
            paths: PathsConfig {
                data: ".leadtrack/data".to_string(), // Relative to cwd
            },
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
