use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Account service URL (e.g., "https://sync.partydeck.app")
    pub server_url: Option<String>,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Signed-in user id; sync is meaningless without one
    pub user_id: Option<String>,
    /// Enable automatic sync after writes (default: false)
    #[serde(default)]
    pub auto_sync: bool,
}

impl SyncConfig {
    /// Returns true if sync is configured (server, key, and user present)
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some() && self.user_id.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Locale for new tiles and groups
    pub locale: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    locale: Option<String>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("partydeck.db");

        // Start with defaults
        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut locale = ConfigValue::new("en".to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(file_locale) = file_config.locale {
                locale = ConfigValue::new(file_locale, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("PARTYDECK_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(env_locale) = std::env::var("PARTYDECK_LOCALE") {
            locale = ConfigValue::new(env_locale, ConfigSource::Environment);
        }
        // Sync env var overrides
        if let Ok(url) = std::env::var("PARTYDECK_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("PARTYDECK_SYNC_API_KEY") {
            sync.api_key = Some(key);
        }
        if let Ok(user) = std::env::var("PARTYDECK_SYNC_USER_ID") {
            sync.user_id = Some(user);
        }

        Ok(Self {
            database_path,
            locale,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/partydeck/
    /// - macOS: ~/Library/Application Support/partydeck/
    /// - Windows: %APPDATA%/partydeck/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("partydeck")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/partydeck/
    /// - macOS: ~/Library/Application Support/partydeck/
    /// - Windows: %APPDATA%/partydeck/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("partydeck")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
