use daybook_core::models::EventEntry;
use daybook_core::sync::{SyncTiming, GITHUB_API_URL, SYNC_FILE_NAME};
use daybook_core::NotesScope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    CommandLine,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::CommandLine => write!(f, "command line"),
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

/// Overrides for the automatic sync delays, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_after_change_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pull_gap_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_push_gap_ms: Option<u64>,
}

impl TimingConfig {
    pub fn to_timing(&self) -> SyncTiming {
        let defaults = SyncTiming::default();
        let ms = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_millis).unwrap_or(default)
        };
        SyncTiming {
            debounce: ms(self.debounce_ms, defaults.debounce),
            // A zero interval would make tokio panic.
            pull_interval: ms(self.pull_interval_ms.filter(|v| *v > 0), defaults.pull_interval),
            quiet_after_change: ms(self.quiet_after_change_ms, defaults.quiet_after_change),
            min_pull_gap: ms(self.min_pull_gap_ms, defaults.min_pull_gap),
            min_push_gap: ms(self.min_push_gap_ms, defaults.min_push_gap),
        }
    }
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Gist used when no target was given or saved
    pub default_gist_id: Option<String>,
    /// GitHub API root
    pub api_url: String,
    /// File inside the gist that holds the payload
    pub file_name: String,
    /// Push automatically after write commands (default: false)
    pub auto_sync: bool,
    pub timing: TimingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_gist_id: None,
            api_url: GITHUB_API_URL.to_string(),
            file_name: SYNC_FILE_NAME.to_string(),
            auto_sync: false,
            timing: TimingConfig::default(),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local store
    pub data_dir: ConfigValue<PathBuf>,
    /// Explicit sync target for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gist_id: Option<ConfigValue<String>>,
    /// GitHub token for this run. Never written anywhere.
    #[serde(skip)]
    pub token: Option<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
    pub notes_scope: NotesScope,
    pub seed_notes: BTreeMap<String, String>,
    pub calendar_events: Vec<EventEntry>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
    notes_scope: Option<NotesScope>,
    seed_notes: Option<BTreeMap<String, String>>,
    calendar_events: Option<Vec<EventEntry>>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(config_path)?;

        if let Some(dir) = env_var("DAYBOOK_DATA_DIR") {
            config.data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(id) = env_var("DAYBOOK_GIST_ID") {
            config.gist_id = Some(ConfigValue::new(id, ConfigSource::Environment));
        }
        config.token = env_var("DAYBOOK_GITHUB_TOKEN");

        Ok(config)
    }

    /// Defaults plus the config file, without environment overrides
    fn load_file(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self {
            data_dir: ConfigValue::new(Self::default_data_dir(), ConfigSource::Default),
            gist_id: None,
            token: None,
            config_file: None,
            sync: SyncConfig::default(),
            notes_scope: NotesScope::default(),
            seed_notes: BTreeMap::new(),
            calendar_events: Vec::new(),
        };

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if !path.exists() {
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError(path.clone(), e))?;
        let file_config: ConfigFile = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

        if let Some(dir) = file_config.data_dir {
            // Resolve relative paths against config file's directory
            let resolved = if dir.is_relative() {
                path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
            } else {
                dir
            };
            config.data_dir = ConfigValue::new(resolved, ConfigSource::File);
        }
        if let Some(sync) = file_config.sync {
            config.sync = sync;
        }
        if let Some(scope) = file_config.notes_scope {
            config.notes_scope = scope;
        }
        if let Some(seeds) = file_config.seed_notes {
            config.seed_notes = seeds;
        }
        if let Some(events) = file_config.calendar_events {
            config.calendar_events = events;
        }
        config.config_file = Some(path);

        Ok(config)
    }

    /// Replaces the explicit sync target with one given on the command line
    pub fn with_gist_override(mut self, gist: Option<String>) -> Self {
        if let Some(id) = gist.filter(|id| !id.trim().is_empty()) {
            self.gist_id = Some(ConfigValue::new(id, ConfigSource::CommandLine));
        }
        self
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/daybook/
    /// - macOS: ~/Library/Application Support/daybook/
    /// - Windows: %APPDATA%/daybook/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daybook")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/daybook/
    /// - macOS: ~/Library/Application Support/daybook/
    /// - Windows: %APPDATA%/daybook/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daybook")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
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
