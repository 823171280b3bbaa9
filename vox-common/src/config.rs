//! Bootstrap configuration loading
//!
//! The coaching service reads one TOML file at startup. Every section and
//! field is optional; missing values fall back to built-in defaults, and the
//! service layers environment variables and command-line arguments on top
//! (see `vox_coach::config`).
//!
//! # Example
//!
//! ```toml
//! port = 5790
//!
//! [logging]
//! level = "debug"
//!
//! [speech]
//! api_key = "..."
//!
//! [generation]
//! api_key = "..."
//! model = "gemini-2.5-flash"
//!
//! [datastore]
//! backend = "sqlite"
//! sqlite_path = "/var/lib/voxmentor/coaching.db"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default HTTP port of the coaching service
pub const DEFAULT_PORT: u16 = 5790;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Bind address (default 127.0.0.1)
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port (default 5790)
    #[serde(default)]
    pub port: Option<u16>,

    /// Largest accepted request body in bytes (base64 audio included)
    #[serde(default)]
    pub max_body_bytes: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub datastore: DatastoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Google Cloud speech services (recognition and synthesis share one key)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for the speech-to-text endpoint root
    #[serde(default)]
    pub recognition_base_url: Option<String>,
    /// Override for the text-to-speech endpoint root
    #[serde(default)]
    pub synthesis_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Generative-text service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Retry policy for the transcription and generation calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_backoff_ms: Option<u64>,
    #[serde(default)]
    pub max_backoff_ms: Option<u64>,
}

/// Which datastore receives attempt and user records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreBackend {
    /// REST if its URL and key are present, else SQLite if a path is set, else none
    #[default]
    Auto,
    /// PostgREST-compatible remote tables
    Rest,
    /// Local SQLite file
    Sqlite,
    /// Persistence disabled
    None,
}

/// Datastore configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub backend: DatastoreBackend,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
}

/// Default configuration file path for the platform
///
/// `<config_dir>/voxmentor/vox-coach.toml`, e.g.
/// `~/.config/voxmentor/vox-coach.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("voxmentor").join("vox-coach.toml"))
}

/// Default location of the local SQLite datastore
pub fn default_sqlite_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("voxmentor").join("coaching.db"))
        .unwrap_or_else(|| PathBuf::from("./voxmentor_data/coaching.db"))
}

/// Load TOML configuration from `path`
///
/// A missing file yields the default configuration; a file that exists but
/// cannot be read or parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!("Config file not found, using defaults: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// User-Agent sent on every outbound HTTP request
pub fn get_user_agent() -> String {
    format!("VoxMentor/{}", env!("CARGO_PKG_VERSION"))
}
