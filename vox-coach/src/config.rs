//! Configuration resolution for vox-coach
//!
//! Each setting resolves with CLI → ENV → TOML → default priority. Command
//! line values (which clap may itself fill from `VOX_COACH_PORT`) arrive as
//! [`CliOverrides`].
//!
//! A missing speech or generation key is not a startup error: the service
//! starts and reports `CONFIGURATION_MISSING` on each request that needs it.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};
use vox_common::config::{default_sqlite_path, DatastoreBackend, TomlConfig, DEFAULT_PORT};
use vox_common::{Error, Result};

use crate::services::generation::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::services::RetryPolicy;

pub const ENV_SPEECH_API_KEY: &str = "VOX_GOOGLE_CLOUD_API_KEY";
pub const ENV_GENERATION_API_KEY: &str = "VOX_GEMINI_API_KEY";
pub const ENV_DATASTORE_URL: &str = "VOX_SUPABASE_URL";
pub const ENV_DATASTORE_KEY: &str = "VOX_SUPABASE_SERVICE_KEY";
pub const ENV_SQLITE_PATH: &str = "VOX_SQLITE_PATH";
pub const ENV_LOG: &str = "VOX_LOG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
const DATASTORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Where attempt and user records go
#[derive(Debug, Clone, PartialEq)]
pub enum DatastoreSettings {
    None,
    Rest { url: String, service_key: String },
    Sqlite { path: PathBuf },
}

impl DatastoreSettings {
    pub fn label(&self) -> &'static str {
        match self {
            DatastoreSettings::None => "none",
            DatastoreSettings::Rest { .. } => "rest",
            DatastoreSettings::Sqlite { .. } => "sqlite",
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub log_level: String,

    pub speech_api_key: Option<String>,
    pub recognition_base_url: Option<String>,
    pub synthesis_base_url: Option<String>,
    pub speech_timeout: Duration,

    pub generation_api_key: Option<String>,
    pub generation_base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub generation_timeout: Duration,

    pub retry: RetryPolicy,
    pub datastore: DatastoreSettings,
    pub datastore_timeout: Duration,
}

impl CoachConfig {
    /// Resolve configuration from CLI values, the environment and TOML
    pub fn resolve(toml: &TomlConfig, cli: &CliOverrides) -> Result<Self> {
        let host = cli
            .host
            .clone()
            .or_else(|| toml.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(toml.port).unwrap_or(DEFAULT_PORT);

        let log_level = cli
            .log_level
            .clone()
            .or_else(|| env_value(ENV_LOG))
            .unwrap_or_else(|| toml.logging.level.clone());

        let max_body_bytes = toml.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
        if max_body_bytes == 0 {
            return Err(Error::Config("max_body_bytes must be greater than 0".to_string()));
        }

        let temperature = toml.generation.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::Config(format!(
                "generation.temperature must be between 0 and 2, got {}",
                temperature
            )));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: toml.retry.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: toml
                .retry
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: toml
                .retry
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
        };

        let speech_api_key = resolve_key("Speech API key", ENV_SPEECH_API_KEY, toml.speech.api_key.as_deref());
        let generation_api_key = resolve_key(
            "Generation API key",
            ENV_GENERATION_API_KEY,
            toml.generation.api_key.as_deref(),
        );

        if speech_api_key.is_none() {
            warn!("Speech API key not configured ({} unset): analysis and text-to-speech will be unavailable", ENV_SPEECH_API_KEY);
        }
        if generation_api_key.is_none() {
            warn!("Generation API key not configured ({} unset): analysis will be unavailable", ENV_GENERATION_API_KEY);
        }

        Ok(Self {
            host,
            port,
            max_body_bytes,
            log_level,
            speech_api_key,
            recognition_base_url: toml.speech.recognition_base_url.clone(),
            synthesis_base_url: toml.speech.synthesis_base_url.clone(),
            speech_timeout: Duration::from_secs(
                toml.speech.timeout_secs.unwrap_or(DEFAULT_SPEECH_TIMEOUT_SECS),
            ),
            generation_api_key,
            generation_base_url: toml.generation.base_url.clone(),
            model: toml
                .generation
                .model
                .clone()
                .filter(|m| is_valid_key(m))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            generation_timeout: Duration::from_secs(
                toml.generation.timeout_secs.unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
            ),
            retry,
            datastore: resolve_datastore(toml)?,
            datastore_timeout: DATASTORE_TIMEOUT,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_key(v))
}

/// Resolve a secret from ENV, then TOML
///
/// Only the source is logged, never the value.
pub fn resolve_key(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = env_value(env_var);
    let toml_key = toml_value.filter(|k| is_valid_key(k)).map(str::to_string);

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(key) = env_key {
        info!("{} loaded from environment variable {}", label, env_var);
        return Some(key);
    }
    if let Some(key) = toml_key {
        info!("{} loaded from TOML config", label);
        return Some(key);
    }
    None
}

/// Pick the datastore backend
///
/// `auto` selects REST when both the endpoint and the service key are
/// known, then SQLite when a database path was given, otherwise nothing.
fn resolve_datastore(toml: &TomlConfig) -> Result<DatastoreSettings> {
    let url = env_value(ENV_DATASTORE_URL).or_else(|| toml.datastore.url.clone().filter(|u| is_valid_key(u)));
    let service_key = resolve_key(
        "Datastore service key",
        ENV_DATASTORE_KEY,
        toml.datastore.service_key.as_deref(),
    );
    let explicit_sqlite_path = env_value(ENV_SQLITE_PATH)
        .map(PathBuf::from)
        .or_else(|| toml.datastore.sqlite_path.clone());

    let settings = match toml.datastore.backend {
        DatastoreBackend::None => DatastoreSettings::None,
        DatastoreBackend::Rest => match (url, service_key) {
            (Some(url), Some(service_key)) => DatastoreSettings::Rest { url, service_key },
            _ => {
                return Err(Error::Config(format!(
                    "datastore.backend = \"rest\" needs both {} and {} (or [datastore] url and service_key)",
                    ENV_DATASTORE_URL, ENV_DATASTORE_KEY
                )))
            }
        },
        DatastoreBackend::Sqlite => DatastoreSettings::Sqlite {
            path: explicit_sqlite_path.unwrap_or_else(default_sqlite_path),
        },
        DatastoreBackend::Auto => match (url, service_key, explicit_sqlite_path) {
            (Some(url), Some(service_key), _) => DatastoreSettings::Rest { url, service_key },
            (_, _, Some(path)) => DatastoreSettings::Sqlite { path },
            _ => DatastoreSettings::None,
        },
    };

    info!("Datastore backend: {}", settings.label());
    Ok(settings)
}
