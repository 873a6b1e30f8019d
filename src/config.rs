use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::models::ClusteringParams;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub music: MusicSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_interest_clustering")]
    pub interest: ClusteringConfig,
    #[serde(default = "default_psychology_clustering")]
    pub psychology: ClusteringConfig,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            interest: default_interest_clustering(),
            psychology: default_psychology_clustering(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub seed: u64,
}

impl From<&ClusteringConfig> for ClusteringParams {
    fn from(config: &ClusteringConfig) -> Self {
        Self {
            clusters: config.clusters,
            n_init: config.n_init,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            seed: config.seed,
        }
    }
}

fn default_clusters() -> usize { 5 }
fn default_n_init() -> usize { 10 }
fn default_max_iterations() -> usize { 300 }
fn default_tolerance() -> f64 { 1e-4 }

fn default_interest_clustering() -> ClusteringConfig {
    ClusteringConfig {
        clusters: default_clusters(),
        n_init: default_n_init(),
        max_iterations: default_max_iterations(),
        tolerance: default_tolerance(),
        seed: 0,
    }
}

fn default_psychology_clustering() -> ClusteringConfig {
    ClusteringConfig {
        seed: 42,
        ..default_interest_clustering()
    }
}

/// Which classifier implementation scores statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Models served by an inference server
    Http,
    /// Built-in keyword classifier, no model needed
    Lexicon,
    /// Premium tiers disabled
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_backend")]
    pub backend: ClassifierBackend,
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_sentiment_model")]
    pub sentiment_model: String,
    #[serde(default = "default_personality_model")]
    pub personality_model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    /// Abort startup when a model cannot be loaded
    #[serde(default = "default_true")]
    pub required: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: default_inference_endpoint(),
            sentiment_model: default_sentiment_model(),
            personality_model: default_personality_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_classifier_timeout(),
            cache_size: default_cache_size(),
            required: default_true(),
        }
    }
}

fn default_backend() -> ClassifierBackend { ClassifierBackend::Http }
fn default_inference_endpoint() -> String { "http://localhost:8080".to_string() }
fn default_sentiment_model() -> String { "cardiffnlp/twitter-roberta-base-sentiment".to_string() }
fn default_personality_model() -> String { "Minej/bert-base-personality".to_string() }
fn default_batch_size() -> usize { 128 }
fn default_classifier_timeout() -> u64 { 30 }
fn default_cache_size() -> u64 { 10_000 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct MusicSettings {
    #[serde(default = "default_music_url")]
    pub base_url: String,
    #[serde(default = "default_music_timeout")]
    pub timeout_secs: u64,
    /// File holding a Spotify access token used when a request brings none
    pub token_path: Option<String>,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            base_url: default_music_url(),
            timeout_secs: default_music_timeout(),
            token_path: None,
        }
    }
}

fn default_music_url() -> String { "https://api.spotify.com".to_string() }
fn default_music_timeout() -> u64 { 10 }

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line plain text
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> LogFormat { LogFormat::Json }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TRAVELINK_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TRAVELINK__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TRAVELINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("TRAVELINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables used by deployments
///
/// `DATASET_PATH` and `INFERENCE_URL` win over file values.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(path) = env::var("DATASET_PATH") {
        builder = builder.set_override("dataset.path", path)?;
    }
    if let Ok(endpoint) = env::var("INFERENCE_URL") {
        builder = builder.set_override("classifier.endpoint", endpoint)?;
    }

    builder.build()
}
