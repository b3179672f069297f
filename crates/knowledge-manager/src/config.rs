//! Configuration management for knowledge-manager.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "knowledge-manager";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "entries.db";

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "KMAN_";

/// Fallback environment variable for the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `KMAN_`, `__` between sections)
/// 2. TOML config file at `~/.config/knowledge-manager/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Language model configuration.
    pub llm: LlmConfig,
    /// Feed sources.
    pub feeds: FeedsConfig,
    /// Web crawling.
    pub crawl: CrawlConfig,
    /// Video transcripts.
    pub transcript: TranscriptConfig,
    /// Chat loop.
    pub chat: ChatConfig,
    /// Entry filtering.
    pub filter: FilterConfig,
    /// Periodic polling.
    pub watch: WatchConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/knowledge-manager/entries.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of entries to retain.
    /// Set to 0 for unlimited.
    pub max_entries: usize,
    /// Maximum age of entries to retain in days.
    /// Set to 0 for unlimited.
    pub max_age_days: u32,
    /// Prune interval in hours.
    pub prune_interval_hours: u32,
}

/// Language model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key. Falls back to `GOOGLE_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model for link finding, titles and transcript work.
    pub model: String,
    /// Model for page summaries.
    pub summary_model: String,
    /// Model for the chat loop.
    pub chat_model: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Attempts per request, including the first one.
    pub max_retries: u32,
    /// Pause after each agent call, in seconds.
    pub call_delay_secs: u64,
}

/// Feed sources configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// RSS/Atom feed URLs.
    pub rss_feeds: Vec<String>,
    /// Entries kept per feed.
    pub rss_limit: usize,
    /// arXiv API base URL.
    pub arxiv_base_url: String,
    /// Search queries run against arXiv.
    pub arxiv_queries: Vec<String>,
    /// Results requested per arXiv query.
    pub arxiv_limit: usize,
}

/// Web crawling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Directory receiving run folders.
    pub output_dir: PathBuf,
    /// Upper bound on pages followed in one crawl.
    pub max_pages: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User agent sent with page and feed requests.
    pub user_agent: String,
}

/// Video transcript configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Directory receiving per-video folders.
    pub base_dir: PathBuf,
    /// Caption language requested.
    pub language: String,
    /// Base URL of the caption service.
    pub base_url: String,
}

/// Chat loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Name the assistant introduces itself with.
    pub bot_name: String,
    /// Number of exchanges sent back to the model.
    pub history_max_size: usize,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Entry filtering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Enable filtering before storage.
    pub enabled: bool,
    /// Regexes matched against titles and summaries.
    pub exclude_patterns: Vec<String>,
    /// Domains (and their subdomains) never stored.
    pub excluded_domains: Vec<String>,
}

/// Periodic polling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Minutes between polling cycles.
    pub interval_minutes: u64,
}

/// Log output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append log lines to this file in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            max_entries: 50_000,
            max_age_days: 0,
            prune_interval_hours: 24,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            summary_model: "gemini-2.5-pro".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 120,
            max_retries: 3,
            call_delay_secs: 5,
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            rss_feeds: default_rss_feeds(),
            rss_limit: 5,
            arxiv_base_url: "http://export.arxiv.org".to_string(),
            arxiv_queries: vec!["llm".to_string(), "agents".to_string(), "RAG".to_string()],
            arxiv_limit: 10,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            max_pages: 20,
            request_timeout_secs: 30,
            user_agent: concat!("knowledge-manager/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data/transcripts"),
            language: "en".to_string(),
            base_url: "https://www.youtube.com".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bot_name: "Sarah".to_string(),
            history_max_size: 6,
            temperature: 0.7,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_patterns: Vec::new(),
            excluded_domains: Vec::new(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
        }
    }
}

/// Default RSS feeds.
fn default_rss_feeds() -> Vec<String> {
    vec![
        "https://eugeneyan.com/rss/".to_string(),
        "https://www.philschmid.de/rss".to_string(),
        "https://lilianweng.github.io/index.xml".to_string(),
        "https://huggingface.co/blog/feed.xml".to_string(),
        "https://www.llamaindex.ai/blog/feed".to_string(),
        "https://blog.python.org/feeds/posts/default?alt=rss".to_string(),
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        fn invalid(message: impl Into<String>) -> Error {
            Error::ConfigValidation {
                message: message.into(),
            }
        }

        if self.feeds.rss_limit == 0 {
            return Err(invalid("feeds.rss_limit must be greater than 0"));
        }
        if self.feeds.arxiv_limit == 0 {
            return Err(invalid("feeds.arxiv_limit must be greater than 0"));
        }
        if self.crawl.max_pages == 0 {
            return Err(invalid("crawl.max_pages must be greater than 0"));
        }
        if self.watch.interval_minutes == 0 {
            return Err(invalid("watch.interval_minutes must be greater than 0"));
        }
        if self.llm.max_retries == 0 {
            return Err(invalid("llm.max_retries must be greater than 0"));
        }
        if self.chat.history_max_size == 0 {
            return Err(invalid("chat.history_max_size must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(invalid(format!(
                "chat.temperature ({}) must be between 0.0 and 2.0",
                self.chat.temperature
            )));
        }

        for (name, model) in [
            ("llm.model", &self.llm.model),
            ("llm.summary_model", &self.llm.summary_model),
            ("llm.chat_model", &self.llm.chat_model),
        ] {
            if model.trim().is_empty() {
                return Err(invalid(format!("{name} must not be empty")));
            }
        }

        for (name, base) in [
            ("llm.base_url", &self.llm.base_url),
            ("feeds.arxiv_base_url", &self.feeds.arxiv_base_url),
            ("transcript.base_url", &self.transcript.base_url),
        ] {
            if url::Url::parse(base).is_err() {
                return Err(invalid(format!("{name} is not a valid URL: {base}")));
            }
        }

        for pattern in &self.filter.exclude_patterns {
            if regex::Regex::new(pattern).is_err() {
                return Err(invalid(format!("invalid regex pattern: {pattern}")));
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Resolve the API key from configuration, then from `GOOGLE_API_KEY`.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Get the max age as a Duration.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        if self.storage.max_age_days == 0 {
            None
        } else {
            Some(Duration::from_secs(
                u64::from(self.storage.max_age_days) * 24 * 60 * 60,
            ))
        }
    }

    /// Get the prune interval as a Duration.
    #[must_use]
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.storage.prune_interval_hours) * 3600)
    }

    /// Get the watch interval as a Duration.
    #[must_use]
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch.interval_minutes.saturating_mul(60))
    }

    /// Get the pause after agent LLM calls.
    #[must_use]
    pub fn llm_call_delay(&self) -> Duration {
        Duration::from_secs(self.llm.call_delay_secs)
    }
}
