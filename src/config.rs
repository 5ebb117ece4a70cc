//! Runtime configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. Built-in defaults ([`ScraperConfig::default`])
//! 2. An optional YAML file passed with `--config`
//! 3. Individual CLI flags or their environment variables
//!
//! # Example file
//!
//! ```yaml
//! sitemap_index_url: https://www.almayadeen.net/sitemaps/all.xml
//! output_dir: ./articles
//! max_articles: 500
//! concurrency: 4
//! http:
//!   timeout_secs: 10
//! retry:
//!   max_attempts: 3
//!   initial_backoff_ms: 2000
//!   max_backoff_ms: 10000
//! metadata:
//!   script_id: tawsiyat-metadata
//!   script_type: text/tawsiyat
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::fetcher::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const DEFAULT_SITEMAP_INDEX_URL: &str = "https://www.almayadeen.net/sitemaps/all.xml";

/// Top-level configuration for a crawl run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Sitemap index listing the monthly sitemaps.
    pub sitemap_index_url: String,
    /// Root directory for the monthly JSON batches.
    pub output_dir: PathBuf,
    /// Hard ceiling on successfully scraped articles across the run.
    pub max_articles: usize,
    /// Article fetches in flight within one monthly sitemap. `1` is sequential.
    pub concurrency: usize,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub metadata: MetadataConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sitemap_index_url: DEFAULT_SITEMAP_INDEX_URL.to_string(),
            output_dir: PathBuf::from("./articles"),
            max_articles: 10_000,
            concurrency: 1,
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("sitemap_harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry schedule for every HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Identity of the embedded `<script>` element carrying article metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub script_id: String,
    pub script_type: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            script_id: "tawsiyat-metadata".to_string(),
            script_type: "text/tawsiyat".to_string(),
        }
    }
}

impl ScraperConfig {
    /// Load the YAML file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to `null`, which should mean "all defaults".
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply every flag the user actually passed on the command line.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.sitemap_index_url {
            self.sitemap_index_url = url.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(max) = cli.max_articles {
            self.max_articles = max;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.http.timeout_secs = timeout;
        }
        if let Some(agent) = &cli.user_agent {
            self.http.user_agent = agent.clone();
        }
        if let Some(attempts) = cli.max_attempts {
            self.retry.max_attempts = attempts;
        }
        if let Some(ms) = cli.initial_backoff_ms {
            self.retry.initial_backoff_ms = ms;
        }
        if let Some(ms) = cli.max_backoff_ms {
            self.retry.max_backoff_ms = ms;
        }
        if let Some(id) = &cli.metadata_script_id {
            self.metadata.script_id = id.clone();
        }
        if let Some(ty) = &cli.metadata_script_type {
            self.metadata.script_type = ty.clone();
        }
        self
    }

    /// Reject settings that would make the crawl hang or do nothing useful.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.sitemap_index_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.sitemap_index_url.clone(),
            source,
        })?;
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
