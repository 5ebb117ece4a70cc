//! Command-line interface definitions for Sitemap Harvest.
//!
//! Every option is optional: anything left unset falls back to the config
//! file (if one is given) and then to the built-in defaults. See
//! [`ScraperConfig`](crate::config::ScraperConfig) for the merge order.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Sitemap Harvest application.
///
/// # Examples
///
/// ```sh
/// # Crawl with defaults, writing batches to ./articles
/// sitemap_harvest
///
/// # Small trial run into a custom directory
/// sitemap_harvest -o /data/articles -n 50
///
/// # Everything from a config file, with four concurrent fetches
/// sitemap_harvest -c harvest.yaml --concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL of the sitemap index listing monthly sitemaps
    #[arg(short = 'u', long, env = "SITEMAP_INDEX_URL")]
    pub sitemap_index_url: Option<String>,

    /// Directory the monthly JSON batches are written to
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many articles have been scraped
    #[arg(short = 'n', long, env = "MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Article fetches in flight at once within a monthly sitemap
    #[arg(long, env = "CRAWL_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Total attempts per request, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds (doubles per retry)
    #[arg(long)]
    pub initial_backoff_ms: Option<u64>,

    /// Upper bound on any single retry delay, in milliseconds
    #[arg(long)]
    pub max_backoff_ms: Option<u64>,

    /// `id` attribute of the embedded metadata script
    #[arg(long)]
    pub metadata_script_id: Option<String>,

    /// `type` attribute of the embedded metadata script
    #[arg(long)]
    pub metadata_script_type: Option<String>,
}
