//! # Sitemap Harvest
//!
//! Crawls a news site's hierarchical sitemap, scrapes every article it
//! lists, and writes the results as one JSON file per month.
//!
//! ## Usage
//!
//! ```sh
//! sitemap_harvest -o ./articles -n 10000
//! sitemap_harvest -c harvest.yaml --concurrency 4
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: read monthly sitemap URLs from the sitemap index
//! 2. **Fetching**: download each article listed in a monthly sitemap
//! 3. **Extraction**: decode the embedded metadata block and paragraph text
//! 4. **Output**: write each month's articles to `articles_{year}_{month}.json`
//!
//! Per-item failures are logged and skipped; the run only ends early when
//! the article cap is reached.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod error;
mod fetcher;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::ScraperConfig;
use crawler::{CrawlLimits, Crawler};
use fetcher::{HttpFetcher, RetryFetch};
use outputs::json::BatchWriter;
use scrapers::article::ArticleExtractor;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("sitemap_harvest starting up");

    let args = Cli::parse();
    let config = ScraperConfig::load(args.config.as_deref())?.with_overrides(&args);
    config.validate()?;
    debug!(?config, "Resolved configuration");

    // Batches report their own write errors; this only warns early.
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        warn!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable; monthly batches will fail to save"
        );
    }

    let fetcher = RetryFetch::new(HttpFetcher::new(&config.http)?, config.retry.policy());
    let extractor = ArticleExtractor::new(&config.metadata)?;
    let writer = BatchWriter::new(&config.output_dir);
    let crawler = Crawler::new(
        fetcher,
        extractor,
        writer,
        CrawlLimits {
            max_articles: config.max_articles,
            concurrency: config.concurrency,
        },
    );

    info!(
        index = %config.sitemap_index_url,
        output_dir = %config.output_dir.display(),
        cap = config.max_articles,
        concurrency = config.concurrency,
        "Starting crawl"
    );
    let summary = crawler.run(&config.sitemap_index_url).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        scraped = summary.scraped,
        batches_written = summary.batches_written,
        cap_reached = summary.cap_reached,
        "Execution complete"
    );

    Ok(())
}
