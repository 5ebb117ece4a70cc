//! Crawl orchestration: sitemap index → monthly sitemaps → articles → batches.
//!
//! # Flow
//!
//! 1. Fetch the sitemap index once and read its monthly sitemap URLs
//! 2. For each monthly sitemap, in order, until the article cap is reached:
//!    - read its article URLs
//!    - fetch and extract articles, up to `concurrency` at a time
//!    - write the month's successes as one batch and drop them from memory
//!
//! # Failure posture
//!
//! Nothing short of the cap or an exhausted index ends the run. A failed
//! fetch, a page that will not extract, or a batch that will not write is
//! logged, counted in [`CrawlSummary`], and skipped.
//!
//! # Cap accounting
//!
//! The cap counts successful articles only. Each success claims a slot with
//! an atomic compare-and-increment, so the total never exceeds the cap.
//! No new article fetch is started once the cap is reached; fetches already
//! in flight finish, and any success past the cap is discarded.

use crate::fetcher::Fetch;
use crate::models::{Article, MonthKey};
use crate::outputs::json::BatchWriter;
use crate::scrapers::article::ArticleExtractor;
use crate::scrapers::sitemap::parse_locations;
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info, instrument, warn};

/// Bounds on a single crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum successfully scraped articles across the run.
    pub max_articles: usize,
    /// Article fetches in flight at once within one monthly sitemap.
    pub concurrency: usize,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Monthly sitemaps visited.
    pub monthly_sitemaps: usize,
    pub scraped: usize,
    pub fetch_failures: usize,
    pub extraction_failures: usize,
    pub batches_written: usize,
    pub write_failures: usize,
    pub cap_reached: bool,
}

enum Outcome {
    Scraped(Article),
    FetchFailed,
    ExtractionFailed,
    /// Succeeded after the cap was already full.
    Discarded,
}

/// Drives one crawl over a sitemap index.
pub struct Crawler<F> {
    fetcher: F,
    extractor: ArticleExtractor,
    writer: BatchWriter,
    limits: CrawlLimits,
    scraped: AtomicUsize,
}

impl<F> Crawler<F>
where
    F: Fetch,
{
    pub fn new(
        fetcher: F,
        extractor: ArticleExtractor,
        writer: BatchWriter,
        limits: CrawlLimits,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            writer,
            limits: CrawlLimits {
                concurrency: limits.concurrency.max(1),
                ..limits
            },
            scraped: AtomicUsize::new(0),
        }
    }

    /// Crawl everything reachable from `index_url`, up to the article cap.
    #[instrument(level = "info", skip(self), fields(cap = self.limits.max_articles))]
    pub async fn run(&self, index_url: &str) -> CrawlSummary {
        self.scraped.store(0, Ordering::SeqCst);
        let mut summary = CrawlSummary::default();

        let monthly_sitemaps = self.locations(index_url).await;
        info!(count = monthly_sitemaps.len(), "Found monthly sitemaps");

        for sitemap_url in monthly_sitemaps {
            if self.cap_reached() {
                info!(cap = self.limits.max_articles, "Article cap reached; stopping");
                break;
            }
            summary.monthly_sitemaps += 1;

            let batch = self.crawl_month(&sitemap_url, &mut summary).await;
            if !batch.is_empty() {
                self.flush_month(&sitemap_url, batch, &mut summary).await;
            }
        }

        summary.scraped = self.scraped.load(Ordering::SeqCst);
        summary.cap_reached = self.cap_reached();
        info!(
            scraped = summary.scraped,
            monthly_sitemaps = summary.monthly_sitemaps,
            fetch_failures = summary.fetch_failures,
            extraction_failures = summary.extraction_failures,
            batches_written = summary.batches_written,
            write_failures = summary.write_failures,
            "Scraping complete. Total articles scraped: {}",
            summary.scraped
        );
        summary
    }

    /// Fetch a sitemap and read its locations. Failures read as "no work".
    async fn locations(&self, url: &str) -> Vec<String> {
        match self.fetcher.fetch(url).await {
            Ok(body) => parse_locations(&body),
            Err(e) => {
                error!(%url, error = %e, "Failed to fetch sitemap");
                Vec::new()
            }
        }
    }

    #[instrument(level = "info", skip(self, summary))]
    async fn crawl_month(&self, sitemap_url: &str, summary: &mut CrawlSummary) -> Vec<Article> {
        let article_urls = self.locations(sitemap_url).await;
        info!(count = article_urls.len(), "Found articles in the sitemap");

        let outcomes: Vec<Outcome> = stream::iter(article_urls)
            .take_while(|_| future::ready(!self.cap_reached()))
            .map(|url| self.harvest(url))
            .buffered(self.limits.concurrency)
            .collect()
            .await;

        let mut batch = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Scraped(article) => batch.push(article),
                Outcome::FetchFailed => summary.fetch_failures += 1,
                Outcome::ExtractionFailed => summary.extraction_failures += 1,
                Outcome::Discarded => {}
            }
        }
        batch
    }

    async fn harvest(&self, url: String) -> Outcome {
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(%url, error = %e, "Skipping article: fetch failed");
                return Outcome::FetchFailed;
            }
        };

        let article = match self.extractor.extract(&body, &url) {
            Ok(article) => article,
            Err(e) => {
                warn!(%url, error = %e, "Skipping article: extraction failed");
                return Outcome::ExtractionFailed;
            }
        };

        match self.claim_slot() {
            Some(scraped) => {
                let cap = self.limits.max_articles;
                info!(
                    scraped,
                    cap,
                    "Progress: {}/{} articles scraped.",
                    scraped,
                    cap
                );
                Outcome::Scraped(article)
            }
            None => {
                debug!(%url, "Article cap filled while in flight; discarding");
                Outcome::Discarded
            }
        }
    }

    async fn flush_month(&self, sitemap_url: &str, batch: Vec<Article>, summary: &mut CrawlSummary) {
        let month = match MonthKey::from_sitemap_url(sitemap_url) {
            Ok(month) => month,
            Err(e) => {
                error!(%sitemap_url, dropped = batch.len(), error = %e, "Dropping batch");
                summary.write_failures += 1;
                return;
            }
        };

        match self.writer.flush(&batch, &month).await {
            Ok(_) => summary.batches_written += 1,
            Err(e) => {
                error!(
                    %month,
                    dropped = batch.len(),
                    output_dir = %self.writer.output_dir().display(),
                    error = %e,
                    "Failed to save articles"
                );
                summary.write_failures += 1;
            }
        }
    }

    fn cap_reached(&self) -> bool {
        self.scraped.load(Ordering::SeqCst) >= self.limits.max_articles
    }

    /// Take one slot under the cap, returning the new total.
    fn claim_slot(&self) -> Option<usize> {
        let cap = self.limits.max_articles;
        self.scraped
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < cap).then_some(n + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }
}
