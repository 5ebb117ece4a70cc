//! Data models shared across the crawl pipeline.
//!
//! - [`Article`]: one scraped page, as written to the monthly JSON batches
//! - [`MonthKey`]: the (year, month) pair a monthly sitemap represents
//!
//! Field names in the JSON output follow the archive format consumers
//! already read (`postID`, `publicationDate`, `liteURL`, ...), hence the
//! serde renames.

use crate::error::WriteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single article page with its metadata and body text.
///
/// Every field has an empty default so a page with a sparse metadata block
/// still produces a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// The URL the page was fetched from.
    pub url: String,
    #[serde(rename = "postID")]
    pub post_id: String,
    pub title: String,
    /// Space-separated `keywords` metadata, split into terms.
    pub keywords: Vec<String>,
    /// Thumbnail image URL.
    pub thumbnail: String,
    /// Publication timestamp exactly as the page reports it.
    pub publication_date: String,
    pub last_updated_date: String,
    pub author: String,
    /// Paragraph text, one paragraph per line.
    pub content: String,
    pub video_duration: String,
    pub word_count: i64,
    pub description: String,
    pub lang: String,
    pub classes: Vec<String>,
    #[serde(rename = "liteURL")]
    pub lite_url: String,
}

/// The month a monthly sitemap covers, used to name its output batch.
///
/// Both parts are kept verbatim from the sitemap URL; `2024-5` and `2024-05`
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthKey {
    pub year: String,
    pub month: String,
}

impl MonthKey {
    /// Derive the key from a URL such as `https://host/sitemaps/articles-2024-05.xml`.
    ///
    /// The URL is split on `-`; the second-to-last token is the year and the
    /// last token, minus any `.xml`, is the month.
    pub fn from_sitemap_url(url: &str) -> Result<Self, WriteError> {
        let mut tokens = url.rsplit('-');
        let (Some(last), Some(year)) = (tokens.next(), tokens.next()) else {
            return Err(WriteError::UnrecognizedSitemapUrl(url.to_string()));
        };
        let month = last.replace(".xml", "");
        if year.is_empty() || month.is_empty() {
            return Err(WriteError::UnrecognizedSitemapUrl(url.to_string()));
        }
        Ok(Self {
            year: year.to_string(),
            month,
        })
    }

    /// File name of the batch for this month, e.g. `articles_2024_05.json`.
    pub fn file_name(&self) -> String {
        format!("articles_{}_{}.json", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}
