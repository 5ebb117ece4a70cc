//! Error types for each stage of the crawl pipeline.
//!
//! None of the pipeline errors ([`FetchError`], [`ExtractionError`],
//! [`WriteError`]) stop a crawl. The crawler logs them and moves on to the
//! next article or month. Only [`ConfigError`] is fatal, and it is raised
//! before any network work starts.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A request that produced no usable body after all attempts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure: connect, timeout, TLS, or body read.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The HTTP client itself could not be built.
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Malformed request URLs surface as reqwest builder errors and are not
    /// worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { source, .. } => !source.is_builder(),
            FetchError::Status { .. } => true,
            FetchError::Client(_) => false,
        }
    }
}

/// An article page that could not be turned into an [`Article`](crate::models::Article).
#[derive(Debug, Error)]
#[error("failed to extract article {url}: {kind}")]
pub struct ExtractionError {
    pub url: String,
    #[source]
    pub kind: ExtractionErrorKind,
}

impl ExtractionError {
    pub fn new(url: impl Into<String>, kind: ExtractionErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionErrorKind {
    #[error("metadata block is not valid JSON: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    #[error("metadata block is not a JSON object")]
    MetadataNotObject,

    #[error("word_count is not numeric: {0}")]
    InvalidWordCount(String),
}

/// A month's batch that could not be persisted. The batch is dropped.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The monthly sitemap URL does not end in `-<year>-<month>.xml`.
    #[error("cannot derive year and month from sitemap URL {0}")]
    UnrecognizedSitemapUrl(String),
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid sitemap index URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid metadata selector {selector}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
