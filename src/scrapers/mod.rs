//! Parsers for the two kinds of documents the crawl fetches.
//!
//! | Document | Module | Method | Output |
//! |----------|--------|--------|--------|
//! | Sitemap index / monthly sitemap | [`sitemap`] | quick-xml event reader | `<loc>` URLs in document order |
//! | Article page | [`article`] | HTML parsing + embedded JSON | [`Article`](crate::models::Article) |
//!
//! Both parsers work on bytes already in memory; fetching is the
//! [`fetcher`](crate::fetcher) module's job.

pub mod article;
pub mod sitemap;
