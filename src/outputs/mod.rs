//! Output generation for scraped articles.
//!
//! # Submodules
//!
//! - [`json`]: writes one JSON batch per month under the output root

pub mod json;
