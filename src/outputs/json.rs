//! JSON batch output.
//!
//! Each monthly sitemap's articles are written once, as a single indented
//! JSON array:
//!
//! ```text
//! output_dir/
//! ├── articles_2024_05.json
//! ├── articles_2024_04.json
//! └── articles_2024_03.json
//! ```
//!
//! A second flush for the same month replaces the earlier file.

use crate::error::WriteError;
use crate::models::{Article, MonthKey};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Writes monthly article batches under a fixed output root.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    output_dir: PathBuf,
}

impl BatchWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `articles` to `{output_dir}/articles_{year}_{month}.json`.
    ///
    /// The output root is created if it does not exist yet. Returns the path
    /// written.
    #[instrument(level = "info", skip_all, fields(month = %month, count = articles.len()))]
    pub async fn flush(&self, articles: &[Article], month: &MonthKey) -> Result<PathBuf, WriteError> {
        let json = serde_json::to_string_pretty(articles)?;

        if let Err(source) = fs::create_dir_all(&self.output_dir).await {
            error!(path = %self.output_dir.display(), error = %source, "Failed to create output dir");
            return Err(WriteError::CreateDir {
                path: self.output_dir.clone(),
                source,
            });
        }

        let path = self.output_dir.join(month.file_name());
        fs::write(&path, json)
            .await
            .map_err(|source| WriteError::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), count = articles.len(), "Saved articles");
        Ok(path)
    }
}
