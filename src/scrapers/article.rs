//! Article page extraction.
//!
//! Article pages carry their authoritative fields in an embedded script
//! block, e.g.
//!
//! ```html
//! <script id="tawsiyat-metadata" type="text/tawsiyat">
//!   {"postid": "123", "title": "...", "keywords": "a b c", "word_count": "450"}
//! </script>
//! ```
//!
//! Extraction runs in two steps. The block is decoded permissively into a
//! [`Metadata`] key-value map, then [`Metadata::into_article`] maps known
//! keys onto an [`Article`], defaulting anything absent. Only a block that
//! is not a JSON object, or a `word_count` that is not a number, fails the
//! page.

use crate::config::MetadataConfig;
use crate::error::{ConfigError, ExtractionError, ExtractionErrorKind};
use crate::models::Article;
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Parses article pages using a fixed metadata selector.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    metadata_selector: Selector,
    paragraph_selector: Selector,
}

impl ArticleExtractor {
    pub fn new(config: &MetadataConfig) -> Result<Self, ConfigError> {
        let metadata = format!(
            r#"script[id="{}"][type="{}"]"#,
            config.script_id, config.script_type
        );
        Ok(Self {
            metadata_selector: parse_selector(&metadata)?,
            paragraph_selector: parse_selector("p")?,
        })
    }

    /// Turn a fetched article page into an [`Article`].
    #[instrument(level = "debug", skip(self, html), fields(bytes = html.len()))]
    pub fn extract(&self, html: &[u8], url: &str) -> Result<Article, ExtractionError> {
        let page = String::from_utf8_lossy(html);
        let document = Html::parse_document(&page);

        let metadata = match document.select(&self.metadata_selector).next() {
            Some(script) => {
                let raw = script.text().collect::<String>();
                Metadata::parse(&raw).map_err(|kind| {
                    warn!(%url, preview = %truncate_for_log(raw.trim(), 200), "Unusable metadata block");
                    ExtractionError::new(url, kind)
                })?
            }
            None => {
                debug!(%url, "No metadata block; using defaults");
                Metadata::default()
            }
        };

        let mut content = String::new();
        for paragraph in document.select(&self.paragraph_selector) {
            content.extend(paragraph.text());
            content.push('\n');
        }

        metadata
            .into_article(url, content)
            .map_err(|kind| ExtractionError::new(url, kind))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// The decoded metadata block, before any field mapping.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn parse(raw: &str) -> Result<Self, ExtractionErrorKind> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ExtractionErrorKind::MetadataNotObject),
        }
    }

    /// Map metadata keys onto an [`Article`], applying the field defaults.
    pub fn into_article(self, url: &str, content: String) -> Result<Article, ExtractionErrorKind> {
        Ok(Article {
            url: url.to_string(),
            post_id: self.text("postid"),
            title: self.text("title"),
            keywords: self.keywords(),
            thumbnail: self.text("thumbnail"),
            publication_date: self.text("published_time"),
            last_updated_date: self.text("last_updated"),
            author: self.text("author"),
            content,
            video_duration: self.text("video_duration"),
            word_count: self.word_count()?,
            description: self.text("description"),
            lang: self.text("lang"),
            classes: self.classes(),
            lite_url: self.text("lite_url"),
        })
    }

    /// A string field. Other scalars are rendered as text; null, arrays and
    /// objects count as absent.
    fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    fn keywords(&self) -> Vec<String> {
        self.text("keywords")
            .split(' ')
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn classes(&self) -> Vec<String> {
        match self.0.get("classes") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `word_count` is the one strict field: absent means 0, but a present
    /// value must be numeric.
    fn word_count(&self) -> Result<i64, ExtractionErrorKind> {
        match self.0.get("word_count") {
            None => Ok(0),
            Some(Value::Number(n)) => n
                .as_i64()
                // Floats truncate toward zero.
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| ExtractionErrorKind::InvalidWordCount(n.to_string())),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ExtractionErrorKind::InvalidWordCount(s.clone())),
            Some(other) => Err(ExtractionErrorKind::InvalidWordCount(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.almayadeen.net/news/politics/story-1";

    fn extractor() -> ArticleExtractor {
        ArticleExtractor::new(&MetadataConfig::default()).unwrap()
    }

    fn page(metadata: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="ar">
<head>
  <title>Story</title>
  <script id="tawsiyat-metadata" type="text/tawsiyat">{metadata}</script>
</head>
<body>{body}</body>
</html>"#
        )
    }

    #[test]
    fn test_extract_complete_metadata() {
        let metadata = r#"{
            "postid": "815342",
            "title": "A headline",
            "keywords": "gaza lebanon diplomacy",
            "thumbnail": "https://cdn.example.com/815342.jpg",
            "published_time": "2024-05-04T12:01:00+03:00",
            "last_updated": "2024-05-04T13:15:00+03:00",
            "author": "Newsroom",
            "video_duration": "00:02:31",
            "word_count": "452",
            "description": "Short summary",
            "lang": "ar",
            "classes": ["politics", "middle-east"],
            "lite_url": "https://lite.example.com/815342"
        }"#;
        let html = page(metadata, "<p>First paragraph.</p><div><p>Second <b>bold</b> one.</p></div>");

        let article = extractor().extract(html.as_bytes(), URL).unwrap();

        assert_eq!(article.url, URL);
        assert_eq!(article.post_id, "815342");
        assert_eq!(article.title, "A headline");
        assert_eq!(article.keywords, vec!["gaza", "lebanon", "diplomacy"]);
        assert_eq!(article.thumbnail, "https://cdn.example.com/815342.jpg");
        assert_eq!(article.publication_date, "2024-05-04T12:01:00+03:00");
        assert_eq!(article.last_updated_date, "2024-05-04T13:15:00+03:00");
        assert_eq!(article.author, "Newsroom");
        assert_eq!(article.content, "First paragraph.\nSecond bold one.\n");
        assert_eq!(article.video_duration, "00:02:31");
        assert_eq!(article.word_count, 452);
        assert_eq!(article.description, "Short summary");
        assert_eq!(article.lang, "ar");
        assert_eq!(article.classes, vec!["politics", "middle-east"]);
        assert_eq!(article.lite_url, "https://lite.example.com/815342");
    }

    #[test]
    fn test_extract_empty_metadata_defaults_everything() {
        let html = page("{}", "");
        let article = extractor().extract(html.as_bytes(), URL).unwrap();

        assert_eq!(
            article,
            Article {
                url: URL.to_string(),
                ..Article::default()
            }
        );
    }

    #[test]
    fn test_missing_metadata_block_is_not_an_error() {
        let html = "<html><body><p>Only text</p></body></html>";
        let article = extractor().extract(html.as_bytes(), URL).unwrap();

        assert_eq!(article.title, "");
        assert_eq!(article.word_count, 0);
        assert_eq!(article.content, "Only text\n");
    }

    #[test]
    fn test_script_with_other_type_is_ignored() {
        let html = r#"<html><head>
<script id="tawsiyat-metadata" type="application/json">{"title": "wrong block"}</script>
</head><body></body></html>"#;
        let article = extractor().extract(html.as_bytes(), URL).unwrap();
        assert_eq!(article.title, "");
    }

    #[test]
    fn test_non_numeric_word_count_fails() {
        let html = page(r#"{"title": "t", "word_count": "many"}"#, "<p>x</p>");
        let err = extractor().extract(html.as_bytes(), URL).unwrap_err();

        assert_eq!(err.url, URL);
        assert!(matches!(err.kind, ExtractionErrorKind::InvalidWordCount(_)));
    }

    #[test]
    fn test_word_count_accepts_numbers() {
        let html = page(r#"{"word_count": 300}"#, "");
        assert_eq!(extractor().extract(html.as_bytes(), URL).unwrap().word_count, 300);

        let html = page(r#"{"word_count": 12.9}"#, "");
        assert_eq!(extractor().extract(html.as_bytes(), URL).unwrap().word_count, 12);

        let html = page(r#"{"word_count": " 88 "}"#, "");
        assert_eq!(extractor().extract(html.as_bytes(), URL).unwrap().word_count, 88);
    }

    #[test]
    fn test_word_count_null_is_invalid() {
        let html = page(r#"{"word_count": null}"#, "");
        assert!(extractor().extract(html.as_bytes(), URL).is_err());
    }

    #[test]
    fn test_invalid_json_metadata_fails() {
        let html = page(r#"{"title": "unterminated"#, "<p>x</p>");
        let err = extractor().extract(html.as_bytes(), URL).unwrap_err();
        assert!(matches!(err.kind, ExtractionErrorKind::InvalidMetadata(_)));
    }

    #[test]
    fn test_metadata_must_be_an_object() {
        let html = page(r#"["postid", "1"]"#, "");
        let err = extractor().extract(html.as_bytes(), URL).unwrap_err();
        assert!(matches!(err.kind, ExtractionErrorKind::MetadataNotObject));
    }

    #[test]
    fn test_lenient_scalar_fields() {
        let metadata = Metadata::parse(
            r#"{"postid": 815342, "title": null, "author": ["a"], "classes": "politics", "keywords": "a  b "}"#,
        )
        .unwrap();
        let article = metadata.into_article(URL, String::new()).unwrap();

        assert_eq!(article.post_id, "815342");
        assert_eq!(article.title, "");
        assert_eq!(article.author, "");
        assert!(article.classes.is_empty());
        assert_eq!(article.keywords, vec!["a", "b"]);
    }

    #[test]
    fn test_custom_metadata_identity() {
        let config = MetadataConfig {
            script_id: "page-meta".to_string(),
            script_type: "application/x-meta".to_string(),
        };
        let extractor = ArticleExtractor::new(&config).unwrap();
        let html = r#"<html><head><script id="page-meta" type="application/x-meta">{"title": "Custom"}</script></head></html>"#;

        assert_eq!(extractor.extract(html.as_bytes(), URL).unwrap().title, "Custom");
    }

    #[test]
    fn test_arabic_content_survives() {
        let html = page(r#"{"title": "عنوان"}"#, "<p>نص المقال</p>");
        let article = extractor().extract(html.as_bytes(), URL).unwrap();
        assert_eq!(article.title, "عنوان");
        assert_eq!(article.content, "نص المقال\n");
    }
}
