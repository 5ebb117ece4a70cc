//! Sitemap `<loc>` extraction.
//!
//! The same reader serves both levels of the crawl: the sitemap index
//! (whose locations are monthly sitemaps) and each monthly sitemap (whose
//! locations are article pages). Nothing here cares which one it is given.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};

const LOC: &[u8] = b"loc";

/// Collect the text of every `<loc>` element, in document order.
///
/// A malformed document yields an empty list rather than an error: the
/// caller treats it the same as a sitemap that lists nothing. Entities the
/// XML reader cannot resolve are not malformed; that text is kept raw.
#[instrument(level = "debug", skip_all, fields(bytes = xml.len()))]
pub fn parse_locations(xml: &[u8]) -> Vec<String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut locations = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == LOC => {
                current = Some(String::new());
            }
            Ok(Event::End(e)) if e.name().as_ref() == LOC => {
                if let Some(text) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        locations.push(text.to_string());
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = current.as_mut() {
                    match e.unescape() {
                        Ok(unescaped) => text.push_str(&unescaped),
                        // Unknown entities (HTML ones like `&nbsp;`) stay as written.
                        Err(err) => {
                            let raw = String::from_utf8_lossy(&e);
                            debug!(error = %err, text = %raw, "Keeping sitemap text with unresolved entity");
                            text.push_str(&raw);
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(
                    error = %err,
                    position = reader.buffer_position(),
                    "Malformed sitemap XML; ignoring document"
                );
                return Vec::new();
            }
            _ => {}
        }
        buf.clear();
    }

    locations
}
