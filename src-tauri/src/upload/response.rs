//! Extracting the image URL from an upload response.
//!
//! Servers are expected to answer `{"url": "..."}`, but plenty of
//! self-hosted scripts answer with HTML or plain text, so any
//! `http(s)://` link in the body is accepted as a fallback.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Characters of the raw body shown when no URL can be found.
pub const SNIPPET_CHARS: usize = 200;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

/// Resolves the image URL from a response body.
///
/// A JSON object with a `url` field decides on its own: an empty string or a
/// non-string value means no URL. Anything else falls back to the first link
/// in the body.
pub fn parse_image_url(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(obj)) = serde_json::from_slice::<Value>(body) {
        if let Some(url) = obj.get("url") {
            return url
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_owned);
        }
    }

    let text = String::from_utf8_lossy(body);
    URL_PATTERN.find(&text).map(|m| m.as_str().to_string())
}

/// First [`SNIPPET_CHARS`] characters of the body, for diagnostics.
pub fn response_snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}
