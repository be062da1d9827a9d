use crate::{SnapError, UrlError};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

/// Base URL of the Wayback Machine replay service
pub const ARCHIVE_BASE: &str = "https://web.archive.org/web";

lazy_static! {
    /// Matches an archive-rewritten URL and captures (timestamp, original URL).
    ///
    /// Covers absolute (`https://web.archive.org/web/...`) and rooted
    /// (`/web/...`) forms, the snapshot modifiers the replay service appends
    /// to the timestamp (`im_`, `js_`, `cs_`, `if_`, `id_`, `oe_`), and the
    /// bare `_` toolbar form.
    static ref WRAPPER_RE: Regex = Regex::new(
        r"^(?:https?://web\.archive\.org)?/web/(\d{14})(?:im_|js_|cs_|if_|id_|oe_|_)?/(.+)$"
    )
    .unwrap();
}

/// Validates a capture timestamp in `YYYYMMDDHHMMSS` format
///
/// Checks both the shape (exactly 14 digits) and that the digits form a real
/// calendar instant, so `20240230123456` is rejected.
pub fn validate_timestamp(timestamp: &str) -> bool {
    if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y%m%d%H%M%S").is_ok()
}

/// Recovers the original resource URL from an archive-rewritten href
///
/// Returns `None` if the href is not archive-wrapped. The embedded URL is
/// given back with a scheme (the replay service sometimes drops it).
pub fn strip_archive_wrapper(href: &str) -> Option<String> {
    let caps = WRAPPER_RE.captures(href)?;
    let embedded = caps.get(2)?.as_str();

    // Protocol-relative and schemeless embeds both occur in rewritten pages
    if embedded.starts_with("http://") || embedded.starts_with("https://") {
        Some(embedded.to_string())
    } else if let Some(rest) = embedded.strip_prefix("//") {
        Some(format!("https://{}", rest))
    } else {
        Some(format!("http://{}", embedded))
    }
}

/// Identifies a resource as it existed in a specific archived snapshot
///
/// A `CaptureAddress` pairs the resource's original URL with the fixed
/// capture timestamp of the mirror run. Constructed once for the crawl root
/// and derived per discovered link; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAddress {
    original_url: Url,
    timestamp: String,
    base: String,
}

impl CaptureAddress {
    /// Creates the capture address for the crawl root
    ///
    /// A missing scheme is tolerated (`example.com` becomes
    /// `http://example.com`), matching how users type root URLs.
    ///
    /// # Errors
    ///
    /// * `SnapError::InvalidTimestamp` - timestamp is not a valid
    ///   `YYYYMMDDHHMMSS` instant
    /// * `SnapError::UrlError` - the URL cannot be parsed
    pub fn new(original_url: &str, timestamp: &str) -> Result<Self, SnapError> {
        Self::with_base(original_url, timestamp, ARCHIVE_BASE)
    }

    /// Creates a capture address served by a non-default replay endpoint
    pub fn with_base(
        original_url: &str,
        timestamp: &str,
        base: &str,
    ) -> Result<Self, SnapError> {
        if !validate_timestamp(timestamp) {
            return Err(SnapError::InvalidTimestamp(timestamp.to_string()));
        }

        let with_scheme = if original_url.starts_with("http://")
            || original_url.starts_with("https://")
        {
            original_url.to_string()
        } else {
            format!("http://{}", original_url)
        };

        let url = crate::url::normalize_url(&with_scheme)?;
        Ok(Self {
            original_url: url,
            timestamp: timestamp.to_string(),
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Derives the capture address of another resource in the same snapshot
    pub fn for_url(&self, url: Url) -> Self {
        Self {
            original_url: url,
            timestamp: self.timestamp.clone(),
            base: self.base.clone(),
        }
    }

    /// The original (pre-archive) URL of this resource
    pub fn original_url(&self) -> &Url {
        &self.original_url
    }

    /// The capture timestamp (`YYYYMMDDHHMMSS`)
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The host of the original URL
    pub fn host(&self) -> Result<String, UrlError> {
        crate::url::extract_domain(&self.original_url).ok_or(UrlError::MissingHost)
    }

    /// Constructs the replay-service URL that serves this capture
    ///
    /// No snapshot modifier is appended: the plain form returns the raw
    /// resource bytes for both pages and assets.
    pub fn snapshot_url(&self) -> String {
        format!("{}/{}/{}", self.base, self.timestamp, self.original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_timestamp() {
        assert!(validate_timestamp("20240417160532"));
    }

    #[test]
    fn test_timestamp_wrong_length() {
        assert!(!validate_timestamp("2024041716053"));
        assert!(!validate_timestamp("202404171605321"));
    }

    #[test]
    fn test_timestamp_non_digit() {
        assert!(!validate_timestamp("2024041716053x"));
    }

    #[test]
    fn test_timestamp_impossible_date() {
        assert!(!validate_timestamp("20240230123456"));
        assert!(!validate_timestamp("20240417246099"));
    }

    #[test]
    fn test_snapshot_url_construction() {
        let addr = CaptureAddress::new("http://example.com", "20240417160532").unwrap();
        assert_eq!(
            addr.snapshot_url(),
            "https://web.archive.org/web/20240417160532/http://example.com/"
        );
    }

    #[test]
    fn test_missing_scheme_defaults_to_http() {
        let addr = CaptureAddress::new("example.com/page", "20240417160532").unwrap();
        assert_eq!(addr.original_url().as_str(), "http://example.com/page");
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let result = CaptureAddress::new("http://example.com", "not-a-timestamp");
        assert!(matches!(result, Err(SnapError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_for_url_keeps_timestamp() {
        let root = CaptureAddress::new("http://example.com", "20240417160532").unwrap();
        let other = root.for_url(Url::parse("http://example.com/about").unwrap());
        assert_eq!(other.timestamp(), "20240417160532");
        assert_eq!(
            other.snapshot_url(),
            "https://web.archive.org/web/20240417160532/http://example.com/about"
        );
    }

    #[test]
    fn test_custom_replay_endpoint() {
        let addr = CaptureAddress::with_base(
            "http://example.com/a",
            "20240417160532",
            "http://127.0.0.1:8080/web/",
        )
        .unwrap();
        assert_eq!(
            addr.snapshot_url(),
            "http://127.0.0.1:8080/web/20240417160532/http://example.com/a"
        );
    }

    #[test]
    fn test_strip_wrapper_absolute() {
        let href = "https://web.archive.org/web/20240417160532/http://example.com/style.css";
        assert_eq!(
            strip_archive_wrapper(href),
            Some("http://example.com/style.css".to_string())
        );
    }

    #[test]
    fn test_strip_wrapper_rooted() {
        let href = "/web/20240417160532/http://example.com/a";
        assert_eq!(
            strip_archive_wrapper(href),
            Some("http://example.com/a".to_string())
        );
    }

    #[test]
    fn test_strip_wrapper_with_modifier() {
        for modifier in ["im_", "js_", "cs_", "if_", "id_", "oe_"] {
            let href = format!(
                "/web/20240417160532{}/http://example.com/pic.png",
                modifier
            );
            assert_eq!(
                strip_archive_wrapper(&href),
                Some("http://example.com/pic.png".to_string()),
                "modifier {} not stripped",
                modifier
            );
        }
    }

    #[test]
    fn test_strip_wrapper_toolbar_form() {
        let href = "/web/20240417160532_/http://example.com/";
        assert_eq!(
            strip_archive_wrapper(href),
            Some("http://example.com/".to_string())
        );
    }

    #[test]
    fn test_strip_wrapper_protocol_relative_embed() {
        let href = "/web/20240417160532///cdn.example.com/app.js";
        assert_eq!(
            strip_archive_wrapper(href),
            Some("https://cdn.example.com/app.js".to_string())
        );
    }

    #[test]
    fn test_strip_wrapper_plain_href_passes_through() {
        assert_eq!(strip_archive_wrapper("/about.html"), None);
        assert_eq!(strip_archive_wrapper("http://example.com/x"), None);
    }
}
