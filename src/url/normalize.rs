use crate::UrlError;
use url::Url;

/// Normalizes a URL for frontier deduplication and path mapping
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Validate scheme: only HTTP and HTTPS are accepted
/// 3. Lowercase the host
/// 4. Normalize path:
///    - Collapse duplicate slashes
///    - Remove dot segments (. and ..)
///    - Preserve a trailing slash (it changes the local path mapping)
/// 5. Remove fragment (fragments never denote distinct resources)
/// 6. Preserve the query string verbatim (queries DO denote distinct
///    resources and must map to distinct local paths)
///
/// Default ports are dropped by the parser itself.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use snapmirror::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/a/../b#frag").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let normalized_host = host.to_lowercase();
        url.set_host(Some(&normalized_host))
            .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
    } else {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and duplicate slashes
///
/// Unlike a generic canonicalizer this keeps the trailing slash: `/dir/` and
/// `/dir` map to different local files (`dir/index.html` vs `dir.html`).
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let had_trailing_slash = path.len() > 1 && path.ends_with('/');

    let mut normalized_segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", normalized_segments.join("/"));
    if had_trailing_slash {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("http://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/Page");
    }

    #[test]
    fn test_scheme_preserved() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.scheme(), "http");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("http://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_query_preserved() {
        let result = normalize_url("http://example.com/a/b?x=1").unwrap();
        assert_eq!(result.as_str(), "http://example.com/a/b?x=1");
    }

    #[test]
    fn test_distinct_queries_stay_distinct() {
        let a = normalize_url("http://example.com/a/b?x=1").unwrap();
        let b = normalize_url("http://example.com/a/b?x=2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_default_port_removed() {
        let result = normalize_url("http://example.com:80/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_explicit_port_kept() {
        let result = normalize_url("http://example.com:8080/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com:8080/page");
    }

    #[test]
    fn test_dot_segments_collapsed() {
        let result = normalize_url("http://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "http://example.com/b/c");
    }

    #[test]
    fn test_duplicate_slashes_collapsed() {
        let result = normalize_url("http://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/path/to/page");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        let result = normalize_url("http://example.com/dir/").unwrap();
        assert_eq!(result.as_str(), "http://example.com/dir/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("http://example.com").unwrap();
        assert_eq!(result.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parent_directory_at_root() {
        let result = normalize_url("http://example.com/../page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        let result = normalize_url("not a url");
        assert!(result.is_err());
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let result = normalize_url("  http://example.com/page  ").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }
}
