use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use snapmirror::url::extract_domain;
///
/// let url = Url::parse("http://Example.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a URL belongs to the mirrored site
///
/// Hosts are compared lowercased with a leading `www.` dropped on both
/// sides, so `www.example.com` and `example.com` count as the same site.
/// Other subdomains do not match: the mirror never follows links off the
/// root host.
///
/// # Arguments
///
/// * `url` - The candidate URL
/// * `root_host` - The host of the crawl root
///
/// # Examples
///
/// ```
/// use url::Url;
/// use snapmirror::url::same_site;
///
/// let url = Url::parse("http://www.example.com/about").unwrap();
/// assert!(same_site(&url, "example.com"));
///
/// let url = Url::parse("http://cdn.other.com/x.js").unwrap();
/// assert!(!same_site(&url, "example.com"));
/// ```
pub fn same_site(url: &Url, root_host: &str) -> bool {
    match url.host_str() {
        Some(host) => registrable(host) == registrable(root_host),
        None => false,
    }
}

/// Lowercases a host and drops a leading `www.`
fn registrable(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
