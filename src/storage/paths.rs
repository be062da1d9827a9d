use std::path::PathBuf;
use url::Url;

/// Maps a URL to its local path relative to the mirror root
///
/// The mapping is a pure function of the URL, which is what makes resumed
/// runs idempotent: the same URL always lands on the same file.
///
/// # Rules
///
/// - The root path and directory-style paths (`/dir/`) map to `index.html`
///   inside the corresponding directory
/// - Percent-encoded path segments are decoded
/// - A query string is folded into the file name (`&` and `=` become `_`),
///   so `?x=1` and `?x=2` resolve to distinct files
/// - A file name without an extension gets `.html`
///
/// # Examples
///
/// ```
/// use snapmirror::storage::local_path;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/a/b?x=1").unwrap();
/// assert_eq!(local_path(&url), std::path::PathBuf::from("a/b_x_1.html"));
/// ```
pub fn local_path(url: &Url) -> PathBuf {
    let raw_path = url.path();

    // Decoded segments must never traverse upward out of the mirror root
    let mut segments: Vec<String> = raw_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .filter(|s| s != "." && s != "..")
        .collect();

    if raw_path.ends_with('/') || segments.is_empty() {
        segments.push("index.html".to_string());
    }

    let mut file_name = segments.pop().unwrap_or_else(|| "index.html".to_string());

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        let safe = query
            .replace('&', "_")
            .replace('=', "_")
            .replace('/', "_");
        let (stem, ext) = split_extension(&file_name);
        file_name = format!("{}_{}{}", stem, safe, ext);
    }

    if !file_name.contains('.') {
        file_name.push_str(".html");
    }

    let mut path = PathBuf::new();
    for segment in segments {
        path.push(segment);
    }
    path.push(file_name);
    path
}

/// Splits a file name into (stem, extension-with-dot)
fn split_extension(name: &str) -> (&str, String) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], name[idx..].to_string()),
        _ => (name, String::new()),
    }
}
