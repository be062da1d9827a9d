//! Asset and hyperlink extraction
//!
//! Parses fetched HTML to produce the set of referenced resources (assets)
//! and hyperlinks, and parses CSS for `url()` references. Hrefs in archived
//! pages are frequently rewritten to point back into the replay service;
//! every extracted reference is unwrapped to its original URL before it is
//! resolved and returned.

use crate::archive::strip_archive_wrapper;
use crate::url::normalize_url;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

lazy_static! {
    /// Matches url(...) declarations in CSS, quoted or bare
    static ref CSS_URL_RE: Regex =
        Regex::new(r#"(?i)url\s*\(\s*["']?([^"'()]+)["']?\s*\)"#).unwrap();
}

/// Media type of a referenced resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Stylesheet,
    Script,
    Image,
    Font,
    /// Audio and video sources
    Media,
    Other,
}

/// A non-hyperlink resource referenced by a page
#[derive(Debug, Clone)]
pub struct AssetRef {
    /// Original (unwrapped, absolute) URL of the resource
    pub url: Url,

    /// The page or stylesheet that referenced it
    pub source: Url,

    pub media_type: MediaType,
}

/// Everything extracted from one fetched page
#[derive(Debug, Default)]
pub struct ExtractedPage {
    pub assets: Vec<AssetRef>,
    pub links: Vec<Url>,
}

/// Extracts asset references and hyperlinks from HTML
///
/// `base` is the page's original URL; relative references resolve against
/// it. Both lists are deduplicated within the page.
pub fn extract_page(html: &str, base: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        assets: extract_assets(&document, base),
        links: extract_links(&document, base),
    }
}

/// Extracts asset references from the parsed document
fn extract_assets(document: &Html, base: &Url) -> Vec<AssetRef> {
    let mut assets = Vec::new();
    let push = |url: Option<Url>, media_type: MediaType, assets: &mut Vec<AssetRef>| {
        if let Some(url) = url {
            assets.push(AssetRef {
                url,
                source: base.clone(),
                media_type,
            });
        }
    };

    // Stylesheets
    if let Ok(selector) = Selector::parse(r#"link[rel="stylesheet"][href]"#) {
        for element in document.select(&selector) {
            let href = element.value().attr("href");
            push(
                href.and_then(|h| resolve(h, base)),
                MediaType::Stylesheet,
                &mut assets,
            );
        }
    }

    // Scripts
    if let Ok(selector) = Selector::parse("script[src]") {
        for element in document.select(&selector) {
            let src = element.value().attr("src");
            push(
                src.and_then(|s| resolve(s, base)),
                MediaType::Script,
                &mut assets,
            );
        }
    }

    // Images, including responsive srcset variants
    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                push(resolve(src, base), MediaType::Image, &mut assets);
            }
            if let Some(srcset) = element.value().attr("srcset") {
                for candidate in srcset.split(',') {
                    if let Some(src) = candidate.trim().split_whitespace().next() {
                        push(resolve(src, base), MediaType::Image, &mut assets);
                    }
                }
            }
        }
    }

    // Favicons and other icon links
    if let Ok(selector) = Selector::parse("link[href]") {
        for element in document.select(&selector) {
            let rel = element.value().attr("rel").unwrap_or("");
            if rel.contains("icon") {
                let href = element.value().attr("href");
                push(
                    href.and_then(|h| resolve(h, base)),
                    MediaType::Image,
                    &mut assets,
                );
            }
        }
    }

    // Audio/video sources
    if let Ok(selector) = Selector::parse("video[src], audio[src], source[src]") {
        for element in document.select(&selector) {
            let src = element.value().attr("src");
            push(
                src.and_then(|s| resolve(s, base)),
                MediaType::Media,
                &mut assets,
            );
        }
    }

    // Social preview images
    if let Ok(selector) = Selector::parse("meta[content]") {
        for element in document.select(&selector) {
            let property = element.value().attr("property").unwrap_or("");
            let name = element.value().attr("name").unwrap_or("");
            if property == "og:image" || property == "twitter:image" || name == "twitter:image" {
                let content = element.value().attr("content");
                push(
                    content.and_then(|c| resolve(c, base)),
                    MediaType::Image,
                    &mut assets,
                );
            }
        }
    }

    // url() references in inline style attributes
    if let Ok(selector) = Selector::parse("[style]") {
        for element in document.select(&selector) {
            if let Some(style) = element.value().attr("style") {
                assets.extend(extract_css_assets(style, base));
            }
        }
    }

    dedup_assets(assets)
}

/// Extracts hyperlinks from the parsed document
fn extract_links(document: &Html, base: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            // Download links point at files, not pages
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve(href, base) {
                    links.push(url);
                }
            }
        }
    }

    let mut seen = HashSet::new();
    links.retain(|url| seen.insert(url.as_str().to_string()));
    links
}

/// Extracts asset references from CSS content
///
/// Used for fetched stylesheets and for inline `style` attributes. Media
/// types are classified from the referenced file extension.
pub fn extract_css_assets(css: &str, base: &Url) -> Vec<AssetRef> {
    let mut assets = Vec::new();

    for caps in CSS_URL_RE.captures_iter(css) {
        let reference = caps[1].trim();
        if reference.is_empty() || reference.starts_with("data:") {
            continue;
        }
        if let Some(url) = resolve(reference, base) {
            let media_type = classify_by_extension(&url);
            assets.push(AssetRef {
                url,
                source: base.clone(),
                media_type,
            });
        }
    }

    dedup_assets(assets)
}

/// Resolves a raw reference to an absolute, normalized original URL
///
/// Returns None for references that do not denote fetchable resources
/// (scripting/mail/tel schemes, data URIs, bare fragments) and for anything
/// that fails to parse. Archive-wrapped references are unwrapped first.
fn resolve(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let lower = reference.to_ascii_lowercase();
    for scheme in ["javascript:", "mailto:", "tel:", "data:", "ftp:"] {
        if lower.starts_with(scheme) {
            return None;
        }
    }

    let target = match strip_archive_wrapper(reference) {
        Some(original) => original,
        None => reference.to_string(),
    };

    let absolute = base.join(&target).ok()?;
    normalize_url(absolute.as_str()).ok()
}

/// Classifies a resource by its file extension
fn classify_by_extension(url: &Url) -> MediaType {
    let path = url.path().to_lowercase();
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.').map(|(_, e)| e))
        .unwrap_or("");

    match ext {
        "css" => MediaType::Stylesheet,
        "js" | "mjs" => MediaType::Script,
        "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" | "ico" | "bmp" | "avif" => {
            MediaType::Image
        }
        "woff" | "woff2" | "ttf" | "otf" | "eot" => MediaType::Font,
        "mp4" | "webm" | "ogg" | "avi" | "mov" | "mp3" | "wav" | "m4a" | "flac" => {
            MediaType::Media
        }
        _ => MediaType::Other,
    }
}

/// Removes duplicate references, keeping first occurrence order
fn dedup_assets(assets: Vec<AssetRef>) -> Vec<AssetRef> {
    let mut seen = HashSet::new();
    assets
        .into_iter()
        .filter(|a| seen.insert(a.url.as_str().to_string()))
        .collect()
}
