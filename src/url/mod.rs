//! URL handling module
//!
//! This module handles URL canonicalization and same-site membership checks
//! for the mirror frontier. Archive-specific URL rewriting (the `/web/<ts>/`
//! wrapper) is handled separately in the `archive` module; the functions here
//! operate on plain original-site URLs.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_site};
pub use normalize::normalize_url;
