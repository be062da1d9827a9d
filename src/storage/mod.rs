//! Storage module
//!
//! This module maps URLs to deterministic local paths and persists fetched
//! bytes. It doubles as the resume manager: a mirror's on-disk tree is the
//! only crawl state there is, so "already materialized" is decided by
//! looking at the target path.

mod paths;
mod writer;

pub use paths::local_path;
pub use writer::StorageWriter;
