//! Archive service addressing
//!
//! This module handles the Wayback Machine's URL scheme: constructing
//! snapshot URLs from an original URL and a capture timestamp, and
//! recovering original URLs from the archive's rewritten links.

mod address;

pub use address::{
    strip_archive_wrapper, validate_timestamp, CaptureAddress, ARCHIVE_BASE,
};
