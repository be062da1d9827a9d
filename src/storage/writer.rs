use crate::storage::paths::local_path;
use crate::SnapError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

/// Persists fetched resources under the mirror root
///
/// Writes are atomic: content goes to a temporary file in the destination
/// directory and is renamed into place, so a crashed or cancelled run never
/// leaves a partially-written file where `should_skip` would find it.
pub struct StorageWriter {
    root: PathBuf,
}

impl StorageWriter {
    /// Creates a writer rooted at the given output directory
    ///
    /// The directory is created if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SnapError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| SnapError::WriteFailure {
            path: root.display().to_string(),
            source: e,
        })?;
        Ok(Self { root })
    }

    /// The mirror root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The absolute local path a URL materializes to
    pub fn target_path(&self, url: &Url) -> PathBuf {
        self.root.join(local_path(url))
    }

    /// Returns true iff a prior run already materialized this URL
    ///
    /// Consulted before scheduling a fetch, so resumed runs perform zero
    /// network I/O for completed resources. An empty file does not count:
    /// it cannot be a completed write.
    pub fn should_skip(&self, url: &Url) -> bool {
        match std::fs::metadata(self.target_path(url)) {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Writes resource bytes to the URL's local path atomically
    ///
    /// Parent directories are created on demand. Returns the path written.
    pub fn write(&self, url: &Url, bytes: &[u8]) -> Result<PathBuf, SnapError> {
        let target = self.target_path(url);
        let parent = target.parent().unwrap_or(&self.root);

        let write_err = |e: std::io::Error| SnapError::WriteFailure {
            path: target.display().to_string(),
            source: e,
        };

        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.persist(&target).map_err(|e| SnapError::WriteFailure {
            path: target.display().to_string(),
            source: e.error,
        })?;

        Ok(target)
    }

    /// Reads back a previously materialized resource
    ///
    /// Used on resume: skipped pages still need their cached bytes parsed
    /// so the crawl can descend through them.
    pub fn read_existing(&self, url: &Url) -> Option<Vec<u8>> {
        std::fs::read(self.target_path(url)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_write_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        let page = url("http://example.com/about");

        assert!(!writer.should_skip(&page));
        writer.write(&page, b"<html>hi</html>").unwrap();
        assert!(writer.should_skip(&page));
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        let asset = url("http://example.com/static/css/style.css");

        let path = writer.write(&asset, b"body{}").unwrap();
        assert!(path.ends_with("static/css/style.css"));
        assert_eq!(std::fs::read(&path).unwrap(), b"body{}");
    }

    #[test]
    fn test_empty_file_does_not_skip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        let page = url("http://example.com/empty");

        let target = writer.target_path(&page);
        std::fs::File::create(&target).unwrap();
        assert!(!writer.should_skip(&page));
    }

    #[test]
    fn test_read_existing_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        let page = url("http://example.com/");

        assert!(writer.read_existing(&page).is_none());
        writer.write(&page, b"content").unwrap();
        assert_eq!(writer.read_existing(&page).unwrap(), b"content");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        let page = url("http://example.com/p");

        writer.write(&page, b"one").unwrap();
        writer.write(&page, b"one").unwrap();
        assert_eq!(writer.read_existing(&page).unwrap(), b"one");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StorageWriter::new(dir.path()).unwrap();
        writer.write(&url("http://example.com/a"), b"x").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.html".to_string()]);
    }
}
