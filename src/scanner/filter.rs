//! Per-entry eligibility predicates.

use std::fs::Metadata;
use std::path::Path;

/// Decides whether a discovered file is hashed.
///
/// Filters are pure: evaluated once per file, no side effects, never fail.
pub trait FileFilter: Send + Sync {
    /// Return `true` to hash the file.
    fn accept(&self, path: &Path, metadata: &Metadata) -> bool;
}

/// Accepts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FileFilter for AcceptAll {
    fn accept(&self, _path: &Path, _metadata: &Metadata) -> bool {
        true
    }
}

/// Accepts files whose extension matches, ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    /// Create a filter for `extension`, with or without the leading dot.
    #[must_use]
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Filter for `.flac` files.
    #[must_use]
    pub fn flac() -> Self {
        Self::new("flac")
    }

    /// The lowercase extension this filter matches.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

impl FileFilter for ExtensionFilter {
    fn accept(&self, path: &Path, _metadata: &Metadata) -> bool {
        self.matches(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn metadata_for(dir: &TempDir, name: &str) -> (std::path::PathBuf, Metadata) {
        let path = dir.path().join(name);
        fs::write(&path, b"x").unwrap();
        let metadata = fs::metadata(&path).unwrap();
        (path, metadata)
    }

    #[test]
    fn test_accept_all() {
        let dir = TempDir::new().unwrap();
        let (path, metadata) = metadata_for(&dir, "anything.bin");
        assert!(AcceptAll.accept(&path, &metadata));
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let filter = ExtensionFilter::flac();

        let (lower, meta) = metadata_for(&dir, "a.flac");
        assert!(filter.accept(&lower, &meta));

        let (upper, meta) = metadata_for(&dir, "B.FLAC");
        assert!(filter.accept(&upper, &meta));

        let (other, meta) = metadata_for(&dir, "c.mp3");
        assert!(!filter.accept(&other, &meta));

        let (none, meta) = metadata_for(&dir, "flac");
        assert!(!filter.accept(&none, &meta));
    }

    #[test]
    fn test_extension_filter_strips_leading_dot() {
        assert_eq!(ExtensionFilter::new(".WAV").extension(), "wav");
        assert!(ExtensionFilter::new(".wav").matches(Path::new("/x/y.Wav")));
    }
}
