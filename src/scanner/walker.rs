//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] performs a depth-first traversal (children sorted by file
//! name) and turns every regular file accepted by its [`FileFilter`] into a
//! [`FileRecord`]. Traversal errors are yielded with the offending path;
//! callers decide whether to stop.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use fdups::scanner::{ExtensionFilter, Walker};
//!
//! let walker = Walker::new(Path::new("/music"), Arc::new(ExtensionFilter::flac()));
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} FLAC files", files.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileFilter, FileRecord, ScanError};
use crate::logging::Logger;

/// Depth-first directory walker.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Decides which files are yielded
    filter: Arc<dyn FileFilter>,
    /// Follow symbolic links during traversal
    follow_symlinks: bool,
    logger: Logger,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `filter` - Predicate applied to every regular file
    #[must_use]
    pub fn new(path: &Path, filter: Arc<dyn FileFilter>) -> Self {
        Self {
            root: path.to_path_buf(),
            filter,
            follow_symlinks: false,
            logger: Logger::discard(),
        }
    }

    /// Follow symbolic links. Loops are reported as traversal errors.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Log discovered, skipped and filtered entries.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Directories are descended silently and non-regular files are
    /// skipped. A symlink that is not followed is resolved once: a link to a
    /// file is yielded under the link's own path, a link to a directory is
    /// skipped, and a dangling link is a traversal error.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(ScanError::Traversal {
                        path,
                        source: e.into(),
                    }))
                }
            })
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileRecord, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            log_debug!(self.logger, "Discovered directory: {}", path.display());
            return None;
        }

        let metadata = if file_type.is_symlink() {
            // Only reachable when links are not followed.
            match fs::metadata(path) {
                Ok(m) if m.is_dir() => {
                    log_trace!(self.logger, "Skipping symlink to directory: {}", path.display());
                    return None;
                }
                Ok(m) => m,
                Err(source) => {
                    return Some(Err(ScanError::Traversal {
                        path: path.to_path_buf(),
                        source,
                    }))
                }
            }
        } else {
            match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    return Some(Err(ScanError::Traversal {
                        path: path.to_path_buf(),
                        source: e.into(),
                    }))
                }
            }
        };

        if !metadata.is_file() {
            log_trace!(self.logger, "Skipping special file: {}", path.display());
            return None;
        }

        if !self.filter.accept(path, &metadata) {
            log_debug!(self.logger, "Skipped file (filtered): {}", path.display());
            return None;
        }

        log_debug!(self.logger, "Discovered file: {}", path.display());
        Some(Ok(FileRecord::new(path.to_path_buf(), metadata.len())))
    }
}
