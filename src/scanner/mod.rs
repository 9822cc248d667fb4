//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Depth-first directory walking using walkdir
//! - Pluggable file filters ([`FileFilter`])
//! - Pluggable content digests ([`Hasher`]): raw SHA-256 or decoded FLAC audio
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`filter`]: Entry eligibility predicates
//! - [`hasher`]: Streaming digest strategies
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use fdups::scanner::{AcceptAll, Walker};
//!
//! let walker = Walker::new(Path::new("."), Arc::new(AcceptAll));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

pub mod filter;
pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

pub use filter::{AcceptAll, ExtensionFilter, FileFilter};
pub use hasher::{digest_to_hex, ContentHasher, Digest, DigestError, FlacHasher, Hasher};
pub use walker::Walker;

/// Metadata for a discovered file plus its digest once computed.
///
/// Serialized as `{name, path, size, hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Base name of the file
    pub name: String,
    /// Absolute path to the file; serialized lossily when not valid UTF-8
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Lowercase hexadecimal digest; empty until hashed
    #[serde(rename = "hash")]
    pub digest: String,
}

impl FileRecord {
    /// Create a record that has not been hashed yet.
    ///
    /// The name is taken from the last path component.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            size,
            digest: String::new(),
        }
    }

    /// Whether the digest has been written.
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        !self.digest.is_empty()
    }
}

fn serialize_path_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A path could not be read during traversal, including dangling
    /// symlinks and link cycles.
    #[error("error accessing path {path}: {source}")]
    Traversal {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced by a hash task.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file could not be opened for reading.
    #[error("failed to open {path}: {source}")]
    Open {
        /// File that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The hasher rejected the content or reading failed midway.
    #[error("failed to hash {path}: {source}")]
    Digest {
        /// File being hashed
        path: PathBuf,
        /// The underlying digest error
        #[source]
        source: DigestError,
    },

    /// The hasher panicked while processing the file.
    #[error("hasher panicked on {path}: {message}")]
    Panicked {
        /// File being hashed
        path: PathBuf,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The task saw cancellation before doing any work.
    #[error("task cancelled")]
    Cancelled,
}
