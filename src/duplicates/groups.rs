//! Digest-keyed grouping of hashed files.
//!
//! # Overview
//!
//! [`DigestGroups`] maps a lowercase-hex digest to every [`FileRecord`]
//! sharing it, in the order the collector received them. Groups with a
//! single member are kept: they are files without duplicates.
//!
//! # Example
//!
//! ```
//! use fdups::duplicates::DigestGroups;
//! use fdups::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let mut groups = DigestGroups::new();
//! for (name, digest) in [("a", "aa"), ("b", "aa"), ("c", "cc")] {
//!     let mut record = FileRecord::new(PathBuf::from(name), 10);
//!     record.digest = digest.to_string();
//!     groups.insert(record);
//! }
//!
//! assert_eq!(groups.len(), 2);
//! let summary = groups.summary();
//! assert_eq!(summary.duplicate_groups, 1);
//! assert_eq!(summary.reclaimable_space, 10);
//! ```

use std::collections::hash_map::{self, HashMap};

use serde::Serialize;

use crate::scanner::FileRecord;

/// Files grouped by content digest.
///
/// Serializes as a plain JSON object: `{"<digest>": [record, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DigestGroups {
    groups: HashMap<String, Vec<FileRecord>>,
}

impl DigestGroups {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hashed record to its digest group.
    ///
    /// Returns `true` if the group already existed, i.e. the record is a
    /// duplicate of something seen before.
    pub fn insert(&mut self, record: FileRecord) -> bool {
        match self.groups.entry(record.digest.clone()) {
            hash_map::Entry::Occupied(mut group) => {
                group.get_mut().push(record);
                true
            }
            hash_map::Entry::Vacant(slot) => {
                slot.insert(vec![record]);
                false
            }
        }
    }

    /// Records sharing `digest`.
    #[must_use]
    pub fn get(&self, digest: &str) -> Option<&[FileRecord]> {
        self.groups.get(digest).map(Vec::as_slice)
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no file was grouped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over `(digest, records)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FileRecord])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Drop every group with fewer than two files.
    pub fn retain_duplicates(&mut self) {
        self.groups.retain(|_, files| files.len() > 1);
    }

    /// Aggregate counts over all groups.
    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        let mut summary = GroupSummary {
            groups: self.groups.len(),
            ..GroupSummary::default()
        };
        for files in self.groups.values() {
            summary.total_files += files.len();
            summary.total_size += files.iter().map(|f| f.size).sum::<u64>();
            if files.len() > 1 {
                summary.duplicate_groups += 1;
                summary.duplicate_files += files.len() - 1;
                let size = files.first().map_or(0, |f| f.size);
                summary.reclaimable_space += size * (files.len() as u64 - 1);
            }
        }
        summary
    }
}

/// Totals computed from a [`DigestGroups`] map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    /// Number of hashed files
    pub total_files: usize,
    /// Combined size of hashed files in bytes
    pub total_size: u64,
    /// Number of distinct digests
    pub groups: usize,
    /// Number of digests shared by two or more files
    pub duplicate_groups: usize,
    /// Files beyond the first in each duplicate group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per duplicate group
    pub reclaimable_space: u64,
}

impl GroupSummary {
    /// Reclaimable space formatted for humans (e.g. "1.5 MiB").
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }
}
