//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Orchestrating a scan over the worker pool ([`DuplicateFinder`])
//! - Choosing a hasher/filter composition ([`FinderKind`])
//! - Grouping hashed files by digest ([`DigestGroups`])

pub mod finder;
pub mod groups;

pub use finder::{
    DuplicateFinder, Finder, FinderConfig, FinderError, FinderKind, HashFailure, HashOutput,
};
pub use groups::{DigestGroups, GroupSummary};
