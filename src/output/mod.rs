//! Output formatters for scan results.
//!
//! # Example
//!
//! ```no_run
//! use fdups::duplicates::{DuplicateFinder, Finder, FinderConfig, FinderKind};
//! use fdups::output::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::for_kind(FinderKind::Default, Path::new("."), FinderConfig::default());
//! let groups = finder.find().unwrap();
//! println!("{}", JsonOutput::new(&groups).to_json_pretty().unwrap());
//! ```

pub mod json;

pub use json::JsonOutput;
