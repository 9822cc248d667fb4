//! Command-line interface definitions for fdups.
//!
//! # Example
//!
//! ```bash
//! # Group every file under ~/Downloads by content
//! fdups scan ~/Downloads
//!
//! # Compare FLAC files by their decoded audio, 8 workers, pretty JSON
//! fdups scan ~/Music --finder flac --workers 8 --pretty
//!
//! # Verbose mode for debugging
//! fdups -v scan ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::duplicates::FinderKind;

/// Concurrent duplicate file finder.
///
/// fdups hashes every eligible file under a directory on a pool of worker
/// threads and prints the files grouped by digest as JSON.
#[derive(Debug, Parser)]
#[command(name = "fdups")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for fdups.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Finder to use: raw content (default) or decoded FLAC audio (flac)
    #[arg(short, long, value_enum)]
    pub finder: Option<FinderKind>,

    /// Number of hashing workers (default: number of CPUs)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Descend into symlinked directories during scan
    ///
    /// Links to files are always hashed; link cycles are reported as
    /// traversal errors.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,

    /// Only print groups with two or more files
    #[arg(long)]
    pub duplicates_only: bool,
}
