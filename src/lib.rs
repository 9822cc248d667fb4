//! fdups - Concurrent duplicate file finder
//!
//! Walks a directory tree, hashes every eligible file on a generic worker
//! pool and groups the files by digest. Two finders are built in: raw file
//! content (SHA-256) and decoded FLAC audio, so re-tagged tracks still match.

#[macro_use]
pub mod logging;

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod output;
pub mod pool;
pub mod scanner;
pub mod signal;

use std::io;
use std::time::Instant;

use anyhow::Context;

use crate::cli::{Cli, Commands, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, Finder};
use crate::error::ExitCode;
use crate::logging::Logger;
use crate::output::JsonOutput;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns configuration errors ([`config::ConfigError`]) and scan errors
/// ([`duplicates::FinderError`]) so the caller can pick an exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let logger = logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => {
            let mut config = Config::load(cli.config.as_deref())?;
            config.apply_scan_args(args);
            config.validate()?;
            log_debug!(logger, "Effective configuration: {:?}", config);
            run_scan(args, &config, &logger)
        }
    }
}

fn run_scan(args: &ScanArgs, config: &Config, logger: &Logger) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler(logger)?;
    let root = std::path::absolute(&args.path)
        .with_context(|| format!("cannot resolve path {}", args.path.display()))?;

    let finder = DuplicateFinder::for_kind(
        config.finder,
        &root,
        config.finder_config().with_shutdown_flag(handler.get_flag()),
    )
    .with_logger(logger.clone());

    let start = Instant::now();
    let mut groups = finder.find().map_err(|e| {
        log_error!(logger, "Scan of {} failed: {}", root.display(), e);
        e
    })?;
    let summary = groups.summary();
    log_info!(
        logger,
        "Scanned {} files ({} distinct) in {:.2?} with the {} finder",
        summary.total_files,
        summary.groups,
        start.elapsed(),
        config.finder
    );
    log_info!(
        logger,
        "{} duplicate groups, {} duplicate files, {} reclaimable",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display()
    );

    if config.duplicates_only {
        groups.retain_duplicates();
    }

    JsonOutput::new(&groups)
        .write_to(io::stdout().lock(), config.pretty)
        .context("failed to write scan result")?;
    logger.flush();

    Ok(ExitCode::Success)
}
