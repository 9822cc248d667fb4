//! Duplicate finder: the scan orchestrator.
//!
//! # Overview
//!
//! One call to [`Finder::find`] runs a full scan around a fresh
//! [`WorkerPool`]:
//!
//! 1. **Walk** - a walk thread traverses the root and submits one hash task
//!    per accepted file, then closes submission
//! 2. **Hash** - pool workers open each file and stream it through the
//!    injected [`Hasher`]
//! 3. **Collect** - a collector thread groups finished records by digest
//!    until the pool reports that every task is done
//!
//! Both threads post exactly one report on a two-slot channel. The first
//! error wins: the pool is stopped and no partial result is returned.
//!
//! # Example
//!
//! ```no_run
//! use fdups::duplicates::{DuplicateFinder, Finder, FinderConfig, FinderKind};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::for_kind(
//!     FinderKind::Default,
//!     Path::new("/some/path"),
//!     FinderConfig::default().with_workers(4),
//! );
//! let groups = finder.find().unwrap();
//! println!("Found {} distinct files", groups.len());
//! ```

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::select;
use serde::{Deserialize, Serialize};

use super::DigestGroups;
use crate::logging::Logger;
use crate::pool::{CancelToken, PoolError, PoolEvent, Task, TaskFn, WorkerPool};
use crate::scanner::{
    digest_to_hex, AcceptAll, ContentHasher, ExtensionFilter, FileFilter, FileRecord, FlacHasher,
    HashError, Hasher, ScanError, Walker,
};

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// Traversal failed or the root is unusable.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A hash task failed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The worker pool refused a submission or could not start.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// An orchestration thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Which thread
        name: &'static str,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An orchestration thread panicked or vanished without reporting.
    #[error("{0} thread terminated unexpectedly")]
    ThreadPanicked(&'static str),
}

/// A failed hash task: the error plus the record, when one was taken.
#[derive(thiserror::Error, Debug)]
#[error("{error}")]
pub struct HashFailure {
    /// The record the task was working on; absent when it was cancelled
    pub record: Option<FileRecord>,
    /// What went wrong
    #[source]
    pub error: HashError,
}

/// Output of one hash task.
pub type HashOutput = Result<FileRecord, HashFailure>;

type Report = Result<(), FinderError>;

enum CollectStep {
    Continue,
    Report(Report),
    Aborted,
}

/// Runs one duplicate scan.
pub trait Finder {
    /// Scan and group every eligible file by digest.
    ///
    /// # Errors
    ///
    /// Returns the first [`FinderError`] seen by the walk or the collector.
    fn find(&self) -> Result<DigestGroups, FinderError>;
}

/// The closed set of finder compositions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FinderKind {
    /// Every file, SHA-256 of the raw bytes
    #[default]
    Default,
    /// `.flac` files only, SHA-256 of the decoded audio samples
    Flac,
}

impl FinderKind {
    /// Hasher used by this kind.
    #[must_use]
    pub fn hasher(self) -> Arc<dyn Hasher> {
        match self {
            Self::Default => Arc::new(ContentHasher),
            Self::Flac => Arc::new(FlacHasher),
        }
    }

    /// Filter used by this kind.
    #[must_use]
    pub fn filter(self) -> Arc<dyn FileFilter> {
        match self {
            Self::Default => Arc::new(AcceptAll),
            Self::Flac => Arc::new(ExtensionFilter::flac()),
        }
    }

    /// Name used on the command line and in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for FinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the duplicate finder.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Number of pool workers. Defaults to the number of logical CPUs.
    pub workers: usize,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            follow_symlinks: false,
            shutdown_flag: None,
        }
    }
}

impl FinderConfig {
    /// Set the worker count (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Finder composed from a hasher and a filter.
pub struct DuplicateFinder {
    root: PathBuf,
    hasher: Arc<dyn Hasher>,
    filter: Arc<dyn FileFilter>,
    config: FinderConfig,
    logger: Logger,
}

impl DuplicateFinder {
    /// Create a finder for `root` from explicit strategies.
    #[must_use]
    pub fn new(
        root: &Path,
        hasher: Arc<dyn Hasher>,
        filter: Arc<dyn FileFilter>,
        config: FinderConfig,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            hasher,
            filter,
            config,
            logger: Logger::discard(),
        }
    }

    /// Create a finder using the strategies of `kind`.
    #[must_use]
    pub fn for_kind(kind: FinderKind, root: &Path, config: FinderConfig) -> Self {
        Self::new(root, kind.hasher(), kind.filter(), config)
    }

    /// Log through `logger` (the pool gets a clone).
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn validate_root(&self) -> Result<(), ScanError> {
        if !self.root.exists() {
            return Err(ScanError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Build the function every worker runs for one record.
    fn hash_task(&self) -> TaskFn<FileRecord, HashOutput> {
        let hasher = Arc::clone(&self.hasher);
        let logger = self.logger.clone();
        let config = self.config.clone();

        Arc::new(move |cancel: &CancelToken, mut record: FileRecord| {
            if cancel.is_cancelled() || config.is_shutdown_requested() {
                log_debug!(logger, "Task received cancellation: {}", record.path.display());
                return Err(HashFailure {
                    record: None,
                    error: HashError::Cancelled,
                });
            }

            log_info!(logger, "Calculating hash: {}", record.name);
            let hashed = panic::catch_unwind(AssertUnwindSafe(|| {
                hash_file(hasher.as_ref(), &record.path, &logger)
            }))
            .unwrap_or_else(|payload| {
                Err(HashError::Panicked {
                    path: record.path.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });
            match hashed {
                Ok(digest) => {
                    record.digest = digest_to_hex(&digest);
                    log_debug!(logger, "Hash calculated: {} {}", record.name, record.digest);
                    Ok(record)
                }
                Err(error) => Err(HashFailure {
                    record: Some(record),
                    error,
                }),
            }
        })
    }

    /// Walk-and-submit thread body.
    fn run_walk(
        &self,
        pool: &WorkerPool<FileRecord, HashOutput>,
        hash_fn: &TaskFn<FileRecord, HashOutput>,
        reports: &Sender<Report>,
    ) {
        let report = match self.walk_and_submit(pool, hash_fn) {
            Ok(submitted) => {
                pool.close_submit();
                log_debug!(self.logger, "All {} tasks submitted", submitted);
                Ok(())
            }
            Err(e) => {
                log_error!(self.logger, "Error received, aborting: {}", e);
                Err(e)
            }
        };
        let _ = reports.send(report);
    }

    fn walk_and_submit(
        &self,
        pool: &WorkerPool<FileRecord, HashOutput>,
        hash_fn: &TaskFn<FileRecord, HashOutput>,
    ) -> Result<usize, FinderError> {
        let walker = Walker::new(&self.root, Arc::clone(&self.filter))
            .with_follow_symlinks(self.config.follow_symlinks)
            .with_logger(self.logger.clone());

        let mut submitted = 0;
        for entry in walker.walk() {
            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
            let record = entry?;
            log_trace!(self.logger, "Submitting hashing task: {}", record.path.display());
            pool.submit(Task::new(record, Arc::clone(hash_fn)))?;
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Collector thread body. Owns the result map for its whole life.
    fn run_collect(
        &self,
        outputs: &Receiver<HashOutput>,
        events: &Receiver<PoolEvent>,
        abort: &Receiver<()>,
        reports: &Sender<Report>,
    ) -> DigestGroups {
        let mut groups = DigestGroups::new();
        loop {
            let step = select! {
                recv(outputs) -> output => match output {
                    Ok(Ok(record)) => {
                        if groups.insert(record) {
                            log_debug!(self.logger, "Found duplicate");
                        }
                        CollectStep::Continue
                    },
                    Ok(Err(failure)) => {
                        log_error!(self.logger, "Error received, aborting: {}", failure);
                        CollectStep::Report(Err(FinderError::Hash(failure.error)))
                    },
                    Err(_) => CollectStep::Report(Err(FinderError::ThreadPanicked("worker"))),
                },
                recv(events) -> event => match event {
                    Ok(PoolEvent::AllTasksDone) => {
                        log_debug!(self.logger, "All tasks processed");
                        CollectStep::Report(Ok(()))
                    },
                    Err(_) => CollectStep::Report(Err(FinderError::ThreadPanicked("worker"))),
                },
                recv(abort) -> _ => CollectStep::Aborted,
            };
            let step = match step {
                CollectStep::Aborted => step,
                _ if self.config.is_shutdown_requested() => {
                    log_debug!(self.logger, "Shutdown requested, aborting collection");
                    CollectStep::Report(Err(FinderError::Interrupted))
                }
                _ => step,
            };
            match step {
                CollectStep::Continue => {}
                CollectStep::Report(report) => {
                    let _ = reports.send(report);
                    return groups;
                }
                CollectStep::Aborted => {
                    log_debug!(self.logger, "Collection aborted");
                    return groups;
                }
            }
        }
    }

    /// Block until both threads report, or the first one fails.
    fn wait_for_completion(reports: &Receiver<Report>) -> Report {
        for _ in 0..2 {
            match reports.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(FinderError::ThreadPanicked("orchestration")),
            }
        }
        Ok(())
    }
}

impl Finder for DuplicateFinder {
    fn find(&self) -> Result<DigestGroups, FinderError> {
        self.validate_root()?;
        log_info!(self.logger, "Starting duplicate scan of {}", self.root.display());

        let pool: WorkerPool<FileRecord, HashOutput> =
            WorkerPool::new(self.config.workers, self.logger.clone());
        pool.start()?;
        let outputs = pool.output_channel();
        let events = pool.event_channel();
        let hash_fn = self.hash_task();

        let (report_tx, report_rx) = bounded::<Report>(2);
        let (abort_tx, abort_rx) = bounded::<()>(0);

        let pool = &pool;
        let hash_fn = &hash_fn;
        let walk_reports = report_tx.clone();

        thread::scope(|s| {
            let walk = thread::Builder::new()
                .name("fdups-walk".into())
                .spawn_scoped(s, move || self.run_walk(pool, hash_fn, &walk_reports));
            let collect = thread::Builder::new()
                .name("fdups-collect".into())
                .spawn_scoped(s, move || {
                    self.run_collect(&outputs, &events, &abort_rx, &report_tx)
                });

            let (walk, collect) = match (walk, collect) {
                (Ok(walk), Ok(collect)) => (walk, collect),
                (Err(source), _) => {
                    pool.stop();
                    drop(abort_tx);
                    return Err(FinderError::Spawn { name: "walk", source });
                }
                (_, Err(source)) => {
                    pool.stop();
                    drop(abort_tx);
                    return Err(FinderError::Spawn { name: "collect", source });
                }
            };

            let outcome = Self::wait_for_completion(&report_rx);
            pool.stop();
            drop(abort_tx);

            let collected = collect.join();
            let walked = walk.join();
            if let Err(e) = outcome {
                log_debug!(self.logger, "Scan aborted: {}", e);
                return Err(e);
            }
            if walked.is_err() {
                return Err(FinderError::ThreadPanicked("walk"));
            }
            let groups = collected.map_err(|_| FinderError::ThreadPanicked("collect"))?;
            log_info!(
                self.logger,
                "Scan of {} complete: {} files in {} groups",
                self.root.display(),
                groups.summary().total_files,
                groups.len()
            );
            Ok(groups)
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Open `path` and stream it through `hasher`. The file is closed on return.
fn hash_file(hasher: &dyn Hasher, path: &Path, logger: &Logger) -> Result<Vec<u8>, HashError> {
    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    log_trace!(logger, "Opened file: {}", path.display());

    let mut reader = BufReader::new(file);
    let digest = hasher.hash(&mut reader).map_err(|source| HashError::Digest {
        path: path.to_path_buf(),
        source,
    });
    log_trace!(logger, "Closed file: {}", path.display());
    digest
}
