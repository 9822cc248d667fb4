//! Logging infrastructure for fdups.
//!
//! This module builds an `env_logger` backend behind the `log` facade, but
//! instead of installing it process-wide it hands back a [`Logger`] that is
//! passed explicitly to the finder and the worker pool.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: Include timestamp, level, and module path for detailed debugging
//! - **Release builds**: Compact format with level and message only for cleaner output
//!
//! # Example
//!
//! ```rust
//! use fdups::log_info;
//! use fdups::logging::Logger;
//!
//! let logger = Logger::discard();
//! log_info!(logger, "Scanning {}", "/tmp");
//! ```

use std::env;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use env_logger::Builder;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Shared handle to a log backend.
///
/// Cloning is cheap; every clone writes to the same backend.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<dyn Log>,
}

impl Logger {
    /// Wrap an existing log backend.
    #[must_use]
    pub fn new(inner: Arc<dyn Log>) -> Self {
        Self { inner }
    }

    /// A logger that drops every record.
    #[must_use]
    pub fn discard() -> Self {
        Self::new(Arc::new(Discard))
    }

    /// Whether a record at `level` for `target` would be written.
    #[must_use]
    pub fn enabled(&self, level: Level, target: &str) -> bool {
        let metadata = Metadata::builder().level(level).target(target).build();
        self.inner.enabled(&metadata)
    }

    /// Write one record. Usually called through the `log_*!` macros.
    pub fn log(&self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        if !self.enabled(level, target) {
            return;
        }
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(target)
                .module_path(Some(target))
                .args(args)
                .build(),
        );
    }

    /// Flush buffered records.
    pub fn flush(&self) {
        self.inner.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

struct Discard;

impl Log for Discard {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _record: &Record<'_>) {}

    fn flush(&self) {}
}

/// Log an error through a [`Logger`] handle.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Error, module_path!(), format_args!($($arg)+))
    };
}

/// Log a warning through a [`Logger`] handle.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Warn, module_path!(), format_args!($($arg)+))
    };
}

/// Log an info message through a [`Logger`] handle.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Info, module_path!(), format_args!($($arg)+))
    };
}

/// Log a debug message through a [`Logger`] handle.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Debug, module_path!(), format_args!($($arg)+))
    };
}

/// Log a trace message through a [`Logger`] handle.
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Trace, module_path!(), format_args!($($arg)+))
    };
}

/// Build the application logger from CLI verbosity flags.
///
/// Call once at startup and pass the returned handle (or clones of it) to
/// every component that logs.
///
/// # Priority
///
/// 1. If `RUST_LOG` environment variable is set, it takes precedence
/// 2. If `quiet` is true: Error level only
/// 3. If `verbose >= 2`: Trace level
/// 4. If `verbose == 1`: Debug level
/// 5. Default: Info level
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
#[must_use]
pub fn init_logging(verbose: u8, quiet: bool) -> Logger {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    configure_format(&mut builder, verbose);

    let backend = builder.build();
    let level = backend.filter();
    let logger = Logger::new(Arc::new(backend));

    if use_env {
        log_debug!(
            logger,
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log_debug!(logger, "Logging initialized at level: {:?}", level);
    }

    logger
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configure the log format based on build type and verbosity.
///
/// - Debug builds: timestamp, level, module path (for detailed debugging)
/// - Release builds: compact format (level + message only)
#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_millis();
        let level = record.level();
        let level_style = buf.default_level_style(level);

        if verbose >= 1 {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                timestamp,
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} {}",
                timestamp,
                level,
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        writeln!(
            buf,
            "{level_style}{:<5}{level_style:#} {}",
            level,
            record.args()
        )
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend that keeps formatted records in memory.
    #[derive(Default)]
    pub(crate) struct Capture {
        pub(crate) lines: Mutex<Vec<(Level, String)>>,
    }

    impl Log for Capture {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            self.lines
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    #[test]
    fn test_determine_level_default() {
        assert_eq!(determine_level(0, false), LevelFilter::Info);
    }

    #[test]
    fn test_determine_level_verbose() {
        assert_eq!(determine_level(1, false), LevelFilter::Debug);
    }

    #[test]
    fn test_determine_level_trace() {
        assert_eq!(determine_level(2, false), LevelFilter::Trace);
        assert_eq!(determine_level(3, false), LevelFilter::Trace);
    }

    #[test]
    fn test_determine_level_quiet_overrides_verbose() {
        assert_eq!(determine_level(0, true), LevelFilter::Error);
        assert_eq!(determine_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_discard_is_never_enabled() {
        let logger = Logger::discard();
        assert!(!logger.enabled(Level::Error, "fdups"));
        log_error!(logger, "dropped {}", 1);
    }

    #[test]
    fn test_macros_route_through_handle() {
        let capture = Arc::new(Capture::default());
        let logger = Logger::new(capture.clone());

        log_info!(logger, "hello {}", "world");
        log_debug!(logger.clone(), "second");
        log_warn!(logger, "careful");

        let lines = capture.lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                (Level::Info, "hello world".to_string()),
                (Level::Debug, "second".to_string()),
                (Level::Warn, "careful".to_string()),
            ]
        );
    }
}
