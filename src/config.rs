//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. `FDUPS_*` environment variables (e.g. `FDUPS_WORKERS=8`)
//! 4. Command-line flags
//!
//! ```toml
//! workers = 8
//! finder = "flac"
//! follow_symlinks = false
//! pretty = true
//! duplicates_only = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::{FinderConfig, FinderKind};

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "FDUPS_";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or holds a value of the wrong type.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The worker count must be positive.
    #[error("invalid configuration: workers must be at least 1")]
    InvalidWorkers,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing workers.
    pub workers: usize,
    /// Which finder composition to run.
    pub finder: FinderKind,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Pretty-print the JSON result.
    pub pretty: bool,
    /// Drop single-file groups from the output.
    pub duplicates_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            finder: FinderKind::Default,
            follow_symlinks: false,
            pretty: false,
            duplicates_only: false,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// A missing default config file is not an error; a missing explicit
    /// one is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is unreadable or invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, ENV_PREFIX)
    }

    fn load_with_env(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(env_prefix));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "fdups", "fdups").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Overlay the command-line flags. Absent options and unset switches
    /// leave the lower layers untouched.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
        if let Some(finder) = args.finder {
            self.finder = finder;
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.pretty |= args.pretty;
        self.duplicates_only |= args.duplicates_only;
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWorkers`] for a zero worker count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_workers(self.workers)
            .with_follow_symlinks(self.follow_symlinks)
    }
}
