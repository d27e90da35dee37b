//! Process configuration.
//!
//! Settings are resolved once at startup into a [`Config`] value and handed to
//! whatever needs them. [`Config::from_env`] loads a `.env` file when one is
//! present, then reads:
//!
//! | Variable | Default |
//! |---|---|
//! | `CSV_FILE_PATH` | `sample/data.csv` |
//! | `DATABASE_URL` | unset (required unless dry run) |
//! | `INSERT_BATCH_SIZE` | `1000` |
//! | `DRY_RUN` | `false` |
//! | `OUTPUT_DIR` | the input file's directory |

use crate::batch::DEFAULT_BATCH_SIZE;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_INPUT_PATH: &str = "sample/data.csv";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("DATABASE_URL is not set (required unless DRY_RUN=true)")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_path: PathBuf,
    pub database_url: Option<String>,
    pub insert_batch_size: NonZeroUsize,
    pub dry_run: bool,
    /// Where `output.json` and `additional-info.json` go; `None` means next to the input.
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            database_url: None,
            insert_batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            output_dir: None,
        }
    }
}

impl Config {
    /// Load `.env` if present, then resolve from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Config::default();
        if let Some(path) = get("CSV_FILE_PATH") {
            config.input_path = PathBuf::from(path);
        }
        config.database_url = get("DATABASE_URL");
        if let Some(raw) = get("INSERT_BATCH_SIZE") {
            config.insert_batch_size = parse_batch_size("INSERT_BATCH_SIZE", &raw)?;
        }
        if let Some(raw) = get("DRY_RUN") {
            config.dry_run = raw == "true";
        }
        config.output_dir = get("OUTPUT_DIR").map(PathBuf::from);
        Ok(config)
    }

    /// The database URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingDatabaseUrl`] when none is configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Parse a positive batch size.
///
/// # Errors
/// Returns an error naming `key` if `raw` is not a positive integer.
pub fn parse_batch_size(key: &'static str, raw: &str) -> Result<NonZeroUsize, ConfigError> {
    raw.trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a positive integer",
        })
}
