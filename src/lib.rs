//! # rowbeam
//!
//! Streams a comma-separated file of people records into nested JSON and a
//! relational store.
//!
//! Column headers are dotted paths (`name.firstName`, `address.city`). Every
//! row is rebuilt into a nested object following those paths, validated, and
//! fanned out to:
//!
//! - `output.json`: every reshaped row, valid or not, as a JSON array
//! - `additional-info.json`: for valid rows carrying fields beyond `name`,
//!   `age` and `address`, `{recordIndex, name, additional_info}` entries
//! - a [`UserStore`], in fixed-size batches written one after another
//! - an age histogram reported at the end of the run
//!
//! Invalid rows are logged and skipped; IO and storage failures abort the run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rowbeam::{IngestPipeline, MemoryStore};
//! # fn main() -> anyhow::Result<()> {
//!
//! let store = MemoryStore::new();
//! let summary = IngestPipeline::new(&store).run("sample/data.csv")?;
//! println!(
//!     "{} rows, {} stored, {} rejected",
//!     summary.total_rows, summary.success_count, summary.failed_count
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Stages
//!
//! | Stage | Item |
//! |---|---|
//! | line source | [`LineSource`] |
//! | tokenizer | [`tokenize`] |
//! | reshaper | [`Header`], [`reshape`] |
//! | extractor | [`extract`], [`CanonicalRecord`] |
//! | JSON sinks | [`DualJsonSink`], [`JsonArrayWriter`] |
//! | batching | [`BatchAccumulator`] |
//! | storage | [`UserStore`], [`MemoryStore`], [`DryRunStore`], `PostgresStore` |
//! | report | [`AgeHistogram`], [`AgeDistribution`] |
//! | orchestration | [`IngestPipeline`], [`RunSummary`] |
//!
//! ## Feature Flags
//!
//! - `postgres` - PostgreSQL storage through `sqlx`
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` - read compressed input transparently

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod histogram;
pub mod io;
pub mod nested;
pub mod pipeline;
pub mod reshape;
pub mod storage;
pub mod testing;
pub mod tokenizer;
pub mod validation;

pub use batch::{BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use config::{Config, ConfigError};
pub use error::{IngestError, IngestResult};
pub use extract::{extract, CanonicalRecord};
pub use histogram::{AgeBucket, AgeDistribution, AgeHistogram};
pub use io::json_array::{DualJsonSink, JsonArrayWriter, OutputPaths};
pub use io::lines::LineSource;
pub use nested::{set_path, Nested, NestedMap};
pub use pipeline::{IngestPipeline, RunSummary};
pub use reshape::{reshape, split_row, Header};
pub use storage::{DryRunStore, MemoryStore, StorageError, StorageErrorKind, UserStore};
pub use tokenizer::tokenize;
pub use validation::{ErrorCollector, RowError, ValidationError};

#[cfg(feature = "postgres")]
pub use storage::postgres::PostgresStore;
