//! Per-file ingestion run.
//!
//! An [`IngestPipeline`] moves through four stages for each input file:
//!
//! 1. `AwaitingHeader`: the first non-blank line becomes the [`Header`].
//! 2. `StreamingRows`: each later line is tokenized, reshaped and written to
//!    the records array, then extracted. Accepted records feed the batch
//!    accumulator, the age histogram and (when they carry extra fields) the
//!    additional-info array. Rejected rows are logged and counted.
//! 3. `Flushing`: batches are written to the store one after another, both
//!    arrays are closed and the age distribution is reported.
//! 4. `Done`.
//!
//! A row that fails extraction still appears in the records array; it is
//! only kept out of storage, the additional-info array and the histogram.
//!
//! Runs are single-threaded. Two runs must not write to the same output
//! paths at the same time.

use crate::batch::{BatchAccumulator, DEFAULT_BATCH_SIZE};
use crate::config::Config;
use crate::error::{IngestError, IngestResult};
use crate::extract::extract;
use crate::histogram::{AgeDistribution, AgeHistogram};
use crate::io::json_array::{DualJsonSink, OutputPaths};
use crate::io::lines::LineSource;
use crate::reshape::{reshape, split_row, Header};
use crate::storage::UserStore;
use crate::validation::{ErrorCollector, RowError};
use serde::Serialize;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_rows: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub age_distribution: AgeDistribution,
    pub outputs: OutputPaths,
    pub rejected: Vec<RowError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingHeader,
    StreamingRows,
    Flushing,
    Done,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::AwaitingHeader => "awaiting_header",
            Stage::StreamingRows => "streaming_rows",
            Stage::Flushing => "flushing",
            Stage::Done => "done",
        }
    }
}

/// Mutable state of a run between the first line and the flush.
struct RowState<W: Write> {
    sink: DualJsonSink<W>,
    batches: BatchAccumulator,
    ages: AgeHistogram,
    rejected: ErrorCollector,
    total: u64,
}

impl<W: Write> RowState<W> {
    fn process(
        &mut self,
        header: &Header,
        line: &str,
        line_no: usize,
        outputs: &OutputPaths,
    ) -> IngestResult<()> {
        let row_index = self.total;
        self.total += 1;

        let obj = reshape(header, &split_row(line));
        self.sink
            .write_record(&obj)
            .map_err(|e| IngestError::io_at("write", &outputs.records, e))?;

        match extract(&obj) {
            Ok(record) => {
                self.ages.record(record.age);
                if let Some(extra) = &record.extra {
                    self.sink
                        .write_additional(row_index, &record.name, extra)
                        .map_err(|e| IngestError::io_at("write", &outputs.additional_info, e))?;
                }
                self.batches.push(record);
            }
            Err(err) => {
                warn!(row_index, line = line_no, error = %err, "skipping row");
                self.rejected.add_error(row_index, line_no, err);
            }
        }
        Ok(())
    }

    /// Close both arrays after a mid-stream failure so they stay valid JSON.
    fn abandon(self) {
        if let Err(close_err) = self.sink.finish() {
            error!(error = %close_err, "failed to close output files after stream error");
        }
    }
}

/// Feed every line after the header through `state`. Returns the stage
/// reached when the input ran out.
fn stream_rows<W: Write>(
    lines: &mut LineSource<'_>,
    state: &mut RowState<W>,
    outputs: &OutputPaths,
) -> IngestResult<Stage> {
    let mut header: Option<Header> = None;
    while let Some(line) = lines.next() {
        let line = line?;
        match &header {
            Some(header) => state.process(header, &line, lines.line_no(), outputs)?,
            None => {
                let parsed = Header::parse(&line);
                debug!(columns = parsed.len(), line = lines.line_no(), "header captured");
                header = Some(parsed);
                transition(Stage::AwaitingHeader, Stage::StreamingRows);
            }
        }
    }
    Ok(if header.is_some() {
        Stage::StreamingRows
    } else {
        Stage::AwaitingHeader
    })
}

/// Runs the ingestion flow for one file at a time against a store.
pub struct IngestPipeline<'s, S: UserStore + ?Sized> {
    store: &'s S,
    batch_size: NonZeroUsize,
    output_dir: Option<PathBuf>,
}

impl<'s, S: UserStore + ?Sized> IngestPipeline<'s, S> {
    /// A pipeline with the default batch size, writing outputs next to each input.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: None,
        }
    }

    /// A pipeline using the batch size and output directory from `config`.
    pub fn from_config(store: &'s S, config: &Config) -> Self {
        Self {
            store,
            batch_size: config.insert_batch_size,
            output_dir: config.output_dir.clone(),
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Where a run over `input` writes its artifacts.
    #[must_use]
    pub fn output_paths(&self, input: &Path) -> OutputPaths {
        match &self.output_dir {
            Some(dir) => OutputPaths::in_dir(dir),
            None => OutputPaths::beside(input),
        }
    }

    /// Process `input` end to end.
    ///
    /// # Errors
    /// Fails on IO errors (input unreadable, outputs unwritable) and storage
    /// errors. Invalid rows do not fail the run. When the input or the store
    /// fails partway, both output arrays are still closed before the error
    /// is returned.
    pub fn run(&self, input: impl AsRef<Path>) -> IngestResult<RunSummary> {
        let input = input.as_ref();
        info!(input = %input.display(), "processing file");

        self.store.ensure_schema()?;
        let mut lines = LineSource::open(input)?;

        let outputs = self.output_paths(input);
        let sink = DualJsonSink::create(&outputs)
            .map_err(|(path, e)| IngestError::io_at("create", &path, e))?;
        let mut state = RowState {
            sink,
            batches: BatchAccumulator::new(self.batch_size),
            ages: AgeHistogram::new(),
            rejected: ErrorCollector::new(),
            total: 0,
        };

        let reached = match stream_rows(&mut lines, &mut state, &outputs) {
            Ok(stage) => stage,
            Err(e) => {
                state.abandon();
                return Err(e);
            }
        };

        transition(reached, Stage::Flushing);
        let summary = self.flush(state, outputs)?;
        transition(Stage::Flushing, Stage::Done);
        Ok(summary)
    }

    fn flush<W: Write>(&self, state: RowState<W>, outputs: OutputPaths) -> IngestResult<RunSummary> {
        let RowState {
            sink,
            mut batches,
            ages,
            rejected,
            total,
        } = state;

        let stored = batches.drain_into(self.store);
        let (written, additional) = sink.counts();
        let closed = sink.finish();

        let success_count = match stored {
            Ok(n) => n,
            Err(e) => {
                if let Err(close_err) = closed {
                    error!(error = %close_err, "failed to close output files after storage error");
                }
                return Err(e.into());
            }
        };
        closed.map_err(|e| IngestError::io("close output files", e))?;

        info!(path = %outputs.records.display(), records = written, "JSON output saved");
        info!(path = %outputs.additional_info.display(), records = additional, "additional info saved");

        let age_distribution = ages.distribution();
        age_distribution.log();

        let failed_count = rejected.error_count() as u64;
        info!(total_rows = total, success_count, failed_count, "run complete");
        Ok(RunSummary {
            total_rows: total,
            success_count,
            failed_count,
            age_distribution,
            outputs,
            rejected: rejected.errors().to_vec(),
        })
    }
}

fn transition(from: Stage, to: Stage) {
    debug!(from = from.name(), to = to.name(), "pipeline stage");
}
