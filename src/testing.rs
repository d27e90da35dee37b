//! Testing utilities for rowbeam runs.
//!
//! - **Fixtures**: [`CsvFixture`] writes an input file into a temporary
//!   directory, and [`read_json_array`] parses an output artifact back
//! - **Mock storage**: [`FailingStore`] fails on a chosen batch so storage
//!   error paths can be exercised without a database
//!
//! # Quick Start
//!
//! ```
//! use rowbeam::testing::*;
//! use rowbeam::{IngestPipeline, MemoryStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let fixture = CsvFixture::new("name.firstName,name.lastName,age")?
//!     .row("Jane,Doe,30")
//!     .row("John,Roe,")
//!     .write()?;
//!
//! let store = MemoryStore::new();
//! let summary = IngestPipeline::new(&store).run(fixture.input())?;
//! assert_eq!((summary.total_rows, summary.failed_count), (2, 1));
//! assert_eq!(read_json_array(&summary.outputs.records)?.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_store;

pub use fixtures::*;
pub use mock_store::*;
