//! Saved run results
//!
//! Run summaries are stored as JSON so earlier runs can be listed and exported.

mod storage;

pub use storage::{ExportFormat, ResultsStorage, StoredRun};
