//! Persistence gateway
//!
//! Loads the session-start table and writes the manual tag column back.
//! Saves rewrite the whole file; a failed save leaves the previous output
//! untouched.

pub mod jsonl;
pub mod table;

pub use jsonl::JsonLinesGateway;
pub use table::{
    build_store, precompute_consensus, ColumnNames, LineFailure, ReviewTable, StoreOptions,
};

use crate::error::ReviewResult;
use std::path::{Path, PathBuf};

/// Durable storage for review tables
pub trait PersistenceGateway: Send {
    /// Read the session-start table
    fn load(&self) -> ReviewResult<ReviewTable>;

    /// Write `table` in full, returning where it was written
    fn write_table(&self, table: &ReviewTable) -> ReviewResult<PathBuf>;

    /// Location saves are written to
    fn output_path(&self) -> &Path;
}
