//! Review table: rows of named columns, and the conversion to a review store
//!
//! Row layout (column names configurable through [`ColumnNames`]):
//!
//! ```text
//! {"log_line": "...", "tokens": [...], "majority": [...],
//!  "consensus": {"majority": [...], "confidence": [...], "minority": [...]},
//!  "tagger_outputs": {"tagger": [...], ...}, "manual_tagging": [...]}
//! ```
//!
//! `consensus` wins over `tagger_outputs` when both are present.

use crate::consensus::{build_consensus_with, ConsensusRecord, TaggerOutputs, TagsetProfile};
use crate::error::{ReviewError, ReviewResult};
use crate::models::{ReviewItem, ReviewStore};
use poslog_common::config::DEFAULT_MANUAL_COLUMN;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// One table row
pub type Row = Map<String, Value>;

/// Table rows in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewTable {
    rows: Vec<Row>,
}

impl ReviewTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set `column` of `row`; out-of-range rows are ignored
    pub fn set_cell(&mut self, row: usize, column: &str, value: Value) {
        if let Some(row) = self.rows.get_mut(row) {
            row.insert(column.to_string(), value);
        }
    }

    /// Write every item's manual tags into `column`
    ///
    /// Rows without an item (skipped at load) keep whatever the column held;
    /// they only get `null` when the column is missing.
    pub fn write_manual_column(&mut self, column: &str, store: &ReviewStore) {
        for row in &mut self.rows {
            row.entry(column.to_string()).or_insert(Value::Null);
        }
        for item in store.iter() {
            let tags = item
                .manual_tags()
                .iter()
                .map(|tag| tag.clone().map_or(Value::Null, Value::String))
                .collect();
            self.set_cell(item.source_row, column, Value::Array(tags));
        }
    }
}

/// Column names of the review table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub tokens: String,
    pub log_line: String,
    pub tagger_outputs: String,
    pub consensus: String,
    pub majority: String,
    pub manual: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            tokens: "tokens".to_string(),
            log_line: "log_line".to_string(),
            tagger_outputs: "tagger_outputs".to_string(),
            consensus: "consensus".to_string(),
            majority: "majority".to_string(),
            manual: DEFAULT_MANUAL_COLUMN.to_string(),
        }
    }
}

/// How rows become review items
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub columns: ColumnNames,
    /// Repairs used when consensus is computed from raw tagger outputs
    pub profile: TagsetProfile,
    /// Start from the seed majority instead of absent manual tags
    pub prefill_majority: bool,
}

/// A row that could not be turned into a review item
#[derive(Debug)]
pub struct LineFailure {
    pub row: usize,
    pub error: ReviewError,
}

/// Present, non-null cell of `row`
fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|value| !value.is_null())
}

fn decode<T: DeserializeOwned>(row: &Row, column: &str) -> ReviewResult<Option<T>> {
    match cell(row, column) {
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ReviewError::Input(format!("column '{}': {}", column, e))),
        None => Ok(None),
    }
}

/// Consensus of a row: the stored record, or one computed from tagger outputs
fn row_consensus(row: &Row, options: &StoreOptions) -> ReviewResult<ConsensusRecord> {
    let columns = &options.columns;
    if let Some(record) = decode::<ConsensusRecord>(row, &columns.consensus)? {
        return Ok(record);
    }
    match decode::<TaggerOutputs>(row, &columns.tagger_outputs)? {
        Some(outputs) => build_consensus_with(&options.profile, &outputs),
        None => Err(ReviewError::Input(format!(
            "row has neither '{}' nor '{}'",
            columns.consensus, columns.tagger_outputs
        ))),
    }
}

fn parse_row(source_row: usize, row: &Row, options: &StoreOptions) -> ReviewResult<ReviewItem> {
    let columns = &options.columns;
    let tokens: Vec<String> = decode(row, &columns.tokens)?
        .ok_or_else(|| ReviewError::Input(format!("missing '{}' column", columns.tokens)))?;

    let mut item = ReviewItem::new(source_row, source_row, tokens, row_consensus(row, options)?)?;

    if let Some(line) = decode::<String>(row, &columns.log_line)? {
        item = item.with_log_line(line);
    }
    if let Some(seed) = decode::<Vec<Option<String>>>(row, &columns.majority)? {
        item = item.with_seed_majority(seed)?;
    }

    match decode::<Vec<Option<String>>>(row, &columns.manual)? {
        Some(saved) => item.with_manual_tags(saved),
        None if options.prefill_majority => Ok(item.prefill_from_seed()),
        None => Ok(item),
    }
}

/// Build the review store from `table`
///
/// Rows are parsed in parallel. A row that fails is logged and left out of
/// the store; the failures are returned alongside it.
pub fn build_store(table: &ReviewTable, options: &StoreOptions) -> (ReviewStore, Vec<LineFailure>) {
    let parsed: Vec<ReviewResult<ReviewItem>> = table
        .rows()
        .par_iter()
        .enumerate()
        .map(|(source_row, row)| parse_row(source_row, row, options))
        .collect();

    let mut items = Vec::with_capacity(parsed.len());
    let mut failures = Vec::new();
    for (row, result) in parsed.into_iter().enumerate() {
        match result {
            Ok(item) => items.push(item),
            Err(error) => {
                warn!("Skipping row {}: {}", row, error);
                failures.push(LineFailure { row, error });
            }
        }
    }

    info!(
        "Built review store: {} items, {} rows skipped",
        items.len(),
        failures.len()
    );
    (ReviewStore::new(items), failures)
}

/// Compute consensus and majority seeds for every row with tagger outputs
///
/// Rows that fail get `null` in both columns and are reported back.
pub fn precompute_consensus(
    table: &mut ReviewTable,
    columns: &ColumnNames,
    profile: &TagsetProfile,
) -> Vec<LineFailure> {
    let results: Vec<ReviewResult<ConsensusRecord>> = table
        .rows()
        .par_iter()
        .map(|row| {
            decode::<TaggerOutputs>(row, &columns.tagger_outputs)?
                .ok_or_else(|| {
                    ReviewError::Input(format!("missing '{}' column", columns.tagger_outputs))
                })
                .and_then(|outputs| build_consensus_with(profile, &outputs))
        })
        .collect();

    let mut failures = Vec::new();
    for (row, result) in results.into_iter().enumerate() {
        let (consensus, majority) = match result.and_then(|record| {
            Ok((
                serde_json::to_value(&record)?,
                serde_json::to_value(&record.majority)?,
            ))
        }) {
            Ok(values) => values,
            Err(error) => {
                warn!("No consensus for row {}: {}", row, error);
                failures.push(LineFailure { row, error });
                (Value::Null, Value::Null)
            }
        };
        table.set_cell(row, &columns.consensus, consensus);
        table.set_cell(row, &columns.majority, majority);
    }
    failures
}
