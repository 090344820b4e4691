//! JSON Lines gateway: one JSON object per table row

use super::{PersistenceGateway, ReviewTable};
use crate::error::{ReviewError, ReviewResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads `input`, writes to `output` (the input itself unless configured)
#[derive(Debug, Clone)]
pub struct JsonLinesGateway {
    input: PathBuf,
    output: PathBuf,
}

impl JsonLinesGateway {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        let input = input.into();
        let output = output.unwrap_or_else(|| input.clone());
        Self { input, output }
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }
}

/// Parse JSON Lines text; blank lines are skipped
pub fn parse_rows(content: &str, origin: &Path) -> ReviewResult<ReviewTable> {
    let mut rows = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            ReviewError::Input(format!("{}:{}: {}", origin.display(), lineno + 1, e))
        })?;
        match value {
            Value::Object(row) => rows.push(row),
            other => {
                return Err(ReviewError::Input(format!(
                    "{}:{}: expected a JSON object, found {}",
                    origin.display(),
                    lineno + 1,
                    kind(&other)
                )))
            }
        }
    }
    Ok(ReviewTable::new(rows))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write `table` to `path` atomically (temp file + rename)
pub fn write_rows(table: &ReviewTable, path: &Path) -> ReviewResult<()> {
    let mut content = String::new();
    for row in table.rows() {
        content.push_str(&serde_json::to_string(row)?);
        content.push('\n');
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, content)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

impl PersistenceGateway for JsonLinesGateway {
    fn load(&self) -> ReviewResult<ReviewTable> {
        if !self.input.exists() {
            return Err(poslog_common::Error::NotFound(format!(
                "review table {}",
                self.input.display()
            ))
            .into());
        }

        let content = fs::read_to_string(&self.input)?;
        let table = parse_rows(&content, &self.input)?;
        info!(
            "Loaded {} rows from {}",
            table.len(),
            self.input.display()
        );
        Ok(table)
    }

    fn write_table(&self, table: &ReviewTable) -> ReviewResult<PathBuf> {
        write_rows(table, &self.output)?;
        debug!("Wrote {} rows to {}", table.len(), self.output.display());
        Ok(self.output.clone())
    }

    fn output_path(&self) -> &Path {
        &self.output
    }
}
