//! CSV adapter
//!
//! Reads a header row plus records. Cells are trimmed; blank cells become
//! `RawValue::Empty`. Typing is left to the normalizer.

use crate::error::ComputeError;
use crate::types::{RawRow, RawValue};
use csv::{ReaderBuilder, Trim};

use super::TabularAdapter;

/// CSV payload adapter
pub struct CsvAdapter {
    delimiter: u8,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvAdapter {
    /// Comma-separated adapter
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Adapter for another single-byte delimiter (e.g. `b';'`, `b'\t'`)
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl TabularAdapter for CsvAdapter {
    fn parse(&self, raw: &str) -> Result<Vec<RawRow>, ComputeError> {
        // Strip a UTF-8 BOM left by spreadsheet exports
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());

        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();

        for record in reader.records() {
            let record = record?;
            let row: RawRow = headers
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(idx, name)| {
                    let value = match record.get(idx) {
                        Some(cell) if !cell.is_empty() => RawValue::Text(cell.to_string()),
                        _ => RawValue::Empty,
                    };
                    (name.to_string(), value)
                })
                .collect();
            rows.push(row);
        }

        Ok(rows)
    }
}
