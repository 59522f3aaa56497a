//! Tabular input adapters
//!
//! This module provides adapters that parse raw documents (CSV text, JSON
//! arrays of objects) into loosely typed rows for the normalizer.

mod delimited;
mod json_rows;

pub use delimited::CsvAdapter;
pub use json_rows::JsonRowsAdapter;

use crate::error::ComputeError;
use crate::types::RawRow;

/// Trait for tabular input adapters
pub trait TabularAdapter {
    /// Parse a raw document into rows keyed by source column name
    fn parse(&self, raw: &str) -> Result<Vec<RawRow>, ComputeError>;
}
