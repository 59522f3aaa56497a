//! JSON rows adapter
//!
//! Accepts a JSON array of flat objects, the shape a web client or a
//! dataframe `to_json(orient="records")` export produces.

use crate::error::ComputeError;
use crate::types::{RawRow, RawValue};
use serde_json::Value;

use super::TabularAdapter;

/// JSON array-of-objects adapter
pub struct JsonRowsAdapter;

impl TabularAdapter for JsonRowsAdapter {
    fn parse(&self, raw: &str) -> Result<Vec<RawRow>, ComputeError> {
        let value: Value = serde_json::from_str(raw)?;

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ComputeError::ParseError(format!(
                    "expected a JSON array of rows, found {}",
                    json_kind(&other)
                )))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(map) => Ok(map
                    .into_iter()
                    .map(|(key, cell)| (key, to_raw_value(cell)))
                    .collect()),
                other => Err(ComputeError::ParseError(format!(
                    "row {} is a JSON {}, expected an object",
                    idx,
                    json_kind(&other)
                ))),
            })
            .collect()
    }
}

fn to_raw_value(cell: Value) -> RawValue {
    match cell {
        Value::Null => RawValue::Empty,
        Value::String(s) => RawValue::Text(s),
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Empty),
        other => RawValue::Text(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
