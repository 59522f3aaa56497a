//! Record normalization
//!
//! This module maps heterogeneous tabular rows onto canonical workout sets.
//! - Column names resolved case-insensitively through an alias table
//! - Dates and numbers coerced from text or numeric cells
//! - Invalid, non-positive and pre-cutoff rows dropped with a reason
//! - Output sorted ascending by date (stable)

use crate::metrics::MetricCalculator;
use crate::types::{
    NewEntry, NormalizeOutcome, NormalizedBatch, RawRow, RawValue, RejectReason, RejectedRow,
    WorkoutSet, DEFAULT_SET_TYPE,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Sets dated before this year are treated as stale and dropped
pub const CUTOFF_YEAR: i32 = 2024;

/// Canonical fields that must be present after aliasing
pub const REQUIRED_FIELDS: [&str; 4] = ["exercise", "date", "weight", "reps"];

/// Accepted column names per canonical field, in priority order (lowercase)
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("exercise", &["exercise", "exercise_title", "title"]),
    ("date", &["date", "start_time"]),
    ("weight", &["weight", "weight_kg"]),
    ("reps", &["reps"]),
    ("set_type", &["set_type", "settype", "set type"]),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d %b %Y, %H:%M",
    "%d %b %Y %H:%M",
];

/// Normalizer for converting raw tabular rows to canonical workout sets
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw table
    ///
    /// Returns `FormatRejected` when a required field has no matching column in
    /// any row. Otherwise every row is either converted or listed as rejected.
    pub fn normalize(rows: &[RawRow]) -> NormalizeOutcome {
        let columns = resolve_columns(rows);

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !columns.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        if !missing.is_empty() {
            warn!(missing = ?missing, rows = rows.len(), "input format rejected");
            return NormalizeOutcome::FormatRejected { missing };
        }

        let mut sets = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match normalize_row(row, &columns) {
                Ok(set) => sets.push(set),
                Err(reason) => rejected.push(RejectedRow { index, reason }),
            }
        }

        // sort_by_key is stable, so same-day sets keep input order
        sets.sort_by_key(|set| set.date);

        debug!(
            accepted = sets.len(),
            rejected = rejected.len(),
            "normalized workout rows"
        );

        NormalizeOutcome::Normalized(NormalizedBatch { sets, rejected })
    }

    /// Validate a manually entered set with the same rules as uploaded rows
    pub fn normalize_entry(entry: &NewEntry) -> Result<WorkoutSet, RejectReason> {
        build_set(
            Some(entry.exercise.trim()).filter(|name| !name.is_empty()),
            Some(&RawValue::Text(entry.date.clone())),
            Some(entry.weight).filter(|w| w.is_finite()),
            Some(f64::from(entry.reps)),
            None,
        )
    }
}

/// Map each canonical field to the source column name chosen for it
///
/// Column names are compared case-folded and trimmed. The union of columns
/// over all rows is considered, since rows may be sparse.
fn resolve_columns(rows: &[RawRow]) -> BTreeMap<&'static str, String> {
    let available: BTreeSet<String> = rows
        .iter()
        .flat_map(|row| row.keys())
        .map(|key| fold_column(key))
        .collect();

    COLUMN_ALIASES
        .iter()
        .filter_map(|(field, aliases)| {
            aliases
                .iter()
                .find(|alias| available.contains(**alias))
                .map(|alias| (*field, alias.to_string()))
        })
        .collect()
}

fn fold_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Cell of `row` stored under the resolved column for `field`
fn cell<'a>(
    row: &'a RawRow,
    columns: &BTreeMap<&'static str, String>,
    field: &str,
) -> Option<&'a RawValue> {
    let wanted = columns.get(field)?;
    row.iter()
        .find(|(key, _)| fold_column(key) == *wanted)
        .map(|(_, value)| value)
}

fn normalize_row(
    row: &RawRow,
    columns: &BTreeMap<&'static str, String>,
) -> Result<WorkoutSet, RejectReason> {
    let exercise = cell(row, columns, "exercise").and_then(RawValue::as_text);
    let set_type = cell(row, columns, "set_type").and_then(RawValue::as_text);

    build_set(
        exercise.as_deref(),
        cell(row, columns, "date"),
        cell(row, columns, "weight").and_then(RawValue::as_f64),
        cell(row, columns, "reps").and_then(RawValue::as_f64),
        set_type,
    )
}

fn build_set(
    exercise: Option<&str>,
    date: Option<&RawValue>,
    weight: Option<f64>,
    reps: Option<f64>,
    set_type: Option<String>,
) -> Result<WorkoutSet, RejectReason> {
    let exercise = exercise.ok_or(RejectReason::MissingExercise)?;
    let date = date.and_then(parse_date).ok_or(RejectReason::InvalidDate)?;
    let weight = weight.ok_or(RejectReason::InvalidWeight)?;
    let reps = reps.ok_or(RejectReason::InvalidReps)?;

    if weight <= 0.0 {
        return Err(RejectReason::NonPositiveWeight);
    }
    if reps <= 0.0 {
        return Err(RejectReason::NonPositiveReps);
    }
    if reps.fract() != 0.0 {
        return Err(RejectReason::FractionalReps);
    }
    if reps > f64::from(u32::MAX) {
        return Err(RejectReason::InvalidReps);
    }
    if date.year() < CUTOFF_YEAR {
        return Err(RejectReason::BeforeCutoff);
    }

    let reps = reps as u32;
    let metrics = MetricCalculator::derive(weight, reps);
    if !metrics.volume.is_finite() || !metrics.e1rm.is_finite() {
        return Err(RejectReason::MetricOverflow);
    }

    Ok(WorkoutSet {
        date,
        exercise: exercise.to_string(),
        weight,
        reps,
        set_type: set_type.unwrap_or_else(|| DEFAULT_SET_TYPE.to_string()),
        volume: metrics.volume,
        e1rm: metrics.e1rm,
    })
}

/// Parse a calendar date from a text cell, discarding any time of day
///
/// Numeric cells are not interpreted as timestamps.
pub fn parse_date(value: &RawValue) -> Option<NaiveDate> {
    let text = match value {
        RawValue::Text(s) => s.trim(),
        _ => return None,
    };

    if text.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(datetime.date());
    }

    // Keep the calendar date as written, not shifted to UTC
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.date_naive())
}
