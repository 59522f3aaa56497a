//! Core types for the Liftflux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw tabular rows, canonical workout sets, normalization outcomes,
//! classification labels and forecast output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Set type assigned when the input carries none
pub const DEFAULT_SET_TYPE: &str = "NORMAL_SET";

/// A single cell of raw tabular input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
}

impl RawValue {
    /// Text view of the cell, `None` for empty or blank cells
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RawValue::Empty => None,
        }
    }

    /// Numeric view of the cell; strings are parsed, non-finite values rejected
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Empty => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// One row of raw tabular input, keyed by column name as it appeared in the source
pub type RawRow = BTreeMap<String, RawValue>;

/// Canonical workout set
///
/// Field order is the column order of the persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Calendar date of the set
    pub date: NaiveDate,
    /// Exercise display name (case preserved)
    pub exercise: String,
    /// Load lifted, same mass unit as the configured bodyweight
    pub weight: f64,
    /// Repetitions performed
    pub reps: u32,
    /// Free-form set label (warmup, normal, dropset, ...)
    pub set_type: String,
    /// weight * reps
    pub volume: f64,
    /// Estimated one-rep max, 2 decimals
    pub e1rm: f64,
}

/// Why a raw row was dropped during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingExercise,
    InvalidDate,
    InvalidWeight,
    InvalidReps,
    NonPositiveWeight,
    NonPositiveReps,
    FractionalReps,
    BeforeCutoff,
    /// Volume or e1RM overflowed to infinity
    MetricOverflow,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingExercise => "missing_exercise",
            RejectReason::InvalidDate => "invalid_date",
            RejectReason::InvalidWeight => "invalid_weight",
            RejectReason::InvalidReps => "invalid_reps",
            RejectReason::NonPositiveWeight => "non_positive_weight",
            RejectReason::NonPositiveReps => "non_positive_reps",
            RejectReason::FractionalReps => "fractional_reps",
            RejectReason::BeforeCutoff => "before_cutoff",
            RejectReason::MetricOverflow => "metric_overflow",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dropped input row and the reason it was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Zero-based index of the row in the raw input
    pub index: usize,
    pub reason: RejectReason,
}

/// Normalized series plus the rows that did not survive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    /// Canonical sets, ascending by date
    pub sets: Vec<WorkoutSet>,
    /// Rejected rows in input order
    pub rejected: Vec<RejectedRow>,
}

/// Result of normalizing a raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalizeOutcome {
    /// Required columns were found; the batch may still be empty
    Normalized(NormalizedBatch),
    /// Required columns are missing after aliasing
    FormatRejected { missing: Vec<String> },
}

impl NormalizeOutcome {
    pub fn is_format_rejected(&self) -> bool {
        matches!(self, NormalizeOutcome::FormatRejected { .. })
    }

    /// Canonical sets, empty when the format was rejected
    pub fn sets(&self) -> &[WorkoutSet] {
        match self {
            NormalizeOutcome::Normalized(batch) => &batch.sets,
            NormalizeOutcome::FormatRejected { .. } => &[],
        }
    }

    pub fn into_sets(self) -> Vec<WorkoutSet> {
        match self {
            NormalizeOutcome::Normalized(batch) => batch.sets,
            NormalizeOutcome::FormatRejected { .. } => Vec::new(),
        }
    }
}

/// Muscle group inferred from the exercise name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MuscleGroup {
    Chest,
    Legs,
    Back,
    Biceps,
    Triceps,
    Shoulders,
    Other,
}

impl MuscleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "CHEST",
            MuscleGroup::Legs => "LEGS",
            MuscleGroup::Back => "BACK",
            MuscleGroup::Biceps => "BICEPS",
            MuscleGroup::Triceps => "TRICEPS",
            MuscleGroup::Shoulders => "SHOULDERS",
            MuscleGroup::Other => "OTHER",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement category used for strength ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementCategory {
    Compound,
    Isolation,
}

/// Qualitative strength rank from the 1RM / bodyweight ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthRank {
    /// No usable 1RM or bodyweight
    #[serde(rename = "-")]
    NoData,
    #[serde(rename = "UNRANKED")]
    Unranked,
    #[serde(rename = "BEGINNER")]
    Beginner,
    #[serde(rename = "INTERMEDIATE")]
    Intermediate,
    #[serde(rename = "ADVANCED")]
    Advanced,
    #[serde(rename = "THE PUNISHER")]
    ThePunisher,
    #[serde(rename = "ELITE ARMS")]
    EliteArms,
}

impl StrengthRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthRank::NoData => "-",
            StrengthRank::Unranked => "UNRANKED",
            StrengthRank::Beginner => "BEGINNER",
            StrengthRank::Intermediate => "INTERMEDIATE",
            StrengthRank::Advanced => "ADVANCED",
            StrengthRank::ThePunisher => "THE PUNISHER",
            StrengthRank::EliteArms => "ELITE ARMS",
        }
    }
}

impl fmt::Display for StrengthRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parallel date/value sequences, dates as YYYY-MM-DD
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoints {
    pub dates: Vec<String>,
    pub values: Vec<i64>,
}

/// Working-weight suggestions derived from the next-week projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    /// 85% of the projected max, for heavy low-rep work
    pub heavy: i64,
    /// 75% of the projected max, for hypertrophy work
    pub hyper: i64,
}

/// Linear e1RM trend for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub exercise: String,
    pub history: SeriesPoints,
    pub prediction: SeriesPoints,
    pub current_pr: i64,
    pub next_week_pr: i64,
    pub recs: Recommendations,
    /// Fitted slope in e1RM units per day
    pub slope_per_day: f64,
}

/// Forecast combined with the strength rank of the current PR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInsight {
    #[serde(flatten)]
    pub forecast: Forecast,
    pub rank: StrengthRank,
    pub muscle_group: MuscleGroup,
}

/// Total volume per muscle group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnatomyBreakdown {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

/// A manually logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Date in any form the normalizer accepts
    pub date: String,
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
}

/// Outcome of replacing the dataset with an uploaded log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Outcome of appending a manual entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddEntryReport {
    /// e1RM of the new set, truncated to an integer
    pub new_pr: i64,
}
