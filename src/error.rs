//! Error types for Liftflux

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse tabular input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Input format rejected, missing columns: {}", .missing.join(", "))]
    FormatRejected { missing: Vec<String> },

    #[error("Input has the workout columns but no valid rows ({rejected} rejected)")]
    NoValidRows { rejected: usize },

    #[error("No usable workout data, upload a log first")]
    EmptyDataset,

    #[error("Not enough data for {exercise}: need at least 2 sessions, found {sessions}")]
    InsufficientData { exercise: String, sessions: usize },

    #[error("Forecast dates past {0} are out of range")]
    DateOutOfRange(chrono::NaiveDate),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid bodyweight: {0}")]
    InvalidBodyweight(f64),

    #[error("Store error: {0}")]
    StoreError(String),
}
