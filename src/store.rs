//! Workout dataset storage
//!
//! The dataset is owned by a store and handed to the core as snapshots.
//! Mutations go through `replace` or `update`, so the store decides how
//! concurrent writers are serialized.

use crate::adapters::{CsvAdapter, TabularAdapter};
use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::types::{NormalizeOutcome, WorkoutSet};
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Column order of the persisted dataset
pub const CSV_COLUMNS: [&str; 7] = [
    "date", "exercise", "weight", "reps", "set_type", "volume", "e1rm",
];

/// Snapshot-based access to the workout dataset
pub trait WorkoutStore {
    /// Current dataset, ascending by date
    fn read(&self) -> Result<Vec<WorkoutSet>, ComputeError>;

    /// Replace the whole dataset
    fn replace(&self, sets: Vec<WorkoutSet>) -> Result<(), ComputeError>;

    /// Read, modify and write back the dataset as one step
    ///
    /// No other writer on the same store observes the intermediate state.
    fn update<F>(&self, f: F) -> Result<(), ComputeError>
    where
        F: FnOnce(&mut Vec<WorkoutSet>);
}

/// In-memory store guarded by a read/write lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<Vec<WorkoutSet>>,
}

impl MemoryStore {
    pub fn new(sets: Vec<WorkoutSet>) -> Self {
        Self {
            sets: RwLock::new(sets),
        }
    }
}

impl WorkoutStore for MemoryStore {
    fn read(&self) -> Result<Vec<WorkoutSet>, ComputeError> {
        self.sets
            .read()
            .map(|sets| sets.clone())
            .map_err(|e| ComputeError::StoreError(e.to_string()))
    }

    fn replace(&self, sets: Vec<WorkoutSet>) -> Result<(), ComputeError> {
        let mut guard = self
            .sets
            .write()
            .map_err(|e| ComputeError::StoreError(e.to_string()))?;
        *guard = sets;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), ComputeError>
    where
        F: FnOnce(&mut Vec<WorkoutSet>),
    {
        let mut guard = self
            .sets
            .write()
            .map_err(|e| ComputeError::StoreError(e.to_string()))?;
        f(&mut guard);
        Ok(())
    }
}

/// CSV file store with the canonical column layout
///
/// Reads re-run the normalizer, so a hand-edited file is cleaned the same way
/// an upload is. Writes go to a sibling temp file that is renamed into place.
/// Writers sharing one `CsvStore` are serialized; separate processes are not,
/// so keep one store per file.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, ComputeError> {
        self.write_lock
            .lock()
            .map_err(|e| ComputeError::StoreError(e.to_string()))
    }

    fn write_all(&self, sets: &[WorkoutSet]) -> Result<(), ComputeError> {
        let temp = self.temp_path();
        {
            let mut writer = WriterBuilder::new().has_headers(false).from_path(&temp)?;
            writer.write_record(CSV_COLUMNS)?;
            for set in sets {
                writer.serialize(set)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)?;

        info!(path = %self.path.display(), sets = sets.len(), "dataset replaced");
        Ok(())
    }
}

impl WorkoutStore for CsvStore {
    fn read(&self) -> Result<Vec<WorkoutSet>, ComputeError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "dataset file missing, waiting for upload");
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path)?;
        let rows = CsvAdapter::new().parse(&text)?;

        match Normalizer::normalize(&rows) {
            NormalizeOutcome::Normalized(batch) => {
                if !batch.rejected.is_empty() {
                    warn!(
                        path = %self.path.display(),
                        rejected = batch.rejected.len(),
                        "dropped invalid rows from persisted dataset"
                    );
                }
                Ok(batch.sets)
            }
            NormalizeOutcome::FormatRejected { missing } => {
                warn!(
                    path = %self.path.display(),
                    missing = ?missing,
                    "persisted dataset is not in workout format, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn replace(&self, sets: Vec<WorkoutSet>) -> Result<(), ComputeError> {
        let _guard = self.lock_writes()?;
        self.write_all(&sets)
    }

    fn update<F>(&self, f: F) -> Result<(), ComputeError>
    where
        F: FnOnce(&mut Vec<WorkoutSet>),
    {
        let _guard = self.lock_writes()?;
        let mut sets = self.read()?;
        f(&mut sets);
        self.write_all(&sets)
    }
}
