//! Pipeline orchestration
//!
//! This module provides the public API for Liftflux. It wires the adapters,
//! normalizer, classifier and forecaster around a workout store and the user
//! configuration.

use crate::adapters::{CsvAdapter, TabularAdapter};
use crate::classifier::{muscle_group, strength_rank};
use crate::config::UserConfig;
use crate::error::ComputeError;
use crate::forecast::TrendForecaster;
use crate::normalizer::Normalizer;
use crate::store::{MemoryStore, WorkoutStore};
use crate::types::{
    AddEntryReport, AnatomyBreakdown, ExerciseInsight, IngestReport, NewEntry, NormalizeOutcome,
    RawRow, WorkoutSet,
};
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Parse CSV text and normalize it in one step.
///
/// # Example
/// ```ignore
/// let outcome = csv_to_sets("Date,Title,Weight,Reps\n2024-01-15,Squat,100,5\n")?;
/// assert_eq!(outcome.sets().len(), 1);
/// ```
pub fn csv_to_sets(csv: &str) -> Result<NormalizeOutcome, ComputeError> {
    let rows = CsvAdapter::new().parse(csv)?;
    Ok(Normalizer::normalize(&rows))
}

/// Total volume per muscle group, labels in alphabetical order
pub fn anatomy_breakdown(sets: &[WorkoutSet]) -> AnatomyBreakdown {
    let mut totals: BTreeMap<&'static str, f64> = BTreeMap::new();
    for set in sets {
        *totals.entry(muscle_group(&set.exercise).as_str()).or_insert(0.0) += set.volume;
    }

    AnatomyBreakdown {
        labels: totals.keys().map(|label| label.to_string()).collect(),
        data: totals.values().copied().collect(),
    }
}

/// Sorted, de-duplicated exercise names
pub fn exercise_names(sets: &[WorkoutSet]) -> Vec<String> {
    sets.iter()
        .map(|set| set.exercise.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Stateful processor over a workout store.
///
/// Every query reads a fresh snapshot from the store; writes replace it.
pub struct LiftProcessor<S: WorkoutStore> {
    store: S,
    config: UserConfig,
}

impl<S: WorkoutStore> LiftProcessor<S> {
    /// Create a processor with the default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, UserConfig::default())
    }

    pub fn with_config(store: S, config: UserConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    pub fn bodyweight(&self) -> f64 {
        self.config.bodyweight
    }

    /// Validate and apply a new bodyweight; persisting it is up to the caller
    pub fn set_bodyweight(&mut self, bodyweight: f64) -> Result<UserConfig, ComputeError> {
        self.config = UserConfig::with_bodyweight(bodyweight)?;
        Ok(self.config)
    }

    /// Replace the dataset with an uploaded table
    ///
    /// A table without the required columns, or with no surviving rows, is
    /// rejected and leaves the store untouched.
    pub fn upload(&self, rows: &[RawRow]) -> Result<IngestReport, ComputeError> {
        let batch = match Normalizer::normalize(rows) {
            NormalizeOutcome::Normalized(batch) if !batch.sets.is_empty() => batch,
            NormalizeOutcome::Normalized(batch) => {
                return Err(ComputeError::NoValidRows {
                    rejected: batch.rejected.len(),
                })
            }
            NormalizeOutcome::FormatRejected { missing } => {
                return Err(ComputeError::FormatRejected { missing })
            }
        };

        let report = IngestReport {
            accepted: batch.sets.len(),
            rejected: batch.rejected,
        };
        self.store.replace(batch.sets)?;

        info!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "workout log uploaded"
        );
        Ok(report)
    }

    /// Parse a raw document with the given adapter and upload it
    pub fn upload_with(
        &self,
        adapter: &dyn TabularAdapter,
        raw: &str,
    ) -> Result<IngestReport, ComputeError> {
        let rows = adapter.parse(raw)?;
        self.upload(&rows)
    }

    /// Sorted unique exercise names
    pub fn exercises(&self) -> Result<Vec<String>, ComputeError> {
        Ok(exercise_names(&self.store.read()?))
    }

    /// Volume per muscle group
    pub fn anatomy(&self) -> Result<AnatomyBreakdown, ComputeError> {
        Ok(anatomy_breakdown(&self.store.read()?))
    }

    /// Forecast and rank one exercise as of today (local date)
    pub fn predict(&self, exercise: &str) -> Result<ExerciseInsight, ComputeError> {
        self.predict_as_of(exercise, Local::now().date_naive())
    }

    /// Forecast and rank one exercise, projecting from `today`
    pub fn predict_as_of(
        &self,
        exercise: &str,
        today: NaiveDate,
    ) -> Result<ExerciseInsight, ComputeError> {
        let sets = self.store.read()?;
        if sets.is_empty() {
            return Err(ComputeError::EmptyDataset);
        }

        let forecast = TrendForecaster::forecast_exercise(&sets, exercise, today)?;
        let rank = strength_rank(exercise, forecast.current_pr as f64, self.config.bodyweight);

        debug!(exercise, rank = %rank, "prediction ready");

        Ok(ExerciseInsight {
            forecast,
            rank,
            muscle_group: muscle_group(exercise),
        })
    }

    /// Append a manually logged set and keep the dataset ordered
    pub fn add_entry(&self, entry: &NewEntry) -> Result<AddEntryReport, ComputeError> {
        let set = Normalizer::normalize_entry(entry).map_err(|reason| {
            ComputeError::InvalidEntry(format!("{} ({})", reason, entry.exercise))
        })?;
        let new_pr = set.e1rm.trunc() as i64;

        self.store.update(|sets| {
            sets.push(set);
            // Stable: the new set lands after existing sets of the same day
            sets.sort_by_key(|set| set.date);
        })?;

        Ok(AddEntryReport { new_pr })
    }
}

impl LiftProcessor<MemoryStore> {
    /// Processor over an empty in-memory dataset
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonRowsAdapter;
    use crate::store::CsvStore;
    use crate::types::{MuscleGroup, RejectReason, StrengthRank};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn sample_csv() -> &'static str {
        "Date,Title,Weight,Reps,set_type\n\
         2024-01-15,Bench Press,80,5,normal\n\
         2024-01-22,Bench Press,82.5,5,normal\n\
         2024-01-29,Bench Press,85,5,normal\n\
         2024-01-16,Squat,100,5,normal\n\
         2024-01-17,Barbell Curl,30,10,normal\n\
         2023-12-20,Bench Press,75,5,normal\n\
         2024-01-18,Squat,zero,5,normal\n"
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loaded_processor() -> LiftProcessor<MemoryStore> {
        let processor = LiftProcessor::in_memory();
        processor.upload_with(&CsvAdapter::new(), sample_csv()).unwrap();
        processor
    }

    #[test]
    fn test_upload_reports_rejections() {
        let processor = LiftProcessor::in_memory();
        let report = processor.upload_with(&CsvAdapter::new(), sample_csv()).unwrap();

        assert_eq!(report.accepted, 5);
        let reasons: Vec<RejectReason> = report.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![RejectReason::BeforeCutoff, RejectReason::InvalidWeight]
        );

        let sets = processor.store().read().unwrap();
        assert!(sets.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_upload_rejects_wrong_format_and_keeps_store() {
        let processor = loaded_processor();
        let result = processor.upload_with(&CsvAdapter::new(), "name,score\nalice,3\n");

        match result {
            Err(ComputeError::FormatRejected { missing }) => {
                assert_eq!(missing, vec!["exercise", "date", "weight", "reps"]);
            }
            other => panic!("expected FormatRejected, got {other:?}"),
        }
        assert_eq!(processor.store().read().unwrap().len(), 5);
    }

    #[test]
    fn test_upload_rejects_table_with_no_valid_rows() {
        let processor = LiftProcessor::in_memory();
        let result = processor.upload_with(
            &CsvAdapter::new(),
            "date,exercise,weight,reps\n2020-01-01,Squat,100,5\n",
        );
        assert!(matches!(result, Err(ComputeError::NoValidRows { rejected: 1 })));
    }

    #[test]
    fn test_upload_json_rows() {
        let processor = LiftProcessor::in_memory();
        let json = r#"[
            {"date": "2024-03-01", "exercise": "Deadlift", "weight": 140, "reps": 3},
            {"date": "2024-03-08", "exercise": "Deadlift", "weight": 145, "reps": 3}
        ]"#;
        let report = processor.upload_with(&JsonRowsAdapter, json).unwrap();
        assert_eq!(report.accepted, 2);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_exercises_sorted_unique() {
        let processor = loaded_processor();
        assert_eq!(
            processor.exercises().unwrap(),
            vec!["Barbell Curl", "Bench Press", "Squat"]
        );
    }

    #[test]
    fn test_anatomy_breakdown() {
        let processor = loaded_processor();
        let anatomy = processor.anatomy().unwrap();

        assert_eq!(anatomy.labels, vec!["BICEPS", "CHEST", "LEGS"]);
        // bench: 400 + 412.5 + 425, squat: 500, curl: 300
        assert_eq!(anatomy.data, vec![300.0, 1237.5, 500.0]);
    }

    #[test]
    fn test_predict_combines_forecast_and_rank() {
        let processor = loaded_processor();
        let insight = processor
            .predict_as_of("Bench Press", ymd(2024, 1, 29))
            .unwrap();

        // e1rm 93.33, 96.25, 99.17 over 14 days
        assert_eq!(insight.forecast.history.values, vec![93, 96, 99]);
        assert_eq!(insight.forecast.current_pr, 99);
        assert_eq!(insight.forecast.next_week_pr, 102);
        assert_eq!(insight.forecast.prediction.values.len(), 4);
        // 99 / 65 = 1.52
        assert_eq!(insight.rank, StrengthRank::ThePunisher);
        assert_eq!(insight.muscle_group, MuscleGroup::Chest);

        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["rank"], "THE PUNISHER");
        assert_eq!(json["next_week_pr"], 102);
        assert_eq!(json["recs"]["heavy"], 86);
        assert_eq!(json["history"]["dates"][0], "2024-01-15");
    }

    #[test]
    fn test_predict_uses_configured_bodyweight() {
        let mut processor = loaded_processor();
        processor.set_bodyweight(100.0).unwrap();

        let insight = processor
            .predict_as_of("Bench Press", ymd(2024, 1, 29))
            .unwrap();
        assert_eq!(insight.rank, StrengthRank::Intermediate);

        assert!(processor.set_bodyweight(0.0).is_err());
        assert_eq!(processor.bodyweight(), 100.0);
    }

    #[test]
    fn test_predict_insufficient_and_empty() {
        let processor = loaded_processor();
        let result = processor.predict_as_of("Squat", ymd(2024, 2, 1));
        assert!(matches!(
            result,
            Err(ComputeError::InsufficientData { sessions: 1, .. })
        ));

        let empty = LiftProcessor::in_memory();
        assert!(matches!(
            empty.predict_as_of("Squat", ymd(2024, 2, 1)),
            Err(ComputeError::EmptyDataset)
        ));
    }

    #[test]
    fn test_predict_far_future_today_is_error() {
        let processor = loaded_processor();
        let result = processor.predict_as_of("Bench Press", NaiveDate::MAX);
        assert!(matches!(result, Err(ComputeError::DateOutOfRange(_))));
    }

    #[test]
    fn test_add_entry_keeps_order_and_metrics() {
        let processor = loaded_processor();
        let before = processor.store().read().unwrap();

        let report = processor
            .add_entry(&NewEntry {
                date: "2024-01-16".to_string(),
                exercise: "Squat".to_string(),
                weight: 105.0,
                reps: 4,
            })
            .unwrap();
        // 105 * (1 + 4/30) = 119.0
        assert_eq!(report.new_pr, 119);

        let after = processor.store().read().unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert!(after.windows(2).all(|w| w[0].date <= w[1].date));

        // Prior sets keep their metrics and relative order
        let prior: Vec<&WorkoutSet> = after
            .iter()
            .filter(|set| !(set.exercise == "Squat" && set.weight == 105.0))
            .collect();
        assert_eq!(prior, before.iter().collect::<Vec<_>>());

        // Same-day tie: the new set follows the uploaded one
        let squats: Vec<f64> = after
            .iter()
            .filter(|set| set.exercise == "Squat")
            .map(|set| set.weight)
            .collect();
        assert_eq!(squats, vec![100.0, 105.0]);
    }

    #[test]
    fn test_add_entry_rejects_invalid() {
        let processor = loaded_processor();
        let result = processor.add_entry(&NewEntry {
            date: "yesterday".to_string(),
            exercise: "Squat".to_string(),
            weight: 100.0,
            reps: 5,
        });
        assert!(matches!(result, Err(ComputeError::InvalidEntry(_))));
        assert_eq!(processor.store().read().unwrap().len(), 5);
    }

    #[test]
    fn test_csv_store_processor_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gym_data_clean.csv");

        let processor = LiftProcessor::new(CsvStore::new(&path));
        processor.upload_with(&CsvAdapter::new(), sample_csv()).unwrap();
        processor
            .add_entry(&NewEntry {
                date: "2024-02-05".to_string(),
                exercise: "Bench Press".to_string(),
                weight: 87.5,
                reps: 5,
            })
            .unwrap();

        let reopened = LiftProcessor::new(CsvStore::new(&path));
        assert_eq!(reopened.store().read().unwrap().len(), 6);
        let insight = reopened
            .predict_as_of("Bench Press", ymd(2024, 2, 5))
            .unwrap();
        assert_eq!(insight.forecast.history.values.len(), 4);
    }

    #[test]
    fn test_csv_to_sets() {
        let outcome = csv_to_sets(sample_csv()).unwrap();
        assert!(!outcome.is_format_rejected());
        assert_eq!(outcome.sets().len(), 5);
        assert_eq!(outcome.sets()[0].exercise, "Bench Press");
    }

    #[test]
    fn test_concurrent_add_entry_keeps_every_set() {
        let processor = Arc::new(loaded_processor());
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let processor = Arc::clone(&processor);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        processor
                            .add_entry(&NewEntry {
                                date: format!("2024-03-{:02}", 1 + (i % 28)),
                                exercise: format!("Squat {t}"),
                                weight: 100.0,
                                reps: 5,
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let sets = processor.store().read().unwrap();
        assert_eq!(sets.len(), 5 + threads * per_thread);
        assert!(sets.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
