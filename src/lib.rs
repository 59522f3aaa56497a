//! Liftflux - Workout log analytics and strength forecasting
//!
//! Liftflux turns raw strength-training logs into a clean dataset and derives
//! insights from it through a deterministic pipeline: tabular adaptation →
//! normalization → per-set metrics → classification and trend forecasting.
//!
//! ## Modules
//!
//! - **Ingestion**: CSV / JSON rows → canonical `WorkoutSet`s with rejection reasons
//! - **Analytics**: muscle-group volume, e1RM trend forecast, strength rank
//! - **Storage**: snapshot-based dataset stores and the user configuration

pub mod adapters;
pub mod classifier;
pub mod config;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::{movement_category, muscle_group, strength_rank};
pub use config::UserConfig;
pub use error::ComputeError;
pub use forecast::TrendForecaster;
pub use normalizer::Normalizer;
pub use pipeline::{anatomy_breakdown, csv_to_sets, LiftProcessor};
pub use store::{CsvStore, MemoryStore, WorkoutStore};

/// Liftflux version
pub const LIFTFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "liftflux";
