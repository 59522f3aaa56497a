//! Metric derivation
//!
//! This module derives per-set strength metrics from weight and reps:
//! - Volume (weight x reps)
//! - Estimated one-rep max (Epley)

use serde::{Deserialize, Serialize};

/// Divisor of the Epley estimate: e1RM = w * (1 + reps / 30)
pub const EPLEY_DIVISOR: f64 = 30.0;

/// Metrics derived from a single set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetMetrics {
    pub volume: f64,
    pub e1rm: f64,
}

/// Metric calculator for computing derived set metrics
pub struct MetricCalculator;

impl MetricCalculator {
    /// Derive volume and e1RM from an already validated weight/reps pair
    pub fn derive(weight: f64, reps: u32) -> SetMetrics {
        SetMetrics {
            volume: compute_volume(weight, reps),
            e1rm: compute_e1rm(weight, reps),
        }
    }
}

/// Total work of the set
fn compute_volume(weight: f64, reps: u32) -> f64 {
    weight * f64::from(reps)
}

/// Epley estimate, rounded once to 2 decimals
fn compute_e1rm(weight: f64, reps: u32) -> f64 {
    round_to_cents(weight * (1.0 + f64::from(reps) / EPLEY_DIVISOR))
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
