//! Trend forecasting
//!
//! Fits an ordinary least-squares line of e1RM against the calendar day and
//! projects it forward in weekly steps. The projection is a trend, not a
//! ceiling: on a declining series the next-week value sits below the current PR.

use crate::error::ComputeError;
use crate::types::{Forecast, Recommendations, SeriesPoints, WorkoutSet};
use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

/// Minimum number of sets needed to fit a trend
pub const MIN_SESSIONS: usize = 2;

/// Number of weekly points projected past `today`
pub const FORECAST_WEEKS: u64 = 4;

/// Share of the projected max used for heavy work
pub const HEAVY_FACTOR: f64 = 0.85;

/// Share of the projected max used for hypertrophy work
pub const HYPER_FACTOR: f64 = 0.75;

/// Fitted line in centered form: y = y_mean + slope * (x - x_mean)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub x_mean: f64,
    pub y_mean: f64,
}

impl TrendLine {
    /// Least-squares fit; a zero-variance x yields a flat line at the mean of y
    ///
    /// `points` must not be empty.
    pub fn fit(points: &[(f64, f64)]) -> Self {
        let n = points.len() as f64;
        let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let sxx: f64 = points.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
        let sxy: f64 = points
            .iter()
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();

        let slope = if sxx > f64::EPSILON { sxy / sxx } else { 0.0 };

        Self {
            slope,
            x_mean,
            y_mean,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.y_mean + self.slope * (x - self.x_mean)
    }
}

/// Day ordinal with 0001-01-01 as day 1
pub fn date_ordinal(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Nearest integer, ties to even
fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Forecaster for projecting e1RM trends
pub struct TrendForecaster;

impl TrendForecaster {
    /// Forecast one exercise from its sets
    ///
    /// `sets` is the series for `exercise` in any order; it is sorted by date
    /// (stable) before fitting. Projections start one week after `today`.
    pub fn forecast(
        exercise: &str,
        sets: &[WorkoutSet],
        today: NaiveDate,
    ) -> Result<Forecast, ComputeError> {
        if sets.len() < MIN_SESSIONS {
            return Err(ComputeError::InsufficientData {
                exercise: exercise.to_string(),
                sessions: sets.len(),
            });
        }

        let mut series: Vec<&WorkoutSet> = sets.iter().collect();
        series.sort_by_key(|set| set.date);

        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|set| (date_ordinal(set.date), set.e1rm))
            .collect();
        let trend = TrendLine::fit(&points);

        let history = SeriesPoints {
            dates: series.iter().map(|set| format_date(set.date)).collect(),
            values: series.iter().map(|set| round_half_even(set.e1rm)).collect(),
        };

        let future_dates: Vec<NaiveDate> = (1..=FORECAST_WEEKS)
            .map(|week| {
                today
                    .checked_add_days(Days::new(7 * week))
                    .ok_or(ComputeError::DateOutOfRange(today))
            })
            .collect::<Result<_, _>>()?;
        let prediction = SeriesPoints {
            dates: future_dates.iter().map(|date| format_date(*date)).collect(),
            values: future_dates
                .iter()
                .map(|date| round_half_even(trend.predict(date_ordinal(*date))))
                .collect(),
        };

        let best_e1rm = series
            .iter()
            .map(|set| set.e1rm)
            .fold(f64::NEG_INFINITY, f64::max);
        let current_pr = round_half_even(best_e1rm);
        let next_week_pr = prediction.values[0];

        debug!(
            exercise,
            sessions = series.len(),
            slope_per_day = trend.slope,
            current_pr,
            next_week_pr,
            "fitted e1rm trend"
        );

        Ok(Forecast {
            exercise: exercise.to_string(),
            history,
            prediction,
            current_pr,
            next_week_pr,
            recs: recommendations(next_week_pr),
            slope_per_day: trend.slope,
        })
    }

    /// Forecast the sets of `exercise` (exact name match) within a full dataset
    pub fn forecast_exercise(
        sets: &[WorkoutSet],
        exercise: &str,
        today: NaiveDate,
    ) -> Result<Forecast, ComputeError> {
        let series: Vec<WorkoutSet> = sets
            .iter()
            .filter(|set| set.exercise == exercise)
            .cloned()
            .collect();
        Self::forecast(exercise, &series, today)
    }
}

/// Truncating percentages of the projected max
pub fn recommendations(next_week_pr: i64) -> Recommendations {
    let target = next_week_pr as f64;
    Recommendations {
        heavy: (target * HEAVY_FACTOR).trunc() as i64,
        hyper: (target * HYPER_FACTOR).trunc() as i64,
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SET_TYPE;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set_with_e1rm(date: NaiveDate, e1rm: f64) -> WorkoutSet {
        WorkoutSet {
            date,
            exercise: "Bench Press".to_string(),
            weight: e1rm,
            reps: 1,
            set_type: DEFAULT_SET_TYPE.to_string(),
            volume: e1rm,
            e1rm,
        }
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let sets = vec![set_with_e1rm(ymd(2024, 1, 1), 100.0)];
        let result = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 1, 2));

        match result {
            Err(ComputeError::InsufficientData { exercise, sessions }) => {
                assert_eq!(exercise, "Bench Press");
                assert_eq!(sessions, 1);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_projection_past_calendar_end_is_error() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 1, 1), 100.0),
            set_with_e1rm(ymd(2024, 1, 8), 107.0),
        ];
        let result = TrendForecaster::forecast("Bench Press", &sets, NaiveDate::MAX);
        assert!(matches!(result, Err(ComputeError::DateOutOfRange(_))));

        let near_end = NaiveDate::MAX - Days::new(20);
        assert!(TrendForecaster::forecast("Bench Press", &sets, near_end).is_err());
    }

    #[test]
    fn test_linear_projection() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 1, 1), 100.0),
            set_with_e1rm(ymd(2024, 1, 8), 107.0),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 1, 8)).unwrap();

        assert!((forecast.slope_per_day - 1.0).abs() < 1e-9);
        assert_eq!(
            forecast.prediction.dates,
            vec!["2024-01-15", "2024-01-22", "2024-01-29", "2024-02-05"]
        );
        assert_eq!(forecast.prediction.values, vec![114, 121, 128, 135]);
        assert_eq!(forecast.current_pr, 107);
        assert_eq!(forecast.next_week_pr, 114);
        assert_eq!(forecast.recs, Recommendations { heavy: 96, hyper: 85 });
    }

    #[test]
    fn test_least_squares_on_noisy_series() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 3, 1), 100.0),
            set_with_e1rm(ymd(2024, 3, 3), 104.0),
            set_with_e1rm(ymd(2024, 3, 6), 103.0),
            set_with_e1rm(ymd(2024, 3, 10), 110.0),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 3, 10)).unwrap();

        // sxy = 45, sxx = 46
        assert!((forecast.slope_per_day - 45.0 / 46.0).abs() < 1e-9);
        assert_eq!(forecast.prediction.values, vec![116, 123, 130, 137]);
        assert_eq!(
            forecast.history.dates,
            vec!["2024-03-01", "2024-03-03", "2024-03-06", "2024-03-10"]
        );
        assert_eq!(forecast.history.values, vec![100, 104, 103, 110]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 2, 15), 90.0),
            set_with_e1rm(ymd(2024, 2, 1), 80.0),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 2, 15)).unwrap();
        assert_eq!(forecast.history.dates, vec!["2024-02-01", "2024-02-15"]);
        assert!(forecast.slope_per_day > 0.0);
    }

    #[test]
    fn test_same_day_points_project_flat_mean() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 4, 2), 100.0),
            set_with_e1rm(ymd(2024, 4, 2), 110.0),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 4, 2)).unwrap();

        assert_eq!(forecast.slope_per_day, 0.0);
        assert_eq!(forecast.prediction.values, vec![105, 105, 105, 105]);
        assert_eq!(forecast.current_pr, 110);
    }

    #[test]
    fn test_declining_trend_projects_below_pr() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 5, 1), 120.0),
            set_with_e1rm(ymd(2024, 5, 15), 106.0),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 5, 15)).unwrap();

        assert_eq!(forecast.current_pr, 120);
        assert_eq!(forecast.next_week_pr, 99);
        assert!(forecast.next_week_pr < forecast.current_pr);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        let sets = vec![
            set_with_e1rm(ymd(2024, 6, 1), 102.5),
            set_with_e1rm(ymd(2024, 6, 2), 103.5),
        ];
        let forecast = TrendForecaster::forecast("Bench Press", &sets, ymd(2024, 6, 2)).unwrap();
        assert_eq!(forecast.history.values, vec![102, 104]);
        assert_eq!(forecast.current_pr, 104);
    }

    #[test]
    fn test_forecast_exercise_filters_by_name() {
        let mut sets = vec![
            set_with_e1rm(ymd(2024, 1, 1), 100.0),
            set_with_e1rm(ymd(2024, 1, 8), 107.0),
        ];
        let mut squat = set_with_e1rm(ymd(2024, 1, 4), 300.0);
        squat.exercise = "Squat".to_string();
        sets.push(squat);

        let forecast =
            TrendForecaster::forecast_exercise(&sets, "Bench Press", ymd(2024, 1, 8)).unwrap();
        assert_eq!(forecast.history.values, vec![100, 107]);

        let result = TrendForecaster::forecast_exercise(&sets, "Squat", ymd(2024, 1, 8));
        assert!(matches!(
            result,
            Err(ComputeError::InsufficientData { sessions: 1, .. })
        ));
    }

    #[test]
    fn test_recommendations_truncate() {
        assert_eq!(recommendations(101), Recommendations { heavy: 85, hyper: 75 });
        assert_eq!(recommendations(0), Recommendations { heavy: 0, hyper: 0 });
    }

    #[test]
    fn test_date_ordinal_matches_proleptic_day_count() {
        assert_eq!(date_ordinal(ymd(1, 1, 1)), 1.0);
        assert_eq!(date_ordinal(ymd(2024, 1, 1)), 738_886.0);
    }
}
