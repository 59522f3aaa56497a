//! Exercise classification
//!
//! Name-based heuristics for tagging a muscle group and ranking strength.
//! Keyword tables overlap ("press", "dips", "fly" appear in more than one
//! table), so each table is scanned in order and the first hit wins.

use crate::types::{MovementCategory, MuscleGroup, StrengthRank};

/// Muscle groups in match priority order
const MUSCLE_GROUP_KEYWORDS: &[(MuscleGroup, &[&str])] = &[
    (MuscleGroup::Chest, &["bench", "fly", "push up", "press"]),
    (MuscleGroup::Legs, &["squat", "leg", "calf", "deadlift", "lunge"]),
    (MuscleGroup::Back, &["row", "pull", "chin", "lat"]),
    (MuscleGroup::Biceps, &["curl", "bicep"]),
    (MuscleGroup::Triceps, &["extension", "pushdown", "skull", "dips"]),
    (MuscleGroup::Shoulders, &["raise", "face pull", "shoulder"]),
];

/// Movement categories in match priority order
const MOVEMENT_KEYWORDS: &[(MovementCategory, &[&str])] = &[
    (
        MovementCategory::Compound,
        &["bench", "press", "squat", "deadlift", "row", "dips"],
    ),
    (
        MovementCategory::Isolation,
        &["curl", "extension", "raise", "pushdown", "fly"],
    ),
];

/// Lower bounds (inclusive) of each rank, highest first
const COMPOUND_THRESHOLDS: &[(f64, StrengthRank)] = &[
    (1.5, StrengthRank::ThePunisher),
    (1.2, StrengthRank::Advanced),
    (0.8, StrengthRank::Intermediate),
];

const ISOLATION_THRESHOLDS: &[(f64, StrengthRank)] = &[
    (0.7, StrengthRank::EliteArms),
    (0.4, StrengthRank::Intermediate),
];

/// First entry of `table` whose keyword set matches the case-folded name
fn first_match<T: Copy>(table: &[(T, &[&str])], name: &str) -> Option<T> {
    let folded = name.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| folded.contains(kw)))
        .map(|(label, _)| *label)
}

/// Muscle group targeted by an exercise, `Other` when nothing matches
pub fn muscle_group(exercise: &str) -> MuscleGroup {
    first_match(MUSCLE_GROUP_KEYWORDS, exercise).unwrap_or(MuscleGroup::Other)
}

/// Compound/isolation category, `None` when the name matches neither
pub fn movement_category(exercise: &str) -> Option<MovementCategory> {
    first_match(MOVEMENT_KEYWORDS, exercise)
}

/// Strength rank from the 1RM / bodyweight ratio
///
/// Returns `NoData` when either input is not positive.
pub fn strength_rank(exercise: &str, one_rep_max: f64, bodyweight: f64) -> StrengthRank {
    // NaN is not positive
    let positive = |x: f64| x > 0.0;
    if !positive(one_rep_max) || !positive(bodyweight) {
        return StrengthRank::NoData;
    }

    let ratio = one_rep_max / bodyweight;

    let thresholds = match movement_category(exercise) {
        Some(MovementCategory::Compound) => COMPOUND_THRESHOLDS,
        Some(MovementCategory::Isolation) => ISOLATION_THRESHOLDS,
        None => return StrengthRank::Unranked,
    };

    thresholds
        .iter()
        .find(|(lower, _)| ratio >= *lower)
        .map(|(_, rank)| *rank)
        .unwrap_or(StrengthRank::Beginner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_basic() {
        assert_eq!(muscle_group("Incline Bench Press"), MuscleGroup::Chest);
        assert_eq!(muscle_group("Back Squat"), MuscleGroup::Legs);
        assert_eq!(muscle_group("Seated Cable Row"), MuscleGroup::Back);
        assert_eq!(muscle_group("Hammer Curl"), MuscleGroup::Biceps);
        assert_eq!(muscle_group("Skull Crusher"), MuscleGroup::Triceps);
        assert_eq!(muscle_group("Lateral Raise"), MuscleGroup::Back);
        assert_eq!(muscle_group("Unknown Move"), MuscleGroup::Other);
    }

    #[test]
    fn test_muscle_group_priority_order() {
        // "press" is checked under CHEST before anything else
        assert_eq!(muscle_group("Leg Press"), MuscleGroup::Chest);
        assert_eq!(muscle_group("Shoulder Press"), MuscleGroup::Chest);
        // "pull" (BACK) wins over "face pull" (SHOULDERS)
        assert_eq!(muscle_group("Face Pull"), MuscleGroup::Back);
        assert_eq!(muscle_group("Triceps Dips"), MuscleGroup::Triceps);
        assert_eq!(muscle_group("Front Raise"), MuscleGroup::Shoulders);
    }

    #[test]
    fn test_muscle_group_case_insensitive() {
        assert_eq!(muscle_group("ROMANIAN DEADLIFT"), MuscleGroup::Legs);
        assert_eq!(muscle_group("push up"), MuscleGroup::Chest);
    }

    #[test]
    fn test_strength_rank_compound() {
        assert_eq!(
            strength_rank("Bench Press", 100.0, 100.0),
            StrengthRank::Intermediate
        );
        assert_eq!(strength_rank("Squat", 79.9, 100.0), StrengthRank::Beginner);
        assert_eq!(strength_rank("Squat", 80.0, 100.0), StrengthRank::Intermediate);
        assert_eq!(strength_rank("Squat", 120.0, 100.0), StrengthRank::Advanced);
        assert_eq!(strength_rank("Squat", 149.0, 100.0), StrengthRank::Advanced);
        assert_eq!(strength_rank("Deadlift", 150.0, 100.0), StrengthRank::ThePunisher);
    }

    #[test]
    fn test_strength_rank_isolation() {
        assert_eq!(strength_rank("Barbell Curl", 39.0, 100.0), StrengthRank::Beginner);
        assert_eq!(
            strength_rank("Barbell Curl", 40.0, 100.0),
            StrengthRank::Intermediate
        );
        assert_eq!(strength_rank("Lateral Raise", 70.0, 100.0), StrengthRank::EliteArms);
    }

    #[test]
    fn test_strength_rank_compound_checked_first() {
        // "dips" is compound even though its muscle group is TRICEPS
        assert_eq!(strength_rank("Dips", 70.0, 100.0), StrengthRank::Beginner);
        // "press" + "extension": compound wins
        assert_eq!(
            strength_rank("Press Extension", 75.0, 100.0),
            StrengthRank::Beginner
        );
    }

    #[test]
    fn test_strength_rank_sentinels() {
        assert_eq!(strength_rank("Bench Press", 0.0, 100.0), StrengthRank::NoData);
        assert_eq!(strength_rank("Bench Press", 100.0, 0.0), StrengthRank::NoData);
        assert_eq!(strength_rank("Bench Press", -5.0, 80.0), StrengthRank::NoData);
        assert_eq!(strength_rank("Bench Press", f64::NAN, 80.0), StrengthRank::NoData);
        assert_eq!(strength_rank("Plank", 100.0, 80.0), StrengthRank::Unranked);
        assert_eq!(StrengthRank::NoData.as_str(), "-");
        assert_ne!(StrengthRank::NoData, StrengthRank::Unranked);
    }

    #[test]
    fn test_rank_serializes_as_label() {
        let json = serde_json::to_string(&StrengthRank::ThePunisher).unwrap();
        assert_eq!(json, "\"THE PUNISHER\"");
        let json = serde_json::to_string(&MuscleGroup::Shoulders).unwrap();
        assert_eq!(json, "\"SHOULDERS\"");
    }
}
