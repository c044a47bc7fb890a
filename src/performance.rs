//! Set-to-set performance classification.
//!
//! Compares a logged set against the matching set (same `number`) from the
//! previous realization of the same training-day slot and classifies the
//! result for progress badges. Pure and table-driven; the rule order matters
//! and the first matching rule wins.

use serde::Serialize;

use crate::models::{ExerciseSet, PreviousRunSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetPerformance {
    /// Nothing to compare: set not completed, reps missing, or no prior set.
    Unknown,
    Increased,
    Declined,
    Maintained,
}

/// Classifies `current` against `previous`.
///
/// Lower RIR means closer to failure, so equal reps at the same weight with
/// a *lower* RIR than before is a decline (the set got harder), while an
/// equal-or-higher RIR leaves room for the rep rules to call an increase.
pub fn compare_sets(previous: Option<&PreviousRunSet>, current: &ExerciseSet) -> SetPerformance {
    let (Some(prev), Some(reps), true) = (previous, current.reps_completed, current.completed)
    else {
        return SetPerformance::Unknown;
    };
    let Some(prev_reps) = prev.reps_completed else {
        return SetPerformance::Unknown;
    };

    let same_weight = current.weight == prev.weight;
    let easier_or_equal = current.rir >= prev.rir;

    if same_weight && reps < prev_reps {
        SetPerformance::Declined
    } else if same_weight && reps == prev_reps && current.rir < prev.rir {
        SetPerformance::Declined
    } else if same_weight && easier_or_equal && reps > prev_reps {
        SetPerformance::Increased
    } else if current.weight > prev.weight && easier_or_equal && reps >= prev_reps {
        SetPerformance::Increased
    } else {
        // TODO: decide how a weight *decrease* should classify (it currently
        // falls through here regardless of reps/RIR); needs a product call
        // between "maintained", "declined" and a new mixed category.
        SetPerformance::Maintained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepRange;

    fn previous() -> PreviousRunSet {
        PreviousRunSet {
            number: 1,
            weight: 100.0,
            reps_completed: Some(6),
            rir: 2,
        }
    }

    fn current(weight: f64, reps: u32, rir: u32, completed: bool) -> ExerciseSet {
        ExerciseSet {
            number: 1,
            weight,
            rep_range: RepRange { lower: 5, upper: 8 },
            rir,
            reps_completed: Some(reps),
            completed,
        }
    }

    #[test]
    fn fewer_reps_at_same_weight_declines() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 5, 2, true)),
            SetPerformance::Declined
        );
    }

    #[test]
    fn lower_rir_at_same_weight_and_reps_declines() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 6, 1, true)),
            SetPerformance::Declined
        );
    }

    #[test]
    fn more_reps_at_same_weight_increases() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 7, 2, true)),
            SetPerformance::Increased
        );
    }

    #[test]
    fn heavier_weight_with_held_reps_increases() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(105.0, 6, 2, true)),
            SetPerformance::Increased
        );
    }

    #[test]
    fn identical_set_maintains() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 6, 2, true)),
            SetPerformance::Maintained
        );
    }

    #[test]
    fn uncompleted_set_is_unknown() {
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 6, 2, false)),
            SetPerformance::Unknown
        );
    }

    #[test]
    fn missing_history_is_unknown() {
        assert_eq!(
            compare_sets(None, &current(100.0, 6, 2, true)),
            SetPerformance::Unknown
        );

        let mut prev = previous();
        prev.reps_completed = None;
        assert_eq!(
            compare_sets(Some(&prev), &current(100.0, 6, 2, true)),
            SetPerformance::Unknown
        );

        let mut cur = current(100.0, 6, 2, true);
        cur.reps_completed = None;
        assert_eq!(compare_sets(Some(&previous()), &cur), SetPerformance::Unknown);
    }

    #[test]
    fn heavier_but_harder_does_not_count_as_increase() {
        // Weight up but RIR dropped: rule 4 requires an easier-or-equal RIR.
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(105.0, 6, 1, true)),
            SetPerformance::Maintained
        );
    }

    #[test]
    fn weight_decrease_currently_falls_through_to_maintained() {
        // Documents the open fallthrough, improved reps notwithstanding.
        let prev = previous();
        assert_eq!(
            compare_sets(Some(&prev), &current(90.0, 10, 3, true)),
            SetPerformance::Maintained
        );
    }
}
