//! Pure calendar/day resolution for mesocycle runs.
//!
//! Everything here works on `chrono::NaiveDate` and compares by calendar day
//! only — no timestamps, so timezone and DST drift cannot creep in. All
//! functions are deterministic and side-effect free; the persistence layer
//! hands in the plan/run read model and the rendering layer consumes the
//! results.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::PlanError;
use crate::models::{DaySlot, MesocyclePlan, MesocycleRun, TrainingDayTemplate};

/// 1-based position of a date within a run: which repetition of the
/// microcycle, and which day inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPosition {
    pub microcycle: u32,
    pub day: u32,
}

/// Outcome of resolving a date against a run span. `OutOfRange` is ordinary
/// control flow (the caller shows an empty state or clamps), never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    InRange(DayPosition),
    OutOfRange,
}

/// Maps `target` to its microcycle/day position within a run starting at
/// `start` with `count` repetitions of a `length`-day pattern.
///
/// `day` ranges over the full `[1, length]` inclusive: the last slot of each
/// microcycle is as reachable as the first.
pub fn resolve(
    start: NaiveDate,
    length: u32,
    count: u32,
    target: NaiveDate,
) -> Result<Resolution, PlanError> {
    if length == 0 {
        return Err(PlanError::NonPositiveLength);
    }
    if count == 0 {
        return Err(PlanError::NonPositiveCount);
    }

    let offset_days = (target - start).num_days();
    if offset_days < 0 || offset_days >= i64::from(length) * i64::from(count) {
        return Ok(Resolution::OutOfRange);
    }

    let length = i64::from(length);
    Ok(Resolution::InRange(DayPosition {
        microcycle: (offset_days / length) as u32 + 1,
        day: (offset_days % length) as u32 + 1,
    }))
}

/// What the plan schedules at a given 1-based day position within the
/// microcycle pattern.
pub fn slot_at(plan: &MesocyclePlan, day: u32) -> Result<&DaySlot, PlanError> {
    plan.validate()?;
    if day == 0 || day > plan.microcycle_length {
        return Err(PlanError::DayOutOfBounds {
            day,
            length: plan.microcycle_length,
        });
    }
    Ok(&plan.day_slots[day as usize - 1])
}

/// The user-facing "Day N" ordinal for a slot position: training slots are
/// numbered 1, 2, 3, … with rest slots skipped. `None` when the position
/// itself is a rest slot. Slot position stays canonical; this is display
/// sugar only.
pub fn training_ordinal(plan: &MesocyclePlan, day: u32) -> Result<Option<u32>, PlanError> {
    if !slot_at(plan, day)?.is_training() {
        return Ok(None);
    }
    let ordinal = plan.day_slots[..day as usize]
        .iter()
        .filter(|s| s.is_training())
        .count() as u32;
    Ok(Some(ordinal))
}

/// Per-position training ordinals for the whole microcycle pattern, in slot
/// order.
pub fn training_ordinals(plan: &MesocyclePlan) -> Result<Vec<Option<u32>>, PlanError> {
    (1..=plan.microcycle_length)
        .map(|day| training_ordinal(plan, day))
        .collect()
}

/// How much of the run a calendar render covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarScope {
    /// One microcycle window, anchored at the microcycle containing the
    /// query date (clamped to the nearest microcycle when out of range).
    Microcycle,
    /// The whole run span.
    FullRun,
}

/// One cell of the rendered calendar. Not persisted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDayCell {
    pub date: NaiveDate,
    pub position: DayPosition,
    pub is_training: bool,
    pub is_current: bool,
}

/// Builds the ordered calendar cells for `scope`, ascending by date.
///
/// Pure: identical inputs give structurally identical output, so the result
/// is safe to cache and trivial to test.
pub fn build_calendar(
    plan: &MesocyclePlan,
    start: NaiveDate,
    query: NaiveDate,
    scope: CalendarScope,
) -> Result<Vec<CalendarDayCell>, PlanError> {
    plan.validate()?;
    let length = plan.microcycle_length;
    let count = plan.microcycle_count;

    let (first_offset, days) = match scope {
        CalendarScope::FullRun => (0u64, plan.total_days()),
        CalendarScope::Microcycle => {
            let microcycle = match resolve(start, length, count, query)? {
                Resolution::InRange(pos) => pos.microcycle,
                // Out-of-range queries clamp to the nearest microcycle.
                Resolution::OutOfRange if query < start => 1,
                Resolution::OutOfRange => count,
            };
            (u64::from(microcycle - 1) * u64::from(length), u64::from(length))
        }
    };

    // The last cell's date must exist before anything is allocated.
    start
        .checked_add_days(Days::new(first_offset + days - 1))
        .ok_or(PlanError::DateOverflow)?;

    let mut cells = Vec::with_capacity(days as usize);
    for offset in first_offset..first_offset + days {
        let date = start
            .checked_add_days(Days::new(offset))
            .ok_or(PlanError::DateOverflow)?;
        let position = DayPosition {
            microcycle: (offset / u64::from(length)) as u32 + 1,
            day: (offset % u64::from(length)) as u32 + 1,
        };
        cells.push(CalendarDayCell {
            date,
            position,
            is_training: slot_at(plan, position.day)?.is_training(),
            is_current: date == query,
        });
    }
    Ok(cells)
}

/// What "today" looks like against the (possibly absent) active run.
/// Matched exhaustively at the rendering boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState<'a> {
    /// No active run at all.
    NotFound,
    /// A run exists but its first day is still ahead.
    StartsInTheFuture { start: NaiveDate },
    /// The run has begun. The resolution may still be `OutOfRange` when the
    /// query date lies past the run's end; callers show an empty state.
    Started {
        resolution: Resolution,
        slot: Option<&'a TrainingDayTemplate>,
        training_ordinal: Option<u32>,
    },
}

/// Classifies `today` against an optional active run.
pub fn run_state(run: Option<&MesocycleRun>, today: NaiveDate) -> Result<RunState<'_>, PlanError> {
    let Some(run) = run else {
        return Ok(RunState::NotFound);
    };
    run.plan.validate()?;

    if today < run.start_date {
        return Ok(RunState::StartsInTheFuture { start: run.start_date });
    }

    let resolution = resolve(
        run.start_date,
        run.plan.microcycle_length,
        run.plan.microcycle_count,
        today,
    )?;

    let (slot, ordinal) = match resolution {
        Resolution::InRange(pos) => {
            let slot = match slot_at(&run.plan, pos.day)? {
                DaySlot::Training(t) => Some(t),
                DaySlot::Rest => None,
            };
            (slot, training_ordinal(&run.plan, pos.day)?)
        }
        Resolution::OutOfRange => (None, None),
    };

    Ok(RunState::Started {
        resolution,
        slot,
        training_ordinal: ordinal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrainingDayTemplate;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn training(label: &str) -> DaySlot {
        DaySlot::Training(TrainingDayTemplate {
            label: label.into(),
            exercises: Vec::new(),
        })
    }

    /// 4-day microcycle (3 training + rest at slot 4), repeated twice.
    fn sample_plan() -> MesocyclePlan {
        MesocyclePlan {
            id: "p1".into(),
            name: "push-pull-legs".into(),
            microcycle_count: 2,
            microcycle_length: 4,
            day_slots: vec![training("push"), training("pull"), training("legs"), DaySlot::Rest],
        }
    }

    #[test]
    fn every_day_of_the_span_resolves() {
        // Regression: the last slot of each microcycle must be reachable,
        // not only slots 1..length-1.
        let start = date(2024, 1, 1);
        let mut seen_days = HashSet::new();
        for offset in 0..8 {
            let target = start + Days::new(offset);
            match resolve(start, 4, 2, target).unwrap() {
                Resolution::InRange(pos) => {
                    assert!((1..=4).contains(&pos.day));
                    seen_days.insert(pos.day);
                }
                Resolution::OutOfRange => panic!("{target} should be in range"),
            }
        }
        assert_eq!(seen_days, HashSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn offsets_map_bijectively_onto_day_numbers() {
        let start = date(2024, 3, 10);
        let days: Vec<u32> = (0..5)
            .map(|off| {
                match resolve(start, 5, 1, start + Days::new(off)).unwrap() {
                    Resolution::InRange(pos) => pos.day,
                    Resolution::OutOfRange => unreachable!(),
                }
            })
            .collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn dates_just_outside_the_span_are_out_of_range() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 8); // 2 * 4 days, inclusive

        assert_eq!(
            resolve(start, 4, 2, start.pred_opt().unwrap()).unwrap(),
            Resolution::OutOfRange
        );
        assert_eq!(
            resolve(start, 4, 2, end.succ_opt().unwrap()).unwrap(),
            Resolution::OutOfRange
        );
        // The end date itself is still inside.
        assert_eq!(
            resolve(start, 4, 2, end).unwrap(),
            Resolution::InRange(DayPosition { microcycle: 2, day: 4 })
        );
    }

    #[test]
    fn malformed_dimensions_are_errors_not_out_of_range() {
        let start = date(2024, 1, 1);
        assert_eq!(
            resolve(start, 0, 2, start).unwrap_err(),
            PlanError::NonPositiveLength
        );
        assert_eq!(
            resolve(start, 4, 0, start).unwrap_err(),
            PlanError::NonPositiveCount
        );
    }

    #[test]
    fn microcycle_boundary_rolls_over_cleanly() {
        // 2024-01-04 is the rest day closing microcycle 1; 2024-01-05 opens
        // microcycle 2 with a training day.
        let plan = sample_plan();
        let start = date(2024, 1, 1);

        let r = resolve(start, 4, 2, date(2024, 1, 4)).unwrap();
        assert_eq!(r, Resolution::InRange(DayPosition { microcycle: 1, day: 4 }));
        assert!(!slot_at(&plan, 4).unwrap().is_training());

        let r = resolve(start, 4, 2, date(2024, 1, 5)).unwrap();
        assert_eq!(r, Resolution::InRange(DayPosition { microcycle: 2, day: 1 }));
        assert!(slot_at(&plan, 1).unwrap().is_training());
    }

    #[test]
    fn training_ordinal_skips_rest_slots() {
        let plan = MesocyclePlan {
            day_slots: vec![training("a"), DaySlot::Rest, training("b"), DaySlot::Rest],
            ..sample_plan()
        };
        assert_eq!(training_ordinal(&plan, 1).unwrap(), Some(1));
        assert_eq!(training_ordinal(&plan, 2).unwrap(), None);
        assert_eq!(training_ordinal(&plan, 3).unwrap(), Some(2));
        assert_eq!(training_ordinal(&plan, 4).unwrap(), None);
    }

    #[test]
    fn ordinals_for_the_whole_pattern() {
        let plan = sample_plan();
        assert_eq!(
            training_ordinals(&plan).unwrap(),
            vec![Some(1), Some(2), Some(3), None]
        );
    }

    #[test]
    fn absurd_plan_spans_fail_cleanly() {
        // count * length no longer fits the calendar; the builder must
        // report overflow instead of wrapping or trying to allocate.
        let plan = MesocyclePlan {
            microcycle_count: u32::MAX,
            ..sample_plan()
        };
        let err = build_calendar(&plan, date(2024, 1, 1), date(2024, 1, 1), CalendarScope::FullRun)
            .unwrap_err();
        assert_eq!(err, PlanError::DateOverflow);
    }

    #[test]
    fn slot_at_bounds_check() {
        let plan = sample_plan();
        assert_eq!(
            slot_at(&plan, 0).unwrap_err(),
            PlanError::DayOutOfBounds { day: 0, length: 4 }
        );
        assert_eq!(
            slot_at(&plan, 5).unwrap_err(),
            PlanError::DayOutOfBounds { day: 5, length: 4 }
        );
    }

    #[test]
    fn microcycle_calendar_covers_the_anchored_window() {
        let plan = sample_plan();
        let start = date(2024, 1, 1);
        let query = date(2024, 1, 6); // microcycle 2, day 2

        let cells = build_calendar(&plan, start, query, CalendarScope::Microcycle).unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].date, date(2024, 1, 5));
        assert_eq!(cells[3].date, date(2024, 1, 8));
        assert!(cells.iter().all(|c| c.position.microcycle == 2));
        assert_eq!(
            cells.iter().map(|c| c.is_training).collect::<Vec<_>>(),
            vec![true, true, true, false]
        );
        assert_eq!(
            cells.iter().filter(|c| c.is_current).count(),
            1
        );
        assert!(cells[1].is_current);
    }

    #[test]
    fn full_run_calendar_spans_every_day_in_order() {
        let plan = sample_plan();
        let start = date(2024, 1, 1);

        let cells = build_calendar(&plan, start, date(2024, 1, 3), CalendarScope::FullRun).unwrap();
        assert_eq!(cells.len(), 8);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.date, start + Days::new(i as u64));
        }
        assert_eq!(cells[7].position, DayPosition { microcycle: 2, day: 4 });
    }

    #[test]
    fn out_of_range_query_clamps_to_nearest_microcycle() {
        let plan = sample_plan();
        let start = date(2024, 1, 1);

        let before = build_calendar(&plan, start, date(2023, 12, 25), CalendarScope::Microcycle)
            .unwrap();
        assert_eq!(before[0].date, start);
        assert!(before.iter().all(|c| !c.is_current));

        let after = build_calendar(&plan, start, date(2024, 2, 1), CalendarScope::Microcycle)
            .unwrap();
        assert_eq!(after[0].date, date(2024, 1, 5));
    }

    #[test]
    fn build_calendar_is_deterministic() {
        let plan = sample_plan();
        let start = date(2024, 1, 1);
        let a = build_calendar(&plan, start, date(2024, 1, 2), CalendarScope::FullRun).unwrap();
        let b = build_calendar(&plan, start, date(2024, 1, 2), CalendarScope::FullRun).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn run_state_three_cases() {
        let run = MesocycleRun {
            id: "r1".into(),
            plan: sample_plan(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 8),
        };

        assert_eq!(run_state(None, date(2024, 1, 1)).unwrap(), RunState::NotFound);

        assert_eq!(
            run_state(Some(&run), date(2023, 12, 31)).unwrap(),
            RunState::StartsInTheFuture { start: date(2024, 1, 1) }
        );

        match run_state(Some(&run), date(2024, 1, 2)).unwrap() {
            RunState::Started { resolution, slot, training_ordinal } => {
                assert_eq!(
                    resolution,
                    Resolution::InRange(DayPosition { microcycle: 1, day: 2 })
                );
                assert_eq!(slot.map(|t| t.label.as_str()), Some("pull"));
                assert_eq!(training_ordinal, Some(2));
            }
            other => panic!("unexpected state: {other:?}"),
        }

        // Past the end: started, but nothing scheduled.
        match run_state(Some(&run), date(2024, 2, 1)).unwrap() {
            RunState::Started { resolution, slot, training_ordinal } => {
                assert_eq!(resolution, Resolution::OutOfRange);
                assert!(slot.is_none());
                assert!(training_ordinal.is_none());
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
