use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A mesocycle template: a fixed day pattern (the microcycle) repeated
/// `microcycle_count` times. Slot positions are 1-based externally and
/// 0-based in `day_slots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MesocyclePlan {
    pub id: String,
    pub name: String,
    pub microcycle_count: u32,
    pub microcycle_length: u32,
    pub day_slots: Vec<DaySlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DaySlot {
    Rest,
    Training(TrainingDayTemplate),
}

impl DaySlot {
    pub fn is_training(&self) -> bool {
        matches!(self, Self::Training(_))
    }
}

/// What a training slot prescribes, before any run realizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDayTemplate {
    pub label: String,
    pub exercises: Vec<ExerciseTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub name: String,
    pub sets: u32,
    pub rep_range: RepRange,
    pub rir: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    pub lower: u32,
    pub upper: u32,
}

impl RepRange {
    pub fn new(lower: u32, upper: u32) -> Result<Self, PlanError> {
        if lower >= upper {
            return Err(PlanError::InvalidRepRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }
}

impl MesocyclePlan {
    /// Checks the structural invariants every scheduling entry point relies
    /// on: positive dimensions, slot list matching the declared length, and
    /// at least one training slot.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.microcycle_length == 0 {
            return Err(PlanError::NonPositiveLength);
        }
        if self.microcycle_count == 0 {
            return Err(PlanError::NonPositiveCount);
        }
        if self.day_slots.len() != self.microcycle_length as usize {
            return Err(PlanError::SlotCountMismatch {
                expected: self.microcycle_length,
                actual: self.day_slots.len(),
            });
        }
        if !self.day_slots.iter().any(DaySlot::is_training) {
            return Err(PlanError::NoTrainingSlots);
        }
        Ok(())
    }

    /// Total calendar days the plan spans once started. Widened to `u64`:
    /// the factors are user input and their product can exceed `u32`.
    pub fn total_days(&self) -> u64 {
        u64::from(self.microcycle_count) * u64::from(self.microcycle_length)
    }
}

/// A plan instantiated against real time. Spans exactly
/// `microcycle_count * microcycle_length` calendar days, inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MesocycleRun {
    pub id: String,
    pub plan: MesocyclePlan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One realized training session. Only training slots get realized rows;
/// rest slots have none. `slot_position` is the canonical 1-based position
/// within the microcycle pattern; the user-facing "Day N" ordinal counts
/// training slots only and is derived at display time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDay {
    pub id: String,
    pub microcycle: u32,
    pub slot_position: u32,
    pub date: NaiveDate,
    pub exercises: Vec<SessionExercise>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExercise {
    pub id: String,
    pub name: String,
    pub sets: Vec<ExerciseSet>,
}

/// Smallest logged unit. `number` is 1-based and contiguous within its
/// exercise. `reps_completed` stays `None` until the set is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub number: u32,
    pub weight: f64,
    pub rep_range: RepRange,
    pub rir: u32,
    pub reps_completed: Option<u32>,
    pub completed: bool,
}

/// Read-only snapshot of the matching set from the most recent prior
/// realization of the same slot, joined by set `number`. Never mutated;
/// exists only to feed the performance comparator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousRunSet {
    pub number: u32,
    pub weight: f64,
    pub reps_completed: Option<u32>,
    pub rir: u32,
}
