use thiserror::Error;

/// Structural invalidity of a plan or of the arguments derived from one.
///
/// These indicate corrupt configuration data, not a transient condition:
/// callers surface them as hard failures. A queried date that merely falls
/// outside a run's span is *not* an error (see `schedule::Resolution`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("microcycle length must be positive")]
    NonPositiveLength,

    #[error("microcycle count must be positive")]
    NonPositiveCount,

    #[error("plan has {actual} day slots but microcycle length is {expected}")]
    SlotCountMismatch { expected: u32, actual: usize },

    #[error("plan has no training slots")]
    NoTrainingSlots,

    #[error("day number {day} outside microcycle of length {length}")]
    DayOutOfBounds { day: u32, length: u32 },

    #[error("rep range lower bound {lower} must be below upper bound {upper}")]
    InvalidRepRange { lower: u32, upper: u32 },

    #[error("date arithmetic overflow")]
    DateOverflow,
}
