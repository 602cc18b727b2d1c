pub mod config;
pub mod cycle;
pub mod diff;
pub mod domain;
pub mod errors;
pub mod render;
pub mod source;

pub use cycle::{CycleEvent, CycleOutcome, CycleReport, CycleState, CycleTrigger};
pub use diff::{flatten, new_slots, SlotSet, SnapshotDiff};
pub use domain::booking::{PersonalBooking, PersonalSchedule};
pub use domain::slot::{AvailabilitySnapshot, DayTimes, SlotKey, NO_TIMES_LABEL};
pub use errors::{DomainError, SourceError};
pub use source::{FetchOutcome, ScheduleSource, Termination};
