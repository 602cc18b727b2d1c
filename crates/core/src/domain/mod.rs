pub mod booking;
pub mod slot;

pub use booking::{PersonalBooking, PersonalSchedule};
pub use slot::{AvailabilitySnapshot, DayTimes, SlotKey, NO_TIMES_LABEL};
