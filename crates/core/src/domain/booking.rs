use serde::{Deserialize, Serialize};

/// A lesson the operator has already booked.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonalBooking {
    pub date: String,
    pub time: String,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonalSchedule {
    Bookings(Vec<PersonalBooking>),
    /// The bookings table was not rendered at all.
    NoBookings,
}

impl PersonalSchedule {
    /// Bookings ordered by date, time and location.
    pub fn sorted_bookings(&self) -> Vec<&PersonalBooking> {
        match self {
            Self::Bookings(bookings) => {
                let mut sorted: Vec<&PersonalBooking> = bookings.iter().collect();
                sorted.sort();
                sorted
            }
            Self::NoBookings => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bookings(bookings) => bookings.is_empty(),
            Self::NoBookings => true,
        }
    }
}
