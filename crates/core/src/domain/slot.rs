use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label the calendar site uses for a date that has no bookable times.
pub const NO_TIMES_LABEL: &str = "Нет времени";

/// One bookable lesson opening. Ordering is by date label, then time label,
/// using plain string comparison.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: String,
    pub time: String,
}

impl SlotKey {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self { date: date.into(), time: time.into() }
    }
}

/// Times observed for a single date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayTimes {
    Open(Vec<String>),
    /// The date was inspected and had no real time options.
    NoTimes,
}

impl DayTimes {
    /// Builds the times for a date from raw option labels, dropping blanks and
    /// the site's "no times" label. Nothing left means [`DayTimes::NoTimes`].
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let times: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|label| !label.trim().is_empty() && label != NO_TIMES_LABEL)
            .collect();

        if times.is_empty() {
            Self::NoTimes
        } else {
            Self::Open(times)
        }
    }

    pub fn times(&self) -> &[String] {
        match self {
            Self::Open(times) => times,
            Self::NoTimes => &[],
        }
    }

    pub fn has_times(&self) -> bool {
        !self.times().is_empty()
    }
}

/// Everything one fetch observed, keyed by date label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    days: BTreeMap<String, DayTimes>,
}

impl AvailabilitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the times for `date`, replacing an earlier observation of the same date.
    pub fn record(&mut self, date: impl Into<String>, times: DayTimes) {
        self.days.insert(date.into(), times);
    }

    pub fn get(&self, date: &str) -> Option<&DayTimes> {
        self.days.get(date)
    }

    pub fn days(&self) -> btree_map::Iter<'_, String, DayTimes> {
        self.days.iter()
    }

    pub fn dates_checked(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.days.values().map(|times| times.times().len()).sum()
    }
}

impl FromIterator<(String, DayTimes)> for AvailabilitySnapshot {
    fn from_iter<T: IntoIterator<Item = (String, DayTimes)>>(iter: T) -> Self {
        Self { days: iter.into_iter().collect() }
    }
}
