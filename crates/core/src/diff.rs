use std::collections::BTreeSet;

use crate::domain::slot::{AvailabilitySnapshot, DayTimes, SlotKey};

pub type SlotSet = BTreeSet<SlotKey>;

/// Every real (date, time) pair in the snapshot. Dates recorded as
/// [`DayTimes::NoTimes`] contribute nothing.
pub fn flatten(snapshot: &AvailabilitySnapshot) -> SlotSet {
    snapshot
        .days()
        .flat_map(|(date, times)| match times {
            DayTimes::Open(times) => {
                times.iter().map(|time| SlotKey::new(date.clone(), time.clone())).collect()
            }
            DayTimes::NoTimes => Vec::new(),
        })
        .collect()
}

/// Slots present in `snapshot` that were not in `old`.
pub fn new_slots(old: &SlotSet, snapshot: &AvailabilitySnapshot) -> SlotSet {
    flatten(snapshot).difference(old).cloned().collect()
}

/// Result of comparing the persisted set with a fresh snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// The flattened snapshot, which becomes the next persisted set.
    pub current: SlotSet,
    pub added: SlotSet,
    pub removed: SlotSet,
}

impl SnapshotDiff {
    pub fn compute(old: &SlotSet, snapshot: &AvailabilitySnapshot) -> Self {
        let current = flatten(snapshot);
        let added = current.difference(old).cloned().collect();
        let removed = old.difference(&current).cloned().collect();
        Self { current, added, removed }
    }

    pub fn has_new_slots(&self) -> bool {
        !self.added.is_empty()
    }
}
