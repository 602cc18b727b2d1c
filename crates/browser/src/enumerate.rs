//! Bounded-round walk over the dates a calendar picker offers.
//!
//! The picker re-renders after every inspection, so each round reopens it,
//! inspects one date that has not been seen yet and resets the page. The walk
//! never runs more than `max_rounds` rounds.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use slotwatch_core::domain::slot::{AvailabilitySnapshot, DayTimes};
use slotwatch_core::source::{FetchOutcome, Termination};

use crate::driver::{DriverError, ElementRef};

/// One selectable day as rendered by the picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateCell {
    pub label: String,
    pub element: ElementRef,
}

/// The scheduling view, reduced to the steps the walk needs.
#[async_trait]
pub trait CalendarPage: Send {
    /// Opens the picker. Fails with `Timeout` when it never becomes visible.
    async fn open_picker(&mut self) -> Result<(), DriverError>;

    /// Cells currently rendered by the open picker, in page order.
    async fn date_cells(&mut self) -> Result<Vec<DateCell>, DriverError>;

    /// Selects `cell` and reads its time options. A time select that never
    /// loads is `DayTimes::NoTimes`, not an error.
    async fn inspect_date(&mut self, cell: &DateCell) -> Result<DayTimes, DriverError>;

    /// Returns to the entry point and waits until the date input is usable.
    async fn reset(&mut self) -> Result<(), DriverError>;
}

pub struct DateEnumerator {
    max_rounds: u32,
}

enum Step {
    Next,
    Done(Termination),
}

impl DateEnumerator {
    pub fn new(max_rounds: u32) -> Self {
        Self { max_rounds }
    }

    pub async fn run<P>(&self, page: &mut P) -> FetchOutcome
    where
        P: CalendarPage + ?Sized,
    {
        let mut checked: BTreeSet<String> = BTreeSet::new();
        let mut snapshot = AvailabilitySnapshot::new();

        for round in 1..=self.max_rounds {
            match self.round(page, round, &mut checked, &mut snapshot).await {
                Step::Next => {}
                Step::Done(termination) => return FetchOutcome { snapshot, termination },
            }
        }

        debug!(
            event_name = "browser.round_limit",
            max_rounds = self.max_rounds,
            dates_checked = snapshot.dates_checked(),
            "date enumeration hit the round limit"
        );
        FetchOutcome { snapshot, termination: Termination::RoundLimit }
    }

    async fn round<P>(
        &self,
        page: &mut P,
        round: u32,
        checked: &mut BTreeSet<String>,
        snapshot: &mut AvailabilitySnapshot,
    ) -> Step
    where
        P: CalendarPage + ?Sized,
    {
        match page.open_picker().await {
            Ok(()) => {}
            Err(DriverError::StaleElement) => return restart(page, round, None, checked).await,
            Err(error) if error.is_timeout() => {
                warn!(
                    event_name = "browser.picker_unavailable",
                    round,
                    error = %error,
                    "date picker did not open"
                );
                return Step::Done(Termination::CalendarUnavailable);
            }
            Err(error) => return interrupted(error),
        }

        let cells = match page.date_cells().await {
            Ok(cells) => cells,
            Err(DriverError::StaleElement) => return restart(page, round, None, checked).await,
            Err(error) => return interrupted(error),
        };
        if cells.is_empty() {
            return Step::Done(Termination::Exhausted);
        }

        let Some(cell) = cells.iter().find(|cell| !checked.contains(&cell.label)) else {
            return Step::Done(Termination::NoNewDates);
        };
        checked.insert(cell.label.clone());
        debug!(
            event_name = "browser.date_inspecting",
            round,
            date = %cell.label,
            rendered = cells.len(),
            "inspecting date"
        );

        match page.inspect_date(cell).await {
            Ok(times) => snapshot.record(cell.label.clone(), times),
            Err(DriverError::StaleElement) => {
                return restart(page, round, Some(&cell.label), checked).await
            }
            Err(error) => return interrupted(error),
        }

        if cells.iter().all(|cell| checked.contains(&cell.label)) {
            return Step::Done(Termination::AllDatesChecked);
        }

        reset(page).await
    }
}

/// Handles a stale element: the date picked this round (if any) is inspected
/// again on a later round, and the page is reloaded.
async fn restart<P>(
    page: &mut P,
    round: u32,
    picked: Option<&str>,
    checked: &mut BTreeSet<String>,
) -> Step
where
    P: CalendarPage + ?Sized,
{
    if let Some(label) = picked {
        checked.remove(label);
    }
    debug!(
        event_name = "browser.stale_element",
        round,
        date = picked.unwrap_or(""),
        "page went stale, reloading"
    );
    reset(page).await
}

async fn reset<P>(page: &mut P) -> Step
where
    P: CalendarPage + ?Sized,
{
    match page.reset().await {
        Ok(()) | Err(DriverError::StaleElement) => Step::Next,
        Err(error) if error.is_timeout() => Step::Done(Termination::CalendarUnavailable),
        Err(error) => interrupted(error),
    }
}

fn interrupted(error: DriverError) -> Step {
    warn!(
        event_name = "browser.enumeration_interrupted",
        error = %error,
        "date enumeration interrupted"
    );
    Step::Done(Termination::Interrupted(error.to_string()))
}
