use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::booking::PersonalSchedule;
use crate::domain::slot::AvailabilitySnapshot;
use crate::errors::SourceError;

/// Why date enumeration stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The date picker rendered no selectable cells.
    Exhausted,
    /// Every cell rendered in the last round had been inspected.
    AllDatesChecked,
    /// A scan of the rendered cells found nothing left to inspect.
    NoNewDates,
    RoundLimit,
    /// The date picker or the scheduling view stopped appearing in time.
    CalendarUnavailable,
    Interrupted(String),
}

impl Termination {
    /// Whether the snapshot may be missing dates the site still offers.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::RoundLimit | Self::CalendarUnavailable | Self::Interrupted(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::AllDatesChecked => "all_dates_checked",
            Self::NoNewDates => "no_new_dates",
            Self::RoundLimit => "round_limit",
            Self::CalendarUnavailable => "calendar_unavailable",
            Self::Interrupted(_) => "interrupted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub snapshot: AvailabilitySnapshot,
    pub termination: Termination,
}

/// The remote calendar, seen as an opaque oracle.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Enumerates open slots. Truncated enumeration is reported through
    /// [`FetchOutcome::termination`], not as an error.
    async fn fetch_availability(&self) -> Result<FetchOutcome, SourceError>;

    async fn fetch_personal_schedule(&self) -> Result<PersonalSchedule, SourceError>;
}
