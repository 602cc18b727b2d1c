use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::source::Termination;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleState {
    Idle,
    Fetching,
    Diffing,
    Persisting,
    Notifying,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleEvent {
    Started,
    SnapshotFetched,
    DiffComputed,
    SnapshotPersisted,
    NotificationsSent,
    Failed,
}

/// What asked for a cycle to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleTrigger {
    Startup,
    Interval,
    Command,
    RefreshButton,
    Cli,
}

impl CycleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Interval => "interval",
            Self::Command => "command",
            Self::RefreshButton => "refresh_button",
            Self::Cli => "cli",
        }
    }
}

impl CycleState {
    /// Applies `event`. `Failed` returns any state to `Idle`; everything else
    /// must follow `Idle → Fetching → Diffing → Persisting → Notifying → Idle`.
    pub fn on(self, event: CycleEvent) -> Result<CycleState, DomainError> {
        let next = match (self, event) {
            (Self::Idle, CycleEvent::Started) => Self::Fetching,
            (Self::Fetching, CycleEvent::SnapshotFetched) => Self::Diffing,
            (Self::Diffing, CycleEvent::DiffComputed) => Self::Persisting,
            (Self::Persisting, CycleEvent::SnapshotPersisted) => Self::Notifying,
            (Self::Notifying, CycleEvent::NotificationsSent) => Self::Idle,
            (_, CycleEvent::Failed) => Self::Idle,
            (from, event) => return Err(DomainError::InvalidCycleTransition { from, event }),
        };
        Ok(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Diffing => "diffing",
            Self::Persisting => "persisting",
            Self::Notifying => "notifying",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed {
        termination: Termination,
        dates_checked: usize,
        new_slots: usize,
        persisted_slots: usize,
    },
    Failed {
        /// State the cycle was in when it failed.
        stage: CycleState,
        error: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub correlation_id: String,
    pub trigger: CycleTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleEvent, CycleState};
    use crate::errors::DomainError;

    #[test]
    fn happy_path_walks_every_state_back_to_idle() {
        let mut state = CycleState::Idle;
        let mut visited = vec![state];
        for event in [
            CycleEvent::Started,
            CycleEvent::SnapshotFetched,
            CycleEvent::DiffComputed,
            CycleEvent::SnapshotPersisted,
            CycleEvent::NotificationsSent,
        ] {
            state = state.on(event).expect("valid transition");
            visited.push(state);
        }

        assert_eq!(
            visited,
            vec![
                CycleState::Idle,
                CycleState::Fetching,
                CycleState::Diffing,
                CycleState::Persisting,
                CycleState::Notifying,
                CycleState::Idle,
            ]
        );
    }

    #[test]
    fn failure_returns_to_idle_from_any_state() {
        for state in [
            CycleState::Idle,
            CycleState::Fetching,
            CycleState::Diffing,
            CycleState::Persisting,
            CycleState::Notifying,
        ] {
            assert_eq!(state.on(CycleEvent::Failed), Ok(CycleState::Idle));
        }
    }

    #[test]
    fn skipping_the_persist_step_is_rejected() {
        let error = CycleState::Diffing
            .on(CycleEvent::NotificationsSent)
            .expect_err("diffing cannot jump to idle");
        assert!(matches!(
            error,
            DomainError::InvalidCycleTransition { from: CycleState::Diffing, .. }
        ));
    }

    #[test]
    fn a_running_cycle_cannot_be_started_again() {
        assert!(CycleState::Fetching.on(CycleEvent::Started).is_err());
    }
}
