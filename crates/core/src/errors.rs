use thiserror::Error;

use crate::cycle::{CycleEvent, CycleState};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid cycle transition from {from:?} on {event:?}")]
    InvalidCycleTransition { from: CycleState, event: CycleEvent },
}

/// Failures surfaced by a [`crate::source::ScheduleSource`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("login to the calendar site failed: {0}")]
    Auth(String),
    #[error("browser session could not be started: {0}")]
    Session(String),
    #[error("calendar site request failed: {0}")]
    Remote(String),
}

impl SourceError {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Session(_) => "session",
            Self::Remote(_) => "remote",
        }
    }
}
