//! Asynchronous request identity and lifecycle

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Integer handle identifying an issued request, used to attempt cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHandle(u64);

impl RequestHandle {
    /// Wrap a raw handle value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw handle value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Lifecycle of a single request
///
/// `Idle -> Pending -> {Completed | Failed | Cancelled}`; the three outcomes
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Not yet issued
    #[default]
    Idle,
    /// Issued, waiting for the engine
    Pending,
    /// Engine delivered a response
    Completed,
    /// Engine reported an error
    Failed,
    /// Cancelled before a result was delivered
    Cancelled,
}

impl RequestState {
    /// Check if this state is terminal (no further transitions)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check whether moving to `next` is allowed
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Idle => matches!(next, Self::Pending),
            Self::Pending => next.is_terminal(),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }

    /// Move to `next`, returning the new state
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the transition is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
