//! # Report Phase State Machine
//!
//! A report moves through four phases. Disputes do not change the phase;
//! they mutate a `Reported` report in place.
//!
//! ## Allowed Transitions
//!
//! ```text
//! Pending ──submit_initial()──▶ Reported ──settle() in window──▶ Settled
//!                                  │                               │
//!                                  └──settle() after window──┐     │ (same call)
//!                                                            ▼     ▼
//!                                                         Distributed
//! ```
//!
//! ## Security Invariant
//!
//! `Distributed` is terminal. Every transition out of it is rejected, so
//! `is_distributed` can never revert and escrow can never be paid twice.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle phase of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPhase {
    /// Created; no reporter yet.
    Pending,
    /// A reporter holds the position; disputes are possible.
    Reported,
    /// The price is frozen; distribution follows in the same call.
    Settled,
    /// Escrow released. Terminal.
    Distributed,
}

impl ReportPhase {
    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reported => "REPORTED",
            Self::Settled => "SETTLED",
            Self::Distributed => "DISTRIBUTED",
        }
    }

    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Distributed)
    }

    /// Whether `self → to` is an edge of the state machine.
    pub fn can_transition_to(&self, to: ReportPhase) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Reported)
                | (Self::Reported, Self::Settled)
                | (Self::Reported, Self::Distributed)
                | (Self::Settled, Self::Distributed)
        )
    }

    /// Validate a transition, returning the target phase.
    pub fn try_transition(self, to: ReportPhase) -> Result<ReportPhase, PhaseError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(PhaseError::InvalidTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for ReportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejected phase transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    /// Attempted transition is not allowed by the state machine.
    #[error("invalid report transition: {from} -> {to}")]
    InvalidTransition {
        /// Current phase.
        from: ReportPhase,
        /// Attempted target phase.
        to: ReportPhase,
    },

    /// An in-place mutation required a different phase.
    #[error("report is {actual}, expected {expected}")]
    WrongPhase {
        /// Phase the mutation requires.
        expected: ReportPhase,
        /// Phase the report is in.
        actual: ReportPhase,
    },
}
