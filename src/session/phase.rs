//! Session lifecycle phases.

use serde::{Deserialize, Serialize};

/// Result of a completed session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every pair matched before the time ran out.
    Won,
    /// Time ran out first.
    Lost,
}

impl Outcome {
    #[must_use]
    pub fn is_win(self) -> bool {
        matches!(self, Outcome::Won)
    }
}

/// Where a live session is in its lifecycle.
///
/// ```text
/// Active <-> Paused
///   |          |
///   v          v
/// Completed(Won | Lost)   (terminal)
/// ```
///
/// "No session" (idle) is the controller holding nothing, not a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Deck live, clock running.
    Active,
    /// Clock frozen, deck retained verbatim.
    Paused,
    /// Terminal.
    Completed(Outcome),
}

impl Phase {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Active)
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Phase::Completed(_))
    }

    /// The outcome, if completed.
    #[must_use]
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Active => f.write_str("active"),
            Phase::Paused => f.write_str("paused"),
            Phase::Completed(Outcome::Won) => f.write_str("completed (won)"),
            Phase::Completed(Outcome::Lost) => f.write_str("completed (lost)"),
        }
    }
}
