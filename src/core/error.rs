//! Error taxonomy for the game engine.
//!
//! Every variant is recoverable: the controller hands it back to the caller
//! and the in-memory session is left as it was before the failed call.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors reported by the deck builder, session, stores and controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Board sides outside `2..=6`, or an odd card count.
    #[error("invalid board size {rows}x{columns}: sides must be 2..=6 and the card count even")]
    InvalidBoardSize { rows: u8, columns: u8 },

    /// Unknown category, or one with too few distinct faces for the board.
    #[error("category '{name}' not found or has fewer than {needed} distinct faces")]
    CategoryNotFound { name: String, needed: usize },

    /// A profile with this username already exists.
    #[error("user '{0}' already exists")]
    UserAlreadyExists(String),

    /// Missing session, user or card.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Operation not allowed in the current lifecycle state.
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },

    /// Underlying storage could not be read or written. Safe to retry.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A time allowance or deadline chrono cannot represent, or outside the
    /// allowed range.
    #[error("time out of range: {0}")]
    InvalidTime(String),

    /// A persisted record decoded but breaks a deck or board invariant.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}

impl GameError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(action: &'static str, state: impl ToString) -> Self {
        Self::InvalidTransition {
            action,
            state: state.to_string(),
        }
    }

    /// Creates a StorageUnavailable error.
    pub fn storage(message: impl ToString) -> Self {
        Self::StorageUnavailable(message.to_string())
    }

    /// Check if this is a NotFound error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a StorageUnavailable error.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Self::StorageUnavailable(e.to_string())
        } else {
            Self::CorruptRecord(e.to_string())
        }
    }
}
