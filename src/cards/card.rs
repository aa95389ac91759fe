//! Cards - one face on the board.
//!
//! A `Card` tracks two flags:
//! - `revealed`: face-up right now
//! - `matched`: its pair was found; never reverts within a session
//!
//! Once matched, a card stays face-up, so `matched` implies `revealed` for
//! every state the session machine can reach.

use serde::{Deserialize, Serialize};

use crate::core::{CardId, PairId};

/// Reference to a face image (path, asset key or colour code).
///
/// Opaque to the engine; only compared for equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceRef(pub String);

impl FaceRef {
    /// Create a face reference.
    pub fn new(face: impl Into<String>) -> Self {
        Self(face.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FaceRef {
    fn from(face: &str) -> Self {
        Self(face.to_string())
    }
}

impl From<String> for FaceRef {
    fn from(face: String) -> Self {
        Self(face)
    }
}

impl std::fmt::Display for FaceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A card on the board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub pair_id: PairId,
    pub face: FaceRef,
    pub revealed: bool,
    pub matched: bool,
}

impl Card {
    /// Create a face-down, unmatched card.
    #[must_use]
    pub fn new(id: CardId, pair_id: PairId, face: FaceRef) -> Self {
        Self {
            id,
            pair_id,
            face,
            revealed: false,
            matched: false,
        }
    }

    /// Can this card be turned over by a click?
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.revealed && !self.matched
    }

    /// Does this card form a pair with `other`?
    #[must_use]
    pub fn pairs_with(&self, other: &Card) -> bool {
        self.id != other.id && self.pair_id == other.pair_id
    }

    pub(crate) fn reveal(&mut self) {
        self.revealed = true;
    }

    /// Turn face-down again. Matched cards stay up.
    pub(crate) fn hide(&mut self) {
        if !self.matched {
            self.revealed = false;
        }
    }

    pub(crate) fn mark_matched(&mut self) {
        self.revealed = true;
        self.matched = true;
    }
}
