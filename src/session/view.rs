//! Read models handed to a UI layer.
//!
//! Faces of face-down cards are withheld so a renderer cannot leak them.

use chrono::Duration;

use super::phase::Phase;
use crate::cards::{Card, FaceRef};
use crate::core::{BoardSize, CardId, SessionId};

/// One board slot as the player sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardView {
    pub id: CardId,
    /// `None` while the card is face-down.
    pub face: Option<FaceRef>,
    pub revealed: bool,
    pub matched: bool,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            face: card.revealed.then(|| card.face.clone()),
            revealed: card.revealed,
            matched: card.matched,
        }
    }
}

/// Snapshot of a session at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub id: SessionId,
    pub username: String,
    pub category: String,
    pub board: BoardSize,
    pub phase: Phase,
    /// Board order, row-major.
    pub cards: Vec<CardView>,
    pub elapsed: Duration,
    pub remaining: Duration,
    /// Remaining time as `MM:SS`.
    pub time_display: String,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    /// Two cards are face-up waiting to be resolved or flipped back.
    pub resolving: bool,
}

impl SessionView {
    /// Card at `row`, `column`, if on the board.
    #[must_use]
    pub fn card_at(&self, row: u8, column: u8) -> Option<&CardView> {
        if row >= self.board.rows() || column >= self.board.columns() {
            return None;
        }
        let index = usize::from(row) * usize::from(self.board.columns()) + usize::from(column);
        self.cards.get(index)
    }
}
