//! Selection buffer: the 0-2 face-up cards awaiting resolution.
//!
//! Transient. Owned by one live session, cleared after every resolution,
//! never serialized.

use smallvec::SmallVec;

use crate::core::CardId;

/// Holds up to two revealed-but-unresolved cards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionBuffer {
    cards: SmallVec<[CardId; 2]>,
}

impl SelectionBuffer {
    /// Buffer capacity.
    pub const CAPACITY: usize = 2;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card. Returns false, leaving the buffer unchanged, if full.
    pub fn push(&mut self, card: CardId) -> bool {
        if self.is_full() {
            return false;
        }
        self.cards.push(card);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Two cards are waiting: the session is resolving.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cards.len() >= Self::CAPACITY
    }

    /// The buffered pair, once full.
    #[must_use]
    pub fn pair(&self) -> Option<(CardId, CardId)> {
        match self.cards.as_slice() {
            [first, second] => Some((*first, *second)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CardId] {
        &self.cards
    }

    /// Empty the buffer, returning what it held.
    pub fn take(&mut self) -> SmallVec<[CardId; 2]> {
        std::mem::take(&mut self.cards)
    }
}
