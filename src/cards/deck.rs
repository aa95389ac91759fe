//! Deck construction.
//!
//! ## Algorithm
//!
//! 1. Pick `pair_count` faces from the category with a partial Fisher–Yates
//!    (uniform, without replacement).
//! 2. Create two cards per face sharing a fresh `PairId`. Card ids follow
//!    creation order.
//! 3. Fisher–Yates the full card list so pair positions are uncorrelated
//!    with board order.
//!
//! Both shuffles are unbiased; `tests/deckbuilder_tests.rs` checks the
//! position and face distributions statistically.

use im::Vector;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::card::Card;
use super::category::CategoryCatalog;
use crate::core::{BoardSize, CardId, GameError, GameRng, PairId, Result};

/// Ordered cards of one session, board order (row-major).
///
/// Backed by `im::Vector` so session snapshots share structure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vector<Card>,
}

impl Deck {
    /// Build a deck from cards in board order, checking the pairing invariant.
    ///
    /// Every pair id must appear exactly twice, card ids must be unique, and
    /// the two cards of a pair must share a face and be matched together.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Result<Self> {
        let cards: Vector<Card> = cards.into_iter().collect();

        // Pair id -> (index of its first card, cards seen)
        let mut pairs: FxHashMap<PairId, (usize, usize)> = FxHashMap::default();
        let mut ids: FxHashSet<CardId> = FxHashSet::default();
        for (index, card) in cards.iter().enumerate() {
            if !ids.insert(card.id) {
                return Err(GameError::CorruptRecord(format!("duplicate card id {}", card.id)));
            }
            let (first, count) = pairs.entry(card.pair_id).or_insert((index, 0));
            *count += 1;
            let first = &cards[*first];
            if first.face != card.face {
                return Err(GameError::CorruptRecord(format!(
                    "{} has two different faces",
                    card.pair_id
                )));
            }
            if first.matched != card.matched {
                return Err(GameError::CorruptRecord(format!(
                    "{} is only half matched",
                    card.pair_id
                )));
            }
        }
        if let Some((pair, (_, count))) = pairs.iter().find(|(_, (_, n))| *n != 2) {
            return Err(GameError::CorruptRecord(format!(
                "{} appears {} times, expected 2",
                pair, count
            )));
        }

        Ok(Self { cards })
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the deck is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// Iterate over cards in board order.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Get a card by id.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Get a mutable card by id.
    pub fn get_mut(&mut self, id: CardId) -> Option<&mut Card> {
        let index = self.cards.iter().position(|c| c.id == id)?;
        self.cards.get_mut(index)
    }

    /// Card at a board position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Number of matched pairs.
    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    /// Check if every card is matched.
    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }
}

/// Builds shuffled, paired decks from a category catalog.
#[derive(Clone, Debug)]
pub struct DeckBuilder {
    catalog: CategoryCatalog,
    rng: GameRng,
}

impl DeckBuilder {
    /// Create a deck builder.
    #[must_use]
    pub fn new(catalog: CategoryCatalog, rng: GameRng) -> Self {
        Self { catalog, rng }
    }

    /// The categories this builder draws from.
    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Build a shuffled deck for `board` from the named category.
    ///
    /// Fails with `CategoryNotFound` if the category is unknown or has fewer
    /// distinct faces than the board has pairs.
    pub fn build(&mut self, category: &str, board: BoardSize) -> Result<Deck> {
        let needed = board.pair_count();
        let faces = self
            .catalog
            .get(category)
            .and_then(|cat| self.rng.pick(cat.faces(), needed))
            .ok_or_else(|| GameError::CategoryNotFound {
                name: category.to_string(),
                needed,
            })?;

        let mut cards = Vec::with_capacity(board.card_count());
        for (pair, face) in faces.into_iter().enumerate() {
            let pair_id = PairId::new(pair as u32);
            let first = CardId::new(cards.len() as u32);
            cards.push(Card::new(first, pair_id, face.clone()));
            let second = CardId::new(cards.len() as u32);
            cards.push(Card::new(second, pair_id, face));
        }
        self.rng.shuffle(&mut cards);

        debug!(category, %board, cards = cards.len(), "built deck");
        Ok(Deck {
            cards: cards.into_iter().collect(),
        })
    }
}
