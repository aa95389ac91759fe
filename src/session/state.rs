//! Session: the card-reveal/match state machine.
//!
//! ## Transitions
//!
//! - `reveal`: Active only. Turns a selectable card face-up and buffers it.
//!   Clicking a matched or face-up card, or any card while two are already
//!   buffered, is ignored and reported, never fatal.
//! - `resolve`: compares the buffered pair. A match is permanent and may win
//!   the game. A mismatch leaves both cards up and the buffer full; the caller
//!   schedules `flip_back` after the cooldown.
//! - `flip_back`: the deferred half of a mismatch. Runs in any phase and never
//!   touches the clock, so it is safe against a paused session.
//! - `tick`: Active only. Expiry abandons any pending pair face-down and ends
//!   the game as lost.
//! - `pause` / `resume`: freeze and restart the clock. Resuming with no time
//!   left goes straight to `Completed(Lost)`.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::phase::{Outcome, Phase};
use super::selection::SelectionBuffer;
use super::view::{CardView, SessionView};
use crate::cards::Deck;
use crate::clock::{check_allowance, format_mmss, Countdown};
use crate::core::{BoardSize, CardId, GameError, PairId, Result, SessionId};

/// Why a reveal did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ignored {
    AlreadyMatched,
    AlreadyRevealed,
    /// Two cards are already waiting for resolution (or the cooldown).
    Resolving,
}

/// Result of a reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal {
    /// First card of a pair is face-up.
    FaceUp(CardId),
    /// Second card is face-up; the pair must now be resolved.
    PairReady(CardId, CardId),
    /// Nothing changed.
    Ignored(Ignored),
}

/// Result of resolving the buffered pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Both cards are now permanently matched.
    Matched { pair: PairId, won: bool },
    /// Different pairs; both must flip back after the cooldown.
    Mismatched { first: CardId, second: CardId },
}

/// One play-through.
#[derive(Clone, Debug)]
pub struct Session {
    id: SessionId,
    username: String,
    category: String,
    board: BoardSize,
    deck: Deck,
    clock: Countdown,
    phase: Phase,
    selection: SelectionBuffer,
}

impl Session {
    /// Start a new Active session with a fresh id, zero elapsed time and the
    /// clock started at `now`.
    ///
    /// `total_time` must be positive and at most `MAX_TOTAL_TIME_SECS`.
    pub fn new(
        username: impl Into<String>,
        category: impl Into<String>,
        board: BoardSize,
        deck: Deck,
        total_time: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        check_deck(board, &deck)?;
        let total_time = check_allowance(total_time)?;
        Ok(Self {
            id: SessionId::generate(),
            username: username.into(),
            category: category.into(),
            board,
            deck,
            clock: Countdown::start(total_time, now),
            phase: Phase::Active,
            selection: SelectionBuffer::new(),
        })
    }

    /// Rebuild a persisted session. It comes back Paused, or Completed if
    /// `outcome` is set, with an empty selection buffer.
    pub fn restore(
        id: SessionId,
        username: impl Into<String>,
        category: impl Into<String>,
        board: BoardSize,
        deck: Deck,
        clock: Countdown,
        outcome: Option<Outcome>,
    ) -> Result<Self> {
        check_deck(board, &deck)?;
        Ok(Self {
            id,
            username: username.into(),
            category: category.into(),
            board,
            deck,
            clock,
            phase: outcome.map_or(Phase::Paused, Phase::Completed),
            selection: SelectionBuffer::new(),
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn board(&self) -> BoardSize {
        self.board
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn clock(&self) -> &Countdown {
        &self.clock
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cards currently buffered.
    #[must_use]
    pub fn selection(&self) -> &[CardId] {
        self.selection.as_slice()
    }

    /// Two cards are waiting for resolution or the cooldown.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.selection.is_full()
    }

    // === Transitions ===

    /// Turn a card face-up.
    pub fn reveal(&mut self, card_id: CardId) -> Result<Reveal> {
        self.require_active("reveal")?;

        let card = self
            .deck
            .get(card_id)
            .ok_or_else(|| GameError::not_found("card", card_id))?;
        if card.matched {
            return Ok(Reveal::Ignored(Ignored::AlreadyMatched));
        }
        if card.revealed {
            return Ok(Reveal::Ignored(Ignored::AlreadyRevealed));
        }
        if self.selection.is_full() {
            return Ok(Reveal::Ignored(Ignored::Resolving));
        }

        if let Some(card) = self.deck.get_mut(card_id) {
            card.reveal();
        }
        self.selection.push(card_id);

        Ok(match self.selection.pair() {
            Some((first, second)) => Reveal::PairReady(first, second),
            None => Reveal::FaceUp(card_id),
        })
    }

    /// Compare the buffered pair.
    ///
    /// `now` stamps the clock if this match wins the game.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> Result<Resolution> {
        self.require_active("resolve")?;
        let (first, second) = self
            .selection
            .pair()
            .ok_or_else(|| GameError::invalid_transition("resolve", "fewer than two cards are selected"))?;

        let (a, b) = match (self.deck.get(first), self.deck.get(second)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(GameError::not_found("card", first)),
        };
        if !a.pairs_with(b) {
            return Ok(Resolution::Mismatched { first, second });
        }

        let pair = a.pair_id;
        for id in self.selection.take() {
            if let Some(card) = self.deck.get_mut(id) {
                card.mark_matched();
            }
        }

        let won = self.deck.all_matched();
        if won {
            self.clock.freeze(now);
            self.phase = Phase::Completed(Outcome::Won);
            debug!(session = %self.id, "all pairs matched");
        }
        Ok(Resolution::Matched { pair, won })
    }

    /// Turn a mismatched pair back face-down and clear the buffer.
    ///
    /// Returns false without changing anything if the buffer no longer holds
    /// exactly this pair (already flipped, or abandoned by a timeout).
    pub fn flip_back(&mut self, first: CardId, second: CardId) -> bool {
        if self.selection.pair() != Some((first, second)) {
            return false;
        }
        for id in self.selection.take() {
            if let Some(card) = self.deck.get_mut(id) {
                card.hide();
            }
        }
        true
    }

    /// Re-evaluate the clock. Returns `Some(Lost)` when time has run out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<Outcome>> {
        self.require_active("tick")?;

        self.clock.sample(now);
        if !self.clock.is_expired_at(now) {
            return Ok(None);
        }

        self.abandon_selection();
        self.clock.expire();
        self.phase = Phase::Completed(Outcome::Lost);
        debug!(session = %self.id, "time expired");
        Ok(Some(Outcome::Lost))
    }

    /// Active -> Paused. Freezes elapsed time; the deck is left as is.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.require_active("pause")?;
        self.clock.freeze(now);
        self.phase = Phase::Paused;
        Ok(())
    }

    /// Paused -> Active, or straight to `Completed(Lost)` if no time remains.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Phase> {
        if self.phase != Phase::Paused {
            return Err(GameError::invalid_transition("resume", self.phase));
        }

        if self.clock.remaining_at(now) > Duration::zero() {
            self.clock.resume(now)?;
            self.phase = Phase::Active;
        } else {
            self.abandon_selection();
            self.clock.expire();
            self.phase = Phase::Completed(Outcome::Lost);
        }
        Ok(self.phase)
    }

    /// Read model as of `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        let remaining = self.clock.remaining_at(now);
        SessionView {
            id: self.id,
            username: self.username.clone(),
            category: self.category.clone(),
            board: self.board,
            phase: self.phase,
            cards: self.deck.iter().map(CardView::from).collect(),
            elapsed: self.clock.elapsed_at(now),
            remaining,
            time_display: format_mmss(remaining),
            matched_pairs: self.deck.matched_pairs(),
            total_pairs: self.deck.pair_count(),
            resolving: self.is_resolving(),
        }
    }

    // === Helpers ===

    fn require_active(&self, action: &'static str) -> Result<()> {
        if self.phase.is_active() {
            Ok(())
        } else {
            Err(GameError::invalid_transition(action, self.phase))
        }
    }

    /// Flip any buffered, unmatched card face-down and clear the buffer.
    fn abandon_selection(&mut self) {
        for id in self.selection.take() {
            if let Some(card) = self.deck.get_mut(id) {
                card.hide();
            }
        }
    }
}

fn check_deck(board: BoardSize, deck: &Deck) -> Result<()> {
    if deck.len() != board.card_count() {
        return Err(GameError::CorruptRecord(format!(
            "{} board needs {} cards, deck has {}",
            board,
            board.card_count(),
            deck.len()
        )));
    }
    Ok(())
}
