//! Persisted session record.
//!
//! ```text
//! { id, username, category, rows, columns,
//!   cards: [{ id, faceRef, pairGroupId, revealed, matched }, ...],
//!   startTime, totalTimeSeconds, elapsedSeconds, completed, won }
//! ```
//!
//! The selection buffer is not part of the record, so a card that is face-up
//! but unmatched is written face-down. Durations are stored as seconds with
//! millisecond precision and decoded by rounding back to whole milliseconds,
//! which makes save -> load -> save reproduce the record exactly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Deck, FaceRef};
use crate::clock::{check_allowance, Countdown};
use crate::core::{
    BoardSize, CardId, GameError, PairId, Result, SessionId, MAX_TOTAL_TIME_SECS,
};
use crate::session::{Outcome, Session};

/// One card in a persisted session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: u32,
    pub face_ref: FaceRef,
    pub pair_group_id: u32,
    pub revealed: bool,
    pub matched: bool,
}

impl From<&Card> for CardRecord {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.raw(),
            face_ref: card.face.clone(),
            pair_group_id: card.pair_id.raw(),
            // Unresolved reveals are abandoned; matched cards stay up.
            revealed: card.matched,
            matched: card.matched,
        }
    }
}

impl From<CardRecord> for Card {
    fn from(record: CardRecord) -> Self {
        Card {
            id: CardId::new(record.id),
            pair_id: PairId::new(record.pair_group_id),
            face: record.face_ref,
            revealed: record.revealed || record.matched,
            matched: record.matched,
        }
    }
}

/// A persisted session snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub username: String,
    pub category: String,
    pub rows: u8,
    pub columns: u8,
    pub cards: Vec<CardRecord>,
    pub start_time: DateTime<Utc>,
    pub total_time_seconds: f64,
    pub elapsed_seconds: f64,
    pub completed: bool,
    pub won: bool,
}

impl SessionRecord {
    /// Snapshot a session.
    ///
    /// Elapsed time is the clock's last captured value, so callers freeze
    /// (pause or complete) a session before saving it.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let clock = session.clock();
        let outcome = session.phase().outcome();
        Self {
            id: session.id(),
            username: session.username().to_string(),
            category: session.category().to_string(),
            rows: session.board().rows(),
            columns: session.board().columns(),
            cards: session.deck().iter().map(CardRecord::from).collect(),
            start_time: clock.start_time(),
            total_time_seconds: to_seconds(clock.total()),
            elapsed_seconds: to_seconds(clock.elapsed()),
            completed: outcome.is_some(),
            won: outcome.is_some_and(Outcome::is_win),
        }
    }

    /// Rebuild the session, Paused or Completed, with its clock frozen.
    pub fn into_session(self) -> Result<Session> {
        let board = BoardSize::new(self.rows, self.columns)
            .map_err(|e| GameError::CorruptRecord(e.to_string()))?;
        let deck = Deck::from_cards(self.cards.into_iter().map(Card::from))?;
        let total = from_seconds(self.total_time_seconds, "totalTimeSeconds")?;
        let total =
            check_allowance(total).map_err(|e| GameError::CorruptRecord(e.to_string()))?;
        let clock = Countdown::frozen(
            total,
            self.start_time,
            from_seconds(self.elapsed_seconds, "elapsedSeconds")?,
        );
        let outcome = self
            .completed
            .then_some(if self.won { Outcome::Won } else { Outcome::Lost });

        Session::restore(self.id, self.username, self.category, board, deck, clock, outcome)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON. Malformed input is a `CorruptRecord`.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn to_seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1_000.0
}

/// Decode a stored duration. Anything past the longest allowance is corrupt.
fn from_seconds(secs: f64, field: &str) -> Result<Duration> {
    let millis = (secs * 1_000.0).round();
    let max = (MAX_TOTAL_TIME_SECS * 1_000) as f64;
    if !millis.is_finite() || millis < 0.0 || millis > max {
        return Err(GameError::CorruptRecord(format!("{} out of range: {}", field, secs)));
    }
    Ok(Duration::milliseconds(millis as i64))
}
