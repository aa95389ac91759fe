//! Game configuration: board dimensions and engine settings.
//!
//! ## BoardSize
//!
//! Validated at construction and never mutated afterwards:
//! each side in `2..=6`, and an even card count so every card has a partner.
//!
//! ```
//! use memory_match::core::BoardSize;
//!
//! let board = BoardSize::new(4, 4).unwrap();
//! assert_eq!(board.card_count(), 16);
//! assert_eq!(board.pair_count(), 8);
//!
//! assert!(BoardSize::new(3, 3).is_err()); // 9 cards
//! assert!(BoardSize::new(1, 4).is_err());
//! ```

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{GameError, Result};

/// Board dimensions (rows x columns).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBoardSize")]
pub struct BoardSize {
    rows: u8,
    columns: u8,
}

impl BoardSize {
    /// Smallest allowed side.
    pub const MIN_SIDE: u8 = 2;
    /// Largest allowed side.
    pub const MAX_SIDE: u8 = 6;

    /// Validate and create a board size.
    pub fn new(rows: u8, columns: u8) -> Result<Self> {
        let side_ok = |n: u8| (Self::MIN_SIDE..=Self::MAX_SIDE).contains(&n);
        let count = usize::from(rows) * usize::from(columns);

        if !side_ok(rows) || !side_ok(columns) || count % 2 != 0 {
            return Err(GameError::InvalidBoardSize { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    #[must_use]
    pub const fn rows(self) -> u8 {
        self.rows
    }

    #[must_use]
    pub const fn columns(self) -> u8 {
        self.columns
    }

    /// Number of cards on the board.
    #[must_use]
    pub const fn card_count(self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Number of pairs on the board.
    #[must_use]
    pub const fn pair_count(self) -> usize {
        self.card_count() / 2
    }

    /// Every valid board size, row-major.
    pub fn all() -> impl Iterator<Item = BoardSize> {
        (Self::MIN_SIDE..=Self::MAX_SIDE).flat_map(|rows| {
            (Self::MIN_SIDE..=Self::MAX_SIDE).filter_map(move |columns| Self::new(rows, columns).ok())
        })
    }
}

#[derive(Deserialize)]
struct RawBoardSize {
    rows: u8,
    columns: u8,
}

impl TryFrom<RawBoardSize> for BoardSize {
    type Error = GameError;

    fn try_from(raw: RawBoardSize) -> Result<Self> {
        Self::new(raw.rows, raw.columns)
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self { rows: 4, columns: 4 }
    }
}

impl std::fmt::Display for BoardSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// Longest mismatch cooldown, in milliseconds.
pub const MAX_COOLDOWN_MS: u64 = 60_000;

/// Longest time allowance for one session, in seconds.
pub const MAX_TOTAL_TIME_SECS: u64 = 24 * 60 * 60;

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Delay before a mismatched pair flips back face-down, in milliseconds.
    /// At most [`MAX_COOLDOWN_MS`].
    #[serde(deserialize_with = "cooldown_in_range")]
    pub cooldown_ms: u64,

    /// Board used when the caller does not pick one.
    pub default_board: BoardSize,

    /// Time allowance used when the caller does not pick one, in seconds.
    /// At most [`MAX_TOTAL_TIME_SECS`].
    #[serde(deserialize_with = "time_in_range")]
    pub default_time_secs: u64,

    /// Seed for deck shuffling. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 1_000,
            default_board: BoardSize::default(),
            default_time_secs: 120,
            seed: None,
        }
    }
}

impl GameSettings {
    /// Set the mismatch cooldown.
    pub fn with_cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    /// Set the default board.
    pub fn with_default_board(mut self, board: BoardSize) -> Self {
        self.default_board = board;
        self
    }

    /// Set the default time allowance.
    pub fn with_default_time_secs(mut self, secs: u64) -> Self {
        self.default_time_secs = secs;
        self
    }

    /// Fix the shuffle seed for reproducible decks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Mismatch cooldown as a duration, capped at [`MAX_COOLDOWN_MS`].
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::milliseconds(self.cooldown_ms.min(MAX_COOLDOWN_MS) as i64)
    }

    /// Default time allowance as a duration, capped at [`MAX_TOTAL_TIME_SECS`].
    #[must_use]
    pub fn default_total_time(&self) -> Duration {
        Duration::seconds(self.default_time_secs.min(MAX_TOTAL_TIME_SECS) as i64)
    }
}

fn cooldown_in_range<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    if ms > MAX_COOLDOWN_MS {
        return Err(serde::de::Error::custom(format!(
            "cooldown_ms {} exceeds {}",
            ms, MAX_COOLDOWN_MS
        )));
    }
    Ok(ms)
}

fn time_in_range<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 || secs > MAX_TOTAL_TIME_SECS {
        return Err(serde::de::Error::custom(format!(
            "default_time_secs {} outside 1..={}",
            secs, MAX_TOTAL_TIME_SECS
        )));
    }
    Ok(secs)
}
