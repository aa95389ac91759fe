//! Core engine types: identifiers, configuration, errors and RNG.
//!
//! Everything else in the crate builds on these; none of them know about
//! sessions or storage.

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;

pub use config::{BoardSize, GameSettings, MAX_COOLDOWN_MS, MAX_TOTAL_TIME_SECS};
pub use error::{GameError, Result};
pub use ids::{CardId, PairId, SessionId};
pub use rng::GameRng;
