//! # memory-match
//!
//! Engine for a timed memory-matching card game: build a shuffled deck of
//! face pairs, turn cards over two at a time, and find every pair before the
//! clock runs out.
//!
//! ## Design Principles
//!
//! 1. **No hidden time**: the engine never sleeps or spawns. Every entry point
//!    reads an injected `TimeSource`; elapsed time is recomputed from the
//!    session start timestamp, and deferred work (the mismatch cooldown) sits
//!    in a `Scheduler` drained by the next command or tick.
//!
//! 2. **Explicit wiring**: the `GameController` is handed its deck builder,
//!    stores and clock. There is no global state.
//!
//! 3. **Snapshots, not aliases**: stores keep encoded records. A load always
//!    produces a fresh `Session`, Paused or Completed.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: decks are `im::Vector`s, so cloning a
//!   session to snapshot it is cheap.
//!
//! - **Deterministic Shuffles**: `GameRng` is ChaCha8; a fixed seed in
//!   `GameSettings` reproduces decks exactly.
//!
//! ## Modules
//!
//! - `core`: ids, board size, settings, errors, RNG
//! - `cards`: cards, categories and the deck builder
//! - `clock`: countdown model and time sources
//! - `session`: the reveal/match state machine and its read model
//! - `scheduler`: deferred, cancellable tasks
//! - `store`: session and profile persistence (memory and JSON files)
//! - `controller`: the game lifecycle a UI drives
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::Duration;
//! use memory_match::{
//!     BoardSize, CardClick, CategoryCatalog, GameController, GameSettings, ManualClock,
//!     MemoryProfileStore, MemorySessionStore, ProfileStore, UserProfile,
//! };
//!
//! let profiles = Arc::new(MemoryProfileStore::new());
//! profiles.create(UserProfile::new("alice", "")).unwrap();
//!
//! let mut game = GameController::new(
//!     CategoryCatalog::with_defaults(),
//!     Arc::new(MemorySessionStore::new()),
//!     profiles,
//!     Arc::new(ManualClock::default()),
//!     GameSettings::default().with_seed(7),
//! );
//!
//! let view = game
//!     .start_new_game("alice", "Animals", BoardSize::new(2, 2).unwrap(), Duration::seconds(60))
//!     .unwrap();
//! let first = view.cards[0].id;
//! assert_eq!(game.handle_card_click(first).unwrap(), CardClick::FaceUp(first));
//! ```

pub mod core;
pub mod cards;
pub mod clock;
pub mod session;
pub mod scheduler;
pub mod store;
pub mod controller;

// Re-export commonly used types
pub use crate::core::{
    BoardSize, GameSettings, MAX_COOLDOWN_MS, MAX_TOTAL_TIME_SECS,
    GameError, Result,
    CardId, PairId, SessionId,
    GameRng,
};

pub use crate::cards::{Card, FaceRef, Category, CategoryCatalog, Deck, DeckBuilder, DEFAULT_CATEGORIES};

pub use crate::clock::{Countdown, TimeSource, SystemClock, ManualClock, format_mmss};

pub use crate::session::{
    Outcome, Phase, Session, SelectionBuffer,
    Reveal, Resolution, Ignored,
    SessionView, CardView,
};

pub use crate::scheduler::{Scheduler, ScheduledTask, TaskId, Deferred};

pub use crate::store::{
    SessionStore, ProfileStore,
    SessionRecord, CardRecord,
    UserProfile, StatisticsRow, statistics,
    MemorySessionStore, MemoryProfileStore,
    JsonSessionStore, JsonProfileStore, AtomicJsonFile,
};

pub use crate::controller::{GameController, CardClick};
