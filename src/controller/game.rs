//! Game controller: the lifecycle surface a UI drives.
//!
//! ## Commands
//!
//! - `start_new_game`: build a deck and start an Active session
//! - `open_saved_game`: load a snapshot and resume it
//! - `save_current_game`: pause and persist, recording the id on the profile
//! - `handle_card_click`: reveal, resolve, schedule the cooldown flip
//! - `complete_game`: persist a finished session and update the counters
//!
//! `tick` and `close` are the two lifecycle events around them. Every entry
//! point first runs deferred tasks that have fallen due, so the controller
//! behaves the same whether a UI ticks every 100 ms or once a minute.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::cards::{CategoryCatalog, DeckBuilder};
use crate::clock::TimeSource;
use crate::core::{BoardSize, CardId, GameError, GameRng, GameSettings, Result, SessionId};
use crate::scheduler::{Deferred, Scheduler};
use crate::session::{Ignored, Outcome, Resolution, Reveal, Session, SessionView};
use crate::store::{statistics, ProfileStore, SessionStore, StatisticsRow, UserProfile};

/// What a card click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardClick {
    /// First card of a pair turned face-up.
    FaceUp(CardId),
    /// The pair matched. `won` is set when it was the last one.
    Matched { won: bool },
    /// The pair did not match; both flip back at `flip_at`.
    Mismatched { flip_at: DateTime<Utc> },
    /// The click changed nothing.
    Ignored(Ignored),
    /// Time had already run out; the game is now lost.
    TimeUp,
}

/// The session the controller is driving.
#[derive(Debug)]
struct Live {
    session: Session,
    /// Set once `complete_game` has written the outcome to the profile.
    committed: bool,
}

/// Orchestrates deck building, the live session, deferred tasks and the stores.
pub struct GameController {
    deck_builder: DeckBuilder,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    time: Arc<dyn TimeSource>,
    settings: GameSettings,
    scheduler: Scheduler,
    current: Option<Live>,
}

impl GameController {
    pub fn new(
        catalog: CategoryCatalog,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        time: Arc<dyn TimeSource>,
        settings: GameSettings,
    ) -> Self {
        let rng = GameRng::from_seed_or_entropy(settings.seed);
        Self {
            deck_builder: DeckBuilder::new(catalog, rng),
            sessions,
            profiles,
            time,
            settings,
            scheduler: Scheduler::new(),
            current: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        self.deck_builder.catalog()
    }

    // === Commands ===

    /// Start a new game for an existing user.
    ///
    /// Refused while the current session is Active; save or `close` it
    /// first. A Paused or Completed session is replaced. `total_time` must
    /// be positive and at most `MAX_TOTAL_TIME_SECS`.
    pub fn start_new_game(
        &mut self,
        username: &str,
        category: &str,
        board: BoardSize,
        total_time: Duration,
    ) -> Result<SessionView> {
        self.require_replaceable("start")?;
        self.profiles.get(username)?;
        let deck = self.deck_builder.build(category, board)?;

        let now = self.time.now();
        let session = Session::new(username, category, board, deck, total_time, now)?;
        info!(session = %session.id(), username, category, %board, "started game");
        self.replace_current(session, false);
        self.view_at(now)
    }

    /// `start_new_game` with the configured board and time allowance.
    pub fn start_default_game(&mut self, username: &str, category: &str) -> Result<SessionView> {
        let board = self.settings.default_board;
        let total_time = self.settings.default_total_time();
        self.start_new_game(username, category, board, total_time)
    }

    /// Load a saved session and resume it.
    ///
    /// Refused while the current session is Active, like `start_new_game`.
    /// A finished record cannot be reopened. A record with no time left
    /// resumes straight into a loss, which is committed immediately.
    pub fn open_saved_game(&mut self, id: SessionId) -> Result<SessionView> {
        self.require_replaceable("open")?;
        let mut session = self.sessions.load(id)?;
        if session.phase().is_completed() {
            return Err(GameError::invalid_transition("open", session.phase()));
        }

        let now = self.time.now();
        let phase = session.resume(now)?;
        info!(session = %id, %phase, "opened saved game");
        self.replace_current(session, false);

        if phase.is_completed() {
            self.complete_game()?;
        }
        self.view_at(now)
    }

    /// Pause the current session and persist it.
    ///
    /// The session stays Paused afterwards; reopen it to continue. Not
    /// allowed once the session is completed. On failure the in-memory
    /// session is left untouched and the call can be retried.
    pub fn save_current_game(&mut self) -> Result<SessionId> {
        let now = self.time.now();
        self.run_due(now);

        let live = self
            .current
            .as_mut()
            .ok_or_else(|| GameError::invalid_transition("save", "idle"))?;
        if live.session.phase().is_completed() {
            return Err(GameError::invalid_transition("save", live.session.phase()));
        }

        let mut snapshot = live.session.clone();
        if snapshot.phase().is_active() {
            snapshot.pause(now)?;
        }
        let id = self.sessions.save(&snapshot)?;
        self.profiles.update(snapshot.username(), &mut |p: &mut UserProfile| {
            p.add_session(id);
        })?;

        live.session = snapshot;
        info!(session = %id, "saved game");
        Ok(id)
    }

    /// Handle a click on a card.
    pub fn handle_card_click(&mut self, card: CardId) -> Result<CardClick> {
        let now = self.time.now();
        self.run_due(now);

        let live = self
            .current
            .as_mut()
            .ok_or_else(|| GameError::invalid_transition("reveal", "idle"))?;
        let session = &mut live.session;

        if session.phase().is_active() && session.clock().is_expired_at(now) {
            session.tick(now)?;
            self.complete_game()?;
            return Ok(CardClick::TimeUp);
        }

        // Checked before anything changes, so a failure leaves the session as is
        let cooldown = self.settings.cooldown();
        let flip_at = now.checked_add_signed(cooldown).ok_or_else(|| {
            GameError::InvalidTime(format!(
                "flip-back {}ms after {}",
                cooldown.num_milliseconds(),
                now
            ))
        })?;

        let (first, second) = match session.reveal(card)? {
            Reveal::FaceUp(id) => return Ok(CardClick::FaceUp(id)),
            Reveal::Ignored(reason) => return Ok(CardClick::Ignored(reason)),
            Reveal::PairReady(first, second) => (first, second),
        };

        match session.resolve(now)? {
            Resolution::Matched { pair, won } => {
                debug!(session = %session.id(), %pair, "pair matched");
                if won {
                    self.complete_game()?;
                }
                Ok(CardClick::Matched { won })
            }
            Resolution::Mismatched { .. } => {
                self.scheduler
                    .schedule(session.id(), flip_at, Deferred::FlipBack { first, second });
                Ok(CardClick::Mismatched { flip_at })
            }
        }
    }

    /// Commit a finished session: persist its terminal snapshot, then count
    /// it on the owner's profile.
    ///
    /// Safe to retry after a storage failure; the profile is only counted
    /// once per session.
    pub fn complete_game(&mut self) -> Result<Outcome> {
        let live = self
            .current
            .as_mut()
            .ok_or_else(|| GameError::invalid_transition("complete", "idle"))?;
        let outcome = live
            .session
            .phase()
            .outcome()
            .ok_or_else(|| GameError::invalid_transition("complete", live.session.phase()))?;
        if live.committed {
            return Ok(outcome);
        }

        let id = self.sessions.save(&live.session)?;
        self.profiles.update(live.session.username(), &mut |p: &mut UserProfile| {
            p.record_outcome(outcome);
            p.add_session(id);
        })?;
        live.committed = true;

        self.scheduler.cancel_owner(id);
        info!(session = %id, username = live.session.username(), ?outcome, "completed game");
        Ok(outcome)
    }

    // === Lifecycle events ===

    /// Periodic clock event. Runs due deferred tasks, then checks the clock.
    ///
    /// Returns `Some(Lost)` on the tick that ran out the time.
    pub fn tick(&mut self) -> Result<Option<Outcome>> {
        let now = self.time.now();
        self.run_due(now);

        let Some(live) = self.current.as_mut() else {
            return Ok(None);
        };
        if !live.session.phase().is_active() {
            return Ok(None);
        }
        match live.session.tick(now)? {
            Some(outcome) => {
                self.complete_game()?;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    /// Drop the current session without saving, cancelling its deferred tasks.
    pub fn close(&mut self) -> Option<SessionId> {
        let live = self.current.take()?;
        let id = live.session.id();
        let cancelled = self.scheduler.cancel_owner(id);
        debug!(session = %id, cancelled, "closed session");
        Some(id)
    }

    // === Read access ===

    /// Read model of the current session.
    #[must_use]
    pub fn current(&self) -> Option<SessionView> {
        let now = self.time.now();
        self.current.as_ref().map(|live| live.session.view(now))
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref().map(|live| &live.session)
    }

    /// When the next deferred task falls due, for scheduling a UI timer.
    #[must_use]
    pub fn next_deferred(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_due()
    }

    /// Statistics for every user.
    pub fn statistics(&self) -> Result<Vec<StatisticsRow>> {
        statistics(self.profiles.as_ref())
    }

    // === Helpers ===

    /// A new session may only replace one that is not being played.
    fn require_replaceable(&self, action: &'static str) -> Result<()> {
        match &self.current {
            Some(live) if live.session.phase().is_active() => {
                Err(GameError::invalid_transition(action, live.session.phase()))
            }
            _ => Ok(()),
        }
    }

    fn replace_current(&mut self, session: Session, committed: bool) {
        self.close();
        self.current = Some(Live { session, committed });
    }

    fn view_at(&self, now: DateTime<Utc>) -> Result<SessionView> {
        self.current
            .as_ref()
            .map(|live| live.session.view(now))
            .ok_or_else(|| GameError::invalid_transition("view", "idle"))
    }

    /// Run every deferred task due at `now`.
    fn run_due(&mut self, now: DateTime<Utc>) {
        for task in self.scheduler.take_due(now) {
            let Deferred::FlipBack { first, second } = task.action;
            match self.current.as_mut() {
                Some(live) if live.session.id() == task.owner => {
                    let flipped = live.session.flip_back(first, second);
                    debug!(session = %task.owner, task = %task.id, flipped, "flip-back fired");
                }
                _ => debug!(session = %task.owner, task = %task.id, "discarded stale flip-back"),
            }
        }
    }
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("settings", &self.settings)
            .field("scheduler", &self.scheduler)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
