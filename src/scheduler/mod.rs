//! Deferred work on a virtual timeline.
//!
//! The engine never sleeps. Work that must happen "later" (flipping a
//! mismatched pair back after the cooldown) is queued here with a due
//! instant, and the controller drains whatever is due whenever it is
//! driven by a command or a tick.
//!
//! Tasks are owned by a session. Closing or replacing that session cancels
//! everything it owns, so a stale flip can never land on another game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CardId, SessionId};

/// Unique identifier for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Create a new task ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Work to run once a task is due.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferred {
    /// Turn a mismatched pair back face-down.
    FlipBack { first: CardId, second: CardId },
}

/// A queued task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TaskId,
    /// Session the task belongs to.
    pub owner: SessionId,
    pub due: DateTime<Utc>,
    pub action: Deferred,
}

/// Queue of deferred tasks, released in due order.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    /// Kept sorted by `(due, id)`, so ties release in scheduling order.
    tasks: Vec<ScheduledTask>,
    next_id: u32,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` for `owner`, due at `due`.
    pub fn schedule(&mut self, owner: SessionId, due: DateTime<Utc>, action: Deferred) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let index = self
            .tasks
            .partition_point(|t| (t.due, t.id) <= (due, id));
        self.tasks.insert(
            index,
            ScheduledTask {
                id,
                owner,
                due,
                action,
            },
        );
        id
    }

    /// Drop one task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Drop every task owned by `owner`, returning how many were dropped.
    pub fn cancel_owner(&mut self, owner: SessionId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledTask> {
        let split = self.tasks.partition_point(|t| t.due <= now);
        self.tasks.drain(..split).collect()
    }

    /// When the next task falls due, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.first().map(|t| t.due)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
