//! Persistence: session snapshots and user profiles.
//!
//! Both stores are traits so the controller can run against memory in tests
//! and against JSON files in an application. Implementations take `&self`
//! and guard their state internally, so one store can be shared as
//! `Arc<dyn SessionStore>`.
//!
//! Every operation is atomic for a single caller: a failed write leaves the
//! previous record intact and can be retried as is.

pub mod json_file;
pub mod memory;
pub mod profile;
pub mod record;

pub use json_file::{AtomicJsonFile, JsonProfileStore, JsonSessionStore};
pub use memory::{MemoryProfileStore, MemorySessionStore};
pub use profile::{statistics, StatisticsRow, UserProfile};
pub use record::{CardRecord, SessionRecord};

use tracing::info;

use crate::core::{Result, SessionId};
use crate::session::Session;

/// Persists session snapshots keyed by session id.
pub trait SessionStore: Send + Sync {
    /// Write a snapshot, overwriting any previous one with the same id.
    fn save(&self, session: &Session) -> Result<SessionId>;

    /// Read a snapshot back. The session comes back Paused or Completed.
    fn load(&self, id: SessionId) -> Result<Session>;

    /// Remove a snapshot. `NotFound` if there was none.
    fn delete(&self, id: SessionId) -> Result<()>;
}

/// Persists user profiles keyed by username (case-sensitive).
pub trait ProfileStore: Send + Sync {
    fn get(&self, username: &str) -> Result<UserProfile>;

    /// Insert a new profile. `UserAlreadyExists` if the username is taken.
    fn create(&self, profile: UserProfile) -> Result<()>;

    /// Insert or replace.
    fn upsert(&self, profile: UserProfile) -> Result<()>;

    /// Atomic read-modify-write of one profile. Returns the updated profile.
    fn update(&self, username: &str, f: &mut dyn FnMut(&mut UserProfile)) -> Result<UserProfile>;

    /// Remove a profile without touching its sessions.
    fn remove(&self, username: &str) -> Result<UserProfile>;

    /// Every profile, in no particular order.
    fn list(&self) -> Result<Vec<UserProfile>>;

    /// Remove a profile and every session it owns.
    ///
    /// Sessions are deleted first; ones already gone are skipped. If a
    /// session delete fails the profile is kept, so the call can be retried.
    fn delete(&self, username: &str, sessions: &dyn SessionStore) -> Result<()> {
        let profile = self.get(username)?;
        for id in &profile.saved_session_ids {
            match sessions.delete(*id) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        self.remove(username)?;
        info!(
            username,
            sessions = profile.saved_session_ids.len(),
            "deleted user"
        );
        Ok(())
    }
}
