//! In-memory stores.
//!
//! Sessions are kept as encoded records, not live `Session` values, so a
//! load always yields a fresh session that goes through the same decoding
//! and validation as a file-backed load.

use std::sync::RwLock;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{ProfileStore, SessionRecord, SessionStore, UserProfile};
use crate::core::{GameError, Result, SessionId};
use crate::session::Session;

fn poisoned(store: &str) -> GameError {
    GameError::storage(format!("{} lock poisoned", store))
}

/// Session snapshots held in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: RwLock<FxHashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> Result<usize> {
        Ok(self.records.read().map_err(|_| poisoned("session store"))?.len())
    }

    /// The raw record for `id`, if stored.
    pub fn record(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        let records = self.records.read().map_err(|_| poisoned("session store"))?;
        Ok(records.get(&id).cloned())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<SessionId> {
        let record = SessionRecord::from_session(session);
        let id = record.id;
        self.records
            .write()
            .map_err(|_| poisoned("session store"))?
            .insert(id, record);
        debug!(session = %id, "saved session in memory");
        Ok(id)
    }

    fn load(&self, id: SessionId) -> Result<Session> {
        let record = self
            .record(id)?
            .ok_or_else(|| GameError::not_found("session", id))?;
        record.into_session()
    }

    fn delete(&self, id: SessionId) -> Result<()> {
        self.records
            .write()
            .map_err(|_| poisoned("session store"))?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| GameError::not_found("session", id))
    }
}

/// User profiles held in memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<FxHashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, username: &str) -> Result<UserProfile> {
        let profiles = self.profiles.read().map_err(|_| poisoned("profile store"))?;
        profiles
            .get(username)
            .cloned()
            .ok_or_else(|| GameError::not_found("user", username))
    }

    fn create(&self, profile: UserProfile) -> Result<()> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profile store"))?;
        if profiles.contains_key(&profile.username) {
            return Err(GameError::UserAlreadyExists(profile.username));
        }
        profiles.insert(profile.username.clone(), profile);
        Ok(())
    }

    fn upsert(&self, profile: UserProfile) -> Result<()> {
        self.profiles
            .write()
            .map_err(|_| poisoned("profile store"))?
            .insert(profile.username.clone(), profile);
        Ok(())
    }

    fn update(&self, username: &str, f: &mut dyn FnMut(&mut UserProfile)) -> Result<UserProfile> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profile store"))?;
        let profile = profiles
            .get_mut(username)
            .ok_or_else(|| GameError::not_found("user", username))?;
        f(profile);
        Ok(profile.clone())
    }

    fn remove(&self, username: &str) -> Result<UserProfile> {
        self.profiles
            .write()
            .map_err(|_| poisoned("profile store"))?
            .remove(username)
            .ok_or_else(|| GameError::not_found("user", username))
    }

    fn list(&self) -> Result<Vec<UserProfile>> {
        let profiles = self.profiles.read().map_err(|_| poisoned("profile store"))?;
        Ok(profiles.values().cloned().collect())
    }
}
