//! JSON file stores.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/users.json          every user profile
//! <root>/games/<id>.json     one session record each
//! ```
//!
//! Directories are created on first write. Each write serializes to a temp
//! file next to the target, syncs it and renames it over the target, so a
//! reader never sees a half-written file and a failed write leaves the
//! previous contents in place.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{ProfileStore, SessionRecord, SessionStore, UserProfile};
use crate::core::{GameError, Result, SessionId};
use crate::session::Session;

/// A JSON document replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file. `None` if it does not exist or is blank.
    pub fn load(&self) -> Result<Option<T>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Encode and write atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| GameError::storage(format!("{} has no parent", self.path.display())))?;
        fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(data)?;
        let tmp_path = self.temp_path()?;
        let result = write_synced(&tmp_path, json.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            warn!(path = %self.path.display(), error = %e, "atomic write failed");
            return Err(e.into());
        }
        Ok(())
    }

    /// Delete the file. Returns false if it did not exist.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| GameError::storage(format!("{} has no file name", self.path.display())))?;
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(name);
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Sessions as `<root>/games/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("games"),
        }
    }

    /// Directory holding the session files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, id: SessionId) -> AtomicJsonFile<SessionRecord> {
        AtomicJsonFile::new(self.dir.join(format!("{}.json", id)))
    }
}

impl SessionStore for JsonSessionStore {
    fn save(&self, session: &Session) -> Result<SessionId> {
        let record = SessionRecord::from_session(session);
        self.file(record.id).save(&record)?;
        debug!(session = %record.id, "saved session");
        Ok(record.id)
    }

    fn load(&self, id: SessionId) -> Result<Session> {
        let record = self
            .file(id)
            .load()?
            .ok_or_else(|| GameError::not_found("session", id))?;
        if record.id != id {
            return Err(GameError::CorruptRecord(format!(
                "file for {} holds session {}",
                id, record.id
            )));
        }
        record.into_session()
    }

    fn delete(&self, id: SessionId) -> Result<()> {
        if self.file(id).remove()? {
            debug!(session = %id, "deleted session");
            Ok(())
        } else {
            Err(GameError::not_found("session", id))
        }
    }
}

/// Every profile in `<root>/users.json`, as a list sorted by username.
#[derive(Debug)]
pub struct JsonProfileStore {
    file: AtomicJsonFile<Vec<UserProfile>>,
    // Serializes read-modify-write cycles on the shared file.
    lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            file: AtomicJsonFile::new(root.as_ref().join("users.json")),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn read_all(&self) -> Result<Vec<UserProfile>> {
        Ok(self.file.load()?.unwrap_or_default())
    }

    /// Load, apply `f`, and write back if `f` succeeds.
    fn modify<R>(&self, f: impl FnOnce(&mut Vec<UserProfile>) -> Result<R>) -> Result<R> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut profiles = self.read_all()?;
        let out = f(&mut profiles)?;
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        self.file.save(&profiles)?;
        Ok(out)
    }
}

impl ProfileStore for JsonProfileStore {
    fn get(&self, username: &str) -> Result<UserProfile> {
        self.read_all()?
            .into_iter()
            .find(|p| p.username == username)
            .ok_or_else(|| GameError::not_found("user", username))
    }

    fn create(&self, profile: UserProfile) -> Result<()> {
        self.modify(|profiles| {
            if profiles.iter().any(|p| p.username == profile.username) {
                return Err(GameError::UserAlreadyExists(profile.username));
            }
            info!(username = %profile.username, "created user");
            profiles.push(profile);
            Ok(())
        })
    }

    fn upsert(&self, profile: UserProfile) -> Result<()> {
        self.modify(|profiles| {
            match profiles.iter_mut().find(|p| p.username == profile.username) {
                Some(existing) => *existing = profile,
                None => profiles.push(profile),
            }
            Ok(())
        })
    }

    fn update(&self, username: &str, f: &mut dyn FnMut(&mut UserProfile)) -> Result<UserProfile> {
        self.modify(|profiles| {
            let profile = profiles
                .iter_mut()
                .find(|p| p.username == username)
                .ok_or_else(|| GameError::not_found("user", username))?;
            f(profile);
            Ok(profile.clone())
        })
    }

    fn remove(&self, username: &str) -> Result<UserProfile> {
        self.modify(|profiles| {
            let index = profiles
                .iter()
                .position(|p| p.username == username)
                .ok_or_else(|| GameError::not_found("user", username))?;
            Ok(profiles.remove(index))
        })
    }

    fn list(&self) -> Result<Vec<UserProfile>> {
        self.read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let file: AtomicJsonFile<Vec<u32>> = AtomicJsonFile::new(dir.path().join("nope.json"));
        assert_eq!(file.load().unwrap(), None);
        assert!(!file.remove().unwrap());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let file = AtomicJsonFile::new(&path);

        file.save(&vec![1u32, 2, 3]).unwrap();
        assert_eq!(file.load().unwrap(), Some(vec![1, 2, 3]));

        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("data.json")]);
    }

    #[test]
    fn test_garbage_is_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let file: AtomicJsonFile<Vec<u32>> = AtomicJsonFile::new(&path);
        assert!(matches!(file.load(), Err(GameError::CorruptRecord(_))));
    }

    #[test]
    fn test_profiles_persist_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path());
        store.create(UserProfile::new("zoe", "")).unwrap();
        store.create(UserProfile::new("adam", "")).unwrap();

        let reopened = JsonProfileStore::new(dir.path());
        let names: Vec<_> = reopened.list().unwrap().into_iter().map(|p| p.username).collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }
}
