//! Persistence tests.
//!
//! These tests verify:
//! - Save -> load reproduces a session exactly in the persisted schema
//! - Stores report NotFound, StorageUnavailable and CorruptRecord distinctly
//! - Failed writes can be retried
//! - Deleting a user removes every session it owned

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use memory_match::{
    statistics, BoardSize, CategoryCatalog, DeckBuilder, GameError, GameRng, JsonProfileStore,
    JsonSessionStore, MemoryProfileStore, MemorySessionStore, Phase, ProfileStore, Reveal,
    Session, SessionId, SessionRecord, SessionStore, UserProfile,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap()
}

/// A paused 4x4 session with one pair matched and one card left face-up.
fn midgame(username: &str) -> Session {
    let board = BoardSize::new(4, 4).unwrap();
    let deck = DeckBuilder::new(CategoryCatalog::with_defaults(), GameRng::new(21))
        .build("Nature", board)
        .unwrap();
    let mut session =
        Session::new(username, "Nature", board, deck, Duration::seconds(120), t0()).unwrap();

    let first = session.deck().at(0).unwrap().clone();
    let partner = session.deck().iter().find(|c| first.pairs_with(c)).unwrap().id;
    session.reveal(first.id).unwrap();
    session.reveal(partner).unwrap();
    session.resolve(t0() + Duration::seconds(4)).unwrap();

    let stray = session.deck().iter().find(|c| !c.matched).unwrap().id;
    assert_eq!(session.reveal(stray).unwrap(), Reveal::FaceUp(stray));

    session.pause(t0() + Duration::milliseconds(37_250)).unwrap();
    session
}

fn round_trip(store: &dyn SessionStore) {
    let session = midgame("alice");
    let id = store.save(&session).unwrap();
    assert_eq!(id, session.id());

    let loaded = store.load(id).unwrap();
    assert_eq!(loaded.phase(), Phase::Paused);
    assert_eq!(loaded.username(), "alice");
    assert_eq!(loaded.board(), session.board());
    assert_eq!(loaded.clock().elapsed(), Duration::milliseconds(37_250));
    assert_eq!(loaded.clock().total(), Duration::seconds(120));
    assert_eq!(loaded.clock().start_time(), t0());
    assert!(loaded.selection().is_empty());

    // Same order and flags, except the unresolved reveal which comes back face-down
    for (before, after) in session.deck().iter().zip(loaded.deck().iter()) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.pair_id, after.pair_id);
        assert_eq!(before.face, after.face);
        assert_eq!(before.matched, after.matched);
        assert_eq!(after.revealed, after.matched);
    }

    // And the record itself is reproduced exactly
    assert_eq!(
        SessionRecord::from_session(&loaded),
        SessionRecord::from_session(&session)
    );
}

#[test]
fn test_memory_round_trip() {
    round_trip(&MemorySessionStore::new());
}

#[test]
fn test_json_round_trip() {
    let root = tempfile::tempdir().unwrap();
    round_trip(&JsonSessionStore::new(root.path()));
}

/// Test that re-saving a loaded session writes identical bytes.
#[test]
fn test_json_resave_is_byte_identical() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let id = store.save(&midgame("alice")).unwrap();
    let path = store.dir().join(format!("{}.json", id));
    let first = fs::read_to_string(&path).unwrap();

    store.save(&store.load(id).unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

/// Test the on-disk layout and key names.
#[test]
fn test_json_layout_and_schema() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let id = store.save(&midgame("alice")).unwrap();

    let text = fs::read_to_string(root.path().join("games").join(format!("{}.json", id))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["id"], serde_json::json!(id.to_string()));
    assert_eq!(value["rows"], 4);
    assert_eq!(value["columns"], 4);
    assert_eq!(value["cards"].as_array().unwrap().len(), 16);
    assert_eq!(value["elapsedSeconds"], serde_json::json!(37.25));
    assert_eq!(value["completed"], false);
    assert_eq!(value["won"], false);
    assert!(value["startTime"].as_str().unwrap().starts_with("2025-06-10T18:00:00"));
}

/// Test that saving the same session twice overwrites.
#[test]
fn test_save_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let session = midgame("alice");

    store.save(&session).unwrap();
    store.save(&session).unwrap();
    assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
}

/// Test missing sessions.
#[test]
fn test_not_found() {
    let root = tempfile::tempdir().unwrap();
    let stores: [Box<dyn SessionStore>; 2] = [
        Box::new(MemorySessionStore::new()),
        Box::new(JsonSessionStore::new(root.path())),
    ];
    for store in &stores {
        let id = SessionId::generate();
        assert!(store.load(id).unwrap_err().is_not_found());
        assert!(store.delete(id).unwrap_err().is_not_found());

        let saved = store.save(&midgame("bob")).unwrap();
        store.delete(saved).unwrap();
        assert!(store.load(saved).unwrap_err().is_not_found());
    }
}

/// Test that an unusable root reports StorageUnavailable and a retry succeeds.
#[test]
fn test_storage_unavailable_then_retry() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");
    fs::write(&root, b"not a directory").unwrap();

    let sessions = JsonSessionStore::new(&root);
    let profiles = JsonProfileStore::new(&root);
    let session = midgame("carol");

    assert!(sessions.save(&session).unwrap_err().is_storage_unavailable());
    assert!(sessions.load(session.id()).unwrap_err().is_storage_unavailable());
    assert!(profiles
        .create(UserProfile::new("carol", ""))
        .unwrap_err()
        .is_storage_unavailable());

    // The session value is untouched and the same calls now succeed
    assert_eq!(session.phase(), Phase::Paused);
    fs::remove_file(&root).unwrap();
    assert_eq!(sessions.save(&session).unwrap(), session.id());
    profiles.create(UserProfile::new("carol", "")).unwrap();
    assert_eq!(sessions.load(session.id()).unwrap().id(), session.id());
}

/// Test that a garbled session file is reported as corrupt.
#[test]
fn test_corrupt_file() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let id = store.save(&midgame("dave")).unwrap();
    let path = store.dir().join(format!("{}.json", id));

    fs::write(&path, "{\"id\": 12").unwrap();
    assert!(matches!(store.load(id), Err(GameError::CorruptRecord(_))));

    // Valid JSON, broken pairing
    let mut record = SessionRecord::from_session(&midgame("dave"));
    record.id = id;
    record.cards[1].pair_group_id = record.cards[0].pair_group_id;
    record.cards[2].pair_group_id = record.cards[0].pair_group_id;
    fs::write(&path, record.to_json().unwrap()).unwrap();
    assert!(matches!(store.load(id), Err(GameError::CorruptRecord(_))));
}

/// Test that times no clock can resume from are reported as corrupt.
#[test]
fn test_out_of_range_times_are_corrupt() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let session = midgame("erin");
    let id = store.save(&session).unwrap();
    let path = store.dir().join(format!("{}.json", id));

    for (total, elapsed) in [(2e13, 1e13), (120.0, 1e13), (f64::MAX, 1.0)] {
        let mut record = SessionRecord::from_session(&session);
        record.total_time_seconds = total;
        record.elapsed_seconds = elapsed;
        fs::write(&path, record.to_json().unwrap()).unwrap();
        assert!(
            matches!(store.load(id), Err(GameError::CorruptRecord(_))),
            "total {} elapsed {}",
            total,
            elapsed
        );
    }

    // The longest allowance still loads and resumes
    let mut record = SessionRecord::from_session(&session);
    record.total_time_seconds = 86_400.0;
    record.elapsed_seconds = 86_399.5;
    fs::write(&path, record.to_json().unwrap()).unwrap();
    let mut loaded = store.load(id).unwrap();
    let now = t0() + Duration::days(2);
    assert_eq!(loaded.resume(now).unwrap(), Phase::Active);
    assert_eq!(loaded.clock().remaining_at(now), Duration::milliseconds(500));
}

/// Test that a pair whose two cards disagree is reported as corrupt.
#[test]
fn test_inconsistent_pair_is_corrupt() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(root.path());
    let session = midgame("frank");
    let id = store.save(&session).unwrap();
    let path = store.dir().join(format!("{}.json", id));

    // One half of an unmatched pair marked matched
    let mut record = SessionRecord::from_session(&session);
    let lone = record.cards.iter().position(|c| !c.matched).unwrap();
    record.cards[lone].matched = true;
    fs::write(&path, record.to_json().unwrap()).unwrap();
    assert!(matches!(store.load(id), Err(GameError::CorruptRecord(_))));

    // Partners with different faces
    let mut record = SessionRecord::from_session(&session);
    let group = record.cards[0].pair_group_id;
    let partner = record
        .cards
        .iter()
        .rposition(|c| c.pair_group_id == group)
        .unwrap();
    record.cards[partner].face_ref = "elsewhere.png".into();
    fs::write(&path, record.to_json().unwrap()).unwrap();
    assert!(matches!(store.load(id), Err(GameError::CorruptRecord(_))));
}

fn cascade(profiles: &dyn ProfileStore, sessions: &dyn SessionStore) {
    profiles.create(UserProfile::new("alice", "a.png")).unwrap();
    profiles.create(UserProfile::new("bob", "b.png")).unwrap();

    let mut owned = Vec::new();
    for _ in 0..3 {
        let id = sessions.save(&midgame("alice")).unwrap();
        profiles
            .update("alice", &mut |p: &mut UserProfile| {
                p.add_session(id);
            })
            .unwrap();
        owned.push(id);
    }
    let bobs = sessions.save(&midgame("bob")).unwrap();

    // One of alice's sessions is already gone; the cascade skips it
    sessions.delete(owned[1]).unwrap();

    profiles.delete("alice", sessions).unwrap();
    for id in owned {
        assert!(sessions.load(id).unwrap_err().is_not_found());
    }
    assert!(profiles.get("alice").unwrap_err().is_not_found());
    assert!(sessions.load(bobs).is_ok());
    assert_eq!(profiles.list().unwrap().len(), 1);

    assert!(profiles.delete("alice", sessions).unwrap_err().is_not_found());
}

#[test]
fn test_memory_delete_cascades() {
    cascade(&MemoryProfileStore::new(), &MemorySessionStore::new());
}

#[test]
fn test_json_delete_cascades() {
    let root = tempfile::tempdir().unwrap();
    cascade(&JsonProfileStore::new(root.path()), &JsonSessionStore::new(root.path()));
}

/// Test the profile store contract on the file-backed store.
#[test]
fn test_json_profiles() {
    let root = tempfile::tempdir().unwrap();
    let store = JsonProfileStore::new(root.path());

    store.create(UserProfile::new("alice", "a.png")).unwrap();
    assert_eq!(
        store.create(UserProfile::new("alice", "x.png")).unwrap_err(),
        GameError::UserAlreadyExists("alice".into())
    );
    assert!(store.get("ALICE").unwrap_err().is_not_found());

    let updated = store
        .update("alice", &mut |p: &mut UserProfile| {
            p.games_played += 2;
            p.games_won += 1;
        })
        .unwrap();
    assert_eq!(updated.games_played, 2);

    store.upsert(UserProfile::new("bob", "")).unwrap();
    let reopened: Arc<dyn ProfileStore> = Arc::new(JsonProfileStore::new(root.path()));
    let rows = statistics(reopened.as_ref()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].username, "alice");
    assert!((rows[0].win_rate() - 0.5).abs() < f64::EPSILON);
    assert_eq!(rows[1].games_played, 0);

    let text = fs::read_to_string(root.path().join("users.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["gamesWon"], 1);
    assert_eq!(value[0]["avatarRef"], "a.png");
}
