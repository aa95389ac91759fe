//! Session state machine tests.
//!
//! These tests verify:
//! - Matches are permanent and a full board wins exactly once
//! - Clicks that cannot change state are reported and ignored
//! - Expiry always loses, even with a pair waiting on the cooldown
//! - Pausing freezes the clock for any length of time

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use memory_match::{
    BoardSize, CardId, CategoryCatalog, DeckBuilder, GameError, GameRng, Ignored, Outcome, Phase,
    Resolution, Reveal, Session,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
}

fn new_session(board: BoardSize, seed: u64, secs: i64) -> Session {
    let deck = DeckBuilder::new(CategoryCatalog::with_defaults(), GameRng::new(seed))
        .build("Animals", board)
        .unwrap();
    Session::new("alice", "Animals", board, deck, Duration::seconds(secs), t0()).unwrap()
}

/// Card ids grouped by pair, in board order of the first card.
fn pairs(session: &Session) -> Vec<(CardId, CardId)> {
    let mut out: Vec<(CardId, CardId)> = Vec::new();
    for card in session.deck().iter() {
        if out.iter().any(|&(a, b)| a == card.id || b == card.id) {
            continue;
        }
        let partner = session.deck().iter().find(|c| card.pairs_with(c)).unwrap();
        out.push((card.id, partner.id));
    }
    out
}

/// Click one card; resolve and flip back immediately on a mismatch.
/// Returns true if this click won the game.
fn click(session: &mut Session, card: CardId, now: DateTime<Utc>) -> bool {
    match session.reveal(card).unwrap() {
        Reveal::PairReady(first, second) => match session.resolve(now).unwrap() {
            Resolution::Matched { won, .. } => won,
            Resolution::Mismatched { .. } => {
                assert!(session.flip_back(first, second));
                false
            }
        },
        _ => false,
    }
}

/// The 4x4 scenario: 16 cards, 8 pairs, matched one pair at a time.
#[test]
fn test_alice_4x4_scenario() {
    let board = BoardSize::new(4, 4).unwrap();
    let mut session = new_session(board, 11, 120);
    assert_eq!(session.deck().len(), 16);

    let pairs = pairs(&session);
    assert_eq!(pairs.len(), 8);

    let now = t0() + Duration::seconds(30);
    for (i, &(a, b)) in pairs.iter().enumerate() {
        assert_eq!(session.reveal(a).unwrap(), Reveal::FaceUp(a));
        assert_eq!(session.reveal(b).unwrap(), Reveal::PairReady(a, b));

        let won = i == pairs.len() - 1;
        assert!(matches!(
            session.resolve(now).unwrap(),
            Resolution::Matched { won: w, .. } if w == won
        ));
        assert!(session.deck().get(a).unwrap().matched);
        assert!(session.deck().get(b).unwrap().matched);
    }

    assert_eq!(session.phase(), Phase::Completed(Outcome::Won));
    assert_eq!(session.clock().elapsed(), Duration::seconds(30));
    assert!(!session.clock().is_running());
}

/// Test that a finished game rejects further play.
#[test]
fn test_completed_session_is_terminal() {
    let mut session = new_session(BoardSize::new(2, 2).unwrap(), 3, 60);
    for (a, b) in pairs(&session) {
        click(&mut session, a, t0());
        click(&mut session, b, t0());
    }
    assert!(session.phase().is_completed());

    let card = session.deck().at(0).unwrap().id;
    assert!(matches!(
        session.reveal(card),
        Err(GameError::InvalidTransition { action: "reveal", .. })
    ));
    assert!(session.tick(t0() + Duration::hours(1)).is_err());
    assert!(session.pause(t0()).is_err());
    assert_eq!(session.phase(), Phase::Completed(Outcome::Won));
}

/// Test that ignored clicks leave the deck untouched.
#[test]
fn test_ignored_clicks_change_nothing() {
    let mut session = new_session(BoardSize::new(2, 3).unwrap(), 9, 60);
    let pairs = pairs(&session);
    let (a, b) = pairs[0];
    let (c, _) = pairs[1];

    click(&mut session, a, t0());
    click(&mut session, b, t0());
    let matched = session.deck().clone();
    assert_eq!(session.reveal(a).unwrap(), Reveal::Ignored(Ignored::AlreadyMatched));
    assert_eq!(session.deck(), &matched);

    session.reveal(c).unwrap();
    let one_up = session.deck().clone();
    assert_eq!(session.reveal(c).unwrap(), Reveal::Ignored(Ignored::AlreadyRevealed));
    assert_eq!(session.deck(), &one_up);
    assert_eq!(session.selection(), &[c]);
}

/// Test expiry while a mismatched pair waits for the cooldown.
#[test]
fn test_expiry_mid_cooldown_loses() {
    let mut session = new_session(BoardSize::new(2, 2).unwrap(), 4, 10);
    let pairs = pairs(&session);
    let (a, _) = pairs[0];
    let (c, _) = pairs[1];

    session.reveal(a).unwrap();
    session.reveal(c).unwrap();
    assert!(matches!(session.resolve(t0()).unwrap(), Resolution::Mismatched { .. }));

    assert_eq!(session.tick(t0() + Duration::seconds(9)).unwrap(), None);
    assert_eq!(
        session.tick(t0() + Duration::seconds(10)).unwrap(),
        Some(Outcome::Lost)
    );
    assert_eq!(session.phase(), Phase::Completed(Outcome::Lost));
    assert!(session.deck().iter().all(|card| !card.revealed));
    assert_eq!(session.clock().elapsed(), Duration::seconds(10));

    // The cooldown flip arriving late finds nothing to do
    assert!(!session.flip_back(a, c));
}

/// Test that a flip-back runs against a paused session without touching the clock.
#[test]
fn test_flip_back_while_paused() {
    let mut session = new_session(BoardSize::new(2, 2).unwrap(), 4, 60);
    let pairs = pairs(&session);
    let (a, _) = pairs[0];
    let (c, _) = pairs[1];
    session.reveal(a).unwrap();
    session.reveal(c).unwrap();
    session.resolve(t0()).unwrap();

    session.pause(t0() + Duration::milliseconds(400)).unwrap();
    assert!(session.flip_back(a, c));

    assert_eq!(session.phase(), Phase::Paused);
    assert!(!session.deck().get(a).unwrap().revealed);
    assert_eq!(
        session.clock().elapsed_at(t0() + Duration::minutes(10)),
        Duration::milliseconds(400)
    );
}

proptest! {
    /// Any click order ends in exactly one win.
    #[test]
    fn prop_any_click_order_wins_once(
        seed in any::<u64>(),
        board_index in 0usize..21,
        clicks in prop::collection::vec(0usize..36, 0..200),
    ) {
        let board = BoardSize::all().nth(board_index).unwrap();
        let mut session = new_session(board, seed, 600);
        let cards = board.card_count();
        let mut wins = 0;

        for index in clicks {
            if session.phase().is_completed() {
                break;
            }
            let id = session.deck().at(index % cards).unwrap().id;
            if click(&mut session, id, t0()) {
                wins += 1;
            }
        }
        // A lone face-up card from the random clicks: finish its pair first
        if let Some(&lone) = session.selection().first() {
            let pair = session.deck().get(lone).unwrap().pair_id;
            let partner = session
                .deck()
                .iter()
                .find(|c| c.pair_id == pair && c.id != lone)
                .unwrap()
                .id;
            if click(&mut session, partner, t0()) {
                wins += 1;
            }
        }
        // Then every remaining pair in turn
        for (a, b) in pairs(&session) {
            if session.deck().get(a).unwrap().matched {
                continue;
            }
            click(&mut session, a, t0());
            if click(&mut session, b, t0()) {
                wins += 1;
            }
        }

        prop_assert_eq!(wins, 1);
        prop_assert_eq!(session.phase(), Phase::Completed(Outcome::Won));
        prop_assert!(session.deck().iter().all(|c| c.matched && c.revealed));
    }

    /// Remaining time after pause/resume ignores how long the pause lasted.
    #[test]
    fn prop_pause_duration_is_free(
        before_ms in 0i64..59_000,
        paused_ms in 0i64..10_000_000,
        after_ms in 0i64..1_000,
    ) {
        let mut session = new_session(BoardSize::new(2, 2).unwrap(), 1, 60);
        let paused_at = t0() + Duration::milliseconds(before_ms);
        session.pause(paused_at).unwrap();

        let resumed_at = paused_at + Duration::milliseconds(paused_ms);
        prop_assert_eq!(session.resume(resumed_at).unwrap(), Phase::Active);

        let later = resumed_at + Duration::milliseconds(after_ms);
        prop_assert_eq!(
            session.clock().remaining_at(later),
            Duration::milliseconds(60_000 - before_ms - after_ms).max(Duration::zero())
        );
    }
}
