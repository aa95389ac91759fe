//! Deck builder tests.
//!
//! These tests verify:
//! - Every valid board gets a complete, correctly paired deck
//! - Card positions and face choices are uniformly distributed
//! - Invalid boards and short categories are rejected

use proptest::prelude::*;
use rustc_hash::FxHashMap;

use memory_match::{
    BoardSize, Category, CategoryCatalog, Deck, DeckBuilder, FaceRef, GameError, GameRng, PairId,
    DEFAULT_CATEGORIES,
};

fn builder(seed: u64) -> DeckBuilder {
    DeckBuilder::new(CategoryCatalog::with_defaults(), GameRng::new(seed))
}

fn assert_paired(deck: &Deck, board: BoardSize) {
    assert_eq!(deck.len(), board.card_count());

    let mut counts: FxHashMap<PairId, Vec<&FaceRef>> = FxHashMap::default();
    for card in deck.iter() {
        counts.entry(card.pair_id).or_default().push(&card.face);
    }
    assert_eq!(counts.len(), board.pair_count());
    for faces in counts.values() {
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], faces[1]);
    }

    // Distinct pairs never share a face
    let mut faces: Vec<_> = counts.values().map(|f| f[0]).collect();
    faces.sort();
    faces.dedup();
    assert_eq!(faces.len(), board.pair_count());
}

/// Pearson chi-square statistic against a uniform expectation.
fn chi_square(observed: &[u32]) -> f64 {
    let total: u32 = observed.iter().sum();
    let expected = f64::from(total) / observed.len() as f64;
    observed
        .iter()
        .map(|&o| {
            let d = f64::from(o) - expected;
            d * d / expected
        })
        .sum()
}

/// Test every valid board in every built-in category.
#[test]
fn test_all_boards_all_categories() {
    let mut builder = builder(2024);
    assert_eq!(BoardSize::all().count(), 21);

    for category in DEFAULT_CATEGORIES {
        for board in BoardSize::all() {
            let deck = builder.build(category, board).unwrap();
            assert_paired(&deck, board);
            assert!(deck.iter().all(|c| !c.revealed && !c.matched));
        }
    }
}

/// Test invalid board dimensions.
#[test]
fn test_invalid_boards() {
    for (rows, columns) in [(1, 2), (7, 2), (3, 3), (5, 5), (0, 0), (2, 7)] {
        assert_eq!(
            BoardSize::new(rows, columns),
            Err(GameError::InvalidBoardSize { rows, columns })
        );
    }
}

/// Test that the largest board fits the built-in categories exactly.
#[test]
fn test_largest_board_uses_every_face() {
    let board = BoardSize::new(6, 6).unwrap();
    let deck = builder(1).build("Nature", board).unwrap();
    let catalog = CategoryCatalog::with_defaults();
    let category = catalog.get("Nature").unwrap();

    for face in category.faces() {
        assert_eq!(deck.iter().filter(|c| &c.face == face).count(), 2);
    }
}

/// Test that a category with too few faces is rejected for larger boards.
#[test]
fn test_short_category() {
    let mut catalog = CategoryCatalog::new();
    catalog.register(Category::new("Pets", ["cat.png", "dog.png", "fish.png", "cat.png"]));
    let mut builder = DeckBuilder::new(catalog, GameRng::new(3));

    // Duplicate faces do not count
    assert!(builder.build("Pets", BoardSize::new(2, 3).unwrap()).is_ok());
    assert_eq!(
        builder.build("Pets", BoardSize::new(2, 4).unwrap()),
        Err(GameError::CategoryNotFound {
            name: "Pets".into(),
            needed: 4
        })
    );
}

/// Test that each card lands in each position equally often.
#[test]
fn test_position_distribution_uniform() {
    let board = BoardSize::new(2, 2).unwrap();
    let mut builder = builder(77);
    let trials = 8_000;

    // Where the first-created card ends up
    let mut positions = [0u32; 4];
    for _ in 0..trials {
        let deck = builder.build("Animals", board).unwrap();
        let index = deck.iter().position(|c| c.id.raw() == 0).unwrap();
        positions[index] += 1;
    }

    // 3 degrees of freedom, p = 0.001
    let stat = chi_square(&positions);
    assert!(stat < 16.27, "positions {:?}, chi2 {}", positions, stat);
}

/// Test that every face of a category is chosen equally often.
#[test]
fn test_face_selection_uniform() {
    let board = BoardSize::new(2, 2).unwrap();
    let mut builder = builder(5);
    let catalog = CategoryCatalog::with_defaults();
    let faces = catalog.get("Food").unwrap().faces();
    let trials = 9_000;

    let mut counts = vec![0u32; faces.len()];
    for _ in 0..trials {
        let deck = builder.build("Food", board).unwrap();
        for card in deck.iter().filter(|c| c.id.raw() % 2 == 0) {
            let index = faces.iter().position(|f| *f == card.face).unwrap();
            counts[index] += 1;
        }
    }

    // 17 degrees of freedom, p = 0.001
    let stat = chi_square(&counts);
    assert!(stat < 40.79, "counts {:?}, chi2 {}", counts, stat);
}

/// Test loading categories from a directory of images.
#[test]
fn test_catalog_from_directory() {
    let root = tempfile::tempdir().unwrap();
    let pets = root.path().join("Pets");
    std::fs::create_dir(&pets).unwrap();
    for name in ["a.png", "b.JPG", "c.gif", "notes.txt"] {
        std::fs::write(pets.join(name), b"").unwrap();
    }
    std::fs::create_dir(root.path().join("Empty")).unwrap();

    let catalog = CategoryCatalog::load_dir(root.path()).unwrap();
    assert_eq!(catalog.names(), vec!["Pets"]);
    assert_eq!(catalog.get("Pets").unwrap().len(), 3);

    let deck = DeckBuilder::new(catalog, GameRng::new(1))
        .build("Pets", BoardSize::new(2, 3).unwrap())
        .unwrap();
    assert_eq!(deck.pair_count(), 3);
}

proptest! {
    #[test]
    fn prop_any_seed_any_board(seed in any::<u64>(), board_index in 0usize..21) {
        let board = BoardSize::all().nth(board_index).unwrap();
        let deck = builder(seed).build("Animals", board).unwrap();
        assert_paired(&deck, board);
    }
}
