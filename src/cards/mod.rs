//! Card system: cards, categories and deck construction.
//!
//! ## Key Types
//!
//! - `Card`: one face on the board with `revealed`/`matched` flags
//! - `FaceRef`: opaque face image reference
//! - `Category` / `CategoryCatalog`: named face pools, read-only to the engine
//! - `Deck`: the ordered cards of one session
//! - `DeckBuilder`: builds shuffled, paired decks

pub mod card;
pub mod category;
pub mod deck;

pub use card::{Card, FaceRef};
pub use category::{Category, CategoryCatalog, DEFAULT_CATEGORIES};
pub use deck::{Deck, DeckBuilder};
