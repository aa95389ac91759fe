//! Game orchestration.

pub mod game;

pub use game::{CardClick, GameController};
