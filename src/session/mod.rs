//! Game sessions: lifecycle phases, the selection buffer, the reveal/match
//! state machine and its read model.

pub mod phase;
pub mod selection;
pub mod state;
pub mod view;

pub use phase::{Outcome, Phase};
pub use selection::SelectionBuffer;
pub use state::{Ignored, Resolution, Reveal, Session};
pub use view::{CardView, SessionView};
