//! The reaction game itself
//!
//! [`GameEngine`] owns the per-tick state machine and delegates bookkeeping to
//! [`GameSession`], sequence drawing to a [`MoveSource`] and menu navigation to
//! [`menu::MenuCursor`].

pub mod engine;
pub mod menu;
pub mod sequence;
pub mod session;

pub use engine::{EngineState, GameEngine, GameEvent, SessionOutcome};
pub use sequence::{MoveSource, RandomMoves};
pub use session::{Difficulty, GameSession};
