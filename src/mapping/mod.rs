//! Mapping of decoded controller events onto the game's move vocabulary
//!
//! [`Move`] is the closed set of gestures a challenge can ask for. The
//! [`GestureRouter`] answers one question per tick: did the move the engine is
//! waiting for just happen?

pub mod router;

pub use router::GestureRouter;

use std::fmt::{Display, Formatter};

/// Player actions the game can recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    TurnCw,
    TurnCcw,
    PushButton,
    PushEncoder,
    TiltLeft,
    TiltRight,
}

impl Move {
    pub const ALL: [Move; 6] = [
        Move::TurnCw,
        Move::TurnCcw,
        Move::PushButton,
        Move::PushEncoder,
        Move::TiltLeft,
        Move::TiltRight,
    ];

    /// Instruction shown on the display
    pub fn label(self) -> &'static str {
        match self {
            Move::TurnCw => "TURN RIGHT >>",
            Move::TurnCcw => "<< TURN LEFT",
            Move::PushButton => "PUSH BUTTON",
            Move::PushEncoder => "PRESS KNOB",
            Move::TiltLeft => "TILT LEFT <",
            Move::TiltRight => "TILT RIGHT >",
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
