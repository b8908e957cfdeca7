//! One-shot click detection for the two push buttons

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonId {
    /// Push switch built into the rotary encoder
    EncoderButton,
    /// Separate push button
    ActionButton,
}

impl ButtonId {
    fn index(self) -> usize {
        match self {
            ButtonId::EncoderButton => 0,
            ButtonId::ActionButton => 1,
        }
    }
}

/// Remembers the last sampled level of each button.
///
/// Levels are "released" booleans as read from pulled-up inputs: `true` idle,
/// `false` pushed.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    last_released: [Option<bool>; 2],
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the remembered level without reporting a click
    pub fn prime(&mut self, button: ButtonId, released: bool) {
        self.last_released[button.index()] = Some(released);
    }

    /// Returns `true` exactly once per released → pressed transition.
    ///
    /// The first sample for a button only initialises its level.
    pub fn poll(&mut self, button: ButtonId, released: bool) -> bool {
        let previous = self.last_released[button.index()].replace(released);
        let clicked = previous == Some(true) && !released;
        if clicked {
            debug!("Click on {:?}", button);
        }
        clicked
    }

    /// Level view: `true` while the last sample saw the button down.
    ///
    /// Callers acting on this must wait for the button to come back up before
    /// looking for the next move, or the same press triggers twice.
    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.last_released[button.index()] == Some(false)
    }
}
