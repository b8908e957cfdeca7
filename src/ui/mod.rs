//! Output collaborators: the text display and the RGB status light
//!
//! The engine describes what should be visible as a [`Screen`] and a
//! [`Color`]; how those reach an OLED or a NeoPixel is up to the sink
//! implementation. The log-backed sinks here make the game playable on a
//! board without either attached.

use std::time::Duration;
use tracing::{debug, info};

/// RGB color of the status light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const MENU: Color = Color::new(0, 0, 50);
    pub const INFO: Color = Color::new(0, 0, 80);
    pub const OPENING_DIM: Color = Color::new(0, 0, 20);
    pub const WAITING: Color = Color::new(80, 80, 0);
    pub const SUCCESS: Color = Color::new(0, 255, 0);
    pub const LEVEL_CLEAR: Color = Color::new(0, 200, 0);
    pub const FAILURE: Color = Color::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Up to three text lines plus an optional lives tally
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    pub lines: [String; 3],
    /// Remaining lives; `None` hides the tally (menus, opening)
    pub lives: Option<u8>,
}

impl Screen {
    /// Menu style screen without lives
    pub fn text(l1: impl Into<String>, l2: impl Into<String>, l3: impl Into<String>) -> Self {
        Self {
            lines: [l1.into(), l2.into(), l3.into()],
            lives: None,
        }
    }

    /// In-game screen: two lines and the lives tally
    pub fn game(l1: impl Into<String>, l2: impl Into<String>, lives: u8) -> Self {
        Self {
            lines: [l1.into(), l2.into(), String::new()],
            lives: Some(lives),
        }
    }

    /// Bottom line as drawn on the display, e.g. `LIVES: ***`
    pub fn lives_line(&self) -> String {
        match self.lives {
            Some(lives) => format!("LIVES: {}", "*".repeat(lives as usize)),
            None => String::new(),
        }
    }
}

pub trait DisplaySink: Send {
    fn show(&mut self, screen: &Screen);
}

pub trait FeedbackSink: Send {
    fn set_color(&mut self, color: Color);

    /// Shows `color` for `duration`, then goes back to the previous color.
    fn flash(&mut self, color: Color, duration: Duration);
}

/// Display that writes every new screen to the log
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<Screen>,
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, screen: &Screen) {
        if self.last.as_ref() == Some(screen) {
            return;
        }
        info!(
            "[display] {} | {} | {} | {}",
            screen.lines[0],
            screen.lines[1],
            screen.lines[2],
            screen.lives_line()
        );
        self.last = Some(screen.clone());
    }
}

/// Status light that logs color changes
#[derive(Debug, Default)]
pub struct LogFeedback {
    current: Color,
}

impl FeedbackSink for LogFeedback {
    fn set_color(&mut self, color: Color) {
        if color != self.current {
            debug!("[light] ({}, {}, {})", color.r, color.g, color.b);
            self.current = color;
        }
    }

    fn flash(&mut self, color: Color, duration: Duration) {
        debug!(
            "[light] flash ({}, {}, {}) for {}ms, back to ({}, {}, {})",
            color.r,
            color.g,
            color.b,
            duration.as_millis(),
            self.current.r,
            self.current.g,
            self.current.b
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_render_as_tally() {
        assert_eq!(Screen::game("A", "B", 3).lives_line(), "LIVES: ***");
        assert_eq!(Screen::game("A", "B", 1).lives_line(), "LIVES: *");
        assert_eq!(Screen::game("A", "B", 0).lives_line(), "LIVES: ");
    }

    #[test]
    fn menu_screens_hide_lives() {
        let screen = Screen::text("RETRO REACTOR", "> PLAY", "  EXIT");
        assert_eq!(screen.lives_line(), "");
        assert_eq!(screen.lines[2], "  EXIT");
    }

    #[test]
    fn game_screens_leave_middle_line_empty() {
        let screen = Screen::game("GET READY!", "MODE: EASY", 2);
        assert_eq!(screen.lines[2], "");
        assert_eq!(screen.lives, Some(2));
    }
}
