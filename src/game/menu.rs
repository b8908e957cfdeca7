//! Encoder-driven menu cursors

use crate::controller::RotationEvent;
use crate::ui::Screen;

/// Two-way choice offered by the main and post-game menus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Play,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 2] = [MenuChoice::Play, MenuChoice::Exit];
}

/// Selection over a fixed option list. Clockwise moves down, no wraparound.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuCursor<T: 'static> {
    options: &'static [T],
    index: usize,
}

impl<T: Copy> MenuCursor<T> {
    pub fn new(options: &'static [T]) -> Self {
        Self { options, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> T {
        self.options[self.index]
    }

    /// Moves the cursor; returns `false` when clamped at either end.
    pub fn apply(&mut self, rotation: RotationEvent) -> bool {
        match rotation {
            RotationEvent::Cw if self.index + 1 < self.options.len() => {
                self.index += 1;
                true
            }
            RotationEvent::Ccw if self.index > 0 => {
                self.index -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Title plus both options, the selected one marked with `>`
pub fn two_option_screen(title: &str, labels: [&str; 2], selected: usize) -> Screen {
    let line = |i: usize| {
        if i == selected {
            format!("> {}", labels[i])
        } else {
            format!("  {}", labels[i])
        }
    };
    Screen::text(title, line(0), line(1))
}
