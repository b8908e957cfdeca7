//! Per-session bookkeeping: difficulty, level, lives, time limit and sequence

use crate::config::GameSettings;
use crate::game::sequence::MoveSource;
use crate::mapping::Move;
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

/// Result of clearing one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveProgress {
    /// More moves remain in this level's sequence
    Next,
    LevelComplete,
}

/// Result of clearing a whole level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelProgress {
    NextLevel(u8),
    AllCleared,
}

/// State of one play-through, created when a difficulty is confirmed.
///
/// Keeps `1 <= level <= max_level`, `lives <= max_lives` and, once a level
/// has started, `sequence.len() == level`.
#[derive(Debug, Clone)]
pub struct GameSession {
    difficulty: Difficulty,
    level: u8,
    max_level: u8,
    lives: u8,
    time_limit: f32,
    sequence: Vec<Move>,
    move_index: usize,
    started_at: DateTime<Local>,
}

impl GameSession {
    pub fn new(difficulty: Difficulty, settings: &GameSettings) -> Self {
        let time_limit = settings.base_time(difficulty);
        info!(
            "New session: {} with {} lives, {:.2}s per move",
            difficulty.label(),
            settings.max_lives,
            time_limit
        );
        Self {
            difficulty,
            level: 1,
            max_level: settings.max_level.max(1),
            lives: settings.max_lives,
            time_limit,
            sequence: Vec::new(),
            move_index: 0,
            started_at: Local::now(),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Seconds allowed per move at the current level
    pub fn time_limit(&self) -> f32 {
        self.time_limit
    }

    pub fn move_window(&self) -> Duration {
        Duration::from_secs_f32(self.time_limit)
    }

    pub fn sequence(&self) -> &[Move] {
        &self.sequence
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn expected_move(&self) -> Option<Move> {
        self.sequence.get(self.move_index).copied()
    }

    /// Draws a fresh sequence for the current level and rewinds to its first move.
    pub fn start_level(&mut self, moves: &mut dyn MoveSource) -> &[Move] {
        self.sequence = moves.generate(self.level as usize);
        self.move_index = 0;
        debug!("Level {} sequence: {:?}", self.level, self.sequence);
        &self.sequence
    }

    pub fn advance(&mut self) -> MoveProgress {
        self.move_index += 1;
        if self.move_index >= self.sequence.len() {
            MoveProgress::LevelComplete
        } else {
            MoveProgress::Next
        }
    }

    /// Takes one life and returns how many are left.
    pub fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn is_lost(&self) -> bool {
        self.lives == 0
    }

    /// Shrinks the time limit and moves on, unless this was the final level.
    pub fn clear_level(&mut self, time_decay: f32) -> LevelProgress {
        self.time_limit *= time_decay;
        if self.level >= self.max_level {
            LevelProgress::AllCleared
        } else {
            self.level += 1;
            LevelProgress::NextLevel(self.level)
        }
    }
}
