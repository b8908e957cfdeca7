//! Game engine state machine
//!
//! Driven by one [`GameEngine::tick`] per scheduler tick. Each tick samples a
//! frame, advances the decoders and then the state machine; every wait
//! (pauses, calibration cadence, the challenge window) is a comparison against
//! the tick's monotonic timestamp.
//!
//! # State Machine
//!
//! ```text
//! Opening ──► MainMenu ──► DifficultySelect ──► GetReady ──► Calibrating ──► Settling
//!    ▲           ▲  │                                                          │
//!    │           │  └──► Opening (EXIT)                                        ▼
//!    │           │                     ┌──────────────────────────────────► Intro(level)
//!    │           │                     │                                       │
//!    │           │               LifeLost(level) ◄── timeout ── Challenge(level, move) ◄──┐
//!    │           │                     │                          │        │              │
//!    │           │                 lives == 0              success│   AwaitRelease ───────┤
//!    │           │                     ▼                          ▼                       │
//!    │           │                  GameOver             [LevelCleared] ── next move ─────┘
//!    │           │                     │                   │         │
//!    │           │                     │             level == max   next level ──► Intro
//!    │           │                     ▼                   ▼
//!    └───────────┴────────────── PostGameMenu ◄────────── Win
//! ```
//!
//! `LevelCleared` has no waiting time of its own, so it is an edge handled
//! within the tick rather than a resting state.

use crate::config::{GameSettings, MotionSettings, ReactorConfig};
use crate::controller::{Calibration, InputCollector, InputFrame, InputSource, TickEvents, Vector3};
use crate::error::ReactorError;
use crate::game::menu::{two_option_screen, MenuChoice, MenuCursor};
use crate::game::sequence::MoveSource;
use crate::game::session::{Difficulty, GameSession, LevelProgress, MoveProgress};
use crate::mapping::{GestureRouter, Move};
use crate::ui::{Color, DisplaySink, FeedbackSink, Screen};
use chrono::Local;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const TITLE: &str = "RETRO REACTOR";
const OPENING_BLINK_PERIOD_MS: u128 = 1000;
const OPENING_BRIGHT_MS: u128 = 700;
const MENU_CONFIRM_FLASH: Duration = Duration::from_millis(200);
const MOVE_SUCCESS_FLASH: Duration = Duration::from_millis(150);
const LEVEL_RESULT_FLASH: Duration = Duration::from_millis(300);

/// How a finished session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Won,
    Lost { level: u8 },
}

/// Milestones reported by [`GameEngine::tick`]
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SessionStarted { difficulty: Difficulty },
    Calibrated { baseline: Vector3 },
    LevelStarted { level: u8, sequence: Vec<Move> },
    MoveCleared { level: u8, index: usize, expected: Move },
    MoveTimedOut { level: u8, index: usize, expected: Move },
    LifeLost { level: u8, lives_left: u8 },
    LevelCleared { level: u8, time_limit: f32 },
    GameOver { level: u8 },
    Won,
}

#[derive(Debug, Clone)]
pub enum EngineState {
    /// Blinking splash screen
    Opening { started: Instant, bright: bool },
    MainMenu { cursor: MenuCursor<MenuChoice> },
    DifficultySelect { cursor: MenuCursor<Difficulty> },
    GetReady { until: Instant },
    /// Collecting still samples for the tilt baseline
    Calibrating { calibration: Calibration, next_sample: Instant },
    /// Short pause after calibration
    Settling { until: Instant },
    Intro { until: Instant },
    Challenge { deadline: Instant },
    /// Action button accepted on its level; waiting for it to come back up
    AwaitRelease,
    LifeLost { until: Instant },
    GameOver { until: Instant, level: u8 },
    Win { until: Instant },
    PostGameMenu {
        outcome: SessionOutcome,
        cursor: MenuCursor<MenuChoice>,
    },
}

pub struct GameEngine {
    settings: GameSettings,
    motion_settings: MotionSettings,
    input: InputCollector,
    router: GestureRouter,
    moves: Box<dyn MoveSource>,
    display: Box<dyn DisplaySink>,
    feedback: Box<dyn FeedbackSink>,
    state: EngineState,
    session: Option<GameSession>,
    outcome: Option<SessionOutcome>,
    last_tick: Option<Instant>,
    failure_streak: u32,
}

impl GameEngine {
    /// Creates the engine and shows the opening screen.
    pub fn new(
        config: &ReactorConfig,
        input: InputCollector,
        moves: Box<dyn MoveSource>,
        display: Box<dyn DisplaySink>,
        feedback: Box<dyn FeedbackSink>,
        now: Instant,
    ) -> Self {
        let mut engine = Self {
            settings: config.game.clone(),
            motion_settings: config.motion.clone(),
            input,
            router: GestureRouter::new(),
            moves,
            display,
            feedback,
            state: EngineState::Opening {
                started: now,
                bright: true,
            },
            session: None,
            outcome: None,
            last_tick: None,
            failure_streak: 0,
        };
        debug!("Entering opening screen");
        engine.draw_opening(true);
        engine
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Current session, or the one that just ended
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// Samples `source` and advances the game by one tick.
    ///
    /// A failed read skips the tick and holds the challenge clock; the error
    /// is returned for the caller to report and the next tick retries.
    pub fn tick(
        &mut self,
        now: Instant,
        source: &mut dyn InputSource,
    ) -> Result<Vec<GameEvent>, ReactorError> {
        let frame = match InputFrame::read(source) {
            Ok(frame) => frame,
            Err(e) => {
                self.hold_clock(now);
                return Err(e.into());
            }
        };

        if self.failure_streak > 0 {
            info!("Sensors recovered after {} failed ticks", self.failure_streak);
            self.failure_streak = 0;
        }
        self.last_tick = Some(now);

        let events = self.input.collect(&frame, now);
        let mut out = Vec::new();
        self.step(now, &frame, &events, &mut out);
        Ok(out)
    }

    /// Starts a fresh session as if `difficulty` had been confirmed in the menu.
    pub fn begin_session(&mut self, difficulty: Difficulty, now: Instant) -> GameEvent {
        let session = GameSession::new(difficulty, &self.settings);
        self.session = Some(session);
        self.outcome = None;

        self.show_game("GET READY!", format!("MODE: {}", difficulty.label()));
        self.feedback.set_color(Color::INFO);
        self.state = EngineState::GetReady {
            until: now + Duration::from_millis(self.settings.get_ready_ms),
        };
        GameEvent::SessionStarted { difficulty }
    }

    fn hold_clock(&mut self, now: Instant) {
        let gap = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        if let EngineState::Challenge { deadline } = &mut self.state {
            *deadline += gap;
        }
        self.last_tick = Some(now);
        self.failure_streak += 1;

        if self.failure_streak == 1 {
            warn!("Input read failed, holding the game clock");
        } else if self.failure_streak == self.settings.sensor_failure_alert_ticks {
            error!(
                "Input unavailable for {} consecutive ticks",
                self.failure_streak
            );
        }
    }

    fn step(&mut self, now: Instant, frame: &InputFrame, events: &TickEvents, out: &mut Vec<GameEvent>) {
        match self.state.clone() {
            EngineState::Opening { started, bright } => {
                let elapsed = now.saturating_duration_since(started);
                if elapsed >= Duration::from_millis(self.settings.opening_ms) {
                    self.enter_main_menu();
                    return;
                }
                let frame_bright =
                    elapsed.as_millis() % OPENING_BLINK_PERIOD_MS < OPENING_BRIGHT_MS;
                if frame_bright != bright {
                    self.draw_opening(frame_bright);
                    self.state = EngineState::Opening {
                        started,
                        bright: frame_bright,
                    };
                }
            }

            EngineState::MainMenu { mut cursor } => {
                if let Some(rotation) = events.rotation {
                    if cursor.apply(rotation) {
                        self.display
                            .show(&two_option_screen(TITLE, ["PLAY", "EXIT"], cursor.index()));
                    }
                }
                self.state = EngineState::MainMenu {
                    cursor: cursor.clone(),
                };
                if events.encoder_clicked {
                    self.feedback.flash(Color::SUCCESS, MENU_CONFIRM_FLASH);
                    match cursor.selected() {
                        MenuChoice::Play => self.enter_difficulty_select(),
                        MenuChoice::Exit => self.enter_opening(now),
                    }
                }
            }

            EngineState::DifficultySelect { mut cursor } => {
                if let Some(rotation) = events.rotation {
                    if cursor.apply(rotation) {
                        self.draw_difficulty(cursor.selected());
                    }
                }
                self.state = EngineState::DifficultySelect {
                    cursor: cursor.clone(),
                };
                if events.encoder_clicked {
                    self.feedback.flash(Color::SUCCESS, MENU_CONFIRM_FLASH);
                    let started = self.begin_session(cursor.selected(), now);
                    out.push(started);
                }
            }

            EngineState::GetReady { until } => {
                if now >= until {
                    self.show_game("HOLD STILL", "CALIBRATING...");
                    self.state = EngineState::Calibrating {
                        calibration: Calibration::new(self.motion_settings.calibration_samples),
                        next_sample: now,
                    };
                }
            }

            EngineState::Calibrating {
                mut calibration,
                next_sample,
            } => {
                if now < next_sample {
                    return;
                }
                if calibration.add(frame.acceleration) {
                    debug!("Calibration complete after {} samples", calibration.collected());
                    if let Some(baseline) = calibration.baseline() {
                        self.input.motion_mut().set_baseline(baseline);
                        out.push(GameEvent::Calibrated { baseline });
                    }
                    self.state = EngineState::Settling {
                        until: now + Duration::from_millis(self.settings.post_calibration_ms),
                    };
                } else {
                    self.state = EngineState::Calibrating {
                        calibration,
                        next_sample: now
                            + Duration::from_millis(self.motion_settings.calibration_interval_ms),
                    };
                }
            }

            EngineState::Settling { until } => {
                if now >= until {
                    self.enter_intro(now, out);
                }
            }

            EngineState::Intro { until } => {
                if now >= until {
                    self.enter_challenge(now);
                }
            }

            EngineState::Challenge { deadline } => {
                let Some(session) = self.session.as_ref() else {
                    self.abandon_session();
                    return;
                };
                let (level, index) = (session.level(), session.move_index());
                let Some(expected) = session.expected_move() else {
                    self.clear_level(now, out);
                    return;
                };

                if now >= deadline {
                    info!("Level {} move {} timed out: {:?}", level, index + 1, expected);
                    self.feedback.set_color(Color::FAILURE);
                    out.push(GameEvent::MoveTimedOut {
                        level,
                        index,
                        expected,
                    });
                    self.lose_life(now, out);
                } else if self.router.matches(expected, events) {
                    debug!("Level {} move {} cleared: {:?}", level, index + 1, expected);
                    self.feedback.flash(Color::SUCCESS, MOVE_SUCCESS_FLASH);
                    out.push(GameEvent::MoveCleared {
                        level,
                        index,
                        expected,
                    });
                    if expected == Move::PushButton {
                        self.state = EngineState::AwaitRelease;
                    } else {
                        self.complete_move(now, out);
                    }
                }
            }

            EngineState::AwaitRelease => {
                if !events.button_pressed {
                    self.complete_move(now, out);
                }
            }

            EngineState::LifeLost { until } => {
                if now >= until {
                    self.enter_intro(now, out);
                }
            }

            EngineState::GameOver { until, level } => {
                if now >= until {
                    self.enter_post_game_menu(SessionOutcome::Lost { level });
                }
            }

            EngineState::Win { until } => {
                if now >= until {
                    self.enter_post_game_menu(SessionOutcome::Won);
                }
            }

            EngineState::PostGameMenu { outcome, mut cursor } => {
                if let Some(rotation) = events.rotation {
                    if cursor.apply(rotation) {
                        self.draw_post_game(outcome, cursor.index());
                    }
                }
                self.state = EngineState::PostGameMenu {
                    outcome,
                    cursor: cursor.clone(),
                };
                if events.encoder_clicked {
                    self.feedback.flash(Color::SUCCESS, MENU_CONFIRM_FLASH);
                    match cursor.selected() {
                        MenuChoice::Play => self.enter_main_menu(),
                        MenuChoice::Exit => self.enter_opening(now),
                    }
                }
            }
        }
    }

    fn enter_opening(&mut self, now: Instant) {
        debug!("Entering opening screen");
        self.draw_opening(true);
        self.state = EngineState::Opening {
            started: now,
            bright: true,
        };
    }

    fn enter_main_menu(&mut self) {
        debug!("Entering main menu");
        let cursor = MenuCursor::new(&MenuChoice::ALL);
        self.display
            .show(&two_option_screen(TITLE, ["PLAY", "EXIT"], cursor.index()));
        self.feedback.set_color(Color::MENU);
        self.state = EngineState::MainMenu { cursor };
    }

    fn enter_difficulty_select(&mut self) {
        debug!("Entering difficulty selection");
        let cursor = MenuCursor::new(&Difficulty::ALL);
        self.draw_difficulty(cursor.selected());
        self.feedback.set_color(Color::MENU);
        self.state = EngineState::DifficultySelect { cursor };
    }

    fn enter_post_game_menu(&mut self, outcome: SessionOutcome) {
        let cursor = MenuCursor::new(&MenuChoice::ALL);
        self.draw_post_game(outcome, cursor.index());
        self.feedback.set_color(Color::MENU);
        self.state = EngineState::PostGameMenu { outcome, cursor };
    }

    /// Draws a fresh sequence for the current level and shows the level banner.
    fn enter_intro(&mut self, now: Instant, out: &mut Vec<GameEvent>) {
        let Some(session) = self.session.as_mut() else {
            self.abandon_session();
            return;
        };
        let sequence = session.start_level(self.moves.as_mut()).to_vec();
        let level = session.level();
        let banner = format!("LEVEL {}  {}", level, session.difficulty().label());
        let detail = format!("{} MOVES, {:.1}s", sequence.len(), session.time_limit());

        info!("Level {} starting with {} moves", level, sequence.len());
        self.show_game(banner, detail);
        self.feedback.set_color(Color::INFO);
        out.push(GameEvent::LevelStarted { level, sequence });
        self.state = EngineState::Intro {
            until: now + Duration::from_millis(self.settings.intro_ms),
        };
    }

    /// Opens the timed window for the current move.
    fn enter_challenge(&mut self, now: Instant) {
        let Some(session) = self.session.as_ref() else {
            self.abandon_session();
            return;
        };
        let Some(expected) = session.expected_move() else {
            warn!("Challenge requested without a pending move");
            return;
        };
        let header = format!(
            "L{} {}/{} {}",
            session.level(),
            session.move_index() + 1,
            session.sequence().len(),
            session.difficulty().label()
        );
        let deadline = now + session.move_window();

        self.show_game(header, format!("DO: {}", expected.label()));
        self.feedback.set_color(Color::WAITING);
        self.input.reset_turns();
        self.state = EngineState::Challenge { deadline };
    }

    fn complete_move(&mut self, now: Instant, out: &mut Vec<GameEvent>) {
        let progress = match self.session.as_mut() {
            Some(session) => session.advance(),
            None => {
                self.abandon_session();
                return;
            }
        };
        match progress {
            MoveProgress::Next => self.enter_challenge(now),
            MoveProgress::LevelComplete => self.clear_level(now, out),
        }
    }

    fn clear_level(&mut self, now: Instant, out: &mut Vec<GameEvent>) {
        let Some(session) = self.session.as_mut() else {
            self.abandon_session();
            return;
        };
        let level = session.level();
        let progress = session.clear_level(self.settings.time_decay);
        let time_limit = session.time_limit();
        let max_level = session.max_level();

        info!("Level {} cleared, next time limit {:.2}s", level, time_limit);
        self.feedback.flash(Color::LEVEL_CLEAR, LEVEL_RESULT_FLASH);
        out.push(GameEvent::LevelCleared { level, time_limit });

        match progress {
            LevelProgress::NextLevel(_) => self.enter_intro(now, out),
            LevelProgress::AllCleared => {
                self.finish(SessionOutcome::Won);
                out.push(GameEvent::Won);
                self.feedback.set_color(Color::SUCCESS);
                self.show_game(
                    "STAGE CLEAR!",
                    format!("ALL {} LEVELS", max_level),
                );
                self.state = EngineState::Win {
                    until: now + Duration::from_millis(self.settings.win_ms),
                };
            }
        }
    }

    /// Charges a life for the failed move; the level restarts or the session ends.
    fn lose_life(&mut self, now: Instant, out: &mut Vec<GameEvent>) {
        let Some(session) = self.session.as_mut() else {
            self.abandon_session();
            return;
        };
        let level = session.level();
        let lives_left = session.lose_life();
        let lost = session.is_lost();

        self.feedback.flash(Color::FAILURE, LEVEL_RESULT_FLASH);
        out.push(GameEvent::LifeLost { level, lives_left });

        if !lost {
            info!("Life lost on level {}, {} left", level, lives_left);
            self.show_game("OOPS! LIFE -1", format!("RETRY LEVEL {}", level));
            self.feedback.set_color(Color::FAILURE);
            self.state = EngineState::LifeLost {
                until: now + Duration::from_millis(self.settings.retry_pause_ms),
            };
        } else {
            self.finish(SessionOutcome::Lost { level });
            out.push(GameEvent::GameOver { level });
            self.show_game("OUT OF LIVES", format!("GAME OVER L{}", level));
            self.feedback.set_color(Color::FAILURE);
            self.state = EngineState::GameOver {
                until: now + Duration::from_millis(self.settings.game_over_ms),
                level,
            };
        }
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        if let Some(session) = &self.session {
            let played = Local::now().signed_duration_since(session.started_at());
            info!(
                "Session finished: {:?} on {} at level {} with {} lives after {}s",
                outcome,
                session.difficulty().label(),
                session.level(),
                session.lives(),
                played.num_seconds()
            );
        }
        self.outcome = Some(outcome);
    }

    fn abandon_session(&mut self) {
        error!("No active session in state {:?}, returning to menu", self.state);
        self.enter_main_menu();
    }

    fn draw_opening(&mut self, bright: bool) {
        if bright {
            self.display.show(&Screen::text(
                TITLE,
                "   90s ARCADE STYLE",
                "   >> START FUN <<",
            ));
            self.feedback.set_color(Color::INFO);
        } else {
            self.display
                .show(&Screen::text(TITLE, "   90s ARCADE STYLE", ""));
            self.feedback.set_color(Color::OPENING_DIM);
        }
    }

    fn draw_difficulty(&mut self, difficulty: Difficulty) {
        self.display.show(&Screen::text(
            "SELECT MODE",
            format!("> {}", difficulty.label()),
            "",
        ));
    }

    fn draw_post_game(&mut self, outcome: SessionOutcome, selected: usize) {
        let title = match outcome {
            SessionOutcome::Won => "YOU WIN!",
            SessionOutcome::Lost { .. } => "GAME OVER",
        };
        self.display
            .show(&two_option_screen(title, ["PLAY AGAIN", "EXIT"], selected));
    }

    fn show_game(&mut self, l1: impl Into<String>, l2: impl Into<String>) {
        let lives = self.session.as_ref().map_or(0, |s| s.lives());
        self.display.show(&Screen::game(l1, l2, lives));
    }
}
