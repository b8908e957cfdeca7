//! Console lifecycle with statum state machine
//!
//! # State Machine
//!
//! ```text
//! Booting ──► Running ──► Stopped
//! ```
//!
//! `Booting` owns the configuration and the input source. `initialize` takes
//! the first frame to prime the decoders and builds the [`GameEngine`];
//! `Running` drives it from a fixed-period tokio interval until the shutdown
//! future resolves.

use crate::config::ReactorConfig;
use crate::controller::{InputCollector, InputFrame, InputSource};
use crate::error::ReactorError;
use crate::game::{GameEngine, GameEvent, RandomMoves};
use crate::ui::{LogDisplay, LogFeedback};
use chrono::{DateTime, Local};
use statum::{machine, state};
use std::future::Future;
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

#[state]
#[derive(Debug, Clone)]
pub enum ConsoleState {
    Booting,
    Running,
    Stopped,
}

#[machine]
pub struct Console<S: ConsoleState> {
    config: ReactorConfig,
    source: Box<dyn InputSource>,
    engine: Option<GameEngine>,
    ticks: u64,
    sensor_errors: u64,
    started_at: DateTime<Local>,
}

impl<S: ConsoleState> Console<S> {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sensor_errors(&self) -> u64 {
        self.sensor_errors
    }

}

impl Console<Booting> {
    pub fn create(config: ReactorConfig, source: Box<dyn InputSource>) -> Self {
        info!(
            "Creating console: {} ms tick, {} levels",
            config.game.tick_interval_ms, config.game.max_level
        );
        Self::new(config, source, None, 0, 0, Local::now())
    }

    /// Primes the input decoders from a first frame and starts the game.
    pub fn initialize(mut self) -> Result<Console<Running>, ReactorError> {
        let first = InputFrame::read(self.source.as_mut()).map_err(|e| {
            error!("Initial input read failed: {}", e);
            ReactorError::InitializationError(format!("Initial input read failed: {}", e))
        })?;

        let input = InputCollector::new(&self.config, &first);
        let moves = RandomMoves::from_seed_or_entropy(self.config.game.seed);
        self.engine = Some(GameEngine::new(
            &self.config,
            input,
            Box::new(moves),
            Box::new(LogDisplay::default()),
            Box::new(LogFeedback::default()),
            Instant::now(),
        ));
        self.started_at = Local::now();

        info!("Console running");
        Ok(self.transition())
    }
}

impl Console<Running> {
    /// Runs a single tick at `now`.
    pub fn step(&mut self, now: Instant) -> Vec<GameEvent> {
        self.ticks += 1;
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        match engine.tick(now, self.source.as_mut()) {
            Ok(events) => {
                for event in &events {
                    debug!("Game event: {:?}", event);
                }
                events
            }
            Err(e) => {
                self.sensor_errors += 1;
                debug!("Tick {} skipped: {}", self.ticks, e);
                Vec::new()
            }
        }
    }

    /// Ticks at the configured period until `shutdown` completes.
    pub async fn run_until<F>(mut self, shutdown: F) -> Console<Stopped>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.config.game.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                tick = ticker.tick() => {
                    self.step(tick.into_std());
                }
            }
        }

        self.transition()
    }
}

impl Console<Stopped> {
    /// Logs run statistics and releases the hardware.
    pub fn finish(self) {
        let uptime = Local::now().signed_duration_since(self.started_at);
        info!(
            "Console stopped after {} ticks ({} skipped) in {}s",
            self.ticks(),
            self.sensor_errors(),
            uptime.num_seconds()
        );
        if let Some(engine) = &self.engine {
            match (engine.session(), engine.outcome()) {
                (Some(session), Some(outcome)) => info!(
                    "Last session: {} ended {:?}",
                    session.difficulty().label(),
                    outcome
                ),
                (Some(session), None) => info!(
                    "Session abandoned on level {} in state {:?}",
                    session.level(),
                    engine.state()
                ),
                (None, _) => debug!("No session was played"),
            }
        }
    }
}
