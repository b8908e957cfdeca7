//! Reactor configuration
//!
//! Every tunable that drives input decoding and game pacing lives here and is
//! loaded from `<config_dir>/retro-reactor/config.toml`. A missing file is
//! created with the defaults, so a fresh device boots with a documented
//! starting point that can be edited in place.

use crate::error::ReactorError;
use crate::game::Difficulty;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "retro-reactor";
const CONFIG_FILE: &str = "config.toml";

/// Top level configuration, one section per subsystem
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ReactorConfig {
    pub pins: PinConfig,
    pub encoder: EncoderSettings,
    pub motion: MotionSettings,
    pub game: GameSettings,
}

/// BCM pin numbers and accelerometer bus location
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PinConfig {
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub encoder_switch: u8,
    pub action_button: u8,
    pub i2c_bus: u8,
    pub accelerometer_address: u16,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            encoder_a: 17,
            encoder_b: 27,
            encoder_switch: 22,
            action_button: 23,
            i2c_bus: 1,
            accelerometer_address: 0x53,
        }
    }
}

/// Quadrature decoding parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EncoderSettings {
    /// Time a changed pin state must settle before it is re-read
    pub settle_delay_ms: u64,
    /// Valid same-direction transitions required for one logical turn
    pub steps_per_turn: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1,
            steps_per_turn: 2,
        }
    }
}

impl EncoderSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Tilt classification parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MotionSettings {
    /// EMA smoothing factor applied to every raw sample
    pub alpha: f32,
    /// Offset from the baseline on the X axis that counts as a tilt
    pub tilt_threshold: f32,
    pub calibration_samples: u32,
    pub calibration_interval_ms: u64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            tilt_threshold: 2.0,
            calibration_samples: 30,
            calibration_interval_ms: 20,
        }
    }
}

/// Rules and pacing of a play session
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GameSettings {
    pub max_lives: u8,
    pub max_level: u8,
    pub easy_time_s: f32,
    pub medium_time_s: f32,
    pub hard_time_s: f32,
    /// Multiplier applied to the time limit after each cleared level
    pub time_decay: f32,
    pub tick_interval_ms: u64,
    /// Fixed seed for the move generator; drawn from the OS when absent
    pub seed: Option<u64>,
    /// Consecutive failed ticks before a sensor outage is reported loudly
    pub sensor_failure_alert_ticks: u32,
    pub opening_ms: u64,
    pub get_ready_ms: u64,
    pub post_calibration_ms: u64,
    pub intro_ms: u64,
    pub retry_pause_ms: u64,
    pub game_over_ms: u64,
    pub win_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_lives: 3,
            max_level: 10,
            easy_time_s: 3.0,
            medium_time_s: 2.0,
            hard_time_s: 1.2,
            time_decay: 0.9,
            tick_interval_ms: 10,
            seed: None,
            sensor_failure_alert_ticks: 100,
            opening_ms: 5000,
            get_ready_ms: 1500,
            post_calibration_ms: 500,
            intro_ms: 1500,
            retry_pause_ms: 1500,
            game_over_ms: 2000,
            win_ms: 2000,
        }
    }
}

impl GameSettings {
    /// Base time limit per move for a difficulty, in seconds
    pub fn base_time(&self, difficulty: Difficulty) -> f32 {
        match difficulty {
            Difficulty::Easy => self.easy_time_s,
            Difficulty::Medium => self.medium_time_s,
            Difficulty::Hard => self.hard_time_s,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl ReactorConfig {
    /// Rejects values the decoders and the engine cannot work with.
    pub fn validate(&self) -> Result<(), ReactorError> {
        if self.encoder.steps_per_turn == 0 {
            return Err(ReactorError::Config(
                "encoder.steps_per_turn must be at least 1".to_string(),
            ));
        }
        if !(self.motion.alpha > 0.0 && self.motion.alpha <= 1.0) {
            return Err(ReactorError::Config(format!(
                "motion.alpha must be in (0, 1], got {}",
                self.motion.alpha
            )));
        }
        if self.motion.calibration_samples == 0 {
            return Err(ReactorError::Config(
                "motion.calibration_samples must be at least 1".to_string(),
            ));
        }
        if self.game.max_lives == 0 || self.game.max_level == 0 {
            return Err(ReactorError::Config(
                "game.max_lives and game.max_level must be at least 1".to_string(),
            ));
        }
        for difficulty in Difficulty::ALL {
            let base = self.game.base_time(difficulty);
            if !(base > 0.0) {
                return Err(ReactorError::Config(format!(
                    "time limit for {} must be positive, got {}",
                    difficulty.label(),
                    base
                )));
            }
        }
        if !(self.game.time_decay > 0.0 && self.game.time_decay <= 1.0) {
            return Err(ReactorError::Config(format!(
                "game.time_decay must be in (0, 1], got {}",
                self.game.time_decay
            )));
        }
        if self.game.sensor_failure_alert_ticks == 0 {
            return Err(ReactorError::Config(
                "game.sensor_failure_alert_ticks must be at least 1".to_string(),
            ));
        }
        if self.game.tick_interval_ms == 0 {
            return Err(ReactorError::Config(
                "game.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the configuration file, writing the defaults first if it does not exist.
    pub async fn load_or_create() -> Result<Self> {
        let path = config_path();

        let config = if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
            let config: ReactorConfig = toml::from_str(&content)
                .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            warn!(
                "Config file {} does not exist, writing defaults",
                path.display()
            );
            let config = ReactorConfig::default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
            }
            let content = toml::to_string_pretty(&config)
                .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| eyre!("Failed to write config file: {}", e))?;
            config
        };

        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

fn config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}
