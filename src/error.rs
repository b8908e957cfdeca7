//! Error types shared across the reactor subsystems.

use crate::controller::PinId;
use thiserror::Error;

/// A single sample could not be taken from the input hardware.
///
/// Always recoverable: the tick that produced it is skipped and the
/// challenge clock is held until reads succeed again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("Digital read failed on {pin:?}: {reason}")]
    Digital { pin: PinId, reason: String },

    #[error("Acceleration read failed: {0}")]
    Acceleration(String),
}

/// Crate level error type
#[derive(Debug, Error)]
pub enum ReactorError {
    /// Input could not be sampled this tick
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(#[from] SensorError),

    /// GPIO or I2C bring-up failed
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Configuration value out of range or unreadable
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),
}
