//! Raw sample acquisition boundary
//!
//! The game never talks to pins or buses directly. It asks an [`InputSource`]
//! for the latest levels once per tick and bundles them into an
//! [`InputFrame`], which is what every decoder consumes.

use crate::controller::encoder::EncoderState;
use crate::error::SensorError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Sub};

/// Digital inputs the reactor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinId {
    EncoderA,
    EncoderB,
    EncoderSwitch,
    ActionButton,
}

/// Three-axis acceleration in m/s²
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f32> for Vector3 {
    type Output = Vector3;

    fn div(self, rhs: f32) -> Vector3 {
        Vector3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Latest-value access to the controller hardware.
///
/// Implementations must return immediately with whatever was sampled last;
/// blocking here stalls the whole tick loop.
pub trait InputSource: Send {
    /// Level of a digital input. `true` is the idle (pulled-up) level.
    fn read_digital(&mut self, pin: PinId) -> Result<bool, SensorError>;

    fn read_acceleration(&mut self) -> Result<Vector3, SensorError>;
}

/// Everything sampled during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputFrame {
    pub encoder: EncoderState,
    /// `true` while the encoder knob is not pushed
    pub encoder_switch_released: bool,
    /// `true` while the action button is not pushed
    pub action_button_released: bool,
    pub acceleration: Vector3,
}

impl InputFrame {
    /// Samples all inputs. Any failing read discards the whole frame.
    pub fn read(source: &mut dyn InputSource) -> Result<Self, SensorError> {
        let a = source.read_digital(PinId::EncoderA)?;
        let b = source.read_digital(PinId::EncoderB)?;
        let encoder_switch_released = source.read_digital(PinId::EncoderSwitch)?;
        let action_button_released = source.read_digital(PinId::ActionButton)?;
        let acceleration = source.read_acceleration()?;

        Ok(Self {
            encoder: EncoderState::from_pins(a, b),
            encoder_switch_released,
            action_button_released,
            acceleration,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedInput;
    use super::*;

    #[test]
    fn frame_packs_encoder_pins_into_state() {
        let mut input = ScriptedInput {
            a: true,
            b: false,
            ..Default::default()
        };
        let frame = InputFrame::read(&mut input).unwrap();
        assert_eq!(frame.encoder, EncoderState::S10);
        assert!(frame.encoder_switch_released);
    }

    #[test]
    fn failing_read_discards_frame() {
        let mut input = ScriptedInput {
            failures: 1,
            ..Default::default()
        };
        let err = InputFrame::read(&mut input).unwrap_err();
        assert!(matches!(
            err,
            SensorError::Digital {
                pin: PinId::EncoderA,
                ..
            }
        ));
        assert!(InputFrame::read(&mut input).is_ok());
    }
}
