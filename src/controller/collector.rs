//! Per-tick fan-out of a sampled frame to the three decoders

use crate::config::ReactorConfig;
use crate::controller::edge::{ButtonId, EdgeDetector};
use crate::controller::encoder::{EncoderDecoder, RotationEvent};
use crate::controller::input_source::InputFrame;
use crate::controller::motion::{MotionClassifier, Tilt};
use std::time::Instant;
use tracing::{debug, trace};

/// Decoded input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEvents {
    pub rotation: Option<RotationEvent>,
    pub encoder_clicked: bool,
    /// Level view of the action button
    pub button_pressed: bool,
    pub tilt: Option<Tilt>,
}

/// Owns the decoder state that persists between ticks
#[derive(Debug, Clone)]
pub struct InputCollector {
    encoder: EncoderDecoder,
    buttons: EdgeDetector,
    motion: MotionClassifier,
}

impl InputCollector {
    /// Builds the decoders, seeding their remembered levels from `first`.
    pub fn new(config: &ReactorConfig, first: &InputFrame) -> Self {
        let mut buttons = EdgeDetector::new();
        buttons.prime(ButtonId::EncoderButton, first.encoder_switch_released);
        buttons.prime(ButtonId::ActionButton, first.action_button_released);

        debug!(
            "Input collector primed: encoder {:?}, accel {:?}",
            first.encoder, first.acceleration
        );

        Self {
            encoder: EncoderDecoder::new(&config.encoder, first.encoder),
            buttons,
            motion: MotionClassifier::new(&config.motion, first.acceleration),
        }
    }

    /// Advances every decoder by one frame.
    pub fn collect(&mut self, frame: &InputFrame, now: Instant) -> TickEvents {
        let rotation = self.encoder.poll(frame.encoder, now);
        let encoder_clicked = self
            .buttons
            .poll(ButtonId::EncoderButton, frame.encoder_switch_released);
        // The action button is matched on its level; polling keeps that level current.
        self.buttons
            .poll(ButtonId::ActionButton, frame.action_button_released);
        let tilt = self.motion.sample(frame.acceleration);

        TickEvents {
            rotation,
            encoder_clicked,
            button_pressed: self.buttons.is_pressed(ButtonId::ActionButton),
            tilt,
        }
    }

    /// Forgets partial rotation so a new challenge window starts from zero.
    pub fn reset_turns(&mut self) {
        let (cw, ccw) = self.encoder.steps();
        if cw + ccw > 0 {
            trace!("Dropping partial turn: {} cw, {} ccw steps", cw, ccw);
        }
        self.encoder.reset_turns();
    }

    pub fn motion_mut(&mut self) -> &mut MotionClassifier {
        &mut self.motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderSettings;
    use crate::controller::encoder::EncoderState;
    use crate::controller::input_source::Vector3;

    fn frame() -> InputFrame {
        InputFrame {
            encoder: EncoderState::S11,
            encoder_switch_released: true,
            action_button_released: true,
            acceleration: Vector3::new(0.0, 0.0, 9.8),
        }
    }

    fn collector() -> InputCollector {
        let config = ReactorConfig {
            encoder: EncoderSettings {
                settle_delay_ms: 0,
                steps_per_turn: 2,
            },
            ..Default::default()
        };
        InputCollector::new(&config, &frame())
    }

    #[test]
    fn idle_frame_produces_nothing() {
        let mut input = collector();
        assert_eq!(input.collect(&frame(), Instant::now()), TickEvents::default());
    }

    #[test]
    fn press_reports_level_while_held() {
        let mut input = collector();
        let now = Instant::now();
        let pressed = InputFrame {
            action_button_released: false,
            ..frame()
        };

        let events = input.collect(&pressed, now);
        assert!(events.button_pressed);
        assert!(!events.encoder_clicked);

        let held = input.collect(&pressed, now);
        assert!(held.button_pressed);

        let released = input.collect(&frame(), now);
        assert!(!released.button_pressed);
    }

    #[test]
    fn reset_turns_discards_half_turn() {
        let mut input = collector();
        let now = Instant::now();
        input.collect(
            &InputFrame {
                encoder: EncoderState::S10,
                ..frame()
            },
            now,
        );
        input.reset_turns();
        let events = input.collect(
            &InputFrame {
                encoder: EncoderState::S00,
                ..frame()
            },
            now,
        );
        assert_eq!(events.rotation, None);
    }

    #[test]
    fn rotation_flows_through() {
        let mut input = collector();
        let now = Instant::now();
        // 11 -> 10 -> 00 is clockwise
        input.collect(
            &InputFrame {
                encoder: EncoderState::S10,
                ..frame()
            },
            now,
        );
        let events = input.collect(
            &InputFrame {
                encoder: EncoderState::S00,
                ..frame()
            },
            now,
        );
        assert_eq!(events.rotation, Some(RotationEvent::Cw));
    }
}
