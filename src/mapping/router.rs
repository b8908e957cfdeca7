//! Expected-move matching

use crate::controller::{RotationEvent, Tilt, TickEvents};
use crate::mapping::Move;
use tracing::trace;

/// Stateless matcher between one tick's events and the expected [`Move`].
///
/// Anything other than the expected move is dropped silently; a wrong gesture
/// is never treated as a wrong answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureRouter;

impl GestureRouter {
    pub fn new() -> Self {
        Self
    }

    /// Has `expected` occurred in this tick?
    ///
    /// [`Move::PushButton`] matches on the button level rather than the click
    /// edge, so it fires the instant the button goes down.
    pub fn matches(&self, expected: Move, events: &TickEvents) -> bool {
        let hit = match expected {
            Move::TurnCw => events.rotation == Some(RotationEvent::Cw),
            Move::TurnCcw => events.rotation == Some(RotationEvent::Ccw),
            Move::PushButton => events.button_pressed,
            Move::PushEncoder => events.encoder_clicked,
            Move::TiltLeft => events.tilt == Some(Tilt::Left),
            Move::TiltRight => events.tilt == Some(Tilt::Right),
        };
        if !hit && *events != TickEvents::default() {
            trace!("Ignoring {:?} while waiting for {:?}", events, expected);
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn everything() -> TickEvents {
        TickEvents {
            rotation: Some(RotationEvent::Cw),
            encoder_clicked: true,
            button_pressed: true,
            tilt: Some(Tilt::Left),
        }
    }

    #[test]
    fn each_move_has_its_trigger() {
        let router = GestureRouter::new();
        let cases = [
            (
                Move::TurnCw,
                TickEvents {
                    rotation: Some(RotationEvent::Cw),
                    ..Default::default()
                },
            ),
            (
                Move::TurnCcw,
                TickEvents {
                    rotation: Some(RotationEvent::Ccw),
                    ..Default::default()
                },
            ),
            (
                Move::PushButton,
                TickEvents {
                    button_pressed: true,
                    ..Default::default()
                },
            ),
            (
                Move::PushEncoder,
                TickEvents {
                    encoder_clicked: true,
                    ..Default::default()
                },
            ),
            (
                Move::TiltLeft,
                TickEvents {
                    tilt: Some(Tilt::Left),
                    ..Default::default()
                },
            ),
            (
                Move::TiltRight,
                TickEvents {
                    tilt: Some(Tilt::Right),
                    ..Default::default()
                },
            ),
        ];

        for (expected, events) in cases {
            for candidate in Move::ALL {
                assert_eq!(
                    router.matches(candidate, &events),
                    candidate == expected,
                    "{:?} against {:?}",
                    candidate,
                    events
                );
            }
        }
    }

    #[test]
    fn simultaneous_events_only_answer_the_expected_move() {
        let router = GestureRouter::new();
        let events = everything();
        assert!(router.matches(Move::TurnCw, &events));
        assert!(!router.matches(Move::TurnCcw, &events));
        assert!(!router.matches(Move::TiltRight, &events));
    }

    #[test]
    fn quiet_tick_matches_nothing() {
        let router = GestureRouter::new();
        assert!(Move::ALL
            .iter()
            .all(|m| !router.matches(*m, &TickEvents::default())));
    }

    #[test]
    fn labels_are_distinct() {
        let labels: std::collections::HashSet<_> = Move::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels.len(), Move::ALL.len());
    }
}
