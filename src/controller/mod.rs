//! Controller subsystem: raw hardware samples to decoded input events
//!
//! One frame is sampled per tick and fanned out to three decoders:
//!
//! 1. [`encoder`] - quadrature decoding with settle-time debounce
//! 2. [`edge`] - one-shot clicks for the knob switch and the action button
//! 3. [`motion`] - baseline calibration, EMA filter and tilt classification
//!
//! # Architecture
//!
//! ```text
//! InputSource ──► InputFrame ──► InputCollector ──► TickEvents
//!  (GPIO/I2C)     (one tick)     (decoder state)    (to the router)
//! ```

pub mod collector;
pub mod edge;
pub mod encoder;
pub mod gpio;
pub mod input_source;
pub mod motion;

pub use collector::{InputCollector, TickEvents};
pub use edge::{ButtonId, EdgeDetector};
pub use encoder::{EncoderDecoder, EncoderState, RotationEvent};
pub use gpio::GpioInput;
pub use input_source::{InputFrame, InputSource, PinId, Vector3};
pub use motion::{Calibration, MotionClassifier, Tilt};
