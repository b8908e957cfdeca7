//! Tilt detection from the accelerometer stream
//!
//! A rest baseline is averaged from still samples when a session starts. Every
//! tick the raw sample is smoothed with an exponential moving average and the
//! X offset from the baseline decides between left, right or level. Y and Z
//! are filtered as well but not classified.

use crate::config::MotionSettings;
use crate::controller::input_source::Vector3;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tilt {
    Left,
    Right,
}

/// Running average over a fixed number of still samples
#[derive(Debug, Clone)]
pub struct Calibration {
    sum: Vector3,
    count: u32,
    target: u32,
}

impl Calibration {
    pub fn new(target: u32) -> Self {
        Self {
            sum: Vector3::ZERO,
            count: 0,
            target: target.max(1),
        }
    }

    /// Adds a sample; returns `true` once enough samples are in.
    pub fn add(&mut self, sample: Vector3) -> bool {
        if !self.is_complete() {
            self.sum = self.sum + sample;
            self.count += 1;
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.target
    }

    pub fn collected(&self) -> u32 {
        self.count
    }

    /// Average of the collected samples, available once complete
    pub fn baseline(&self) -> Option<Vector3> {
        self.is_complete().then(|| self.sum / self.count as f32)
    }
}

#[derive(Debug, Clone)]
pub struct MotionClassifier {
    alpha: f32,
    threshold: f32,
    baseline: Vector3,
    filtered: Vector3,
}

impl MotionClassifier {
    /// Starts the filter at `initial` with a zero baseline until calibrated.
    pub fn new(settings: &MotionSettings, initial: Vector3) -> Self {
        Self {
            alpha: settings.alpha,
            threshold: settings.tilt_threshold,
            baseline: Vector3::ZERO,
            filtered: initial,
        }
    }

    /// Adopts a rest position and restarts the filter from it.
    pub fn set_baseline(&mut self, baseline: Vector3) {
        info!(
            "Motion baseline set to ({:.2}, {:.2}, {:.2})",
            baseline.x, baseline.y, baseline.z
        );
        self.baseline = baseline;
        self.filtered = baseline;
    }

    /// Folds one raw sample into the filter and returns the new filtered value.
    pub fn update(&mut self, raw: Vector3) -> Vector3 {
        self.filtered = raw.scale(self.alpha) + self.filtered.scale(1.0 - self.alpha);
        self.filtered
    }

    /// Classifies the current filtered value against the baseline.
    pub fn classify(&self) -> Option<Tilt> {
        let dx = self.filtered.x - self.baseline.x;
        if dx > self.threshold {
            Some(Tilt::Left)
        } else if dx < -self.threshold {
            Some(Tilt::Right)
        } else {
            None
        }
    }

    /// `update` followed by `classify`
    pub fn sample(&mut self, raw: Vector3) -> Option<Tilt> {
        self.update(raw);
        let tilt = self.classify();
        if let Some(direction) = tilt {
            debug!(
                "Tilt {:?} (dx = {:.2})",
                direction,
                self.filtered.x - self.baseline.x
            );
        }
        tilt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: Vector3 = Vector3::new(0.3, -0.1, 9.8);

    fn calibrated() -> MotionClassifier {
        let mut calibration = Calibration::new(30);
        for _ in 0..30 {
            calibration.add(REST);
        }
        let mut motion = MotionClassifier::new(&MotionSettings::default(), Vector3::ZERO);
        motion.set_baseline(calibration.baseline().unwrap());
        motion
    }

    fn settle(motion: &mut MotionClassifier, raw: Vector3) -> Option<Tilt> {
        let mut last = None;
        for _ in 0..50 {
            last = motion.sample(raw);
        }
        last
    }

    #[test]
    fn calibration_averages_and_resets_filter() {
        let mut calibration = Calibration::new(2);
        calibration.add(Vector3::new(1.0, 2.0, 9.0));
        calibration.add(Vector3::new(3.0, 4.0, 11.0));
        let baseline = calibration.baseline().unwrap();
        assert_eq!(baseline, Vector3::new(2.0, 3.0, 10.0));

        let mut motion = MotionClassifier::new(&MotionSettings::default(), REST);
        motion.set_baseline(baseline);
        assert_eq!(motion.filtered, baseline);
        assert_eq!(motion.classify(), None);
    }

    #[test]
    fn uncalibrated_classifier_uses_zero_baseline() {
        let motion = MotionClassifier::new(&MotionSettings::default(), REST);
        assert_eq!(motion.baseline, Vector3::ZERO);
        assert_eq!(motion.filtered, REST);
    }

    #[test]
    fn extra_samples_after_completion_are_ignored() {
        let mut calibration = Calibration::new(1);
        assert!(calibration.add(Vector3::new(1.0, 1.0, 1.0)));
        assert!(calibration.add(Vector3::new(9.0, 9.0, 9.0)));
        assert_eq!(calibration.collected(), 1);
        assert_eq!(calibration.baseline(), Some(Vector3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn filter_moves_a_fifth_of_the_way() {
        let mut motion = calibrated();
        let out = motion.update(REST + Vector3::new(5.0, 0.0, 0.0));
        assert!((out.x - (REST.x + 1.0)).abs() < 1e-5);
        assert!((out.z - REST.z).abs() < 1e-5);
    }

    #[test]
    fn sustained_positive_offset_is_left() {
        let mut motion = calibrated();
        assert_eq!(
            settle(&mut motion, REST + Vector3::new(5.0, 0.0, 0.0)),
            Some(Tilt::Left)
        );
    }

    #[test]
    fn sustained_negative_offset_is_right() {
        let mut motion = calibrated();
        assert_eq!(
            settle(&mut motion, REST - Vector3::new(5.0, 0.0, 0.0)),
            Some(Tilt::Right)
        );
    }

    #[test]
    fn rest_is_level() {
        let mut motion = calibrated();
        assert_eq!(settle(&mut motion, REST), None);
    }

    #[test]
    fn single_spike_is_smoothed_out() {
        let mut motion = calibrated();
        // one sample at +5 only moves the filter by 1.0
        assert_eq!(motion.sample(REST + Vector3::new(5.0, 0.0, 0.0)), None);
        assert_eq!(motion.sample(REST), None);
    }

    #[test]
    fn only_x_axis_classifies() {
        let mut motion = calibrated();
        assert_eq!(settle(&mut motion, REST + Vector3::new(0.0, 8.0, -8.0)), None);
    }

    #[test]
    fn calibration_accumulator_counts_to_target() {
        let mut calibration = Calibration::new(3);
        assert!(!calibration.add(Vector3::new(1.0, 0.0, 0.0)));
        assert!(!calibration.add(Vector3::new(2.0, 0.0, 0.0)));
        assert_eq!(calibration.baseline(), None);
        assert!(calibration.add(Vector3::new(3.0, 0.0, 0.0)));
        assert_eq!(calibration.collected(), 3);
        assert_eq!(calibration.baseline(), Some(Vector3::new(2.0, 0.0, 0.0)));
    }
}
