//! Pointer gesture classification for melee attacks.
//!
//! The pointer is tracked relative to the attacker. Each recorded sample is
//! either a thrust (the pointer moved towards or away from the attacker) or
//! a sweep (the pointer orbited the attacker). Samples live in a rolling
//! time window; the average speed over that window sets the damage quality.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use crate::stats::{Millis, MILLIS_PER_SECOND};

/// Gesture classifier tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Length of the sample window in milliseconds.
    pub window_ms: Millis,
    /// Minimum angle change (radians) for a sample to be recorded.
    pub angle_threshold: f32,
    /// Minimum distance change (world units) for a sample to be recorded.
    pub distance_threshold: f32,
    /// Minimum time between triggered gesture attacks in milliseconds.
    pub trigger_interval_ms: Millis,
    /// Thrust samples needed before a thrust can trigger.
    pub min_thrust_samples: usize,
    /// Sweep samples needed before a sweep can trigger.
    pub min_sweep_samples: usize,
    /// Average speed (units/s) of a moderate gesture.
    pub moderate_speed: f32,
    /// Multiplier at `moderate_speed`.
    pub moderate_multiplier: f32,
    /// Average speed (units/s) of a very fast gesture.
    pub fast_speed: f32,
    /// Multiplier at `fast_speed`.
    pub fast_multiplier: f32,
    /// Lower clamp, also used when nothing moved.
    pub min_multiplier: f32,
    /// Upper clamp.
    pub max_multiplier: f32,
    /// Exclusive upper bound of chip damage while the weapon cools down.
    pub chip_damage_max: f32,
    /// Units/s per normalized speed unit.
    pub speed_unit: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000.0,
            angle_threshold: 0.05,
            distance_threshold: 2.0,
            trigger_interval_ms: 150.0,
            min_thrust_samples: 2,
            min_sweep_samples: 1,
            moderate_speed: 300.0,
            moderate_multiplier: 1.1,
            fast_speed: 1200.0,
            fast_multiplier: 3.0,
            min_multiplier: 0.5,
            max_multiplier: 3.0,
            chip_damage_max: 5.0,
            speed_unit: 100.0,
        }
    }
}

impl GestureConfig {
    /// Multiplier for an average gesture speed, clamped to the configured
    /// range. The line passes through both calibration points.
    #[must_use]
    pub fn multiplier_for_speed(&self, average_speed: f32) -> f32 {
        let span = self.fast_speed - self.moderate_speed;
        let raw = if span.abs() < f32::EPSILON {
            self.moderate_multiplier
        } else {
            let slope = (self.fast_multiplier - self.moderate_multiplier) / span;
            self.moderate_multiplier + slope * (average_speed - self.moderate_speed)
        };
        raw.clamp(self.min_multiplier, self.max_multiplier)
    }
}

/// Shape of a gesture sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureShape {
    /// Radial motion towards or away from the attacker.
    Thrust,
    /// Angular motion around the attacker.
    Sweep,
}

/// One recorded pointer movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    /// When the sample was taken.
    pub timestamp: Millis,
    /// Signed angle change, wrapped to [-pi, pi].
    pub angle_delta: f32,
    /// Change in pointer distance from the attacker.
    pub distance_delta: f32,
    /// Classification.
    pub shape: GestureShape,
    /// Arc length for sweeps, radial distance for thrusts.
    pub traveled: f32,
}

/// Statistics over the samples in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureStats {
    /// Samples in the window.
    pub sample_count: usize,
    /// Thrust samples in the window.
    pub thrust_count: usize,
    /// Sweep samples in the window.
    pub sweep_count: usize,
    /// Distance traveled by thrust samples.
    pub thrust_distance: f32,
    /// Distance traveled by sweep samples.
    pub sweep_distance: f32,
    /// Total distance traveled.
    pub total_distance: f32,
    /// `total_distance` per second of window.
    pub average_speed: f32,
    /// `average_speed` in normalized speed units.
    pub speed_units: f32,
}

impl GestureStats {
    /// Shape that covered the most distance, if any sample exists.
    #[must_use]
    pub fn dominant_shape(&self) -> Option<GestureShape> {
        if self.sample_count == 0 {
            None
        } else if self.sweep_distance > self.thrust_distance {
            Some(GestureShape::Sweep)
        } else {
            Some(GestureShape::Thrust)
        }
    }
}

/// A gesture that was turned into an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureReading {
    /// Dominant shape at trigger time.
    pub shape: GestureShape,
    /// Window statistics at trigger time.
    pub stats: GestureStats,
}

/// Wrap an angle to [-pi, pi).
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Rolling gesture classifier for one attacker.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: GestureConfig,
    samples: VecDeque<GestureSample>,
    /// Angle and distance of the last recorded pointer position.
    reference: Option<(f32, f32)>,
    stats: GestureStats,
    last_trigger: Option<Millis>,
}

impl GestureClassifier {
    /// Create a classifier with the given tuning.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Statistics as of the last update.
    #[must_use]
    pub fn stats(&self) -> GestureStats {
        self.stats
    }

    /// Samples currently in the window.
    pub fn samples(&self) -> impl Iterator<Item = &GestureSample> {
        self.samples.iter()
    }

    /// Feed a pointer position. Returns the shape of the recorded sample,
    /// or `None` when the movement was below both thresholds.
    pub fn update(&mut self, pointer: Vec2, attacker: Vec2, now: Millis) -> Option<GestureShape> {
        self.purge(now);

        let offset = pointer - attacker;
        let distance = offset.length();
        let angle = offset.y.atan2(offset.x);

        let Some((ref_angle, ref_distance)) = self.reference else {
            self.reference = Some((angle, distance));
            self.recompute_stats();
            return None;
        };

        let angle_delta = wrap_angle(angle - ref_angle);
        let distance_delta = distance - ref_distance;

        if angle_delta.abs() <= self.config.angle_threshold
            && distance_delta.abs() <= self.config.distance_threshold
        {
            self.recompute_stats();
            return None;
        }

        let arc = angle_delta.abs() * distance;
        let linear = distance_delta.abs() * 2.0;
        let (shape, traveled) = if arc > linear {
            (GestureShape::Sweep, arc)
        } else {
            (GestureShape::Thrust, distance_delta.abs())
        };

        self.samples.push_back(GestureSample {
            timestamp: now,
            angle_delta,
            distance_delta,
            shape,
            traveled,
        });
        self.reference = Some((angle, distance));
        self.recompute_stats();

        Some(shape)
    }

    /// Drop samples older than the window and refresh statistics.
    pub fn refresh(&mut self, now: Millis) {
        self.purge(now);
        self.recompute_stats();
    }

    /// Damage multiplier for the current window.
    ///
    /// While the weapon cools down this is a small chip value instead of a
    /// multiplier.
    pub fn damage_multiplier(&self, weapon_ready: bool, rng: &mut fastrand::Rng) -> f32 {
        if !weapon_ready {
            return rng.f32() * self.config.chip_damage_max;
        }
        if self.stats.total_distance <= 0.0 {
            return self.config.min_multiplier;
        }
        self.config.multiplier_for_speed(self.stats.average_speed)
    }

    /// Check whether the current gesture may trigger an attack.
    #[must_use]
    pub fn can_trigger(&self, now: Millis) -> bool {
        let interval_ok = self
            .last_trigger
            .map_or(true, |last| now - last >= self.config.trigger_interval_ms);
        if !interval_ok {
            return false;
        }

        let stats = self.window_stats(now);
        if stats.sample_count == 0 || stats.total_distance <= 0.0 {
            return false;
        }

        match stats.dominant_shape() {
            Some(GestureShape::Thrust) => stats.thrust_count >= self.config.min_thrust_samples,
            Some(GestureShape::Sweep) => stats.sweep_count >= self.config.min_sweep_samples,
            None => false,
        }
    }

    /// Consume the current gesture. Clears the window so the same motion
    /// cannot trigger twice.
    pub fn trigger(&mut self, now: Millis) -> Option<GestureReading> {
        if !self.can_trigger(now) {
            return None;
        }
        let stats = self.window_stats(now);
        let shape = stats.dominant_shape()?;

        self.last_trigger = Some(now);
        self.samples.clear();
        self.stats = GestureStats::default();

        Some(GestureReading { shape, stats })
    }

    /// Forget all samples, the reference position and the trigger timer.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.reference = None;
        self.stats = GestureStats::default();
        self.last_trigger = None;
    }

    fn purge(&mut self, now: Millis) {
        let window = self.config.window_ms;
        while self
            .samples
            .front()
            .is_some_and(|s| now - s.timestamp > window)
        {
            self.samples.pop_front();
        }
    }

    fn window_stats(&self, now: Millis) -> GestureStats {
        let window = self.config.window_ms;
        self.compute_stats(
            self.samples
                .iter()
                .filter(|s| now - s.timestamp <= window),
        )
    }

    fn recompute_stats(&mut self) {
        self.stats = self.compute_stats(self.samples.iter());
    }

    fn compute_stats<'a>(&self, samples: impl Iterator<Item = &'a GestureSample>) -> GestureStats {
        let mut stats = GestureStats::default();
        for sample in samples {
            stats.sample_count += 1;
            match sample.shape {
                GestureShape::Thrust => {
                    stats.thrust_count += 1;
                    stats.thrust_distance += sample.traveled;
                },
                GestureShape::Sweep => {
                    stats.sweep_count += 1;
                    stats.sweep_distance += sample.traveled;
                },
            }
        }
        stats.total_distance = stats.thrust_distance + stats.sweep_distance;

        let window_secs = (self.config.window_ms / MILLIS_PER_SECOND) as f32;
        if window_secs > 0.0 {
            stats.average_speed = stats.total_distance / window_secs;
        }
        if self.config.speed_unit > 0.0 {
            stats.speed_units = stats.average_speed / self.config.speed_unit;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_angle(angle: f32, distance: f32) -> Vec2 {
        Vec2::new(angle.cos(), angle.sin()) * distance
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(0.0)).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-TAU - 0.5) + 0.5).abs() < 1e-5);
        let wrapped = wrap_angle(3.0 * PI / 2.0);
        assert!((wrapped + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_buffer_cannot_trigger() {
        let classifier = GestureClassifier::new(GestureConfig::default());
        assert!(!classifier.can_trigger(0.0));
        assert!(!classifier.can_trigger(1_000_000.0));
    }

    #[test]
    fn test_first_update_sets_reference_only() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        assert_eq!(classifier.update(Vec2::new(50.0, 0.0), Vec2::ZERO, 0.0), None);
        assert_eq!(classifier.stats().sample_count, 0);
    }

    #[test]
    fn test_jitter_is_ignored() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(Vec2::new(50.0, 0.0), Vec2::ZERO, 0.0);
        assert_eq!(classifier.update(Vec2::new(51.0, 0.5), Vec2::ZERO, 16.0), None);
        assert_eq!(classifier.stats().sample_count, 0);
    }

    #[test]
    fn test_radial_motion_is_thrust() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let attacker = Vec2::new(100.0, 100.0);
        classifier.update(attacker + Vec2::new(20.0, 0.0), attacker, 0.0);
        let shape = classifier.update(attacker + Vec2::new(60.0, 0.0), attacker, 16.0);

        assert_eq!(shape, Some(GestureShape::Thrust));
        let stats = classifier.stats();
        assert_eq!(stats.thrust_count, 1);
        assert!((stats.total_distance - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_motion_is_sweep() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(0.0, 80.0), Vec2::ZERO, 0.0);
        let shape = classifier.update(at_angle(0.5, 80.0), Vec2::ZERO, 16.0);

        assert_eq!(shape, Some(GestureShape::Sweep));
        let stats = classifier.stats();
        assert_eq!(stats.sweep_count, 1);
        assert!((stats.total_distance - 40.0).abs() < 1e-2);
        assert_eq!(stats.dominant_shape(), Some(GestureShape::Sweep));
    }

    #[test]
    fn test_sweep_across_the_back_wraps() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(PI - 0.1, 60.0), Vec2::ZERO, 0.0);
        classifier.update(at_angle(-PI + 0.1, 60.0), Vec2::ZERO, 16.0);

        let sample = *classifier.samples().next().expect("one sample");
        assert!((sample.angle_delta - 0.2).abs() < 1e-4);
        assert_eq!(sample.shape, GestureShape::Sweep);
    }

    #[test]
    fn test_samples_expire_with_window() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(0.0, 80.0), Vec2::ZERO, 0.0);
        classifier.update(at_angle(0.5, 80.0), Vec2::ZERO, 100.0);
        assert_eq!(classifier.stats().sample_count, 1);

        classifier.refresh(1200.0);
        assert_eq!(classifier.stats().sample_count, 0);
        assert!(!classifier.can_trigger(1200.0));
    }

    #[test]
    fn test_single_thrust_does_not_trigger() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(Vec2::new(20.0, 0.0), Vec2::ZERO, 0.0);
        classifier.update(Vec2::new(40.0, 0.0), Vec2::ZERO, 16.0);
        assert!(!classifier.can_trigger(200.0));

        classifier.update(Vec2::new(60.0, 0.0), Vec2::ZERO, 32.0);
        assert!(classifier.can_trigger(200.0));
    }

    #[test]
    fn test_single_sweep_triggers() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(0.0, 80.0), Vec2::ZERO, 0.0);
        classifier.update(at_angle(0.4, 80.0), Vec2::ZERO, 16.0);
        assert!(classifier.can_trigger(16.0));
    }

    #[test]
    fn test_trigger_resets_and_rate_limits() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(0.0, 80.0), Vec2::ZERO, 0.0);
        classifier.update(at_angle(0.4, 80.0), Vec2::ZERO, 16.0);

        let reading = classifier.trigger(16.0).expect("sweep triggers");
        assert_eq!(reading.shape, GestureShape::Sweep);
        assert_eq!(reading.stats.sweep_count, 1);
        assert_eq!(classifier.stats().sample_count, 0);

        classifier.update(at_angle(0.8, 80.0), Vec2::ZERO, 50.0);
        assert!(!classifier.can_trigger(50.0));
        assert!(classifier.can_trigger(200.0));
    }

    #[test]
    fn test_multiplier_calibration() {
        let config = GestureConfig::default();
        assert!((config.multiplier_for_speed(300.0) - 1.1).abs() < 1e-4);
        assert!((config.multiplier_for_speed(1200.0) - 3.0).abs() < 1e-4);
        assert_eq!(config.multiplier_for_speed(0.0), 0.5);
        assert_eq!(config.multiplier_for_speed(10_000.0), 3.0);
    }

    #[test]
    fn test_damage_multiplier_without_motion() {
        let classifier = GestureClassifier::new(GestureConfig::default());
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(classifier.damage_multiplier(true, &mut rng), 0.5);
    }

    #[test]
    fn test_damage_multiplier_on_cooldown_is_chip() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.update(at_angle(0.0, 80.0), Vec2::ZERO, 0.0);
        classifier.update(at_angle(1.0, 80.0), Vec2::ZERO, 16.0);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            let chip = classifier.damage_multiplier(false, &mut rng);
            assert!((0.0..5.0).contains(&chip));
        }
    }

    #[test]
    fn test_damage_multiplier_scales_with_speed() {
        let mut slow = GestureClassifier::new(GestureConfig::default());
        slow.update(Vec2::new(20.0, 0.0), Vec2::ZERO, 0.0);
        slow.update(Vec2::new(60.0, 0.0), Vec2::ZERO, 16.0);

        let mut fast = GestureClassifier::new(GestureConfig::default());
        fast.update(at_angle(0.0, 100.0), Vec2::ZERO, 0.0);
        for step in 1..=8 {
            fast.update(at_angle(step as f32 * 1.5, 100.0), Vec2::ZERO, step as f64 * 16.0);
        }

        let mut rng = fastrand::Rng::with_seed(1);
        let slow_mult = slow.damage_multiplier(true, &mut rng);
        let fast_mult = fast.damage_multiplier(true, &mut rng);
        assert!(slow_mult < fast_mult);
        assert!(fast_mult <= 3.0);
        assert!(slow_mult >= 0.5);
    }
}
