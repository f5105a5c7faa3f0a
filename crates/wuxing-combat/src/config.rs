//! Combat configuration.
//!
//! Tuning for targeting, damage variance, death handling and gestures.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::combatant::DEFAULT_ATTACK_RANGE;
use crate::gesture::GestureConfig;
use crate::stats::{Millis, DEFAULT_ATTACK_COOLDOWN};

/// Configuration file name.
pub const CONFIG_FILE: &str = "wuxing.toml";

/// Errors raised when saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Combat tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === Targeting ===
    /// Radius around a click that picks an enemy.
    pub pick_radius: f32,
    /// Attack range applied by `Combatant::with_config_defaults`.
    pub default_attack_range: f32,
    /// Attack cooldown (ms) applied by `Combatant::with_config_defaults`.
    pub default_attack_cooldown: Millis,

    // === Damage ===
    /// Half-width of the uniform damage variance (0.15 = +-15%).
    pub damage_variance: f32,
    /// Gesture multiplier at or above which a hit is critical.
    pub critical_gesture_threshold: f32,

    // === Lifecycle ===
    /// Seconds between dying and dead.
    pub death_animation_secs: f32,
    /// Seconds without combat activity before leaving combat.
    pub combat_timeout_secs: f32,

    // === Determinism ===
    /// Seed for variance and chip damage (None = random).
    pub rng_seed: Option<u64>,
    /// Event bus capacity.
    pub event_capacity: usize,

    // === Gestures ===
    /// Gesture classifier tuning.
    pub gesture: GestureConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            // Targeting
            pick_radius: 12.0,
            default_attack_range: DEFAULT_ATTACK_RANGE,
            default_attack_cooldown: DEFAULT_ATTACK_COOLDOWN,

            // Damage
            damage_variance: 0.15,
            critical_gesture_threshold: 2.0,

            // Lifecycle
            death_animation_secs: 1.5,
            combat_timeout_secs: 5.0,

            // Determinism
            rng_seed: None,
            event_capacity: 1024,

            gesture: GestureConfig::default(),
        }
    }
}

impl CombatConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.pick_radius = self.pick_radius.max(0.0);
        self.default_attack_range = self.default_attack_range.max(0.0);
        self.default_attack_cooldown = self.default_attack_cooldown.max(0.0);
        self.damage_variance = self.damage_variance.clamp(0.0, 0.9);
        self.death_animation_secs = self.death_animation_secs.max(0.0);
        self.combat_timeout_secs = self.combat_timeout_secs.max(0.0);
        self.event_capacity = self.event_capacity.max(1);
        self.gesture.window_ms = self.gesture.window_ms.max(1.0);
        if self.gesture.min_multiplier > self.gesture.max_multiplier {
            std::mem::swap(
                &mut self.gesture.min_multiplier,
                &mut self.gesture.max_multiplier,
            );
        }
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Set the damage variance.
    #[must_use]
    pub fn with_damage_variance(mut self, variance: f32) -> Self {
        self.damage_variance = variance.clamp(0.0, 0.9);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CombatConfig::default();
        assert!((config.pick_radius - 12.0).abs() < f32::EPSILON);
        assert!((config.damage_variance - 0.15).abs() < f32::EPSILON);
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.gesture, GestureConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CombatConfig::load_from(dir.path().join(CONFIG_FILE));
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "pick_radius = \"wide\"").expect("write");
        assert_eq!(CombatConfig::load_from(&path), CombatConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "pick_radius = 20.0\nrng_seed = 7\n\n[gesture]\nfast_multiplier = 2.5\n",
        )
        .expect("write");

        let config = CombatConfig::load_from(&path);
        assert!((config.pick_radius - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.rng_seed, Some(7));
        assert!((config.gesture.fast_multiplier - 2.5).abs() < f32::EPSILON);
        assert!((config.gesture.moderate_multiplier - 1.1).abs() < f32::EPSILON);
        assert!((config.combat_timeout_secs - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = CombatConfig::default()
            .with_seed(42)
            .with_damage_variance(0.2);

        config.save_to(&path).expect("save");
        assert_eq!(CombatConfig::load_from(&path), config);
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = CombatConfig {
            damage_variance: 4.0,
            pick_radius: -3.0,
            event_capacity: 0,
            ..CombatConfig::default()
        };
        config.validate();
        assert!((config.damage_variance - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.pick_radius, 0.0);
        assert_eq!(config.event_capacity, 1);
    }
}
