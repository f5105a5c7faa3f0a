//! Status effect ledger.
//!
//! This module provides:
//! - The closed set of timed effects and their data table
//! - Per-combatant stacking/replacement policy (one instance per type)
//! - Periodic health payloads (poison, regeneration)
//! - Aggregated attack/defense/speed modifiers

use serde::{Deserialize, Serialize};
use wuxing_common::{CombatError, CombatResult, EntityId};

use crate::stats::CombatantStats;

/// Seconds between periodic payloads.
pub const TRIGGER_INTERVAL: f32 = 1.0;

// ============================================================================
// Effect Types
// ============================================================================

/// Whether an effect helps or hinders its bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Beneficial effect.
    Buff,
    /// Harmful effect.
    Debuff,
}

/// Type of timed effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    /// Loses health every interval.
    Poison,
    /// Gains health every interval.
    Regeneration,
    /// Faster movement and attacks.
    Haste,
    /// Extra defense.
    Shield,
    /// Reduced attack.
    Weakness,
    /// Increased attack at the cost of defense.
    Rage,
}

/// Static numbers describing one effect type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectProfile {
    /// Buff or debuff.
    pub kind: EffectKind,
    /// Attack multiplier while active.
    pub attack_multiplier: f32,
    /// Defense bonus per point of intensity.
    pub defense_bonus: f32,
    /// Speed multiplier while active.
    pub speed_multiplier: f32,
    /// Health change per point of intensity each interval.
    pub health_per_trigger: f32,
}

impl EffectType {
    /// Every effect type.
    pub const ALL: [EffectType; 6] = [
        Self::Poison,
        Self::Regeneration,
        Self::Haste,
        Self::Shield,
        Self::Weakness,
        Self::Rage,
    ];

    /// Data table entry for this effect.
    #[must_use]
    pub const fn profile(self) -> EffectProfile {
        match self {
            Self::Poison => EffectProfile {
                kind: EffectKind::Debuff,
                attack_multiplier: 1.0,
                defense_bonus: 0.0,
                speed_multiplier: 1.0,
                health_per_trigger: -5.0,
            },
            Self::Regeneration => EffectProfile {
                kind: EffectKind::Buff,
                attack_multiplier: 1.0,
                defense_bonus: 0.0,
                speed_multiplier: 1.0,
                health_per_trigger: 5.0,
            },
            Self::Haste => EffectProfile {
                kind: EffectKind::Buff,
                attack_multiplier: 1.0,
                defense_bonus: 0.0,
                speed_multiplier: 1.5,
                health_per_trigger: 0.0,
            },
            Self::Shield => EffectProfile {
                kind: EffectKind::Buff,
                attack_multiplier: 1.0,
                defense_bonus: 10.0,
                speed_multiplier: 1.0,
                health_per_trigger: 0.0,
            },
            Self::Weakness => EffectProfile {
                kind: EffectKind::Debuff,
                attack_multiplier: 0.7,
                defense_bonus: 0.0,
                speed_multiplier: 1.0,
                health_per_trigger: 0.0,
            },
            Self::Rage => EffectProfile {
                kind: EffectKind::Buff,
                attack_multiplier: 1.5,
                defense_bonus: -5.0,
                speed_multiplier: 1.0,
                health_per_trigger: 0.0,
            },
        }
    }

    /// Buff or debuff.
    #[must_use]
    pub const fn kind(self) -> EffectKind {
        self.profile().kind
    }

    /// Check if this is a buff.
    #[must_use]
    pub const fn is_buff(self) -> bool {
        matches!(self.kind(), EffectKind::Buff)
    }

    /// Check if this is a debuff.
    #[must_use]
    pub const fn is_debuff(self) -> bool {
        matches!(self.kind(), EffectKind::Debuff)
    }

    /// Check if this effect has a periodic health payload.
    #[must_use]
    pub fn is_periodic(self) -> bool {
        self.profile().health_per_trigger != 0.0
    }

    /// Lowercase identifier used in data files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Poison => "poison",
            Self::Regeneration => "regeneration",
            Self::Haste => "haste",
            Self::Shield => "shield",
            Self::Weakness => "weakness",
            Self::Rage => "rage",
        }
    }

    /// Effect for a data-file name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
    }
}

// ============================================================================
// Active Effect
// ============================================================================

/// A timed effect currently applied to a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect type.
    pub effect_type: EffectType,
    /// Total duration in seconds.
    pub duration: f32,
    /// Seconds left.
    pub remaining_time: f32,
    /// Strength multiplier.
    pub intensity: f32,
    /// Combatant that applied the effect, for attribution only.
    pub source: Option<EntityId>,
    /// Seconds since the effect was applied.
    pub elapsed: f32,
    /// `elapsed` at the last payload (None = never triggered).
    pub last_trigger_time: Option<f32>,
    /// Seconds between payloads.
    pub trigger_interval: f32,
}

impl ActiveEffect {
    /// Create a new effect instance.
    #[must_use]
    pub fn new(effect_type: EffectType, duration: f32, intensity: f32) -> Self {
        Self {
            effect_type,
            duration,
            remaining_time: duration,
            intensity,
            source: None,
            elapsed: 0.0,
            last_trigger_time: None,
            trigger_interval: TRIGGER_INTERVAL,
        }
    }

    /// Set source combatant.
    #[must_use]
    pub fn with_source(mut self, source: Option<EntityId>) -> Self {
        self.source = source;
        self
    }

    /// Check if expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_time <= 0.0
    }

    /// Check if a payload is due.
    #[must_use]
    pub fn trigger_due(&self) -> bool {
        self.last_trigger_time
            .map_or(true, |last| self.elapsed - last >= self.trigger_interval)
    }

    /// Health change produced by one payload.
    #[must_use]
    pub fn health_delta(&self) -> i32 {
        (self.effect_type.profile().health_per_trigger * self.intensity).round() as i32
    }

    /// Advance timers by `dt` seconds.
    fn advance(&mut self, dt: f32) {
        self.remaining_time -= dt;
        self.elapsed += dt;
    }
}

/// What `add_effect` did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectChange {
    /// No effect of this type existed.
    Added,
    /// A weaker or shorter instance was replaced.
    Replaced,
    /// The existing instance was kept; its remaining time was refreshed.
    Refreshed,
}

/// A periodic payload applied during `update`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectTick {
    /// Effect that fired.
    pub effect_type: EffectType,
    /// Who applied it.
    pub source: Option<EntityId>,
    /// Health change actually applied (negative = damage).
    pub hp_delta: i32,
}

/// Outcome of one ledger update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTickReport {
    /// Payloads applied this update.
    pub ticks: Vec<EffectTick>,
    /// Effects removed this update.
    pub expired: Vec<ActiveEffect>,
}

impl EffectTickReport {
    /// Check if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty() && self.expired.is_empty()
    }
}

/// Aggregated modifiers from all active effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    /// Product of attack multipliers.
    pub attack_multiplier: f32,
    /// Sum of defense bonuses scaled by intensity.
    pub defense_bonus: f32,
    /// Product of speed multipliers.
    pub speed_multiplier: f32,
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self {
            attack_multiplier: 1.0,
            defense_bonus: 0.0,
            speed_multiplier: 1.0,
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Active timed effects of one combatant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLedger {
    effects: Vec<ActiveEffect>,
    modifiers: StatModifiers,
}

impl StatusLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect, honouring the one-instance-per-type policy.
    ///
    /// An existing instance is replaced only when the new one lasts longer
    /// than what remains or is stronger; otherwise its remaining time is
    /// refreshed and its intensity kept.
    pub fn add_effect(
        &mut self,
        effect_type: EffectType,
        duration: f32,
        intensity: f32,
        source: Option<EntityId>,
    ) -> CombatResult<EffectChange> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CombatError::InvalidEffectDuration(duration));
        }
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(CombatError::InvalidEffectIntensity(intensity));
        }

        let incoming = ActiveEffect::new(effect_type, duration, intensity).with_source(source);

        let change = match self.effects.iter_mut().find(|e| e.effect_type == effect_type) {
            None => {
                self.effects.push(incoming);
                EffectChange::Added
            },
            Some(existing)
                if duration > existing.remaining_time || intensity > existing.intensity =>
            {
                *existing = incoming;
                EffectChange::Replaced
            },
            Some(existing) => {
                existing.remaining_time = existing.remaining_time.max(duration);
                EffectChange::Refreshed
            },
        };

        self.recompute_modifiers();
        Ok(change)
    }

    /// Advance all effects by `dt` seconds.
    ///
    /// Payloads are applied to `stats`; expired effects are removed after
    /// the pass and modifiers recomputed if anything was removed.
    pub fn update(&mut self, dt: f32, stats: &mut CombatantStats) -> EffectTickReport {
        let dt = dt.max(0.0);
        let mut report = EffectTickReport::default();

        for effect in &mut self.effects {
            effect.advance(dt);

            if effect.trigger_due() {
                effect.last_trigger_time = Some(effect.elapsed);

                let delta = effect.health_delta();
                let applied = match delta.cmp(&0) {
                    std::cmp::Ordering::Greater => stats.heal(delta),
                    std::cmp::Ordering::Less => -stats.take_damage(-delta),
                    std::cmp::Ordering::Equal => continue,
                };
                report.ticks.push(EffectTick {
                    effect_type: effect.effect_type,
                    source: effect.source,
                    hp_delta: applied,
                });
            }
        }

        let mut i = 0;
        while i < self.effects.len() {
            if self.effects[i].is_expired() {
                report.expired.push(self.effects.remove(i));
            } else {
                i += 1;
            }
        }

        if !report.expired.is_empty() {
            self.recompute_modifiers();
        }

        report
    }

    /// Remove one effect by type.
    pub fn remove_effect(&mut self, effect_type: EffectType) -> Option<ActiveEffect> {
        let index = self.effects.iter().position(|e| e.effect_type == effect_type)?;
        let removed = self.effects.remove(index);
        self.recompute_modifiers();
        Some(removed)
    }

    /// Remove all buffs or all debuffs.
    pub fn clear_effects_by_kind(&mut self, kind: EffectKind) -> Vec<ActiveEffect> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .effects
            .drain(..)
            .partition(|e| e.effect_type.kind() == kind);
        self.effects = kept;
        if !removed.is_empty() {
            self.recompute_modifiers();
        }
        removed
    }

    /// Remove every effect.
    pub fn clear(&mut self) -> Vec<ActiveEffect> {
        let removed = std::mem::take(&mut self.effects);
        self.modifiers = StatModifiers::default();
        removed
    }

    /// Get the active instance of an effect type.
    #[must_use]
    pub fn get(&self, effect_type: EffectType) -> Option<&ActiveEffect> {
        self.effects.iter().find(|e| e.effect_type == effect_type)
    }

    /// Check if an effect type is active.
    #[must_use]
    pub fn has(&self, effect_type: EffectType) -> bool {
        self.get(effect_type).is_some()
    }

    /// Iterate active effects.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Current aggregated modifiers.
    #[must_use]
    pub fn modifiers(&self) -> StatModifiers {
        self.modifiers
    }

    /// Attack after modifiers, floored.
    #[must_use]
    pub fn modified_attack(&self, base: i32) -> i32 {
        (base as f32 * self.modifiers.attack_multiplier).floor() as i32
    }

    /// Defense after modifiers, floored.
    #[must_use]
    pub fn modified_defense(&self, base: i32) -> i32 {
        (base as f32 + self.modifiers.defense_bonus).floor() as i32
    }

    /// Speed after modifiers.
    #[must_use]
    pub fn modified_speed(&self, base: f32) -> f32 {
        base * self.modifiers.speed_multiplier
    }

    fn recompute_modifiers(&mut self) {
        self.modifiers = self
            .effects
            .iter()
            .fold(StatModifiers::default(), |mut acc, effect| {
                let profile = effect.effect_type.profile();
                acc.attack_multiplier *= profile.attack_multiplier;
                acc.defense_bonus += profile.defense_bonus * effect.intensity;
                acc.speed_multiplier *= profile.speed_multiplier;
                acc
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_kinds() {
        assert!(EffectType::Poison.is_debuff());
        assert!(EffectType::Weakness.is_debuff());
        for buff in [
            EffectType::Regeneration,
            EffectType::Haste,
            EffectType::Shield,
            EffectType::Rage,
        ] {
            assert!(buff.is_buff());
        }
        assert!(EffectType::Poison.is_periodic());
        assert!(!EffectType::Haste.is_periodic());
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert_eq!(EffectType::from_name("Poison"), Some(EffectType::Poison));
        assert_eq!(EffectType::from_name("burning"), None);
    }

    #[test]
    fn test_add_new_effect() {
        let mut ledger = StatusLedger::new();
        let source = EntityId::new();
        let change = ledger
            .add_effect(EffectType::Haste, 4.0, 1.0, Some(source))
            .expect("valid effect");

        assert_eq!(change, EffectChange::Added);
        let haste = ledger.get(EffectType::Haste).expect("haste active");
        assert_eq!(haste.remaining_time, 4.0);
        assert_eq!(haste.source, Some(source));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_stacking_law() {
        let mut ledger = StatusLedger::new();
        ledger
            .add_effect(EffectType::Shield, 3.0, 1.0, None)
            .expect("valid effect");

        let change = ledger
            .add_effect(EffectType::Shield, 5.0, 2.0, None)
            .expect("valid effect");
        assert_eq!(change, EffectChange::Replaced);
        let shield = ledger.get(EffectType::Shield).expect("shield active");
        assert_eq!(shield.remaining_time, 5.0);
        assert_eq!(shield.intensity, 2.0);

        let change = ledger
            .add_effect(EffectType::Shield, 1.0, 1.0, None)
            .expect("valid effect");
        assert_eq!(change, EffectChange::Refreshed);
        let shield = ledger.get(EffectType::Shield).expect("shield active");
        assert_eq!(shield.remaining_time, 5.0);
        assert_eq!(shield.intensity, 2.0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_stronger_but_shorter_replaces() {
        let mut ledger = StatusLedger::new();
        ledger
            .add_effect(EffectType::Rage, 10.0, 1.0, None)
            .expect("valid effect");
        let change = ledger
            .add_effect(EffectType::Rage, 2.0, 3.0, None)
            .expect("valid effect");

        assert_eq!(change, EffectChange::Replaced);
        let rage = ledger.get(EffectType::Rage).expect("rage active");
        assert_eq!(rage.remaining_time, 2.0);
        assert_eq!(rage.intensity, 3.0);
    }

    #[test]
    fn test_invalid_duration_is_error() {
        let mut ledger = StatusLedger::new();
        assert_eq!(
            ledger.add_effect(EffectType::Poison, -1.0, 1.0, None),
            Err(CombatError::InvalidEffectDuration(-1.0))
        );
        assert!(ledger.add_effect(EffectType::Poison, f32::NAN, 1.0, None).is_err());
        assert!(ledger.add_effect(EffectType::Poison, 1.0, -2.0, None).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_poison_ticks_each_interval() {
        let mut ledger = StatusLedger::new();
        let mut stats = CombatantStats::new().with_hp(100);
        ledger
            .add_effect(EffectType::Poison, 3.0, 2.0, None)
            .expect("valid effect");

        // First update triggers immediately.
        let report = ledger.update(0.5, &mut stats);
        assert_eq!(report.ticks.len(), 1);
        assert_eq!(report.ticks[0].hp_delta, -10);
        assert_eq!(stats.hp, 90);

        // Half an interval later: nothing.
        let report = ledger.update(0.5, &mut stats);
        assert!(report.ticks.is_empty());
        assert_eq!(stats.hp, 90);

        // Interval elapsed.
        let report = ledger.update(0.5, &mut stats);
        assert_eq!(report.ticks.len(), 1);
        assert_eq!(stats.hp, 80);
    }

    #[test]
    fn test_regeneration_caps_at_max() {
        let mut ledger = StatusLedger::new();
        let mut stats = CombatantStats::new().with_hp(100);
        stats.hp = 98;
        ledger
            .add_effect(EffectType::Regeneration, 5.0, 1.0, None)
            .expect("valid effect");

        let report = ledger.update(0.1, &mut stats);
        assert_eq!(report.ticks[0].hp_delta, 2);
        assert_eq!(stats.hp, 100);
    }

    #[test]
    fn test_expiry_removes_and_recomputes() {
        let mut ledger = StatusLedger::new();
        let mut stats = CombatantStats::new();
        ledger
            .add_effect(EffectType::Weakness, 1.0, 1.0, None)
            .expect("valid effect");
        assert_eq!(ledger.modified_attack(10), 7);

        let report = ledger.update(0.6, &mut stats);
        assert!(report.expired.is_empty());
        let report = ledger.update(0.6, &mut stats);
        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].effect_type, EffectType::Weakness);
        assert!(ledger.is_empty());
        assert_eq!(ledger.modified_attack(10), 10);
    }

    #[test]
    fn test_aggregated_modifiers() {
        let mut ledger = StatusLedger::new();
        ledger
            .add_effect(EffectType::Rage, 5.0, 1.0, None)
            .expect("valid effect");
        ledger
            .add_effect(EffectType::Weakness, 5.0, 1.0, None)
            .expect("valid effect");
        ledger
            .add_effect(EffectType::Shield, 5.0, 2.0, None)
            .expect("valid effect");
        ledger
            .add_effect(EffectType::Haste, 5.0, 1.0, None)
            .expect("valid effect");

        let mods = ledger.modifiers();
        assert!((mods.attack_multiplier - 1.05).abs() < 1e-5);
        // Shield +10 x 2, rage -5 x 1.
        assert!((mods.defense_bonus - 15.0).abs() < 1e-5);
        assert!((mods.speed_multiplier - 1.5).abs() < 1e-5);

        assert_eq!(ledger.modified_attack(30), 31);
        assert_eq!(ledger.modified_defense(5), 20);
        assert!((ledger.modified_speed(2.0) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_clear_by_kind() {
        let mut ledger = StatusLedger::new();
        for effect in EffectType::ALL {
            ledger.add_effect(effect, 5.0, 1.0, None).expect("valid effect");
        }

        let removed = ledger.clear_effects_by_kind(EffectKind::Debuff);
        assert_eq!(removed.len(), 2);
        assert!(!ledger.has(EffectType::Poison));
        assert!(!ledger.has(EffectType::Weakness));
        assert_eq!(ledger.len(), 4);

        let removed = ledger.clear_effects_by_kind(EffectKind::Buff);
        assert_eq!(removed.len(), 4);
        assert!(ledger.is_empty());
        assert_eq!(ledger.modifiers(), StatModifiers::default());
    }

    #[test]
    fn test_remove_effect() {
        let mut ledger = StatusLedger::new();
        ledger
            .add_effect(EffectType::Shield, 5.0, 1.0, None)
            .expect("valid effect");
        assert_eq!(ledger.modified_defense(0), 10);

        assert!(ledger.remove_effect(EffectType::Shield).is_some());
        assert!(ledger.remove_effect(EffectType::Shield).is_none());
        assert_eq!(ledger.modified_defense(0), 0);
    }

    #[test]
    fn test_remaining_never_exceeds_duration() {
        let mut ledger = StatusLedger::new();
        let mut stats = CombatantStats::new();
        ledger
            .add_effect(EffectType::Haste, 4.0, 1.0, None)
            .expect("valid effect");
        ledger.update(1.0, &mut stats);
        ledger
            .add_effect(EffectType::Haste, 2.0, 1.0, None)
            .expect("valid effect");

        for effect in ledger.iter() {
            assert!(effect.remaining_time <= effect.duration);
        }
    }
}
