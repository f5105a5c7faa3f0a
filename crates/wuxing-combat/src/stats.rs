//! Combatant statistics and attack cooldown tracking.
//!
//! This module provides:
//! - Core combat statistics (hp, mp, attack, defense, elemental affinities)
//! - The per-combatant attack cooldown gate
//! - Shared cooldown progress math used by attacks and skills

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::element::Element;

/// Timestamp in milliseconds, as supplied by the game loop.
pub type Millis = f64;

/// Milliseconds per second, for skill cooldowns authored in seconds.
pub const MILLIS_PER_SECOND: f64 = 1000.0;

// ============================================================================
// Base Stats
// ============================================================================

/// Core combat statistics for a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantStats {
    /// Current health points.
    pub hp: i32,
    /// Maximum health points.
    pub max_hp: i32,
    /// Current mana points.
    pub mp: i32,
    /// Maximum mana points.
    pub max_mp: i32,
    /// Base attack power.
    pub attack: i32,
    /// Base defense value.
    pub defense: i32,
    /// Movement/attack speed factor.
    pub speed: f32,
    /// Character level.
    pub level: u32,
    /// Element the combatant is aligned with when defending.
    pub main_element: Element,
    /// Elemental attack power per element.
    pub element_attack: HashMap<Element, i32>,
    /// Elemental defense per element.
    pub element_defense: HashMap<Element, i32>,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            hp: 100,
            max_hp: 100,
            mp: 50,
            max_mp: 50,
            attack: 10,
            defense: 5,
            speed: 1.0,
            level: 1,
            main_element: Element::default(),
            element_attack: HashMap::new(),
            element_defense: HashMap::new(),
        }
    }
}

impl CombatantStats {
    /// Create new stats with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current and maximum HP.
    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    /// Set current and maximum MP.
    #[must_use]
    pub fn with_mp(mut self, mp: i32) -> Self {
        self.mp = mp;
        self.max_mp = mp;
        self
    }

    /// Set attack power.
    #[must_use]
    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    /// Set defense.
    #[must_use]
    pub fn with_defense(mut self, defense: i32) -> Self {
        self.defense = defense;
        self
    }

    /// Set speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Set level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Set main element.
    #[must_use]
    pub fn with_main_element(mut self, element: Element) -> Self {
        self.main_element = element;
        self
    }

    /// Set elemental attack for one element.
    #[must_use]
    pub fn with_element_attack(mut self, element: Element, value: i32) -> Self {
        self.element_attack.insert(element, value);
        self
    }

    /// Set elemental defense for one element.
    #[must_use]
    pub fn with_element_defense(mut self, element: Element, value: i32) -> Self {
        self.element_defense.insert(element, value);
        self
    }

    /// Elemental attack for an element (0 when absent).
    #[must_use]
    pub fn element_attack(&self, element: Element) -> i32 {
        self.element_attack.get(&element).copied().unwrap_or(0)
    }

    /// Elemental defense for an element (0 when absent).
    #[must_use]
    pub fn element_defense(&self, element: Element) -> i32 {
        self.element_defense.get(&element).copied().unwrap_or(0)
    }

    /// Check if dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Check if alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Get HP percentage (0.0-1.0).
    #[must_use]
    pub fn hp_percent(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
        }
    }

    /// Heal, capped at max HP. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    /// Take damage, floored at zero HP. Returns the amount actually removed.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        before - self.hp
    }

    /// Spend mana if enough is available.
    pub fn spend_mana(&mut self, amount: i32) -> bool {
        if self.mp >= amount {
            self.mp -= amount.max(0);
            true
        } else {
            false
        }
    }

    /// Check if enough mana is available.
    #[must_use]
    pub fn has_mana(&self, amount: i32) -> bool {
        self.mp >= amount
    }

    /// Restore HP and MP to their maximums.
    pub fn restore_full(&mut self) {
        self.hp = self.max_hp;
        self.mp = self.max_mp;
    }
}

// ============================================================================
// Attack Cooldown
// ============================================================================

/// Progress of a cooldown that started at `last_use` and lasts
/// `cooldown` milliseconds. Never-used and zero-length cooldowns are ready.
#[must_use]
pub fn cooldown_progress(last_use: Option<Millis>, cooldown: Millis, now: Millis) -> f32 {
    match last_use {
        None => 1.0,
        Some(_) if cooldown <= 0.0 => 1.0,
        Some(last) => ((now - last) / cooldown).clamp(0.0, 1.0) as f32,
    }
}

/// Check whether a cooldown that started at `last_use` has elapsed.
#[must_use]
pub fn cooldown_ready(last_use: Option<Millis>, cooldown: Millis, now: Millis) -> bool {
    match last_use {
        None => true,
        Some(last) => now - last >= cooldown,
    }
}

/// Attack cooldown used when none is configured (ms).
pub const DEFAULT_ATTACK_COOLDOWN: Millis = 1000.0;

/// Attack cooldown gate for one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackCooldownState {
    /// Time of the last successful attack (None = never attacked).
    pub last_attack_time: Option<Millis>,
    /// Cooldown between attacks in milliseconds.
    pub attack_cooldown: Millis,
}

impl Default for AttackCooldownState {
    fn default() -> Self {
        Self::new(DEFAULT_ATTACK_COOLDOWN)
    }
}

impl AttackCooldownState {
    /// Create a cooldown gate that has never fired.
    #[must_use]
    pub fn new(attack_cooldown: Millis) -> Self {
        Self {
            last_attack_time: None,
            attack_cooldown: attack_cooldown.max(0.0),
        }
    }

    /// Check if an attack is allowed at `now`.
    #[must_use]
    pub fn can_attack(&self, now: Millis) -> bool {
        cooldown_ready(self.last_attack_time, self.attack_cooldown, now)
    }

    /// Record a successful attack.
    pub fn record_attack(&mut self, now: Millis) {
        self.last_attack_time = Some(now);
    }

    /// Cooldown progress (1.0 = ready).
    #[must_use]
    pub fn progress(&self, now: Millis) -> f32 {
        cooldown_progress(self.last_attack_time, self.attack_cooldown, now)
    }

    /// Milliseconds left until the next attack is allowed.
    #[must_use]
    pub fn remaining(&self, now: Millis) -> Millis {
        self.last_attack_time
            .map_or(0.0, |last| (self.attack_cooldown - (now - last)).max(0.0))
    }

    /// Forget the last attack.
    pub fn reset(&mut self) {
        self.last_attack_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_builder() {
        let stats = CombatantStats::new()
            .with_hp(50)
            .with_attack(20)
            .with_defense(8)
            .with_main_element(Element::Wood)
            .with_element_attack(Element::Fire, 12);

        assert_eq!(stats.hp, 50);
        assert_eq!(stats.max_hp, 50);
        assert_eq!(stats.attack, 20);
        assert_eq!(stats.defense, 8);
        assert_eq!(stats.main_element, Element::Wood);
        assert_eq!(stats.element_attack(Element::Fire), 12);
        assert_eq!(stats.element_attack(Element::Water), 0);
        assert_eq!(stats.element_defense(Element::Fire), 0);
    }

    #[test]
    fn test_take_damage_and_heal() {
        let mut stats = CombatantStats::new().with_hp(30);

        assert_eq!(stats.take_damage(12), 12);
        assert_eq!(stats.hp, 18);

        assert_eq!(stats.take_damage(100), 18);
        assert_eq!(stats.hp, 0);
        assert!(stats.is_dead());

        stats.hp = 25;
        assert_eq!(stats.heal(10), 5);
        assert_eq!(stats.hp, 30);
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        let mut stats = CombatantStats::new().with_hp(100);
        stats.hp = 50;

        assert_eq!(stats.heal(i32::MAX), 50);
        assert_eq!(stats.hp, 100);

        stats.hp = -5;
        assert_eq!(stats.take_damage(i32::MAX), -5);
        assert_eq!(stats.hp, 0);
    }

    #[test]
    fn test_spend_mana() {
        let mut stats = CombatantStats::new().with_mp(20);
        assert!(stats.spend_mana(15));
        assert_eq!(stats.mp, 5);
        assert!(!stats.spend_mana(10));
        assert_eq!(stats.mp, 5);

        stats.restore_full();
        assert_eq!(stats.mp, 20);
    }

    #[test]
    fn test_hp_percent() {
        let mut stats = CombatantStats::new().with_hp(200);
        stats.hp = 50;
        assert!((stats.hp_percent() - 0.25).abs() < f32::EPSILON);

        stats.max_hp = 0;
        assert_eq!(stats.hp_percent(), 0.0);
    }

    #[test]
    fn test_cooldown_never_attacked_is_ready() {
        let cd = AttackCooldownState::new(800.0);
        assert!(cd.can_attack(0.0));
        assert_eq!(cd.progress(12_345.0), 1.0);
        assert_eq!(cd.remaining(5.0), 0.0);
    }

    #[test]
    fn test_cooldown_cycle() {
        let mut cd = AttackCooldownState::new(1000.0);
        cd.record_attack(5000.0);

        assert!(!cd.can_attack(5000.0));
        assert!(cd.progress(5000.0) < 0.1);
        assert!((cd.progress(5500.0) - 0.5).abs() < 1e-6);
        assert!((cd.remaining(5250.0) - 750.0).abs() < 1e-9);
        assert!(cd.can_attack(6000.0));
        assert_eq!(cd.progress(9000.0), 1.0);

        cd.reset();
        assert!(cd.can_attack(5001.0));
    }

    #[test]
    fn test_cooldown_progress_zero_length() {
        assert_eq!(cooldown_progress(Some(100.0), 0.0, 100.0), 1.0);
        assert!(cooldown_ready(Some(100.0), 0.0, 100.0));
    }

    #[test]
    fn test_cooldown_clock_behind_last_use() {
        // A `now` earlier than the last use reads as "just used".
        assert_eq!(cooldown_progress(Some(2000.0), 1000.0, 1500.0), 0.0);
        assert!(!cooldown_ready(Some(2000.0), 1000.0, 1500.0));
    }
}
