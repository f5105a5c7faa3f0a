//! Combatant records and the store the combat system reads them from.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wuxing_common::{CombatError, CombatResult, EntityId, SkillId};

use crate::config::CombatConfig;
use crate::effects::StatusLedger;
use crate::gesture::{GestureClassifier, GestureConfig};
use crate::skills::SkillEntry;
use crate::stats::{cooldown_progress, cooldown_ready, AttackCooldownState, CombatantStats, Millis};

/// Basic attack reach used when none is configured.
pub const DEFAULT_ATTACK_RANGE: f32 = 50.0;

// ============================================================================
// Classification
// ============================================================================

/// Who controls a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    /// Player-controlled.
    Player,
    /// Hostile to players.
    Enemy,
    /// Never hostile.
    Neutral,
}

impl CombatantKind {
    /// Check if two kinds fight each other.
    #[must_use]
    pub const fn is_hostile_to(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Player, Self::Enemy) | (Self::Enemy, Self::Player)
        )
    }
}

/// Life cycle of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LifeState {
    /// Alive.
    Alive,
    /// Playing the death animation.
    Dying {
        /// Seconds since death.
        elapsed: f32,
    },
    /// Dead; only a revive leaves this state.
    Dead,
}

/// Observable combat state, derived from combatant data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    /// No target.
    Idle,
    /// Target selected but out of range.
    Targeting,
    /// Target in range and attack ready.
    AttackReady,
    /// Target in range, attack cooling down.
    OnCooldown,
    /// Casting a skill.
    Casting,
    /// Death animation playing.
    Dying,
    /// Dead.
    Dead,
}

// ============================================================================
// Combat Component
// ============================================================================

/// A skill cast waiting for its cast time to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingCast {
    /// Skill slot on the caster.
    pub slot: usize,
    /// Skill ID.
    pub skill: SkillId,
    /// Target.
    pub target: EntityId,
    /// When the cast started (ms).
    pub started_at: Millis,
    /// When the cast resolves (ms).
    pub completes_at: Millis,
}

/// Targeting, skills and gesture state of a combatant.
#[derive(Debug, Clone)]
pub struct CombatComponent {
    /// Selected target.
    pub target: Option<EntityId>,
    /// In combat.
    pub in_combat: bool,
    /// Seconds since the last combat activity.
    pub idle_secs: f32,
    /// Attack the selected target automatically.
    pub auto_attack: bool,
    /// Basic attack reach.
    pub attack_range: f32,
    /// Installed skills, by slot.
    pub skills: Vec<SkillEntry>,
    /// Last use time per skill slot.
    pub skill_last_use: Vec<Option<Millis>>,
    /// Cast in flight.
    pub pending_cast: Option<PendingCast>,
    /// Gesture classifier for melee input.
    pub gesture: GestureClassifier,
}

impl Default for CombatComponent {
    fn default() -> Self {
        Self {
            target: None,
            in_combat: false,
            idle_secs: 0.0,
            auto_attack: false,
            attack_range: DEFAULT_ATTACK_RANGE,
            skills: Vec::new(),
            skill_last_use: Vec::new(),
            pending_cast: None,
            gesture: GestureClassifier::default(),
        }
    }
}

impl CombatComponent {
    /// Replace installed skills and reset their cooldowns.
    pub fn install_skills(&mut self, skills: Vec<SkillEntry>) {
        self.skill_last_use = vec![None; skills.len()];
        self.skills = skills;
    }

    /// Skill in a slot.
    #[must_use]
    pub fn skill(&self, slot: usize) -> Option<&SkillEntry> {
        self.skills.get(slot)
    }

    /// Check if the skill in `slot` is off cooldown. False for empty slots.
    #[must_use]
    pub fn skill_ready(&self, slot: usize, now: Millis) -> bool {
        self.skills.get(slot).is_some_and(|skill| {
            let last = self.skill_last_use.get(slot).copied().flatten();
            cooldown_ready(last, skill.cooldown_ms(), now)
        })
    }

    /// Cooldown progress of a skill slot (1.0 = ready, 0.0 for empty slots).
    #[must_use]
    pub fn skill_progress(&self, slot: usize, now: Millis) -> f32 {
        self.skills.get(slot).map_or(0.0, |skill| {
            let last = self.skill_last_use.get(slot).copied().flatten();
            cooldown_progress(last, skill.cooldown_ms(), now)
        })
    }

    /// Record a skill use.
    pub fn record_skill_use(&mut self, slot: usize, now: Millis) {
        if let Some(last) = self.skill_last_use.get_mut(slot) {
            *last = Some(now);
        }
    }

    /// Mark combat activity.
    pub fn touch(&mut self) {
        self.in_combat = true;
        self.idle_secs = 0.0;
    }
}

// ============================================================================
// Combatant
// ============================================================================

/// Everything the combat system knows about one participant.
#[derive(Debug, Clone)]
pub struct Combatant {
    /// Identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Controller.
    pub kind: CombatantKind,
    /// World position.
    pub position: Vec2,
    /// Base stats.
    pub stats: CombatantStats,
    /// Basic attack cooldown.
    pub cooldown: AttackCooldownState,
    /// Targeting, skills and gestures.
    pub combat: CombatComponent,
    /// Active status effects.
    pub effects: StatusLedger,
    /// Life cycle.
    pub life: LifeState,
    /// Last combatant that dealt damage.
    pub last_damaged_by: Option<EntityId>,
}

impl Combatant {
    /// Create a combatant with default stats at the origin.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, kind: CombatantKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position: Vec2::ZERO,
            stats: CombatantStats::default(),
            cooldown: AttackCooldownState::default(),
            combat: CombatComponent::default(),
            effects: StatusLedger::new(),
            life: LifeState::Alive,
            last_damaged_by: None,
        }
    }

    /// Create a player with a fresh ID.
    #[must_use]
    pub fn player(name: impl Into<String>) -> Self {
        Self::new(EntityId::new(), name, CombatantKind::Player)
    }

    /// Create an enemy with a fresh ID.
    #[must_use]
    pub fn enemy(name: impl Into<String>) -> Self {
        Self::new(EntityId::new(), name, CombatantKind::Enemy)
    }

    /// Apply the configured attack range, attack cooldown and gesture
    /// tuning. Builders called afterwards override these.
    #[must_use]
    pub fn with_config_defaults(self, config: &CombatConfig) -> Self {
        self.with_attack_range(config.default_attack_range)
            .with_attack_cooldown(config.default_attack_cooldown)
            .with_gesture_config(config.gesture.clone())
    }

    /// Set position.
    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set stats.
    #[must_use]
    pub fn with_stats(mut self, stats: CombatantStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set attack range.
    #[must_use]
    pub fn with_attack_range(mut self, range: f32) -> Self {
        self.combat.attack_range = range.max(0.0);
        self
    }

    /// Set attack cooldown in milliseconds.
    #[must_use]
    pub fn with_attack_cooldown(mut self, cooldown: Millis) -> Self {
        self.cooldown = AttackCooldownState::new(cooldown);
        self
    }

    /// Enable or disable auto-attack.
    #[must_use]
    pub fn with_auto_attack(mut self, enabled: bool) -> Self {
        self.combat.auto_attack = enabled;
        self
    }

    /// Set gesture tuning.
    #[must_use]
    pub fn with_gesture_config(mut self, config: GestureConfig) -> Self {
        self.combat.gesture = GestureClassifier::new(config);
        self
    }

    /// Check if alive and not dying.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive && self.stats.is_alive()
    }

    /// Check if playing the death animation.
    #[must_use]
    pub fn is_dying(&self) -> bool {
        matches!(self.life, LifeState::Dying { .. })
    }

    /// Check if fully dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.life == LifeState::Dead
    }

    /// Check if player-controlled.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.kind == CombatantKind::Player
    }

    /// Check if this combatant fights `other`.
    #[must_use]
    pub fn is_hostile_to(&self, other: &Combatant) -> bool {
        self.id != other.id && self.kind.is_hostile_to(other.kind)
    }

    /// Distance to another combatant.
    #[must_use]
    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance(other.position)
    }

    /// Attack after status effects.
    #[must_use]
    pub fn effective_attack(&self) -> i32 {
        self.effects.modified_attack(self.stats.attack)
    }

    /// Defense after status effects.
    #[must_use]
    pub fn effective_defense(&self) -> i32 {
        self.effects.modified_defense(self.stats.defense)
    }

    /// Stats with attack and defense replaced by their effective values.
    #[must_use]
    pub fn effective_stats(&self) -> CombatantStats {
        let mut stats = self.stats.clone();
        stats.attack = self.effective_attack();
        stats.defense = self.effective_defense();
        stats.speed = self.effects.modified_speed(self.stats.speed);
        stats
    }

    /// Derive the combat state, looking up the target in `store`.
    #[must_use]
    pub fn state<S: CombatantStore + ?Sized>(&self, store: &S, now: Millis) -> CombatState {
        match self.life {
            LifeState::Dead => return CombatState::Dead,
            LifeState::Dying { .. } => return CombatState::Dying,
            LifeState::Alive => {},
        }
        if self.combat.pending_cast.is_some() {
            return CombatState::Casting;
        }
        let Some(target) = self.combat.target.and_then(|id| store.get(id)) else {
            return CombatState::Idle;
        };
        if self.distance_to(target) > self.combat.attack_range {
            CombatState::Targeting
        } else if self.cooldown.can_attack(now) {
            CombatState::AttackReady
        } else {
            CombatState::OnCooldown
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Access to the combatants taking part in combat.
pub trait CombatantStore {
    /// Gets a combatant.
    fn get(&self, id: EntityId) -> Option<&Combatant>;
    /// Gets a mutable combatant.
    fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant>;
    /// IDs of all combatants, in a stable order.
    fn ids(&self) -> Vec<EntityId>;

    /// Check if a combatant exists.
    fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }
}

/// Ordered in-memory combatant store.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    combatants: BTreeMap<EntityId, Combatant>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant. Fails if the ID is already taken.
    pub fn insert(&mut self, combatant: Combatant) -> CombatResult<EntityId> {
        let id = combatant.id;
        if self.combatants.contains_key(&id) {
            return Err(CombatError::DuplicateCombatant(id));
        }
        self.combatants.insert(id, combatant);
        Ok(id)
    }

    /// Removes a combatant.
    pub fn remove(&mut self, id: EntityId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    /// Returns the number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Iterates over combatants in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }
}

impl CombatantStore for Roster {
    fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    fn ids(&self) -> Vec<EntityId> {
        self.combatants.keys().copied().collect()
    }
}
