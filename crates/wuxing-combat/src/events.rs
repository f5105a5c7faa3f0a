//! Combat events and the event bus that carries them out of the engine.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use wuxing_common::{EntityId, SkillId};

use crate::effects::{EffectChange, EffectType};
use crate::element::Element;

/// How a damage event was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// Manual or automatic basic attack.
    Attack,
    /// Gesture-driven melee attack.
    Gesture,
    /// Resolved skill.
    Skill(SkillId),
    /// Periodic status effect.
    Effect(EffectType),
}

/// A resolved hit, enough to spawn a floating damage number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacker, if any.
    pub attacker: Option<EntityId>,
    /// Target.
    pub target: EntityId,
    /// Damage actually applied.
    pub amount: i32,
    /// Target position when hit.
    pub position: Vec2,
    /// What dealt the damage.
    pub source: DamageSource,
    /// Element of the hit, if elemental.
    pub element: Option<Element>,
    /// Gesture multiplier (1.0 for non-gesture hits).
    pub gesture_multiplier: f32,
    /// Whether the hit counts as critical.
    pub critical: bool,
}

impl DamageEvent {
    /// Create a basic attack event.
    #[must_use]
    pub fn new(attacker: Option<EntityId>, target: EntityId, amount: i32, position: Vec2) -> Self {
        Self {
            attacker,
            target,
            amount,
            position,
            source: DamageSource::Attack,
            element: None,
            gesture_multiplier: 1.0,
            critical: false,
        }
    }

    /// Set the damage source.
    #[must_use]
    pub fn with_source(mut self, source: DamageSource) -> Self {
        self.source = source;
        self
    }

    /// Set the element.
    #[must_use]
    pub fn with_element(mut self, element: Option<Element>) -> Self {
        self.element = element;
        self
    }

    /// Set the gesture multiplier and critical flag.
    #[must_use]
    pub fn with_gesture(mut self, multiplier: f32, critical: bool) -> Self {
        self.gesture_multiplier = multiplier;
        self.critical = critical;
        self
    }
}

/// Events emitted by the combat system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Damage was applied.
    Damage(DamageEvent),
    /// HP was restored.
    Healed {
        /// Healed combatant.
        entity: EntityId,
        /// HP actually restored.
        amount: i32,
    },
    /// A combatant selected a target.
    TargetSelected {
        /// Combatant.
        entity: EntityId,
        /// New target.
        target: EntityId,
    },
    /// A status effect was added, replaced or refreshed.
    EffectApplied {
        /// Affected combatant.
        target: EntityId,
        /// Effect type.
        effect: EffectType,
        /// What happened to the ledger.
        change: EffectChange,
        /// Who applied it.
        source: Option<EntityId>,
    },
    /// A periodic effect fired.
    EffectTicked {
        /// Affected combatant.
        target: EntityId,
        /// Effect type.
        effect: EffectType,
        /// HP change (negative = damage).
        hp_delta: i32,
    },
    /// A status effect ran out or was cleared.
    EffectExpired {
        /// Affected combatant.
        target: EntityId,
        /// Effect type.
        effect: EffectType,
    },
    /// A skill with a cast time started casting.
    SkillCastStarted {
        /// Caster.
        caster: EntityId,
        /// Skill.
        skill: SkillId,
        /// Target.
        target: EntityId,
        /// Time at which the cast completes (ms).
        completes_at: f64,
    },
    /// A skill resolved against its target.
    SkillResolved {
        /// Caster.
        caster: EntityId,
        /// Skill.
        skill: SkillId,
        /// Target.
        target: EntityId,
        /// Damage dealt.
        damage: i32,
    },
    /// A pending cast was cancelled.
    SkillInterrupted {
        /// Caster.
        caster: EntityId,
        /// Skill.
        skill: SkillId,
    },
    /// A combatant started dying.
    Death {
        /// Dying combatant.
        entity: EntityId,
        /// Last combatant that damaged it.
        killer: Option<EntityId>,
    },
    /// Kill attribution for quest and loot systems.
    Kill {
        /// Killer.
        killer: EntityId,
        /// Victim.
        victim: EntityId,
    },
    /// The death animation finished.
    Dead {
        /// Dead combatant.
        entity: EntityId,
    },
    /// A player was revived.
    Revived {
        /// Revived combatant.
        entity: EntityId,
    },
}

impl CombatEvent {
    /// Short tag for logging and filtering.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Damage(_) => "damage",
            Self::Healed { .. } => "healed",
            Self::TargetSelected { .. } => "target_selected",
            Self::EffectApplied { .. } => "effect_applied",
            Self::EffectTicked { .. } => "effect_ticked",
            Self::EffectExpired { .. } => "effect_expired",
            Self::SkillCastStarted { .. } => "skill_cast_started",
            Self::SkillResolved { .. } => "skill_resolved",
            Self::SkillInterrupted { .. } => "skill_interrupted",
            Self::Death { .. } => "death",
            Self::Kill { .. } => "kill",
            Self::Dead { .. } => "dead",
            Self::Revived { .. } => "revived",
        }
    }
}

/// Event bus for combat events.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: CombatEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let target = EntityId::from_raw(2);
        bus.publish(CombatEvent::Damage(DamageEvent::new(
            Some(EntityId::from_raw(1)),
            target,
            12,
            Vec2::new(3.0, 4.0),
        )));
        bus.publish(CombatEvent::Dead { entity: target });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "damage");
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let entity = EntityId::from_raw(1);
        bus.publish(CombatEvent::Revived { entity });
        bus.publish(CombatEvent::Dead { entity });

        let events = bus.drain();
        assert_eq!(events, vec![CombatEvent::Revived { entity }]);
    }

    #[test]
    fn test_sender_handle() {
        let bus = EventBus::default();
        let sender = bus.sender();
        sender
            .try_send(CombatEvent::Healed {
                entity: EntityId::from_raw(4),
                amount: 3,
            })
            .expect("room on bus");
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.capacity(), 1024);
    }

    #[test]
    fn test_damage_builder() {
        let event = DamageEvent::new(None, EntityId::from_raw(9), 7, Vec2::ZERO)
            .with_source(DamageSource::Gesture)
            .with_element(Some(Element::Ice))
            .with_gesture(2.5, true);
        assert_eq!(event.source, DamageSource::Gesture);
        assert_eq!(event.element, Some(Element::Ice));
        assert!(event.critical);
    }
}
