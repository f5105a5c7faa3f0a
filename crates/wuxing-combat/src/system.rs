//! Combat orchestration.
//!
//! `CombatSystem` turns "attacker wants to hit target" into resolved,
//! applied damage and drives the per-tick lifecycle:
//! - Target selection and picking
//! - Range and cooldown gating for attacks and skills
//! - Damage computation (stats, variance, elements, gestures)
//! - Status effect ticking, deaths and revives

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wuxing_common::{CombatResult, EntityId, SkillId};

use crate::combatant::{Combatant, CombatantKind, CombatantStore, LifeState, PendingCast};
use crate::config::CombatConfig;
use crate::effects::{EffectChange, EffectKind, EffectType};
use crate::element::ElementTable;
use crate::events::{CombatEvent, DamageEvent, DamageSource, EventBus};
use crate::gesture::GestureShape;
use crate::skills::{SkillEntry, SkillProvider};
use crate::stats::Millis;

/// Why a skill cast was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastRejection {
    /// Caster not in the store.
    UnknownCaster,
    /// Caster is dying or dead.
    NotAlive,
    /// Another cast is in flight.
    AlreadyCasting,
    /// No skill in the slot.
    EmptySlot,
    /// Skill still cooling down.
    OnCooldown,
    /// Not enough mana.
    InsufficientMana,
    /// No target selected.
    NoTarget,
    /// Target missing or dead.
    InvalidTarget,
    /// Target beyond the skill's range.
    OutOfRange,
}

/// Result of an accepted skill cast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CastOutcome {
    /// Instant skill, already applied.
    Resolved {
        /// Damage dealt.
        damage: i32,
    },
    /// Cast started; it resolves during a later `update`.
    Started {
        /// Completion time (ms).
        completes_at: Millis,
    },
}

/// A gesture that landed on a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureStrike {
    /// Target hit.
    pub target: EntityId,
    /// Damage dealt.
    pub damage: i32,
    /// Gesture multiplier (chip value while the weapon cools down).
    pub multiplier: f32,
    /// Dominant shape.
    pub shape: GestureShape,
    /// Whether the weapon was ready.
    pub weapon_ready: bool,
    /// Whether the hit was critical.
    pub critical: bool,
}

/// What happened during one `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Auto-attacks performed.
    pub attacks: usize,
    /// Casts resolved.
    pub casts_resolved: usize,
    /// Combatants that started dying.
    pub deaths: Vec<EntityId>,
}

/// Combat system coordinating attacks, skills, effects and deaths.
#[derive(Debug)]
pub struct CombatSystem {
    /// Tuning.
    config: CombatConfig,
    /// Elemental counter table.
    table: ElementTable,
    /// Variance and chip damage source.
    rng: fastrand::Rng,
    /// Outgoing events.
    events: EventBus,
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl CombatSystem {
    /// Creates a combat system with the given configuration.
    #[must_use]
    pub fn new(config: CombatConfig) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            table: ElementTable::new(),
            rng,
            events,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Returns the element table.
    #[must_use]
    pub fn element_table(&self) -> &ElementTable {
        &self.table
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains all pending events.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Selects a target and enters combat. Returns false if either side is
    /// missing or dead.
    pub fn select_target<S: CombatantStore>(
        &mut self,
        store: &mut S,
        entity: EntityId,
        target: EntityId,
    ) -> bool {
        if entity == target || !store.get(target).is_some_and(Combatant::is_alive) {
            return false;
        }
        let Some(combatant) = store.get_mut(entity) else {
            return false;
        };
        if !combatant.is_alive() {
            return false;
        }

        combatant.combat.target = Some(target);
        combatant.combat.touch();
        debug!("{} selected target {}", entity, target);
        self.events
            .publish(CombatEvent::TargetSelected { entity, target });
        true
    }

    /// Clears the selected target. Returns true if one was set.
    pub fn clear_target<S: CombatantStore>(&mut self, store: &mut S, entity: EntityId) -> bool {
        store
            .get_mut(entity)
            .and_then(|c| c.combat.target.take())
            .is_some()
    }

    /// Finds the nearest living enemy within the pick radius of `point`.
    #[must_use]
    pub fn find_enemy_at_position<S: CombatantStore>(&self, store: &S, point: Vec2) -> Option<EntityId> {
        nearest(store, point, self.config.pick_radius, |c| {
            c.kind == CombatantKind::Enemy
        })
    }

    /// Finds the nearest living combatant hostile to `seeker` within
    /// `radius` of `point`.
    #[must_use]
    pub fn find_hostile_near<S: CombatantStore>(
        &self,
        store: &S,
        seeker: EntityId,
        point: Vec2,
        radius: f32,
    ) -> Option<EntityId> {
        let seeker = store.get(seeker)?;
        nearest(store, point, radius, |c| seeker.is_hostile_to(c))
    }

    /// Checks if `target` is within `range` of `attacker`.
    #[must_use]
    pub fn is_in_range(attacker: &Combatant, target: &Combatant, range: f32) -> bool {
        attacker.distance_to(target) <= range
    }

    // ========================================================================
    // Damage
    // ========================================================================

    /// Basic attack damage: effective attack minus effective defense, with
    /// variance, floored, at least 1.
    pub fn calculate_damage(&mut self, attacker: &Combatant, target: &Combatant) -> i32 {
        let base = attacker
            .effective_attack()
            .saturating_sub(target.effective_defense());
        finish_damage(base as f32 * self.variance())
    }

    /// Skill damage. Elemental skills route the scaled attack through the
    /// element table instead of subtracting defense.
    pub fn calculate_skill_damage(
        &mut self,
        attacker: &Combatant,
        target: &Combatant,
        skill: &SkillEntry,
    ) -> i32 {
        let scaled = attacker.effective_attack() as f32 * skill.damage_multiplier;
        let variance = self.variance();

        match skill.element {
            Some(element) => {
                let base = (scaled * variance).floor() as i32;
                self.table.calculate_element_damage(
                    &attacker.effective_stats(),
                    &target.effective_stats(),
                    element,
                    base,
                )
            },
            None => finish_damage((scaled - target.effective_defense() as f32) * variance),
        }
    }

    /// Uniform factor in `[1 - v, 1 + v)`.
    fn variance(&mut self) -> f32 {
        let v = self.config.damage_variance;
        1.0 + (self.rng.f32() * 2.0 - 1.0) * v
    }

    /// Applies damage to the target named by `event` and publishes it.
    fn apply_damage<S: CombatantStore>(&mut self, store: &mut S, mut event: DamageEvent) -> bool {
        let Some(target) = store.get_mut(event.target) else {
            return false;
        };

        target.stats.take_damage(event.amount);
        if let Some(attacker) = event.attacker {
            target.last_damaged_by = Some(attacker);
        }
        target.combat.touch();
        event.position = target.position;

        debug!(
            "{} took {} damage from {:?}",
            event.target, event.amount, event.attacker
        );
        self.events.publish(CombatEvent::Damage(event));
        true
    }

    /// Attacks `target` if the attacker's cooldown allows it and the target
    /// is alive and in reach. Returns the damage dealt.
    pub fn perform_attack<S: CombatantStore>(
        &mut self,
        store: &mut S,
        attacker: EntityId,
        target: EntityId,
        now: Millis,
    ) -> Option<i32> {
        if attacker == target {
            return None;
        }
        let damage = {
            let a = store.get(attacker)?;
            let t = store.get(target)?;
            if !a.is_alive()
                || !t.is_alive()
                || !a.cooldown.can_attack(now)
                || !Self::is_in_range(a, t, a.combat.attack_range)
            {
                return None;
            }
            self.calculate_damage(a, t)
        };

        let a = store.get_mut(attacker)?;
        a.cooldown.record_attack(now);
        a.combat.touch();

        self.apply_damage(
            store,
            DamageEvent::new(Some(attacker), target, damage, Vec2::ZERO),
        );
        Some(damage)
    }

    /// Runs auto-attacks for every combatant with a living target in reach.
    /// Dead targets are deselected; out-of-range targets are kept.
    pub fn handle_auto_attack<S: CombatantStore>(&mut self, store: &mut S, now: Millis) -> usize {
        let mut attacks = 0;

        for id in store.ids() {
            let Some(combatant) = store.get(id) else {
                continue;
            };
            if !combatant.is_alive()
                || !combatant.combat.auto_attack
                || combatant.combat.pending_cast.is_some()
            {
                continue;
            }
            let Some(target) = combatant.combat.target else {
                continue;
            };

            if !store.get(target).is_some_and(Combatant::is_alive) {
                if let Some(combatant) = store.get_mut(id) {
                    combatant.combat.target = None;
                }
                continue;
            }

            if self.perform_attack(store, id, target, now).is_some() {
                attacks += 1;
            }
        }

        attacks
    }

    /// Attack cooldown progress (1.0 = ready).
    #[must_use]
    pub fn attack_cooldown_progress(combatant: &Combatant, now: Millis) -> f32 {
        combatant.cooldown.progress(now)
    }

    /// Skill cooldown progress for a slot (1.0 = ready, 0.0 for empty slots).
    #[must_use]
    pub fn skill_cooldown_progress(combatant: &Combatant, slot: usize, now: Millis) -> f32 {
        combatant.combat.skill_progress(slot, now)
    }

    // ========================================================================
    // Life Cycle
    // ========================================================================

    /// Marks every living combatant at 0 HP as dying.
    pub fn check_death<S: CombatantStore>(&mut self, store: &mut S) -> Vec<EntityId> {
        let dying: Vec<EntityId> = store
            .ids()
            .into_iter()
            .filter(|id| {
                store
                    .get(*id)
                    .is_some_and(|c| c.life == LifeState::Alive && c.stats.is_dead())
            })
            .collect();

        for id in &dying {
            self.handle_death(store, *id);
        }
        dying
    }

    /// Starts the death of a combatant: sets dying, clears its target and
    /// cancels its cast. Calling it again has no effect.
    pub fn handle_death<S: CombatantStore>(&mut self, store: &mut S, entity: EntityId) -> bool {
        let Some(combatant) = store.get_mut(entity) else {
            return false;
        };
        if combatant.life != LifeState::Alive {
            return false;
        }

        combatant.life = LifeState::Dying { elapsed: 0.0 };
        combatant.combat.target = None;
        combatant.combat.in_combat = false;
        combatant.combat.gesture.reset();
        let interrupted = combatant.combat.pending_cast.take();
        let killer = combatant.last_damaged_by.filter(|k| *k != entity);

        info!("{} ({}) died, killer: {:?}", combatant.name, entity, killer);

        if let Some(cast) = interrupted {
            self.events.publish(CombatEvent::SkillInterrupted {
                caster: entity,
                skill: cast.skill,
            });
        }
        self.events.publish(CombatEvent::Death { entity, killer });
        if let Some(killer) = killer {
            self.events.publish(CombatEvent::Kill {
                killer,
                victim: entity,
            });
        }
        true
    }

    /// Revives a player: full HP and MP, effects and cooldowns cleared.
    /// Returns false for non-players and for living players.
    pub fn revive_player<S: CombatantStore>(&mut self, store: &mut S, entity: EntityId) -> bool {
        let Some(combatant) = store.get_mut(entity) else {
            return false;
        };
        if !combatant.is_player() || combatant.is_alive() {
            return false;
        }

        combatant.stats.restore_full();
        combatant.life = LifeState::Alive;
        combatant.last_damaged_by = None;
        let cleared = combatant.effects.clear();
        combatant.cooldown.reset();
        combatant.combat.target = None;
        combatant.combat.pending_cast = None;
        combatant.combat.in_combat = false;

        info!("{} ({}) revived", combatant.name, entity);
        for effect in cleared {
            self.events.publish(CombatEvent::EffectExpired {
                target: entity,
                effect: effect.effect_type,
            });
        }
        self.events.publish(CombatEvent::Revived { entity });
        true
    }

    // ========================================================================
    // Skills
    // ========================================================================

    /// Installs skills on a combatant. Unknown IDs are logged and skipped.
    /// Returns the number installed.
    pub fn load_skills<S: CombatantStore, P: SkillProvider + ?Sized>(
        &mut self,
        store: &mut S,
        entity: EntityId,
        skill_ids: &[SkillId],
        provider: &P,
    ) -> usize {
        let Some(combatant) = store.get_mut(entity) else {
            warn!("Cannot load skills for unknown combatant {}", entity);
            return 0;
        };

        let skills: Vec<SkillEntry> = skill_ids
            .iter()
            .filter_map(|id| {
                let skill = provider.skill(*id).cloned();
                if skill.is_none() {
                    warn!("Unknown skill {} for {}, skipped", id, entity);
                }
                skill
            })
            .collect();

        let count = skills.len();
        combatant.combat.install_skills(skills);
        debug!("Installed {} skills on {}", count, entity);
        count
    }

    /// Casts the skill in `slot` at the caster's selected target.
    pub fn cast_skill<S: CombatantStore>(
        &mut self,
        store: &mut S,
        caster: EntityId,
        slot: usize,
        now: Millis,
    ) -> Result<CastOutcome, CastRejection> {
        let (skill, target) = {
            let c = store.get(caster).ok_or(CastRejection::UnknownCaster)?;
            if !c.is_alive() {
                return Err(CastRejection::NotAlive);
            }
            if c.combat.pending_cast.is_some() {
                return Err(CastRejection::AlreadyCasting);
            }
            let skill = c.combat.skill(slot).ok_or(CastRejection::EmptySlot)?;
            if !c.combat.skill_ready(slot, now) {
                return Err(CastRejection::OnCooldown);
            }
            if !c.stats.has_mana(skill.mana_cost) {
                return Err(CastRejection::InsufficientMana);
            }
            let target_id = c.combat.target.ok_or(CastRejection::NoTarget)?;
            let target = store
                .get(target_id)
                .filter(|t| t.is_alive())
                .ok_or(CastRejection::InvalidTarget)?;
            if !Self::is_in_range(c, target, skill.range) {
                return Err(CastRejection::OutOfRange);
            }
            (skill.clone(), target_id)
        };

        let c = store.get_mut(caster).ok_or(CastRejection::UnknownCaster)?;
        c.stats.spend_mana(skill.mana_cost);
        c.combat.record_skill_use(slot, now);
        c.combat.touch();

        if skill.is_instant() {
            let damage = self
                .resolve_skill(store, caster, slot, target)
                .ok_or(CastRejection::InvalidTarget)?;
            return Ok(CastOutcome::Resolved { damage });
        }

        let completes_at = now + skill.cast_time_ms();
        c.combat.pending_cast = Some(PendingCast {
            slot,
            skill: skill.id,
            target,
            started_at: now,
            completes_at,
        });
        debug!("{} started casting {} at {}", caster, skill.name, target);
        self.events.publish(CombatEvent::SkillCastStarted {
            caster,
            skill: skill.id,
            target,
            completes_at,
        });
        Ok(CastOutcome::Started { completes_at })
    }

    /// Applies a skill's damage and effect. `None` if either side is gone.
    fn resolve_skill<S: CombatantStore>(
        &mut self,
        store: &mut S,
        caster: EntityId,
        slot: usize,
        target: EntityId,
    ) -> Option<i32> {
        let (skill, damage) = {
            let c = store.get(caster)?;
            let t = store.get(target).filter(|t| t.is_alive())?;
            let skill = c.combat.skill(slot)?.clone();
            let damage = self.calculate_skill_damage(c, t, &skill);
            (skill, damage)
        };

        self.apply_damage(
            store,
            DamageEvent::new(Some(caster), target, damage, Vec2::ZERO)
                .with_source(DamageSource::Skill(skill.id))
                .with_element(skill.element),
        );

        if let Some(effect) = skill.effect {
            let recipient = if effect.on_self { caster } else { target };
            if let Err(e) = self.apply_effect(
                store,
                recipient,
                effect.effect_type,
                effect.duration,
                effect.intensity,
                Some(caster),
            ) {
                warn!("Skill {} effect rejected: {e}", skill.name);
            }
        }

        self.events.publish(CombatEvent::SkillResolved {
            caster,
            skill: skill.id,
            target,
            damage,
        });
        Some(damage)
    }

    // ========================================================================
    // Effects and Healing
    // ========================================================================

    /// Adds a status effect to a living combatant. `Ok(None)` if the target
    /// is missing or not alive.
    pub fn apply_effect<S: CombatantStore>(
        &mut self,
        store: &mut S,
        target: EntityId,
        effect: EffectType,
        duration: f32,
        intensity: f32,
        source: Option<EntityId>,
    ) -> CombatResult<Option<EffectChange>> {
        let Some(combatant) = store.get_mut(target).filter(|c| c.is_alive()) else {
            return Ok(None);
        };

        let change = combatant
            .effects
            .add_effect(effect, duration, intensity, source)?;
        self.events.publish(CombatEvent::EffectApplied {
            target,
            effect,
            change,
            source,
        });
        Ok(Some(change))
    }

    /// Removes every buff or every debuff from a combatant. Returns the
    /// number removed.
    pub fn clear_effects<S: CombatantStore>(
        &mut self,
        store: &mut S,
        entity: EntityId,
        kind: EffectKind,
    ) -> usize {
        let Some(combatant) = store.get_mut(entity) else {
            return 0;
        };

        let removed = combatant.effects.clear_effects_by_kind(kind);
        for effect in &removed {
            self.events.publish(CombatEvent::EffectExpired {
                target: entity,
                effect: effect.effect_type,
            });
        }
        debug!("Cleared {} {:?} effects from {}", removed.len(), kind, entity);
        removed.len()
    }

    /// Heals a living combatant. Returns HP actually restored.
    pub fn heal<S: CombatantStore>(&mut self, store: &mut S, entity: EntityId, amount: i32) -> i32 {
        let Some(combatant) = store.get_mut(entity).filter(|c| c.is_alive()) else {
            return 0;
        };

        let restored = combatant.stats.heal(amount);
        if restored > 0 {
            self.events.publish(CombatEvent::Healed {
                entity,
                amount: restored,
            });
        }
        restored
    }

    // ========================================================================
    // Gestures
    // ========================================================================

    /// Feeds a pointer position to the attacker's gesture classifier and
    /// strikes when the gesture triggers.
    ///
    /// The selected target is hit if it is in reach, otherwise the nearest
    /// hostile in reach. With the weapon ready the hit scales basic attack
    /// damage and starts the weapon cooldown; otherwise it deals chip damage.
    pub fn handle_gesture<S: CombatantStore>(
        &mut self,
        store: &mut S,
        attacker: EntityId,
        pointer: Vec2,
        now: Millis,
    ) -> Option<GestureStrike> {
        {
            let a = store.get_mut(attacker).filter(|a| a.is_alive())?;
            let origin = a.position;
            a.combat.gesture.update(pointer, origin, now);
            if !a.combat.gesture.can_trigger(now) {
                return None;
            }
        }

        let target = self.gesture_target(store, attacker)?;

        let (weapon_ready, multiplier, base) = {
            let a = store.get(attacker)?;
            let t = store.get(target)?;
            let weapon_ready = a.cooldown.can_attack(now);
            let multiplier = a.combat.gesture.damage_multiplier(weapon_ready, &mut self.rng);
            let base = weapon_ready.then(|| self.calculate_damage(a, t));
            (weapon_ready, multiplier, base)
        };

        let a = store.get_mut(attacker)?;
        let reading = a.combat.gesture.trigger(now)?;
        a.combat.touch();

        let (damage, critical) = match base {
            Some(base) => {
                a.cooldown.record_attack(now);
                (
                    finish_damage(base as f32 * multiplier),
                    multiplier >= self.config.critical_gesture_threshold,
                )
            },
            None => (finish_damage(multiplier), false),
        };

        self.apply_damage(
            store,
            DamageEvent::new(Some(attacker), target, damage, Vec2::ZERO)
                .with_source(DamageSource::Gesture)
                .with_gesture(multiplier, critical),
        );

        Some(GestureStrike {
            target,
            damage,
            multiplier,
            shape: reading.shape,
            weapon_ready,
            critical,
        })
    }

    fn gesture_target<S: CombatantStore>(&self, store: &S, attacker: EntityId) -> Option<EntityId> {
        let a = store.get(attacker)?;
        let reach = a.combat.attack_range;

        let selected = a
            .combat
            .target
            .and_then(|id| store.get(id))
            .filter(|t| t.is_alive() && Self::is_in_range(a, t, reach))
            .map(|t| t.id);

        selected.or_else(|| self.find_hostile_near(store, attacker, a.position, reach))
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances combat by one tick of `dt` seconds ending at `now`.
    ///
    /// Order: effect ticks and expiry, pending casts, death animations,
    /// combat timeouts, auto-attacks, death check.
    pub fn update<S: CombatantStore>(&mut self, store: &mut S, dt: f32, now: Millis) -> TickReport {
        let mut report = TickReport::default();
        let dt = dt.max(0.0);
        let ids = store.ids();

        for id in &ids {
            self.tick_effects(store, *id, dt, now);
        }

        for id in &ids {
            let due = store
                .get(*id)
                .filter(|c| c.is_alive())
                .and_then(|c| c.combat.pending_cast)
                .filter(|cast| now >= cast.completes_at);
            if let Some(cast) = due {
                if let Some(c) = store.get_mut(*id) {
                    c.combat.pending_cast = None;
                }
                if self.resolve_skill(store, *id, cast.slot, cast.target).is_some() {
                    report.casts_resolved += 1;
                } else {
                    debug!("{} cast of {} fizzled", id, cast.skill);
                    self.events.publish(CombatEvent::SkillInterrupted {
                        caster: *id,
                        skill: cast.skill,
                    });
                }
            }
        }

        for id in &ids {
            self.tick_life(store, *id, dt);
        }

        report.attacks = self.handle_auto_attack(store, now);
        report.deaths = self.check_death(store);
        report
    }

    fn tick_effects<S: CombatantStore>(&mut self, store: &mut S, id: EntityId, dt: f32, now: Millis) {
        let Some(c) = store.get_mut(id).filter(|c| c.is_alive()) else {
            return;
        };

        c.combat.gesture.refresh(now);
        let ticks = c.effects.update(dt, &mut c.stats);

        for tick in &ticks.ticks {
            if tick.hp_delta < 0 {
                if let Some(source) = tick.source {
                    c.last_damaged_by = Some(source);
                }
                self.events.publish(CombatEvent::Damage(
                    DamageEvent::new(tick.source, id, -tick.hp_delta, c.position)
                        .with_source(DamageSource::Effect(tick.effect_type)),
                ));
            }
            self.events.publish(CombatEvent::EffectTicked {
                target: id,
                effect: tick.effect_type,
                hp_delta: tick.hp_delta,
            });
        }
        for expired in &ticks.expired {
            self.events.publish(CombatEvent::EffectExpired {
                target: id,
                effect: expired.effect_type,
            });
        }
    }

    fn tick_life<S: CombatantStore>(&mut self, store: &mut S, id: EntityId, dt: f32) {
        let Some(c) = store.get_mut(id) else {
            return;
        };

        match c.life {
            LifeState::Dying { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.config.death_animation_secs {
                    c.life = LifeState::Dead;
                    debug!("{} is dead", id);
                    self.events.publish(CombatEvent::Dead { entity: id });
                } else {
                    c.life = LifeState::Dying { elapsed };
                }
            },
            LifeState::Alive if c.combat.in_combat => {
                c.combat.idle_secs += dt;
                if c.combat.target.is_none() && c.combat.idle_secs >= self.config.combat_timeout_secs {
                    c.combat.in_combat = false;
                    debug!("{} left combat", id);
                }
            },
            LifeState::Alive | LifeState::Dead => {},
        }
    }
}

/// Floors a damage value to an integer, at least 1.
fn finish_damage(raw: f32) -> i32 {
    (raw.floor() as i32).max(1)
}

/// Nearest living combatant matching `accept` within `radius` of `point`.
fn nearest<S: CombatantStore>(
    store: &S,
    point: Vec2,
    radius: f32,
    accept: impl Fn(&Combatant) -> bool,
) -> Option<EntityId> {
    store
        .ids()
        .into_iter()
        .filter_map(|id| store.get(id))
        .filter(|c| c.is_alive() && accept(c))
        .map(|c| (c.id, c.position.distance(point)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
