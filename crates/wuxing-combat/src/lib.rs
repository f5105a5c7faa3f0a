//! # Wuxing Combat
//!
//! Combat resolution for the Wuxing action RPG.
//!
//! This crate decides whether attacks land and how hard they hit:
//! - Five-phase element relation table with upgraded and synthesized elements
//! - Status effect ledger (stacking, periodic ticks, stat modifiers)
//! - Pointer gesture classifier (thrust vs sweep, speed-based quality)
//! - Combatant records, skills and skill loading
//! - Combat system orchestrating targeting, attacks, casts and deaths
//! - Event bus for damage, effect and death notifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod combatant;
pub mod config;
pub mod effects;
pub mod element;
pub mod events;
pub mod gesture;
pub mod skills;
pub mod stats;
pub mod system;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::combatant::*;
    pub use crate::config::*;
    pub use crate::effects::*;
    pub use crate::element::*;
    pub use crate::events::*;
    pub use crate::gesture::*;
    pub use crate::skills::*;
    pub use crate::stats::*;
    pub use crate::system::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use wuxing_common::{EntityId, SkillId};

    #[test]
    fn test_duel_to_the_death() {
        let mut combat = CombatSystem::new(CombatConfig::default().with_seed(3));
        let mut roster = Roster::new();

        let hero = roster
            .insert(
                Combatant::player("Hero")
                    .with_stats(CombatantStats::new().with_attack(30))
                    .with_auto_attack(true),
            )
            .expect("hero");
        let wolf = roster
            .insert(
                Combatant::enemy("Wolf")
                    .with_stats(CombatantStats::new().with_hp(40).with_attack(8))
                    .with_position(Vec2::new(20.0, 0.0))
                    .with_auto_attack(true),
            )
            .expect("wolf");

        assert_eq!(combat.find_enemy_at_position(&roster, Vec2::new(22.0, 3.0)), Some(wolf));
        assert!(combat.select_target(&mut roster, hero, wolf));
        assert!(combat.select_target(&mut roster, wolf, hero));

        let mut now = 0.0;
        let mut deaths = Vec::new();
        while deaths.is_empty() && now < 60_000.0 {
            deaths = combat.update(&mut roster, 0.1, now).deaths;
            now += 100.0;
        }

        assert_eq!(deaths, vec![wolf]);
        let events = combat.drain_events();
        assert!(events.contains(&CombatEvent::Kill {
            killer: hero,
            victim: wolf
        }));
        assert!(roster.get(hero).is_some_and(Combatant::is_alive));
    }

    #[test]
    fn test_loaded_skill_set() {
        let mut loader = SkillLoader::new("unused");
        loader
            .load_str(
                r#"
[[skills]]
id = 10
name = "Tidal Lash"
cooldown = 1.0
mana_cost = 5
range = 40.0
damage_multiplier = 2.0
element = "water"
"#,
            )
            .expect("skills");
        let registry = loader.into_registry();

        let mut combat = CombatSystem::new(CombatConfig::default().with_seed(1));
        let mut roster = Roster::new();
        let caster = roster
            .insert(Combatant::new(EntityId::from_raw(1), "Caster", CombatantKind::Player))
            .expect("caster");
        let brute = roster
            .insert(
                Combatant::new(EntityId::from_raw(2), "Brute", CombatantKind::Enemy)
                    .with_stats(CombatantStats::new().with_main_element(Element::Fire))
                    .with_position(Vec2::new(10.0, 0.0)),
            )
            .expect("brute");

        assert_eq!(
            combat.load_skills(&mut roster, caster, &[SkillId::new(10)], &registry),
            1
        );
        combat.select_target(&mut roster, caster, brute);
        let outcome = combat.cast_skill(&mut roster, caster, 0, 0.0).expect("cast");

        // Water counters fire: at least (17 + 1) * 1.5.
        assert!(matches!(outcome, CastOutcome::Resolved { damage } if damage >= 27));
    }
}
