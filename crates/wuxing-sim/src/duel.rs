//! Scripted duel: one player against two enemies.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{debug, info, warn};
use wuxing_combat::{
    CastOutcome, CombatConfig, CombatEvent, CombatSystem, Combatant, CombatantStats,
    CombatantStore, Element, Roster, SkillLoadError, SkillLoader, SkillRegistry,
};
use wuxing_common::{EntityId, SkillId};

/// Skills the player brings into the fight.
const PLAYER_SKILLS: [u32; 4] = [1, 2, 3, 4];

/// Radius of the scripted pointer orbit around the player.
const GESTURE_RADIUS: f32 = 30.0;

/// Radians the pointer advances per tick.
const GESTURE_STEP: f32 = 0.6;

/// Revives granted to the player.
const MAX_REVIVES: u32 = 1;

/// Run options.
#[derive(Debug, Clone)]
pub struct DuelOptions {
    /// Tick budget.
    pub ticks: u32,
    /// Tick length in milliseconds.
    pub tick_ms: f64,
    /// Print events as JSON lines.
    pub json: bool,
}

/// How the duel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All enemies died.
    Victory,
    /// The player died with no revives left.
    Defeat,
    /// The tick budget ran out.
    Timeout,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Totals reported after a duel.
#[derive(Debug, Clone)]
pub struct DuelSummary {
    /// Ticks simulated.
    pub ticks: u32,
    /// Simulated time in milliseconds.
    pub elapsed_ms: f64,
    /// Result.
    pub outcome: Outcome,
    /// Total damage from all damage events.
    pub damage_dealt: i64,
    /// Gesture strikes landed by the player.
    pub gesture_strikes: u32,
    /// Skills resolved by anyone.
    pub skills_resolved: u32,
    /// Player revives used.
    pub revives: u32,
}

/// Loads skills from a directory or a single file. A missing path yields an
/// empty registry.
pub fn load_registry(path: &Path) -> Result<SkillRegistry> {
    let mut loader = SkillLoader::new(path);
    let loaded = if path.is_file() {
        loader.load_file(path)
    } else {
        loader.load_all()
    };

    match loaded {
        Ok(count) => info!("Loaded {} skills from {}", count, path.display()),
        Err(SkillLoadError::NotFound(missing)) => {
            warn!("No skills at {}, fighting without skills", missing.display());
        },
        Err(e) => return Err(e).context("loading skills"),
    }
    Ok(loader.into_registry())
}

fn player(config: &CombatConfig) -> Combatant {
    Combatant::player("Wanderer")
        .with_config_defaults(config)
        .with_stats(
            CombatantStats::new()
                .with_hp(160)
                .with_mp(80)
                .with_attack(18)
                .with_defense(6)
                .with_main_element(Element::Fire)
                .with_element_attack(Element::Fire, 12)
                .with_element_attack(Element::Wood, 8)
                .with_element_attack(Element::Water, 10),
        )
        .with_attack_range(45.0)
        .with_attack_cooldown(900.0)
        .with_auto_attack(true)
}

fn enemies(config: &CombatConfig) -> [Combatant; 2] {
    [
        Combatant::enemy("Ironbark Treant")
            .with_config_defaults(config)
            .with_stats(
                CombatantStats::new()
                    .with_hp(120)
                    .with_attack(14)
                    .with_defense(9)
                    .with_main_element(Element::Wood)
                    .with_element_defense(Element::Fire, 4),
            )
            .with_position(Vec2::new(35.0, 0.0))
            .with_attack_range(40.0)
            .with_attack_cooldown(1400.0)
            .with_auto_attack(true),
        Combatant::enemy("Cinder Imp")
            .with_config_defaults(config)
            .with_stats(
                CombatantStats::new()
                    .with_hp(70)
                    .with_attack(11)
                    .with_defense(3)
                    .with_main_element(Element::Fire),
            )
            .with_position(Vec2::new(-40.0, 10.0))
            .with_auto_attack(true),
    ]
}

/// Plays the duel until one side falls or the tick budget runs out.
pub fn run(config: CombatConfig, registry: &SkillRegistry, options: &DuelOptions) -> Result<DuelSummary> {
    let tick_secs = (options.tick_ms / 1000.0) as f32;
    let mut combat = CombatSystem::new(config.clone());
    let mut roster = Roster::new();

    let hero = roster
        .insert(player(&config))
        .context("adding player")?;
    let mut foes = Vec::new();
    for enemy in enemies(&config) {
        foes.push(roster.insert(enemy).context("adding enemy")?);
    }

    let skill_ids: Vec<SkillId> = PLAYER_SKILLS.iter().copied().map(SkillId::new).collect();
    let installed = combat.load_skills(&mut roster, hero, &skill_ids, registry);
    info!("Player enters with {} skills", installed);

    let mut summary = DuelSummary {
        ticks: 0,
        elapsed_ms: 0.0,
        outcome: Outcome::Timeout,
        damage_dealt: 0,
        gesture_strikes: 0,
        skills_resolved: 0,
        revives: 0,
    };

    for tick in 0..options.ticks {
        let now = f64::from(tick) * options.tick_ms;
        summary.ticks = tick + 1;
        summary.elapsed_ms = now;

        acquire_targets(&mut combat, &mut roster, hero, &foes);
        use_skills(&mut combat, &mut roster, hero, now);

        let angle = tick as f32 * GESTURE_STEP;
        let origin = roster.get(hero).map_or(Vec2::ZERO, |c| c.position);
        let pointer = origin + Vec2::from_angle(angle) * GESTURE_RADIUS;
        if let Some(strike) = combat.handle_gesture(&mut roster, hero, pointer, now) {
            summary.gesture_strikes += 1;
            debug!(
                "{:?} gesture hit {} for {} (x{:.2})",
                strike.shape, strike.target, strike.damage, strike.multiplier
            );
        }

        combat.update(&mut roster, tick_secs, now);

        for event in combat.drain_events() {
            record(&mut summary, &event);
            emit(&event, &roster, options.json)?;
        }

        if roster.get(hero).is_some_and(Combatant::is_dead) {
            if summary.revives < MAX_REVIVES && combat.revive_player(&mut roster, hero) {
                summary.revives += 1;
                for event in combat.drain_events() {
                    emit(&event, &roster, options.json)?;
                }
            } else {
                summary.outcome = Outcome::Defeat;
                break;
            }
        }

        let foes_standing = foes
            .iter()
            .any(|id| roster.get(*id).is_some_and(Combatant::is_alive));
        if !foes_standing {
            summary.outcome = Outcome::Victory;
            break;
        }
    }

    Ok(summary)
}

/// Keeps everyone pointed at a living opponent.
fn acquire_targets(combat: &mut CombatSystem, roster: &mut Roster, hero: EntityId, foes: &[EntityId]) {
    let hero_alive = roster.get(hero).is_some_and(Combatant::is_alive);
    let needs_target = |roster: &Roster, id: EntityId| {
        roster.get(id).is_some_and(|c| {
            c.is_alive()
                && c.combat
                    .target
                    .and_then(|t| roster.get(t))
                    .map_or(true, |t| !t.is_alive())
        })
    };

    if hero_alive && needs_target(&*roster, hero) {
        let origin = roster.get(hero).map_or(Vec2::ZERO, |c| c.position);
        if let Some(target) = combat.find_hostile_near(roster, hero, origin, f32::MAX) {
            combat.select_target(roster, hero, target);
        }
    }

    if hero_alive {
        for foe in foes {
            if needs_target(&*roster, *foe) {
                combat.select_target(roster, *foe, hero);
            }
        }
    }
}

/// Fires the first skill that is ready.
fn use_skills(combat: &mut CombatSystem, roster: &mut Roster, hero: EntityId, now: f64) {
    let slots = roster.get(hero).map_or(0, |c| c.combat.skills.len());
    for slot in 0..slots {
        match combat.cast_skill(roster, hero, slot, now) {
            Ok(CastOutcome::Resolved { damage }) => {
                debug!("Slot {} resolved for {}", slot, damage);
                return;
            },
            Ok(CastOutcome::Started { completes_at }) => {
                debug!("Slot {} casting until {}", slot, completes_at);
                return;
            },
            Err(reason) => debug!("Slot {} not cast: {:?}", slot, reason),
        }
    }
}

fn record(summary: &mut DuelSummary, event: &CombatEvent) {
    match event {
        CombatEvent::Damage(hit) => summary.damage_dealt += i64::from(hit.amount),
        CombatEvent::SkillResolved { .. } => summary.skills_resolved += 1,
        _ => {},
    }
}

fn name_of(roster: &Roster, id: EntityId) -> String {
    roster
        .get(id)
        .map_or_else(|| id.to_string(), |c| c.name.clone())
}

fn emit(event: &CombatEvent, roster: &Roster, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        CombatEvent::Damage(hit) => info!(
            "{} hits {} for {}{}",
            hit.attacker.map_or_else(|| "effect".to_string(), |a| name_of(roster, a)),
            name_of(roster, hit.target),
            hit.amount,
            if hit.critical { " (critical)" } else { "" }
        ),
        CombatEvent::Death { entity, .. } => info!("{} falls", name_of(roster, *entity)),
        CombatEvent::Kill { killer, victim } => {
            info!("{} defeated {}", name_of(roster, *killer), name_of(roster, *victim));
        },
        CombatEvent::Revived { entity } => info!("{} is revived", name_of(roster, *entity)),
        CombatEvent::EffectApplied { target, effect, change, .. } => info!(
            "{} {:?} {}",
            name_of(roster, *target),
            change,
            effect.name()
        ),
        other => debug!("{}: {:?}", other.name(), other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> DuelOptions {
        DuelOptions {
            ticks: 2000,
            tick_ms: 100.0,
            json: false,
        }
    }

    #[test]
    fn test_duel_without_skills_finishes() {
        let config = CombatConfig::default().with_seed(11);
        let summary = run(config, &SkillRegistry::new(), &options()).expect("duel runs");

        assert_ne!(summary.outcome, Outcome::Timeout);
        assert!(summary.damage_dealt > 0);
        assert_eq!(summary.skills_resolved, 0);
    }

    #[test]
    fn test_combatants_take_config_defaults() {
        let config = CombatConfig {
            default_attack_range: 65.0,
            default_attack_cooldown: 1200.0,
            ..CombatConfig::default()
        };
        let [treant, imp] = enemies(&config);

        assert_eq!(treant.combat.attack_range, 40.0);
        assert_eq!(imp.combat.attack_range, 65.0);
        assert_eq!(imp.cooldown.attack_cooldown, 1200.0);
        assert_eq!(player(&config).combat.attack_range, 45.0);
    }

    #[test]
    fn test_missing_skill_path_is_empty_registry() {
        let registry = load_registry(Path::new("/no/such/skills")).expect("empty registry");
        assert!(registry.is_empty());
    }
}
