//! Element relation table.
//!
//! Thirteen elements grouped into five phases. Upgraded and synthesized
//! elements inherit the counter relations of their phase:
//!
//! | Phase | Elements                                          |
//! |-------|---------------------------------------------------|
//! | Fire  | Fire, Explosion                                   |
//! | Water | Water, Ice                                        |
//! | Metal | Wind, Electric, Storm, Thunder, Thunderstorm      |
//! | Earth | Earth, Quake                                      |
//! | Wood  | Wood, Thorn                                       |
//!
//! Counter cycle: Water > Fire > Wood > Earth > Metal > Water.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::CombatantStats;

/// Number of distinct elements.
pub const ELEMENT_COUNT: usize = 13;

/// Multiplier when the attacking phase counters the defending phase.
pub const COUNTER_ADVANTAGE: f32 = 1.5;

/// Multiplier when the defending phase counters the attacking phase.
pub const COUNTER_DISADVANTAGE: f32 = 0.75;

/// Multiplier for unrelated phases.
pub const NEUTRAL: f32 = 1.0;

/// One of the five phases used for counter lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Fire phase.
    Fire,
    /// Water phase.
    Water,
    /// Metal phase (wind and electric lines).
    Metal,
    /// Earth phase.
    Earth,
    /// Wood phase.
    Wood,
}

impl Phase {
    /// The phase this phase counters.
    #[must_use]
    pub const fn counters(self) -> Phase {
        match self {
            Self::Water => Self::Fire,
            Self::Fire => Self::Wood,
            Self::Wood => Self::Earth,
            Self::Earth => Self::Metal,
            Self::Metal => Self::Water,
        }
    }

    /// Multiplier for an attack of this phase against `defender`.
    #[must_use]
    pub fn multiplier_against(self, defender: Phase) -> f32 {
        if self.counters() == defender {
            COUNTER_ADVANTAGE
        } else if defender.counters() == self {
            COUNTER_DISADVANTAGE
        } else {
            NEUTRAL
        }
    }
}

/// Element identifiers, indexed 0..13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Element {
    /// Fire.
    #[default]
    Fire = 0,
    /// Water.
    Water = 1,
    /// Wind (metal phase).
    Wind = 2,
    /// Electric (metal phase).
    Electric = 3,
    /// Earth.
    Earth = 4,
    /// Wood.
    Wood = 5,
    /// Upgraded fire.
    Explosion = 6,
    /// Upgraded water.
    Ice = 7,
    /// Upgraded wind.
    Storm = 8,
    /// Upgraded electric.
    Thunder = 9,
    /// Upgraded earth.
    Quake = 10,
    /// Upgraded wood.
    Thorn = 11,
    /// Storm and thunder combined.
    Thunderstorm = 12,
}

impl Element {
    /// All elements in index order.
    pub const ALL: [Element; ELEMENT_COUNT] = [
        Self::Fire,
        Self::Water,
        Self::Wind,
        Self::Electric,
        Self::Earth,
        Self::Wood,
        Self::Explosion,
        Self::Ice,
        Self::Storm,
        Self::Thunder,
        Self::Quake,
        Self::Thorn,
        Self::Thunderstorm,
    ];

    /// Table index of this element.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Element for a table index, if in range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Element for a case-insensitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fire => "Fire",
            Self::Water => "Water",
            Self::Wind => "Wind",
            Self::Electric => "Electric",
            Self::Earth => "Earth",
            Self::Wood => "Wood",
            Self::Explosion => "Explosion",
            Self::Ice => "Ice",
            Self::Storm => "Storm",
            Self::Thunder => "Thunder",
            Self::Quake => "Quake",
            Self::Thorn => "Thorn",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Phase used for counter lookups.
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::Fire | Self::Explosion => Phase::Fire,
            Self::Water | Self::Ice => Phase::Water,
            Self::Wind | Self::Electric | Self::Storm | Self::Thunder | Self::Thunderstorm => {
                Phase::Metal
            },
            Self::Earth | Self::Quake => Phase::Earth,
            Self::Wood | Self::Thorn => Phase::Wood,
        }
    }

    /// Upgraded form of a base element.
    #[must_use]
    pub const fn upgrade(self) -> Option<Self> {
        match self {
            Self::Fire => Some(Self::Explosion),
            Self::Water => Some(Self::Ice),
            Self::Wind => Some(Self::Storm),
            Self::Electric => Some(Self::Thunder),
            Self::Earth => Some(Self::Quake),
            Self::Wood => Some(Self::Thorn),
            _ => None,
        }
    }

    /// Base element this element was derived from.
    ///
    /// Thunderstorm reports Storm, the first of its two ingredients.
    #[must_use]
    pub const fn base(self) -> Self {
        match self {
            Self::Explosion => Self::Fire,
            Self::Ice => Self::Water,
            Self::Storm | Self::Thunderstorm => Self::Wind,
            Self::Thunder => Self::Electric,
            Self::Quake => Self::Earth,
            Self::Thorn => Self::Wood,
            other => other,
        }
    }

    /// Check if this is one of the six base elements.
    #[must_use]
    pub const fn is_base(self) -> bool {
        (self as u8) < 6
    }

    /// Combine two upgraded elements. Order does not matter.
    #[must_use]
    pub fn synthesize(a: Self, b: Self) -> Option<Self> {
        match (a, b) {
            (Self::Storm, Self::Thunder) | (Self::Thunder, Self::Storm) => {
                Some(Self::Thunderstorm)
            },
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Breakdown of an elemental damage calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementDamage {
    /// Damage before the elemental bonus.
    pub base_damage: i32,
    /// Elemental bonus (attack minus defense, at least 1).
    pub element_bonus: i32,
    /// Counter multiplier against the defender's main element.
    pub counter_multiplier: f32,
    /// Final damage (at least 1).
    pub total: i32,
}

/// Precomputed 13x13 counter multiplier matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTable {
    multipliers: [[f32; ELEMENT_COUNT]; ELEMENT_COUNT],
}

impl Default for ElementTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTable {
    /// Build the standard table from the phase cycle.
    #[must_use]
    pub fn new() -> Self {
        let mut multipliers = [[NEUTRAL; ELEMENT_COUNT]; ELEMENT_COUNT];
        for attack in Element::ALL {
            for defend in Element::ALL {
                multipliers[attack.index()][defend.index()] =
                    attack.phase().multiplier_against(defend.phase());
            }
        }
        Self { multipliers }
    }

    /// Counter multiplier for two elements.
    #[must_use]
    pub fn counter_multiplier(&self, attack: Element, defend: Element) -> f32 {
        self.multipliers[attack.index()][defend.index()]
    }

    /// Counter multiplier by raw index; out-of-range indices yield 1.0.
    #[must_use]
    pub fn counter_multiplier_by_index(&self, attack: usize, defend: usize) -> f32 {
        self.multipliers
            .get(attack)
            .and_then(|row| row.get(defend))
            .copied()
            .unwrap_or(NEUTRAL)
    }

    /// Resolve elemental damage with its breakdown.
    #[must_use]
    pub fn resolve_element_damage(
        &self,
        attacker: &CombatantStats,
        defender: &CombatantStats,
        skill_element: Element,
        base_damage: i32,
    ) -> ElementDamage {
        let element_bonus = attacker
            .element_attack(skill_element)
            .saturating_sub(defender.element_defense(skill_element))
            .max(1);
        let counter_multiplier = self.counter_multiplier(skill_element, defender.main_element);
        let total =
            (base_damage.saturating_add(element_bonus) as f32 * counter_multiplier).floor() as i32;

        ElementDamage {
            base_damage,
            element_bonus,
            counter_multiplier,
            total: total.max(1),
        }
    }

    /// Final elemental damage, at least 1.
    #[must_use]
    pub fn calculate_element_damage(
        &self,
        attacker: &CombatantStats,
        defender: &CombatantStats,
        skill_element: Element,
        base_damage: i32,
    ) -> i32 {
        self.resolve_element_damage(attacker, defender, skill_element, base_damage)
            .total
    }
}
