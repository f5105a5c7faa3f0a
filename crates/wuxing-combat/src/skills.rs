//! Skill definitions and loading.
//!
//! This module provides:
//! - Typed skill entries consumed by the combat system
//! - The `SkillProvider` lookup seam
//! - A registry with lookup by ID and name
//! - Loading skills from TOML files (`assets/skills/*.toml`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use wuxing_common::SkillId;

use crate::effects::EffectType;
use crate::element::Element;
use crate::stats::{Millis, MILLIS_PER_SECOND};

/// Default asset path for skills.
pub const DEFAULT_SKILL_PATH: &str = "assets/skills";

/// Errors that can occur during skill loading.
#[derive(Debug, Error)]
pub enum SkillLoadError {
    /// File or directory not found.
    #[error("Skill path not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read skill file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse skill TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error.
    #[error("Skill validation error: {0}")]
    ValidationError(String),

    /// Duplicate skill ID.
    #[error("Duplicate skill ID: {0}")]
    DuplicateId(SkillId),

    /// Duplicate skill name (case-insensitive).
    #[error("Duplicate skill name: {0}")]
    DuplicateName(String),
}

/// Result type for skill loading operations.
pub type SkillLoadResult<T> = Result<T, SkillLoadError>;

// ============================================================================
// Typed Entries
// ============================================================================

/// Effect a skill applies when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillEffect {
    /// Effect type.
    pub effect_type: EffectType,
    /// Duration in seconds.
    pub duration: f32,
    /// Intensity.
    pub intensity: f32,
    /// Apply to the caster instead of the target.
    pub on_self: bool,
}

/// A castable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Skill ID.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Cooldown in seconds.
    pub cooldown: f32,
    /// Mana spent on cast.
    pub mana_cost: i32,
    /// Cast time in seconds (0 = instant).
    pub cast_time: f32,
    /// Maximum distance to the target.
    pub range: f32,
    /// Multiplier applied to the caster's attack.
    pub damage_multiplier: f32,
    /// Element, if the skill is elemental.
    pub element: Option<Element>,
    /// Effect applied on hit.
    pub effect: Option<SkillEffect>,
}

impl SkillEntry {
    /// Create an instant, non-elemental skill.
    #[must_use]
    pub fn new(id: SkillId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cooldown: 1.0,
            mana_cost: 0,
            cast_time: 0.0,
            range: 50.0,
            damage_multiplier: 1.0,
            element: None,
            effect: None,
        }
    }

    /// Set cooldown in seconds.
    #[must_use]
    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Set mana cost.
    #[must_use]
    pub fn with_mana_cost(mut self, cost: i32) -> Self {
        self.mana_cost = cost;
        self
    }

    /// Set cast time in seconds.
    #[must_use]
    pub fn with_cast_time(mut self, seconds: f32) -> Self {
        self.cast_time = seconds;
        self
    }

    /// Set range.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Set damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Set element.
    #[must_use]
    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    /// Set on-hit effect.
    #[must_use]
    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Cooldown in milliseconds.
    #[must_use]
    pub fn cooldown_ms(&self) -> Millis {
        f64::from(self.cooldown) * MILLIS_PER_SECOND
    }

    /// Cast time in milliseconds.
    #[must_use]
    pub fn cast_time_ms(&self) -> Millis {
        f64::from(self.cast_time) * MILLIS_PER_SECOND
    }

    /// Check if the skill resolves without a cast.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.cast_time <= 0.0
    }

    /// Validate the definition.
    pub fn validate(&self) -> SkillLoadResult<()> {
        let fail = |msg: &str| {
            Err(SkillLoadError::ValidationError(format!(
                "Skill {} ({}): {msg}",
                self.id.raw(),
                self.name
            )))
        };

        if self.name.trim().is_empty() {
            return fail("name must not be empty");
        }
        if !self.cooldown.is_finite() || self.cooldown < 0.0 {
            return fail("cooldown must be non-negative");
        }
        if !self.cast_time.is_finite() || self.cast_time < 0.0 {
            return fail("cast_time must be non-negative");
        }
        if self.mana_cost < 0 {
            return fail("mana_cost must be non-negative");
        }
        if !self.range.is_finite() || self.range <= 0.0 {
            return fail("range must be positive");
        }
        if !self.damage_multiplier.is_finite() || self.damage_multiplier < 0.0 {
            return fail("damage_multiplier must be non-negative");
        }
        if let Some(effect) = &self.effect {
            if !effect.duration.is_finite() || effect.duration < 0.0 {
                return fail("effect duration must be non-negative");
            }
            if !effect.intensity.is_finite() || effect.intensity < 0.0 {
                return fail("effect intensity must be non-negative");
            }
        }
        Ok(())
    }
}

/// Source of skill definitions keyed by ID.
pub trait SkillProvider {
    /// Look up a skill.
    fn skill(&self, id: SkillId) -> Option<&SkillEntry>;
}

impl SkillProvider for HashMap<SkillId, SkillEntry> {
    fn skill(&self, id: SkillId) -> Option<&SkillEntry> {
        self.get(&id)
    }
}

// ============================================================================
// File Format
// ============================================================================

/// Effect block as written in a skill file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRecord {
    /// Effect type name.
    pub kind: String,
    /// Duration in seconds.
    pub duration: f32,
    /// Intensity.
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Apply to the caster.
    #[serde(default)]
    pub on_self: bool,
}

fn default_intensity() -> f32 {
    1.0
}

/// Skill as written in a skill file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Skill ID.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Cooldown in seconds.
    #[serde(default)]
    pub cooldown: f32,
    /// Mana cost.
    #[serde(default)]
    pub mana_cost: i32,
    /// Cast time in seconds.
    #[serde(default)]
    pub cast_time: f32,
    /// Range.
    pub range: f32,
    /// Damage multiplier.
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f32,
    /// Element name.
    #[serde(default)]
    pub element: Option<String>,
    /// On-hit effect.
    #[serde(default)]
    pub effect: Option<EffectRecord>,
}

fn default_multiplier() -> f32 {
    1.0
}

impl SkillRecord {
    /// Resolve names into a typed entry.
    ///
    /// Unknown element or effect names are dropped with a warning.
    #[must_use]
    pub fn into_entry(self) -> SkillEntry {
        let element = self.element.as_deref().and_then(|name| {
            let element = Element::from_name(name);
            if element.is_none() {
                warn!("Skill {} ({}): unknown element '{name}', treating as non-elemental", self.id, self.name);
            }
            element
        });

        let effect = self.effect.and_then(|record| {
            let Some(effect_type) = EffectType::from_name(&record.kind) else {
                warn!("Skill {} ({}): unknown effect '{}', ignored", self.id, self.name, record.kind);
                return None;
            };
            Some(SkillEffect {
                effect_type,
                duration: record.duration,
                intensity: record.intensity,
                on_self: record.on_self,
            })
        });

        SkillEntry {
            id: SkillId::new(self.id),
            name: self.name,
            cooldown: self.cooldown,
            mana_cost: self.mana_cost,
            cast_time: self.cast_time,
            range: self.range,
            damage_multiplier: self.damage_multiplier,
            element,
            effect,
        }
    }
}

/// A collection of skills from a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFile {
    /// File format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Skills in this file.
    #[serde(default)]
    pub skills: Vec<SkillRecord>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

// ============================================================================
// Registry
// ============================================================================

/// Skill registry with lookup by ID and name.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    /// Skills by ID.
    by_id: HashMap<SkillId, SkillEntry>,
    /// Skill IDs by name (lowercase).
    by_name: HashMap<String, SkillId>,
}

impl SkillRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registers a validated skill. IDs and names must be unique.
    pub fn register(&mut self, skill: SkillEntry) -> SkillLoadResult<()> {
        skill.validate()?;
        if self.by_id.contains_key(&skill.id) {
            return Err(SkillLoadError::DuplicateId(skill.id));
        }
        let key = skill.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(SkillLoadError::DuplicateName(skill.name));
        }

        self.by_name.insert(key, skill.id);
        self.by_id.insert(skill.id, skill);
        Ok(())
    }

    /// Gets a skill by ID.
    #[must_use]
    pub fn get(&self, id: SkillId) -> Option<&SkillEntry> {
        self.by_id.get(&id)
    }

    /// Gets a skill by name (case-insensitive).
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&SkillEntry> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    /// Returns an iterator over all skills.
    pub fn iter(&self) -> impl Iterator<Item = &SkillEntry> {
        self.by_id.values()
    }

    /// Returns all skills of an element.
    #[must_use]
    pub fn by_element(&self, element: Element) -> Vec<&SkillEntry> {
        self.by_id
            .values()
            .filter(|s| s.element == Some(element))
            .collect()
    }

    /// Clears the registry.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_name.clear();
    }
}

impl SkillProvider for SkillRegistry {
    fn skill(&self, id: SkillId) -> Option<&SkillEntry> {
        self.get(id)
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads skill files into a registry.
#[derive(Debug)]
pub struct SkillLoader {
    /// Base directory for skill files.
    base_path: PathBuf,
    /// Loaded skills.
    registry: SkillRegistry,
}

impl SkillLoader {
    /// Creates a loader for a directory.
    #[must_use]
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            registry: SkillRegistry::new(),
        }
    }

    /// Creates a loader for the default asset path.
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(DEFAULT_SKILL_PATH)
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// Consumes the loader, returning the registry.
    #[must_use]
    pub fn into_registry(self) -> SkillRegistry {
        self.registry
    }

    /// Loads every `*.toml` file in the base directory.
    pub fn load_all(&mut self) -> SkillLoadResult<usize> {
        if !self.base_path.exists() {
            return Err(SkillLoadError::NotFound(self.base_path.clone()));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut total = 0;
        for path in paths {
            total += self.load_file(&path)?;
        }

        info!(
            "Loaded {} skills from {}",
            total,
            self.base_path.display()
        );
        Ok(total)
    }

    /// Loads one skill file.
    pub fn load_file(&mut self, path: &Path) -> SkillLoadResult<usize> {
        if !path.exists() {
            return Err(SkillLoadError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let count = self.load_str(&content)?;
        debug!("Loaded {} skills from {}", count, path.display());
        Ok(count)
    }

    /// Loads skills from TOML text.
    pub fn load_str(&mut self, content: &str) -> SkillLoadResult<usize> {
        let file: SkillFile = toml::from_str(content)?;
        let count = file.skills.len();
        for record in file.skills {
            self.registry.register(record.into_entry())?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = "1.0.0"

[[skills]]
id = 1
name = "Fireball"
cooldown = 3.0
mana_cost = 10
cast_time = 0.5
range = 120.0
damage_multiplier = 1.8
element = "fire"

[skills.effect]
kind = "poison"
duration = 3.0

[[skills]]
id = 2
name = "Heavy Strike"
cooldown = 1.5
range = 40.0
damage_multiplier = 1.4
"#;

    #[test]
    fn test_load_str() {
        let mut loader = SkillLoader::new("unused");
        let count = loader.load_str(SAMPLE).expect("valid skills");
        assert_eq!(count, 2);

        let registry = loader.registry();
        let fireball = registry.get(SkillId::new(1)).expect("fireball");
        assert_eq!(fireball.element, Some(Element::Fire));
        assert_eq!(fireball.mana_cost, 10);
        assert!((fireball.cooldown_ms() - 3000.0).abs() < 1e-9);
        assert!(!fireball.is_instant());
        let effect = fireball.effect.expect("poison effect");
        assert_eq!(effect.effect_type, EffectType::Poison);
        assert_eq!(effect.intensity, 1.0);
        assert!(!effect.on_self);

        let strike = registry.get_by_name("heavy strike").expect("strike");
        assert_eq!(strike.element, None);
        assert!(strike.is_instant());
    }

    #[test]
    fn test_unknown_names_are_dropped() {
        let mut loader = SkillLoader::new("unused");
        loader
            .load_str(
                r#"
[[skills]]
id = 9
name = "Odd"
range = 10.0
element = "plasma"
[skills.effect]
kind = "burning"
duration = 2.0
"#,
            )
            .expect("still loads");

        let odd = loader.registry().get(SkillId::new(9)).expect("odd");
        assert_eq!(odd.element, None);
        assert_eq!(odd.effect, None);
    }

    #[test]
    fn test_duplicate_id() {
        let mut registry = SkillRegistry::new();
        registry
            .register(SkillEntry::new(SkillId::new(1), "Jab"))
            .expect("first");
        let err = registry
            .register(SkillEntry::new(SkillId::new(1), "Jab Again"))
            .expect_err("duplicate");
        assert!(matches!(err, SkillLoadError::DuplicateId(id) if id == SkillId::new(1)));
    }

    #[test]
    fn test_duplicate_name() {
        let mut registry = SkillRegistry::new();
        registry
            .register(SkillEntry::new(SkillId::new(1), "Jab"))
            .expect("first");
        let err = registry
            .register(SkillEntry::new(SkillId::new(2), "JAB"))
            .expect_err("duplicate name");
        assert!(matches!(err, SkillLoadError::DuplicateName(ref name) if name == "JAB"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_name("jab").map(|s| s.id), Some(SkillId::new(1)));
    }

    #[test]
    fn test_validation() {
        let bad = SkillEntry::new(SkillId::new(3), "Broken").with_cooldown(-1.0);
        assert!(matches!(bad.validate(), Err(SkillLoadError::ValidationError(_))));

        let bad = SkillEntry::new(SkillId::new(3), "Broken").with_range(0.0);
        assert!(bad.validate().is_err());

        let bad = SkillEntry::new(SkillId::new(3), "  ");
        assert!(bad.validate().is_err());

        let ok = SkillEntry::new(SkillId::new(3), "Fine").with_cast_time(1.2);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let mut loader = SkillLoader::new("unused");
        let err = loader.load_str("[[skills]]\nid = \"x\"").expect_err("bad toml");
        assert!(matches!(err, SkillLoadError::ParseError(_)));
    }

    #[test]
    fn test_load_all_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("basic.toml"), SAMPLE).expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut loader = SkillLoader::new(dir.path());
        assert_eq!(loader.load_all().expect("loads"), 2);
        assert_eq!(loader.into_registry().len(), 2);
    }

    #[test]
    fn test_missing_directory() {
        let mut loader = SkillLoader::new("/definitely/not/here");
        assert!(matches!(loader.load_all(), Err(SkillLoadError::NotFound(_))));
    }

    #[test]
    fn test_provider_lookup() {
        let mut registry = SkillRegistry::new();
        registry
            .register(
                SkillEntry::new(SkillId::new(5), "Tide")
                    .with_element(Element::Water)
                    .with_damage_multiplier(1.2),
            )
            .expect("register");

        let provider: &dyn SkillProvider = &registry;
        assert!(provider.skill(SkillId::new(5)).is_some());
        assert!(provider.skill(SkillId::new(6)).is_none());
        assert_eq!(registry.by_element(Element::Water).len(), 1);
    }
}
