//! Error types for the combat engine.
//!
//! Gameplay conditions (no target, out of range, cooling down, not enough
//! mana) are never errors. These variants cover caller mistakes only.

use thiserror::Error;

use crate::ids::EntityId;

/// Programmer errors raised by combat processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatError {
    /// Effect duration was negative, NaN or infinite.
    #[error("invalid effect duration: {0}")]
    InvalidEffectDuration(f32),

    /// Effect intensity was negative, NaN or infinite.
    #[error("invalid effect intensity: {0}")]
    InvalidEffectIntensity(f32),

    /// A combatant with this ID is already registered.
    #[error("combatant {0} is already registered")]
    DuplicateCombatant(EntityId),
}

/// Result type alias for combat operations that can fail.
pub type CombatResult<T> = Result<T, CombatError>;
