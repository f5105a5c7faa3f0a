//! # Wuxing Common
//!
//! Shared types for the Wuxing combat engine:
//! - ID types (EntityId, SkillId)
//! - Programmer-error type for combat processing
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_skill_id_raw() {
        let id = SkillId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(SkillId::from(42), id);
    }
}
