//! Prelude module for convenient imports
//!
//! ```rust
//! use saga_core::prelude::*;
//! ```

// Character model
pub use crate::character::{
    ArmorProfile, Character, DerivedStats, StunProfile, Trait, WeaponProfile,
};
pub use crate::types::{Ability, ArmorCategory, CharacterId, RateOfFire, Size, TraitId, TraitKind};

// Aggregation
pub use crate::attribute::{Contribution, ContributionFilter, ReduceMode};
pub use crate::value::AttributeValue;

// Engine
pub use crate::pipeline::Engine;
pub use crate::config::{default_skills, RulesConfig};

// Checks and attacks
pub use crate::combat::Attack;
pub use crate::prerequisite::{evaluate, meets_prerequisites};
pub use crate::store::{cleanup_orphans, TraitStore};
