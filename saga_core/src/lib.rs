//! saga_core - Derived-stat engine for Saga-style character sheets
//!
//! This library provides:
//! - Value resolution: numeric tokens and directives (`*2`, `min 1`, `@charLevel`)
//! - Attribute aggregation: trait contributions reduced with SUM, MAX, OR, ...
//! - Prerequisites: free-text clauses parsed and checked against a character
//! - Pipeline: traits → abilities → skills → shields → defenses → health → offense → attacks
//! - Attacks: to-hit and damage formulas for unarmed and wielded weapons

pub mod attribute;
pub mod character;
pub mod combat;
pub mod config;
pub mod pipeline;
pub mod prelude;
pub mod prerequisite;
pub mod store;
pub mod types;
pub mod value;

// Re-export core types for convenience
pub use attribute::{aggregate, Aggregation, Aggregator, Contribution, ContributionFilter, Reduced, ReduceMode};
pub use character::{Character, DerivedStats, Trait};
pub use combat::{generate_attacks, Attack};
pub use config::{default_skills, ConfigError, RulesConfig, SkillDefinition};
pub use pipeline::{Engine, Recomputation, Stage};
pub use prerequisite::{evaluate, meets_prerequisites, Predicate, PrerequisiteReport, PrerequisiteResult};
pub use store::{cleanup_orphans, StoreError, TraitStore};
pub use types::{Ability, CharacterId, Size, TraitId, TraitKind};
pub use value::{resolve, AttributeValue, ResolveError, ValueContext};
