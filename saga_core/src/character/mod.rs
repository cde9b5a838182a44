//! Character - The aggregate root: persisted inputs plus the derived block

mod derived;
mod traits;

pub use derived::{
    ability_modifier, AbilityScore, Defense, Defenses, DerivedStats, Health, Offense,
    Proficiencies, Shields, SkillAllocation, SkillEntry,
};
pub use traits::{ArmorProfile, StunProfile, Supplier, Trait, WeaponProfile};

use crate::pipeline::Engine;
use crate::types::{Ability, CharacterId, TraitId};
use crate::value::{resolve_one, AttributeValue, ResolveError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A character snapshot as handed over by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    // === Identity ===
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,

    // === Persisted inputs ===
    /// Base ability scores before any bonus, as entered by the host
    #[serde(default)]
    pub abilities: BTreeMap<Ability, AttributeValue>,
    /// Lower-case names of trained skills
    #[serde(default)]
    pub trained_skills: BTreeSet<String>,
    /// Condition track step, 0 to 5
    #[serde(default)]
    pub condition: u8,
    #[serde(default)]
    pub current_health: Option<i32>,
    #[serde(default)]
    pub temporary_health: i32,
    #[serde(default)]
    pub current_shields: Option<i32>,
    #[serde(default)]
    pub shields_active: bool,

    // === Owned documents ===
    #[serde(default)]
    pub traits: Vec<Trait>,

    // === Derived ===
    /// Last recomputed block
    #[serde(default)]
    pub stats: DerivedStats,
}

impl Character {
    /// Create a character with every base ability at 10
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
        Character {
            id: id.into(),
            name: name.into(),
            abilities: Ability::all().iter().map(|a| (*a, AttributeValue::from(10))).collect(),
            trained_skills: BTreeSet::new(),
            condition: 0,
            current_health: None,
            temporary_health: 0,
            current_shields: None,
            shields_active: false,
            traits: Vec::new(),
            stats: DerivedStats::default(),
        }
    }

    pub fn with_ability(mut self, ability: Ability, score: i32) -> Self {
        self.abilities.insert(ability, AttributeValue::from(score));
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    pub fn train(mut self, skill: &str) -> Self {
        self.trained_skills.insert(skill.trim().to_lowercase());
        self
    }

    /// Base score, 10 when absent; a non-numeric entry is an error
    pub fn base_ability(&self, ability: Ability) -> Result<i32, ResolveError> {
        match self.abilities.get(&ability) {
            Some(value) => Ok(resolve_one(value, &())?.map_or(10, |n| n.floor() as i32)),
            None => Ok(10),
        }
    }

    pub fn is_trained(&self, skill: &str) -> bool {
        self.trained_skills.contains(&skill.trim().to_lowercase())
    }

    pub fn find_trait(&self, id: &TraitId) -> Option<&Trait> {
        self.traits.iter().find(|t| &t.id == id)
    }

    /// Traits whose declared supplier is no longer present
    pub fn orphaned_traits(&self) -> Vec<&Trait> {
        let ids: BTreeSet<&TraitId> = self.traits.iter().map(|t| &t.id).collect();
        self.traits
            .iter()
            .filter(|t| t.supplier.as_ref().is_some_and(|s| !ids.contains(&s.id)))
            .collect()
    }

    /// Every trait except orphans, equipped or not
    pub fn owned_traits(&self) -> Vec<&Trait> {
        let orphans: BTreeSet<&TraitId> = self.orphaned_traits().into_iter().map(|t| &t.id).collect();
        self.traits.iter().filter(|t| !orphans.contains(&t.id)).collect()
    }

    /// Traits that feed the aggregator: owned, and equipped when they are gear
    pub fn active_traits(&self) -> Vec<&Trait> {
        self.owned_traits().into_iter().filter(|t| t.contributes()).collect()
    }

    /// Whether the character owns a trait (or resolved feat/talent) with this name
    pub fn possesses(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.owned_traits().iter().any(|t| t.name_matches(&name))
            || self.stats.feats.contains(&name)
            || self.stats.talents.contains(&name)
    }

    /// Recompute the derived block in place, returning orphaned trait ids to delete
    pub fn recompute(&mut self, engine: &mut Engine) -> Vec<TraitId> {
        let outcome = engine.recompute(self);
        self.stats = outcome.stats;
        outcome.orphans
    }
}
