//! DerivedStats - Everything the pipeline computes for a character

use crate::combat::Attack;
use crate::types::{Ability, Size};
use crate::value::ValueContext;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fully recomputed derived-stat block
///
/// Built from scratch on every recompute; no field survives from the
/// previous cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    // === Traits ===
    pub level: i32,
    pub heroic_level: i32,
    /// Levels per class name
    pub classes: BTreeMap<String, i32>,
    pub species: Option<String>,
    pub size: Size,
    pub is_droid: bool,
    pub feats: BTreeSet<String>,
    pub talents: BTreeSet<String>,
    pub proficiencies: Proficiencies,
    /// Remaining count per slot ("General Feats", "Force Powers", ...)
    pub available_items: BTreeMap<String, i32>,

    // === Condition ===
    pub condition_penalty: i32,
    pub helpless: bool,

    // === Abilities & Skills ===
    pub abilities: BTreeMap<Ability, AbilityScore>,
    pub skills: BTreeMap<String, SkillEntry>,
    pub trainable_skills: i32,
    pub skill_allocation: SkillAllocation,

    // === Survivability ===
    pub shields: Shields,
    pub defenses: Defenses,
    pub health: Health,

    // === Offense ===
    pub offense: Offense,
    pub attacks: Vec<Attack>,

    // === Side channels ===
    /// Named roll variables published for the roll layer ("@charLevel", ...)
    pub variables: BTreeMap<String, i32>,
    /// Fields that fell back to a default during the recompute
    pub warnings: Vec<String>,
}

impl DerivedStats {
    pub fn half_level(&self) -> i32 {
        self.level.div_euclid(2)
    }

    pub fn ability(&self, ability: Ability) -> Option<&AbilityScore> {
        self.abilities.get(&ability)
    }

    /// Ability modifier, 0 when absent or skipped
    pub fn modifier(&self, ability: Ability) -> i32 {
        self.ability(ability)
            .filter(|a| !a.skip)
            .map_or(0, |a| a.modifier)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillEntry> {
        self.skills.get(&name.trim().to_lowercase())
    }

    pub fn is_trained(&self, name: &str) -> bool {
        self.skill(name).is_some_and(|s| s.trained)
    }

    /// Publish a roll variable
    pub fn publish(&mut self, name: &str, value: i32) {
        self.variables.insert(format!("@{}", name), value);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

impl ValueContext for DerivedStats {
    fn variable(&self, name: &str) -> Option<f64> {
        self.variables.variable(name)
    }
}

/// Granted proficiency categories, all lower-case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proficiencies {
    pub weapons: BTreeSet<String>,
    pub armor: BTreeSet<String>,
    pub weapon_focus: BTreeSet<String>,
}

impl Proficiencies {
    /// Whether a weapon category is covered, expanding "simple weapons"
    pub fn covers_weapon(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        if self.weapons.contains(&category) {
            return true;
        }
        self.weapons.contains("simple weapons")
            && (category == "simple melee weapons" || category == "simple ranged weapons")
    }

    pub fn covers_armor(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        self.armor.contains(&category) || self.armor.contains(&format!("{} armor", category))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScore {
    pub base: i32,
    pub bonus: i32,
    pub total: i32,
    pub modifier: i32,
    /// Modifier with the condition penalty applied
    pub roll: i32,
    /// No score at all (a droid's Constitution)
    pub skip: bool,
    pub tip: String,
}

impl AbilityScore {
    pub fn from_total(base: i32, bonus: i32, condition_penalty: i32) -> Self {
        let total = base + bonus;
        let modifier = ability_modifier(total);
        AbilityScore {
            base,
            bonus,
            total,
            modifier,
            roll: modifier + condition_penalty,
            skip: false,
            tip: String::new(),
        }
    }
}

/// `floor((total - 10) / 2)`
pub fn ability_modifier(total: i32) -> i32 {
    (total - 10).div_euclid(2)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub label: String,
    pub ability: Ability,
    pub trained: bool,
    pub focus: bool,
    pub value: i32,
    pub tip: String,
}

/// Trained skills compared to the trainable count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillAllocation {
    Under,
    #[default]
    Exact,
    Over,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub max: i32,
    pub current: i32,
    pub temporary: i32,
    pub bonus: i32,
    /// Condition track step, 0 (normal) to 5 (helpless)
    pub condition: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shields {
    pub max: i32,
    pub current: i32,
    pub active: bool,
}

/// One defense with its component breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defense {
    pub total: i32,
    pub base: i32,
    /// Heroic level or armor bonus
    pub level_or_armor: i32,
    pub ability: i32,
    pub class_bonus: i32,
    pub misc: i32,
    pub size: i32,
    pub condition: i32,
    pub tip: String,
}

impl Defense {
    pub fn compute_total(&mut self) {
        self.total = self.base
            + self.level_or_armor
            + self.ability
            + self.class_bonus
            + self.misc
            + self.size
            + self.condition;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defenses {
    pub fortitude: Defense,
    pub will: Defense,
    pub reflex: Defense,
    pub flat_footed: Defense,
    pub damage_threshold: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offense {
    pub base_attack_bonus: i32,
    pub melee_attack_bonus: i32,
    pub ranged_attack_bonus: i32,
    /// Weapon Finesse attack bonus (BAB + DEX)
    pub finesse_attack_bonus: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_modifier_examples() {
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(18), 4);
        assert_eq!(ability_modifier(1), -5);
    }

    #[test]
    fn test_simple_weapons_expand() {
        let mut p = Proficiencies::default();
        p.weapons.insert("simple weapons".to_string());
        assert!(p.covers_weapon("Simple Melee Weapons"));
        assert!(p.covers_weapon("simple ranged weapons"));
        assert!(!p.covers_weapon("pistols"));
    }

    #[test]
    fn test_defense_total() {
        let mut d = Defense {
            base: 10,
            level_or_armor: 3,
            ability: 2,
            class_bonus: 1,
            misc: 1,
            size: -1,
            condition: -2,
            ..Defense::default()
        };
        d.compute_total();
        assert_eq!(d.total, 14);
    }

    proptest! {
        #[test]
        fn prop_modifier_is_floor_division(total in -30i32..60) {
            let expected = ((total as f64 - 10.0) / 2.0).floor() as i32;
            prop_assert_eq!(ability_modifier(total), expected);
        }
    }
}
