//! Core types shared by every stage of the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    /// Get all abilities in sheet order
    pub fn all() -> &'static [Ability] {
        &[
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Full lower-case name, also the prefix of its bonus attribute key
    pub fn name(self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    /// Three letter abbreviation ("str", "dex", ...)
    pub fn abbreviation(self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
        }
    }

    /// Attribute key that carries bonuses to this ability
    pub fn bonus_key(self) -> String {
        format!("{}Bonus", self.name())
    }

    /// Parse either the full name or the abbreviation, case-insensitively
    pub fn parse(text: &str) -> Option<Ability> {
        let text = text.trim().to_lowercase();
        Ability::all()
            .iter()
            .copied()
            .find(|a| a.name() == text || a.abbreviation() == text)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Creature and weapon size scale, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Default for Size {
    fn default() -> Self {
        Size::Medium
    }
}

impl Size {
    pub fn all() -> &'static [Size] {
        &[
            Size::Fine,
            Size::Diminutive,
            Size::Tiny,
            Size::Small,
            Size::Medium,
            Size::Large,
            Size::Huge,
            Size::Gargantuan,
            Size::Colossal,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Size::Fine => "fine",
            Size::Diminutive => "diminutive",
            Size::Tiny => "tiny",
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
            Size::Huge => "huge",
            Size::Gargantuan => "gargantuan",
            Size::Colossal => "colossal",
        }
    }

    pub fn parse(text: &str) -> Option<Size> {
        let text = text.trim().to_lowercase();
        Size::all().iter().copied().find(|s| s.name() == text)
    }

    /// Position on the size scale
    pub fn step(self) -> i32 {
        self as i32
    }

    /// Signed number of steps from `other` to `self` (positive when `self` is larger)
    pub fn steps_above(self, other: Size) -> i32 {
        self.step() - other.step()
    }

    /// Size modifier applied to reflex defense
    pub fn reflex_modifier(self) -> i32 {
        match self {
            Size::Fine => 10,
            Size::Diminutive => 5,
            Size::Tiny => 2,
            Size::Small => 1,
            Size::Medium => 0,
            Size::Large => -1,
            Size::Huge => -2,
            Size::Gargantuan => -5,
            Size::Colossal => -10,
        }
    }

    /// Size bonus added to the damage threshold
    pub fn damage_threshold_modifier(self) -> i32 {
        match self {
            Size::Large => 5,
            Size::Huge => 10,
            Size::Gargantuan => 20,
            Size::Colossal => 50,
            _ => 0,
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a trait represents on the character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraitKind {
    Species,
    Class,
    Feat,
    Talent,
    Trait,
    ForcePower,
    Appendage,
    Locomotion,
    Weapon,
    Armor,
    Equipment,
    Template,
}

impl TraitKind {
    /// Whether the trait only contributes while equipped
    pub fn is_gear(self) -> bool {
        matches!(self, TraitKind::Weapon | TraitKind::Armor | TraitKind::Equipment)
    }
}

/// Weapon firing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateOfFire {
    Single,
    Autofire,
}

impl RateOfFire {
    pub fn label(self) -> &'static str {
        match self {
            RateOfFire::Single => "Single-Shot",
            RateOfFire::Autofire => "Autofire",
        }
    }
}

/// Armor weight class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
}

impl ArmorCategory {
    /// Proficiency category name, as granted by `armorProficiency` contributions
    pub fn proficiency_name(self) -> &'static str {
        match self {
            ArmorCategory::Light => "light",
            ArmorCategory::Medium => "medium",
            ArmorCategory::Heavy => "heavy",
        }
    }

    /// Check penalty when worn without proficiency
    pub fn check_penalty(self) -> i32 {
        match self {
            ArmorCategory::Light => -2,
            ArmorCategory::Medium => -5,
            ArmorCategory::Heavy => -10,
        }
    }
}

/// Identifier for a trait document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitId(pub String);

impl From<&str> for TraitId {
    fn from(s: &str) -> Self {
        TraitId(s.to_string())
    }
}

impl From<String> for TraitId {
    fn from(s: String) -> Self {
        TraitId(s)
    }
}

impl fmt::Display for TraitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a character document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        CharacterId(s.to_string())
    }
}

impl From<String> for CharacterId {
    fn from(s: String) -> Self {
        CharacterId(s)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
