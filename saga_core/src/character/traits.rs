//! Trait documents - species, classes, feats, talents and gear

use crate::attribute::Contribution;
use crate::types::{ArmorCategory, RateOfFire, Size, TraitId, TraitKind};
use serde::{Deserialize, Serialize};

/// Back-reference to the trait that granted this one automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: TraitId,
    #[serde(default)]
    pub name: String,
}

/// Any character-owned entry that contributes bonuses or gates other entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trait {
    pub id: TraitId,
    pub name: String,
    pub kind: TraitKind,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Supplier>,
    #[serde(default)]
    pub is_supplied: bool,
    /// Gear only contributes while equipped
    #[serde(default)]
    pub equipped: bool,
    /// Available-item slot this trait was taken against ("General Feats", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<WeaponProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorProfile>,
    /// Carried weight in kilograms
    #[serde(default)]
    pub weight: f64,
}

impl Trait {
    pub fn new(id: impl Into<TraitId>, name: impl Into<String>, kind: TraitKind) -> Self {
        Trait {
            id: id.into(),
            name: name.into(),
            kind,
            contributions: Vec::new(),
            prerequisites: Vec::new(),
            supplier: None,
            is_supplied: false,
            equipped: false,
            slot: None,
            weapon: None,
            armor: None,
            weight: 0.0,
        }
    }

    pub fn with_contributions(mut self, contributions: Vec<Contribution>) -> Self {
        self.contributions.extend(contributions);
        self
    }

    pub fn with_contribution(mut self, contribution: Contribution) -> Self {
        self.contributions.push(contribution);
        self
    }

    pub fn with_prerequisite(mut self, prerequisite: impl Into<String>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    /// Mark as granted by another trait
    pub fn supplied_by(mut self, supplier: &Trait) -> Self {
        self.supplier = Some(Supplier {
            id: supplier.id.clone(),
            name: supplier.name.clone(),
        });
        self.is_supplied = true;
        self
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_armor(mut self, armor: ArmorProfile) -> Self {
        self.armor = Some(armor);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn equip(mut self) -> Self {
        self.equipped = true;
        self
    }

    /// Whether this trait currently feeds the aggregator
    pub fn contributes(&self) -> bool {
        !self.kind.is_gear() || self.equipped
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Weapon-specific fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponProfile {
    /// Damage dice; slash-separated for double weapons ("2d8/2d8")
    pub damage: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stun: Option<StunProfile>,
    #[serde(default)]
    pub rates_of_fire: Vec<RateOfFire>,
}

impl WeaponProfile {
    pub fn new(damage: impl Into<String>, size: Size) -> Self {
        WeaponProfile {
            damage: damage.into(),
            categories: Vec::new(),
            size,
            stun: None,
            rates_of_fire: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_stun(mut self, stun: StunProfile) -> Self {
        self.stun = Some(stun);
        self
    }

    pub fn with_rates_of_fire(mut self, rates: &[RateOfFire]) -> Self {
        self.rates_of_fire = rates.to_vec();
        self
    }

    /// Lower-cased categories
    pub fn category_keys(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.trim().to_lowercase()).collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.trim().eq_ignore_ascii_case(category))
    }

    /// Autofire is the only firing mode
    pub fn is_autofire_only(&self) -> bool {
        self.rates_of_fire == [RateOfFire::Autofire]
    }
}

/// Stun setting of a weapon
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StunProfile {
    /// Stun damage dice; the weapon's normal dice when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
    /// The weapon can only deal stun damage
    #[serde(default)]
    pub exclusive: bool,
}

/// Armor-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorProfile {
    pub category: ArmorCategory,
    #[serde(default)]
    pub reflex_bonus: i32,
    #[serde(default)]
    pub fortitude_bonus: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dex_bonus: Option<i32>,
}
