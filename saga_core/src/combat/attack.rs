//! Attack - One rollable attack option

use crate::types::{CharacterId, TraitId};
use serde::{Deserialize, Serialize};

/// A generated attack with its roll formulas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    /// Position in the generated list, stable across identical recomputes
    pub id: u32,
    pub name: String,
    pub to_hit: String,
    /// One formula per damage roll (several for a full-round double attack)
    pub damage: Vec<String>,
    /// Weapon trait; none for the unarmed strike
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_weapon: Option<TraitId>,
    pub actor: CharacterId,

    // === Flags ===
    #[serde(default)]
    pub ranged: bool,
    #[serde(default)]
    pub stun: bool,
    #[serde(default)]
    pub autofire: bool,
    #[serde(default)]
    pub full_round: bool,
}

/// How the weapon is held, by size relative to the wielder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handedness {
    Light,
    OneHanded,
    TwoHanded,
}

impl Handedness {
    /// From the weapon's size steps above the wielder
    pub fn from_steps(steps: i32) -> Self {
        match steps {
            s if s < 0 => Handedness::Light,
            0 => Handedness::OneHanded,
            _ => Handedness::TwoHanded,
        }
    }

    /// Strength multiplier on melee damage
    pub fn strength_multiplier(self) -> i32 {
        match self {
            Handedness::TwoHanded => 2,
            _ => 1,
        }
    }
}
