//! Rules configuration - house rules and tunable constants

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// How Skill Focus adds to a skill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillFocusCalculation {
    /// Flat bonus (`skills.skill_focus_bonus`, +5 by default)
    #[default]
    Default,
    /// Half character level, rounded up
    HalfLevelRoundUp,
    /// Half character level, rounded down
    HalfLevelRoundDown,
}

/// Tunable rules threaded into the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub house_rules: HouseRules,
    #[serde(default)]
    pub skills: SkillRules,
    #[serde(default)]
    pub condition: ConditionRules,
    #[serde(default)]
    pub combat: CombatRules,
    #[serde(default)]
    pub encumbrance: EncumbranceRules,
}

/// A single setting value, as returned by [`RulesConfig::get`]
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(i32),
    Text(String),
}

impl RulesConfig {
    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = super::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the rules shipped with the crate
    pub fn bundled() -> Self {
        let toml = include_str!("../../config/rules.toml");
        Self::from_toml(toml).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combat.unarmed_dice.is_empty() {
            return Err(ConfigError::ValidationError(
                "combat.unarmed_dice must not be empty".to_string(),
            ));
        }
        if self.combat.unarmed_dice.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::ValidationError(
                "combat.unarmed_dice must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up a setting by dotted name
    ///
    /// Unknown names return `SettingValue::Bool(false)`.
    pub fn get(&self, key: &str) -> SettingValue {
        match key {
            "house_rules.merge_point_blank_and_precise_shot" => {
                SettingValue::Bool(self.house_rules.merge_point_blank_and_precise_shot)
            }
            "house_rules.encumbrance_by_weight" => {
                SettingValue::Bool(self.house_rules.encumbrance_by_weight)
            }
            "house_rules.skill_focus_calculation" => SettingValue::Text(
                match self.house_rules.skill_focus_calculation {
                    SkillFocusCalculation::Default => "default",
                    SkillFocusCalculation::HalfLevelRoundUp => "half_level_round_up",
                    SkillFocusCalculation::HalfLevelRoundDown => "half_level_round_down",
                }
                .to_string(),
            ),
            "skills.default_trained_skills" => SettingValue::Number(self.skills.default_trained_skills),
            "skills.skill_focus_bonus" => SettingValue::Number(self.skills.skill_focus_bonus),
            "combat.non_proficient_penalty" => SettingValue::Number(self.combat.non_proficient_penalty),
            "combat.autofire_penalty" => SettingValue::Number(self.combat.autofire_penalty),
            _ => SettingValue::Bool(false),
        }
    }

    /// Boolean view of [`RulesConfig::get`]; false for unknown or non-boolean settings
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), SettingValue::Bool(true))
    }

    /// Flat penalty for a condition track step
    pub fn condition_penalty(&self, step: u8) -> i32 {
        let penalties = &self.condition.penalties;
        let index = (step as usize).min(penalties.len().saturating_sub(1));
        penalties.get(index).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseRules {
    /// Owning Point-Blank Shot also grants Precise Shot
    #[serde(default)]
    pub merge_point_blank_and_precise_shot: bool,
    /// Apply the heavy-load penalty from carried weight
    #[serde(default)]
    pub encumbrance_by_weight: bool,
    #[serde(default)]
    pub skill_focus_calculation: SkillFocusCalculation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRules {
    /// Trained skills at first level when no class states its own count
    #[serde(default = "default_trained_skills")]
    pub default_trained_skills: i32,
    #[serde(default = "default_skill_focus_bonus")]
    pub skill_focus_bonus: i32,
    #[serde(default = "default_trained_bonus")]
    pub trained_bonus: i32,
}

impl Default for SkillRules {
    fn default() -> Self {
        SkillRules {
            default_trained_skills: 3,
            skill_focus_bonus: 5,
            trained_bonus: 5,
        }
    }
}

fn default_trained_skills() -> i32 {
    3
}
fn default_skill_focus_bonus() -> i32 {
    5
}
fn default_trained_bonus() -> i32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRules {
    /// Penalty per step, index 0 (normal) to 5 (helpless)
    #[serde(default = "default_condition_penalties")]
    pub penalties: Vec<i32>,
}

impl Default for ConditionRules {
    fn default() -> Self {
        ConditionRules {
            penalties: default_condition_penalties(),
        }
    }
}

fn default_condition_penalties() -> Vec<i32> {
    vec![0, -1, -2, -5, -10, -10]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    /// Weapon categories that make an attack ranged
    #[serde(default = "default_ranged_categories")]
    pub ranged_categories: Vec<String>,
    /// Die-size ladder for unarmed damage
    #[serde(default = "default_unarmed_dice")]
    pub unarmed_dice: Vec<u32>,
    #[serde(default = "default_penalty")]
    pub non_proficient_penalty: i32,
    #[serde(default = "default_penalty")]
    pub autofire_penalty: i32,
    /// Double-weapon penalty before Dual Weapon Mastery
    #[serde(default = "default_multi_attack_penalty")]
    pub multi_attack_penalty: i32,
}

impl Default for CombatRules {
    fn default() -> Self {
        CombatRules {
            ranged_categories: default_ranged_categories(),
            unarmed_dice: default_unarmed_dice(),
            non_proficient_penalty: -5,
            autofire_penalty: -5,
            multi_attack_penalty: -10,
        }
    }
}

fn default_ranged_categories() -> Vec<String> {
    [
        "pistols",
        "rifles",
        "heavy weapons",
        "simple ranged weapons",
        "exotic ranged weapons",
        "grenades",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_unarmed_dice() -> Vec<u32> {
    vec![2, 3, 4, 6, 8, 10, 12]
}

fn default_penalty() -> i32 {
    -5
}

fn default_multi_attack_penalty() -> i32 {
    -10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncumbranceRules {
    /// Heavy load above `strength² × factor` kilograms
    #[serde(default = "default_capacity_factor")]
    pub capacity_factor: f64,
    #[serde(default = "default_heavy_load_penalty")]
    pub heavy_load_penalty: i32,
}

impl Default for EncumbranceRules {
    fn default() -> Self {
        EncumbranceRules {
            capacity_factor: 0.5,
            heavy_load_penalty: -10,
        }
    }
}

fn default_capacity_factor() -> f64 {
    0.5
}
fn default_heavy_load_penalty() -> i32 {
    -10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.skills.default_trained_skills, 3);
        assert_eq!(rules.condition_penalty(0), 0);
        assert_eq!(rules.condition_penalty(3), -5);
        assert_eq!(rules.condition_penalty(9), -10);
        assert_eq!(rules.combat.unarmed_dice, vec![2, 3, 4, 6, 8, 10, 12]);
    }

    #[test]
    fn test_bundled_matches_defaults() {
        assert_eq!(RulesConfig::bundled(), RulesConfig::default());
    }

    #[test]
    fn test_parse_partial_rules() {
        let toml = r#"
[house_rules]
merge_point_blank_and_precise_shot = true
skill_focus_calculation = "half_level_round_up"

[skills]
default_trained_skills = 4
"#;
        let rules = RulesConfig::from_toml(toml).unwrap();
        assert!(rules.house_rules.merge_point_blank_and_precise_shot);
        assert_eq!(
            rules.house_rules.skill_focus_calculation,
            SkillFocusCalculation::HalfLevelRoundUp
        );
        assert_eq!(rules.skills.default_trained_skills, 4);
        // Untouched sections keep their defaults
        assert_eq!(rules.skills.skill_focus_bonus, 5);
        assert_eq!(rules.combat.autofire_penalty, -5);
    }

    #[test]
    fn test_unknown_setting_defaults() {
        let rules = RulesConfig::default();
        assert_eq!(rules.get("no.such.setting"), SettingValue::Bool(false));
        assert!(!rules.flag("no.such.setting"));
        assert_eq!(rules.get("skills.skill_focus_bonus"), SettingValue::Number(5));
    }

    #[test]
    fn test_invalid_dice_ladder_rejected() {
        let toml = r#"
[combat]
unarmed_dice = [4, 2]
"#;
        assert!(matches!(
            RulesConfig::from_toml(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
