//! Skill definition loading

use super::ConfigError;
use crate::types::Ability;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One skill as content data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    pub ability: Ability,
    /// Subject to the armor check and encumbrance penalties
    #[serde(default)]
    pub physical: bool,
}

impl SkillDefinition {
    /// Lower-case key used on the sheet and in attribute keys
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Attribute key carrying bonuses to this skill ("stealthSkillBonus")
    pub fn bonus_key(&self) -> String {
        let mut key = String::new();
        for (i, word) in self
            .name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .enumerate()
        {
            let word = word.to_lowercase();
            if i == 0 {
                key.push_str(&word);
            } else {
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    key.extend(first.to_uppercase());
                    key.push_str(chars.as_str());
                }
            }
        }
        key.push_str("SkillBonus");
        key
    }

    pub fn is_knowledge(&self) -> bool {
        self.key().starts_with("knowledge")
    }
}

/// Container for skill definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub skills: Vec<SkillDefinition>,
}

/// Load skill definitions from a TOML file
pub fn load_skill_configs(path: &Path) -> Result<Vec<SkillDefinition>, ConfigError> {
    let config: SkillsConfig = super::load_toml(path)?;
    validate(config.skills)
}

/// Load skill definitions from a TOML string
pub fn parse_skill_configs(content: &str) -> Result<Vec<SkillDefinition>, ConfigError> {
    let config: SkillsConfig = super::parse_toml(content)?;
    validate(config.skills)
}

fn validate(skills: Vec<SkillDefinition>) -> Result<Vec<SkillDefinition>, ConfigError> {
    let mut seen = std::collections::BTreeSet::new();
    for skill in &skills {
        if !seen.insert(skill.key()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate skill: {}",
                skill.name
            )));
        }
    }
    Ok(skills)
}

/// Get the bundled skill list
pub fn default_skills() -> Vec<SkillDefinition> {
    let toml = include_str!("../../config/skills.toml");
    parse_skill_configs(toml).unwrap_or_else(|_| {
        vec![SkillDefinition {
            name: "Perception".to_string(),
            ability: Ability::Wisdom,
            physical: false,
        }]
    })
}
