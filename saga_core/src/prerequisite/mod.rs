//! Prerequisites - Parse free-text clauses and check them against a character
//!
//! Clauses are evaluated against the character's last derived block, so a
//! check never triggers a recompute.

mod parser;

pub use parser::{normalize, parse};

use crate::character::Character;
use crate::types::{Ability, Size, TraitKind};
use serde::{Deserialize, Serialize};

/// Parsed form of one clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    /// Outside the engine's authority; always satisfied
    Narrative(String),
    Or(Vec<Predicate>),
    All(Vec<Predicate>),
    TrainedSkill(String),
    AnyKnowledgeSkill,
    Appendage {
        count: u32,
        kind: Option<String>,
        locomotion: bool,
    },
    SizeOrLarger(Size),
    AbilityThreshold { ability: Ability, minimum: i32 },
    BaseAttackBonus(i32),
    /// Upper bound: fails once the character is past this level
    CharacterLevel(i32),
    Proficient(String),
    Droid(bool),
    Possession(String),
}

impl Predicate {
    pub fn is_satisfied(&self, character: &Character) -> bool {
        let stats = &character.stats;
        match self {
            Predicate::Narrative(_) => true,
            Predicate::Or(options) => options.iter().any(|p| p.is_satisfied(character)),
            Predicate::All(parts) => parts.iter().all(|p| p.is_satisfied(character)),
            Predicate::TrainedSkill(skill) => character.is_trained(skill) || stats.is_trained(skill),
            Predicate::AnyKnowledgeSkill => character
                .trained_skills
                .iter()
                .any(|s| s.starts_with("knowledge")),
            Predicate::Appendage {
                count,
                kind,
                locomotion,
            } => {
                let wanted = if *locomotion {
                    TraitKind::Locomotion
                } else {
                    TraitKind::Appendage
                };
                let owned = character
                    .owned_traits()
                    .into_iter()
                    .filter(|t| t.kind == wanted)
                    .filter(|t| {
                        kind.as_ref()
                            .map_or(true, |k| t.name.to_lowercase().contains(k.as_str()))
                    })
                    .count();
                owned >= *count as usize
            }
            Predicate::SizeOrLarger(size) => stats.size >= *size,
            Predicate::AbilityThreshold { ability, minimum } => {
                let total = stats
                    .ability(*ability)
                    .map_or_else(|| character.base_ability(*ability).unwrap_or(0), |a| a.total);
                total >= *minimum
            }
            Predicate::BaseAttackBonus(minimum) => stats.offense.base_attack_bonus >= *minimum,
            Predicate::CharacterLevel(level) => stats.level <= *level,
            Predicate::Proficient(category) => {
                let p = &stats.proficiencies;
                p.covers_weapon(category)
                    || p.covers_armor(category)
                    || category
                        .strip_suffix(" armor")
                        .is_some_and(|c| p.covers_armor(c))
            }
            Predicate::Droid(expected) => stats.is_droid == *expected,
            Predicate::Possession(name) => character.possesses(name),
        }
    }
}

/// Outcome of a single clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteResult {
    pub satisfied: bool,
    /// The clause as written when unmet, or the narrative note
    pub reason: Option<String>,
    pub predicate: Predicate,
}

/// Evaluate one clause
pub fn evaluate(text: &str, character: &Character) -> PrerequisiteResult {
    let predicate = parse(text);
    let satisfied = predicate.is_satisfied(character);
    let reason = match &predicate {
        Predicate::Narrative(_) => Some(text.trim().to_string()),
        _ if !satisfied => Some(text.trim().to_string()),
        _ => None,
    };
    PrerequisiteResult {
        satisfied,
        reason,
        predicate,
    }
}

/// AND of a clause list, with each unmet clause listed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteReport {
    pub satisfied: bool,
    pub failures: Vec<String>,
    /// Clauses not checked by the engine
    pub notes: Vec<String>,
}

pub fn meets_prerequisites<S: AsRef<str>>(clauses: &[S], character: &Character) -> PrerequisiteReport {
    let mut report = PrerequisiteReport {
        satisfied: true,
        ..PrerequisiteReport::default()
    };
    for clause in clauses {
        let result = evaluate(clause.as_ref(), character);
        match (result.satisfied, result.reason) {
            (false, Some(reason)) => {
                report.satisfied = false;
                report.failures.push(reason);
            }
            (true, Some(note)) => report.notes.push(note),
            _ => {}
        }
    }
    report
}
