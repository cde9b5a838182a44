//! Derived-stat pipeline - Ordered stages from traits to attacks
//!
//! Stages run in a fixed order, each reading what the earlier ones wrote to
//! the [`DerivedStats`] under construction:
//!
//! traits → abilities → skills → shields → defenses → health → offense → attacks

mod abilities;
mod cache;
mod defenses;
mod health;
mod offense;
mod skills;
mod traits;

pub use cache::{CacheKey, ComputationCache, Query};

use crate::attribute::{Aggregator, ContributionFilter, Reduced, ReduceMode};
use crate::character::{Character, DerivedStats, Trait};
use crate::combat;
use crate::config::{default_skills, RulesConfig, SkillDefinition};
use crate::types::TraitId;
use crate::value::ResolveError;
use serde::{Deserialize, Serialize};

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Traits,
    Abilities,
    Skills,
    Shields,
    Defenses,
    Health,
    Offense,
    Attacks,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Traits,
            Stage::Abilities,
            Stage::Skills,
            Stage::Shields,
            Stage::Defenses,
            Stage::Health,
            Stage::Offense,
            Stage::Attacks,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Traits => "traits",
            Stage::Abilities => "abilities",
            Stage::Skills => "skills",
            Stage::Shields => "shields",
            Stage::Defenses => "defenses",
            Stage::Health => "health",
            Stage::Offense => "offense",
            Stage::Attacks => "attacks",
        }
    }
}

/// Output of one recompute
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputation {
    pub stats: DerivedStats,
    /// Traits whose supplier is gone; the host should delete them
    pub orphans: Vec<TraitId>,
}

/// Runs the pipeline with a fixed rule set
#[derive(Debug)]
pub struct Engine {
    rules: RulesConfig,
    skills: Vec<SkillDefinition>,
    cache: ComputationCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(RulesConfig::bundled(), default_skills())
    }
}

impl Engine {
    pub fn new(rules: RulesConfig, skills: Vec<SkillDefinition>) -> Self {
        Engine {
            rules,
            skills,
            cache: ComputationCache::new(),
        }
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn skills(&self) -> &[SkillDefinition] {
        &self.skills
    }

    pub fn cache(&self) -> &ComputationCache {
        &self.cache
    }

    /// Recompute every derived field of a character snapshot
    pub fn recompute(&mut self, character: &Character) -> Recomputation {
        self.cache.begin_cycle();

        let orphans: Vec<TraitId> = character
            .orphaned_traits()
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        if !orphans.is_empty() {
            tracing::debug!(
                character = %character.id,
                count = orphans.len(),
                "orphaned traits ignored for this cycle"
            );
        }

        let mut stats = DerivedStats::default();
        let mut ctx = StageContext {
            character,
            rules: &self.rules,
            skills: &self.skills,
            traits: character.active_traits(),
            stage: Stage::Traits,
            cache: &mut self.cache,
        };

        for stage in Stage::all() {
            ctx.stage = *stage;
            tracing::debug!(character = %character.id, stage = stage.name(), "running stage");
            match stage {
                Stage::Traits => traits::run(&mut ctx, &mut stats),
                Stage::Abilities => abilities::run(&mut ctx, &mut stats),
                Stage::Skills => skills::run(&mut ctx, &mut stats),
                Stage::Shields => defenses::run_shields(&mut ctx, &mut stats),
                Stage::Defenses => defenses::run(&mut ctx, &mut stats),
                Stage::Health => health::run(&mut ctx, &mut stats),
                Stage::Offense => offense::run(&mut ctx, &mut stats),
                Stage::Attacks => {
                    stats.attacks = combat::attacks_for(character, &stats, ctx.rules);
                }
            }
        }

        Recomputation { stats, orphans }
    }
}

/// Everything a stage may read, plus the memoised aggregator
pub(crate) struct StageContext<'a> {
    pub character: &'a Character,
    pub rules: &'a RulesConfig,
    pub skills: &'a [SkillDefinition],
    pub traits: Vec<&'a Trait>,
    pub stage: Stage,
    cache: &'a mut ComputationCache,
}

impl<'a> StageContext<'a> {
    /// Memoised reduction over the active traits
    pub fn query(
        &mut self,
        stats: &DerivedStats,
        key: &str,
        mode: ReduceMode,
        filter: &ContributionFilter,
    ) -> Result<Reduced, ResolveError> {
        let cache_key = CacheKey {
            character: self.character.id.clone(),
            stage: self.stage,
            query: Query::new(key, mode, filter, &stats.variables),
        };
        let traits = &self.traits;
        self.cache.get_or_compute(cache_key, || {
            Aggregator::new(traits.clone(), stats).reduce(key, mode, filter)
        })
    }

    /// SUM, falling back to 0 with a warning when a value cannot be resolved
    pub fn sum(&mut self, stats: &mut DerivedStats, key: &str, filter: &ContributionFilter) -> i32 {
        self.number(stats, key, ReduceMode::Sum, filter)
    }

    /// MAX, falling back to 0 with a warning when a value cannot be resolved
    pub fn max(&mut self, stats: &mut DerivedStats, key: &str, filter: &ContributionFilter) -> i32 {
        self.number(stats, key, ReduceMode::Max, filter)
    }

    fn number(
        &mut self,
        stats: &mut DerivedStats,
        key: &str,
        mode: ReduceMode,
        filter: &ContributionFilter,
    ) -> i32 {
        match self.query(stats, key, mode, filter) {
            Ok(reduced) => reduced.as_number().unwrap_or(0),
            Err(e) => {
                stats.warn(format!("{} ({}): {}; using 0", key, self.stage.name(), e));
                0
            }
        }
    }

    pub fn any(&mut self, stats: &DerivedStats, key: &str, filter: &ContributionFilter) -> bool {
        self.query(stats, key, ReduceMode::Or, filter)
            .ok()
            .and_then(|r| r.as_bool())
            .unwrap_or(false)
    }

    pub fn strings(&mut self, stats: &DerivedStats, key: &str, filter: &ContributionFilter) -> Vec<String> {
        match self.query(stats, key, ReduceMode::ValuesToLowercase, filter) {
            Ok(Reduced::Strings(values)) => values,
            _ => Vec::new(),
        }
    }

    pub fn first_text(&mut self, stats: &DerivedStats, key: &str, filter: &ContributionFilter) -> Option<String> {
        match self.query(stats, key, ReduceMode::First, filter) {
            Ok(Reduced::Value(Some(value))) if !value.is_null() => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn summary(&mut self, stats: &DerivedStats, key: &str, filter: &ContributionFilter) -> String {
        match self.query(stats, key, ReduceMode::Summary, filter) {
            Ok(Reduced::Summary(text)) => text,
            _ => String::new(),
        }
    }

    /// Raw values (for multiplier lists)
    pub fn values(
        &mut self,
        stats: &DerivedStats,
        key: &str,
        filter: &ContributionFilter,
    ) -> Vec<crate::value::AttributeValue> {
        match self.query(stats, key, ReduceMode::Values, filter) {
            Ok(Reduced::Values(values)) => values,
            _ => Vec::new(),
        }
    }

    /// Equipped armor, if any
    pub fn worn_armor(&self) -> Option<&'a Trait> {
        self.traits.iter().copied().find(|t| t.armor.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Contribution;
    use crate::types::TraitKind;

    fn soldier() -> Character {
        let mut c = Character::new("pc", "Soldier");
        for i in 0..4 {
            c = c.with_trait(
                Trait::new(format!("lvl{}", i), "Soldier", TraitKind::Class).with_contributions(vec![
                    Contribution::new("baseAttackBonus", 1),
                    Contribution::new("hitPoints", 6),
                ]),
            );
        }
        c
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<&str> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["traits", "abilities", "skills", "shields", "defenses", "health", "offense", "attacks"]
        );
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut engine = Engine::default();
        let c = soldier();
        let first = engine.recompute(&c);
        let second = engine.recompute(&c);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.stats).unwrap(),
            serde_json::to_string(&second.stats).unwrap()
        );
    }

    #[test]
    fn test_cache_cleared_between_cycles() {
        let mut engine = Engine::default();
        let c = soldier();
        engine.recompute(&c);
        let after_first = engine.cache().len();

        // Changing the trait set must not reuse old entries
        let c = c.with_trait(
            Trait::new("t", "Toughness", TraitKind::Feat)
                .with_contribution(Contribution::new("hitPointBonus", 4)),
        );
        let out = engine.recompute(&c);
        assert_eq!(out.stats.health.max, 6 * 4 + 4);
        assert!(engine.cache().len() >= after_first);
    }

    #[test]
    fn test_bad_field_does_not_abort() {
        let mut engine = Engine::default();
        let c = soldier().with_trait(
            Trait::new("bad", "Corrupted Trait", TraitKind::Trait)
                .with_contribution(Contribution::new("strengthBonus", "lots")),
        );
        let out = engine.recompute(&c);
        assert_eq!(out.stats.abilities[&crate::types::Ability::Strength].total, 10);
        assert_eq!(out.stats.offense.base_attack_bonus, 4);
        assert_eq!(out.stats.warnings.len(), 1);
        assert!(out.stats.warnings[0].contains("strengthBonus"));
    }
}
