//! Skills stage - per-skill totals and trainable slots

use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::{DerivedStats, SkillAllocation, SkillEntry};
use crate::config::SkillFocusCalculation;
use crate::types::{Ability, TraitKind};
use std::cmp::Ordering;

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let all = ContributionFilter::all();
    let physical_penalty = armor_check_penalty(ctx, stats) + encumbrance_penalty(ctx, stats);
    let focus_bonus = focus_bonus(ctx, stats);
    let general_bonus = ctx.sum(stats, "skillBonus", &all);

    let mut focused = ctx.strings(stats, "skillFocus", &all);
    for feat in &stats.feats {
        if let Some(skill) = feat
            .strip_prefix("skill focus")
            .map(str::trim)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            focused.push(skill.trim().to_string());
        }
    }

    let skills = ctx.skills;
    for skill in skills {
        let key = skill.key();
        let bonus_key = skill.bonus_key();
        let trained = ctx.character.is_trained(&key);
        let focus = focused.iter().any(|f| *f == key);

        let specific = ctx.sum(stats, &bonus_key, &all);
        let mut value = stats.half_level()
            + stats.modifier(skill.ability)
            + specific
            + general_bonus
            + stats.condition_penalty;
        if trained {
            value += ctx.rules.skills.trained_bonus;
        }
        if focus {
            value += focus_bonus;
        }
        if skill.physical {
            value += physical_penalty;
        }

        let tip = ctx.summary(stats, &bonus_key, &all);
        stats.skills.insert(
            key,
            SkillEntry {
                label: skill.name.clone(),
                ability: skill.ability,
                trained,
                focus,
                value,
                tip,
            },
        );
    }

    // === Trainable slots ===
    let class_filter = ContributionFilter::all().only(&[TraitKind::Class]);
    let class_base = match ctx.max(stats, "classTrainedSkills", &class_filter) {
        0 => ctx.rules.skills.default_trained_skills,
        n => n,
    };
    let extra = ctx.sum(stats, "trainedSkills", &all);
    stats.trainable_skills = (class_base + stats.modifier(Ability::Intelligence)).max(1) + extra;

    let trained_count = ctx.character.trained_skills.len() as i32;
    stats.skill_allocation = match trained_count.cmp(&stats.trainable_skills) {
        Ordering::Less => SkillAllocation::Under,
        Ordering::Equal => SkillAllocation::Exact,
        Ordering::Greater => SkillAllocation::Over,
    };
}

/// Penalty for wearing armor without the matching proficiency
pub(crate) fn armor_check_penalty(ctx: &StageContext<'_>, stats: &DerivedStats) -> i32 {
    match ctx.worn_armor().and_then(|t| t.armor.as_ref()) {
        Some(armor) if !stats.proficiencies.covers_armor(armor.category.proficiency_name()) => {
            armor.category.check_penalty()
        }
        _ => 0,
    }
}

/// Heavy-load penalty, only when carried weight is tracked
fn encumbrance_penalty(ctx: &StageContext<'_>, stats: &DerivedStats) -> i32 {
    if !ctx.rules.house_rules.encumbrance_by_weight {
        return 0;
    }
    let strength = stats
        .ability(Ability::Strength)
        .map_or_else(|| ctx.character.base_ability(Ability::Strength).unwrap_or(0), |a| a.total);
    let capacity = (strength * strength) as f64 * ctx.rules.encumbrance.capacity_factor;
    let carried: f64 = ctx
        .character
        .owned_traits()
        .iter()
        .filter(|t| t.kind.is_gear())
        .map(|t| t.weight)
        .sum();
    if carried > capacity {
        ctx.rules.encumbrance.heavy_load_penalty
    } else {
        0
    }
}

fn focus_bonus(ctx: &StageContext<'_>, stats: &DerivedStats) -> i32 {
    match ctx.rules.house_rules.skill_focus_calculation {
        SkillFocusCalculation::Default => ctx.rules.skills.skill_focus_bonus,
        SkillFocusCalculation::HalfLevelRoundUp => (stats.level + 1).div_euclid(2),
        SkillFocusCalculation::HalfLevelRoundDown => stats.level.div_euclid(2),
    }
}

#[cfg(test)]
mod tests {
    use crate::attribute::Contribution;
    use crate::character::{ArmorProfile, Character, SkillAllocation, Trait};
    use crate::config::{default_skills, RulesConfig, SkillFocusCalculation};
    use crate::pipeline::Engine;
    use crate::types::{Ability, ArmorCategory, TraitKind};

    fn scout(levels: usize) -> Character {
        let mut c = Character::new("c", "Scout").with_ability(Ability::Dexterity, 14);
        for i in 0..levels {
            c = c.with_trait(
                Trait::new(format!("l{}", i), "Scout", TraitKind::Class)
                    .with_contribution(Contribution::new("classTrainedSkills", 5)),
            );
        }
        c
    }

    #[test]
    fn test_skill_total() {
        let c = scout(4)
            .train("stealth")
            .with_trait(
                Trait::new("t", "Shadow Striker", TraitKind::Talent)
                    .with_contribution(Contribution::new("stealthSkillBonus", 2).situational()),
            );
        let stats = Engine::default().recompute(&c).stats;
        let stealth = stats.skill("Stealth").unwrap();
        // 2 (half level) + 2 (dex) + 5 (trained) + 2 (talent)
        assert_eq!(stealth.value, 11);
        assert!(stealth.trained);
        assert_eq!(stealth.tip, "Shadow Striker: 2");

        let perception = stats.skill("perception").unwrap();
        assert_eq!(perception.value, 2);
    }

    #[test]
    fn test_skill_focus_variants() {
        let c = scout(6).with_trait(Trait::new("f", "Skill Focus (Perception)", TraitKind::Feat));
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.skill("perception").unwrap().value, 3 + 5);
        assert!(stats.skill("perception").unwrap().focus);

        let mut rules = RulesConfig::default();
        rules.house_rules.skill_focus_calculation = SkillFocusCalculation::HalfLevelRoundUp;
        let c = scout(5).with_trait(Trait::new("f", "Skill Focus (Perception)", TraitKind::Feat));
        let stats = Engine::new(rules, default_skills()).recompute(&c).stats;
        assert_eq!(stats.skill("perception").unwrap().value, 2 + 3);
    }

    #[test]
    fn test_armor_check_penalty_on_physical_skills() {
        let armor = Trait::new("a", "Battle Armor", TraitKind::Armor)
            .with_armor(ArmorProfile {
                category: ArmorCategory::Medium,
                reflex_bonus: 6,
                fortitude_bonus: 2,
                max_dex_bonus: Some(2),
            })
            .equip();
        let c = scout(2).with_trait(armor);
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.skill("acrobatics").unwrap().value, 1 + 2 - 5);
        assert_eq!(stats.skill("perception").unwrap().value, 1);
    }

    #[test]
    fn test_encumbrance_setting() {
        let crate_of_parts = Trait::new("g", "Spare Parts", TraitKind::Equipment).with_weight(80.0);
        let c = scout(2).with_trait(crate_of_parts);
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.skill("climb").unwrap().value, 1);

        let mut rules = RulesConfig::default();
        rules.house_rules.encumbrance_by_weight = true;
        let stats = Engine::new(rules, default_skills()).recompute(&c).stats;
        // Strength 10 carries 50 kg before the heavy load
        assert_eq!(stats.skill("climb").unwrap().value, 1 - 10);
    }

    #[test]
    fn test_trainable_slots() {
        let c = scout(1).with_ability(Ability::Intelligence, 12);
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.trainable_skills, 6);
        assert_eq!(stats.skill_allocation, SkillAllocation::Under);

        // No class count: configured default, never below one
        let c = Character::new("c", "Dim").with_ability(Ability::Intelligence, 3);
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.trainable_skills, 1);

        let c = Character::new("c", "Human")
            .with_trait(
                Trait::new("h", "Human", TraitKind::Species)
                    .with_contribution(Contribution::new("trainedSkills", 1)),
            )
            .train("perception")
            .train("stealth")
            .train("pilot")
            .train("mechanics")
            .train("endurance");
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.trainable_skills, 4);
        assert_eq!(stats.skill_allocation, SkillAllocation::Over);
    }
}
