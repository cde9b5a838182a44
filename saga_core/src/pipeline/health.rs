//! Health stage

use super::defenses::as_multiplier;
use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::DerivedStats;
use crate::types::{Ability, TraitKind};
use crate::value::{resolve_int, AttributeValue};

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let all = ContributionFilter::all();
    let class_filter = ContributionFilter::all().only(&[TraitKind::Class]);

    let rolled = ctx.sum(stats, "hitPoints", &class_filter);
    let bonus = ctx.sum(stats, "hitPointBonus", &all);
    let additive = rolled + stats.level * stats.modifier(Ability::Constitution) + bonus;

    // Multipliers apply after every additive source
    let multipliers = ctx.values(stats, "healthMultiplier", &all);
    let max = if multipliers.is_empty() {
        additive
    } else {
        let mut tokens = vec![AttributeValue::from(additive)];
        tokens.extend(multipliers.into_iter().map(as_multiplier));
        match resolve_int(&tokens, &*stats) {
            Ok(n) => n,
            Err(e) => {
                stats.warn(format!("healthMultiplier: {}; ignoring", e));
                additive
            }
        }
    };

    let max = max.max(0);
    stats.health.max = max;
    stats.health.bonus = bonus;
    stats.health.current = ctx.character.current_health.unwrap_or(max).clamp(0, max);
    stats.health.temporary = ctx.character.temporary_health.max(0);
    stats.health.condition = ctx.character.condition.min(5);
}

#[cfg(test)]
mod tests {
    use crate::attribute::Contribution;
    use crate::character::{Character, Trait};
    use crate::pipeline::Engine;
    use crate::types::{Ability, TraitKind};

    fn jedi(levels: usize) -> Character {
        let mut c = Character::new("c", "Jedi").with_ability(Ability::Constitution, 14);
        for i in 0..levels {
            let hp = if i == 0 { 30 } else { 6 };
            c = c.with_trait(
                Trait::new(format!("l{}", i), "Jedi", TraitKind::Class)
                    .with_contribution(Contribution::new("hitPoints", hp)),
            );
        }
        c
    }

    #[test]
    fn test_max_health() {
        let stats = Engine::default().recompute(&jedi(3)).stats;
        assert_eq!(stats.health.max, 30 + 6 + 6 + 3 * 2);
        assert_eq!(stats.health.current, stats.health.max);
    }

    #[test]
    fn test_hit_points_only_count_from_classes() {
        let c = jedi(1).with_trait(
            Trait::new("f", "Odd Feat", TraitKind::Feat)
                .with_contribution(Contribution::new("hitPoints", 100)),
        );
        assert_eq!(Engine::default().recompute(&c).stats.health.max, 32);
    }

    #[test]
    fn test_multiplier_after_bonuses() {
        let c = jedi(1).with_trait(Trait::new("t", "Colossal Beast", TraitKind::Template).with_contributions(vec![
            Contribution::new("hitPointBonus", 8),
            Contribution::new("healthMultiplier", 2),
        ]));
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.health.max, (30 + 2 + 8) * 2);
        assert_eq!(stats.health.bonus, 8);
    }

    #[test]
    fn test_current_clamped() {
        let mut c = jedi(1);
        c.current_health = Some(500);
        c.temporary_health = 5;
        c.condition = 2;
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.health.current, 32);
        assert_eq!(stats.health.temporary, 5);
        assert_eq!(stats.health.condition, 2);

        c.current_health = Some(-4);
        assert_eq!(Engine::default().recompute(&c).stats.health.current, 0);
    }
}
