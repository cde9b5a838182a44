//! Abilities stage

use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::{AbilityScore, DerivedStats};
use crate::types::Ability;

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let filter = ContributionFilter::all().without_situational();

    for ability in Ability::all().iter().copied() {
        let key = ability.bonus_key();
        let base = match ctx.character.base_ability(ability) {
            Ok(base) => base,
            Err(e) => {
                stats.warn(format!("{} base score: {}; using 0", ability, e));
                0
            }
        };
        let bonus = ctx.sum(stats, &key, &filter);

        let mut score = AbilityScore::from_total(base, bonus, stats.condition_penalty);
        score.tip = tooltip(base, &ctx.summary(stats, &key, &filter));

        if ability == Ability::Constitution && stats.is_droid {
            score.skip = true;
            score.modifier = 0;
            score.roll = 0;
        }

        let name = format!("{}MOD", ability.abbreviation().to_uppercase());
        stats.publish(&name, score.modifier);
        stats.abilities.insert(ability, score);
    }
}

fn tooltip(base: i32, sources: &str) -> String {
    if sources.is_empty() {
        format!("Base: {}", base)
    } else {
        format!("Base: {}, {}", base, sources)
    }
}

#[cfg(test)]
mod tests {
    use crate::attribute::Contribution;
    use crate::character::{Character, Trait};
    use crate::pipeline::Engine;
    use crate::types::{Ability, TraitKind};

    #[test]
    fn test_bonus_sources_sum() {
        let c = Character::new("c", "Test")
            .with_ability(Ability::Strength, 13)
            .with_trait(
                Trait::new("s", "Wookiee", TraitKind::Species)
                    .with_contribution(Contribution::new("strengthBonus", 4)),
            )
            .with_trait(
                Trait::new("a", "Old", TraitKind::Trait)
                    .with_contribution(Contribution::new("strengthBonus", -1)),
            );
        let stats = Engine::default().recompute(&c).stats;
        let str_score = &stats.abilities[&Ability::Strength];
        assert_eq!(str_score.total, 16);
        assert_eq!(str_score.modifier, 3);
        assert_eq!(str_score.tip, "Base: 13, Wookiee: 4, Old: -1");
        assert_eq!(stats.variables["@STRMOD"], 3);
    }

    #[test]
    fn test_odd_total_floors() {
        let c = Character::new("c", "Test").with_ability(Ability::Dexterity, 7);
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.abilities[&Ability::Dexterity].modifier, -2);
    }

    #[test]
    fn test_roll_applies_condition() {
        let mut c = Character::new("c", "Test").with_ability(Ability::Wisdom, 14);
        c.condition = 2;
        let stats = Engine::default().recompute(&c).stats;
        let wis = &stats.abilities[&Ability::Wisdom];
        assert_eq!(wis.modifier, 2);
        assert_eq!(wis.roll, 0);
    }

    #[test]
    fn test_situational_bonus_excluded() {
        let c = Character::new("c", "Test").with_trait(
            Trait::new("r", "Rage", TraitKind::Talent)
                .with_contribution(Contribution::new("strengthBonus", 4).situational()),
        );
        let stats = Engine::default().recompute(&c).stats;
        assert_eq!(stats.abilities[&Ability::Strength].total, 10);
    }

    #[test]
    fn test_droid_has_no_constitution() {
        let c = Character::new("c", "R2")
            .with_ability(Ability::Constitution, 16)
            .with_trait(
                Trait::new("d", "Astromech Droid", TraitKind::Species)
                    .with_contribution(Contribution::new("isDroid", true)),
            );
        let stats = Engine::default().recompute(&c).stats;
        let con = &stats.abilities[&Ability::Constitution];
        assert!(con.skip);
        assert_eq!(stats.modifier(Ability::Constitution), 0);
        assert_eq!(stats.variables["@CONMOD"], 0);
    }

    #[test]
    fn test_bad_base_score_only_zeroes_that_ability() {
        let json = r#"{
            "id": "pc-x",
            "abilities": {
                "strength": "abc", "dexterity": 14, "constitution": "12",
                "intelligence": 8, "wisdom": 13, "charisma": 16
            }
        }"#;
        let c: Character = serde_json::from_str(json).unwrap();
        let stats = Engine::default().recompute(&c).stats;

        assert_eq!(stats.abilities[&Ability::Strength].total, 0);
        assert_eq!(stats.modifier(Ability::Dexterity), 2);
        assert_eq!(stats.abilities[&Ability::Constitution].total, 12);
        assert_eq!(stats.modifier(Ability::Intelligence), -1);
        assert_eq!(stats.abilities[&Ability::Wisdom].total, 13);
        assert_eq!(stats.modifier(Ability::Charisma), 3);
        assert_eq!(stats.warnings.len(), 1);
        assert!(stats.warnings[0].contains("abc"));
    }
}
