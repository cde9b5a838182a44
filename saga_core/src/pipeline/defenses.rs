//! Shields and defenses stages

use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::{ArmorProfile, Defense, DerivedStats};
use crate::types::{Ability, TraitKind};
use crate::value::{resolve_int, AttributeValue};

const ARMORED_DEFENSE: &str = "armored defense";
const IMPROVED_ARMORED_DEFENSE: &str = "improved armored defense";

pub(crate) fn run_shields(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let all = ContributionFilter::all();
    let rating = ctx.max(stats, "shieldRating", &all);
    let bonus = ctx.sum(stats, "shieldRatingBonus", &all);

    let max = (rating + bonus).max(0);
    stats.shields.max = max;
    stats.shields.current = ctx.character.current_shields.unwrap_or(max).clamp(0, max);
    stats.shields.active = ctx.character.shields_active && max > 0;
}

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let armor = ctx.worn_armor().and_then(|t| t.armor.as_ref());
    let heroic = stats.heroic_level;

    // === Reflex ===
    let mut reflex = defense(ctx, stats, "reflex");
    reflex.level_or_armor = match armor {
        Some(armor) => reflex_armor_bonus(stats, armor, heroic),
        None => heroic,
    };
    let dex = stats.modifier(Ability::Dexterity);
    reflex.ability = match armor.and_then(|a| a.max_dex_bonus) {
        Some(cap) => dex.min(cap),
        None => dex,
    };
    reflex.size = stats.size.reflex_modifier();
    reflex.compute_total();

    let mut flat_footed = reflex.clone();
    flat_footed.ability = flat_footed.ability.min(0);
    flat_footed.compute_total();

    // === Fortitude ===
    let mut fortitude = defense(ctx, stats, "fortitude");
    fortitude.level_or_armor = heroic;
    fortitude.ability = if stats.is_droid {
        stats.modifier(Ability::Strength)
    } else {
        stats.modifier(Ability::Constitution)
    };
    fortitude.misc += armor.map_or(0, |a| a.fortitude_bonus);
    fortitude.compute_total();

    // === Will ===
    let mut will = defense(ctx, stats, "will");
    will.level_or_armor = heroic;
    will.ability = stats.modifier(Ability::Wisdom);
    will.compute_total();

    stats.defenses.damage_threshold = damage_threshold(ctx, stats, fortitude.total);
    stats.defenses.fortitude = fortitude;
    stats.defenses.reflex = reflex;
    stats.defenses.flat_footed = flat_footed;
    stats.defenses.will = will;

    stats.publish("fortDef", stats.defenses.fortitude.total);
    stats.publish("refDef", stats.defenses.reflex.total);
    stats.publish("willDef", stats.defenses.will.total);
    stats.publish("flatFooted", stats.defenses.flat_footed.total);
    stats.publish("damageThreshold", stats.defenses.damage_threshold);
}

/// Shared components: base, class bonus, misc bonus, condition
fn defense(ctx: &mut StageContext<'_>, stats: &mut DerivedStats, name: &str) -> Defense {
    let class_filter = ContributionFilter::all().only(&[TraitKind::Class]);
    let misc_filter = ContributionFilter::all().without_situational();
    let misc_key = format!("{}DefenseBonus", name);

    Defense {
        base: 10,
        class_bonus: ctx.max(stats, &format!("{}DefenseClassBonus", name), &class_filter),
        misc: ctx.sum(stats, &misc_key, &misc_filter),
        condition: stats.condition_penalty,
        tip: ctx.summary(stats, &misc_key, &ContributionFilter::all()),
        ..Defense::default()
    }
}

fn has_talent_or_feat(stats: &DerivedStats, name: &str) -> bool {
    stats.talents.contains(name) || stats.feats.contains(name)
}

fn reflex_armor_bonus(stats: &DerivedStats, armor: &ArmorProfile, heroic: i32) -> i32 {
    if has_talent_or_feat(stats, IMPROVED_ARMORED_DEFENSE) {
        (heroic + armor.reflex_bonus.div_euclid(2)).max(armor.reflex_bonus)
    } else if has_talent_or_feat(stats, ARMORED_DEFENSE) {
        heroic.max(armor.reflex_bonus)
    } else {
        armor.reflex_bonus
    }
}

fn damage_threshold(ctx: &mut StageContext<'_>, stats: &mut DerivedStats, fortitude: i32) -> i32 {
    let all = ContributionFilter::all();
    let base = fortitude
        + stats.size.damage_threshold_modifier()
        + ctx.sum(stats, "damageThresholdBonus", &all);

    let multipliers = ctx.values(stats, "damageThresholdHardenedMultiplier", &all);
    if multipliers.is_empty() {
        return base;
    }
    let mut tokens = vec![AttributeValue::from(base)];
    tokens.extend(multipliers.into_iter().map(as_multiplier));
    match resolve_int(&tokens, &*stats) {
        Ok(n) => n,
        Err(e) => {
            stats.warn(format!("damageThresholdHardenedMultiplier: {}; ignoring", e));
            base
        }
    }
}

/// Bare numbers in a multiplier list mean `*n`
pub(crate) fn as_multiplier(value: AttributeValue) -> AttributeValue {
    match value {
        AttributeValue::Number(n) => AttributeValue::Text(format!("*{}", n)),
        AttributeValue::Text(text) if !text.trim_start().starts_with('*') => {
            AttributeValue::Text(format!("*{}", text.trim()))
        }
        other => other,
    }
}
