//! Offense stage - base attack bonus and the three attack totals

use super::skills::armor_check_penalty;
use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::DerivedStats;
use crate::types::{Ability, TraitKind};

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let class_filter = ContributionFilter::all().only(&[TraitKind::Class]);
    let bab = ctx.sum(stats, "baseAttackBonus", &class_filter);
    let shared = stats.condition_penalty + armor_check_penalty(ctx, stats);

    let strength = stats.modifier(Ability::Strength);
    let dexterity = stats.modifier(Ability::Dexterity);

    let offense = &mut stats.offense;
    offense.base_attack_bonus = bab;
    offense.melee_attack_bonus = bab + strength + shared;
    offense.ranged_attack_bonus = bab + dexterity + shared;
    offense.finesse_attack_bonus = bab + dexterity + shared;

    let (mab, rab, fab) = (
        offense.melee_attack_bonus,
        offense.ranged_attack_bonus,
        offense.finesse_attack_bonus,
    );
    stats.publish("bab", bab);
    stats.publish("mab", mab);
    stats.publish("rab", rab);
    stats.publish("fab", fab);
}
