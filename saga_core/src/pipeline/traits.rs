//! Traits stage - levels, species, size, feats and proficiencies

use super::StageContext;
use crate::attribute::ContributionFilter;
use crate::character::DerivedStats;
use crate::types::{Size, TraitKind};
use std::collections::BTreeMap;

const POINT_BLANK_SHOT: &str = "point-blank shot";
const PRECISE_SHOT: &str = "precise shot";

pub(crate) fn run(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) {
    let all = ContributionFilter::all();

    // === Levels ===
    for t in ctx.traits.iter().filter(|t| t.kind == TraitKind::Class) {
        *stats.classes.entry(t.name.clone()).or_insert(0) += 1;
    }
    stats.level = stats.classes.values().sum();
    let nonheroic = ctx
        .traits
        .iter()
        .filter(|t| t.kind == TraitKind::Class)
        .filter(|t| {
            t.contributions
                .iter()
                .any(|c| c.key == "isNonheroic" && c.value.is_truthy())
        })
        .count() as i32;
    stats.heroic_level = stats.level - nonheroic;

    stats.species = ctx
        .traits
        .iter()
        .find(|t| t.kind == TraitKind::Species)
        .map(|t| t.name.clone());

    stats.is_droid = ctx.any(stats, "isDroid", &all);
    stats.size = resolve_size(ctx, stats);

    // === Condition track ===
    let step = ctx.character.condition.min(5);
    stats.condition_penalty = ctx.rules.condition_penalty(step);
    stats.helpless = step >= 5;

    // === Feats & talents ===
    for t in &ctx.traits {
        let name = t.name.trim().to_lowercase();
        match t.kind {
            TraitKind::Feat => {
                stats.feats.insert(name);
            }
            TraitKind::Talent => {
                stats.talents.insert(name);
            }
            _ => {}
        }
    }
    if ctx.rules.house_rules.merge_point_blank_and_precise_shot
        && stats.feats.contains(POINT_BLANK_SHOT)
    {
        stats.feats.insert(PRECISE_SHOT.to_string());
    }

    // === Proficiencies ===
    let weapons = ctx.strings(stats, "weaponProficiency", &all);
    let armor = ctx.strings(stats, "armorProficiency", &all);
    let focus = ctx.strings(stats, "weaponFocus", &all);
    stats.proficiencies.weapons.extend(weapons);
    stats.proficiencies.armor.extend(armor);
    stats.proficiencies.weapon_focus.extend(focus);

    let feats: Vec<String> = stats.feats.iter().cloned().collect();
    for feat in &feats {
        if let Some(category) = parenthesised(feat, "weapon proficiency") {
            stats.proficiencies.weapons.insert(category);
        } else if let Some(category) = parenthesised(feat, "armor proficiency") {
            stats.proficiencies.armor.insert(category);
        } else if let Some(category) = parenthesised(feat, "weapon focus") {
            stats.proficiencies.weapon_focus.insert(category);
        }
    }

    // === Available slots ===
    stats.available_items = available_items(ctx, stats);

    stats.publish("charLevel", stats.level);
    stats.publish("halfCharLevel", stats.half_level());
    stats.publish("heroicLevel", stats.heroic_level);
}

fn resolve_size(ctx: &mut StageContext<'_>, stats: &DerivedStats) -> Size {
    if let Some(size) = ctx
        .first_text(stats, "size", &ContributionFilter::all())
        .and_then(|s| Size::parse(&s))
    {
        return size;
    }
    ctx.character
        .owned_traits()
        .iter()
        .find_map(|t| Size::parse(&t.name))
        .unwrap_or_default()
}

/// "weapon proficiency (pistols)" => "pistols"
fn parenthesised(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?.trim();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.trim().to_string())
}

/// Slot counts from `provides` ("General Feats", "Force Powers:2"), less
/// the traits taken against each slot
fn available_items(ctx: &mut StageContext<'_>, stats: &mut DerivedStats) -> BTreeMap<String, i32> {
    let mut slots: BTreeMap<String, i32> = BTreeMap::new();
    let provided = ctx.values(stats, "provides", &ContributionFilter::all());
    for value in provided {
        if value.is_null() {
            continue;
        }
        let text = value.to_string();
        let (name, count) = match text.rsplit_once(':') {
            Some((name, count)) => match count.trim().parse::<i32>() {
                Ok(n) => (name.trim().to_string(), n),
                Err(_) => {
                    stats.warn(format!("provides: bad count in '{}'; using 1", text));
                    (name.trim().to_string(), 1)
                }
            },
            None => (text.trim().to_string(), 1),
        };
        *slots.entry(name).or_insert(0) += count;
    }

    for t in ctx.character.owned_traits() {
        if t.is_supplied {
            continue;
        }
        if let Some(slot) = &t.slot {
            *slots.entry(slot.clone()).or_insert(0) -= 1;
        }
    }
    slots
}
