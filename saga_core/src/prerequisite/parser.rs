//! Free-text prerequisite parsing
//!
//! Clauses are normalised, then tried against an ordered rule table; the
//! first rule whose pattern matches and whose handler accepts the captures
//! wins. Anything left over becomes a possession check.

use super::Predicate;
use crate::types::{Ability, Size};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Trailing qualifiers stripped before matching ("Force Training feat")
const QUALIFIERS: [&str; 4] = ["species trait", "force power", "feat", "talent"];

type Handler = fn(&Captures<'_>, &str) -> Option<Predicate>;

struct Rule {
    name: &'static str,
    pattern: Regex,
    handler: Handler,
}

fn rule(name: &'static str, pattern: &str, handler: Handler) -> Rule {
    Rule {
        name,
        pattern: Regex::new(pattern).expect("valid regex"),
        handler,
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(
            "narrative",
            r"(gm|game ?master)('s)? (approval|permission)|dark side score|possess an implant",
            |_, text| Some(Predicate::Narrative(text.to_string())),
        ),
        rule("grouped_or", r"^\((.+)\)\s+or\s+\((.+)\)$", |caps, _| {
            Some(Predicate::Or(vec![parse(&caps[1]), parse(&caps[2])]))
        }),
        rule("trained", r"^trained in (.+)$", |caps, _| trained(&caps[1])),
        rule(
            "appendage",
            r"^(?:(\d+|one|two|three|four|five|six)\s+)?(?:([a-z][a-z-]*)\s+)?(appendages?|locomotion)$",
            |caps, _| {
                let count = caps.get(1).map_or(Some(1), |m| count_word(m.as_str()))?;
                Some(Predicate::Appendage {
                    count,
                    kind: caps.get(2).map(|m| m.as_str().to_string()),
                    locomotion: &caps[3] == "locomotion",
                })
            },
        ),
        rule(
            "size_or_larger",
            r"^(fine|diminutive|tiny|small|medium|large|huge|gargantuan|colossal) or larger$",
            |caps, _| Size::parse(&caps[1]).map(Predicate::SizeOrLarger),
        ),
        rule("or", r"^.+?\s+or\s+.+$", |_, text| {
            Some(Predicate::Or(text.split(" or ").map(parse).collect()))
        }),
        rule(
            "ability",
            r"^(strength|dexterity|constitution|intelligence|wisdom|charisma|str|dex|con|int|wis|cha)\s+(\d+)\+?$",
            |caps, _| {
                Some(Predicate::AbilityThreshold {
                    ability: Ability::parse(&caps[1])?,
                    minimum: caps[2].parse().ok()?,
                })
            },
        ),
        rule("base_attack_bonus", r"^base attack bonus\s*\+?(\d+)$", |caps, _| {
            caps[1].parse().ok().map(Predicate::BaseAttackBonus)
        }),
        rule("character_level", r"^(\d+)(?:st|nd|rd|th)\s+character level$", |caps, _| {
            caps[1].parse().ok().map(Predicate::CharacterLevel)
        }),
        rule("proficient", r"^proficient with (.+)$", |caps, _| {
            Some(Predicate::Proficient(caps[1].trim().to_string()))
        }),
        rule("droid", r"^(?:must be an? )?droid$", |_, _| Some(Predicate::Droid(true))),
        rule(
            "not_droid",
            r"^(?:cannot be an?|can't be an?|not an?|non-?)\s*droid$",
            |_, _| Some(Predicate::Droid(false)),
        ),
    ]
});

/// Lower-case, trim, and drop the trailing period and type qualifier
pub fn normalize(text: &str) -> String {
    let mut text = text.trim().to_lowercase();
    while let Some(stripped) = text.strip_suffix('.') {
        text = stripped.trim_end().to_string();
    }
    for qualifier in QUALIFIERS {
        if let Some(stripped) = text.strip_suffix(qualifier) {
            if stripped.ends_with(' ') {
                text = stripped.trim_end().to_string();
                break;
            }
        }
    }
    text
}

/// Parse a single clause into a predicate
pub fn parse(text: &str) -> Predicate {
    let text = normalize(text);
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&text) {
            if let Some(predicate) = (rule.handler)(&caps, &text) {
                tracing::trace!(rule = rule.name, clause = %text, "prerequisite matched");
                return predicate;
            }
        }
    }
    Predicate::Possession(text)
}

fn trained(skills: &str) -> Option<Predicate> {
    let skills = skills.trim();
    if skills.contains("at least one knowledge skill") {
        return Some(Predicate::AnyKnowledgeSkill);
    }
    let predicate = if skills.contains(" or ") {
        Predicate::Or(skill_list(skills, " or "))
    } else if skills.contains(" and ") || skills.contains(',') {
        Predicate::All(skill_list(skills, " and "))
    } else {
        Predicate::TrainedSkill(skills.to_string())
    };
    Some(predicate)
}

fn skill_list(skills: &str, separator: &str) -> Vec<Predicate> {
    skills
        .split(separator)
        .flat_map(|part| part.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Predicate::TrainedSkill(s.to_string()))
        .collect()
}

fn count_word(word: &str) -> Option<u32> {
    match word {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        digits => digits.parse().ok(),
    }
}
