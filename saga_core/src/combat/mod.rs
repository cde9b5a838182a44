//! Attack generation - To-hit and damage formulas for every wielded weapon
//!
//! Produces the unarmed strike plus one or more attacks per equipped weapon:
//!
//! - oversized weapons (more than one size step above the wielder) yield nothing
//! - a stun profile adds a stun attack, or replaces the normal one when exclusive
//! - several rates of fire yield one attack per mode
//! - slash-separated damage yields a full-round attack plus one per die

mod attack;
pub mod formula;

pub use attack::{Attack, Handedness};

use crate::character::{Character, DerivedStats, Trait, WeaponProfile};
use crate::config::RulesConfig;
use crate::types::{Ability, CharacterId, RateOfFire, Size};

const LIGHTSABERS: &str = "lightsabers";
const WEAPON_FINESSE: &str = "weapon finesse";
const MARTIAL_ARTS: [&str; 3] = ["martial arts i", "martial arts ii", "martial arts iii"];
/// Multi-attack penalty with Dual Weapon Mastery I, II and III
const DUAL_WEAPON_MASTERY: [(&str, i32); 3] = [
    ("dual weapon mastery iii", 0),
    ("dual weapon mastery ii", -2),
    ("dual weapon mastery i", -5),
];

/// Generate attacks from the character's persisted derived block
pub fn generate_attacks(character: &Character, rules: &RulesConfig) -> Vec<Attack> {
    attacks_for(character, &character.stats, rules)
}

/// Generate attacks against a derived block (possibly still being built)
pub(crate) fn attacks_for(character: &Character, stats: &DerivedStats, rules: &RulesConfig) -> Vec<Attack> {
    let mut list = AttackList::new(character.id.clone());
    unarmed(&mut list, stats, rules);

    for t in character.active_traits() {
        if let Some(weapon) = &t.weapon {
            weapon_attacks(&mut list, t, weapon, stats, rules);
        }
    }
    list.attacks
}

/// Accumulates attacks, handing out sequential ids
struct AttackList {
    actor: CharacterId,
    attacks: Vec<Attack>,
}

impl AttackList {
    fn new(actor: CharacterId) -> Self {
        AttackList {
            actor,
            attacks: Vec::new(),
        }
    }

    fn push(&mut self, name: String, to_hit: i32, damage: Vec<String>, source: Option<&Trait>) -> &mut Attack {
        let id = self.attacks.len() as u32;
        self.attacks.push(Attack {
            id,
            name,
            to_hit: formula::to_hit(to_hit),
            damage,
            source_weapon: source.map(|t| t.id.clone()),
            actor: self.actor.clone(),
            ranged: false,
            stun: false,
            autofire: false,
            full_round: false,
        });
        let last = self.attacks.len() - 1;
        &mut self.attacks[last]
    }
}

fn unarmed(list: &mut AttackList, stats: &DerivedStats, rules: &RulesConfig) {
    let tier = MARTIAL_ARTS.iter().filter(|f| stats.feats.contains(**f)).count();
    let die = unarmed_die(stats.size, tier, &rules.combat.unarmed_dice);

    let offense = &stats.offense;
    let to_hit = if stats.feats.contains(WEAPON_FINESSE) {
        offense.melee_attack_bonus.max(offense.finesse_attack_bonus)
    } else {
        offense.melee_attack_bonus
    };
    let bonus = stats.half_level() + stats.modifier(Ability::Strength);

    list.push(
        "Unarmed Attack".to_string(),
        to_hit,
        vec![formula::damage(&format!("1d{}", die), bonus)],
        None,
    );
}

/// Unarmed damage die: d4 at Medium, one ladder step per size step and per
/// Martial Arts tier, capped at the top of the ladder
pub fn unarmed_die(size: Size, tier: usize, ladder: &[u32]) -> u32 {
    let top = ladder.len().saturating_sub(1) as i32;
    let by_size = (size.steps_above(Size::Medium) + 2).clamp(0, top);
    let index = (by_size + tier as i32).min(top);
    ladder.get(index as usize).copied().unwrap_or(4)
}

fn weapon_attacks(list: &mut AttackList, t: &Trait, weapon: &WeaponProfile, stats: &DerivedStats, rules: &RulesConfig) {
    let steps = weapon.size.steps_above(stats.size);
    if steps > 1 {
        tracing::debug!(weapon = %t.name, size = %weapon.size, "oversized weapon, no attack");
        return;
    }

    let categories = weapon.category_keys();
    let proficiencies = &stats.proficiencies;
    let proficient = categories.iter().all(|c| proficiencies.covers_weapon(c));
    let focused = categories.iter().any(|c| proficiencies.weapon_focus.contains(c));
    let ranged = categories
        .iter()
        .any(|c| rules.combat.ranged_categories.iter().any(|r| r.eq_ignore_ascii_case(c)));

    let handedness = if weapon.has_category(LIGHTSABERS) && proficiencies.weapon_focus.contains(LIGHTSABERS) {
        Handedness::Light
    } else {
        Handedness::from_steps(steps)
    };

    // === To-hit ===
    let offense = &stats.offense;
    let mut to_hit = if ranged {
        offense.ranged_attack_bonus
    } else if handedness == Handedness::Light && stats.feats.contains(WEAPON_FINESSE) {
        offense.melee_attack_bonus.max(offense.finesse_attack_bonus)
    } else {
        offense.melee_attack_bonus
    };
    if !proficient {
        to_hit += rules.combat.non_proficient_penalty;
    }
    if focused {
        to_hit += 1;
    }

    // === Damage bonus ===
    let strength = if ranged {
        0
    } else {
        stats.modifier(Ability::Strength) * handedness.strength_multiplier()
    };
    let bonus = stats.half_level() + strength;

    let autofire_only = weapon.is_autofire_only();
    let autofire_penalty = rules.combat.autofire_penalty;

    if let Some(stun) = &weapon.stun {
        let dice = stun.damage.as_deref().unwrap_or(&weapon.damage);
        let stun_hit = if autofire_only { to_hit + autofire_penalty } else { to_hit };
        let attack = list.push(
            format!("{} (Stun)", t.name),
            stun_hit,
            formula::damage_each(dice, bonus),
            Some(t),
        );
        attack.ranged = ranged;
        attack.stun = true;
        attack.autofire = autofire_only;
        if stun.exclusive {
            return;
        }
    }

    let dice = formula::split_dice(&weapon.damage);
    if weapon.rates_of_fire.len() > 1 {
        for mode in &weapon.rates_of_fire {
            let autofire = *mode == RateOfFire::Autofire;
            let hit = if autofire { to_hit + autofire_penalty } else { to_hit };
            let attack = list.push(
                format!("{} ({})", t.name, mode.label()),
                hit,
                formula::damage_each(&weapon.damage, bonus),
                Some(t),
            );
            attack.ranged = ranged;
            attack.autofire = autofire;
        }
    } else if dice.len() > 1 && weapon.rates_of_fire.is_empty() {
        let penalty = multi_attack_penalty(stats, proficient, rules);
        let attack = list.push(
            format!("{} (Full Round)", t.name),
            to_hit + penalty,
            dice.iter().map(|d| formula::damage(d, bonus)).collect(),
            Some(t),
        );
        attack.ranged = ranged;
        attack.full_round = true;
        for (i, die) in dice.iter().enumerate() {
            let attack = list.push(
                format!("{} ({})", t.name, i + 1),
                to_hit,
                vec![formula::damage(die, bonus)],
                Some(t),
            );
            attack.ranged = ranged;
        }
    } else {
        let hit = if autofire_only { to_hit + autofire_penalty } else { to_hit };
        let attack = list.push(
            t.name.clone(),
            hit,
            formula::damage_each(&weapon.damage, bonus),
            Some(t),
        );
        attack.ranged = ranged;
        attack.autofire = autofire_only;
    }
}

fn multi_attack_penalty(stats: &DerivedStats, proficient: bool, rules: &RulesConfig) -> i32 {
    let base = rules.combat.multi_attack_penalty;
    if !proficient {
        return base;
    }
    DUAL_WEAPON_MASTERY
        .iter()
        .find(|(feat, _)| stats.feats.contains(*feat))
        .map_or(base, |(_, penalty)| *penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Contribution;
    use crate::character::StunProfile;
    use crate::pipeline::Engine;
    use crate::types::{Ability, TraitKind};

    /// Level 4, melee attack total 3, STR +2
    fn trooper() -> Character {
        let mut c = Character::new("pc", "Trooper").with_ability(Ability::Strength, 14);
        for i in 0..4 {
            let mut class = Trait::new(format!("l{}", i), "Soldier", TraitKind::Class);
            if i == 0 {
                class = class.with_contributions(vec![
                    Contribution::new("baseAttackBonus", 1),
                    Contribution::new("weaponProficiency", "Simple Melee Weapons"),
                    Contribution::new("weaponProficiency", "Pistols"),
                ]);
            }
            c = c.with_trait(class);
        }
        c
    }

    fn weapon(id: &str, name: &str, profile: WeaponProfile) -> Trait {
        Trait::new(id, name, TraitKind::Weapon).with_weapon(profile).equip()
    }

    fn attacks(c: &Character) -> Vec<Attack> {
        Engine::default().recompute(c).stats.attacks
    }

    #[test]
    fn test_stun_baton() {
        let baton = weapon(
            "baton",
            "Stun Baton",
            WeaponProfile::new("1d6", Size::Medium)
                .with_category("Simple Melee Weapons")
                .with_stun(StunProfile {
                    damage: Some("2d6".to_string()),
                    exclusive: false,
                }),
        );
        let c = trooper().with_trait(baton);
        let list = attacks(&c);

        let stun = list.iter().find(|a| a.stun).unwrap();
        assert_eq!(stun.to_hit, "1d20+3");
        assert_eq!(stun.damage, vec!["2d6+4"]);
        assert!(!stun.ranged);

        let normal = list.iter().find(|a| a.name == "Stun Baton").unwrap();
        assert_eq!(normal.to_hit, "1d20+3");
        assert_eq!(normal.damage, vec!["1d6+4"]);
    }

    #[test]
    fn test_exclusive_stun_suppresses_normal() {
        let pistol = weapon(
            "p",
            "Stun Pistol",
            WeaponProfile::new("3d6", Size::Small)
                .with_category("Pistols")
                .with_stun(StunProfile {
                    damage: None,
                    exclusive: true,
                }),
        );
        let list = attacks(&trooper().with_trait(pistol));
        let from_pistol: Vec<&Attack> = list.iter().filter(|a| a.source_weapon.is_some()).collect();
        assert_eq!(from_pistol.len(), 1);
        assert!(from_pistol[0].stun);
        assert!(from_pistol[0].ranged);
        // Ranged: no strength on damage
        assert_eq!(from_pistol[0].damage, vec!["3d6+2"]);
    }

    #[test]
    fn test_oversized_weapon_has_no_attacks() {
        let cannon = weapon(
            "c",
            "E-Web Repeating Blaster",
            WeaponProfile::new("3d12", Size::Huge).with_category("Heavy Weapons"),
        );
        let list = attacks(&trooper().with_trait(cannon));
        assert!(list.iter().all(|a| a.source_weapon.is_none()));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_non_proficient_and_two_handed() {
        let staff = weapon(
            "s",
            "Quarterstaff",
            WeaponProfile::new("1d6", Size::Large).with_category("Advanced Melee Weapons"),
        );
        let list = attacks(&trooper().with_trait(staff));
        let a = list.iter().find(|a| a.name == "Quarterstaff").unwrap();
        assert_eq!(a.to_hit, "1d20-2");
        assert_eq!(a.damage, vec!["1d6+6"]);
    }

    #[test]
    fn test_rates_of_fire() {
        let rifle = weapon(
            "r",
            "Blaster Carbine",
            WeaponProfile::new("3d8", Size::Medium)
                .with_category("Pistols")
                .with_rates_of_fire(&[RateOfFire::Single, RateOfFire::Autofire]),
        );
        let list = attacks(&trooper().with_trait(rifle));
        let single = list.iter().find(|a| a.name == "Blaster Carbine (Single-Shot)").unwrap();
        let auto = list.iter().find(|a| a.name == "Blaster Carbine (Autofire)").unwrap();
        // Ranged bonus: BAB 1 + DEX 0
        assert_eq!(single.to_hit, "1d20+1");
        assert_eq!(auto.to_hit, "1d20-4");
        assert!(auto.autofire);
    }

    #[test]
    fn test_autofire_only_penalises_every_attack() {
        let blaster = weapon(
            "h",
            "Hold-Out Repeater",
            WeaponProfile::new("3d6", Size::Small)
                .with_category("Pistols")
                .with_rates_of_fire(&[RateOfFire::Autofire])
                .with_stun(StunProfile {
                    damage: None,
                    exclusive: false,
                }),
        );
        let list = attacks(&trooper().with_trait(blaster));

        let stun = list.iter().find(|a| a.stun).unwrap();
        assert_eq!(stun.to_hit, "1d20-4");
        assert!(stun.autofire);

        let normal = list.iter().find(|a| a.name == "Hold-Out Repeater").unwrap();
        assert_eq!(normal.to_hit, "1d20-4");
        assert!(normal.autofire);
        assert_eq!(normal.damage, vec!["3d6+2"]);
    }

    #[test]
    fn test_double_dice_split_outside_full_round() {
        let staff = weapon(
            "st",
            "Double Stun Staff",
            WeaponProfile::new("2d6/2d6", Size::Medium)
                .with_category("Simple Melee Weapons")
                .with_stun(StunProfile {
                    damage: None,
                    exclusive: false,
                }),
        );
        let list = attacks(&trooper().with_trait(staff));
        let stun = list.iter().find(|a| a.stun).unwrap();
        assert_eq!(stun.to_hit, "1d20+3");
        assert_eq!(stun.damage, vec!["2d6+4", "2d6+4"]);

        let blaster = weapon(
            "db",
            "Double Blaster",
            WeaponProfile::new("2d8/2d8", Size::Small)
                .with_category("Pistols")
                .with_rates_of_fire(&[RateOfFire::Single]),
        );
        let list = attacks(&trooper().with_trait(blaster));
        let shot = list.iter().find(|a| a.name == "Double Blaster").unwrap();
        assert_eq!(shot.damage, vec!["2d8+2", "2d8+2"]);
        assert!(!shot.full_round);
    }

    #[test]
    fn test_double_weapon_full_round() {
        let saber = weapon(
            "d",
            "Double-Bladed Lightsaber",
            WeaponProfile::new("2d8/2d8", Size::Medium).with_category("Lightsabers"),
        );
        let c = trooper()
            .with_trait(saber.clone())
            .with_trait(Trait::new("wp", "Weapon Proficiency (Lightsabers)", TraitKind::Feat));
        let list = attacks(&c);
        let full = list.iter().find(|a| a.full_round).unwrap();
        assert_eq!(full.to_hit, "1d20-7");
        assert_eq!(full.damage, vec!["2d8+4", "2d8+4"]);
        let singles: Vec<&Attack> = list
            .iter()
            .filter(|a| a.source_weapon.is_some() && !a.full_round)
            .collect();
        assert_eq!(singles.len(), 2);
        assert!(singles.iter().all(|a| a.to_hit == "1d20+3"));

        let c = c.with_trait(Trait::new("dwm", "Dual Weapon Mastery II", TraitKind::Feat));
        let full = attacks(&c).into_iter().find(|a| a.full_round).unwrap();
        assert_eq!(full.to_hit, "1d20+1");

        // Mastery only counts when proficient
        let c = trooper()
            .with_trait(saber)
            .with_trait(Trait::new("dwm", "Dual Weapon Mastery III", TraitKind::Feat));
        let full = attacks(&c).into_iter().find(|a| a.full_round).unwrap();
        assert_eq!(full.to_hit, "1d20-12");
    }

    #[test]
    fn test_lightsaber_focus_and_finesse() {
        let saber = weapon(
            "l",
            "Lightsaber",
            WeaponProfile::new("2d8", Size::Medium).with_category("Lightsabers"),
        );
        let c = trooper()
            .with_ability(Ability::Dexterity, 18)
            .with_trait(saber)
            .with_trait(Trait::new("wp", "Weapon Proficiency (Lightsabers)", TraitKind::Feat))
            .with_trait(Trait::new("wf", "Weapon Focus (Lightsabers)", TraitKind::Feat))
            .with_trait(Trait::new("fin", "Weapon Finesse", TraitKind::Feat));
        let list = attacks(&c);
        let a = list.iter().find(|a| a.name == "Lightsaber").unwrap();
        // Finesse (BAB 1 + DEX 4) + focus
        assert_eq!(a.to_hit, "1d20+6");
        // Light: strength once
        assert_eq!(a.damage, vec!["2d8+4"]);
    }

    #[test]
    fn test_unarmed_die_ladder() {
        let ladder = [2, 3, 4, 6, 8, 10, 12];
        assert_eq!(unarmed_die(Size::Medium, 0, &ladder), 4);
        assert_eq!(unarmed_die(Size::Small, 0, &ladder), 3);
        assert_eq!(unarmed_die(Size::Tiny, 0, &ladder), 2);
        assert_eq!(unarmed_die(Size::Fine, 0, &ladder), 2);
        assert_eq!(unarmed_die(Size::Medium, 1, &ladder), 6);
        assert_eq!(unarmed_die(Size::Medium, 3, &ladder), 10);
        assert_eq!(unarmed_die(Size::Large, 3, &ladder), 12);
        assert_eq!(unarmed_die(Size::Colossal, 3, &ladder), 12);
    }

    #[test]
    fn test_unarmed_with_martial_arts() {
        let c = trooper()
            .with_trait(Trait::new("m1", "Martial Arts I", TraitKind::Feat))
            .with_trait(Trait::new("m2", "Martial Arts II", TraitKind::Feat));
        let list = attacks(&c);
        assert_eq!(list[0].name, "Unarmed Attack");
        assert_eq!(list[0].damage, vec!["1d8+4"]);
        assert_eq!(list[0].to_hit, "1d20+3");
    }

    #[test]
    fn test_ids_are_sequential_and_stable() {
        let c = trooper()
            .with_trait(weapon("a", "Knife", WeaponProfile::new("1d4", Size::Tiny).with_category("Simple Melee Weapons")))
            .with_trait(weapon("b", "Club", WeaponProfile::new("1d6", Size::Small).with_category("Simple Melee Weapons")));
        let first = attacks(&c);
        let ids: Vec<u32> = first.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(first, attacks(&c));
    }

    #[test]
    fn test_generate_from_persisted_stats() {
        let mut c = trooper();
        let mut engine = Engine::default();
        c.recompute(&mut engine);
        let list = generate_attacks(&c, engine.rules());
        assert_eq!(list, c.stats.attacks);
    }
}
