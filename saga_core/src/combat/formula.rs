//! Roll formula text

/// "+3", "-1", or nothing for zero
fn signed(bonus: i32) -> String {
    match bonus {
        0 => String::new(),
        n if n > 0 => format!("+{}", n),
        n => format!("{}", n),
    }
}

/// d20 attack roll with a flat bonus
pub fn to_hit(bonus: i32) -> String {
    format!("1d20{}", signed(bonus))
}

/// Damage dice with a flat bonus ("2d6+4")
pub fn damage(dice: &str, bonus: i32) -> String {
    format!("{}{}", dice.trim(), signed(bonus))
}

/// Split double-weapon damage ("2d8/2d8") into its dice
pub fn split_dice(dice: &str) -> Vec<String> {
    dice.split('/')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// One damage formula per die of a possibly double weapon
pub fn damage_each(dice: &str, bonus: i32) -> Vec<String> {
    split_dice(dice).iter().map(|d| damage(d, bonus)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulas() {
        assert_eq!(to_hit(3), "1d20+3");
        assert_eq!(to_hit(0), "1d20");
        assert_eq!(to_hit(-7), "1d20-7");
        assert_eq!(damage("2d6", 4), "2d6+4");
        assert_eq!(damage("1d6", -1), "1d6-1");
        assert_eq!(damage(" 1d8 ", 0), "1d8");
    }

    #[test]
    fn test_split_dice() {
        assert_eq!(split_dice("2d8/2d8"), vec!["2d8", "2d8"]);
        assert_eq!(split_dice("1d6"), vec!["1d6"]);
    }

    #[test]
    fn test_damage_each_die() {
        assert_eq!(damage_each("2d6/2d6", 4), vec!["2d6+4", "2d6+4"]);
        assert_eq!(damage_each("3d8", 0), vec!["3d8"]);
    }
}
