//! Experience and level rules.
//!
//! Level is never stored: `level = 1 + floor(cbrt(experience))`. The cube
//! root is computed on integers so the step boundaries (1, 8, 27, ...) are
//! exact.

/// Stat a player can spend unspent points on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Stat {
    /// +5 max health per point.
    Health,
    Attack,
    Defend,
    Speed,
}

impl Stat {
    pub const HEALTH_PER_POINT: u32 = 5;
}

/// Level reached with the given amount of experience.
pub fn level_for(experience: u64) -> u32 {
    1 + integer_cbrt(experience) as u32
}

/// Number of levels gained when going from `before` to `after` experience.
pub fn levels_gained(before: u64, after: u64) -> u32 {
    level_for(after).saturating_sub(level_for(before))
}

/// Largest `x` with `x³ ≤ n`.
fn integer_cbrt(n: u64) -> u64 {
    let cube = |x: u64| x.checked_mul(x).and_then(|sq| sq.checked_mul(x));
    let mut x = (n as f64).cbrt() as u64;
    while cube(x + 1).is_some_and(|c| c <= n) {
        x += 1;
    }
    while x > 0 && cube(x).is_none_or(|c| c > n) {
        x -= 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_steps_at_perfect_cubes() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(1), 2);
        assert_eq!(level_for(7), 2);
        assert_eq!(level_for(8), 3);
        assert_eq!(level_for(26), 3);
        assert_eq!(level_for(27), 4);
        assert_eq!(level_for(999), 10);
        assert_eq!(level_for(1000), 11);
    }

    #[test]
    fn level_is_monotonic() {
        let mut previous = level_for(0);
        for exp in 1..5000u64 {
            let level = level_for(exp);
            assert!(level >= previous, "level dropped at {exp}");
            previous = level;
        }
    }

    #[test]
    fn cube_root_is_exact_for_large_values() {
        let n = 2_097_151u64; // 128³ - 1
        assert_eq!(integer_cbrt(n), 127);
        assert_eq!(integer_cbrt(n + 1), 128);
        assert_eq!(integer_cbrt(u64::MAX), 2_642_245);
    }

    #[test]
    fn levels_gained_counts_every_step() {
        assert_eq!(levels_gained(0, 0), 0);
        assert_eq!(levels_gained(0, 8), 2);
        assert_eq!(levels_gained(5, 7), 0);
        assert_eq!(levels_gained(7, 27), 2);
    }

    #[test]
    fn stat_names_parse_case_insensitively() {
        assert_eq!("Health".parse::<Stat>(), Ok(Stat::Health));
        assert_eq!("speed".parse::<Stat>(), Ok(Stat::Speed));
        assert!("luck".parse::<Stat>().is_err());
    }
}
