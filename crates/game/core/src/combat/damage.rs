//! Damage calculation and application.

use rand::Rng;

use crate::state::StatBlock;

/// Random components of one attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRoll {
    /// `attack / 2 + U[0, attack / 2)`.
    pub base: u32,
    /// `U[0, defend / 2)`.
    pub blocked: u32,
    pub critical: bool,
}

/// Draws the random parts of an attack.
///
/// Draw order is fixed (base, blocked, critical) so a seeded RNG reproduces a
/// battle exactly.
pub fn roll_damage(rng: &mut impl Rng, attacker: &StatBlock, defender: &StatBlock) -> DamageRoll {
    let half_attack = attacker.attack / 2;
    let base = half_attack + uniform_below(rng, half_attack);
    let blocked = uniform_below(rng, defender.defend / 2);
    let critical = match attacker.critical_rate {
        0 => false,
        rate if rate >= 100 => true,
        rate => rng.gen_range(0..100) < rate,
    };

    DamageRoll {
        base,
        blocked,
        critical,
    }
}

/// Calculate final damage from a roll.
///
/// # Formula
///
/// ```text
/// base = attack / 2 + U[0, attack / 2)
/// if critical:
///     base *= crit_multiplier
/// final = max(base - blocked, 0)
/// ```
///
/// The multiplier applies before the block is subtracted, so a critical hit
/// is not wasted against a heavy defender.
pub fn calculate_damage(roll: &DamageRoll, crit_multiplier: u32) -> u32 {
    let base = if roll.critical {
        roll.base.saturating_mul(crit_multiplier)
    } else {
        roll.base
    };
    base.saturating_sub(roll.blocked)
}

/// Apply damage to current HP, clamped to 0.
pub fn apply_damage(current_hp: u32, damage: u32) -> u32 {
    current_hp.saturating_sub(damage)
}

/// Total experience awarded for defeating a unit with these stats.
pub fn defeat_reward(defeated: &StatBlock) -> u64 {
    u64::from(defeated.attack) + u64::from(defeated.defend / 2)
}

/// `U[0, upper)`, where an empty range yields 0.
fn uniform_below(rng: &mut impl Rng, upper: u32) -> u32 {
    if upper == 0 { 0 } else { rng.gen_range(0..upper) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stats(attack: u32, defend: u32, critical_rate: u32) -> StatBlock {
        StatBlock {
            attack,
            defend,
            speed: 1,
            critical_rate,
            health: 10,
            max_health: 10,
        }
    }

    #[test]
    fn roll_stays_within_formula_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let attacker = stats(10, 0, 0);
        let defender = stats(0, 10, 0);
        for _ in 0..500 {
            let roll = roll_damage(&mut rng, &attacker, &defender);
            assert!((5..10).contains(&roll.base), "base {}", roll.base);
            assert!(roll.blocked < 5, "blocked {}", roll.blocked);
            assert!(!roll.critical);
        }
    }

    #[test]
    fn tiny_stats_never_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let roll = roll_damage(&mut rng, &stats(1, 0, 0), &stats(0, 1, 0));
        assert_eq!(roll, DamageRoll { base: 0, blocked: 0, critical: false });
        assert_eq!(calculate_damage(&roll, 2), 0);
    }

    #[test]
    fn guaranteed_critical_at_full_rate() {
        let mut rng = StdRng::seed_from_u64(5);
        let roll = roll_damage(&mut rng, &stats(10, 0, 100), &stats(0, 0, 0));
        assert!(roll.critical);
    }

    #[test]
    fn critical_multiplies_before_block() {
        let roll = DamageRoll {
            base: 6,
            blocked: 8,
            critical: true,
        };
        assert_eq!(calculate_damage(&roll, 2), 4);
        assert_eq!(
            calculate_damage(
                &DamageRoll {
                    critical: false,
                    ..roll
                },
                2
            ),
            0
        );
    }

    #[test]
    fn apply_damage_floors_at_zero() {
        assert_eq!(apply_damage(20, 7), 13);
        assert_eq!(apply_damage(5, 7), 0);
    }

    #[test]
    fn reward_uses_attack_and_half_defend() {
        assert_eq!(defeat_reward(&stats(5, 5, 0)), 7);
        assert_eq!(defeat_reward(&stats(10, 10, 0)), 15);
    }
}
