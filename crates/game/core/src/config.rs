/// How the experience for a defeated unit is divided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExperienceSplit {
    /// Divide by the size of the roster receiving the reward.
    #[default]
    RewardedTeam,
    /// Divide by the size of the roster the defeated unit belonged to.
    DefeatedTeam,
}

/// Battle balance constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Factor applied to the base damage of a critical hit.
    pub crit_multiplier: u32,
    pub experience_split: ExperienceSplit,
    /// Upper bound on rounds resolved back-to-back without a human submission.
    /// Only all-autonomous battles ever reach it.
    pub max_chained_rounds: u32,
}

impl BattleConfig {
    // ===== rendering constants =====
    pub const HEALTH_BAR_WIDTH: usize = 15;
    pub const NAME_WIDTH: usize = 15;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CRIT_MULTIPLIER: u32 = 2;
    pub const DEFAULT_MAX_CHAINED_ROUNDS: u32 = 1000;

    pub fn new() -> Self {
        Self {
            crit_multiplier: Self::DEFAULT_CRIT_MULTIPLIER,
            experience_split: ExperienceSplit::default(),
            max_chained_rounds: Self::DEFAULT_MAX_CHAINED_ROUNDS,
        }
    }

    pub fn with_experience_split(mut self, split: ExperienceSplit) -> Self {
        self.experience_split = split;
        self
    }

    pub fn with_crit_multiplier(mut self, multiplier: u32) -> Self {
        self.crit_multiplier = multiplier;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Stat block handed to every newly registered character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartingStats {
    pub attack: u32,
    pub defend: u32,
    pub speed: u32,
    pub critical_rate: u32,
    pub max_health: u32,
    pub money: u32,
}

impl Default for StartingStats {
    fn default() -> Self {
        Self {
            attack: 10,
            defend: 10,
            speed: 1,
            critical_rate: 0,
            max_health: 100,
            money: 250,
        }
    }
}
