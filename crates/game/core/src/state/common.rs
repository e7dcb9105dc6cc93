use std::fmt;

/// External identity of a player (the chat platform's user id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(pub u64);

impl UserId {
    /// Chat mention markup for this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// Outbound destination a player was last seen in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// Identifier of a battle; combatants hold it as their weak back-reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleId(pub u64);

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battle#{}", self.0)
    }
}

/// Copy of the combat-relevant numbers of a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatBlock {
    pub attack: u32,
    pub defend: u32,
    pub speed: u32,
    /// Chance of a critical hit, in percent.
    pub critical_rate: u32,
    pub health: u32,
    pub max_health: u32,
}

impl StatBlock {
    #[inline]
    pub const fn is_defeated(&self) -> bool {
        self.health == 0
    }
}
