//! Text rendering of both rosters.

use std::fmt::Write;

use crate::config::BattleConfig;
use crate::state::{StatBlock, UserId};

use super::{Battle, FighterId, Side};

impl Battle {
    /// Renders both rosters as a code block, seen from `viewer`'s seat.
    ///
    /// Rows on the viewer's own roster and defeated rows are marked `-`; the
    /// viewer's current target is marked `x`. Rendering never mutates.
    pub fn board(&self, viewer: UserId) -> String {
        let seat = self.find(viewer);
        let own_side = seat.map(|id| self.side_of_fighter(id));
        // The raw stored index: an out-of-range selection marks nothing.
        let target = seat.map(|id| self.slots[id.0].target);

        let mut out = String::from("```\n");
        for (i, side) in [Side::A, Side::B].into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "== {} ==", side.label());
            for (index, &id) in self.roster(side).iter().enumerate() {
                let stats = self.fighter_at(id).stats();
                let mark = if own_side == Some(side) || stats.is_defeated() {
                    '-'
                } else if target == Some(index) {
                    'x'
                } else {
                    ' '
                };
                out.push_str(&self.row(mark, index + 1, id, &stats));
                out.push('\n');
            }
        }
        out.push_str("```");
        out
    }

    fn row(&self, mark: char, number: usize, id: FighterId, stats: &StatBlock) -> String {
        format!(
            "[{mark}] {number}. {name:<width$} {hp:>3} [{bar}] {max:<3} A{atk} D{def} S{spd}",
            name = self.fighter_at(id).name(),
            width = BattleConfig::NAME_WIDTH,
            hp = stats.health,
            bar = health_bar(stats),
            max = stats.max_health,
            atk = stats.attack,
            def = stats.defend,
            spd = stats.speed,
        )
    }
}

/// Bar of `HEALTH_BAR_WIDTH` cells, filled in proportion to remaining health.
fn health_bar(stats: &StatBlock) -> String {
    let width = BattleConfig::HEALTH_BAR_WIDTH;
    let filled = if stats.max_health == 0 {
        0
    } else {
        let ratio = f64::from(stats.health) / f64::from(stats.max_health);
        ((ratio * width as f64).round() as usize).min(width)
    };
    format!("{}{}", "x".repeat(filled), " ".repeat(width - filled))
}
