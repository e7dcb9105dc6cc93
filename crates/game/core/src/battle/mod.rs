//! Turn-resolution state machine.
//!
//! A [`Battle`] holds two rosters of [`Fighter`]s, one pending-action slot and
//! one target index per participant. Humans submit through [`Battle::set_action`];
//! autonomous combatants are asked by their policy whenever a round opens.
//! Once every living participant has a pending action the round resolves in
//! descending speed order.
//!
//! The engine never performs I/O. Messages and characters that need saving
//! pile up in an outbox that the caller takes with [`Battle::drain`] after
//! every call, once state is committed.

mod action;
mod board;
mod notice;


pub use action::{Action, BattleState, FighterId, Side, Submission, TargetSelection};
pub use notice::{Audience, BattleEnd, Notice, Report};

use std::cmp::Reverse;
use std::mem;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::combat;
use crate::combatant::{Fighter, Mind};
use crate::config::{BattleConfig, ExperienceSplit};
use crate::error::{BattleError, BattleResult};
use crate::policy::PolicyView;
use crate::state::{BattleId, ChannelId, UserId};

#[derive(Debug)]
struct Slot {
    fighter: Fighter,
    side: Side,
    action: Option<Action>,
    /// Index into the enemy roster. Validated lazily.
    target: usize,
}

/// Internal result of recording an action.
enum Submitted {
    Recorded,
    Retargeted(String),
}

#[derive(Debug)]
pub struct Battle {
    id: BattleId,
    state: BattleState,
    leaveable: bool,
    /// Every fighter that ever joined; leavers keep their slot but drop out
    /// of `rosters`.
    slots: Vec<Slot>,
    rosters: [Vec<FighterId>; 2],
    config: BattleConfig,
    rng: StdRng,
    outbox: Report,
}

impl Battle {
    pub fn new(
        id: BattleId,
        side_a: Vec<Fighter>,
        side_b: Vec<Fighter>,
        config: BattleConfig,
        seed: u64,
    ) -> Self {
        let mut slots = Vec::with_capacity(side_a.len() + side_b.len());
        let mut rosters = [Vec::new(), Vec::new()];

        for (side, fighters) in [(Side::A, side_a), (Side::B, side_b)] {
            for fighter in fighters {
                let id = FighterId(slots.len());
                slots.push(Slot {
                    fighter,
                    side,
                    action: None,
                    target: 0,
                });
                rosters[side.index()].push(id);
            }
        }

        Self {
            id,
            state: BattleState::Forming,
            leaveable: false,
            slots,
            rosters,
            config,
            rng: StdRng::seed_from_u64(seed),
            outbox: Report::default(),
        }
    }

    /// Whether participants may withdraw voluntarily.
    pub fn leaveable(mut self, leaveable: bool) -> Self {
        self.leaveable = leaveable;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BattleState::Active | BattleState::Resolving)
    }

    pub fn is_leaveable(&self) -> bool {
        self.leaveable
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn roster(&self, side: Side) -> &[FighterId] {
        &self.rosters[side.index()]
    }

    /// Participant in slot `id`, if this battle has one.
    pub fn fighter(&self, id: FighterId) -> Option<&Fighter> {
        self.slots.get(id.0).map(|slot| &slot.fighter)
    }

    // Slot accessors below index directly; ids only ever come from this
    // battle's own rosters.
    pub(crate) fn fighter_at(&self, id: FighterId) -> &Fighter {
        &self.slots[id.0].fighter
    }

    pub(crate) fn side_of_fighter(&self, id: FighterId) -> Side {
        self.slots[id.0].side
    }

    /// The roster `id` fights against.
    pub(crate) fn enemies_of(&self, id: FighterId) -> &[FighterId] {
        self.roster(self.side_of_fighter(id).opposite())
    }

    /// Current participants of both rosters, side A first.
    pub fn members(&self) -> Vec<FighterId> {
        self.rosters.iter().flatten().copied().collect()
    }

    /// Slot of the participant controlled by `user`.
    pub fn find(&self, user: UserId) -> Option<FighterId> {
        self.rosters
            .iter()
            .flatten()
            .copied()
            .find(|&id| self.fighter_at(id).user_id() == Some(user))
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.find(user).is_some()
    }

    pub fn side_of(&self, user: UserId) -> Option<Side> {
        self.find(user).map(|id| self.side_of_fighter(id))
    }

    /// Users currently taking part, side A first.
    pub fn participants(&self) -> Vec<UserId> {
        self.members()
            .into_iter()
            .filter_map(|id| self.fighter_at(id).user_id())
            .collect()
    }

    pub fn pending_action(&self, user: UserId) -> Option<Action> {
        self.find(user).and_then(|id| self.slots[id.0].action)
    }

    pub fn target_index(&self, user: UserId) -> Option<usize> {
        self.find(user).map(|id| self.slots[id.0].target)
    }

    /// The enemy `id` is aiming at; an out-of-range index falls back to the
    /// first enemy.
    pub(crate) fn target_of(&self, id: FighterId) -> Option<FighterId> {
        let enemies = self.enemies_of(id);
        enemies
            .get(self.slots[id.0].target)
            .or_else(|| enemies.first())
            .copied()
    }

    /// The enemy `user` is currently aiming at.
    pub fn targets_of(&self, user: UserId) -> Option<FighterId> {
        self.find(user).and_then(|id| self.target_of(id))
    }

    /// True when every living participant has a pending action.
    pub fn everyone_ready(&self) -> bool {
        self.rosters
            .iter()
            .flatten()
            .filter(|&&id| !self.fighter_at(id).is_defeated())
            .all(|&id| self.slots[id.0].action.is_some())
    }

    /// Resolution order: descending speed, ties in roster order (side A first).
    pub fn turn_order(&self) -> Vec<FighterId> {
        let mut order = self.members();
        order.sort_by_key(|&id| Reverse(self.fighter_at(id).stats().speed));
        order
    }

    /// Ending implied by current health, if any roster is fully defeated.
    pub fn outcome(&self) -> Option<BattleEnd> {
        match (
            self.roster_defeated(Side::A),
            self.roster_defeated(Side::B),
        ) {
            (false, false) => None,
            (false, true) => Some(self.victory(Side::A)),
            (true, false) => Some(self.victory(Side::B)),
            (true, true) => Some(BattleEnd::Draw),
        }
    }

    /// Winning side, when exactly one roster is defeated.
    pub fn winners(&self) -> Option<Side> {
        match self.outcome() {
            Some(BattleEnd::Victory { side, .. }) => Some(side),
            _ => None,
        }
    }

    /// Takes the accumulated notices and persistence requests.
    pub fn drain(&mut self) -> Report {
        mem::take(&mut self.outbox)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Binds every participant to this battle, announces it and lets
    /// autonomous combatants commit their first action.
    pub fn start(&mut self) {
        if self.state != BattleState::Forming {
            return;
        }

        let id = self.id;
        for member in self.members() {
            self.slots[member.0]
                .fighter
                .update(|c| c.set_battle(Some(id)));
        }
        self.state = BattleState::Active;

        let attackers = self.roster_names(Side::A);
        let opponents = self.roster_names(Side::B);
        self.broadcast(format!(
            ":crossed_swords: {attackers} started to attack {opponents}!"
        ));

        self.collect_autonomous();
        self.settle();
    }

    /// Commits `user`'s action for the current round.
    ///
    /// A defeated target is replaced by the first living enemy; a human then
    /// has to submit again so they never act against a target they did not
    /// see. Completing the round's action set resolves it immediately.
    pub fn set_action(&mut self, user: UserId, action: Action) -> BattleResult<Submission> {
        let id = self.require(user)?;
        if !self.is_active() {
            return Err(BattleError::NotActive(self.id));
        }
        if self.fighter_at(id).is_defeated() {
            self.tell(id, "You have been defeated and cannot act in this battle.");
            return Ok(Submission::Defeated);
        }

        match self.submit(id, action) {
            Submitted::Retargeted(target) => {
                self.tell(
                    id,
                    format!(
                        "The current target was invalid. Auto-selected **{target}**.\nPlease select your action again."
                    ),
                );
                Ok(Submission::Retargeted { target })
            }
            Submitted::Recorded if self.everyone_ready() => {
                self.settle();
                Ok(Submission::Resolved)
            }
            Submitted::Recorded => {
                self.tell(id, "Waiting for other players...");
                Ok(Submission::Waiting)
            }
        }
    }

    /// Overwrites `user`'s target index. Validated when used.
    pub fn set_target(&mut self, user: UserId, index: usize) -> BattleResult<()> {
        let id = self.require(user)?;
        self.slots[id.0].target = index;
        Ok(())
    }

    /// Picks a target by its 1-based number on the board.
    ///
    /// Out-of-range numbers and defeated targets are rejected with a notice.
    pub fn select_target(&mut self, user: UserId, number: usize) -> BattleResult<TargetSelection> {
        let id = self.require(user)?;
        let Some(&target) = number
            .checked_sub(1)
            .and_then(|index| self.enemies_of(id).get(index))
        else {
            self.tell(id, "Out of range.");
            return Ok(TargetSelection::OutOfRange);
        };

        let name = self.fighter_at(target).name();
        if self.fighter_at(target).is_defeated() {
            self.tell(
                id,
                format!("Could not set **{name}** as target; they are already defeated!"),
            );
            return Ok(TargetSelection::Defeated { target: name });
        }

        self.slots[id.0].target = number - 1;
        self.tell(id, format!("Selected **{name}** as target."));
        Ok(TargetSelection::Selected { target: name })
    }

    /// Resolves the round if it is complete. No-op otherwise.
    pub fn next(&mut self) {
        if !self.is_active() || !self.everyone_ready() {
            return;
        }
        self.settle();
    }

    /// Withdraws `user` from the battle.
    ///
    /// Returns `Ok(false)` when the battle does not allow leaving. Emptying a
    /// roster ends the battle for everyone.
    pub fn leave(&mut self, user: UserId) -> BattleResult<bool> {
        let id = self.require(user)?;
        if !self.is_active() {
            return Err(BattleError::NotActive(self.id));
        }
        if !self.leaveable {
            self.tell(id, "You cannot leave this battle.");
            return Ok(false);
        }

        let side = self.side_of_fighter(id);
        let mut text = format!(":door: **{}** left the battle.", self.fighter_at(id).name());
        // Resolved before removal so the leaver hears it too.
        let channels = self.broadcast_channels();

        self.rosters[side.index()].retain(|&member| member != id);
        let slot = &mut self.slots[id.0];
        slot.action = None;
        slot.fighter.update(|c| c.set_battle(None));
        if let Some(handle) = slot.fighter.character() {
            self.outbox.queue_persist(handle);
        }

        if self.roster(side).is_empty() {
            text.push_str("\n:heavy_minus_sign: The battle has ended.");
            self.push_notice(Audience::Battle, channels, text);
            self.conclude(BattleEnd::Abandoned);
            return Ok(true);
        }

        self.push_notice(Audience::Battle, channels, text);
        if let Some(end) = self.outcome() {
            self.broadcast(end_line(&end));
            self.conclude(end);
        } else if self.everyone_ready() {
            self.settle();
        }
        Ok(true)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves rounds for as long as they complete on their own.
    fn settle(&mut self) {
        let limit = self.config.max_chained_rounds.max(1);
        let mut resolved = 0;
        while self.is_active() && self.everyone_ready() && resolved < limit {
            self.resolve_round();
            resolved += 1;
            if self.is_active() {
                self.collect_autonomous();
            }
        }
    }

    fn resolve_round(&mut self) {
        self.state = BattleState::Resolving;

        let mut log = Vec::new();
        let mut level_ups = Vec::new();
        for actor in self.turn_order() {
            // Health is re-read per actor: a fighter killed earlier in the
            // round does not act.
            if self.fighter_at(actor).is_defeated() {
                continue;
            }
            let action = self.slots[actor.0].action;
            match action {
                Some(Action::Attack) => self.resolve_attack(actor, &mut log, &mut level_ups),
                None => {}
            }
        }
        self.outbox.rounds += 1;

        if let Some(end) = self.outcome() {
            log.push(String::new());
            log.push(end_line(&end));
            self.broadcast(log.join("\n"));
            for text in level_ups {
                self.broadcast(text);
            }
            self.conclude(end);
            return;
        }

        for member in self.members() {
            self.slots[member.0].action = None;
        }
        let mentions = self
            .members()
            .into_iter()
            .filter(|&id| !self.fighter_at(id).is_defeated())
            .filter_map(|id| self.fighter_at(id).user_id())
            .map(UserId::mention)
            .collect::<Vec<_>>();
        log.push(String::new());
        if mentions.is_empty() {
            log.push(":arrows_counterclockwise: Next round!".to_string());
        } else {
            log.push(format!(
                ":arrows_counterclockwise: Next round! {}",
                mentions.join(" ")
            ));
        }
        self.state = BattleState::Active;

        self.broadcast(log.join("\n"));
        for text in level_ups {
            self.broadcast(text);
        }
    }

    fn resolve_attack(
        &mut self,
        actor: FighterId,
        log: &mut Vec<String>,
        level_ups: &mut Vec<String>,
    ) {
        let Some(target) = self.attack_target(actor) else {
            return;
        };

        let attacker = self.fighter_at(actor).stats();
        let defender = self.fighter_at(target).stats();
        let attacker_name = self.fighter_at(actor).name();
        let target_name = self.fighter_at(target).name();

        let roll = combat::roll_damage(&mut self.rng, &attacker, &defender);
        let damage = combat::calculate_damage(&roll, self.config.crit_multiplier);
        if damage == 0 {
            log.push(format!(
                ":shield: **{target_name}** ({} HP) blocked the incoming damage from **{attacker_name}**.",
                defender.health
            ));
            return;
        }

        let remaining = combat::apply_damage(defender.health, damage);
        self.slots[target.0]
            .fighter
            .update(|c| c.set_health(remaining));

        let critical = if roll.critical { " :boom: Critical hit!" } else { "" };
        if remaining == 0 {
            log.push(format!(
                ":skull_crossbones: **{target_name}** received {damage} damage from **{attacker_name}** and died.{critical}"
            ));
            self.reward_defeat(actor, target, log, level_ups);
        } else {
            log.push(format!(
                ":crossed_swords: **{target_name}** ({remaining} HP) received {damage} damage from **{attacker_name}**.{critical}"
            ));
        }
    }

    /// Target at resolution time: the indexed enemy, or the first living one
    /// when the indexed enemy fell earlier in the round.
    fn attack_target(&self, actor: FighterId) -> Option<FighterId> {
        let indexed = self.target_of(actor)?;
        if !self.fighter_at(indexed).is_defeated() {
            return Some(indexed);
        }
        self.enemies_of(actor)
            .iter()
            .copied()
            .find(|&enemy| !self.fighter_at(enemy).is_defeated())
    }

    /// Shares the experience for `defeated` across the killer's roster.
    fn reward_defeat(
        &self,
        killer: FighterId,
        defeated: FighterId,
        log: &mut Vec<String>,
        level_ups: &mut Vec<String>,
    ) {
        let rewarded = self.side_of_fighter(killer);
        let total = combat::defeat_reward(&self.fighter_at(defeated).stats());
        let team_size = match self.config.experience_split {
            ExperienceSplit::RewardedTeam => self.roster(rewarded).len(),
            ExperienceSplit::DefeatedTeam => self.roster(rewarded.opposite()).len(),
        }
        .max(1) as u64;
        let share = total / team_size;
        if share == 0 {
            return;
        }

        for &member in self.roster(rewarded) {
            let Some(handle) = self.fighter_at(member).character() else {
                continue;
            };
            let mut character = handle.write();
            let gained = character.add_experience(share);
            let name = character.display_name();
            log.push(format!(":sparkles: **{name}** gained {share} experience."));
            if gained > 0 {
                let plural = if gained == 1 { "" } else { "s" };
                level_ups.push(format!(
                    ":star2: **{name}** reached level {}! (+{gained} stat point{plural})",
                    character.level()
                ));
            }
        }
    }

    /// Ends the battle: unbinds everyone and queues characters for saving.
    fn conclude(&mut self, end: BattleEnd) {
        for member in self.members() {
            let slot = &mut self.slots[member.0];
            slot.action = None;
            slot.fighter.update(|c| c.set_battle(None));
            if let Some(handle) = slot.fighter.character() {
                self.outbox.queue_persist(handle);
            }
        }
        self.state = BattleState::Ended;
        self.outbox.ended = Some(end);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require(&self, user: UserId) -> BattleResult<FighterId> {
        self.find(user).ok_or(BattleError::NotParticipant {
            user,
            battle: self.id,
        })
    }

    /// Records `action`, retargeting first when the current target is down.
    fn submit(&mut self, id: FighterId, action: Action) -> Submitted {
        let target_alive = self
            .target_of(id)
            .is_some_and(|target| !self.fighter_at(target).is_defeated());

        if !target_alive {
            let replacement = self
                .enemies_of(id)
                .iter()
                .enumerate()
                .find(|&(_, &enemy)| !self.fighter_at(enemy).is_defeated())
                .map(|(index, &enemy)| (index, enemy));

            if let Some((index, enemy)) = replacement {
                self.slots[id.0].target = index;
                if self.fighter_at(id).mind() == Mind::Human {
                    return Submitted::Retargeted(self.fighter_at(enemy).name());
                }
            }
        }

        self.slots[id.0].action = Some(action);
        Submitted::Recorded
    }

    /// Asks every idle, living autonomous combatant for an action.
    fn collect_autonomous(&mut self) {
        for id in self.turn_order() {
            if self.slots[id.0].action.is_some() || self.fighter_at(id).is_defeated() {
                continue;
            }
            let Some(policy) = self.fighter_at(id).policy() else {
                continue;
            };
            let decision = policy.decide(&PolicyView::new(self, id));
            if let Some(action) = decision {
                self.submit(id, action);
            }
        }
    }

    fn roster_defeated(&self, side: Side) -> bool {
        self.roster(side)
            .iter()
            .all(|&id| self.fighter_at(id).is_defeated())
    }

    fn victory(&self, side: Side) -> BattleEnd {
        BattleEnd::Victory {
            side,
            winners: self
                .roster(side)
                .iter()
                .map(|&id| self.fighter_at(id).name())
                .collect(),
        }
    }

    fn roster_names(&self, side: Side) -> String {
        self.roster(side)
            .iter()
            .map(|&id| format!("**{}**", self.fighter_at(id).name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Channels of all current participants, each listed once.
    fn broadcast_channels(&self) -> Vec<ChannelId> {
        let mut channels = Vec::new();
        for id in self.members() {
            if let Some(channel) = self.fighter_at(id).channel()
                && !channels.contains(&channel)
            {
                channels.push(channel);
            }
        }
        channels
    }

    fn broadcast(&mut self, text: impl Into<String>) {
        let channels = self.broadcast_channels();
        self.push_notice(Audience::Battle, channels, text.into());
    }

    /// Notice for one participant. Opponents have nobody to tell.
    fn tell(&mut self, id: FighterId, text: impl Into<String>) {
        let fighter = self.fighter_at(id);
        let Some(user) = fighter.user_id() else {
            return;
        };
        let channels = fighter.channel().into_iter().collect();
        self.push_notice(Audience::Participant(user), channels, text.into());
    }

    fn push_notice(&mut self, audience: Audience, channels: Vec<ChannelId>, text: String) {
        self.outbox.notices.push(Notice {
            audience,
            channels,
            text,
        });
    }
}

fn end_line(end: &BattleEnd) -> String {
    match end {
        BattleEnd::Victory { winners, .. } => format!(":medal: Winners: {}", winners.join(", ")),
        BattleEnd::Draw => ":skull: Both sides have fallen. There is no winner.".to_string(),
        BattleEnd::Abandoned => ":heavy_minus_sign: The battle has ended.".to_string(),
    }
}
