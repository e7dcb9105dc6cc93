//! Command handlers.

use anyhow::{Result, bail};
use arena_core::{Action, ChannelId, Submission, UserId};
use arena_runtime::Arena;

use crate::{Cli, Command};

/// Every local player is seen in the terminal.
const TERMINAL: ChannelId = ChannelId(0);

/// Safety net for battles that refuse to end.
const MAX_ROUNDS: u32 = 10_000;

pub async fn run(arena: &Arena, cli: &Cli) -> Result<()> {
    let user = UserId(cli.user);
    enter(arena, user, &cli.name)?;

    match &cli.command {
        Command::Practice => {
            arena.begin_practice(user).await?;
            fight(arena, &[user]).await?;
        }
        Command::Duel { rival, rival_name } => {
            let rival = UserId(*rival);
            enter(arena, rival, rival_name)?;
            arena.begin_duel(user, rival).await?;
            fight(arena, &[user, rival]).await?;
        }
        Command::Stats => print_stats(arena, user, &cli.name),
        Command::Heal => {
            arena.registry().heal(user)?;
            println!("{} is fully healed.", cli.name);
        }
        Command::Spend { stat, amount } => {
            let value = arena.registry().spend_points(user, *stat, *amount)?;
            println!("{stat} is now {value}.");
        }
        Command::Reset => {
            arena.registry().reset(user)?;
            println!("{} starts over.", cli.name);
        }
    }
    Ok(())
}

fn enter(arena: &Arena, user: UserId, name: &str) -> Result<()> {
    if arena.register(user)? {
        println!("And so the adventure of {name} begins!");
    }
    arena.registry().touch(user, TERMINAL)?;
    Ok(())
}

/// Everyone attacks every round until the battle is over.
async fn fight(arena: &Arena, players: &[UserId]) -> Result<()> {
    let Some(&lead) = players.first() else {
        return Ok(());
    };

    let mut rounds = 0;
    while arena.battle_of(lead).await.is_some() {
        println!("{}", arena.board(lead).await?);
        for &player in players {
            if arena.battle_of(player).await.is_none() {
                break;
            }
            if let Submission::Retargeted { .. } = arena.submit_action(player, Action::Attack).await? {
                arena.submit_action(player, Action::Attack).await?;
            }
        }

        rounds += 1;
        if rounds >= MAX_ROUNDS {
            bail!("battle did not finish after {MAX_ROUNDS} rounds");
        }
    }
    Ok(())
}

fn print_stats(arena: &Arena, user: UserId, name: &str) {
    let Some(handle) = arena.registry().get_player(user) else {
        return;
    };
    let character = handle.snapshot();
    println!("Stats for {name}");
    println!(
        "  Level: {}  Experience: {}  Points: {}",
        character.level(),
        character.experience,
        character.points
    );
    println!("  Health: {} / {}", character.health, character.max_health);
    println!(
        "  Attack: {}  Defend: {}  Speed: {}",
        character.attack, character.defend, character.speed
    );
    println!("  Money: {}", character.money);
}
