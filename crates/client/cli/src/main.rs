//! Local arena driver.
//!
//! Runs battles against the stock practice opponent or between two local
//! players, printing every notice to stdout. Logs go to stderr.
mod commands;
mod notifier;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arena_core::{Stat, UserId};
use arena_runtime::{
    Arena, ArenaConfig, CharacterRepository, FileCharacterRepository, InMemoryCharacterRepo,
    RuntimeError, StaticResolver,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use notifier::StdoutNotifier;

/// Turn-based arena battles on the command line
#[derive(Parser)]
#[command(name = "arena")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory for character records (overrides ARENA_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep characters in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Fixed seed for reproducible battles (overrides ARENA_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Id of the player to act as
    #[arg(long, global = true, default_value_t = 1)]
    user: u64,

    /// Display name of the player
    #[arg(long, global = true, default_value = "Player")]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fight the practice opponent until one side falls
    Practice,

    /// Duel a second local player; both attack every round
    Duel {
        /// Id of the rival player
        #[arg(long, default_value_t = 2)]
        rival: u64,

        /// Display name of the rival
        #[arg(long, default_value = "Rival")]
        rival_name: String,
    },

    /// Show the character's stats
    Stats,

    /// Pay to restore full health
    Heal,

    /// Spend unspent points on a stat (health, attack, defend, speed)
    Spend {
        stat: Stat,

        #[arg(default_value_t = 1)]
        amount: u32,
    },

    /// Restore the starting stat block
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let cli = Cli::parse();
    let arena = build_arena(&cli)?;

    match commands::run(&arena, &cli).await {
        Err(err)
            if err
                .downcast_ref::<RuntimeError>()
                .is_some_and(|err| !err.severity().is_internal()) =>
        {
            eprintln!("{err}");
            Ok(())
        }
        result => result,
    }
}

fn build_arena(cli: &Cli) -> Result<Arena> {
    let mut config = ArenaConfig::from_env();
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    let repository: Arc<dyn CharacterRepository> = if cli.ephemeral {
        Arc::new(InMemoryCharacterRepo::new())
    } else {
        let dir = config
            .resolved_data_dir()
            .context("no data directory available; pass --data-dir or --ephemeral")?;
        tracing::info!("Character records in {}", dir.display());
        Arc::new(FileCharacterRepository::new(&dir)?)
    };

    let mut resolver = StaticResolver::new().with(UserId(cli.user), cli.name.clone());
    if let Command::Duel { rival, rival_name } = &cli.command {
        resolver.insert(UserId(*rival), rival_name.clone());
    }

    let arena = Arena::builder()
        .config(config)
        .repository(repository)
        .resolver(Arc::new(resolver))
        .notifier(Arc::new(StdoutNotifier))
        .build()?;
    Ok(arena)
}

fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
