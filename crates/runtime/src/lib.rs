//! Runtime orchestration for the arena.
//!
//! This crate wires the pure battle rules of `arena-core` to the outside
//! world: a concurrent player registry backed by a durable store, battle
//! sessions that serialise engine calls, best-effort notification delivery,
//! and an event bus. Consumers embed [`Arena`] and pass it explicitly to
//! whatever handles commands.
//!
//! Modules are organized by responsibility:
//! - [`arena`] hosts the service and its builder
//! - [`registry`] owns the in-memory index of characters
//! - [`session`] guards one battle per mutex
//! - [`notify`] and [`identity`] are the narrow transport contracts
//! - [`repository`] provides the durable store adapters
pub mod arena;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod notify;
pub mod registry;
pub mod repository;
pub mod session;

pub use arena::{Arena, ArenaBuilder, Entrant};
pub use config::ArenaConfig;
pub use error::{Result, RuntimeError};
pub use events::{ArenaEvent, EventBus};
pub use identity::{Identity, IdentityResolver, StaticResolver};
pub use notify::{DeliveryError, Notifier, NullNotifier, RecordingNotifier, dispatch};
pub use registry::PlayerRegistry;
pub use repository::{
    CharacterRepository, FileCharacterRepository, InMemoryCharacterRepo, RepositoryError,
};
pub use session::BattleSession;
