//! Identity resolution contract.
//!
//! The registry only needs a display name for each user id; where it comes
//! from (a chat platform API, a fixture) is the resolver's business.

use std::collections::HashMap;

use arena_core::UserId;

/// External identity of a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
}

pub trait IdentityResolver: Send + Sync {
    /// Looks up `user`. `None` when the identity is unknown or unreachable.
    fn resolve(&self, user: UserId) -> Option<Identity>;
}

/// Resolver backed by a fixed table.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    names: HashMap<UserId, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, user: UserId, name: impl Into<String>) -> Self {
        self.insert(user, name);
        self
    }

    pub fn insert(&mut self, user: UserId, name: impl Into<String>) {
        self.names.insert(user, name.into());
    }
}

impl IdentityResolver for StaticResolver {
    fn resolve(&self, user: UserId) -> Option<Identity> {
        self.names.get(&user).map(|name| Identity {
            id: user,
            name: name.clone(),
        })
    }
}
