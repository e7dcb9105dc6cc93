//! Repository layer for character records.
//!
//! The registry is the source of truth while the process runs; repositories
//! only hold what must survive a restart.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCharacterRepository;
pub use memory::InMemoryCharacterRepo;
pub use traits::CharacterRepository;
