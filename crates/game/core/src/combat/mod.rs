//! Combat resolution system.
//!
//! Pure functions for turning two stat blocks into a damage number. The RNG
//! is passed in so battles can be replayed from a seed.
//!
//! # Core Functions
//!
//! - `roll_damage`: draws base damage, blocked amount and the critical check
//! - `calculate_damage`: folds a roll into final damage
//! - `apply_damage`: HP reduction (clamped to 0)
//! - `defeat_reward`: experience for taking a unit down

pub mod damage;

pub use damage::{DamageRoll, apply_damage, calculate_damage, defeat_reward, roll_damage};
