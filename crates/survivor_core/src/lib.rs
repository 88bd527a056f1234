//! # Survivor Core
//!
//! Deterministic combat simulation core for Nightfall Survivors.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No wall-clock time
//!
//! This separation enables:
//! - Headless balance runs
//! - Replay from a seed and input script
//! - Save/restore through plain serialization
//! - Simulation testing without a frontend
//!
//! ## Crate Structure
//!
//! - [`simulation`] - The tick loop owning every subsystem
//! - [`pool`] - Fixed-capacity entity pools with generation handles
//! - [`firing`] - The nine weapon firing algorithms
//! - [`enemy`] - Enemy behavior state machine and boss attacks
//! - [`director`] - Spawn cadence, difficulty ramps, boss schedule
//! - [`progression`] - XP thresholds and level-up offers
//! - [`data`] - Authored weapon and enemy definition tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod data;
pub mod director;
pub mod enemy;
pub mod error;
pub mod events;
pub mod firing;
pub mod math;
pub mod pickups;
pub mod player;
pub mod pool;
pub mod progression;
pub mod projectile;
pub mod rng;
pub mod schedule;
pub mod simulation;
pub mod status;
pub mod targeting;
pub mod weapons;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::data::{
        Archetype, BossAttack, EnemyDefinition, EnemyTable, GameData, WeaponDefinition,
        WeaponStats, WeaponTable,
    };
    pub use crate::director::{DifficultyDirector, DifficultyTier};
    pub use crate::enemy::{BehaviorState, EnemyInstance};
    pub use crate::error::{CoreError, Result};
    pub use crate::events::GameEvent;
    pub use crate::math::Vec2;
    pub use crate::player::Player;
    pub use crate::pool::{Handle, Pool};
    pub use crate::progression::ProgressionState;
    pub use crate::rng::SimRng;
    pub use crate::simulation::{RunOutcome, SimDiagnostics, Simulation, TICK_MS, TICK_RATE};
    pub use crate::weapons::{Loadout, WeaponInstance};
}
