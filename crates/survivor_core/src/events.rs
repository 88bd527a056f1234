//! Event records emitted by the simulation for the presentation layer.
//!
//! The core never holds references to renderers or UI; each tick appends
//! plain event records and the embedding layer drains them. Dropping the
//! events entirely (headless runs, tests) is always safe.

use crate::math::Vec2;
use crate::pool::Handle;
use serde::{Deserialize, Serialize};

/// A single presentation-facing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An enemy took damage. `dot` marks damage-over-time ticks so the
    /// presentation can skip the hit-flash path for them.
    EnemyDamaged {
        /// Handle of the damaged enemy.
        enemy: Handle,
        /// Damage applied.
        amount: f32,
        /// True for burn ticks and other periodic damage.
        dot: bool,
    },
    /// An enemy finished dying and was returned to the pool.
    EnemyDied {
        /// World position at death.
        position: Vec2,
        /// XP value it dropped.
        xp_value: u64,
        /// True if this was an elite.
        elite: bool,
    },
    /// A boss entered the arena.
    BossSpawned {
        /// Handle of the boss enemy.
        enemy: Handle,
        /// Definition key, e.g. `"boss_dragon"`.
        key: String,
        /// Maximum health after all scaling.
        max_health: f32,
    },
    /// Boss health changed (drives the boss health bar).
    BossHealthChanged {
        /// Handle of the boss enemy.
        enemy: Handle,
        /// Current health.
        health: f32,
        /// Maximum health.
        max_health: f32,
    },
    /// A boss died.
    BossDied {
        /// World position at death.
        position: Vec2,
    },
    /// The player took damage after shield absorption.
    PlayerDamaged {
        /// Damage soaked by the shield.
        absorbed: f32,
        /// Damage applied to health.
        taken: f32,
    },
    /// Snapshot of player-facing numbers, pushed on every change.
    PlayerStats {
        /// Current health.
        health: f32,
        /// Maximum health.
        max_health: f32,
        /// Current shield.
        shield: f32,
        /// Burst energy 0..=100.
        energy: u32,
    },
    /// XP was collected.
    XpGained {
        /// Amount collected.
        amount: u64,
        /// XP toward the next level after collection.
        current_xp: u64,
        /// XP needed for the next level.
        needed_xp: u64,
        /// Current player level.
        level: u32,
    },
    /// A level-up offer is awaiting a choice.
    LevelUpOffer {
        /// Player level being granted.
        level: u32,
        /// Candidate weapon keys (up to three).
        choices: Vec<String>,
    },
    /// A weapon was added or upgraded.
    WeaponUpgraded {
        /// Weapon definition key.
        key: String,
        /// Level after the upgrade.
        level: u32,
    },
    /// Burst mode engaged or ended.
    BurstChanged {
        /// True while the overload loadout is active.
        active: bool,
    },
    /// A supply crate was destroyed and dropped a powerup.
    CrateDestroyed {
        /// World position of the crate.
        position: Vec2,
    },
    /// The run ended.
    RunEnded {
        /// True for survival to the timer, false for player death.
        victory: bool,
        /// Total enemies killed.
        kills: u32,
        /// Sim time at the end, in ms.
        survived_ms: u64,
    },
}
