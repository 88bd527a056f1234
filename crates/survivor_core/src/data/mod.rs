//! Authored content tables: weapon and enemy definitions.
//!
//! Definitions are immutable data shared across the simulation; runtime
//! state (levels, cooldowns, health) lives on instances, never here. The
//! built-in tables are expressed in code and the same types parse from
//! RON for external balance files.

pub mod enemy_data;
pub mod weapon_data;

pub use enemy_data::{BossAttack, BossProfile, EnemyDefinition, EnemyTable};
pub use weapon_data::{Archetype, StatDelta, WeaponDefinition, WeaponStats, WeaponTable};

use serde::{Deserialize, Serialize};

/// All content tables for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    /// Weapon definitions keyed by id.
    pub weapons: WeaponTable,
    /// Enemy definitions keyed by id.
    pub enemies: EnemyTable,
}

impl Default for GameData {
    fn default() -> Self {
        Self {
            weapons: WeaponTable::builtin(),
            enemies: EnemyTable::builtin(),
        }
    }
}
