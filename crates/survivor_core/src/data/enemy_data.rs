//! Enemy definitions, including the boss roster.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Boss attack archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAttack {
    /// Telegraphed radial blast around the boss.
    Aoe,
    /// Telegraphed high-speed charge along a locked bearing.
    Dash,
    /// Telegraphed five-projectile spread at the target.
    Volley,
}

/// Boss-only behavior parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossProfile {
    /// Attack archetype.
    pub attack: BossAttack,
    /// Attack effect range in world units.
    pub attack_range: f32,
    /// Cooldown between attacks, in ms. Counted from telegraph start.
    pub attack_cooldown_ms: u64,
}

/// One enemy's authored definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDefinition {
    /// Stable key, e.g. `"slime"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base health.
    pub hp: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Contact damage.
    pub damage: f32,
    /// XP dropped on death.
    pub xp: u64,
    /// Presentation scale; also drives the collision radius.
    pub scale: f32,
    /// Present for bosses only.
    pub boss: Option<BossProfile>,
}

impl EnemyDefinition {
    /// True for boss entries.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.boss.is_some()
    }
}

/// Enemy definition table keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTable {
    defs: BTreeMap<String, EnemyDefinition>,
}

impl EnemyTable {
    /// Look up a definition by key.
    pub fn get(&self, key: &str) -> Result<&EnemyDefinition> {
        self.defs
            .get(key)
            .ok_or_else(|| CoreError::DefinitionNotFound(key.to_string()))
    }

    /// Parse a table from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CoreError::DataParse(e.to_string()))
    }

    /// The built-in enemy roster.
    #[must_use]
    pub fn builtin() -> Self {
        let mut defs = BTreeMap::new();
        let mut insert = |def: EnemyDefinition| {
            defs.insert(def.id.clone(), def);
        };

        insert(EnemyDefinition {
            id: "slime".into(),
            name: "Slime".into(),
            hp: 20.0,
            speed: 50.0,
            damage: 10.0,
            xp: 10,
            scale: 1.0,
            boss: None,
        });
        insert(EnemyDefinition {
            id: "fast".into(),
            name: "Fast Bat".into(),
            hp: 12.0,
            speed: 160.0,
            damage: 8.0,
            xp: 25,
            scale: 1.0,
            boss: None,
        });
        insert(EnemyDefinition {
            id: "tank".into(),
            name: "Heavy Golem".into(),
            hp: 200.0,
            speed: 35.0,
            damage: 35.0,
            xp: 80,
            scale: 1.8,
            boss: None,
        });
        insert(EnemyDefinition {
            id: "dragon".into(),
            name: "Dragon".into(),
            hp: 120.0,
            speed: 90.0,
            damage: 30.0,
            xp: 150,
            scale: 2.0,
            boss: None,
        });

        insert(EnemyDefinition {
            id: "boss_slime".into(),
            name: "Giant Slime Overlord".into(),
            hp: 6_000.0,
            speed: 50.0,
            damage: 40.0,
            xp: 2_000,
            scale: 10.0,
            boss: Some(BossProfile {
                attack: BossAttack::Aoe,
                attack_range: 200.0,
                attack_cooldown_ms: 3_000,
            }),
        });
        insert(EnemyDefinition {
            id: "boss_bat".into(),
            name: "Supreme Vampire Bat".into(),
            hp: 12_000.0,
            speed: 120.0,
            damage: 50.0,
            xp: 5_000,
            scale: 8.0,
            boss: Some(BossProfile {
                attack: BossAttack::Dash,
                attack_range: 100.0,
                attack_cooldown_ms: 4_000,
            }),
        });
        insert(EnemyDefinition {
            id: "boss_golem".into(),
            name: "Ancient Iron Colossus".into(),
            hp: 50_000.0,
            speed: 40.0,
            damage: 80.0,
            xp: 10_000,
            scale: 12.0,
            boss: Some(BossProfile {
                attack: BossAttack::Aoe,
                attack_range: 300.0,
                attack_cooldown_ms: 5_000,
            }),
        });
        insert(EnemyDefinition {
            id: "boss_dragon".into(),
            name: "Elden Fire Dragon".into(),
            hp: 100_000.0,
            speed: 100.0,
            damage: 150.0,
            xp: 20_000,
            scale: 15.0,
            boss: Some(BossProfile {
                attack: BossAttack::Volley,
                attack_range: 400.0,
                attack_cooldown_ms: 3_000,
            }),
        });
        insert(EnemyDefinition {
            id: "boss_demon".into(),
            name: "Demon Lord of Doom".into(),
            hp: 500_000.0,
            speed: 70.0,
            damage: 999.0,
            xp: 100_000,
            scale: 15.0,
            boss: Some(BossProfile {
                attack: BossAttack::Volley,
                attack_range: 400.0,
                attack_cooldown_ms: 6_000,
            }),
        });

        Self { defs }
    }
}
