//! Weapon definitions and upgrade deltas.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of firing behaviors. Every weapon names exactly one; the
/// firing library dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    /// Aimed projectile burst with optional stagger between shots.
    Projectile,
    /// Fan of homing projectiles.
    Multishot,
    /// Instant cone strike around the player.
    Melee,
    /// Periodic radial damage centered on the player.
    Aura,
    /// Short-lived spray of burning particles.
    Flamethrower,
    /// Instant-hit bolt that hops between targets.
    ChainLightning,
    /// Even fan of fast, short-lived pellets.
    Shotgun,
    /// Sustained beam with a ramp-up and periodic damage ticks.
    Beam,
    /// Companion with its own defend/push/sweep state machine.
    Guardian,
}

/// Numeric stat block for one weapon.
///
/// Units: damage in hit points, ranges in world units, times in ms,
/// angles in degrees. Fields a given archetype does not read stay at
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Damage per hit (per tick for aura and beam).
    pub damage: f32,
    /// Targeting / effect range.
    pub range: f32,
    /// Base cooldown between activations, in ms.
    pub cooldown_ms: f32,
    /// Enemies a projectile can pass through.
    pub pierce: u32,
    /// Projectiles per activation (hops for chain lightning).
    pub count: u32,
    /// Fan angle in degrees (per-shot step for multishot, total for shotgun).
    pub spread_deg: f32,
    /// Random aim error, uniform in +/- this many degrees.
    pub inaccuracy_deg: f32,
    /// Active duration for beams, in ms.
    pub duration_ms: f32,
    /// Damage tick interval for beams, in ms.
    pub tick_interval_ms: f32,
    /// Beam width in world units.
    pub beam_width: f32,
    /// Stun applied on hit, in ms (0 = none).
    pub stun_ms: f32,
    /// Shield restored by a guardian's defend action.
    pub shield_restore: f32,
    /// Damage of a guardian's push action.
    pub push_damage: f32,
    /// Slow factor applied on hit (0 = none, otherwise multiplier in (0, 1]).
    pub slow_factor: f32,
    /// Splash radius for explosive projectiles (0 = none).
    pub splash_radius: f32,
    /// Presentation tint.
    pub color: u32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 0.0,
            range: 0.0,
            cooldown_ms: 1_000.0,
            pierce: 1,
            count: 1,
            spread_deg: 0.0,
            inaccuracy_deg: 0.0,
            duration_ms: 0.0,
            tick_interval_ms: 0.0,
            beam_width: 0.0,
            stun_ms: 0.0,
            shield_restore: 0.0,
            push_damage: 0.0,
            slow_factor: 0.0,
            splash_radius: 0.0,
            color: 0xffff_ffff,
        }
    }
}

impl WeaponStats {
    /// Apply one upgrade delta. Numeric fields are additive; `slow_factor`
    /// and `color` are last-write.
    pub fn apply_delta(&mut self, delta: &StatDelta) {
        if let Some(v) = delta.damage {
            self.damage += v;
        }
        if let Some(v) = delta.range {
            self.range += v;
        }
        if let Some(v) = delta.cooldown_ms {
            self.cooldown_ms = (self.cooldown_ms + v).max(0.0);
        }
        if let Some(v) = delta.pierce {
            self.pierce = self.pierce.saturating_add_signed(v);
        }
        if let Some(v) = delta.count {
            self.count = self.count.saturating_add_signed(v);
        }
        if let Some(v) = delta.spread_deg {
            self.spread_deg += v;
        }
        if let Some(v) = delta.inaccuracy_deg {
            self.inaccuracy_deg = (self.inaccuracy_deg + v).max(0.0);
        }
        if let Some(v) = delta.duration_ms {
            self.duration_ms += v;
        }
        if let Some(v) = delta.beam_width {
            self.beam_width += v;
        }
        if let Some(v) = delta.stun_ms {
            self.stun_ms += v;
        }
        if let Some(v) = delta.shield_restore {
            self.shield_restore += v;
        }
        if let Some(v) = delta.push_damage {
            self.push_damage += v;
        }
        if let Some(v) = delta.splash_radius {
            self.splash_radius += v;
        }
        if let Some(v) = delta.slow_factor {
            self.slow_factor = v;
        }
        if let Some(v) = delta.color {
            self.color = v;
        }
    }
}

/// One level's worth of stat changes. `None` fields leave the stat alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    /// Added to damage.
    pub damage: Option<f32>,
    /// Added to range.
    pub range: Option<f32>,
    /// Added to cooldown (negative values speed the weapon up).
    pub cooldown_ms: Option<f32>,
    /// Added to pierce.
    pub pierce: Option<i32>,
    /// Added to count.
    pub count: Option<i32>,
    /// Added to spread.
    pub spread_deg: Option<f32>,
    /// Added to inaccuracy.
    pub inaccuracy_deg: Option<f32>,
    /// Added to beam duration.
    pub duration_ms: Option<f32>,
    /// Added to beam width.
    pub beam_width: Option<f32>,
    /// Added to stun duration.
    pub stun_ms: Option<f32>,
    /// Added to guardian shield restore.
    pub shield_restore: Option<f32>,
    /// Added to guardian push damage.
    pub push_damage: Option<f32>,
    /// Added to splash radius.
    pub splash_radius: Option<f32>,
    /// Replaces the slow factor.
    pub slow_factor: Option<f32>,
    /// Replaces the tint.
    pub color: Option<u32>,
}

/// Maximum weapon level.
pub const MAX_WEAPON_LEVEL: u32 = 5;

/// One weapon's authored definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Stable key, e.g. `"handgun"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavor / UI description.
    pub description: String,
    /// Firing behavior.
    pub archetype: Archetype,
    /// Level-1 stats.
    pub base: WeaponStats,
    /// Upgrade deltas for levels 2..=5, in order.
    pub upgrades: Vec<StatDelta>,
}

/// Weapon definition table keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponTable {
    defs: BTreeMap<String, WeaponDefinition>,
}

/// Keys of the weapons that appear in level-up offers.
pub const STANDARD_WEAPONS: [&str; 10] = [
    "handgun",
    "machine_gun",
    "sniper_rifle",
    "broadsword",
    "magic_missile",
    "chain_lightning",
    "shotgun",
    "heavy_cannon",
    "guardian",
    "aura",
];

/// Keys of the burst-mode loadout.
pub const OVERLOAD_WEAPONS: [&str; 3] = ["overload_flame", "overload_vulcan", "overload_aura"];

impl WeaponTable {
    /// Look up a definition by key.
    pub fn get(&self, key: &str) -> Result<&WeaponDefinition> {
        self.defs
            .get(key)
            .ok_or_else(|| CoreError::DefinitionNotFound(key.to_string()))
    }

    /// True if the table contains `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.defs.contains_key(key)
    }

    /// Iterate definitions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponDefinition> {
        self.defs.values()
    }

    /// Parse a table from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CoreError::DataParse(e.to_string()))
    }

    /// The built-in weapon set.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn builtin() -> Self {
        let mut defs = BTreeMap::new();
        let mut insert = |def: WeaponDefinition| {
            defs.insert(def.id.clone(), def);
        };

        insert(WeaponDefinition {
            id: "handgun".into(),
            name: "Handgun".into(),
            description: "Balanced starter sidearm with steady ranged fire".into(),
            archetype: Archetype::Projectile,
            base: WeaponStats {
                damage: 20.0,
                range: 800.0,
                cooldown_ms: 600.0,
                pierce: 1,
                count: 1,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(15.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-100.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(10.0),
                    pierce: Some(2),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(1),
                    damage: Some(5.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "machine_gun".into(),
            name: "Machine Gun".into(),
            description: "High fire rate, suppresses with a wall of bullets".into(),
            archetype: Archetype::Projectile,
            base: WeaponStats {
                damage: 6.0,
                range: 400.0,
                cooldown_ms: 100.0,
                pierce: 1,
                count: 1,
                spread_deg: 10.0,
                inaccuracy_deg: 15.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(4.0),
                    inaccuracy_deg: Some(-2.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(2.0),
                    inaccuracy_deg: Some(-3.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-10.0),
                    inaccuracy_deg: Some(-2.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-10.0),
                    inaccuracy_deg: Some(-3.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "sniper_rifle".into(),
            name: "Sniper Rifle".into(),
            description: "Huge damage and deep pierce at a slow rate".into(),
            archetype: Archetype::Projectile,
            base: WeaponStats {
                damage: 120.0,
                range: 1_000.0,
                cooldown_ms: 1_800.0,
                pierce: 3,
                count: 1,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(80.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(40.0),
                    pierce: Some(2),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-300.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(60.0),
                    splash_radius: Some(150.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "broadsword".into(),
            name: "Broadsword".into(),
            description: "Sweeping melee arc with heavy knockback".into(),
            archetype: Archetype::Melee,
            base: WeaponStats {
                damage: 60.0,
                range: 150.0,
                cooldown_ms: 900.0,
                pierce: 99,
                count: 1,
                spread_deg: 120.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(15.0),
                    range: Some(50.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(45.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-150.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(30.0),
                    spread_deg: Some(240.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "magic_missile".into(),
            name: "Magic Missile".into(),
            description: "Fires a fan of homing energy bolts".into(),
            archetype: Archetype::Multishot,
            base: WeaponStats {
                damage: 12.0,
                range: 600.0,
                cooldown_ms: 1_400.0,
                pierce: 1,
                count: 5,
                spread_deg: 30.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    count: Some(2),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(10.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(3),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(8.0),
                    pierce: Some(2),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "chain_lightning".into(),
            name: "Chain Lightning".into(),
            description: "Auto-locking bolt that arcs between targets and stuns".into(),
            archetype: Archetype::ChainLightning,
            base: WeaponStats {
                damage: 25.0,
                range: 400.0,
                cooldown_ms: 1_200.0,
                count: 3,
                stun_ms: 500.0,
                color: 0x00f2_fe,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(12.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(1),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-200.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(1),
                    stun_ms: Some(500.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "shotgun".into(),
            name: "Shotgun".into(),
            description: "Close-range burst, a wide fan of pellets".into(),
            archetype: Archetype::Shotgun,
            base: WeaponStats {
                damage: 15.0,
                range: 1_200.0,
                cooldown_ms: 1_200.0,
                pierce: 2,
                count: 5,
                spread_deg: 45.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(5.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(2),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-300.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    count: Some(2),
                    stun_ms: Some(300.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "heavy_cannon".into(),
            name: "Heavy Cannon".into(),
            description: "Slow-charging superweapon firing a sustained beam".into(),
            archetype: Archetype::Beam,
            base: WeaponStats {
                damage: 30.0,
                range: 700.0,
                cooldown_ms: 6_000.0,
                duration_ms: 2_000.0,
                tick_interval_ms: 200.0,
                beam_width: 80.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    beam_width: Some(40.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(15.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-1_000.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    duration_ms: Some(1_000.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "guardian".into(),
            name: "Guardian".into(),
            description: "Summons a protective giant that attacks and defends on its own".into(),
            archetype: Archetype::Guardian,
            base: WeaponStats {
                damage: 50.0,
                push_damage: 20.0,
                range: 250.0,
                cooldown_ms: 100.0,
                shield_restore: 20.0,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    cooldown_ms: Some(-500.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(30.0),
                    push_damage: Some(20.0),
                    range: Some(150.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    shield_restore: Some(20.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    cooldown_ms: Some(-500.0),
                    ..StatDelta::default()
                },
            ],
        });

        insert(WeaponDefinition {
            id: "aura".into(),
            name: "Aura".into(),
            description: "A persistent damage field around the player".into(),
            archetype: Archetype::Aura,
            base: WeaponStats {
                damage: 8.0,
                range: 160.0,
                cooldown_ms: 500.0,
                pierce: 99,
                ..WeaponStats::default()
            },
            upgrades: vec![
                StatDelta {
                    damage: Some(6.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(4.0),
                    range: Some(60.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(10.0),
                    ..StatDelta::default()
                },
                StatDelta {
                    damage: Some(12.0),
                    slow_factor: Some(0.5),
                    ..StatDelta::default()
                },
            ],
        });

        // Burst-mode loadout. No upgrades; damage is rescaled at activation.
        insert(WeaponDefinition {
            id: "overload_flame".into(),
            name: "Overload Phoenix".into(),
            description: "Burst-mode flamethrower".into(),
            archetype: Archetype::Flamethrower,
            base: WeaponStats {
                damage: 15.0,
                range: 450.0,
                cooldown_ms: 50.0,
                color: 0xffaa_00,
                ..WeaponStats::default()
            },
            upgrades: vec![],
        });

        insert(WeaponDefinition {
            id: "overload_vulcan".into(),
            name: "Overload Vulcan".into(),
            description: "Burst-mode rotary cannon".into(),
            archetype: Archetype::Projectile,
            base: WeaponStats {
                damage: 25.0,
                range: 600.0,
                cooldown_ms: 60.0,
                pierce: 3,
                spread_deg: 5.0,
                color: 0xffff_00,
                ..WeaponStats::default()
            },
            upgrades: vec![],
        });

        insert(WeaponDefinition {
            id: "overload_aura".into(),
            name: "Powerful Aura".into(),
            description: "Burst-mode damage field".into(),
            archetype: Archetype::Aura,
            base: WeaponStats {
                damage: 40.0,
                range: 300.0,
                cooldown_ms: 200.0,
                pierce: 99,
                color: 0xff00_ff,
                ..WeaponStats::default()
            },
            upgrades: vec![],
        });

        Self { defs }
    }
}
