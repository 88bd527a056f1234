//! Difficulty director: spawn cadence, ramps, boss schedule, balance
//! diagnostics.
//!
//! The director is pure scheduling state. Each tick it is polled with the
//! current time and emits a list of actions (spawn an enemy, spawn a boss,
//! spawn a crate); the simulation executes them against the pools. That
//! keeps the ramp arithmetic testable without a world.

use crate::enemy::{SpawnScaling, ELITE_CHANCE};
use crate::math::Vec2;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Starting gap between spawns, in ms.
pub const SPAWN_INTERVAL_START_MS: u32 = 800;
/// Spawn gap shrinks by this much per ramp step.
pub const SPAWN_INTERVAL_STEP_MS: u32 = 40;
/// Spawn gap never drops below this.
pub const SPAWN_INTERVAL_FLOOR_MS: u32 = 100;
/// Ramp step cadence, in ms.
pub const RAMP_INTERVAL_MS: u64 = 30_000;
/// Starting population ceiling.
pub const POPULATION_START: u32 = 100;
/// Population ceiling grows by this much per ramp step.
pub const POPULATION_STEP: u32 = 50;
/// Boss spawn cadence, in ms.
pub const BOSS_INTERVAL_MS: u64 = 120_000;
/// Supply crate cadence, in ms.
pub const CRATE_INTERVAL_MS: u64 = 30_000;
/// At most this many crates alive at once.
pub const MAX_CRATES: usize = 2;
/// Spawns appear at this distance band from the player.
pub const SPAWN_DISTANCE_MIN: f32 = 700.0;
/// Outer edge of the spawn band.
pub const SPAWN_DISTANCE_MAX: f32 = 1_000.0;

/// Difficulty tier selected at run start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DifficultyTier {
    /// Baseline.
    #[default]
    Normal,
    /// Tougher and more rewarding.
    Hard,
    /// Brutal.
    Hell,
}

impl DifficultyTier {
    /// Regular-enemy multipliers: (health, damage, xp).
    #[must_use]
    pub fn enemy_multipliers(self) -> (f32, f32, f32) {
        match self {
            Self::Normal => (1.0, 1.0, 1.0),
            Self::Hard => (1.8, 1.5, 1.1),
            Self::Hell => (4.0, 2.5, 1.2),
        }
    }

    /// Boss multipliers: (health, damage). Bosses use a gentler curve.
    #[must_use]
    pub fn boss_multipliers(self) -> (f32, f32) {
        match self {
            Self::Normal => (1.0, 1.0),
            Self::Hard => (1.5, 1.3),
            Self::Hell => (3.0, 2.0),
        }
    }
}

/// One thing the director wants done this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorAction {
    /// Spawn a regular enemy.
    SpawnEnemy,
    /// Spawn the boss with this definition key.
    SpawnBoss(&'static str),
    /// Spawn a supply crate.
    SpawnCrate,
}

/// Spawn cadence and ramp state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyDirector {
    /// Selected tier.
    pub tier: DifficultyTier,
    /// Current gap between spawns, in ms.
    pub spawn_interval_ms: u32,
    /// Current population ceiling.
    pub population_cap: u32,
    next_spawn_at: u64,
    next_ramp_at: u64,
    next_boss_at: u64,
    next_crate_at: u64,
}

impl DifficultyDirector {
    /// Fresh director at run start.
    #[must_use]
    pub fn new(tier: DifficultyTier) -> Self {
        Self {
            tier,
            spawn_interval_ms: SPAWN_INTERVAL_START_MS,
            population_cap: POPULATION_START,
            next_spawn_at: 0,
            next_ramp_at: RAMP_INTERVAL_MS,
            next_boss_at: BOSS_INTERVAL_MS,
            next_crate_at: CRATE_INTERVAL_MS,
        }
    }

    /// Advance schedules to `now` and list the due actions.
    ///
    /// A spawn slot that falls while the population is at the ceiling is
    /// consumed, not deferred; the cadence never backs up. Crate slots
    /// are likewise consumed when the field is full.
    pub fn poll(&mut self, now: u64, active_enemies: usize, active_crates: usize) -> Vec<DirectorAction> {
        let mut actions = Vec::new();

        while now >= self.next_ramp_at {
            self.spawn_interval_ms = self
                .spawn_interval_ms
                .saturating_sub(SPAWN_INTERVAL_STEP_MS)
                .max(SPAWN_INTERVAL_FLOOR_MS);
            self.population_cap += POPULATION_STEP;
            self.next_ramp_at += RAMP_INTERVAL_MS;
            tracing::debug!(
                interval_ms = self.spawn_interval_ms,
                cap = self.population_cap,
                "difficulty ramp step"
            );
        }

        let mut spawns = 0usize;
        while now >= self.next_spawn_at {
            self.next_spawn_at += u64::from(self.spawn_interval_ms);
            spawns += 1;
        }
        let room = (self.population_cap as usize).saturating_sub(active_enemies);
        for _ in 0..spawns.min(room) {
            actions.push(DirectorAction::SpawnEnemy);
        }

        while now >= self.next_boss_at {
            self.next_boss_at += BOSS_INTERVAL_MS;
            actions.push(DirectorAction::SpawnBoss(boss_for_elapsed(now)));
        }

        while now >= self.next_crate_at {
            self.next_crate_at += CRATE_INTERVAL_MS;
            if active_crates < MAX_CRATES {
                actions.push(DirectorAction::SpawnCrate);
            }
        }

        actions
    }

    /// Roll the scaling for one regular spawn: elite first, then the time
    /// ramp, then the tier multipliers.
    pub fn roll_spawn_scaling(&self, now: u64, rng: &mut SimRng) -> SpawnScaling {
        let (tier_hp, tier_damage, tier_xp) = self.tier.enemy_multipliers();
        SpawnScaling {
            elite: rng.roll(ELITE_CHANCE),
            time_mult: time_health_multiplier(now),
            tier_hp,
            tier_damage,
            tier_xp,
        }
    }

    /// Scaling for a boss spawn. Bosses are never elite and skip the
    /// time ramp; the tier curve alone carries them.
    #[must_use]
    pub fn boss_spawn_scaling(&self) -> SpawnScaling {
        let (tier_hp, tier_damage) = self.tier.boss_multipliers();
        SpawnScaling {
            elite: false,
            time_mult: 1.0,
            tier_hp,
            tier_damage,
            tier_xp: 1.0,
        }
    }
}

/// Weighted enemy-kind roll for regular spawns.
pub fn roll_enemy_kind(rng: &mut SimRng) -> &'static str {
    let roll = rng.next_f32();
    if roll < 0.5 {
        "slime"
    } else if roll < 0.75 {
        "fast"
    } else if roll < 0.9 {
        "tank"
    } else {
        "dragon"
    }
}

/// Random position in the spawn band around the player.
pub fn roll_spawn_position(rng: &mut SimRng, player_pos: Vec2) -> Vec2 {
    let angle = rng.next_range(0.0, std::f32::consts::TAU);
    let dist = rng.next_range(SPAWN_DISTANCE_MIN, SPAWN_DISTANCE_MAX);
    player_pos + Vec2::from_angle(angle) * dist
}

/// Health/XP multiplier from elapsed time: +10% per full minute.
#[must_use]
pub fn time_health_multiplier(now: u64) -> f32 {
    1.0 + 0.1 * (now / 60_000) as f32
}

/// Boss picked by elapsed time, climbing the roster every two minutes.
#[must_use]
pub fn boss_for_elapsed(now: u64) -> &'static str {
    let minutes = now / 60_000;
    if minutes >= 10 {
        "boss_demon"
    } else if minutes >= 8 {
        "boss_dragon"
    } else if minutes >= 6 {
        "boss_golem"
    } else if minutes >= 4 {
        "boss_bat"
    } else {
        "boss_slime"
    }
}

/// DPS the spawn pressure expects the player to sustain. Used purely as
/// a balance diagnostic.
#[must_use]
pub fn required_dps(spawn_interval_ms: u32, now: u64) -> f32 {
    let spawns_per_second = 1_000.0 / spawn_interval_ms as f32;
    let avg_enemy_hp = 50.0 * time_health_multiplier(now);
    spawns_per_second * avg_enemy_hp
}
