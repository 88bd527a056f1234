//! Weapon instances, the player loadout, and DPS accounting.
//!
//! An instance is a definition reference plus a level and a working stat
//! copy. The working copy at level N always equals the base stats with
//! the deltas for levels 2..=N folded in, in order.

use crate::data::weapon_data::{
    Archetype, WeaponDefinition, WeaponStats, MAX_WEAPON_LEVEL, STANDARD_WEAPONS,
};
use crate::error::{CoreError, Result};
use crate::player::ActorStats;
use serde::{Deserialize, Serialize};

/// Effective cooldowns never drop below this, in ms.
pub const MIN_COOLDOWN_MS: f32 = 50.0;

/// Number of particles per flamethrower activation.
pub const FLAME_PARTICLES: u32 = 4;

/// An equipped weapon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponInstance {
    /// Definition key.
    pub key: String,
    /// Firing behavior, copied from the definition.
    pub archetype: Archetype,
    /// Current level, 1..=5.
    pub level: u32,
    /// Next time this weapon may fire (absolute sim ms).
    pub next_fire_at: u64,
    /// Working stats with all upgrade deltas applied.
    pub stats: WeaponStats,
}

impl WeaponInstance {
    /// Fresh level-1 instance of a definition.
    #[must_use]
    pub fn new(def: &WeaponDefinition) -> Self {
        Self {
            key: def.id.clone(),
            archetype: def.archetype,
            level: 1,
            next_fire_at: 0,
            stats: def.base.clone(),
        }
    }

    /// Build an instance directly at `level` (debug harness).
    pub fn at_level(def: &WeaponDefinition, level: u32) -> Result<Self> {
        if level < 1 || level > MAX_WEAPON_LEVEL {
            return Err(CoreError::InvalidUpgradeLevel {
                weapon: def.id.clone(),
                level,
            });
        }
        let mut instance = Self::new(def);
        for _ in 1..level {
            instance.upgrade(def)?;
        }
        Ok(instance)
    }

    /// Advance one level, folding in the next delta.
    pub fn upgrade(&mut self, def: &WeaponDefinition) -> Result<u32> {
        if self.level >= MAX_WEAPON_LEVEL {
            return Err(CoreError::InvalidUpgradeLevel {
                weapon: self.key.clone(),
                level: self.level + 1,
            });
        }
        let delta_index = (self.level - 1) as usize;
        if let Some(delta) = def.upgrades.get(delta_index) {
            self.stats.apply_delta(delta);
        }
        self.level += 1;
        Ok(self.level)
    }

    /// At the level cap.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        self.level >= MAX_WEAPON_LEVEL
    }

    /// Cooldown after the attack-speed modifier, floored at
    /// [`MIN_COOLDOWN_MS`].
    #[must_use]
    pub fn effective_cooldown_ms(&self, stats: &ActorStats) -> f32 {
        (self.stats.cooldown_ms / stats.attack_speed_mult).max(MIN_COOLDOWN_MS)
    }

    /// Theoretical damage per second this weapon contributes.
    ///
    /// Archetype multipliers: chain lightning counts its hops at half
    /// weight each, aura and melee hit wide enough to count double, a
    /// beam delivers one hit per damage tick for its whole duration.
    #[must_use]
    pub fn dps(&self, stats: &ActorStats) -> f32 {
        let cooldown_s = self.effective_cooldown_ms(stats) / 1_000.0;
        let damage = self.stats.damage * stats.damage_mult;
        let per_activation = match self.archetype {
            Archetype::ChainLightning => damage * (1.0 + self.stats.count as f32 * 0.5),
            Archetype::Aura | Archetype::Melee => damage * 2.0,
            Archetype::Beam => {
                let ticks = if self.stats.tick_interval_ms > 0.0 {
                    self.stats.duration_ms / self.stats.tick_interval_ms
                } else {
                    1.0
                };
                damage * ticks
            }
            Archetype::Flamethrower => damage * FLAME_PARTICLES as f32,
            _ => damage * self.stats.count.max(1) as f32,
        };
        per_activation / cooldown_s
    }
}

/// Burst-mode bookkeeping: the saved loadout comes back when it ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstState {
    /// Weapons to restore after burst.
    pub saved: Vec<WeaponInstance>,
    /// Burst ends at this time.
    pub ends_at: u64,
}

/// Guardian companion phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanionPhase {
    /// Waiting for something to do.
    Idle,
    /// Restoring the player's shield.
    Shielding,
    /// Shoving nearby enemies away.
    Pushing,
    /// Double arc swing.
    Sweeping,
}

/// Guardian companion state machine. The companion tracks the player's
/// position; only its timers live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionState {
    /// Current phase.
    pub phase: CompanionPhase,
    /// While non-Idle, the phase ends at this time.
    pub busy_until: u64,
    /// Next time any action may start.
    pub next_action_at: u64,
    /// The shield action has its own long cooldown.
    pub shield_ready_at: u64,
}

impl Default for CompanionState {
    fn default() -> Self {
        Self {
            phase: CompanionPhase::Idle,
            busy_until: 0,
            next_action_at: 0,
            shield_ready_at: 0,
        }
    }
}

/// The player's equipped weapons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    /// Active weapon instances, in acquisition order.
    pub weapons: Vec<WeaponInstance>,
    /// Present while burst mode is running.
    pub burst: Option<BurstState>,
}

impl Loadout {
    /// Find an active weapon by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&WeaponInstance> {
        self.weapons.iter().find(|w| w.key == key)
    }

    /// Find an active weapon by key, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut WeaponInstance> {
        self.weapons.iter_mut().find(|w| w.key == key)
    }

    /// True if the key is currently equipped (burst loadout included).
    #[must_use]
    pub fn is_equipped(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a weapon. Returns the removed instance, if it existed.
    pub fn remove(&mut self, key: &str) -> Option<WeaponInstance> {
        let index = self.weapons.iter().position(|w| w.key == key)?;
        Some(self.weapons.remove(index))
    }

    /// The weapon set that progression applies to. During burst that is
    /// the saved loadout, so upgrades picked mid-burst are not lost.
    pub fn progression_weapons_mut(&mut self) -> &mut Vec<WeaponInstance> {
        match &mut self.burst {
            Some(burst) => &mut burst.saved,
            None => &mut self.weapons,
        }
    }

    /// The weapon set progression reads from.
    #[must_use]
    pub fn progression_weapons(&self) -> &Vec<WeaponInstance> {
        match &self.burst {
            Some(burst) => &burst.saved,
            None => &self.weapons,
        }
    }

    /// Standard weapon keys still eligible for a level-up offer: not yet
    /// owned, or owned below the level cap.
    #[must_use]
    pub fn offer_candidates(&self) -> Vec<String> {
        let weapons = self.progression_weapons();
        STANDARD_WEAPONS
            .iter()
            .filter(|key| {
                weapons
                    .iter()
                    .find(|w| &w.key == *key)
                    .map_or(true, |w| !w.is_maxed())
            })
            .map(|key| (*key).to_string())
            .collect()
    }

    /// Total theoretical DPS of the active weapons.
    #[must_use]
    pub fn total_dps(&self, stats: &ActorStats) -> f32 {
        self.weapons.iter().map(|w| w.dps(stats)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::weapon_data::WeaponTable;

    #[test]
    fn test_upgrade_composition_matches_fold() {
        let table = WeaponTable::builtin();
        let def = table.get("broadsword").unwrap();
        let mut instance = WeaponInstance::new(def);
        for _ in 0..4 {
            instance.upgrade(def).unwrap();
        }
        assert_eq!(instance.level, 5);
        // 60 +15 +45 +30 damage, 150 +50 range, 120 +240 spread, 900 -150 cd
        assert_eq!(instance.stats.damage, 150.0);
        assert_eq!(instance.stats.range, 200.0);
        assert_eq!(instance.stats.spread_deg, 360.0);
        assert_eq!(instance.stats.cooldown_ms, 750.0);

        let direct = WeaponInstance::at_level(def, 5).unwrap();
        assert_eq!(direct.stats, instance.stats);
    }

    #[test]
    fn test_upgrade_past_cap_errors() {
        let table = WeaponTable::builtin();
        let def = table.get("handgun").unwrap();
        let mut instance = WeaponInstance::at_level(def, 5).unwrap();
        let err = instance.upgrade(def).unwrap_err();
        assert!(matches!(err, CoreError::InvalidUpgradeLevel { .. }));
        // Stats untouched by the rejected upgrade
        assert_eq!(instance.level, 5);
        assert_eq!(instance.stats.damage, 50.0);
    }

    #[test]
    fn test_at_level_rejects_zero_and_six() {
        let table = WeaponTable::builtin();
        let def = table.get("handgun").unwrap();
        assert!(WeaponInstance::at_level(def, 0).is_err());
        assert!(WeaponInstance::at_level(def, 6).is_err());
    }

    #[test]
    fn test_cooldown_floor() {
        let table = WeaponTable::builtin();
        let def = table.get("machine_gun").unwrap();
        let instance = WeaponInstance::new(def);
        let fast = ActorStats {
            attack_speed_mult: 10.0,
            ..ActorStats::default()
        };
        assert_eq!(instance.effective_cooldown_ms(&fast), MIN_COOLDOWN_MS);
    }

    #[test]
    fn test_dps_archetype_multipliers() {
        let table = WeaponTable::builtin();
        let stats = ActorStats::default();

        // Chain lightning: 25 * (1 + 3*0.5) / 1.2s
        let bolt = WeaponInstance::new(table.get("chain_lightning").unwrap());
        assert!((bolt.dps(&stats) - 25.0 * 2.5 / 1.2).abs() < 1e-3);

        // Aura: 8 * 2 / 0.5s
        let aura = WeaponInstance::new(table.get("aura").unwrap());
        assert!((aura.dps(&stats) - 32.0).abs() < 1e-3);

        // Beam: 30 damage * 10 ticks per 6s cooldown
        let beam = WeaponInstance::new(table.get("heavy_cannon").unwrap());
        assert!((beam.dps(&stats) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_offer_candidates_shrink_as_weapons_max() {
        let table = WeaponTable::builtin();
        let mut loadout = Loadout::default();
        assert_eq!(loadout.offer_candidates().len(), STANDARD_WEAPONS.len());

        loadout
            .weapons
            .push(WeaponInstance::at_level(table.get("handgun").unwrap(), 5).unwrap());
        let candidates = loadout.offer_candidates();
        assert_eq!(candidates.len(), STANDARD_WEAPONS.len() - 1);
        assert!(!candidates.contains(&"handgun".to_string()));
    }

    #[test]
    fn test_progression_targets_saved_set_during_burst() {
        let table = WeaponTable::builtin();
        let mut loadout = Loadout {
            weapons: vec![WeaponInstance::new(table.get("overload_vulcan").unwrap())],
            burst: Some(BurstState {
                saved: vec![WeaponInstance::new(table.get("handgun").unwrap())],
                ends_at: 10_000,
            }),
        };
        assert_eq!(loadout.progression_weapons()[0].key, "handgun");
        loadout.progression_weapons_mut()[0]
            .upgrade(table.get("handgun").unwrap())
            .unwrap();
        assert_eq!(loadout.burst.as_ref().unwrap().saved[0].level, 2);
    }
}
