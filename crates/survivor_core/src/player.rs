//! Player state: health, shield, stat modifiers, burst energy.

use crate::math::Vec2;
use crate::weapons::CompanionState;
use serde::{Deserialize, Serialize};

/// Player collision radius in world units.
pub const PLAYER_RADIUS: f32 = 24.0;
/// Shield cap.
pub const MAX_SHIELD: f32 = 100.0;
/// Burst energy cap; burst can be activated at exactly this value.
pub const MAX_ENERGY: u32 = 100;
/// Energy gained per kill.
pub const ENERGY_PER_KILL: u32 = 5;
/// Base pickup (gem magnet) range.
pub const BASE_PICKUP_RANGE: f32 = 150.0;
/// Base movement speed, world units per second.
pub const BASE_MOVE_SPEED: f32 = 250.0;

/// Multiplicative stat modifiers applied on top of weapon stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorStats {
    /// Multiplies weapon damage.
    pub damage_mult: f32,
    /// Divides weapon cooldowns.
    pub attack_speed_mult: f32,
    /// Multiplies movement speed.
    pub move_speed_mult: f32,
    /// Multiplies the gem magnet range.
    pub pickup_range_mult: f32,
}

impl Default for ActorStats {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            attack_speed_mult: 1.0,
            move_speed_mult: 1.0,
            pickup_range_mult: 1.0,
        }
    }
}

/// The player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// World position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Shield absorbs damage before health; floored at zero.
    pub shield: f32,
    /// Stat modifiers.
    pub stats: ActorStats,
    /// Burst energy, 0..=100.
    pub energy: u32,
    /// Aim direction for no-target weapons (melee swings, sprays).
    pub aim_fallback: Vec2,
    /// Movement destination fed by the input layer, if any.
    pub move_target: Option<Vec2>,
    /// Guardian companion, owned by the guardian weapon.
    pub companion: Option<CompanionState>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            health: 100.0,
            max_health: 100.0,
            shield: 0.0,
            stats: ActorStats::default(),
            energy: 0,
            aim_fallback: Vec2::new(1.0, 0.0),
            move_target: None,
            companion: None,
        }
    }
}

impl Player {
    /// Still in the fight.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply incoming damage, shield first. Returns `(absorbed, taken)`.
    pub fn apply_damage(&mut self, amount: f32) -> (f32, f32) {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let taken = amount - absorbed;
        self.health = (self.health - taken).max(0.0);
        (absorbed, taken)
    }

    /// Heal up to max health.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Add shield up to the cap.
    pub fn add_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount).min(MAX_SHIELD);
    }

    /// Add burst energy up to the cap.
    pub fn add_energy(&mut self, amount: u32) {
        self.energy = (self.energy + amount).min(MAX_ENERGY);
    }

    /// Effective gem magnet range.
    #[must_use]
    pub fn pickup_range(&self) -> f32 {
        BASE_PICKUP_RANGE * self.stats.pickup_range_mult
    }

    /// Effective movement speed in world units per second.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        BASE_MOVE_SPEED * self.stats.move_speed_mult
    }

    /// Step toward the movement target, if one is set. Also keeps the aim
    /// fallback pointed along the last direction of travel.
    pub fn movement_tick(&mut self, dt_ms: f32) {
        let Some(target) = self.move_target else {
            return;
        };
        let to_target = target - self.position;
        let step = self.move_speed() * dt_ms / 1_000.0;
        if to_target.length() <= step {
            self.position = target;
            self.move_target = None;
        } else {
            let dir = to_target.normalize();
            self.position = self.position + dir * step;
            self.aim_fallback = dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_absorbs_before_health() {
        let mut player = Player::default();
        player.shield = 30.0;
        let (absorbed, taken) = player.apply_damage(50.0);
        assert_eq!(absorbed, 30.0);
        assert_eq!(taken, 20.0);
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.health, 80.0);
    }

    #[test]
    fn test_shield_fully_soaks_small_hits() {
        let mut player = Player::default();
        player.shield = 50.0;
        let (absorbed, taken) = player.apply_damage(10.0);
        assert_eq!((absorbed, taken), (10.0, 0.0));
        assert_eq!(player.health, 100.0);
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut player = Player::default();
        player.apply_damage(999.0);
        assert_eq!(player.health, 0.0);
        assert!(!player.is_alive());
    }

    #[test]
    fn test_heal_and_shield_caps() {
        let mut player = Player::default();
        player.health = 90.0;
        player.heal(30.0);
        assert_eq!(player.health, 100.0);

        player.add_shield(80.0);
        player.add_shield(80.0);
        assert_eq!(player.shield, MAX_SHIELD);
    }

    #[test]
    fn test_energy_caps_at_max() {
        let mut player = Player::default();
        for _ in 0..30 {
            player.add_energy(ENERGY_PER_KILL);
        }
        assert_eq!(player.energy, MAX_ENERGY);
    }

    #[test]
    fn test_movement_stops_at_target() {
        let mut player = Player::default();
        player.move_target = Some(Vec2::new(100.0, 0.0));
        player.movement_tick(200.0);
        assert!(player.position.x > 0.0);
        assert_eq!(player.aim_fallback, Vec2::new(1.0, 0.0));

        // A huge step lands exactly on the target and clears it
        player.movement_tick(10_000.0);
        assert_eq!(player.position, Vec2::new(100.0, 0.0));
        assert!(player.move_target.is_none());
    }
}
