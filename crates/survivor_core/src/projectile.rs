//! Pooled projectiles: motion, homing, and hit payloads.
//!
//! Collision resolution lives in the simulation tick (it needs the enemy
//! pool and the player); this module owns the projectile data and its
//! motion step.

use crate::math::{rotate_towards, Vec2};
use crate::pool::Handle;
use serde::{Deserialize, Serialize};

/// Default projectile speed, world units per second.
pub const DEFAULT_SHOT_SPEED: f32 = 600.0;
/// Homing projectiles re-acquire targets inside this radius.
pub const HOMING_RADIUS: f32 = 400.0;
/// Homing turn rate, radians per second.
pub const HOMING_TURN_RATE: f32 = 6.0;
/// Projectile collision radius.
pub const PROJECTILE_RADIUS: f32 = 8.0;
/// Projectiles despawn beyond this distance from the player.
pub const DESPAWN_DISTANCE: f32 = 2_000.0;
/// Splash damage fraction of the direct hit.
pub const SPLASH_DAMAGE_FACTOR: f32 = 0.5;

/// Everything needed to spawn one projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotSpec {
    /// Damage per hit.
    pub damage: f32,
    /// Speed in world units per second.
    pub speed: f32,
    /// Enemies the shot can pass through.
    pub pierce: u32,
    /// Lifetime in ms.
    pub lifetime_ms: u64,
    /// Splash radius applied when the shot is consumed by its last hit.
    pub splash_radius: f32,
    /// Stun on hit, in ms.
    pub stun_ms: u64,
    /// Burn stacks applied on hit.
    pub burn_stacks: u32,
    /// Steers toward the nearest enemy in flight.
    pub homing: bool,
    /// Fired by an enemy at the player.
    pub hostile: bool,
    /// Presentation tint.
    pub color: u32,
}

impl Default for ShotSpec {
    fn default() -> Self {
        Self {
            damage: 0.0,
            speed: DEFAULT_SHOT_SPEED,
            pierce: 1,
            lifetime_ms: 1_000,
            splash_radius: 0.0,
            stun_ms: 0,
            burn_stacks: 0,
            homing: false,
            hostile: false,
            color: 0xffff_ffff,
        }
    }
}

/// A live projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// World position.
    pub position: Vec2,
    /// Flight angle, radians.
    pub angle: f32,
    /// Parameters it was fired with.
    pub spec: ShotSpec,
    /// Pierce hits remaining.
    pub pierce_left: u32,
    /// Expires at this time.
    pub expires_at: u64,
    /// Enemies already struck; a piercing shot hits each enemy once.
    pub already_hit: Vec<Handle>,
}

impl Projectile {
    /// Spawn at `origin` flying along `angle`.
    #[must_use]
    pub fn fire(origin: Vec2, angle: f32, spec: ShotSpec, now: u64) -> Self {
        Self {
            position: origin,
            angle,
            pierce_left: spec.pierce.max(1),
            expires_at: now + spec.lifetime_ms,
            already_hit: Vec::new(),
            spec,
        }
    }

    /// Advance one tick of flight. `homing_target` is the position to
    /// steer toward, when the shot homes and a target exists.
    pub fn motion_tick(&mut self, dt_ms: f32, homing_target: Option<Vec2>) {
        let dt_s = dt_ms / 1_000.0;
        if self.spec.homing {
            if let Some(target) = homing_target {
                let desired = self.position.angle_to(target);
                self.angle = rotate_towards(self.angle, desired, HOMING_TURN_RATE * dt_s);
            }
        }
        self.position = self.position + Vec2::from_angle(self.angle) * (self.spec.speed * dt_s);
    }

    /// Register a hit. Returns true if the projectile is spent.
    pub fn register_hit(&mut self, target: Handle) -> bool {
        self.already_hit.push(target);
        self.pierce_left = self.pierce_left.saturating_sub(1);
        self.pierce_left == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_follows_angle() {
        let mut shot = Projectile::fire(Vec2::ZERO, 0.0, ShotSpec::default(), 0);
        shot.motion_tick(1_000.0, None);
        assert!((shot.position.x - DEFAULT_SHOT_SPEED).abs() < 1e-3);
        assert!(shot.position.y.abs() < 1e-3);
    }

    #[test]
    fn test_homing_turns_gradually() {
        let spec = ShotSpec {
            homing: true,
            ..ShotSpec::default()
        };
        let mut shot = Projectile::fire(Vec2::ZERO, 0.0, spec, 0);
        // Target is straight up; one short tick cannot turn 90 degrees
        shot.motion_tick(50.0, Some(Vec2::new(0.0, 500.0)));
        assert!(shot.angle > 0.0);
        assert!(shot.angle < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_pierce_consumption() {
        let spec = ShotSpec {
            pierce: 2,
            ..ShotSpec::default()
        };
        let mut shot = Projectile::fire(Vec2::ZERO, 0.0, spec, 0);
        let mut pool: crate::pool::Pool<u8> = crate::pool::Pool::new("t", 2);
        let a = pool.acquire(0).unwrap();
        let b = pool.acquire(0).unwrap();

        assert!(!shot.register_hit(a));
        assert!(shot.register_hit(b));
        assert!(shot.already_hit.contains(&a));
    }
}
