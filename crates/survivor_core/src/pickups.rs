//! Pooled pickups (XP gems and powerups) and supply crates.

use crate::events::GameEvent;
use crate::math::Vec2;
use crate::pool::{Handle, Pool};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Gems are collected inside this distance.
pub const GEM_COLLECT_DIST: f32 = 20.0;
/// Magnetized gems fly at this speed, world units per second.
pub const GEM_MAGNET_SPEED: f32 = 400.0;
/// Powerups are collected inside this distance.
pub const POWERUP_COLLECT_DIST: f32 = 40.0;
/// Heal powerup restores this much health.
pub const HEAL_AMOUNT: f32 = 30.0;
/// Damage buff powerup multiplier.
pub const BUFF_FACTOR: f32 = 1.2;
/// Damage buff duration, in ms.
pub const BUFF_DURATION_MS: u64 = 10_000;
/// Crate collision radius.
pub const CRATE_RADIUS: f32 = 30.0;

/// What a pickup does when collected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    /// XP gem.
    Gem {
        /// XP granted.
        value: u64,
    },
    /// Flat heal.
    Heal {
        /// Health restored.
        amount: f32,
    },
    /// Boss drop: restore all health.
    FullHeal,
    /// Magnetize every gem on the field.
    Vacuum,
    /// Temporary damage multiplier.
    DamageBuff,
}

/// A pooled pickup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    /// World position.
    pub position: Vec2,
    /// Effect on collection.
    pub kind: PickupKind,
    /// Gems fly to the player once magnetized.
    pub magnetized: bool,
}

/// A destructible supply crate. Shot like an enemy; drops a powerup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCrate {
    /// World position.
    pub position: Vec2,
    /// Crates break on any hit, but track health for the damage path.
    pub health: f32,
}

/// Roll the powerup a broken crate drops.
pub fn roll_powerup(rng: &mut SimRng) -> PickupKind {
    match rng.next_index(3) {
        0 => PickupKind::Heal {
            amount: HEAL_AMOUNT,
        },
        1 => PickupKind::Vacuum,
        _ => PickupKind::DamageBuff,
    }
}

/// Break a crate: release it, announce it, and drop its powerup.
pub(crate) fn break_crate(
    crates: &mut Pool<SupplyCrate>,
    pickups: &mut Pool<Pickup>,
    rng: &mut SimRng,
    handle: Handle,
    events: &mut Vec<GameEvent>,
) {
    let Some(broken) = crates.release(handle) else {
        return;
    };
    events.push(GameEvent::CrateDestroyed {
        position: broken.position,
    });
    if let Err(err) = pickups.acquire(Pickup {
        position: broken.position,
        kind: roll_powerup(rng),
        magnetized: false,
    }) {
        tracing::debug!(%err, "powerup dropped");
    }
}

/// Advance magnet motion and collect pickups in range.
///
/// Gems magnetize inside `pickup_range`, then fly at the player and are
/// collected up close. Powerups are collected on contact. Returns the
/// collected kinds in slot order.
pub fn update_pickups(
    pickups: &mut Pool<Pickup>,
    player_pos: Vec2,
    pickup_range: f32,
    dt_ms: f32,
) -> Vec<PickupKind> {
    let mut collected = Vec::new();
    let mut done = Vec::new();
    let range_sq = pickup_range * pickup_range;
    let dt_s = dt_ms / 1_000.0;

    for (handle, pickup) in pickups.iter_mut() {
        match pickup.kind {
            PickupKind::Gem { .. } => {
                if !pickup.magnetized
                    && pickup.position.distance_squared(player_pos) < range_sq
                {
                    pickup.magnetized = true;
                }
                if pickup.magnetized {
                    let dir = (player_pos - pickup.position).normalize();
                    pickup.position = pickup.position + dir * (GEM_MAGNET_SPEED * dt_s);
                }
                if pickup.position.distance_squared(player_pos)
                    < GEM_COLLECT_DIST * GEM_COLLECT_DIST
                {
                    collected.push(pickup.kind);
                    done.push(handle);
                }
            }
            _ => {
                if pickup.position.distance_squared(player_pos)
                    < POWERUP_COLLECT_DIST * POWERUP_COLLECT_DIST
                {
                    collected.push(pickup.kind);
                    done.push(handle);
                }
            }
        }
    }

    for handle in done {
        pickups.release(handle);
    }
    collected
}

/// Magnetize every gem on the field (Vacuum powerup).
pub fn magnetize_all(pickups: &mut Pool<Pickup>) {
    for (_, pickup) in pickups.iter_mut() {
        if matches!(pickup.kind, PickupKind::Gem { .. }) {
            pickup.magnetized = true;
        }
    }
}
