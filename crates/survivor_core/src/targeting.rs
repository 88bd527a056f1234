//! Target selection for aimed weapons.
//!
//! Selection is nearest-first with a strict `<` comparison, so on an exact
//! distance tie the first candidate seen wins. Candidates are visited in
//! the pool's ascending slot-index order, which makes tie-breaks stable
//! across runs.

use crate::enemy::EnemyInstance;
use crate::math::Vec2;
use crate::pickups::SupplyCrate;
use crate::pool::{Handle, Pool};

/// Nearest targetable enemy within `max_range` of `origin`.
#[must_use]
pub fn nearest_enemy(
    enemies: &Pool<EnemyInstance>,
    origin: Vec2,
    max_range: f32,
) -> Option<(Handle, Vec2)> {
    nearest_enemy_excluding(enemies, origin, max_range, &[])
}

/// Nearest targetable enemy within range, skipping `excluded` handles.
///
/// Used by chain lightning so a bolt never revisits an enemy it already
/// hit in the same activation.
#[must_use]
pub fn nearest_enemy_excluding(
    enemies: &Pool<EnemyInstance>,
    origin: Vec2,
    max_range: f32,
    excluded: &[Handle],
) -> Option<(Handle, Vec2)> {
    let mut best: Option<(Handle, Vec2)> = None;
    let mut best_dist_sq = max_range * max_range;

    for (handle, enemy) in enemies.iter() {
        if !enemy.is_targetable() || excluded.contains(&handle) {
            continue;
        }
        let dist_sq = origin.distance_squared(enemy.position);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some((handle, enemy.position));
        }
    }
    best
}

/// All targetable enemies within `max_range` of `origin`.
#[must_use]
pub fn enemies_in_range(
    enemies: &Pool<EnemyInstance>,
    origin: Vec2,
    max_range: f32,
) -> Vec<(Handle, Vec2)> {
    let range_sq = max_range * max_range;
    enemies
        .iter()
        .filter(|(_, e)| e.is_targetable())
        .filter(|(_, e)| origin.distance_squared(e.position) < range_sq)
        .map(|(h, e)| (h, e.position))
        .collect()
}

/// Nearest supply crate within `max_range` of `origin`.
///
/// Crates share the candidate lists of instant-hit weapons, so a
/// melee-only loadout can still open them.
#[must_use]
pub fn nearest_crate(
    crates: &Pool<SupplyCrate>,
    origin: Vec2,
    max_range: f32,
) -> Option<(Handle, Vec2)> {
    let mut best: Option<(Handle, Vec2)> = None;
    let mut best_dist_sq = max_range * max_range;

    for (handle, c) in crates.iter() {
        let dist_sq = origin.distance_squared(c.position);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some((handle, c.position));
        }
    }
    best
}
