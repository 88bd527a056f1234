//! The weapon firing library: one algorithm per archetype.
//!
//! `run_firing` walks the loadout once per tick, fires every weapon whose
//! cooldown elapsed, and stamps the next fire time. Work that lands later
//! (staggered shots, chain hops, beam ticks, sweep swings) goes through
//! the task queue; everything here validates its owner when it executes,
//! so a weapon removed mid-flight silently cancels its leftovers.

use crate::data::weapon_data::{Archetype, WeaponStats};
use crate::enemy::{damage_enemy, EnemyInstance};
use crate::error::CoreError;
use crate::events::GameEvent;
use crate::math::{angle_diff, deg_to_rad, ease_out_cubic, Vec2};
use crate::pickups::{break_crate, Pickup, SupplyCrate};
use crate::player::Player;
use crate::pool::{Handle, Pool};
use crate::projectile::{Projectile, ShotSpec, DEFAULT_SHOT_SPEED};
use crate::rng::SimRng;
use crate::schedule::{TaskPayload, TaskQueue};
use crate::targeting::{enemies_in_range, nearest_crate, nearest_enemy, nearest_enemy_excluding};
use crate::weapons::{CompanionPhase, CompanionState, Loadout, FLAME_PARTICLES};

/// Direct projectiles pick targets out to range times this.
pub const PROJECTILE_TARGET_RANGE_MULT: f32 = 1.5;
/// Shotguns pick targets out to range times this.
pub const SHOTGUN_TARGET_RANGE_MULT: f32 = 1.2;
/// Gap between staggered burst shots, in ms.
pub const BURST_STAGGER_MS: u64 = 50;
/// Shotgun pellet speed.
pub const SHOTGUN_PELLET_SPEED: f32 = 1_500.0;
/// Melee swings aim at targets out to range times this.
pub const MELEE_TARGET_RANGE_MULT: f32 = 1.5;
/// Melee reach margin beyond the listed range.
pub const MELEE_RANGE_MARGIN: f32 = 40.0;
/// Melee cone tolerance beyond the listed arc, in radians.
pub const MELEE_CONE_TOLERANCE: f32 = 0.2;
/// Melee knockback distance.
pub const MELEE_KNOCKBACK: f32 = 30.0;
/// Aura slows last this long per pulse, in ms.
pub const AURA_SLOW_MS: u64 = 1_000;
/// Flamethrower particle spray half-angle, degrees.
pub const FLAME_SPREAD_DEG: f32 = 30.0;
/// Flamethrower particle base speed.
pub const FLAME_SPEED: f32 = 400.0;
/// Flamethrower particle lifetime, in ms.
pub const FLAME_LIFETIME_MS: u64 = 600;
/// Burn stacks per flame particle hit.
pub const FLAME_BURN_STACKS: u32 = 1;
/// Gap between chain lightning hops, in ms.
pub const CHAIN_HOP_MS: u64 = 50;
/// Base chain hop search radius.
pub const CHAIN_HOP_RADIUS: f32 = 300.0;
/// Extra hop radius per weapon level.
pub const CHAIN_HOP_RADIUS_PER_LEVEL: f32 = 50.0;
/// Beam range ramp-up time, in ms.
pub const BEAM_RAMP_MS: u64 = 300;
/// Guardian shield action threshold: player health ratio.
pub const GUARDIAN_SHIELD_THRESHOLD: f32 = 0.4;
/// Guardian shield action cooldown, in ms.
pub const GUARDIAN_SHIELD_COOLDOWN_MS: u64 = 30_000;
/// Guardian push trigger radius.
pub const GUARDIAN_PUSH_RADIUS: f32 = 150.0;
/// Guardian push knockback distance.
pub const GUARDIAN_PUSH_KNOCKBACK: f32 = 300.0;
/// Guardian push stun, in ms.
pub const GUARDIAN_PUSH_STUN_MS: u64 = 300;
/// Guardian push animation window, in ms.
pub const GUARDIAN_PUSH_BUSY_MS: u64 = 400;
/// Guardian push action cooldown, in ms.
pub const GUARDIAN_PUSH_COOLDOWN_MS: u64 = 1_500;
/// Guardian sweep action cooldown, in ms.
pub const GUARDIAN_SWEEP_COOLDOWN_MS: u64 = 1_000;
/// Gap between the two sweep swings, in ms.
pub const SWEEP_SECOND_SWING_MS: u64 = 250;
/// Arc width of one sweep swing, radians.
pub const SWEEP_ARC: f32 = std::f32::consts::PI * 0.8;

/// World access the firing algorithms need.
pub(crate) struct FireCtx<'a> {
    pub now: u64,
    pub rng: &'a mut SimRng,
    pub enemies: &'a mut Pool<EnemyInstance>,
    pub projectiles: &'a mut Pool<Projectile>,
    pub crates: &'a mut Pool<SupplyCrate>,
    pub pickups: &'a mut Pool<Pickup>,
    pub tasks: &'a mut TaskQueue,
    pub events: &'a mut Vec<GameEvent>,
}

impl FireCtx<'_> {
    /// Spawn a projectile, dropping it on pool exhaustion.
    pub(crate) fn spawn_shot(&mut self, origin: Vec2, angle: f32, spec: ShotSpec) {
        if let Err(err) = self
            .projectiles
            .acquire(Projectile::fire(origin, angle, spec, self.now))
        {
            tracing::trace!(%err, "shot dropped");
        }
    }

    /// Break every crate inside `reach`, optionally limited to an arc
    /// around a bearing.
    fn smash_crates(&mut self, origin: Vec2, reach: f32, arc: Option<(f32, f32)>) {
        let reach_sq = reach * reach;
        let hits: Vec<Handle> = self
            .crates
            .iter()
            .filter(|(_, c)| origin.distance_squared(c.position) < reach_sq)
            .filter(|(_, c)| match arc {
                Some((bearing, half_arc)) => {
                    angle_diff(bearing, origin.angle_to(c.position)) <= half_arc
                }
                None => true,
            })
            .map(|(h, _)| h)
            .collect();
        for handle in hits {
            break_crate(self.crates, self.pickups, self.rng, handle, self.events);
        }
    }
}

/// Nearest strike point among enemies and crates. An enemy wins an exact
/// distance tie.
fn nearest_strike_point(ctx: &FireCtx, origin: Vec2, max_range: f32) -> Option<Vec2> {
    let enemy = nearest_enemy(ctx.enemies, origin, max_range).map(|(_, pos)| pos);
    let crate_pos = nearest_crate(ctx.crates, origin, max_range).map(|(_, pos)| pos);
    match (enemy, crate_pos) {
        (Some(e), Some(c)) => {
            if origin.distance_squared(c) < origin.distance_squared(e) {
                Some(c)
            } else {
                Some(e)
            }
        }
        (some, None) => some,
        (None, some) => some,
    }
}

/// Fire every ready weapon. Returns kills landed by instant-hit weapons.
pub(crate) fn run_firing(ctx: &mut FireCtx, player: &mut Player, loadout: &mut Loadout) -> u32 {
    let mut kills = 0;

    for idx in 0..loadout.weapons.len() {
        let weapon = &loadout.weapons[idx];
        if ctx.now < weapon.next_fire_at {
            continue;
        }
        let key = weapon.key.clone();
        let archetype = weapon.archetype;
        let level = weapon.level;
        let cooldown_ms = weapon.effective_cooldown_ms(&player.stats);

        // Work from a snapshot with the damage modifier folded in.
        let mut stats = weapon.stats.clone();
        stats.damage *= player.stats.damage_mult;
        stats.push_damage *= player.stats.damage_mult;

        let origin = player.position;
        let fired = match archetype {
            Archetype::Projectile => fire_projectile(ctx, origin, &key, &stats),
            Archetype::Multishot => fire_multishot(ctx, origin, &key, &stats),
            Archetype::Melee => {
                let (fired, melee_kills) = fire_melee(ctx, origin, player.aim_fallback, &stats);
                kills += melee_kills;
                fired
            }
            Archetype::Aura => {
                let (fired, aura_kills) = fire_aura(ctx, origin, &stats);
                kills += aura_kills;
                fired
            }
            Archetype::Flamethrower => {
                fire_flamethrower(ctx, origin, player.aim_fallback, &stats)
            }
            Archetype::ChainLightning => {
                let (fired, chain_kills) = fire_chain(ctx, origin, &key, &stats, level);
                kills += chain_kills;
                fired
            }
            Archetype::Shotgun => fire_shotgun(ctx, origin, &stats),
            Archetype::Beam => fire_beam(ctx, origin, &key, &stats, level),
            Archetype::Guardian => {
                let (fired, guardian_kills) = fire_guardian(ctx, player, &key, &stats);
                kills += guardian_kills;
                fired
            }
        };

        if fired {
            loadout.weapons[idx].next_fire_at = ctx.now + cooldown_ms as u64;
        } else {
            tracing::trace!(weapon = %key, error = %CoreError::NoValidTarget, "held fire");
        }
    }

    kills
}

fn aimed_shot_spec(stats: &WeaponStats, speed: f32, lifetime_ms: u64) -> ShotSpec {
    ShotSpec {
        damage: stats.damage,
        speed,
        pierce: stats.pierce,
        lifetime_ms,
        splash_radius: stats.splash_radius,
        stun_ms: stats.stun_ms as u64,
        burn_stacks: 0,
        homing: false,
        hostile: false,
        color: stats.color,
    }
}

fn jitter(rng: &mut SimRng, inaccuracy_deg: f32) -> f32 {
    if inaccuracy_deg <= 0.0 {
        return 0.0;
    }
    deg_to_rad(rng.next_range(-inaccuracy_deg, inaccuracy_deg))
}

/// Direct projectile burst. Shot 0 fires immediately, the rest arrive on
/// the stagger timer.
fn fire_projectile(ctx: &mut FireCtx, origin: Vec2, key: &str, stats: &WeaponStats) -> bool {
    let Some((_, target_pos)) = nearest_enemy(
        ctx.enemies,
        origin,
        stats.range * PROJECTILE_TARGET_RANGE_MULT,
    ) else {
        return false;
    };

    let base_angle = origin.angle_to(target_pos);
    let lifetime = (stats.range / DEFAULT_SHOT_SPEED * 1_000.0) as u64;
    let count = stats.count.max(1);
    let spec = aimed_shot_spec(stats, DEFAULT_SHOT_SPEED, lifetime);

    for i in 0..count {
        let step = (i as f32 - (count as f32 - 1.0) / 2.0) * deg_to_rad(stats.spread_deg);
        let angle = base_angle + step + jitter(ctx.rng, stats.inaccuracy_deg);
        if i == 0 {
            ctx.spawn_shot(origin, angle, spec.clone());
        } else {
            ctx.tasks.push(
                ctx.now + u64::from(i) * BURST_STAGGER_MS,
                TaskPayload::StaggeredShot {
                    weapon: key.to_string(),
                    angle,
                    spec: spec.clone(),
                },
            );
        }
    }
    true
}

/// Homing fan. All missiles launch at once, spread around the target
/// bearing, then steer in flight. Crates count as targets so the fan can
/// open one with no enemies near.
fn fire_multishot(ctx: &mut FireCtx, origin: Vec2, _key: &str, stats: &WeaponStats) -> bool {
    let Some(target_pos) = nearest_strike_point(ctx, origin, stats.range) else {
        return false;
    };

    let base_angle = origin.angle_to(target_pos);
    let lifetime = (stats.range / DEFAULT_SHOT_SPEED * 1_000.0 * 2.0) as u64;
    let count = stats.count.max(1);
    let mut spec = aimed_shot_spec(stats, DEFAULT_SHOT_SPEED, lifetime);
    spec.homing = true;

    for i in 0..count {
        let offset = (i as f32 - (count as f32 - 1.0) / 2.0) * deg_to_rad(stats.spread_deg);
        ctx.spawn_shot(origin, base_angle + offset, spec.clone());
    }
    true
}

/// Instant cone strike with knockback. Aims at the nearest target inside
/// an extended search range, or along the aim fallback with nothing
/// around; the swing itself always happens, so a whiff still consumes
/// the cooldown.
fn fire_melee(
    ctx: &mut FireCtx,
    origin: Vec2,
    aim_fallback: Vec2,
    stats: &WeaponStats,
) -> (bool, u32) {
    let search = stats.range * MELEE_TARGET_RANGE_MULT;
    let bearing = match nearest_strike_point(ctx, origin, search) {
        Some(pos) => origin.angle_to(pos),
        None => aim_fallback.y.atan2(aim_fallback.x),
    };

    let reach = stats.range + MELEE_RANGE_MARGIN;
    let half_arc = deg_to_rad(stats.spread_deg) / 2.0 + MELEE_CONE_TOLERANCE;
    let mut kills = 0;

    for (handle, pos) in enemies_in_range(ctx.enemies, origin, reach) {
        if angle_diff(bearing, origin.angle_to(pos)) > half_arc {
            continue;
        }
        if damage_enemy(ctx.enemies, handle, stats.damage, false, ctx.now, ctx.events) {
            kills += 1;
        } else if let Some(enemy) = ctx.enemies.get_mut(handle) {
            let away = (pos - origin).normalize();
            enemy.position = enemy.position + away * MELEE_KNOCKBACK;
        }
    }
    ctx.smash_crates(origin, reach, Some((bearing, half_arc)));
    (true, kills)
}

/// Radial pulse around the player. Fires even with nothing in range.
fn fire_aura(ctx: &mut FireCtx, origin: Vec2, stats: &WeaponStats) -> (bool, u32) {
    let mut kills = 0;
    for (handle, _) in enemies_in_range(ctx.enemies, origin, stats.range) {
        if damage_enemy(ctx.enemies, handle, stats.damage, false, ctx.now, ctx.events) {
            kills += 1;
        } else if stats.slow_factor > 0.0 {
            if let Some(enemy) = ctx.enemies.get_mut(handle) {
                enemy
                    .status
                    .apply_slow(ctx.now, stats.slow_factor, AURA_SLOW_MS);
            }
        }
    }
    (true, kills)
}

/// Short-lived spray of burning particles toward the nearest enemy, or
/// along the aim fallback when nothing is in range.
fn fire_flamethrower(
    ctx: &mut FireCtx,
    origin: Vec2,
    aim_fallback: Vec2,
    stats: &WeaponStats,
) -> bool {
    let base_angle = match nearest_enemy(ctx.enemies, origin, stats.range) {
        Some((_, pos)) => origin.angle_to(pos),
        None => aim_fallback.y.atan2(aim_fallback.x),
    };

    for _ in 0..FLAME_PARTICLES {
        let angle = base_angle + jitter(ctx.rng, FLAME_SPREAD_DEG);
        let speed = FLAME_SPEED * ctx.rng.next_range(0.8, 1.2);
        let spec = ShotSpec {
            damage: stats.damage,
            speed,
            pierce: stats.pierce,
            lifetime_ms: FLAME_LIFETIME_MS,
            burn_stacks: FLAME_BURN_STACKS,
            color: stats.color,
            ..ShotSpec::default()
        };
        ctx.spawn_shot(origin, angle, spec);
    }
    true
}

/// First strike of a chain lightning activation; later hops arrive via
/// the task queue.
fn fire_chain(
    ctx: &mut FireCtx,
    origin: Vec2,
    key: &str,
    stats: &WeaponStats,
    level: u32,
) -> (bool, u32) {
    let Some((first, first_pos)) = nearest_enemy(ctx.enemies, origin, stats.range) else {
        return (false, 0);
    };

    let stun_ms = stats.stun_ms as u64;
    let mut kills = 0;
    if strike_chain_target(ctx, first, stats.damage, stun_ms) {
        kills += 1;
    }

    let hops_left = stats.count.max(1) - 1;
    if hops_left > 0 {
        let radius = CHAIN_HOP_RADIUS + CHAIN_HOP_RADIUS_PER_LEVEL * (level.saturating_sub(1)) as f32;
        ctx.tasks.push(
            ctx.now + CHAIN_HOP_MS,
            TaskPayload::ChainHop {
                weapon: key.to_string(),
                from: first_pos,
                visited: vec![first],
                hops_left,
                radius,
                damage: stats.damage,
                stun_ms,
            },
        );
    }
    (true, kills)
}

fn strike_chain_target(ctx: &mut FireCtx, handle: Handle, damage: f32, stun_ms: u64) -> bool {
    let killed = damage_enemy(ctx.enemies, handle, damage, false, ctx.now, ctx.events);
    if !killed && stun_ms > 0 {
        if let Some(enemy) = ctx.enemies.get_mut(handle) {
            enemy.status.apply_stun(ctx.now, stun_ms);
        }
    }
    killed
}

/// Execute one due chain hop and schedule the next.
pub(crate) fn chain_hop(
    ctx: &mut FireCtx,
    weapon: &str,
    from: Vec2,
    mut visited: Vec<Handle>,
    hops_left: u32,
    radius: f32,
    damage: f32,
    stun_ms: u64,
) -> u32 {
    let Some((next, next_pos)) = nearest_enemy_excluding(ctx.enemies, from, radius, &visited)
    else {
        return 0;
    };

    let mut kills = 0;
    if strike_chain_target(ctx, next, damage, stun_ms) {
        kills += 1;
    }
    visited.push(next);

    if hops_left > 1 {
        ctx.tasks.push(
            ctx.now + CHAIN_HOP_MS,
            TaskPayload::ChainHop {
                weapon: weapon.to_string(),
                from: next_pos,
                visited,
                hops_left: hops_left - 1,
                radius,
                damage,
                stun_ms,
            },
        );
    }
    kills
}

/// Even fan of fast pellets toward the nearest enemy.
fn fire_shotgun(ctx: &mut FireCtx, origin: Vec2, stats: &WeaponStats) -> bool {
    let Some((_, target_pos)) = nearest_enemy(
        ctx.enemies,
        origin,
        stats.range * SHOTGUN_TARGET_RANGE_MULT,
    ) else {
        return false;
    };

    let base_angle = origin.angle_to(target_pos);
    let lifetime = (stats.range / SHOTGUN_PELLET_SPEED * 1_000.0) as u64;
    let count = stats.count.max(1);
    let total_spread = deg_to_rad(stats.spread_deg);
    let spec = aimed_shot_spec(stats, SHOTGUN_PELLET_SPEED, lifetime);

    for i in 0..count {
        let offset = if count > 1 {
            (i as f32 / (count as f32 - 1.0) - 0.5) * total_spread
        } else {
            0.0
        };
        ctx.spawn_shot(origin, base_angle + offset, spec.clone());
    }
    true
}

/// Lock a beam onto the best target and start its tick chain. The beam
/// only needs some enemy alive anywhere; range gates damage, not firing.
fn fire_beam(ctx: &mut FireCtx, origin: Vec2, key: &str, stats: &WeaponStats, level: u32) -> bool {
    let target = nearest_enemy(ctx.enemies, origin, stats.range)
        .or_else(|| nearest_enemy(ctx.enemies, origin, f32::MAX));
    let Some((_, target_pos)) = target else {
        return false;
    };

    let interval = (stats.tick_interval_ms as u64).max(1);
    ctx.tasks.push(
        ctx.now + interval,
        TaskPayload::BeamTick {
            weapon: key.to_string(),
            angle: origin.angle_to(target_pos),
            started_at: ctx.now,
            ends_at: ctx.now + stats.duration_ms as u64,
            interval_ms: interval,
            range: stats.range,
            width: effective_beam_width(stats.beam_width, level),
            damage: stats.damage,
        },
    );
    true
}

/// Beam width scales with level on top of the width stat.
#[must_use]
pub fn effective_beam_width(base_width: f32, level: u32) -> f32 {
    base_width * (0.2 + 0.2 * level as f32)
}

/// Execute one due beam damage tick, then reschedule until the end time.
///
/// Hit test runs in beam-local coordinates: distance along the beam must
/// be inside `[0, ramped range]` (both ends inclusive) and the lateral
/// offset within the beam's half-width allowance.
pub(crate) fn beam_tick(
    ctx: &mut FireCtx,
    origin: Vec2,
    weapon: &str,
    angle: f32,
    started_at: u64,
    ends_at: u64,
    interval_ms: u64,
    range: f32,
    width: f32,
    damage: f32,
) -> u32 {
    let ramp = ease_out_cubic((ctx.now - started_at) as f32 / BEAM_RAMP_MS as f32);
    let current_range = range * ramp;
    let dir = Vec2::from_angle(angle);
    let perp = Vec2::new(-dir.y, dir.x);
    let lateral_allowance = width / 1.5;

    let hits: Vec<Handle> = ctx
        .enemies
        .iter()
        .filter(|(_, e)| e.is_targetable())
        .filter(|(_, e)| {
            let rel = e.position - origin;
            let along = rel.dot(dir);
            let lateral = rel.dot(perp);
            along >= 0.0 && along <= current_range && lateral.abs() <= lateral_allowance
        })
        .map(|(h, _)| h)
        .collect();

    let mut kills = 0;
    for handle in hits {
        if damage_enemy(ctx.enemies, handle, damage, false, ctx.now, ctx.events) {
            kills += 1;
        }
    }

    if ctx.now + interval_ms <= ends_at {
        ctx.tasks.push(
            ctx.now + interval_ms,
            TaskPayload::BeamTick {
                weapon: weapon.to_string(),
                angle,
                started_at,
                ends_at,
                interval_ms,
                range,
                width,
                damage,
            },
        );
    }
    kills
}

/// Guardian companion AI check. The weapon cooldown only sets how often
/// this runs; each action has its own cooldown on the companion.
fn fire_guardian(
    ctx: &mut FireCtx,
    player: &mut Player,
    key: &str,
    stats: &WeaponStats,
) -> (bool, u32) {
    let origin = player.position;
    let companion = player.companion.get_or_insert_with(CompanionState::default);

    if companion.phase != CompanionPhase::Idle {
        if ctx.now >= companion.busy_until {
            companion.phase = CompanionPhase::Idle;
        } else {
            return (true, 0);
        }
    }
    if ctx.now < companion.next_action_at {
        return (true, 0);
    }

    // Defend first: restore shield when the player is hurting.
    let health_ratio = player.health / player.max_health;
    if health_ratio < GUARDIAN_SHIELD_THRESHOLD && ctx.now >= companion.shield_ready_at {
        companion.phase = CompanionPhase::Shielding;
        companion.busy_until = ctx.now + 800;
        companion.next_action_at = ctx.now + 800;
        companion.shield_ready_at = ctx.now + GUARDIAN_SHIELD_COOLDOWN_MS;
        player.add_shield(stats.shield_restore);
        ctx.events.push(GameEvent::PlayerStats {
            health: player.health,
            max_health: player.max_health,
            shield: player.shield,
            energy: player.energy,
        });
        return (true, 0);
    }

    // Push when enemies crowd in.
    let crowding = enemies_in_range(ctx.enemies, origin, GUARDIAN_PUSH_RADIUS);
    if !crowding.is_empty() {
        companion.phase = CompanionPhase::Pushing;
        companion.busy_until = ctx.now + GUARDIAN_PUSH_BUSY_MS;
        companion.next_action_at = ctx.now + GUARDIAN_PUSH_COOLDOWN_MS;
        let push_damage = stats.push_damage;

        let mut kills = 0;
        for (handle, pos) in crowding {
            if damage_enemy(ctx.enemies, handle, push_damage, false, ctx.now, ctx.events) {
                kills += 1;
            } else if let Some(enemy) = ctx.enemies.get_mut(handle) {
                let away = (pos - origin).normalize();
                enemy.position = enemy.position + away * GUARDIAN_PUSH_KNOCKBACK;
                enemy.status.apply_stun(ctx.now, GUARDIAN_PUSH_STUN_MS);
            }
        }
        return (true, kills);
    }

    // Otherwise sweep: two opposite half-damage arc swings. Crates are
    // valid sweep targets.
    if let Some(nearest_pos) = nearest_strike_point(ctx, origin, stats.range) {
        companion.phase = CompanionPhase::Sweeping;
        companion.busy_until = ctx.now + 2 * SWEEP_SECOND_SWING_MS;
        companion.next_action_at = ctx.now + GUARDIAN_SWEEP_COOLDOWN_MS;

        let bearing = origin.angle_to(nearest_pos);
        let swing_damage = stats.damage / 2.0;
        let kills = sweep_swing(ctx, origin, bearing, stats.range, swing_damage);
        ctx.tasks.push(
            ctx.now + SWEEP_SECOND_SWING_MS,
            TaskPayload::SweepSwing {
                weapon: key.to_string(),
                bearing: bearing + std::f32::consts::PI,
                range: stats.range,
                damage: swing_damage,
            },
        );
        return (true, kills);
    }

    (true, 0)
}

/// Execute one sweep swing: an arc hit around `bearing`.
pub(crate) fn sweep_swing(
    ctx: &mut FireCtx,
    origin: Vec2,
    bearing: f32,
    range: f32,
    damage: f32,
) -> u32 {
    let mut kills = 0;
    for (handle, pos) in enemies_in_range(ctx.enemies, origin, range) {
        if angle_diff(bearing, origin.angle_to(pos)) > SWEEP_ARC / 2.0 {
            continue;
        }
        if damage_enemy(ctx.enemies, handle, damage, false, ctx.now, ctx.events) {
            kills += 1;
        }
    }
    ctx.smash_crates(origin, range, Some((bearing, SWEEP_ARC / 2.0)));
    kills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enemy_data::EnemyTable;
    use crate::data::weapon_data::WeaponTable;
    use crate::enemy::SpawnScaling;

    struct World {
        rng: SimRng,
        enemies: Pool<EnemyInstance>,
        projectiles: Pool<Projectile>,
        crates: Pool<SupplyCrate>,
        pickups: Pool<Pickup>,
        tasks: TaskQueue,
        events: Vec<GameEvent>,
    }

    impl World {
        fn new() -> Self {
            Self {
                rng: SimRng::new(1),
                enemies: Pool::new("enemies", 64),
                projectiles: Pool::new("projectiles", 256),
                crates: Pool::new("crates", 4),
                pickups: Pool::new("pickups", 16),
                tasks: TaskQueue::default(),
                events: Vec::new(),
            }
        }

        fn ctx(&mut self, now: u64) -> FireCtx<'_> {
            FireCtx {
                now,
                rng: &mut self.rng,
                enemies: &mut self.enemies,
                projectiles: &mut self.projectiles,
                crates: &mut self.crates,
                pickups: &mut self.pickups,
                tasks: &mut self.tasks,
                events: &mut self.events,
            }
        }

        fn spawn_crate(&mut self, position: Vec2) -> Handle {
            self.crates
                .acquire(SupplyCrate {
                    position,
                    health: 10.0,
                })
                .unwrap()
        }

        fn spawn_slime(&mut self, position: Vec2) -> Handle {
            self.spawn("slime", position)
        }

        fn spawn_tank(&mut self, position: Vec2) -> Handle {
            self.spawn("tank", position)
        }

        fn spawn(&mut self, kind: &str, position: Vec2) -> Handle {
            let table = EnemyTable::builtin();
            let def = table.get(kind).unwrap();
            self.enemies
                .acquire(EnemyInstance::from_definition(
                    def,
                    position,
                    SpawnScaling::none(),
                ))
                .unwrap()
        }
    }

    fn stats_for(key: &str) -> WeaponStats {
        WeaponTable::builtin().get(key).unwrap().base.clone()
    }

    #[test]
    fn test_projectile_holds_fire_without_target() {
        let mut world = World::new();
        let stats = stats_for("handgun");
        let mut ctx = world.ctx(0);
        assert!(!fire_projectile(&mut ctx, Vec2::ZERO, "handgun", &stats));
        assert_eq!(world.projectiles.active_count(), 0);
    }

    #[test]
    fn test_projectile_burst_staggers_later_shots() {
        let mut world = World::new();
        world.spawn_slime(Vec2::new(200.0, 0.0));
        let mut stats = stats_for("handgun");
        stats.count = 3;

        let mut ctx = world.ctx(0);
        assert!(fire_projectile(&mut ctx, Vec2::ZERO, "handgun", &stats));
        // Shot 0 spawns now; shots 1 and 2 are queued
        assert_eq!(world.projectiles.active_count(), 1);
        assert_eq!(world.tasks.len(), 2);
        assert!(world.tasks.take_due(BURST_STAGGER_MS).len() == 1);
    }

    #[test]
    fn test_melee_cone_hits_and_knocks_back() {
        let mut world = World::new();
        let in_cone = world.spawn_tank(Vec2::new(100.0, 0.0));
        let behind = world.spawn_tank(Vec2::new(-100.0, 0.0));
        let stats = stats_for("broadsword");

        let mut ctx = world.ctx(0);
        let (fired, _) = fire_melee(&mut ctx, Vec2::ZERO, Vec2::new(1.0, 0.0), &stats);
        assert!(fired);

        // Target in the cone was hit and knocked back
        assert_eq!(world.enemies.get(in_cone).unwrap().health, 140.0);
        assert!(world.enemies.get(in_cone).unwrap().position.x > 100.0);
        // The one behind the swing was untouched (120 degree arc)
        assert_eq!(world.enemies.get(behind).unwrap().health, 200.0);
    }

    #[test]
    fn test_melee_swings_at_air_and_consumes_cooldown() {
        let mut world = World::new();
        let stats = stats_for("broadsword");

        // Empty arena: the swing goes out along the aim fallback and
        // still reports fired, so the cooldown advances on a whiff
        let mut ctx = world.ctx(0);
        let (fired, kills) = fire_melee(&mut ctx, Vec2::ZERO, Vec2::new(0.0, 1.0), &stats);
        assert!(fired);
        assert_eq!(kills, 0);
    }

    #[test]
    fn test_melee_aims_beyond_swing_reach() {
        let mut world = World::new();
        // Inside the extended search range but outside the swing reach
        let far = world.spawn_tank(Vec2::new(stats_for("broadsword").range * 1.4, 0.0));
        let stats = stats_for("broadsword");

        let mut ctx = world.ctx(0);
        let (fired, _) = fire_melee(&mut ctx, Vec2::ZERO, Vec2::new(1.0, 0.0), &stats);
        assert!(fired);
        assert_eq!(world.enemies.get(far).unwrap().health, 200.0);
    }

    #[test]
    fn test_melee_opens_crates_in_cone() {
        let mut world = World::new();
        world.spawn_crate(Vec2::new(100.0, 0.0));
        let stats = stats_for("broadsword");

        let mut ctx = world.ctx(0);
        let (fired, _) = fire_melee(&mut ctx, Vec2::ZERO, Vec2::new(1.0, 0.0), &stats);
        assert!(fired);
        assert_eq!(world.crates.active_count(), 0);
        assert_eq!(world.pickups.active_count(), 1);
        assert!(world
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::CrateDestroyed { .. })));
    }

    #[test]
    fn test_multishot_targets_a_lone_crate() {
        let mut world = World::new();
        world.spawn_crate(Vec2::new(200.0, 0.0));
        let stats = stats_for("magic_missile");

        let mut ctx = world.ctx(0);
        assert!(fire_multishot(&mut ctx, Vec2::ZERO, "magic_missile", &stats));
        assert!(world.projectiles.active_count() > 0);
    }

    #[test]
    fn test_aura_pulses_with_no_enemies() {
        let mut world = World::new();
        let stats = stats_for("aura");
        let mut ctx = world.ctx(0);
        let (fired, kills) = fire_aura(&mut ctx, Vec2::ZERO, &stats);
        assert!(fired);
        assert_eq!(kills, 0);
    }

    #[test]
    fn test_aura_slow_applies_at_level_five() {
        let mut world = World::new();
        let enemy = world.spawn_tank(Vec2::new(50.0, 0.0));
        let table = WeaponTable::builtin();
        let def = table.get("aura").unwrap();
        let mut stats = def.base.clone();
        for delta in &def.upgrades {
            stats.apply_delta(delta);
        }

        let mut ctx = world.ctx(0);
        fire_aura(&mut ctx, Vec2::ZERO, &stats);
        let status = &world.enemies.get(enemy).unwrap().status;
        assert_eq!(status.slow_factor, 0.5);
        assert!(status.slow_expires_at > 0);
    }

    #[test]
    fn test_chain_never_revisits() {
        let mut world = World::new();
        let a = world.spawn_slime(Vec2::new(100.0, 0.0));
        let b = world.spawn_slime(Vec2::new(200.0, 0.0));
        let stats = stats_for("chain_lightning");

        let mut ctx = world.ctx(0);
        let (fired, _) = fire_chain(&mut ctx, Vec2::ZERO, "chain_lightning", &stats, 1);
        assert!(fired);
        assert!(world.enemies.get(a).unwrap().health < 20.0);

        // Walk the hop chain by hand
        let due = world.tasks.take_due(CHAIN_HOP_MS);
        let TaskPayload::ChainHop {
            from,
            visited,
            hops_left,
            radius,
            damage,
            stun_ms,
            ..
        } = due[0].payload.clone()
        else {
            panic!("expected a chain hop");
        };
        assert_eq!(visited, vec![a]);

        let mut ctx = world.ctx(CHAIN_HOP_MS);
        chain_hop(
            &mut ctx,
            "chain_lightning",
            from,
            visited,
            hops_left,
            radius,
            damage,
            stun_ms,
        );
        assert!(world.enemies.get(b).unwrap().health < 20.0);

        // Final hop finds nobody new: chain ends without re-striking
        let due = world.tasks.take_due(2 * CHAIN_HOP_MS);
        let TaskPayload::ChainHop {
            from,
            visited,
            hops_left,
            radius,
            damage,
            stun_ms,
            ..
        } = due[0].payload.clone()
        else {
            panic!("expected a chain hop");
        };
        assert_eq!(visited.len(), 2);
        let health_a = world.enemies.get(a).unwrap().health;
        let mut ctx = world.ctx(2 * CHAIN_HOP_MS);
        let kills = chain_hop(
            &mut ctx,
            "chain_lightning",
            from,
            visited,
            hops_left,
            radius,
            damage,
            stun_ms,
        );
        assert_eq!(kills, 0);
        assert_eq!(world.enemies.get(a).unwrap().health, health_a);
        assert!(world.tasks.is_empty());
    }

    #[test]
    fn test_chain_stuns_survivors() {
        let mut world = World::new();
        let tough = {
            let table = EnemyTable::builtin();
            let def = table.get("tank").unwrap();
            world
                .enemies
                .acquire(EnemyInstance::from_definition(
                    def,
                    Vec2::new(100.0, 0.0),
                    SpawnScaling::none(),
                ))
                .unwrap()
        };
        let stats = stats_for("chain_lightning");
        let mut ctx = world.ctx(0);
        fire_chain(&mut ctx, Vec2::ZERO, "chain_lightning", &stats, 1);
        assert!(world.enemies.get(tough).unwrap().status.is_stunned(100));
    }

    #[test]
    fn test_shotgun_fan_is_even() {
        let mut world = World::new();
        world.spawn_slime(Vec2::new(300.0, 0.0));
        let stats = stats_for("shotgun");

        let mut ctx = world.ctx(0);
        assert!(fire_shotgun(&mut ctx, Vec2::ZERO, &stats));
        assert_eq!(world.projectiles.active_count(), 5);

        let mut angles: Vec<f32> = world.projectiles.iter().map(|(_, p)| p.angle).collect();
        angles.sort_by(f32::total_cmp);
        let total = deg_to_rad(stats.spread_deg);
        assert!((angles[4] - angles[0] - total).abs() < 1e-4);
        // Even step between adjacent pellets
        let step = angles[1] - angles[0];
        assert!((angles[2] - angles[1] - step).abs() < 1e-4);
    }

    #[test]
    fn test_beam_boundaries() {
        let mut world = World::new();
        let at_origin = world.spawn_slime(Vec2::ZERO);
        let behind = world.spawn_slime(Vec2::new(-50.0, 0.0));
        let beyond = world.spawn_slime(Vec2::new(800.0, 0.0));
        let stats = stats_for("heavy_cannon");
        let width = effective_beam_width(stats.beam_width, 1);

        // Past the ramp: full range
        let mut ctx = world.ctx(1_000);
        beam_tick(
            &mut ctx,
            Vec2::ZERO,
            "heavy_cannon",
            0.0,
            500,
            2_500,
            200,
            stats.range,
            width,
            stats.damage,
        );

        // Inclusive at distance zero, exclusive behind, out of range spared
        assert!(world.enemies.get(at_origin).unwrap().health < 20.0);
        assert_eq!(world.enemies.get(behind).unwrap().health, 20.0);
        assert_eq!(world.enemies.get(beyond).unwrap().health, 20.0);
        // Tick rescheduled
        assert_eq!(world.tasks.len(), 1);
    }

    #[test]
    fn test_beam_range_ramps_up() {
        let mut world = World::new();
        let far = world.spawn_slime(Vec2::new(650.0, 0.0));
        let stats = stats_for("heavy_cannon");
        let width = effective_beam_width(stats.beam_width, 1);

        // 100ms into a 300ms ramp the beam is still short
        let mut ctx = world.ctx(600);
        beam_tick(
            &mut ctx,
            Vec2::ZERO,
            "heavy_cannon",
            0.0,
            500,
            2_500,
            200,
            stats.range,
            width,
            stats.damage,
        );
        assert_eq!(world.enemies.get(far).unwrap().health, 20.0);

        // Fully ramped it reaches
        let mut ctx = world.ctx(900);
        beam_tick(
            &mut ctx,
            Vec2::ZERO,
            "heavy_cannon",
            0.0,
            500,
            2_500,
            200,
            stats.range,
            width,
            stats.damage,
        );
        assert!(world.enemies.get(far).unwrap().health < 20.0);
    }

    #[test]
    fn test_guardian_shield_action_and_cooldown() {
        let mut world = World::new();
        let mut player = Player::default();
        player.health = 30.0;
        let stats = stats_for("guardian");

        let mut ctx = world.ctx(0);
        fire_guardian(&mut ctx, &mut player, "guardian", &stats);
        assert_eq!(player.shield, stats.shield_restore);
        let companion = player.companion.as_ref().unwrap();
        assert_eq!(companion.phase, CompanionPhase::Shielding);
        assert_eq!(companion.shield_ready_at, GUARDIAN_SHIELD_COOLDOWN_MS);

        // Still hurt, but the shield action is on cooldown and nothing
        // else is in range: companion goes back to waiting
        let mut ctx = world.ctx(1_000);
        fire_guardian(&mut ctx, &mut player, "guardian", &stats);
        assert_eq!(player.shield, stats.shield_restore);
    }

    #[test]
    fn test_guardian_push_clears_crowd() {
        let mut world = World::new();
        let close = world.spawn_tank(Vec2::new(100.0, 0.0));
        let mut player = Player::default();
        let stats = stats_for("guardian");

        let mut ctx = world.ctx(0);
        fire_guardian(&mut ctx, &mut player, "guardian", &stats);
        let enemy = world.enemies.get(close).unwrap();
        assert!(enemy.position.x > 300.0);
        assert!(enemy.status.is_stunned(100));
        assert_eq!(enemy.health, 180.0);
        let companion = player.companion.as_ref().unwrap();
        assert_eq!(companion.phase, CompanionPhase::Pushing);
        assert_eq!(companion.busy_until, GUARDIAN_PUSH_BUSY_MS);
    }

    #[test]
    fn test_guardian_sweeps_at_a_lone_crate() {
        let mut world = World::new();
        world.spawn_crate(Vec2::new(200.0, 0.0));
        let mut player = Player::default();
        let stats = stats_for("guardian");

        let mut ctx = world.ctx(0);
        fire_guardian(&mut ctx, &mut player, "guardian", &stats);
        assert_eq!(
            player.companion.as_ref().unwrap().phase,
            CompanionPhase::Sweeping
        );
        assert_eq!(world.crates.active_count(), 0);
        assert_eq!(world.pickups.active_count(), 1);
    }

    #[test]
    fn test_guardian_sweep_swings_twice_in_opposite_arcs() {
        let mut world = World::new();
        let ahead = world.spawn_slime(Vec2::new(200.0, 0.0));
        let behind = world.spawn_slime(Vec2::new(-200.0, 0.0));
        let mut player = Player::default();
        let stats = stats_for("guardian");

        let mut ctx = world.ctx(0);
        fire_guardian(&mut ctx, &mut player, "guardian", &stats);
        // First swing hits the nearest side at half damage
        assert_eq!(world.enemies.get(ahead).unwrap().health, 20.0 - 25.0);
        assert_eq!(world.enemies.get(behind).unwrap().health, 20.0);

        // Second swing covers the opposite arc
        let due = world.tasks.take_due(SWEEP_SECOND_SWING_MS);
        let TaskPayload::SweepSwing {
            bearing,
            range,
            damage,
            ..
        } = due[0].payload
        else {
            panic!("expected a sweep swing");
        };
        let mut ctx = world.ctx(SWEEP_SECOND_SWING_MS);
        sweep_swing(&mut ctx, Vec2::ZERO, bearing, range, damage);
        assert!(world.enemies.get(behind).unwrap().health < 20.0);
    }
}
