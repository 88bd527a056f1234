//! The simulation: one struct owning every pool and subsystem, advanced
//! by a fixed-rate tick.
//!
//! Everything is single-threaded and deterministic: same seed, same input
//! script, same run. The embedding layer calls [`Simulation::tick`] at the
//! tick rate, feeds input through the setters, and drains the event list
//! after each tick. Pausing skips the tick body entirely; every deadline
//! in the world is absolute sim time, so nothing drifts while paused.

use crate::data::weapon_data::{MAX_WEAPON_LEVEL, OVERLOAD_WEAPONS};
use crate::data::GameData;
use crate::director::{required_dps, DifficultyDirector, DifficultyTier, DirectorAction};
use crate::director::{roll_enemy_kind, roll_spawn_position};
use crate::enemy::{
    damage_enemy, BehaviorState, DashState, EnemyInstance, BOSS_DASH_MS, BOSS_DASH_SPEED,
    BOSS_TELEGRAPH_MS,
};
use crate::error::{CoreError, Result};
use crate::events::GameEvent;
use crate::firing::{self, FireCtx};
use crate::math::Vec2;
use crate::pickups::{
    break_crate, magnetize_all, update_pickups, Pickup, PickupKind, SupplyCrate, BUFF_DURATION_MS,
    BUFF_FACTOR, CRATE_RADIUS,
};
use crate::player::{Player, ENERGY_PER_KILL, MAX_ENERGY, PLAYER_RADIUS};
use crate::pool::{Handle, Pool};
use crate::progression::{build_offer, ProgressionState, FALLBACK_HEAL};
use crate::projectile::{
    Projectile, ShotSpec, DESPAWN_DISTANCE, HOMING_RADIUS, PROJECTILE_RADIUS,
    SPLASH_DAMAGE_FACTOR,
};
use crate::rng::SimRng;
use crate::schedule::{TaskPayload, TaskQueue};
use crate::targeting::nearest_enemy;
use crate::weapons::{BurstState, Loadout, WeaponInstance};
use serde::{Deserialize, Serialize};

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;
/// Nominal duration of one tick, in ms.
pub const TICK_MS: u64 = 50;
/// Surviving this long wins the run.
pub const VICTORY_TIME_MS: u64 = 600_000;

/// Enemy pool capacity.
pub const ENEMY_POOL_CAPACITY: usize = 1_000;
/// Projectile pool capacity.
pub const PROJECTILE_POOL_CAPACITY: usize = 1_000;
/// Pickup pool capacity.
pub const PICKUP_POOL_CAPACITY: usize = 2_000;
/// Supply crate pool capacity.
pub const CRATE_POOL_CAPACITY: usize = 4;

/// Burst mode duration, in ms.
pub const BURST_DURATION_MS: u64 = 10_000;
/// Burst grants at least this much shield on activation.
pub const BURST_SHIELD: f32 = 50.0;
/// Overload loadout DPS target relative to the saved loadout.
pub const BURST_DPS_MULT: f32 = 2.0;

/// Boss area attacks hit for contact damage times this.
pub const BOSS_AOE_DAMAGE_MULT: f32 = 1.5;
/// Shots per boss volley.
pub const VOLLEY_COUNT: i32 = 5;
/// Lateral spacing between volley aim points, world units.
pub const VOLLEY_SPACING: f32 = 50.0;
/// Volley projectile speed.
pub const VOLLEY_SPEED: f32 = 300.0;
/// Volley projectile lifetime, in ms.
pub const VOLLEY_LIFETIME_MS: u64 = 3_000;

/// Supply crate starting health (any hit breaks it regardless).
pub const CRATE_HEALTH: f32 = 10.0;
/// The weapon key that owns the guardian companion.
pub const GUARDIAN_WEAPON_KEY: &str = "guardian";
/// The weapon every run starts with.
pub const STARTING_WEAPON: &str = "handgun";

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Survived to the victory timer.
    Victory,
    /// Player health reached zero.
    Defeat,
}

/// Balance numbers surfaced for diagnostics output.
#[derive(Debug, Clone, Serialize)]
pub struct SimDiagnostics {
    /// Current sim time, ms.
    pub now_ms: u64,
    /// Total kills so far.
    pub kills: u32,
    /// Player level.
    pub level: u32,
    /// Player health.
    pub player_health: f32,
    /// Live enemies.
    pub active_enemies: usize,
    /// Live projectiles.
    pub active_projectiles: usize,
    /// DPS the current spawn pressure expects.
    pub required_dps: f32,
    /// Theoretical DPS of the active loadout.
    pub loadout_dps: f32,
}

/// The whole combat simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Current sim time, ms. Advances only in `tick`.
    pub now_ms: u64,
    time_scale: f32,
    paused: bool,
    carry_ms: f32,
    rng: SimRng,
    /// Content tables for this run.
    pub data: GameData,
    /// The player.
    pub player: Player,
    /// Equipped weapons.
    pub loadout: Loadout,
    /// Level / XP state.
    pub progression: ProgressionState,
    /// Spawn cadence state.
    pub director: DifficultyDirector,
    enemies: Pool<EnemyInstance>,
    projectiles: Pool<Projectile>,
    pickups: Pool<Pickup>,
    crates: Pool<SupplyCrate>,
    tasks: TaskQueue,
    offer: Option<Vec<String>>,
    /// Total kills this run.
    pub kills: u32,
    /// Set once the run has ended; ticking stops.
    pub outcome: Option<RunOutcome>,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl Simulation {
    /// New run with the built-in content tables.
    #[must_use]
    pub fn new(seed: u64, tier: DifficultyTier) -> Self {
        Self::with_data(seed, tier, GameData::default())
    }

    /// New run with custom content tables.
    #[must_use]
    pub fn with_data(seed: u64, tier: DifficultyTier, data: GameData) -> Self {
        let mut loadout = Loadout::default();
        if let Ok(def) = data.weapons.get(STARTING_WEAPON) {
            loadout.weapons.push(WeaponInstance::new(def));
        }
        Self {
            now_ms: 0,
            time_scale: 1.0,
            paused: false,
            carry_ms: 0.0,
            rng: SimRng::new(seed),
            data,
            player: Player::default(),
            loadout,
            progression: ProgressionState::default(),
            director: DifficultyDirector::new(tier),
            enemies: Pool::new("enemies", ENEMY_POOL_CAPACITY),
            projectiles: Pool::new("projectiles", PROJECTILE_POOL_CAPACITY),
            pickups: Pool::new("pickups", PICKUP_POOL_CAPACITY),
            crates: Pool::new("crates", CRATE_POOL_CAPACITY),
            tasks: TaskQueue::default(),
            offer: None,
            kills: 0,
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Pause or resume. Paused ticks are no-ops.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// True while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Scale how much sim time one tick advances. Clamped to `[0, 10]`.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, 10.0);
    }

    /// Point the player at a movement destination.
    pub fn set_move_target(&mut self, target: Option<Vec2>) {
        self.player.move_target = target;
    }

    /// Set the aim direction used when no target is in range.
    pub fn set_aim_fallback(&mut self, dir: Vec2) {
        if dir.length() > 0.0 {
            self.player.aim_fallback = dir.normalize();
        }
    }

    /// The open level-up offer, if one is awaiting a choice.
    #[must_use]
    pub fn open_offer(&self) -> Option<&[String]> {
        self.offer.as_deref()
    }

    /// Take all events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Balance diagnostics snapshot.
    #[must_use]
    pub fn diagnostics(&self) -> SimDiagnostics {
        SimDiagnostics {
            now_ms: self.now_ms,
            kills: self.kills,
            level: self.progression.level,
            player_health: self.player.health,
            active_enemies: self.enemies.active_count(),
            active_projectiles: self.projectiles.active_count(),
            required_dps: required_dps(self.director.spawn_interval_ms, self.now_ms),
            loadout_dps: self.loadout.total_dps(&self.player.stats),
        }
    }

    /// Serialize the full run state (events excluded).
    pub fn save_snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::DataParse(e.to_string()))
    }

    /// Restore a run from [`Simulation::save_snapshot`] bytes.
    pub fn load_snapshot(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::DataParse(e.to_string()))
    }

    /// Advance the simulation by one tick.
    ///
    /// Sub-millisecond remainders from the time scale carry over to the
    /// next tick, so fractional scales average out exactly.
    pub fn tick(&mut self) {
        if self.paused || self.outcome.is_some() {
            return;
        }
        let scaled = TICK_MS as f32 * self.time_scale + self.carry_ms;
        let step = scaled.floor();
        self.carry_ms = scaled - step;
        if step <= 0.0 {
            return;
        }
        let dt_ms = step;
        self.now_ms += step as u64;
        let now = self.now_ms;

        self.sync_companion();
        self.run_due_tasks(now);
        self.run_director(now);
        self.player.movement_tick(dt_ms);
        self.run_enemies(now, dt_ms);
        self.run_projectiles(now, dt_ms);

        let mut ctx = FireCtx {
            now,
            rng: &mut self.rng,
            enemies: &mut self.enemies,
            projectiles: &mut self.projectiles,
            crates: &mut self.crates,
            pickups: &mut self.pickups,
            tasks: &mut self.tasks,
            events: &mut self.events,
        };
        let kills = firing::run_firing(&mut ctx, &mut self.player, &mut self.loadout);
        self.award_kills(kills);

        self.run_pickups(now, dt_ms);
        if self.progression.pending > 0 && !self.progression.offer_in_progress {
            self.start_offer();
        }

        if !self.player.is_alive() {
            self.finish_run(RunOutcome::Defeat);
        } else if now >= VICTORY_TIME_MS {
            self.finish_run(RunOutcome::Victory);
        }
    }

    /// A companion must belong to an equipped guardian weapon; anything
    /// else is released immediately.
    fn sync_companion(&mut self) {
        if self.player.companion.is_some() && !self.loadout.is_equipped(GUARDIAN_WEAPON_KEY) {
            tracing::debug!(error = %CoreError::OrphanedCompanion, "companion released");
            self.player.companion = None;
        }
    }

    fn run_due_tasks(&mut self, now: u64) {
        let due = self.tasks.take_due(now);
        for task in due {
            match task.payload {
                TaskPayload::StaggeredShot {
                    weapon,
                    angle,
                    spec,
                } => {
                    if self.loadout.is_equipped(&weapon) {
                        let origin = self.player.position;
                        self.fire_ctx(now).spawn_shot(origin, angle, spec);
                    }
                }
                TaskPayload::ChainHop {
                    weapon,
                    from,
                    visited,
                    hops_left,
                    radius,
                    damage,
                    stun_ms,
                } => {
                    if self.loadout.is_equipped(&weapon) {
                        let kills = firing::chain_hop(
                            &mut self.fire_ctx(now),
                            &weapon,
                            from,
                            visited,
                            hops_left,
                            radius,
                            damage,
                            stun_ms,
                        );
                        self.award_kills(kills);
                    }
                }
                TaskPayload::BeamTick {
                    weapon,
                    angle,
                    started_at,
                    ends_at,
                    interval_ms,
                    range,
                    width,
                    damage,
                } => {
                    if self.loadout.is_equipped(&weapon) {
                        let origin = self.player.position;
                        let kills = firing::beam_tick(
                            &mut self.fire_ctx(now),
                            origin,
                            &weapon,
                            angle,
                            started_at,
                            ends_at,
                            interval_ms,
                            range,
                            width,
                            damage,
                        );
                        self.award_kills(kills);
                    }
                }
                TaskPayload::SweepSwing {
                    weapon,
                    bearing,
                    range,
                    damage,
                } => {
                    if self.loadout.is_equipped(&weapon) && self.player.companion.is_some() {
                        let origin = self.player.position;
                        let kills = firing::sweep_swing(
                            &mut self.fire_ctx(now),
                            origin,
                            bearing,
                            range,
                            damage,
                        );
                        self.award_kills(kills);
                    }
                }
                TaskPayload::BossAttackResolve { enemy, target } => {
                    self.resolve_boss_attack(now, enemy, target);
                }
                TaskPayload::BurstEnd => self.end_burst(),
                TaskPayload::BuffExpire { factor } => {
                    self.player.stats.damage_mult /= factor;
                }
            }
        }
    }

    fn fire_ctx(&mut self, now: u64) -> FireCtx<'_> {
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

    fn run_director(&mut self, now: u64) {
        let actions = self.director.poll(
            now,
            self.enemies.active_count(),
            self.crates.active_count(),
        );
        for action in actions {
            match action {
                DirectorAction::SpawnEnemy => self.spawn_enemy(now),
                DirectorAction::SpawnBoss(key) => self.spawn_boss(key),
                DirectorAction::SpawnCrate => self.spawn_crate(),
            }
        }
    }

    fn spawn_enemy(&mut self, now: u64) {
        let kind = roll_enemy_kind(&mut self.rng);
        let Ok(def) = self.data.enemies.get(kind) else {
            tracing::warn!(kind, "enemy definition missing");
            return;
        };
        let scaling = self.director.roll_spawn_scaling(now, &mut self.rng);
        let position = roll_spawn_position(&mut self.rng, self.player.position);
        let instance = EnemyInstance::from_definition(def, position, scaling);
        if let Err(err) = self.enemies.acquire(instance) {
            tracing::debug!(%err, "enemy spawn skipped");
        }
    }

    fn spawn_boss(&mut self, key: &str) {
        let Ok(def) = self.data.enemies.get(key) else {
            tracing::warn!(key, "boss definition missing");
            return;
        };
        let scaling = self.director.boss_spawn_scaling();
        let position = roll_spawn_position(&mut self.rng, self.player.position);
        let instance = EnemyInstance::from_definition(def, position, scaling);
        let max_health = instance.max_health;
        match self.enemies.acquire(instance) {
            Ok(handle) => {
                self.events.push(GameEvent::BossSpawned {
                    enemy: handle,
                    key: key.to_string(),
                    max_health,
                });
            }
            Err(err) => tracing::warn!(%err, key, "boss spawn failed"),
        }
    }

    fn spawn_crate(&mut self) {
        let position = roll_spawn_position(&mut self.rng, self.player.position);
        if let Err(err) = self.crates.acquire(SupplyCrate {
            position,
            health: CRATE_HEALTH,
        }) {
            tracing::debug!(%err, "crate spawn skipped");
        }
    }

    fn run_enemies(&mut self, now: u64, dt_ms: f32) {
        let player_pos = self.player.position;
        let mut burns: Vec<(Handle, f32)> = Vec::new();
        let mut telegraphs: Vec<(Handle, Vec2)> = Vec::new();
        let mut contact_damage = 0.0;
        let mut finished: Vec<Handle> = Vec::new();

        for (handle, enemy) in self.enemies.iter_mut() {
            let status = enemy.status.tick(now);
            let outcome = enemy.behavior_tick(
                now,
                dt_ms,
                player_pos,
                PLAYER_RADIUS,
                status.stunned,
                status.speed_factor,
            );
            if let Some(damage) = status.burn_damage {
                burns.push((handle, damage));
            }
            if outcome.contact_hit {
                contact_damage += enemy.damage;
            }
            if let Some(target) = outcome.telegraph_target {
                telegraphs.push((handle, target));
            }
            if outcome.finished_dying {
                finished.push(handle);
            }
        }

        let mut kills = 0;
        for (handle, damage) in burns {
            if damage_enemy(&mut self.enemies, handle, damage, true, now, &mut self.events) {
                kills += 1;
            }
        }
        self.award_kills(kills);

        for (handle, target) in telegraphs {
            self.tasks.push(
                now + BOSS_TELEGRAPH_MS,
                TaskPayload::BossAttackResolve {
                    enemy: handle,
                    target,
                },
            );
        }

        if contact_damage > 0.0 {
            self.damage_player(contact_damage);
        }

        for handle in finished {
            self.recycle_dead(handle);
        }
    }

    fn recycle_dead(&mut self, handle: Handle) {
        let Some(enemy) = self.enemies.release(handle) else {
            return;
        };
        self.events.push(GameEvent::EnemyDied {
            position: enemy.position,
            xp_value: enemy.xp_value,
            elite: enemy.elite,
        });
        if enemy.xp_value > 0 {
            self.drop_pickup(
                enemy.position,
                PickupKind::Gem {
                    value: enemy.xp_value,
                },
            );
        }
        if enemy.is_boss() {
            self.drop_pickup(enemy.position, PickupKind::FullHeal);
        }
    }

    fn drop_pickup(&mut self, position: Vec2, kind: PickupKind) {
        if let Err(err) = self.pickups.acquire(Pickup {
            position,
            kind,
            magnetized: false,
        }) {
            tracing::debug!(%err, "pickup dropped");
        }
    }

    fn resolve_boss_attack(&mut self, now: u64, handle: Handle, target: Vec2) {
        let Some(enemy) = self.enemies.get_mut(handle) else {
            return;
        };
        if !enemy.is_targetable() {
            return;
        }
        if enemy.state == BehaviorState::Attacking {
            enemy.state = BehaviorState::Active;
        }
        let Some(boss) = enemy.boss.clone() else {
            return;
        };
        let boss_pos = enemy.position;
        let contact_damage = enemy.damage;

        match boss.attack {
            crate::data::BossAttack::Aoe => {
                let range_sq = boss.attack_range * boss.attack_range;
                if self.player.position.distance_squared(boss_pos) <= range_sq {
                    self.damage_player(contact_damage * BOSS_AOE_DAMAGE_MULT);
                }
            }
            crate::data::BossAttack::Dash => {
                let dir = (target - boss_pos).normalize();
                if let Some(enemy) = self.enemies.get_mut(handle) {
                    enemy.dash = Some(DashState {
                        velocity: dir * BOSS_DASH_SPEED,
                        until: now + BOSS_DASH_MS,
                    });
                }
            }
            crate::data::BossAttack::Volley => {
                let dir = (target - boss_pos).normalize();
                let perp = Vec2::new(-dir.y, dir.x);
                for i in -(VOLLEY_COUNT / 2)..=(VOLLEY_COUNT / 2) {
                    let aim = target + perp * (i as f32 * VOLLEY_SPACING);
                    let angle = boss_pos.angle_to(aim);
                    let spec = ShotSpec {
                        damage: contact_damage,
                        speed: VOLLEY_SPEED,
                        lifetime_ms: VOLLEY_LIFETIME_MS,
                        hostile: true,
                        color: 0xff33_66ff,
                        ..ShotSpec::default()
                    };
                    if let Err(err) = self
                        .projectiles
                        .acquire(Projectile::fire(boss_pos, angle, spec, now))
                    {
                        tracing::trace!(%err, "volley shot dropped");
                    }
                }
            }
        }
    }

    fn run_projectiles(&mut self, now: u64, dt_ms: f32) {
        let player_pos = self.player.position;
        let handles = self.projectiles.handles();
        let mut hostile_damage = 0.0;
        let mut kills = 0;

        for handle in handles {
            // Motion, with homing steering toward the nearest live enemy.
            let homing_target = {
                let Some(p) = self.projectiles.get(handle) else {
                    continue;
                };
                if p.spec.homing {
                    nearest_enemy(&self.enemies, p.position, HOMING_RADIUS).map(|(_, pos)| pos)
                } else {
                    None
                }
            };
            let (position, spec, expired) = {
                let Some(p) = self.projectiles.get_mut(handle) else {
                    continue;
                };
                p.motion_tick(dt_ms, homing_target);
                (p.position, p.spec.clone(), now >= p.expires_at)
            };

            if expired || position.distance_squared(player_pos) > DESPAWN_DISTANCE * DESPAWN_DISTANCE
            {
                self.projectiles.release(handle);
                continue;
            }

            if spec.hostile {
                let reach = PLAYER_RADIUS + PROJECTILE_RADIUS;
                if position.distance_squared(player_pos) < reach * reach {
                    hostile_damage += spec.damage;
                    self.projectiles.release(handle);
                }
                continue;
            }

            kills += self.collide_friendly(now, handle, position, &spec);
        }

        if hostile_damage > 0.0 {
            self.damage_player(hostile_damage);
        }
        self.award_kills(kills);
    }

    /// Resolve one friendly projectile against enemies and crates.
    fn collide_friendly(&mut self, now: u64, handle: Handle, position: Vec2, spec: &ShotSpec) -> u32 {
        let candidates: Vec<(Handle, Vec2)> = {
            let Some(p) = self.projectiles.get(handle) else {
                return 0;
            };
            self.enemies
                .iter()
                .filter(|(h, e)| e.is_targetable() && !p.already_hit.contains(h))
                .filter(|(_, e)| {
                    let reach = e.radius() + PROJECTILE_RADIUS;
                    position.distance_squared(e.position) < reach * reach
                })
                .map(|(h, e)| (h, e.position))
                .collect()
        };

        let mut kills = 0;
        let mut consumed = false;
        let mut last_hit = Vec2::ZERO;

        for (target, target_pos) in candidates {
            if damage_enemy(&mut self.enemies, target, spec.damage, false, now, &mut self.events) {
                kills += 1;
            } else if let Some(enemy) = self.enemies.get_mut(target) {
                if spec.stun_ms > 0 {
                    enemy.status.apply_stun(now, spec.stun_ms);
                }
                if spec.burn_stacks > 0 {
                    enemy.status.apply_burn(now, spec.burn_stacks);
                }
            }
            last_hit = target_pos;
            if let Some(p) = self.projectiles.get_mut(handle) {
                consumed = p.register_hit(target);
            }
            if consumed {
                break;
            }
        }

        // Crates break on any friendly hit and consume pierce.
        if !consumed {
            let crate_hits: Vec<Handle> = self
                .crates
                .iter()
                .filter(|(_, c)| {
                    let reach = CRATE_RADIUS + PROJECTILE_RADIUS;
                    position.distance_squared(c.position) < reach * reach
                })
                .map(|(h, _)| h)
                .collect();
            for crate_handle in crate_hits {
                if consumed {
                    break;
                }
                break_crate(
                    &mut self.crates,
                    &mut self.pickups,
                    &mut self.rng,
                    crate_handle,
                    &mut self.events,
                );
                if let Some(p) = self.projectiles.get_mut(handle) {
                    p.pierce_left = p.pierce_left.saturating_sub(1);
                    consumed = p.pierce_left == 0;
                }
            }
        }

        if consumed {
            if spec.splash_radius > 0.0 {
                kills += self.apply_splash(now, last_hit, spec);
            }
            self.projectiles.release(handle);
        }
        kills
    }

    fn apply_splash(&mut self, now: u64, center: Vec2, spec: &ShotSpec) -> u32 {
        let splash_damage = spec.damage * SPLASH_DAMAGE_FACTOR;
        let range_sq = spec.splash_radius * spec.splash_radius;
        let targets: Vec<Handle> = self
            .enemies
            .iter()
            .filter(|(_, e)| e.is_targetable())
            .filter(|(_, e)| center.distance_squared(e.position) < range_sq)
            .map(|(h, _)| h)
            .collect();

        let mut kills = 0;
        for target in targets {
            if damage_enemy(
                &mut self.enemies,
                target,
                splash_damage,
                false,
                now,
                &mut self.events,
            ) {
                kills += 1;
            }
        }
        kills
    }

    fn run_pickups(&mut self, now: u64, dt_ms: f32) {
        let collected = update_pickups(
            &mut self.pickups,
            self.player.position,
            self.player.pickup_range(),
            dt_ms,
        );
        let mut xp = 0u64;
        let mut stats_changed = false;
        for kind in collected {
            match kind {
                PickupKind::Gem { value } => xp += value,
                PickupKind::Heal { amount } => {
                    self.player.heal(amount);
                    stats_changed = true;
                }
                PickupKind::FullHeal => {
                    self.player.health = self.player.max_health;
                    stats_changed = true;
                }
                PickupKind::Vacuum => magnetize_all(&mut self.pickups),
                PickupKind::DamageBuff => {
                    self.player.stats.damage_mult *= BUFF_FACTOR;
                    self.tasks.push(
                        now + BUFF_DURATION_MS,
                        TaskPayload::BuffExpire {
                            factor: BUFF_FACTOR,
                        },
                    );
                }
            }
        }
        if stats_changed {
            self.push_player_stats();
        }
        if xp > 0 {
            self.gain_xp(xp);
        }
    }

    /// Bank XP and emit the progress event. Offers open later in the tick.
    pub fn gain_xp(&mut self, amount: u64) {
        self.progression.gain_xp(amount);
        self.events.push(GameEvent::XpGained {
            amount,
            current_xp: self.progression.current_xp,
            needed_xp: self.progression.needed_xp,
            level: self.progression.level,
        });
    }

    /// Open the next level-up offer, or burn pending level-ups on the
    /// fallback heal when every standard weapon is maxed.
    fn start_offer(&mut self) {
        while self.progression.pending > 0 && !self.progression.offer_in_progress {
            let choices = build_offer(&self.loadout, &mut self.rng);
            if choices.is_empty() {
                self.player.heal(FALLBACK_HEAL);
                self.progression.consume_pending();
                self.push_player_stats();
            } else {
                self.progression.offer_in_progress = true;
                self.events.push(GameEvent::LevelUpOffer {
                    level: self.progression.level + 1,
                    choices: choices.clone(),
                });
                self.offer = Some(choices);
            }
        }
    }

    /// Resolve the open offer with the chosen index.
    ///
    /// Adds the weapon at level 1 if not owned, upgrades it otherwise.
    /// During burst the upgrade lands on the saved loadout. Chains into
    /// the next offer if more level-ups are pending.
    pub fn resolve_offer(&mut self, choice: usize) -> Result<()> {
        let Some(choices) = self.offer.take() else {
            return Err(CoreError::InvalidState("no offer is open".into()));
        };
        let Some(key) = choices.get(choice).cloned() else {
            self.offer = Some(choices);
            return Err(CoreError::InvalidState(format!(
                "offer has no choice {choice}"
            )));
        };
        let def = self.data.weapons.get(&key)?.clone();

        let weapons = self.loadout.progression_weapons_mut();
        let level = match weapons.iter_mut().find(|w| w.key == key) {
            Some(instance) => instance.upgrade(&def)?,
            None => {
                weapons.push(WeaponInstance::new(&def));
                1
            }
        };
        self.events.push(GameEvent::WeaponUpgraded { key, level });
        self.progression.consume_pending();
        self.progression.offer_in_progress = false;
        self.start_offer();
        Ok(())
    }

    /// Trade a full energy bar for ten seconds of overload weapons.
    ///
    /// The overload set is scaled so its theoretical DPS is twice the
    /// saved loadout's, and the player gets an emergency shield.
    pub fn activate_burst(&mut self) -> Result<()> {
        if self.loadout.burst.is_some() {
            return Err(CoreError::InvalidState("burst already active".into()));
        }
        if self.player.energy < MAX_ENERGY {
            return Err(CoreError::InvalidState(format!(
                "burst requires {MAX_ENERGY} energy, have {}",
                self.player.energy
            )));
        }

        let saved_dps = self.loadout.total_dps(&self.player.stats);
        let mut overload: Vec<WeaponInstance> = OVERLOAD_WEAPONS
            .iter()
            .filter_map(|key| self.data.weapons.get(key).ok())
            .map(WeaponInstance::new)
            .collect();
        let overload_dps: f32 = overload.iter().map(|w| w.dps(&self.player.stats)).sum();
        if overload_dps > 0.0 && saved_dps > 0.0 {
            let factor = saved_dps * BURST_DPS_MULT / overload_dps;
            for weapon in &mut overload {
                weapon.stats.damage *= factor;
            }
        }

        let saved = std::mem::replace(&mut self.loadout.weapons, overload);
        self.loadout.burst = Some(BurstState {
            saved,
            ends_at: self.now_ms + BURST_DURATION_MS,
        });
        self.player.energy = 0;
        self.player.shield = self.player.shield.max(BURST_SHIELD);
        self.tasks
            .push(self.now_ms + BURST_DURATION_MS, TaskPayload::BurstEnd);
        self.events.push(GameEvent::BurstChanged { active: true });
        self.push_player_stats();
        Ok(())
    }

    fn end_burst(&mut self) {
        let Some(burst) = self.loadout.burst.take() else {
            return;
        };
        self.loadout.weapons = burst.saved;
        for weapon in &mut self.loadout.weapons {
            weapon.next_fire_at = self.now_ms;
        }
        self.events.push(GameEvent::BurstChanged { active: false });
    }

    /// Debug harness: set a weapon to an exact level.
    ///
    /// Level 0 removes the weapon, cancels its pending tasks, and tears
    /// down its companion. Levels above the cap are rejected.
    pub fn force_weapon_level(&mut self, key: &str, level: u32) -> Result<()> {
        if level > MAX_WEAPON_LEVEL {
            return Err(CoreError::InvalidUpgradeLevel {
                weapon: key.to_string(),
                level,
            });
        }
        let def = self.data.weapons.get(key)?.clone();

        if level == 0 {
            self.loadout.remove(key);
            if let Some(burst) = &mut self.loadout.burst {
                burst.saved.retain(|w| w.key != key);
            }
            self.tasks.cancel_weapon(key);
            if key == GUARDIAN_WEAPON_KEY {
                self.player.companion = None;
            }
            return Ok(());
        }

        let instance = WeaponInstance::at_level(&def, level)?;
        match self.loadout.get_mut(key) {
            Some(existing) => *existing = instance,
            None => self.loadout.weapons.push(instance),
        }
        self.events.push(GameEvent::WeaponUpgraded {
            key: key.to_string(),
            level,
        });
        Ok(())
    }

    /// Debug harness: set an enemy's health directly.
    pub fn force_enemy_health(&mut self, handle: Handle, health: f32) -> Result<()> {
        let now = self.now_ms;
        let Some(enemy) = self.enemies.get_mut(handle) else {
            return Err(CoreError::InvalidState("stale enemy handle".into()));
        };
        enemy.health = health.min(enemy.max_health);
        if enemy.health <= 0.0 && enemy.is_targetable() {
            enemy.begin_death(now);
            self.kills += 1;
        }
        Ok(())
    }

    /// Live enemy count (tests and diagnostics).
    #[must_use]
    pub fn active_enemies(&self) -> usize {
        self.enemies.active_count()
    }

    fn damage_player(&mut self, amount: f32) {
        let (absorbed, taken) = self.player.apply_damage(amount);
        self.events.push(GameEvent::PlayerDamaged { absorbed, taken });
        self.push_player_stats();
    }

    fn push_player_stats(&mut self) {
        self.events.push(GameEvent::PlayerStats {
            health: self.player.health,
            max_health: self.player.max_health,
            shield: self.player.shield,
            energy: self.player.energy,
        });
    }

    fn award_kills(&mut self, kills: u32) {
        if kills == 0 {
            return;
        }
        self.kills += kills;
        self.player.add_energy(ENERGY_PER_KILL * kills);
        self.push_player_stats();
    }

    fn finish_run(&mut self, outcome: RunOutcome) {
        self.outcome = Some(outcome);
        self.events.push(GameEvent::RunEnded {
            victory: outcome == RunOutcome::Victory,
            kills: self.kills,
            survived_ms: self.now_ms,
        });
        tracing::info!(?outcome, kills = self.kills, survived_ms = self.now_ms, "run ended");
    }
}
