//! Enemy instances and their behavior state machine.
//!
//! Enemies move through Active -> (Stunned | Attacking) -> Dying, then back
//! to the pool. The behavior tick is a pure state transition that reports
//! what happened (telegraph started, contact made, death finished) as an
//! outcome record; the simulation turns those into tasks and events.

use crate::data::enemy_data::{BossAttack, EnemyDefinition};
use crate::events::GameEvent;
use crate::math::Vec2;
use crate::pool::{Handle, Pool};
use crate::status::StatusBlock;
use serde::{Deserialize, Serialize};

/// Chance that a non-boss spawn is promoted to elite.
pub const ELITE_CHANCE: f32 = 0.1;
/// Elite health multiplier.
pub const ELITE_HP_MULT: f32 = 3.0;
/// Elite damage multiplier.
pub const ELITE_DAMAGE_MULT: f32 = 2.0;
/// Elite XP multiplier.
pub const ELITE_XP_MULT: f32 = 5.0;

/// Bosses consider attacking inside this range.
pub const BOSS_TRIGGER_RANGE: f32 = 400.0;
/// Telegraph window before a boss attack resolves, in ms.
pub const BOSS_TELEGRAPH_MS: u64 = 1_000;
/// Boss dash charge speed, world units per second.
pub const BOSS_DASH_SPEED: f32 = 1_000.0;
/// Boss dash charge duration, in ms.
pub const BOSS_DASH_MS: u64 = 300;

/// Corpse lingers this long before the slot is recycled.
pub const DYING_MS: u64 = 600;
/// Minimum gap between contact hits from the same enemy, in ms.
pub const CONTACT_COOLDOWN_MS: u64 = 500;
/// Attacker knockback on a contact hit, in world units.
pub const CONTACT_KNOCKBACK: f32 = 20.0;

/// Behavior state. Pooled (inactive) is represented by the slot itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Chasing the player.
    Active,
    /// Status-stunned; no movement or attacks.
    Stunned,
    /// Boss telegraphing an attack.
    Attacking,
    /// Death animation window; untargetable.
    Dying,
}

/// Spawn-time multipliers, applied in a fixed order:
/// elite roll first, then time scaling, then difficulty tier.
#[derive(Debug, Clone, Copy)]
pub struct SpawnScaling {
    /// Elite promotion flag.
    pub elite: bool,
    /// Time-ramp multiplier on health and XP (1 + 0.1 per elapsed minute).
    pub time_mult: f32,
    /// Tier multiplier on health.
    pub tier_hp: f32,
    /// Tier multiplier on damage.
    pub tier_damage: f32,
    /// Tier multiplier on XP.
    pub tier_xp: f32,
}

impl SpawnScaling {
    /// No scaling at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            elite: false,
            time_mult: 1.0,
            tier_hp: 1.0,
            tier_damage: 1.0,
            tier_xp: 1.0,
        }
    }
}

/// Boss-only runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossState {
    /// Attack archetype.
    pub attack: BossAttack,
    /// Attack effect range.
    pub attack_range: f32,
    /// Cooldown between attacks, counted from telegraph start.
    pub attack_cooldown_ms: u64,
    /// Next time an attack may begin.
    pub next_attack_at: u64,
}

/// Transient dash charge (boss Dash attack resolution).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DashState {
    /// Charge velocity, world units per second.
    pub velocity: Vec2,
    /// Charge ends at this time.
    pub until: u64,
}

/// A pooled enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyInstance {
    /// Definition key this enemy was spawned from.
    pub def_id: String,
    /// World position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health after spawn scaling.
    pub max_health: f32,
    /// Movement speed, world units per second.
    pub speed: f32,
    /// Contact damage.
    pub damage: f32,
    /// XP dropped on death.
    pub xp_value: u64,
    /// Presentation scale; drives the collision radius.
    pub scale: f32,
    /// Elite promotion flag.
    pub elite: bool,
    /// Boss runtime state, if any.
    pub boss: Option<BossState>,
    /// Behavior state.
    pub state: BehaviorState,
    /// Status effect block.
    pub status: StatusBlock,
    /// Transient dash charge.
    pub dash: Option<DashState>,
    /// Next time a contact hit may land.
    pub contact_ready_at: u64,
    /// When in Dying, the time the slot is recycled.
    pub dying_until: u64,
}

/// What one behavior tick did.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorOutcome {
    /// A boss telegraph began; the locked target position.
    pub telegraph_target: Option<Vec2>,
    /// A contact hit landed this tick.
    pub contact_hit: bool,
    /// The dying window elapsed; the slot should be recycled.
    pub finished_dying: bool,
}

impl EnemyInstance {
    /// Build an instance from a definition with spawn scaling applied.
    #[must_use]
    pub fn from_definition(def: &EnemyDefinition, position: Vec2, scaling: SpawnScaling) -> Self {
        let mut hp = def.hp;
        let mut damage = def.damage;
        let mut xp = def.xp as f32;

        let elite = scaling.elite && !def.is_boss();
        if elite {
            hp *= ELITE_HP_MULT;
            damage *= ELITE_DAMAGE_MULT;
            xp *= ELITE_XP_MULT;
        }
        hp *= scaling.time_mult;
        xp *= scaling.time_mult;
        hp *= scaling.tier_hp;
        damage *= scaling.tier_damage;
        xp *= scaling.tier_xp;

        Self {
            def_id: def.id.clone(),
            position,
            health: hp,
            max_health: hp,
            speed: def.speed,
            damage,
            xp_value: xp as u64,
            scale: def.scale,
            elite,
            boss: def.boss.as_ref().map(|b| BossState {
                attack: b.attack,
                attack_range: b.attack_range,
                attack_cooldown_ms: b.attack_cooldown_ms,
                next_attack_at: 0,
            }),
            state: BehaviorState::Active,
            status: StatusBlock::default(),
            dash: None,
            contact_ready_at: 0,
            dying_until: 0,
        }
    }

    /// True if this is a boss.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.boss.is_some()
    }

    /// Eligible for targeting and damage.
    #[must_use]
    pub fn is_targetable(&self) -> bool {
        self.state != BehaviorState::Dying
    }

    /// Collision radius in world units.
    #[must_use]
    pub fn radius(&self) -> f32 {
        20.0 * self.scale
    }

    /// Enter the dying window: untargetable, status cleared, timers set.
    pub fn begin_death(&mut self, now: u64) {
        self.state = BehaviorState::Dying;
        self.status.clear();
        self.dash = None;
        self.dying_until = now + DYING_MS;
    }

    /// Advance the state machine by one tick.
    ///
    /// `stunned` and `speed_factor` come from the status tick that the
    /// caller ran just before this. `player_radius` is the player's
    /// collision radius for contact tests.
    pub fn behavior_tick(
        &mut self,
        now: u64,
        dt_ms: f32,
        player_pos: Vec2,
        player_radius: f32,
        stunned: bool,
        speed_factor: f32,
    ) -> BehaviorOutcome {
        let mut outcome = BehaviorOutcome::default();

        if self.state == BehaviorState::Dying {
            if now >= self.dying_until {
                outcome.finished_dying = true;
            }
            return outcome;
        }

        if stunned {
            self.state = BehaviorState::Stunned;
            return outcome;
        }
        if self.state == BehaviorState::Stunned {
            self.state = BehaviorState::Active;
        }

        let dt_s = dt_ms / 1_000.0;

        // Dash charge overrides normal movement until it expires.
        if let Some(dash) = self.dash {
            if now >= dash.until {
                self.dash = None;
            } else {
                self.position = self.position + dash.velocity * dt_s;
                self.try_contact(now, player_pos, player_radius, &mut outcome);
                return outcome;
            }
        }

        if self.state == BehaviorState::Active {
            if let Some(boss) = &mut self.boss {
                let dist_sq = self.position.distance_squared(player_pos);
                if now >= boss.next_attack_at
                    && dist_sq < BOSS_TRIGGER_RANGE * BOSS_TRIGGER_RANGE
                {
                    boss.next_attack_at = now + boss.attack_cooldown_ms;
                    self.state = BehaviorState::Attacking;
                    outcome.telegraph_target = Some(player_pos);
                }
            }
        }

        // Keeps closing in even while telegraphing.
        let dir = (player_pos - self.position).normalize();
        self.position = self.position + dir * (self.speed * speed_factor * dt_s);

        self.try_contact(now, player_pos, player_radius, &mut outcome);
        outcome
    }

    fn try_contact(
        &mut self,
        now: u64,
        player_pos: Vec2,
        player_radius: f32,
        outcome: &mut BehaviorOutcome,
    ) {
        let reach = self.radius() + player_radius;
        if now >= self.contact_ready_at
            && self.position.distance_squared(player_pos) < reach * reach
        {
            outcome.contact_hit = true;
            self.contact_ready_at = now + CONTACT_COOLDOWN_MS;
            // Recoil away from the player so the hit does not repeat
            // every single tick.
            let away = (self.position - player_pos).normalize();
            self.position = self.position + away * CONTACT_KNOCKBACK;
        }
    }
}

/// Apply damage to an enemy through the shared damage path.
///
/// Emits the damage event (and boss health bar event), and flips the enemy
/// into its dying state when health is exhausted. Returns true if this hit
/// was the killing blow. Stale handles and already-dying enemies are
/// ignored.
pub(crate) fn damage_enemy(
    enemies: &mut Pool<EnemyInstance>,
    handle: Handle,
    amount: f32,
    dot: bool,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(enemy) = enemies.get_mut(handle) else {
        return false;
    };
    if !enemy.is_targetable() {
        return false;
    }

    enemy.health -= amount;
    events.push(GameEvent::EnemyDamaged {
        enemy: handle,
        amount,
        dot,
    });
    if enemy.is_boss() {
        events.push(GameEvent::BossHealthChanged {
            enemy: handle,
            health: enemy.health.max(0.0),
            max_health: enemy.max_health,
        });
    }

    if enemy.health <= 0.0 {
        if enemy.is_boss() {
            events.push(GameEvent::BossDied {
                position: enemy.position,
            });
        }
        enemy.begin_death(now);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enemy_data::EnemyTable;

    fn slime() -> EnemyDefinition {
        EnemyTable::builtin().get("slime").unwrap().clone()
    }

    #[test]
    fn test_elite_scaling_order() {
        let def = slime();
        let scaling = SpawnScaling {
            elite: true,
            time_mult: 1.0,
            tier_hp: 1.0,
            tier_damage: 1.0,
            tier_xp: 1.0,
        };
        let enemy = EnemyInstance::from_definition(&def, Vec2::ZERO, scaling);
        assert_eq!(enemy.max_health, 60.0);
        assert_eq!(enemy.damage, 20.0);
        assert_eq!(enemy.xp_value, 50);
        assert!(enemy.elite);
    }

    #[test]
    fn test_elite_then_tier_compound() {
        let def = slime();
        let scaling = SpawnScaling {
            elite: true,
            time_mult: 1.2,
            tier_hp: 1.8,
            tier_damage: 1.5,
            tier_xp: 1.1,
        };
        let enemy = EnemyInstance::from_definition(&def, Vec2::ZERO, scaling);
        // hp: 20 * 3 (elite) * 1.2 (time) * 1.8 (tier)
        assert!((enemy.max_health - 129.6).abs() < 1e-3);
        // damage: 10 * 2 * 1.5
        assert!((enemy.damage - 30.0).abs() < 1e-3);
        // xp: 10 * 5 * 1.2 * 1.1 = 66
        assert_eq!(enemy.xp_value, 66);
    }

    #[test]
    fn test_bosses_never_elite() {
        let table = EnemyTable::builtin();
        let def = table.get("boss_slime").unwrap();
        let scaling = SpawnScaling {
            elite: true,
            ..SpawnScaling::none()
        };
        let boss = EnemyInstance::from_definition(def, Vec2::ZERO, scaling);
        assert!(!boss.elite);
        assert_eq!(boss.max_health, 6_000.0);
    }

    #[test]
    fn test_stun_freezes_movement() {
        let def = slime();
        let mut enemy =
            EnemyInstance::from_definition(&def, Vec2::new(100.0, 0.0), SpawnScaling::none());
        let before = enemy.position;
        enemy.behavior_tick(0, 50.0, Vec2::ZERO, 24.0, true, 0.0);
        assert_eq!(enemy.position, before);
        assert_eq!(enemy.state, BehaviorState::Stunned);

        // Recovers to Active and moves again
        enemy.behavior_tick(600, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert_eq!(enemy.state, BehaviorState::Active);
        assert!(enemy.position.x < before.x);
    }

    #[test]
    fn test_boss_telegraph_only_in_trigger_range() {
        let table = EnemyTable::builtin();
        let def = table.get("boss_slime").unwrap();
        let mut boss =
            EnemyInstance::from_definition(def, Vec2::new(1_000.0, 0.0), SpawnScaling::none());
        let outcome = boss.behavior_tick(0, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(outcome.telegraph_target.is_none());

        boss.position = Vec2::new(300.0, 0.0);
        let outcome = boss.behavior_tick(50, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert_eq!(outcome.telegraph_target, Some(Vec2::ZERO));
        assert_eq!(boss.state, BehaviorState::Attacking);

        // Cooldown blocks an immediate retrigger
        boss.state = BehaviorState::Active;
        let outcome = boss.behavior_tick(100, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(outcome.telegraph_target.is_none());
    }

    #[test]
    fn test_contact_hit_has_cooldown_and_knockback() {
        let def = slime();
        let mut enemy =
            EnemyInstance::from_definition(&def, Vec2::new(10.0, 0.0), SpawnScaling::none());
        let outcome = enemy.behavior_tick(0, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(outcome.contact_hit);
        // Knocked back out of immediate re-contact
        assert!(enemy.position.x > 10.0);

        let outcome = enemy.behavior_tick(50, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(!outcome.contact_hit);
    }

    #[test]
    fn test_damage_path_kills_and_ignores_dying() {
        let mut enemies = Pool::new("enemies", 4);
        let def = slime();
        let handle = enemies
            .acquire(EnemyInstance::from_definition(
                &def,
                Vec2::ZERO,
                SpawnScaling::none(),
            ))
            .unwrap();
        let mut events = Vec::new();

        assert!(!damage_enemy(&mut enemies, handle, 5.0, false, 0, &mut events));
        assert!(damage_enemy(&mut enemies, handle, 100.0, false, 0, &mut events));
        assert_eq!(enemies.get(handle).unwrap().state, BehaviorState::Dying);

        // Further damage on a dying enemy is a no-op
        let before = events.len();
        assert!(!damage_enemy(&mut enemies, handle, 100.0, false, 0, &mut events));
        assert_eq!(events.len(), before);
    }

    #[test]
    fn test_dying_window_then_recycle_signal() {
        let def = slime();
        let mut enemy = EnemyInstance::from_definition(&def, Vec2::ZERO, SpawnScaling::none());
        enemy.begin_death(1_000);
        let outcome = enemy.behavior_tick(1_200, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(!outcome.finished_dying);
        let outcome = enemy.behavior_tick(1_000 + DYING_MS, 50.0, Vec2::ZERO, 24.0, false, 1.0);
        assert!(outcome.finished_dying);
    }
}
