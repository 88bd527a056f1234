//! Scheduled tasks: delayed work as explicit data.
//!
//! Anything that fires later (staggered burst shots, chain hops, beam
//! ticks, boss telegraphs) is a `{fire_at, payload}` record in one queue,
//! processed at the start of each tick. Deadlines are absolute sim time,
//! so pausing the clock suspends every pending task for free. Each
//! payload carries what the executor needs to re-check that its owner is
//! still alive; a task whose owner is gone is dropped, never executed.

use crate::math::Vec2;
use crate::pool::Handle;
use crate::projectile::ShotSpec;
use serde::{Deserialize, Serialize};

/// Work to perform when a task comes due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskPayload {
    /// A later shot of a staggered burst. Fires from the player's
    /// position at execution time, at the angle rolled when scheduled.
    StaggeredShot {
        /// Owning weapon key; the shot is dropped if no longer equipped.
        weapon: String,
        /// Final aim angle, jitter already applied.
        angle: f32,
        /// Projectile parameters.
        spec: ShotSpec,
    },
    /// The next hop of a chain lightning activation.
    ChainHop {
        /// Owning weapon key.
        weapon: String,
        /// Position the bolt hops from.
        from: Vec2,
        /// Enemies already struck this activation; never revisited.
        visited: Vec<Handle>,
        /// Hops remaining, including this one.
        hops_left: u32,
        /// Hop search radius.
        radius: f32,
        /// Damage per hop.
        damage: f32,
        /// Stun applied per hop, in ms.
        stun_ms: u64,
    },
    /// One damage tick of a sustained beam. Reschedules itself until the
    /// beam's end time.
    BeamTick {
        /// Owning weapon key.
        weapon: String,
        /// Locked beam angle.
        angle: f32,
        /// When the beam started (drives the range ramp).
        started_at: u64,
        /// When the beam ends.
        ends_at: u64,
        /// Gap between damage ticks, in ms.
        interval_ms: u64,
        /// Full beam range after ramp-up.
        range: f32,
        /// Effective beam width.
        width: f32,
        /// Damage per tick.
        damage: f32,
    },
    /// One arc swing of a guardian sweep.
    SweepSwing {
        /// Owning weapon key.
        weapon: String,
        /// Swing center bearing.
        bearing: f32,
        /// Swing reach.
        range: f32,
        /// Damage of this swing.
        damage: f32,
    },
    /// A telegraphed boss attack resolves.
    BossAttackResolve {
        /// The attacking boss; dropped if dead or stale.
        enemy: Handle,
        /// Target position locked at telegraph start.
        target: Vec2,
    },
    /// Burst mode ends; the saved loadout comes back.
    BurstEnd,
    /// A damage buff powerup wears off.
    BuffExpire {
        /// Multiplier to undo.
        factor: f32,
    },
}

/// A unit of delayed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Absolute sim time at which the task runs.
    pub fire_at: u64,
    /// What to do.
    pub payload: TaskPayload,
}

/// The pending task queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    /// Schedule a task.
    pub fn push(&mut self, fire_at: u64, payload: TaskPayload) {
        self.tasks.push(ScheduledTask { fire_at, payload });
    }

    /// Remove and return every task due at `now`, preserving insertion
    /// order among them.
    pub fn take_due(&mut self, now: u64) -> Vec<ScheduledTask> {
        let (due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| now >= t.fire_at);
        self.tasks = pending;
        due
    }

    /// Drop every pending task whose owning weapon matches `key`.
    pub fn cancel_weapon(&mut self, key: &str) {
        self.tasks.retain(|t| match &t.payload {
            TaskPayload::StaggeredShot { weapon, .. }
            | TaskPayload::ChainHop { weapon, .. }
            | TaskPayload::BeamTick { weapon, .. }
            | TaskPayload::SweepSwing { weapon, .. } => weapon != key,
            _ => true,
        });
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_splits_by_deadline() {
        let mut queue = TaskQueue::default();
        queue.push(100, TaskPayload::BurstEnd);
        queue.push(50, TaskPayload::BuffExpire { factor: 1.2 });
        queue.push(200, TaskPayload::BurstEnd);

        let due = queue.take_due(100);
        assert_eq!(due.len(), 2);
        assert_eq!(queue.len(), 1);

        // Nothing new became due
        assert!(queue.take_due(150).is_empty());
        assert_eq!(queue.take_due(200).len(), 1);
    }

    #[test]
    fn test_take_due_preserves_insertion_order() {
        let mut queue = TaskQueue::default();
        queue.push(10, TaskPayload::BuffExpire { factor: 1.0 });
        queue.push(10, TaskPayload::BurstEnd);
        let due = queue.take_due(10);
        assert!(matches!(due[0].payload, TaskPayload::BuffExpire { .. }));
        assert!(matches!(due[1].payload, TaskPayload::BurstEnd));
    }

    #[test]
    fn test_cancel_weapon_drops_owned_tasks() {
        let mut queue = TaskQueue::default();
        queue.push(
            10,
            TaskPayload::SweepSwing {
                weapon: "guardian".into(),
                bearing: 0.0,
                range: 250.0,
                damage: 25.0,
            },
        );
        queue.push(20, TaskPayload::BurstEnd);
        queue.cancel_weapon("guardian");
        assert_eq!(queue.len(), 1);
    }
}
