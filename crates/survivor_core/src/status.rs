//! Status effects: stun, slow, and stacking burn.
//!
//! Effects live in a [`StatusBlock`] on each enemy and are evaluated once
//! per tick in a fixed order: stun expiry, stun gate, slow, burn. All
//! timers are absolute sim-time deadlines, so pausing the clock suspends
//! every effect without any bookkeeping.

use serde::{Deserialize, Serialize};

/// Damage per burn stack per burn tick.
pub const BURN_DAMAGE_PER_STACK: f32 = 5.0;
/// Interval between burn damage ticks, in ms.
pub const BURN_TICK_INTERVAL_MS: u64 = 1_000;
/// Burn stacks expire this long after the last application.
pub const BURN_EXPIRY_MS: u64 = 10_000;

/// Per-enemy status effect state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusBlock {
    /// Active burn stacks.
    pub burn_stacks: u32,
    /// Absolute time of the next burn damage tick.
    pub next_burn_tick: u64,
    /// Absolute time at which all burn stacks expire.
    pub burn_expires_at: u64,
    /// Stunned until this absolute time (0 = not stunned).
    pub stunned_until: u64,
    /// Movement multiplier while slowed, in `[0, 1]`.
    pub slow_factor: f32,
    /// Slow expires at this absolute time.
    pub slow_expires_at: u64,
}

/// Outcome of one status tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusTick {
    /// Enemy is stunned this tick: zero velocity, no movement or attacks.
    pub stunned: bool,
    /// Effective speed multiplier (0 when stunned).
    pub speed_factor: f32,
    /// Burn damage to apply this tick, if a burn tick came due.
    pub burn_damage: Option<f32>,
}

impl StatusBlock {
    /// Add burn stacks and refresh the shared expiry window.
    ///
    /// The first tick after application fires immediately (the tick
    /// deadline is not pushed forward here), subsequent ticks run on the
    /// fixed interval.
    pub fn apply_burn(&mut self, now: u64, stacks: u32) {
        self.burn_stacks += stacks;
        self.burn_expires_at = now + BURN_EXPIRY_MS;
    }

    /// Stun for `duration_ms`. Re-application extends from `now`.
    pub fn apply_stun(&mut self, now: u64, duration_ms: u64) {
        self.stunned_until = now + duration_ms;
    }

    /// Slow to `factor` of normal speed for `duration_ms`.
    ///
    /// Slows do not stack; the latest application wins outright.
    pub fn apply_slow(&mut self, now: u64, factor: f32, duration_ms: u64) {
        self.slow_factor = factor.clamp(0.0, 1.0);
        self.slow_expires_at = now + duration_ms;
    }

    /// True if currently stunned.
    #[must_use]
    pub fn is_stunned(&self, now: u64) -> bool {
        now < self.stunned_until
    }

    /// True if any burn stacks are active.
    #[must_use]
    pub fn is_burning(&self) -> bool {
        self.burn_stacks > 0
    }

    /// Evaluate one tick of status effects.
    pub fn tick(&mut self, now: u64) -> StatusTick {
        if self.stunned_until != 0 && now >= self.stunned_until {
            self.stunned_until = 0;
        }
        let stunned = self.is_stunned(now);

        let speed_factor = if stunned {
            0.0
        } else if now < self.slow_expires_at {
            self.slow_factor
        } else {
            1.0
        };

        let mut burn_damage = None;
        if self.burn_stacks > 0 {
            if now >= self.next_burn_tick {
                burn_damage = Some(self.burn_stacks as f32 * BURN_DAMAGE_PER_STACK);
                self.next_burn_tick = now + BURN_TICK_INTERVAL_MS;
            }
            if now >= self.burn_expires_at {
                self.burn_stacks = 0;
            }
        }

        StatusTick {
            stunned,
            speed_factor,
            burn_damage,
        }
    }

    /// Drop all effects. Used when an enemy enters its dying state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
