//! XP thresholds, pending level-ups, and offer generation.
//!
//! XP can bank multiple level-ups in one pickup; each offer resolves
//! exactly one of them, and the next offer follows immediately while any
//! remain. The `offer_in_progress` guard keeps two offers from being
//! open at once.

use crate::rng::SimRng;
use crate::weapons::Loadout;
use serde::{Deserialize, Serialize};

/// XP needed for the first level-up.
pub const BASE_NEEDED_XP: u64 = 100;
/// Choices presented per offer (fewer if not enough candidates remain).
pub const OFFER_CHOICES: usize = 3;
/// Health restored when every weapon is maxed and no choice can be offered.
pub const FALLBACK_HEAL: f32 = 30.0;

/// Player level / XP state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Current level, starting at 1.
    pub level: u32,
    /// XP toward the next level.
    pub current_xp: u64,
    /// XP required for the next level.
    pub needed_xp: u64,
    /// Level-ups earned but not yet resolved through an offer.
    pub pending: u32,
    /// An offer is open and awaiting a choice.
    pub offer_in_progress: bool,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            current_xp: 0,
            needed_xp: BASE_NEEDED_XP,
            pending: 0,
            offer_in_progress: false,
        }
    }
}

impl ProgressionState {
    /// Bank XP, crossing as many thresholds as the amount covers.
    ///
    /// Each crossing raises the threshold to floor(needed * 1.3) and
    /// increments the pending level-up count. Returns the number of
    /// thresholds crossed.
    pub fn gain_xp(&mut self, amount: u64) -> u32 {
        self.current_xp += amount;
        let mut crossed = 0;
        while self.current_xp >= self.needed_xp {
            self.current_xp -= self.needed_xp;
            // floor(needed * 1.3), kept in integers
            self.needed_xp = self.needed_xp * 13 / 10;
            self.pending += 1;
            crossed += 1;
        }
        crossed
    }

    /// Consume one pending level-up and raise the level.
    ///
    /// Callers check `pending > 0` first; resolving with nothing pending
    /// is a logic error and does nothing.
    pub fn consume_pending(&mut self) {
        if self.pending > 0 {
            self.pending -= 1;
            self.level += 1;
        }
    }
}

/// Draw up to [`OFFER_CHOICES`] distinct non-maxed weapon keys.
///
/// Empty result means every standard weapon is maxed; the caller grants
/// the fallback heal instead.
pub fn build_offer(loadout: &Loadout, rng: &mut SimRng) -> Vec<String> {
    let mut candidates = loadout.offer_candidates();
    rng.shuffle(&mut candidates);
    candidates.truncate(OFFER_CHOICES);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::weapon_data::{WeaponTable, STANDARD_WEAPONS};
    use crate::weapons::WeaponInstance;

    #[test]
    fn test_threshold_compounds_floored() {
        let mut progression = ProgressionState::default();
        assert_eq!(progression.gain_xp(100), 1);
        assert_eq!(progression.needed_xp, 130);
        assert_eq!(progression.gain_xp(130), 1);
        assert_eq!(progression.needed_xp, 169);
    }

    #[test]
    fn test_single_pickup_banks_multiple_levels() {
        let mut progression = ProgressionState::default();
        // 250 = 100 + 130 + 20 remainder
        let crossed = progression.gain_xp(250);
        assert_eq!(crossed, 2);
        assert_eq!(progression.pending, 2);
        assert_eq!(progression.current_xp, 20);
        assert_eq!(progression.needed_xp, 169);
    }

    #[test]
    fn test_consume_pending_raises_level() {
        let mut progression = ProgressionState::default();
        progression.gain_xp(250);
        progression.consume_pending();
        progression.consume_pending();
        assert_eq!(progression.level, 3);
        assert_eq!(progression.pending, 0);

        // Nothing pending: no-op
        progression.consume_pending();
        assert_eq!(progression.level, 3);
    }

    #[test]
    fn test_offer_draws_three_distinct() {
        let loadout = Loadout::default();
        let mut rng = SimRng::new(3);
        let offer = build_offer(&loadout, &mut rng);
        assert_eq!(offer.len(), OFFER_CHOICES);
        let mut unique = offer.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), OFFER_CHOICES);
    }

    #[test]
    fn test_offer_empty_when_all_maxed() {
        let table = WeaponTable::builtin();
        let mut loadout = Loadout::default();
        for key in STANDARD_WEAPONS {
            loadout
                .weapons
                .push(WeaponInstance::at_level(table.get(key).unwrap(), 5).unwrap());
        }
        let mut rng = SimRng::new(3);
        assert!(build_offer(&loadout, &mut rng).is_empty());
    }

    #[test]
    fn test_offer_shrinks_to_remaining_candidates() {
        let table = WeaponTable::builtin();
        let mut loadout = Loadout::default();
        for key in STANDARD_WEAPONS.iter().take(STANDARD_WEAPONS.len() - 2) {
            loadout
                .weapons
                .push(WeaponInstance::at_level(table.get(key).unwrap(), 5).unwrap());
        }
        let mut rng = SimRng::new(3);
        assert_eq!(build_offer(&loadout, &mut rng).len(), 2);
    }
}
