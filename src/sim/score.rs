//! Score, hazard count, and derived level

use serde::{Deserialize, Serialize};

use crate::consts::{LEVEL_STEP, MAX_HAZARDS};

/// Mutable round counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    score: u32,
    hazards: u32,
    level: u32,
    max_hazards: u32,
    level_step: u32,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(MAX_HAZARDS, LEVEL_STEP)
    }
}

impl ScoreTracker {
    pub fn new(max_hazards: u32, level_step: u32) -> Self {
        Self {
            score: 0,
            hazards: 0,
            level: 1,
            max_hazards: max_hazards.max(1),
            level_step: level_step.max(1),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn hazards(&self) -> u32 {
        self.hazards
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_hazards(&self) -> u32 {
        self.max_hazards
    }

    pub fn hazards_remaining(&self) -> u32 {
        self.max_hazards.saturating_sub(self.hazards)
    }

    /// Add points. Returns the new level if it changed.
    pub fn add_score(&mut self, points: u32) -> Option<u32> {
        self.score = self.score.saturating_add(points);
        self.update_level()
    }

    /// Count a hazard. Returns true once the cap is reached.
    pub fn add_hazard(&mut self) -> bool {
        self.hazards += 1;
        self.hazards >= self.max_hazards
    }

    /// Remove up to `amount` points (never below zero). Returns the points
    /// actually removed.
    pub fn steal(&mut self, amount: u32) -> u32 {
        let stolen = amount.min(self.score);
        self.score -= stolen;
        self.update_level();
        stolen
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.hazards = 0;
        self.level = 1;
    }

    fn update_level(&mut self) -> Option<u32> {
        let level = self.score / self.level_step + 1;
        if level != self.level {
            self.level = level;
            Some(level)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_up_at_step() {
        let mut s = ScoreTracker::default();
        assert_eq!(s.add_score(180), None);
        assert_eq!(s.level(), 1);
        assert_eq!(s.add_score(25), Some(2));
        assert_eq!(s.score(), 205);
        assert_eq!(s.level(), 2);
        assert_eq!(s.add_score(0), None);
    }

    #[test]
    fn test_hazard_cap_sequence() {
        let mut s = ScoreTracker::default();
        let results: Vec<bool> = (0..5).map(|_| s.add_hazard()).collect();
        assert_eq!(results, vec![false, false, false, false, true]);
        assert_eq!(s.hazards(), 5);
        assert_eq!(s.hazards_remaining(), 0);
    }

    #[test]
    fn test_steal_floors_at_zero() {
        let mut s = ScoreTracker::default();
        s.add_score(30);
        assert_eq!(s.steal(50), 30);
        assert_eq!(s.score(), 0);
        assert_eq!(s.steal(50), 0);
    }

    #[test]
    fn test_steal_can_drop_level() {
        let mut s = ScoreTracker::default();
        s.add_score(210);
        assert_eq!(s.level(), 2);
        s.steal(50);
        assert_eq!(s.score(), 160);
        assert_eq!(s.level(), 1);
    }

    #[test]
    fn test_reset() {
        let mut s = ScoreTracker::default();
        s.add_score(450);
        s.add_hazard();
        s.reset();
        assert_eq!((s.score(), s.hazards(), s.level()), (0, 0, 1));
    }

    proptest! {
        #[test]
        fn prop_add_score_monotonic(points in proptest::collection::vec(0u32..1000, 0..50)) {
            let mut s = ScoreTracker::default();
            for p in points {
                let before = s.score();
                s.add_score(p);
                prop_assert!(s.score() >= before);
                prop_assert_eq!(s.level(), s.score() / LEVEL_STEP + 1);
            }
        }
    }
}
