//! Falling items, the basket, and rectangle overlap
//!
//! Pure geometry and motion. Screen coordinates: x grows right, y grows down,
//! positions are the top-left corner of each box.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::ScoringConfig;

/// Item categories (closed set; every category has exactly one scoring rule)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Regular logo, worth its points
    Standard,
    /// Bonus logo, worth double
    Bonus,
    /// Festive gift, worth its points plus a small random bonus
    Festive,
    /// Carbon - counts toward the loss condition
    Hazard,
    /// Grinch - steals previously earned points
    Thief,
}

/// What collecting an item does to the score tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    Add,
    Double,
    AddWithBonus { cap: u32 },
    Hazard,
    Steal { amount: u32 },
}

impl ItemCategory {
    /// Scoring rule table
    pub fn scoring_rule(self, scoring: &ScoringConfig) -> ScoringRule {
        match self {
            ItemCategory::Standard => ScoringRule::Add,
            ItemCategory::Bonus => ScoringRule::Double,
            ItemCategory::Festive => ScoringRule::AddWithBonus {
                cap: scoring.festive_bonus_cap,
            },
            ItemCategory::Hazard => ScoringRule::Hazard,
            ItemCategory::Thief => ScoringRule::Steal {
                amount: scoring.thief_steal,
            },
        }
    }

    /// Whether catching this item is good for the player
    pub fn is_collectible(self) -> bool {
        matches!(
            self,
            ItemCategory::Standard | ItemCategory::Bonus | ItemCategory::Festive
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Standard => "standard",
            ItemCategory::Bonus => "bonus",
            ItemCategory::Festive => "festive",
            ItemCategory::Hazard => "hazard",
            ItemCategory::Thief => "thief",
        }
    }
}

/// How generous the catch test is near the edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum CollisionPolicy {
    /// Boxes must properly intersect; touching edges miss
    #[default]
    Strict,
    /// Every edge comparison is widened by `margin` units
    Generous { margin: f32 },
}

impl CollisionPolicy {
    fn margin(self) -> f32 {
        match self {
            CollisionPolicy::Strict => 0.0,
            CollisionPolicy::Generous { margin } => margin,
        }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Intersection on both axes, strict on all four edges before the margin
    pub fn overlaps(&self, other: &Rect, policy: CollisionPolicy) -> bool {
        let m = policy.margin();
        self.pos.x < other.right() + m
            && self.right() > other.pos.x - m
            && self.pos.y < other.bottom() + m
            && self.bottom() > other.pos.y - m
    }
}

/// A falling item
#[derive(Debug, Clone, PartialEq)]
pub struct FallingItem {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub category: ItemCategory,
    /// Archetype label (sprite key for the UI)
    pub label: String,
    pub points: u32,
    /// Units moved down per frame (>= 0)
    pub speed: f32,
}

impl FallingItem {
    pub fn new(
        id: u32,
        pos: Vec2,
        size: Vec2,
        category: ItemCategory,
        label: impl Into<String>,
        points: u32,
        speed: f32,
    ) -> Self {
        debug_assert!(size.x > 0.0 && size.y > 0.0, "item size must be positive");
        Self {
            id,
            pos,
            size,
            category,
            label: label.into(),
            points,
            speed: speed.max(0.0),
        }
    }

    /// Move down by the current speed
    #[inline]
    pub fn advance(&mut self) {
        self.pos.y += self.speed;
    }

    /// Top edge has passed the bottom of the playfield
    #[inline]
    pub fn is_out_of_bounds(&self, viewport_height: f32) -> bool {
        self.pos.y > viewport_height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    pub fn overlaps(&self, basket: &Basket, policy: CollisionPolicy) -> bool {
        self.bounds().overlaps(&basket.bounds(), policy)
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }
}

/// The player's basket
#[derive(Debug, Clone, PartialEq)]
pub struct Basket {
    pub pos: Vec2,
    pub size: Vec2,
    /// Horizontal displacement per move
    pub speed: f32,
    viewport_width: f32,
}

impl Basket {
    pub fn new(pos: Vec2, size: Vec2, speed: f32, viewport_width: f32) -> Self {
        let mut basket = Self {
            pos,
            size,
            speed,
            viewport_width,
        };
        basket.pos.x = basket.clamp_x(basket.pos.x);
        basket
    }

    /// Rightmost allowed x
    #[inline]
    pub fn max_x(&self) -> f32 {
        (self.viewport_width - self.size.x).max(0.0)
    }

    #[inline]
    fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(0.0, self.max_x())
    }

    pub fn move_left(&mut self) {
        self.pos.x = self.clamp_x(self.pos.x - self.speed);
    }

    pub fn move_right(&mut self) {
        self.pos.x = self.clamp_x(self.pos.x + self.speed);
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    /// Put the basket's center under `x` (track-to-pointer)
    pub fn center_on(&mut self, x: f32) {
        self.pos.x = self.clamp_x(x - self.size.x / 2.0);
    }

    /// Nudge one step toward `x` unless within `deadzone` of the center
    pub fn step_toward(&mut self, x: f32, deadzone: f32) {
        let center = self.center_x();
        if x < center - deadzone {
            self.move_left();
        } else if x > center + deadzone {
            self.move_right();
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn basket() -> Basket {
        Basket::new(Vec2::new(360.0, 540.0), Vec2::new(80.0, 60.0), 5.0, 800.0)
    }

    fn item_at(x: f32, y: f32) -> FallingItem {
        FallingItem::new(
            1,
            Vec2::new(x, y),
            Vec2::splat(50.0),
            ItemCategory::Standard,
            "javascript",
            10,
            2.0,
        )
    }

    #[test]
    fn test_advance_moves_by_speed() {
        let mut item = item_at(100.0, 50.0);
        item.advance();
        assert_eq!(item.pos.y, 52.0);
        item.set_speed(4.5);
        item.advance();
        assert_eq!(item.pos.y, 56.5);
    }

    #[test]
    fn test_out_of_bounds_uses_top_edge() {
        let item = item_at(0.0, 600.0);
        assert!(!item.is_out_of_bounds(600.0));
        let item = item_at(0.0, 600.5);
        assert!(item.is_out_of_bounds(600.0));
    }

    #[test]
    fn test_overlap_strict_touching_edges_miss() {
        let b = basket();
        // Item bottom edge exactly on basket top edge
        let item = item_at(380.0, 490.0);
        assert!(!item.overlaps(&b, CollisionPolicy::Strict));
        // One unit lower overlaps
        let item = item_at(380.0, 491.0);
        assert!(item.overlaps(&b, CollisionPolicy::Strict));
        // Item right edge exactly on basket left edge
        let item = item_at(310.0, 520.0);
        assert!(!item.overlaps(&b, CollisionPolicy::Strict));
    }

    #[test]
    fn test_overlap_generous_margin() {
        let b = basket();
        let policy = CollisionPolicy::Generous { margin: 5.0 };
        // 4 units left of touching still counts
        let item = item_at(306.0, 520.0);
        assert!(item.overlaps(&b, policy));
        // 5 units away is the boundary and misses
        let item = item_at(305.0, 520.0);
        assert!(!item.overlaps(&b, policy));
    }

    #[test]
    fn test_basket_clamps_at_edges() {
        let mut b = basket();
        for _ in 0..200 {
            b.move_left();
        }
        assert_eq!(b.pos.x, 0.0);
        b.move_left();
        assert_eq!(b.pos.x, 0.0);
        for _ in 0..200 {
            b.move_right();
        }
        assert_eq!(b.pos.x, 720.0);
        b.move_right();
        assert_eq!(b.pos.x, 720.0);
    }

    #[test]
    fn test_center_on_and_step_toward() {
        let mut b = basket();
        b.center_on(100.0);
        assert_eq!(b.pos.x, 60.0);
        b.center_on(10_000.0);
        assert_eq!(b.pos.x, 720.0);

        let mut b = basket();
        // Within the dead zone: no movement
        b.step_toward(405.0, 10.0);
        assert_eq!(b.pos.x, 360.0);
        b.step_toward(300.0, 10.0);
        assert_eq!(b.pos.x, 355.0);
        b.step_toward(700.0, 10.0);
        assert_eq!(b.pos.x, 360.0);
    }

    #[test]
    fn test_scoring_rule_table() {
        let scoring = ScoringConfig::default();
        assert_eq!(ItemCategory::Standard.scoring_rule(&scoring), ScoringRule::Add);
        assert_eq!(ItemCategory::Bonus.scoring_rule(&scoring), ScoringRule::Double);
        assert_eq!(
            ItemCategory::Festive.scoring_rule(&scoring),
            ScoringRule::AddWithBonus { cap: scoring.festive_bonus_cap }
        );
        assert_eq!(ItemCategory::Hazard.scoring_rule(&scoring), ScoringRule::Hazard);
        assert_eq!(
            ItemCategory::Thief.scoring_rule(&scoring),
            ScoringRule::Steal { amount: scoring.thief_steal }
        );
        assert!(!ItemCategory::Hazard.is_collectible());
        assert!(ItemCategory::Festive.is_collectible());
    }

    proptest! {
        #[test]
        fn prop_advance_is_monotonic(speed in 0.0f32..20.0, steps in 1usize..200) {
            let mut item = item_at(0.0, -50.0);
            item.set_speed(speed);
            for _ in 0..steps {
                let before = item.pos.y;
                item.advance();
                prop_assert!(item.pos.y >= before);
                prop_assert_eq!(item.pos.y, before + speed);
            }
        }

        #[test]
        fn prop_basket_stays_in_range(moves in proptest::collection::vec(any::<bool>(), 0..400)) {
            let mut b = basket();
            for right in moves {
                if right { b.move_right() } else { b.move_left() }
                prop_assert!(b.pos.x >= 0.0);
                prop_assert!(b.pos.x <= 800.0 - 80.0);
            }
        }
    }
}
