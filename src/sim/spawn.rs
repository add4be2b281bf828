//! Weighted item spawning
//!
//! Archetypes are drawn by walking the catalog in order and subtracting each
//! weight from a uniform roll in [0, total); the first archetype that brings
//! the remainder to zero or below wins. Timing is `interval + U[0, variation)`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{FallingItem, ItemCategory};
use super::scheduler::{Scheduler, TimerId};
use crate::settings::{BurstConfig, ConfigError, SpawnConfig};

/// A kind of falling item and how often it appears
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub label: String,
    pub category: ItemCategory,
    pub points: u32,
    /// Relative frequency (> 0)
    pub weight: u32,
}

impl Archetype {
    pub fn new(label: impl Into<String>, category: ItemCategory, points: u32, weight: u32) -> Self {
        Self {
            label: label.into(),
            category,
            points,
            weight,
        }
    }
}

/// Validated, ordered archetype list
#[derive(Debug, Clone)]
pub struct SpawnCatalog {
    archetypes: Vec<Archetype>,
    total_weight: u32,
}

impl SpawnCatalog {
    pub fn new(archetypes: Vec<Archetype>) -> Result<Self, ConfigError> {
        if archetypes.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut total_weight: u32 = 0;
        for archetype in &archetypes {
            if archetype.weight == 0 {
                return Err(ConfigError::ZeroWeight {
                    label: archetype.label.clone(),
                });
            }
            total_weight = total_weight
                .checked_add(archetype.weight)
                .ok_or(ConfigError::WeightOverflow)?;
        }
        Ok(Self {
            archetypes,
            total_weight,
        })
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Archetype> {
        self.archetypes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Index selected by `roll` in [0, total_weight)
    pub fn select(&self, roll: f64) -> usize {
        let mut remainder = roll;
        for (i, archetype) in self.archetypes.iter().enumerate() {
            remainder -= archetype.weight as f64;
            if remainder <= 0.0 {
                return i;
            }
        }
        // Only reachable for rolls at or past the total
        self.archetypes.len() - 1
    }

    /// Draw an archetype index
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let roll = rng.random::<f64>() * self.total_weight as f64;
        self.select(roll)
    }
}

/// One spawn: the item plus delays of any burst follow-ups
#[derive(Debug, Clone)]
pub struct SpawnBatch {
    pub archetype: usize,
    pub item: FallingItem,
    /// Delays (ms from now) for extra spawns of the same archetype
    pub follow_ups: Vec<f64>,
}

/// Self-rescheduling item generator
#[derive(Debug, Clone)]
pub struct Spawner {
    catalog: SpawnCatalog,
    rng: Pcg32,
    item_size: Vec2,
    variation_ms: f64,
    burst: Option<BurstConfig>,
    timer: Option<TimerId>,
    next_id: u32,
}

impl Spawner {
    pub fn new(config: &SpawnConfig, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog: SpawnCatalog::new(config.catalog.clone())?,
            rng: Pcg32::seed_from_u64(seed),
            item_size: Vec2::splat(config.item_size),
            variation_ms: config.variation_ms.max(0.0),
            burst: config.burst,
            timer: None,
            next_id: 1,
        })
    }

    /// Draw an archetype and build its item
    pub fn spawn(&mut self, viewport_width: f32, fall_speed: f32) -> SpawnBatch {
        let archetype = self.catalog.choose(&mut self.rng);
        let item = self.build_item(archetype, viewport_width, fall_speed);
        let follow_ups = self.roll_burst(item.category);
        if !follow_ups.is_empty() {
            log::debug!("{} burst: {} extra", item.label, follow_ups.len());
        }
        SpawnBatch {
            archetype,
            item,
            follow_ups,
        }
    }

    /// Build an item of a specific archetype (burst follow-ups)
    pub fn spawn_archetype(
        &mut self,
        archetype: usize,
        viewport_width: f32,
        fall_speed: f32,
    ) -> Option<FallingItem> {
        (archetype < self.catalog.len())
            .then(|| self.build_item(archetype, viewport_width, fall_speed))
    }

    fn build_item(&mut self, archetype: usize, viewport_width: f32, fall_speed: f32) -> FallingItem {
        let max_x = (viewport_width - self.item_size.x).max(0.0);
        let x = if max_x > 0.0 {
            self.rng.random_range(0.0..max_x)
        } else {
            0.0
        };
        let id = self.next_id;
        self.next_id += 1;
        let kind = &self.catalog.archetypes[archetype];
        FallingItem::new(
            id,
            // Fully above the visible area
            Vec2::new(x, -self.item_size.y),
            self.item_size,
            kind.category,
            kind.label.clone(),
            kind.points,
            fall_speed,
        )
    }

    fn roll_burst(&mut self, category: ItemCategory) -> Vec<f64> {
        let Some(burst) = self.burst else {
            return Vec::new();
        };
        if burst.category != category || !self.rng.random_bool(burst.chance.clamp(0.0, 1.0)) {
            return Vec::new();
        }
        let extra = self
            .rng
            .random_range(burst.min_extra..=burst.max_extra.max(burst.min_extra));
        (1..=extra).map(|i| i as f64 * burst.stagger_ms).collect()
    }

    /// Delay before the next regular spawn
    pub fn next_delay(&mut self, interval_ms: f64) -> f64 {
        let jitter = if self.variation_ms > 0.0 {
            self.rng.random_range(0.0..self.variation_ms)
        } else {
            0.0
        };
        interval_ms + jitter
    }

    /// (Re)arm the spawn timer. Any previously armed timer is cancelled.
    pub fn arm<T>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: f64, task: T) {
        self.disarm(scheduler);
        self.timer = Some(scheduler.schedule_in(delay_ms, task));
    }

    pub fn disarm<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Claim a fired timer. False if `id` is not the armed spawn timer.
    pub fn claim(&mut self, id: TimerId) -> bool {
        if self.timer == Some(id) {
            self.timer = None;
            true
        } else {
            false
        }
    }
}
