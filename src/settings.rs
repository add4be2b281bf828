//! Game configuration
//!
//! Every tunable of a round lives here. Persisted as JSON (LocalStorage on
//! web, a file named by `LOGO_CATCH_CONFIG` on native) and validated on load.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::entity::{CollisionPolicy, ItemCategory};
use crate::sim::spawn::Archetype;

/// Playfield size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

/// Basket geometry and speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasketConfig {
    pub width: f32,
    pub height: f32,
    pub start_x: f32,
    pub y: f32,
    pub speed: f32,
}

impl Default for BasketConfig {
    fn default() -> Self {
        Self {
            width: BASKET_WIDTH,
            height: BASKET_HEIGHT,
            start_x: BASKET_START_X,
            y: BASKET_Y,
            speed: BASKET_SPEED,
        }
    }
}

/// Points for the non-trivial categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Festive items add a random bonus in 0..=cap
    pub festive_bonus_cap: u32,
    /// Points a thief takes
    pub thief_steal: u32,
    /// Bonus per second left when the round ends
    pub time_bonus_per_second: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            festive_bonus_cap: FESTIVE_BONUS_CAP,
            thief_steal: THIEF_STEAL,
            time_bonus_per_second: TIME_BONUS_PER_SECOND,
        }
    }
}

/// How pointer/touch position drives the basket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PointerTracking {
    /// Basket center jumps to the pointer
    #[default]
    Direct,
    /// Basket steps toward the pointer at its normal speed
    Step { deadzone: f32 },
}

/// Difficulty ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base_spawn_interval_ms: f64,
    pub min_spawn_interval_ms: f64,
    pub spawn_interval_step_ms: f64,
    pub base_fall_speed: f32,
    pub max_fall_speed: f32,
    pub fall_speed_step: f32,
    /// Remaining-seconds values at which difficulty steps up
    pub checkpoints: Vec<u32>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_spawn_interval_ms: BASE_SPAWN_INTERVAL_MS,
            min_spawn_interval_ms: MIN_SPAWN_INTERVAL_MS,
            spawn_interval_step_ms: SPAWN_INTERVAL_STEP_MS,
            base_fall_speed: BASE_FALL_SPEED,
            max_fall_speed: MAX_FALL_SPEED,
            fall_speed_step: FALL_SPEED_STEP,
            checkpoints: vec![45, 30, 15],
        }
    }
}

impl DifficultyConfig {
    /// Steps up every ten seconds instead of every fifteen
    pub fn accelerated() -> Self {
        Self {
            checkpoints: vec![50, 40, 30, 20, 10],
            ..Self::default()
        }
    }
}

/// Extra spawns that sometimes follow a particular category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstConfig {
    pub category: ItemCategory,
    /// Probability in [0, 1]
    pub chance: f64,
    pub min_extra: u32,
    pub max_extra: u32,
    /// Delay between consecutive follow-ups
    pub stagger_ms: f64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            category: ItemCategory::Hazard,
            chance: 0.1,
            min_extra: 2,
            max_extra: 3,
            stagger_ms: 150.0,
        }
    }
}

/// Spawn catalog and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub item_size: f32,
    /// Random extra delay in [0, variation) on top of the spawn interval
    pub variation_ms: f64,
    /// Weighted archetypes, sampled in this order
    pub catalog: Vec<Archetype>,
    pub burst: Option<BurstConfig>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            item_size: ITEM_SIZE,
            variation_ms: SPAWN_VARIATION_MS,
            catalog: default_catalog(),
            burst: Some(BurstConfig::default()),
        }
    }
}

/// Default archetypes: ten language logos, the bonus logo, a festive gift,
/// carbon, and the grinch
pub fn default_catalog() -> Vec<Archetype> {
    use ItemCategory::*;
    vec![
        Archetype::new("javascript", Standard, 10, 15),
        Archetype::new("python", Standard, 15, 15),
        Archetype::new("java", Standard, 12, 15),
        Archetype::new("react", Standard, 18, 12),
        Archetype::new("nodejs", Standard, 14, 12),
        Archetype::new("csharp", Standard, 16, 10),
        Archetype::new("cpp", Standard, 20, 8),
        Archetype::new("php", Standard, 8, 10),
        Archetype::new("html", Standard, 6, 12),
        Archetype::new("css", Standard, 8, 12),
        Archetype::new("infotec", Bonus, 50, 8),
        Archetype::new("gift", Festive, 15, 6),
        Archetype::new("carbon", Hazard, 0, 50),
        Archetype::new("grinch", Thief, 0, 4),
    ]
}

/// Rejected configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyCatalog,
    ZeroWeight { label: String },
    WeightOverflow,
    NonPositive { field: &'static str, value: f64 },
    Negative { field: &'static str, value: f64 },
    BasketTooWide { basket: f32, viewport: f32 },
    ItemTooWide { item: f32, viewport: f32 },
    InvalidBurst { reason: &'static str },
    InvalidDifficulty { reason: &'static str },
    InvalidCollision { margin: f32 },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "spawn catalog is empty"),
            Self::ZeroWeight { label } => write!(f, "archetype '{label}' has zero weight"),
            Self::WeightOverflow => write!(f, "total spawn weight overflows u32"),
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be positive (got {value})")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            Self::BasketTooWide { basket, viewport } => {
                write!(f, "basket width {basket} exceeds viewport width {viewport}")
            }
            Self::ItemTooWide { item, viewport } => {
                write!(f, "item size {item} exceeds viewport width {viewport}")
            }
            Self::InvalidBurst { reason } => write!(f, "invalid burst config: {reason}"),
            Self::InvalidDifficulty { reason } => {
                write!(f, "invalid difficulty config: {reason}")
            }
            Self::InvalidCollision { margin } => {
                write!(f, "collision margin must be finite and non-negative (got {margin})")
            }
            Self::Parse(msg) => write!(f, "malformed config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Complete round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub viewport: ViewportConfig,
    pub basket: BasketConfig,
    pub round_seconds: u32,
    pub max_hazards: u32,
    /// Points per level
    pub level_step: u32,
    pub scoring: ScoringConfig,
    pub collision: CollisionPolicy,
    pub pointer: PointerTracking,
    pub difficulty: DifficultyConfig,
    pub spawn: SpawnConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            basket: BasketConfig::default(),
            round_seconds: ROUND_SECONDS,
            max_hazards: MAX_HAZARDS,
            level_step: LEVEL_STEP,
            scoring: ScoringConfig::default(),
            collision: CollisionPolicy::Strict,
            pointer: PointerTracking::Direct,
            difficulty: DifficultyConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl GameConfig {
    /// Check every invariant the session relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("viewport.width", self.viewport.width as f64)?;
        positive("viewport.height", self.viewport.height as f64)?;
        positive("basket.width", self.basket.width as f64)?;
        positive("basket.height", self.basket.height as f64)?;
        non_negative("basket.speed", self.basket.speed as f64)?;
        if self.basket.width > self.viewport.width {
            return Err(ConfigError::BasketTooWide {
                basket: self.basket.width,
                viewport: self.viewport.width,
            });
        }
        positive("spawn.item_size", self.spawn.item_size as f64)?;
        if self.spawn.item_size > self.viewport.width {
            return Err(ConfigError::ItemTooWide {
                item: self.spawn.item_size,
                viewport: self.viewport.width,
            });
        }
        non_negative("spawn.variation_ms", self.spawn.variation_ms)?;
        positive("round_seconds", self.round_seconds as f64)?;
        positive("max_hazards", self.max_hazards as f64)?;
        positive("level_step", self.level_step as f64)?;

        let d = &self.difficulty;
        positive("difficulty.base_spawn_interval_ms", d.base_spawn_interval_ms)?;
        positive("difficulty.min_spawn_interval_ms", d.min_spawn_interval_ms)?;
        non_negative("difficulty.spawn_interval_step_ms", d.spawn_interval_step_ms)?;
        non_negative("difficulty.base_fall_speed", d.base_fall_speed as f64)?;
        non_negative("difficulty.fall_speed_step", d.fall_speed_step as f64)?;
        if d.min_spawn_interval_ms > d.base_spawn_interval_ms {
            return Err(ConfigError::InvalidDifficulty {
                reason: "min spawn interval above base interval",
            });
        }
        if !d.max_fall_speed.is_finite() {
            return Err(ConfigError::InvalidDifficulty {
                reason: "max fall speed is not finite",
            });
        }
        if d.max_fall_speed < d.base_fall_speed {
            return Err(ConfigError::InvalidDifficulty {
                reason: "max fall speed below base fall speed",
            });
        }

        if let CollisionPolicy::Generous { margin } = self.collision {
            if !margin.is_finite() || margin < 0.0 {
                return Err(ConfigError::InvalidCollision { margin });
            }
        }

        if let Some(burst) = &self.spawn.burst {
            if !(0.0..=1.0).contains(&burst.chance) {
                return Err(ConfigError::InvalidBurst {
                    reason: "chance outside [0, 1]",
                });
            }
            if burst.min_extra > burst.max_extra {
                return Err(ConfigError::InvalidBurst {
                    reason: "min_extra above max_extra",
                });
            }
            non_negative("spawn.burst.stagger_ms", burst.stagger_ms)?;
        }

        // Catalog checks live with the catalog
        crate::sim::spawn::SpawnCatalog::new(self.spawn.catalog.clone()).map(|_| ())
    }

    /// LocalStorage key / default file name
    const STORAGE_KEY: &'static str = "logo_catch_config";

    /// Environment variable naming a JSON config file (native)
    pub const ENV_PATH: &'static str = "LOGO_CATCH_CONFIG";

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {e}"),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Config saved");
            }
        }
    }

    /// Load config from the file named by `LOGO_CATCH_CONFIG` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_PATH) else {
            log::info!("Using default config");
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {path}");
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring config {path}: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read config {path}: {e}");
                Self::default()
            }
        }
    }

    /// Save config next to the loaded one, or to `logo_catch_config.json` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        let path = std::env::var(Self::ENV_PATH)
            .unwrap_or_else(|_| format!("{}.json", Self::STORAGE_KEY));
        match serde_json::to_string_pretty(self) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => log::info!("Config saved to {path}"),
                Err(e) => log::warn!("Could not save config {path}: {e}"),
            },
            Err(e) => log::warn!("Could not encode config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
        let accelerated = GameConfig {
            difficulty: DifficultyConfig::accelerated(),
            ..GameConfig::default()
        };
        assert_eq!(accelerated.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.basket.width = 900.0;
        assert!(matches!(config.validate(), Err(ConfigError::BasketTooWide { .. })));

        let mut config = GameConfig::default();
        config.round_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "round_seconds", .. })
        ));

        let mut config = GameConfig::default();
        config.spawn.catalog.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyCatalog));

        let mut config = GameConfig::default();
        config.spawn.catalog[0].weight = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWeight { .. })));

        let mut config = GameConfig::default();
        if let Some(burst) = config.spawn.burst.as_mut() {
            burst.chance = 1.5;
        }
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBurst { .. })));

        let mut config = GameConfig::default();
        config.difficulty.max_fall_speed = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDifficulty { .. })));
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = GameConfig::from_json(r#"{"round_seconds": 90, "collision": {"Generous": {"margin": 5.0}}}"#)
            .unwrap();
        assert_eq!(config.round_seconds, 90);
        assert_eq!(config.collision, CollisionPolicy::Generous { margin: 5.0 });
        assert_eq!(config.max_hazards, MAX_HAZARDS);
        assert_eq!(config.spawn.catalog.len(), 14);
    }

    #[test]
    fn test_json_invalid_is_rejected() {
        assert!(matches!(GameConfig::from_json("not json"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            GameConfig::from_json(r#"{"max_hazards": 0}"#),
            Err(ConfigError::NonPositive { field: "max_hazards", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_collision_margin() {
        assert!(matches!(
            GameConfig::from_json(r#"{"collision": {"Generous": {"margin": -100.0}}}"#),
            Err(ConfigError::InvalidCollision { .. })
        ));

        let config = GameConfig {
            collision: CollisionPolicy::Generous { margin: f32::NAN },
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCollision { .. })));

        let config = GameConfig {
            collision: CollisionPolicy::Generous { margin: 0.0 },
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_nan_fall_speed_cap() {
        let mut config = GameConfig::default();
        config.difficulty.max_fall_speed = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDifficulty { .. })));

        let mut config = GameConfig::default();
        config.difficulty.max_fall_speed = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDifficulty { .. })));
    }

    #[test]
    fn test_default_catalog_shape() {
        let catalog = default_catalog();
        let total: u32 = catalog.iter().map(|a| a.weight).sum();
        assert_eq!(total, 189);
        assert_eq!(
            catalog.iter().filter(|a| a.category == ItemCategory::Hazard).count(),
            1
        );
    }
}
