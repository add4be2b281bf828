//! Logo Catch - A falling-logo catching arcade game
//!
//! Core modules:
//! - `sim`: Deterministic session engine (entities, clock, spawning, scoring)
//! - `persistence`: Key-value storage of players and round results
//! - `settings`: Data-driven game configuration
//! - `highscores`: Rankings and statistics over stored results
//! - `game`: Application controller wiring the session to storage and UI
//! - `platform`: Browser/native time and seed sources

pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use game::{Game, GameError, GameObserver, RegistrationError};
pub use highscores::{GenerationStats, Leaderboard, PlayerStats, RankingEntry};
pub use persistence::{KvStore, MemoryStore, Persistence, PersistenceError, PlayerRecord, SessionResult};
pub use settings::{ConfigError, GameConfig};

/// Game configuration constants (defaults for `GameConfig`)
pub mod consts {
    /// Playfield dimensions
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Basket defaults
    pub const BASKET_WIDTH: f32 = 80.0;
    pub const BASKET_HEIGHT: f32 = 60.0;
    pub const BASKET_START_X: f32 = 360.0;
    pub const BASKET_Y: f32 = 540.0;
    /// Horizontal displacement per frame while a direction is held
    pub const BASKET_SPEED: f32 = 5.0;

    /// Falling item size (square)
    pub const ITEM_SIZE: f32 = 50.0;

    /// Round length in seconds
    pub const ROUND_SECONDS: u32 = 60;
    /// Hazards collected before the round is lost
    pub const MAX_HAZARDS: u32 = 5;
    /// Points per level (level = score / LEVEL_STEP + 1)
    pub const LEVEL_STEP: u32 = 200;
    /// Bonus points per second left on the clock
    pub const TIME_BONUS_PER_SECOND: u32 = 2;

    /// Festive items add a random 0..=cap on top of their points
    pub const FESTIVE_BONUS_CAP: u32 = 10;
    /// Score removed by a thief (never below zero)
    pub const THIEF_STEAL: u32 = 50;

    /// Spawn timing (milliseconds)
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 1500.0;
    pub const MIN_SPAWN_INTERVAL_MS: f64 = 800.0;
    pub const SPAWN_INTERVAL_STEP_MS: f64 = 200.0;
    pub const SPAWN_VARIATION_MS: f64 = 500.0;

    /// Fall speed (units per frame)
    pub const BASE_FALL_SPEED: f32 = 2.0;
    pub const MAX_FALL_SPEED: f32 = 5.0;
    pub const FALL_SPEED_STEP: f32 = 0.5;

    /// Clock tick period
    pub const TICK_MS: f64 = 1000.0;
}

