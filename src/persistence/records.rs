//! Stored record types

use serde::{Deserialize, Serialize};

/// Lowest accepted generation tag
pub const MIN_GENERATION: u32 = 1;
/// Highest accepted generation tag
pub const MAX_GENERATION: u32 = 12;

/// A registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    /// Cohort tag in MIN_GENERATION..=MAX_GENERATION
    pub generation: u32,
    /// Milliseconds since the Unix epoch
    pub registered_at: f64,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>, generation: u32, registered_at: f64) -> Self {
        Self {
            id: format!("player_{}", registered_at as u64),
            name: name.into(),
            generation,
            registered_at,
        }
    }
}

/// One finished round. Created once per session and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub id: String,
    pub player_id: String,
    /// Base score plus time bonus
    pub score: u32,
    pub hazard_count: u32,
    /// Milliseconds since the Unix epoch
    pub played_at: f64,
    pub duration_ms: f64,
}
