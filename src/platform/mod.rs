//! Platform abstraction layer
//!
//! Handles browser/native differences for wall-clock time and RNG seeds.

use rand::Rng;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Fresh seed for a session (OS entropy; `crypto.getRandomValues` on web)
pub fn seed() -> u64 {
    rand::rng().random()
}
