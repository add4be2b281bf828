//! Player and result persistence over a key-value store
//!
//! Each collection is one JSON value under a fixed key. Reads are lenient:
//! a missing or malformed value reads as an empty collection (and is logged),
//! never as an error. Writes propagate backend failures unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local_storage;
mod memory;
mod records;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;
pub use memory::MemoryStore;
pub use records::{MAX_GENERATION, MIN_GENERATION, PlayerRecord, SessionResult};

/// Storage key for the id -> player map
pub const PLAYERS_KEY: &str = "logo_catch_players";
/// Storage key for the result list
pub const RESULTS_KEY: &str = "logo_catch_results";
/// Storage key for the active player
pub const CURRENT_PLAYER_KEY: &str = "logo_catch_current_player";

#[derive(Debug)]
pub enum PersistenceError {
    /// Backend refused or failed the operation
    Storage(String),
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Serialize(e) => write!(f, "could not encode record: {e}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(_) => None,
            Self::Io(e) => Some(e),
            Self::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e)
    }
}

/// Durable string key-value storage
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Typed access to players, results, and the current player
#[derive(Debug, Clone, Default)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KvStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Decode `key`, falling back to the default on absence or bad data
    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, PersistenceError> {
        let Some(json) = self.store.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&json) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("Ignoring malformed data under '{key}': {e}");
                Ok(T::default())
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    /// Insert or replace a player by id
    pub fn save_player(&mut self, player: &PlayerRecord) -> Result<(), PersistenceError> {
        let mut players = self.all_players()?;
        players.insert(player.id.clone(), player.clone());
        self.write(PLAYERS_KEY, &players)?;
        log::debug!("Saved player {} ({})", player.name, player.id);
        Ok(())
    }

    pub fn all_players(&self) -> Result<BTreeMap<String, PlayerRecord>, PersistenceError> {
        self.read(PLAYERS_KEY)
    }

    /// Append a result
    pub fn save_result(&mut self, result: &SessionResult) -> Result<(), PersistenceError> {
        let mut results = self.all_results()?;
        results.push(result.clone());
        self.write(RESULTS_KEY, &results)?;
        log::info!(
            "Saved result {} for {}: {} points",
            result.id,
            result.player_id,
            result.score
        );
        Ok(())
    }

    /// Results in insertion order
    pub fn all_results(&self) -> Result<Vec<SessionResult>, PersistenceError> {
        self.read(RESULTS_KEY)
    }

    pub fn current_player(&self) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.read(CURRENT_PLAYER_KEY)
    }

    pub fn set_current_player(&mut self, player: &PlayerRecord) -> Result<(), PersistenceError> {
        self.write(CURRENT_PLAYER_KEY, player)
    }

    /// Erase players, results, and the current player
    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        self.store.remove(PLAYERS_KEY)?;
        self.store.remove(RESULTS_KEY)?;
        self.store.remove(CURRENT_PLAYER_KEY)?;
        log::info!("All stored data cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, player: &str, score: u32) -> SessionResult {
        SessionResult {
            id: id.to_string(),
            player_id: player.to_string(),
            score,
            hazard_count: 1,
            played_at: 1_700_000_000_000.0,
            duration_ms: 60_000.0,
        }
    }

    #[test]
    fn test_player_round_trip() {
        let mut p = Persistence::new(MemoryStore::new());
        let ana = PlayerRecord::new("Ana Torres", 7, 1_700_000_000_123.0);
        p.save_player(&ana).unwrap();

        let players = p.all_players().unwrap();
        let stored = &players[&ana.id];
        assert_eq!(stored.id, ana.id);
        assert_eq!(stored.name, "Ana Torres");
        assert_eq!(stored.generation, 7);
        assert_eq!(stored.registered_at, ana.registered_at);
    }

    #[test]
    fn test_results_append_in_order() {
        let mut p = Persistence::new(MemoryStore::new());
        p.save_result(&result("r1", "a", 10)).unwrap();
        p.save_result(&result("r2", "b", 30)).unwrap();
        p.save_result(&result("r3", "a", 20)).unwrap();
        let ids: Vec<String> = p.all_results().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_malformed_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set(PLAYERS_KEY, "{not json").unwrap();
        store.set(RESULTS_KEY, "42").unwrap();
        store.set(CURRENT_PLAYER_KEY, "[]").unwrap();
        let p = Persistence::new(store);
        assert!(p.all_players().unwrap().is_empty());
        assert!(p.all_results().unwrap().is_empty());
        assert_eq!(p.current_player().unwrap(), None);
    }

    #[test]
    fn test_current_player_and_clear_all() {
        let mut p = Persistence::new(MemoryStore::new());
        let bo = PlayerRecord::new("Bo", 3, 5.0);
        p.save_player(&bo).unwrap();
        p.set_current_player(&bo).unwrap();
        p.save_result(&result("r1", &bo.id, 99)).unwrap();
        assert_eq!(p.current_player().unwrap(), Some(bo));

        p.clear_all().unwrap();
        assert!(p.all_players().unwrap().is_empty());
        assert!(p.all_results().unwrap().is_empty());
        assert_eq!(p.current_player().unwrap(), None);
        assert!(p.store().is_empty());
    }

    #[test]
    fn test_storage_failure_propagates() {
        struct Broken;
        impl KvStore for Broken {
            fn get(&self, _: &str) -> Result<Option<String>, PersistenceError> {
                Ok(None)
            }
            fn set(&mut self, _: &str, _: &str) -> Result<(), PersistenceError> {
                Err(PersistenceError::Storage("quota exceeded".to_string()))
            }
            fn remove(&mut self, _: &str) -> Result<(), PersistenceError> {
                Ok(())
            }
        }
        let mut p = Persistence::new(Broken);
        let err = p.save_result(&result("r1", "a", 1)).unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
    }
}
