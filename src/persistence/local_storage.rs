//! Browser LocalStorage store

use super::{KvStore, PersistenceError};

pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

fn js_err(e: wasm_bindgen::JsValue) -> PersistenceError {
    PersistenceError::Storage(format!("{e:?}"))
}

impl LocalStorageStore {
    /// The window's LocalStorage, if the browser allows it
    pub fn open() -> Result<Self, PersistenceError> {
        let window = web_sys::window()
            .ok_or_else(|| PersistenceError::Storage("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(js_err)?
            .ok_or_else(|| PersistenceError::Storage("LocalStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl KvStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage.set_item(key, value).map_err(js_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.storage.remove_item(key).map_err(js_err)
    }
}
