use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use classdeck_core::Settings;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value store of class settings.
pub trait SettingsStore {
    /// `Ok(None)` when nothing was saved under `key`.
    fn load(&self, key: &str) -> Result<Option<Settings>, StoreError>;
    fn save(&mut self, key: &str, settings: &Settings) -> Result<(), StoreError>;
}

/// One pretty-printed JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    dir: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self, key: &str) -> Result<Option<Settings>, StoreError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let settings = serde_json::from_str(&raw)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(Some(settings))
    }

    fn save(&mut self, key: &str, settings: &Settings) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        fs::write(&path, serde_json::to_string_pretty(settings)?)?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    entries: HashMap<String, Settings>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<Settings>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, settings: &Settings) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn german_b2() -> Settings {
        Settings {
            language: "German".to_string(),
            level: "B2".to_string(),
            native_language: "English".to_string(),
            age_group: "Adults".to_string(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonFileSettingsStore::new(tmp.path().join("nested"));
        let key = Settings::storage_key(Some("/decks/week1.pptx"));

        assert!(store.load(&key).unwrap().is_none());
        store.save(&key, &german_b2()).unwrap();
        assert_eq!(store.load(&key).unwrap(), Some(german_b2()));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "{oops").unwrap();
        let store = JsonFileSettingsStore::new(tmp.path());
        assert!(matches!(store.load("bad"), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemorySettingsStore::default();
        store.save("k", &german_b2()).unwrap();
        assert_eq!(store.load("k").unwrap().unwrap().badge(), "B2 German");
        assert!(store.load("other").unwrap().is_none());
    }
}
