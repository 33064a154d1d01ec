use crate::NavError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

const STORE_FILE: &str = "navigation.json";

/// Durable string key/value storage used to survive reloads.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, NavError>;
    fn set(&self, key: &str, value: &str) -> Result<(), NavError>;
    fn remove(&self, key: &str) -> Result<(), NavError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, NavError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| NavError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), NavError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NavError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), NavError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NavError::Storage("memory store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Key/value store backed by a single JSON object file.
///
/// The whole file is rewritten on every change. A missing file starts empty;
/// an unreadable one is logged and replaced on the next write.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens `navigation.json` under the user's data directory.
    pub fn new() -> Result<Self, NavError> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            NavError::IoError(std::io::Error::other("Could not find data directory"))
        })?;

        Self::open(data_dir.join("dbnav").join(STORE_FILE))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NavError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!(
                        "Failed to parse navigation store {} ({}), starting empty",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), NavError> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, NavError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| NavError::Storage("file store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), NavError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| NavError::Storage("file store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), NavError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| NavError::Storage("file store lock poisoned".into()))?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}
