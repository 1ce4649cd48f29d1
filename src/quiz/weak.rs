use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::quiz::StoreError;

pub const WEAK_ITEMS_KEY: &str = "weak_items";

/// Minimal string key/value persistence, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// All entries live in one JSON object file, rewritten whole on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    /// A file that was read but holds no valid JSON object is moved to
    /// `<name>.json.bad` first, so the next write can't destroy it.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed store {}: {}", path.display(), e);
                set_aside(&path);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("Ignoring store {} that is not UTF-8: {}", path.display(), e);
                set_aside(&path);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Cannot read store {}, starting empty: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        info!("Opened key/value store at {} ({} keys)", path.display(), entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn set_aside(path: &Path) {
    let backup = path.with_extension("json.bad");
    match fs::rename(path, &backup) {
        Ok(()) => warn!("Moved unreadable store to {}", backup.display()),
        Err(e) => warn!("Could not move {} aside: {}", path.display(), e),
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.write()
    }
}

/// Lets one store be shared between many trackers (one per chat).
impl<S: KeyValueStore> KeyValueStore for Arc<Mutex<S>> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.set(key, value)
    }
}

/// The set of record ids a user has answered wrongly, persisted as a JSON array.
#[derive(Debug)]
pub struct WeakTracker<S> {
    store: S,
    key: String,
    ids: BTreeSet<u32>,
}

impl<S: KeyValueStore> WeakTracker<S> {
    /// Loads the set stored under `key`. Absent or malformed values give an empty set.
    pub fn open(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let ids = match store.get(&key) {
            Ok(Some(json)) => serde_json::from_str::<Vec<u32>>(&json)
                .map(|ids| ids.into_iter().collect())
                .unwrap_or_else(|e| {
                    warn!("Ignoring malformed weak items under {}: {}", key, e);
                    BTreeSet::new()
                }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read weak items under {}: {}", key, e);
                BTreeSet::new()
            }
        };
        Self { store, key, ids }
    }

    /// Returns whether the id was new.
    pub fn add(&mut self, id: u32) -> Result<bool, StoreError> {
        if self.ids.contains(&id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.insert(id);
        self.persist(ids)?;
        Ok(true)
    }

    /// Returns whether the id was present.
    pub fn remove(&mut self, id: u32) -> Result<bool, StoreError> {
        if !self.ids.contains(&id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.remove(&id);
        self.persist(ids)?;
        Ok(true)
    }

    /// Empties the set. Callers confirm with the user first.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.persist(BTreeSet::new())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn all(&self) -> &BTreeSet<u32> {
        &self.ids
    }

    // Only adopt the new set once it is on disk.
    fn persist(&mut self, ids: BTreeSet<u32>) -> Result<(), StoreError> {
        let json = serde_json::to_string(&ids.iter().collect::<Vec<_>>())?;
        self.store.set(&self.key, json)?;
        self.ids = ids;
        Ok(())
    }
}
