//! Settings store - the macro-name to action-list mapping.
//!
//! The engine only ever reads the mapping and listens for change
//! notifications; which file (or editor surface) backs it is an external
//! concern behind [`SettingsStore`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;

/// Read access to the macro mapping, plus a change signal. The receiver
/// observes a new generation after every mutation; the registry reloads on
/// each one.
pub trait SettingsStore: Send + Sync {
    /// The current raw mapping, macro name -> arbitrary value. Values that
    /// are not sequences are kept here and filtered at registration.
    fn macros(&self) -> BTreeMap<String, Value>;

    fn subscribe(&self) -> watch::Receiver<u64>;
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    macros: BTreeMap<String, Value>,
}

struct Shared {
    mapping: RwLock<BTreeMap<String, Value>>,
    changes: watch::Sender<u64>,
}

impl Shared {
    fn new(mapping: BTreeMap<String, Value>) -> Self {
        Self {
            mapping: RwLock::new(mapping),
            changes: watch::Sender::new(0),
        }
    }

    fn read(&self) -> BTreeMap<String, Value> {
        self.mapping
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, mapping: BTreeMap<String, Value>) {
        *self
            .mapping
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = mapping;
        self.changes.send_modify(|generation| *generation += 1);
    }
}

/// YAML-file-backed settings under a top-level `macros:` key. A missing
/// file reads as an empty mapping so first runs work without setup.
pub struct FileSettings {
    path: PathBuf,
    shared: Shared,
}

impl FileSettings {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("loading macro settings from {:?}", path);
        let mapping = Self::read_file(&path).await?;
        debug!("loaded {} settings entries", mapping.len());
        Ok(Self {
            shared: Shared::new(mapping),
            path,
        })
    }

    /// Re-read the file and notify subscribers.
    pub async fn reload_from_disk(&self) -> Result<()> {
        let mapping = Self::read_file(&self.path).await?;
        debug!("reloaded {} settings entries", mapping.len());
        self.shared.replace(mapping);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accessor reserved alongside `get`, `update`, and `inspect`; macro
    /// names colliding with these are never registered.
    pub fn has(&self, name: &str) -> bool {
        self.shared.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.shared.read().get(name).cloned()
    }

    async fn read_file(path: &Path) -> Result<BTreeMap<String, Value>> {
        if !path.exists() {
            debug!("no settings file at {:?} yet, starting empty", path);
            return Ok(BTreeMap::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let file: SettingsFile = serde_yaml_ng::from_str(&content)?;
        Ok(file.macros)
    }
}

impl SettingsStore for FileSettings {
    fn macros(&self) -> BTreeMap<String, Value> {
        self.shared.read()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }
}

/// In-memory settings, mutated directly. Backs tests and embedders that
/// manage their own persistence.
pub struct MemorySettings {
    shared: Shared,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::from_mapping(BTreeMap::new())
    }

    pub fn from_mapping(mapping: BTreeMap<String, Value>) -> Self {
        Self {
            shared: Shared::new(mapping),
        }
    }

    pub fn update(&self, name: &str, value: Value) {
        let mut mapping = self.shared.read();
        mapping.insert(name.to_string(), value);
        self.shared.replace(mapping);
    }

    pub fn remove(&self, name: &str) {
        let mut mapping = self.shared.read();
        mapping.remove(name);
        self.shared.replace(mapping);
    }

    pub fn has(&self, name: &str) -> bool {
        self.shared.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.shared.read().get(name).cloned()
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettings {
    fn macros(&self) -> BTreeMap<String, Value> {
        self.shared.read()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }
}
