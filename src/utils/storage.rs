//! Key/value storage areas with JSON-aware read/write helpers

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{PageKitError, Result};

/// Which storage area to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Persistent across runs
    Local,
    /// Lives as long as the process
    Session,
}

/// A string key/value store
pub trait StorageArea: Send + Sync {
    fn name(&self) -> &str;
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    /// All keys, sorted
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-process storage area
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.items.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

/// Storage area persisted as a JSON object file, rewritten on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`, starting empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), items = items.len(), "Opened file storage");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_items<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| PageKitError::storage(self.path.display().to_string(), e))?;
        Ok(f(&mut items))
    }

    /// Apply a mutation and write the result back to disk.
    ///
    /// The lock is held until the file is in place. The in-memory map only
    /// changes once the new contents have been persisted.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| PageKitError::storage(self.path.display().to_string(), e))?;

        let mut next = items.clone();
        f(&mut next);
        self.persist(&next)?;
        *items = next;

        trace!(path = %self.path.display(), items = items.len(), "Persisted file storage");
        Ok(())
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(items)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageArea for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.mutate(|items| {
            items.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.mutate(BTreeMap::clear)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.with_items(|items| items.keys().cloned().collect())
    }
}

/// Local and session storage behind one facade
#[derive(Clone)]
pub struct Storage {
    local: Arc<dyn StorageArea>,
    session: Arc<dyn StorageArea>,
}

impl Storage {
    pub fn new(local: Arc<dyn StorageArea>, session: Arc<dyn StorageArea>) -> Self {
        Self { local, session }
    }

    /// Both areas in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// Local area backed by the file at `local_path`, session area in memory
    pub fn open(local_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(
            Arc::new(FileStorage::open(local_path)?),
            Arc::new(MemoryStorage::new()),
        ))
    }

    pub fn area(&self, kind: StorageKind) -> &dyn StorageArea {
        match kind {
            StorageKind::Local => self.local.as_ref(),
            StorageKind::Session => self.session.as_ref(),
        }
    }

    /// Read a value.
    ///
    /// Missing and empty entries read as `None`. Text that parses as JSON is
    /// returned parsed, anything else comes back as a JSON string.
    pub fn get(&self, kind: StorageKind, key: &str) -> Result<Option<Value>> {
        let raw = match self.area(kind).get_item(key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };

        Ok(Some(
            serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        ))
    }

    /// Write a value. `null` is stored as an empty string so it does not
    /// read back as the text "null"; strings are stored as-is.
    pub fn set(&self, kind: StorageKind, key: &str, value: &Value) -> Result<()> {
        let raw = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        trace!(?kind, key, "Writing storage item");
        self.area(kind).set_item(key, &raw)
    }

    pub fn remove(&self, kind: StorageKind, key: &str) -> Result<()> {
        self.area(kind).remove_item(key)
    }
}
