//! JSON-file key-value store.
//!
//! The file holds one flat JSON object (`{"username": "criodo", ...}`).
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so a reader never sees a half-written session.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::{KeyValueStore, StorageError};

type Entries = BTreeMap<String, String>;

/// A [`KeyValueStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Use `path` as the backing file. It is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Entries::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // NamedTempFile is created with owner-only permissions
        let mut file = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut file, entries)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), "Session file written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let mut map = self.load()?;
        Ok(keys.iter().map(|key| map.remove(*key)).collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut map = self.load()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.save(&map)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
