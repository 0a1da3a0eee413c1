use crate::{CoreResult, OverlayError};

use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    panic::Location,
    path::{Path, PathBuf},
    sync::Mutex,
};

use error_location::ErrorLocation;
use tracing::{debug, error};

/// String key/value persistence with get/set/remove semantics.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    /// Remove a key. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Process-local storage shared by every context that holds a reference.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| {
            error!("Storage lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    #[track_caller]
    pub fn open(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!(storage_dir = ?dir, "Created storage directory");
        }

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    #[track_caller]
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OverlayError::Storage {
                reason: format!("Failed to read {}: {}", key, e),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Atomic write: temp file, sync, then rename over the final path.
    #[track_caller]
    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        let storage_error = |step: &str, e: std::io::Error| OverlayError::Storage {
            reason: format!("Failed to {} {}: {}", step, key, e),
            location: ErrorLocation::from(Location::caller()),
        };

        let mut temp_file =
            fs::File::create(&temp_path).map_err(|e| storage_error("create temp file for", e))?;
        temp_file
            .write_all(value.as_bytes())
            .map_err(|e| storage_error("write", e))?;
        temp_file.sync_all().map_err(|e| storage_error("sync", e))?;
        fs::rename(&temp_path, &path).map_err(|e| storage_error("rename", e))?;

        Ok(())
    }

    #[track_caller]
    fn remove(&self, key: &str) -> CoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OverlayError::Storage {
                reason: format!("Failed to remove {}: {}", key, e),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
