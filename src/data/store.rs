use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::config::series_cache_filename;

/// Injected storage backend for the market-data cache. Keys are symbols;
/// values are opaque serialized blobs.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// On-disk backend: one JSON blob per symbol under a configured directory.
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(series_cache_filename(key))
    }
}

impl CacheStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("Failed to read cache file: {}", path.display())),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.directory).context(format!(
            "Failed to create directory: {}",
            self.directory.display()
        ))?;
        let path = self.path_for(key);
        std::fs::write(&path, bytes)
            .context(format!("Failed to write cache file: {}", path.display()))
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().expect("store lock poisoned").get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.map
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
