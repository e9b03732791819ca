//! File-backed key/value store

use crate::{error::Result, interfaces::KeyValueStore};
use std::path::PathBuf;
use tracing::debug;

/// Key/value store that keeps one file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::encode_key(key)))
    }

    // Keys may contain path separators; flatten them so every slot stays
    // directly under the store directory
    fn encode_key(key: &str) -> String {
        key.replace('/', "__").replace('\\', "__").replace(':', "_")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(key);
        debug!("Writing slot {:?}", path);
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
