//! Key/value persistence interface

use crate::error::Result;

/// Trait for a durable single-slot key/value store
pub trait KeyValueStore {
    /// Read the value stored under a key, if present
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value under a key, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete the value stored under a key, if present
    fn remove(&mut self, key: &str) -> Result<()>;
}
