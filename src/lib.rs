//! featcache - Persists feature-detection results across process starts
//!
//! This crate provides functionality to:
//! - Memoize feature and property detection results in an in-memory record
//! - Persist that record through a key/value store and rehydrate it at startup
//! - Seed a feature registry from persisted results so detection probes are skipped
pub mod cache;
pub mod error;
pub mod interfaces;
pub mod services;
pub mod types;

// Re-export commonly used types and traits
pub use cache::{FeatureCache, STORAGE_KEY};
pub use error::{Error, Result};
pub use interfaces::{FeatureRegistry, KeyValueStore};
pub use types::FeatureRecord;
