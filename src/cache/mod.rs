//! Memoization layer over the feature registry, with persistence

pub mod feature_cache;

// Re-export the main cache type
pub use feature_cache::{FeatureCache, STORAGE_KEY};
