//! Trait seams for the two external collaborators
//!
//! The cache composes a feature registry and a key/value store. Both are
//! abstracted behind traits so hosts can plug in their own detection
//! routine and persistence mechanism.

pub mod feature_registry;
pub mod key_value_store;

pub use feature_registry::FeatureRegistry;
pub use key_value_store::KeyValueStore;
