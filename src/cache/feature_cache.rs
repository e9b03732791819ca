use crate::{
    error::Result,
    interfaces::{FeatureRegistry, KeyValueStore},
    types::FeatureRecord,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Fixed slot in the key/value store holding the serialized record.
pub const STORAGE_KEY: &str = "FeatDetectStorage";

/// Memoizing decorator over a feature registry.
///
/// Answers queries from an in-memory record first and falls back to the
/// wrapped registry on a miss. The record can be flushed to the wrapped
/// store with [`store`](FeatureCache::store) so a later process start
/// rehydrates it and skips the detection probes entirely.
///
/// The cache itself implements [`FeatureRegistry`], so it can stand in
/// anywhere the plain registry is expected.
#[derive(Debug)]
pub struct FeatureCache<R, S> {
    registry: R,
    store: S,
    record: FeatureRecord,
}

impl<R: FeatureRegistry, S: KeyValueStore> FeatureCache<R, S> {
    /// Build the cache and rehydrate it from the store.
    pub fn new(registry: R, store: S) -> Result<Self> {
        let mut cache = Self {
            registry,
            store,
            record: FeatureRecord::default(),
        };
        cache.rehydrate()?;
        Ok(cache)
    }

    /// Reload previously persisted detection results.
    ///
    /// Stored values take priority over anything already resolved in
    /// memory; in-memory keys the stored record lacks survive the merge.
    /// Every feature in the merged set is registered back into the
    /// registry as a non-authoritative seed, and the stored prefix (if
    /// any) becomes the registry's active prefix.
    ///
    /// A missing slot is not an error; the record is left untouched. A
    /// malformed payload propagates as a serialization error.
    pub fn rehydrate(&mut self) -> Result<()> {
        let Some(payload) = self.store.get(STORAGE_KEY)? else {
            debug!("No persisted record under {}, skipping rehydration", STORAGE_KEY);
            return Ok(());
        };

        let mut stored: FeatureRecord = serde_json::from_str(&payload)?;
        let detected = std::mem::take(&mut self.record);
        stored.merge_detected(detected);

        for (name, value) in &stored.features {
            self.registry.inquire(name, *value, false);
        }

        if stored.has_prefix() {
            self.registry.set_prefix(Some(stored.prefix.clone()));
        } else {
            self.registry.set_prefix(None);
            stored.prefix = String::new();
        }

        debug!(
            "Rehydrated {} features and {} props",
            stored.features.len(),
            stored.props.len()
        );
        self.record = stored;
        Ok(())
    }

    /// Query a feature flag, memoizing boolean results.
    ///
    /// A result of any other shape is returned as-is but never cached.
    pub fn has(&mut self, feature: &str) -> Option<Value> {
        if let Some(&known) = self.record.features.get(feature) {
            return Some(Value::Bool(known));
        }

        let result = self.registry.probe(feature);
        if let Some(Value::Bool(flag)) = result {
            debug!("Caching probed feature {:?} = {}", feature, flag);
            self.record.features.insert(feature.to_string(), flag);
        }
        result
    }

    /// Query a named property, memoizing string results.
    pub fn prop(&mut self, key: &str) -> Option<Value> {
        if let Some(known) = self.record.props.get(key) {
            return Some(Value::String(known.clone()));
        }

        let result = self.registry.probe_prop(key);
        if let Some(Value::String(text)) = &result {
            debug!("Caching probed property {:?}", key);
            self.record.props.insert(key.to_string(), text.clone());
        }
        result
    }

    /// Persist everything the registry has resolved so far.
    ///
    /// The registry's resolved facts are folded into the record without
    /// overwriting entries already present; values of an unexpected type
    /// are skipped. The full record is then written to the store under
    /// [`STORAGE_KEY`].
    pub fn store(&mut self) -> Result<()> {
        for (name, value) in self.registry.features() {
            if let Value::Bool(flag) = value {
                self.record.features.entry(name).or_insert(flag);
            }
        }
        for (name, value) in self.registry.properties() {
            if let Value::String(text) = value {
                self.record.props.entry(name).or_insert(text);
            }
        }
        if let Some(prefix) = self.registry.prefix() {
            if !prefix.is_empty() {
                self.record.prefix = prefix;
            }
        }

        let payload = serde_json::to_string(&self.record)?;
        debug!(
            "Persisting {} features and {} props",
            self.record.features.len(),
            self.record.props.len()
        );
        self.store.set(STORAGE_KEY, &payload)
    }

    /// Clear the in-memory record and delete the persisted entry.
    pub fn remove(&mut self) -> Result<()> {
        self.record.reset();
        debug!("Removing persisted record under {}", STORAGE_KEY);
        self.store.remove(STORAGE_KEY)
    }

    /// The record accumulated so far.
    pub fn record(&self) -> &FeatureRecord {
        &self.record
    }

    /// Recover the wrapped collaborators.
    pub fn into_parts(self) -> (R, S) {
        (self.registry, self.store)
    }
}

/// The cache is behaviorally a superset of the registry it wraps: queries
/// route through the memoized paths, everything else delegates.
impl<R: FeatureRegistry, S: KeyValueStore> FeatureRegistry for FeatureCache<R, S> {
    fn probe(&mut self, feature: &str) -> Option<Value> {
        self.has(feature)
    }

    fn probe_prop(&mut self, key: &str) -> Option<Value> {
        self.prop(key)
    }

    fn prefix(&self) -> Option<String> {
        self.registry.prefix()
    }

    fn set_prefix(&mut self, prefix: Option<String>) {
        self.registry.set_prefix(prefix);
    }

    fn features(&self) -> HashMap<String, Value> {
        self.registry.features()
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.registry.properties()
    }

    fn inquire(&mut self, name: &str, value: bool, authoritative: bool) {
        self.registry.inquire(name, value, authoritative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryStore, ProbeRegistry};

    fn registry_with_touch() -> ProbeRegistry {
        let mut registry = ProbeRegistry::new();
        registry.register_feature("touch", || Value::Bool(true));
        registry
    }

    #[test]
    fn test_probe_runs_once() {
        let mut cache = FeatureCache::new(registry_with_touch(), MemoryStore::new()).unwrap();

        assert_eq!(cache.has("touch"), Some(Value::Bool(true)));
        assert_eq!(cache.has("touch"), Some(Value::Bool(true)));

        let (registry, _) = cache.into_parts();
        assert_eq!(registry.probes_run(), 1);
    }

    #[test]
    fn test_unknown_feature_is_not_cached() {
        let mut cache = FeatureCache::new(ProbeRegistry::new(), MemoryStore::new()).unwrap();

        assert_eq!(cache.has("missing"), None);
        assert!(cache.record().features.is_empty());
    }

    #[test]
    fn test_non_boolean_feature_is_returned_but_not_cached() {
        let mut registry = ProbeRegistry::new();
        registry.register_feature("touch", || Value::String("true".to_string()));

        let mut cache = FeatureCache::new(registry, MemoryStore::new()).unwrap();

        assert_eq!(cache.has("touch"), Some(Value::String("true".to_string())));
        assert!(cache.record().features.is_empty());
    }

    #[test]
    fn test_non_string_property_is_returned_but_not_cached() {
        let mut registry = ProbeRegistry::new();
        registry.register_prop("engine", || Value::Bool(true));

        let mut cache = FeatureCache::new(registry, MemoryStore::new()).unwrap();

        assert_eq!(cache.prop("engine"), Some(Value::Bool(true)));
        assert!(cache.record().props.is_empty());
    }

    #[test]
    fn test_store_skips_mistyped_registry_facts() {
        let mut registry = ProbeRegistry::new();
        registry.register_feature("touch", || Value::Bool(true));
        registry.register_feature("version", || Value::String("4.2".to_string()));
        registry.register_prop("engine", || Value::String("webkit".to_string()));

        let mut cache = FeatureCache::new(registry, MemoryStore::new()).unwrap();
        cache.has("touch");
        cache.has("version");
        cache.prop("engine");
        cache.store().unwrap();

        let (_, store) = cache.into_parts();
        let payload = store.get(STORAGE_KEY).unwrap().unwrap();
        let record: FeatureRecord = serde_json::from_str(&payload).unwrap();
        assert_eq!(record.features.get("touch"), Some(&true));
        assert!(!record.features.contains_key("version"));
        assert_eq!(record.props.get("engine"), Some(&"webkit".to_string()));
    }

    #[test]
    fn test_store_never_overwrites_record_entries() {
        let mut registry = registry_with_touch();
        // The registry disagrees with what the record already holds
        registry.inquire("geo", true, true);

        let mut cache = FeatureCache {
            registry,
            store: MemoryStore::new(),
            record: FeatureRecord::default(),
        };
        cache.record.features.insert("geo".to_string(), false);
        cache.store().unwrap();

        assert_eq!(cache.record().features.get("geo"), Some(&false));
    }

    #[test]
    fn test_rehydrate_prefers_stored_values() {
        let mut store = MemoryStore::new();
        store
            .set(
                STORAGE_KEY,
                r#"{"features":{"touch":true},"props":{"engine":"webkit"},"prefix":""}"#,
            )
            .unwrap();

        // A record populated before the load simulates queries that ran first
        let mut cache = FeatureCache {
            registry: ProbeRegistry::new(),
            store,
            record: FeatureRecord::default(),
        };
        cache.record.features.insert("touch".to_string(), false);
        cache.record.features.insert("fling".to_string(), true);

        cache.rehydrate().unwrap();

        // Stored value wins for touch; fling survives because the stored
        // record never named it
        assert_eq!(cache.record().features.get("touch"), Some(&true));
        assert_eq!(cache.record().features.get("fling"), Some(&true));
        assert_eq!(cache.record().props.get("engine"), Some(&"webkit".to_string()));
    }

    #[test]
    fn test_rehydrate_seeds_registry_without_probing() {
        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, r#"{"features":{"geo":false},"props":{},"prefix":""}"#)
            .unwrap();

        let mut registry = ProbeRegistry::new();
        registry.register_feature("geo", || Value::Bool(true));

        let cache = FeatureCache::new(registry, store).unwrap();
        let (registry, _) = cache.into_parts();

        assert_eq!(registry.probes_run(), 0);
        assert_eq!(
            registry.features().get("geo"),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn test_rehydrate_installs_stored_prefix() {
        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, r#"{"features":{},"props":{},"prefix":"-webkit-"}"#)
            .unwrap();

        let cache = FeatureCache::new(ProbeRegistry::new(), store).unwrap();

        assert_eq!(cache.prefix(), Some("-webkit-".to_string()));
        assert_eq!(cache.record().prefix, "-webkit-");
    }

    #[test]
    fn test_rehydrate_clears_unset_prefix() {
        let mut registry = ProbeRegistry::new();
        registry.set_prefix(Some("-moz-".to_string()));

        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, r#"{"features":{},"props":{},"prefix":""}"#)
            .unwrap();

        let cache = FeatureCache::new(registry, store).unwrap();

        assert_eq!(cache.prefix(), None);
        assert_eq!(cache.record().prefix, "");
    }

    #[test]
    fn test_malformed_payload_propagates() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "not json").unwrap();

        let result = FeatureCache::new(ProbeRegistry::new(), store);
        assert!(matches!(result, Err(crate::Error::SerializationError(_))));
    }

    #[test]
    fn test_remove_clears_record_and_store() {
        let mut cache = FeatureCache::new(registry_with_touch(), MemoryStore::new()).unwrap();
        cache.has("touch");
        cache.store().unwrap();

        cache.remove().unwrap();

        assert_eq!(cache.record(), &FeatureRecord::default());
        let (_, store) = cache.into_parts();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }
}
