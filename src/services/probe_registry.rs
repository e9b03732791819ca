//! In-memory feature registry driven by registered probe closures

use crate::interfaces::FeatureRegistry;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

type Probe = Box<dyn Fn() -> Value + Send>;

/// A resolved fact and whether it came from an authoritative source
/// (a probe run or an authoritative `inquire`).
#[derive(Debug, Clone)]
struct Fact {
    value: Value,
    authoritative: bool,
}

/// Feature registry that resolves facts by running registered probes.
///
/// A probe runs at most once; its result is recorded so later queries and
/// the enumeration methods see it without re-probing.
#[derive(Default)]
pub struct ProbeRegistry {
    feature_probes: HashMap<String, Probe>,
    prop_probes: HashMap<String, Probe>,
    features: HashMap<String, Fact>,
    properties: HashMap<String, Fact>,
    prefix: Option<String>,
    probes_run: usize,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the detection probe for a feature flag
    pub fn register_feature<F>(&mut self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> Value + Send + 'static,
    {
        self.feature_probes.insert(name.into(), Box::new(probe));
    }

    /// Register the detection probe for a named property
    pub fn register_prop<F>(&mut self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> Value + Send + 'static,
    {
        self.prop_probes.insert(name.into(), Box::new(probe));
    }

    /// How many probes have actually run
    pub fn probes_run(&self) -> usize {
        self.probes_run
    }
}

impl FeatureRegistry for ProbeRegistry {
    fn probe(&mut self, feature: &str) -> Option<Value> {
        if let Some(fact) = self.features.get(feature) {
            return Some(fact.value.clone());
        }

        let value = self.feature_probes.get(feature).map(|probe| probe())?;
        self.probes_run += 1;
        debug!("Probed feature {:?} = {:?}", feature, value);
        self.features.insert(
            feature.to_string(),
            Fact {
                value: value.clone(),
                authoritative: true,
            },
        );
        Some(value)
    }

    fn probe_prop(&mut self, key: &str) -> Option<Value> {
        if let Some(fact) = self.properties.get(key) {
            return Some(fact.value.clone());
        }

        let value = self.prop_probes.get(key).map(|probe| probe())?;
        self.probes_run += 1;
        debug!("Probed property {:?} = {:?}", key, value);
        self.properties.insert(
            key.to_string(),
            Fact {
                value: value.clone(),
                authoritative: true,
            },
        );
        Some(value)
    }

    fn prefix(&self) -> Option<String> {
        self.prefix.clone()
    }

    fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    fn features(&self) -> HashMap<String, Value> {
        self.features
            .iter()
            .map(|(name, fact)| (name.clone(), fact.value.clone()))
            .collect()
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.properties
            .iter()
            .map(|(name, fact)| (name.clone(), fact.value.clone()))
            .collect()
    }

    fn inquire(&mut self, name: &str, value: bool, authoritative: bool) {
        match self.features.get(name) {
            // A seed never displaces an authoritative entry
            Some(existing) if existing.authoritative && !authoritative => {}
            _ => {
                self.features.insert(
                    name.to_string(),
                    Fact {
                        value: Value::Bool(value),
                        authoritative,
                    },
                );
            }
        }
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("feature_probes", &self.feature_probes.len())
            .field("prop_probes", &self.prop_probes.len())
            .field("features", &self.features)
            .field("properties", &self.properties)
            .field("prefix", &self.prefix)
            .field("probes_run", &self.probes_run)
            .finish()
    }
}
