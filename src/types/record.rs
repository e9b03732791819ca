use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The accumulated set of detection results.
///
/// This is the shape that gets persisted: feature flags, string-valued
/// properties, and the active vendor prefix. Ordered maps are used so that
/// serializing the same record twice yields an identical payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub props: BTreeMap<String, String>,
    #[serde(default)]
    pub prefix: String,
}

impl FeatureRecord {
    /// Fold freshly detected values into this record.
    ///
    /// Only keys absent from `self` are taken; existing entries win on
    /// conflict. Used during rehydration, where `self` is the stored record
    /// and `detected` holds whatever resolved in memory before the load.
    pub fn merge_detected(&mut self, detected: FeatureRecord) {
        for (name, value) in detected.features {
            self.features.entry(name).or_insert(value);
        }
        for (name, value) in detected.props {
            self.props.entry(name).or_insert(value);
        }
    }

    /// Reset to the empty default.
    pub fn reset(&mut self) {
        *self = FeatureRecord::default();
    }

    /// Whether a vendor prefix is set. An empty string means "no prefix".
    pub fn has_prefix(&self) -> bool {
        !self.prefix.is_empty()
    }
}
