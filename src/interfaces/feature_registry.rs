//! Feature registry interface
//!
//! Probe results are deliberately untyped: a detection routine may yield
//! any shape, and callers decide which shapes they trust. The cache only
//! trusts booleans for features and strings for properties.

use serde_json::Value;
use std::collections::HashMap;

/// Trait for a feature-detection registry
pub trait FeatureRegistry {
    /// Run (or recall) the detection probe for a feature flag
    fn probe(&mut self, feature: &str) -> Option<Value>;

    /// Run (or recall) the detection probe for a named property
    fn probe_prop(&mut self, key: &str) -> Option<Value>;

    /// The active vendor prefix, if any
    fn prefix(&self) -> Option<String>;

    /// Install or clear the active vendor prefix
    fn set_prefix(&mut self, prefix: Option<String>);

    /// All feature facts resolved so far
    fn features(&self) -> HashMap<String, Value>;

    /// All property facts resolved so far
    fn properties(&self) -> HashMap<String, Value>;

    /// Register a feature fact directly, without running a probe.
    ///
    /// A non-authoritative registration seeds the registry so later
    /// probes are skipped, but never displaces an authoritative entry.
    fn inquire(&mut self, name: &str, value: bool, authoritative: bool);
}
