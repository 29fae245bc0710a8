//! Engine configuration and the per-request parameter set
//!
//! Parameters come in three tiers. Invariants are fixed by the operator and
//! always win; request parameters override defaults.

use crate::{RelatednessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Invariant: per-field fallback field, `<field>.fallback`
pub const FALLBACK_SUFFIX: &str = "fallback";
/// Invariant: per-field structured extension, `<field>.facet-field`
pub const FACET_FIELD_SUFFIX: &str = "facet-field";
/// Invariant: per-field display key, `<field>.key`
pub const KEY_SUFFIX: &str = "key";
/// Invariant: suffix appended to every facet field
pub const FACET_FIELD_EXTENSION: &str = "facet-field-extension";
/// Invariant: separator between extension keys
pub const FACET_FIELD_DELIMITER: &str = "facet-field-delimiter";
/// Invariant: separator between composite value parts
pub const FACET_FIELD_VALUE_DELIMITER: &str = "facet-field-value-delimiter";
/// Sort key for returned values
pub const SORT: &str = "sort";
/// Drop values with zero foreground and background popularity
pub const FILTER_ZERO_POPULARITY: &str = "filter-zero-popularity";

pub const DEFAULT_FACET_FIELD_DELIMITER: &str = "-";
pub const DEFAULT_FACET_FIELD_VALUE_DELIMITER: &str = "^";

/// Operator configuration, usually loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Values used when a request does not supply its own
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Values no request can override
    #[serde(default)]
    pub invariants: HashMap<String, String>,

    /// Worker pool size; defaults to available parallelism
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RelatednessError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RelatednessError::InvalidConfig(e.to_string()))
    }

    pub fn with_invariant(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.invariants.insert(key.into(), value.into());
        self
    }

    /// Merge with the parameters of one request
    pub fn parameter_set(&self, request_params: HashMap<String, String>) -> ParameterSet {
        ParameterSet {
            params: request_params,
            defaults: self.defaults.clone(),
            invariants: self.invariants.clone(),
        }
    }
}

/// Merged view of invariants, request parameters and defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: HashMap<String, String>,
    defaults: HashMap<String, String>,
    invariants: HashMap<String, String>,
}

impl ParameterSet {
    pub fn new(
        params: HashMap<String, String>,
        defaults: HashMap<String, String>,
        invariants: HashMap<String, String>,
    ) -> Self {
        Self {
            params,
            defaults,
            invariants,
        }
    }

    /// Invariant first, then request parameter, then default
    pub fn get(&self, key: &str) -> Option<&str> {
        self.invariants
            .get(key)
            .or_else(|| self.params.get(key))
            .or_else(|| self.defaults.get(key))
            .map(String::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" || v == "1" || v == "yes" => true,
            Some(v) if v == "false" || v == "0" || v == "no" => false,
            _ => default,
        }
    }

    /// Invariant tier only
    pub fn invariant(&self, key: &str) -> Option<&str> {
        self.invariants.get(key).map(String::as_str)
    }

    /// Non-empty invariant `<field>.<suffix>`
    pub fn field_invariant(&self, field: &str, suffix: &str) -> Option<&str> {
        self.invariant(&format!("{}.{}", field, suffix)).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_tier_precedence() {
        let set = ParameterSet::new(
            map(&[("sort", "popularity"), ("a", "request")]),
            map(&[("sort", "relatedness"), ("b", "default")]),
            map(&[("a", "invariant")]),
        );
        assert_eq!(set.get("sort"), Some("popularity"));
        assert_eq!(set.get("a"), Some("invariant"));
        assert_eq!(set.get("b"), Some("default"));
        assert_eq!(set.get("missing"), None);
    }

    #[test]
    fn test_invariants_only() {
        let set = ParameterSet::new(map(&[("skills.fallback", "x")]), HashMap::new(), map(&[("jobs.fallback", "jobs_alt")]));
        assert_eq!(set.field_invariant("skills", FALLBACK_SUFFIX), None);
        assert_eq!(set.field_invariant("jobs", FALLBACK_SUFFIX), Some("jobs_alt"));
    }

    #[test]
    fn test_get_bool() {
        let set = ParameterSet::new(map(&[("on", "TRUE"), ("off", "0"), ("junk", "maybe")]), HashMap::new(), HashMap::new());
        assert!(set.get_bool("on", false));
        assert!(!set.get_bool("off", true));
        assert!(set.get_bool("junk", true));
        assert!(!set.get_bool("absent", false));
    }

    #[test]
    fn test_config_from_json() {
        let config = EngineConfig::from_json(
            r#"{"invariants": {"keywords.fallback": "keywords_alt"}, "worker_threads": 4}"#,
        )
        .unwrap();
        assert_eq!(config.worker_threads, Some(4));
        assert!(config.defaults.is_empty());

        let set = config.parameter_set(HashMap::new());
        assert_eq!(set.field_invariant("keywords", FALLBACK_SUFFIX), Some("keywords_alt"));
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(EngineConfig::from_json("{nope"), Err(RelatednessError::InvalidConfig(_))));
        assert!(matches!(
            EngineConfig::from_file("/definitely/not/here.json"),
            Err(RelatednessError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaults": {"sort": "popularity"}}"#).unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.parameter_set(HashMap::new()).get("sort"), Some("popularity"));
    }
}
