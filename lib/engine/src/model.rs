//! Request and response trees
//!
//! The request is a tree of [`RequestNode`]s hanging off a
//! [`RelatednessRequest`]; evaluation produces a mirrored tree of
//! [`ResponseNode`]s.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Top-level relatedness request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelatednessRequest {
    /// Queries defining the overall query domain (intersected)
    #[serde(default)]
    pub queries: Vec<String>,

    /// Foreground population; defaults to the query domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_queries: Option<Vec<String>>,

    /// Background population; defaults to the whole corpus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_queries: Option<Vec<String>>,

    /// Canonicalize explicit values against corpus values first
    #[serde(default)]
    pub normalize: bool,

    /// Also count each value within the query domain
    #[serde(default)]
    pub return_popularity: bool,

    #[serde(default)]
    pub compare: Vec<RequestNode>,
}

impl RelatednessRequest {
    pub fn new(queries: Vec<String>, compare: Vec<RequestNode>) -> Self {
        Self {
            queries,
            compare,
            ..Default::default()
        }
    }
}

/// One comparison in the request tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestNode {
    /// Field the values belong to
    #[serde(rename = "type", default)]
    pub field_type: String,

    /// Explicit candidate values; absent or empty means discover them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    /// Maximum number of values returned; 0 or absent means use the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Foreground count below which the fallback field is consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_popularity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<Vec<RequestNode>>,
}

impl RequestNode {
    pub fn new(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            ..Default::default()
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_popularity(mut self, min_popularity: f64) -> Self {
        self.min_popularity = Some(min_popularity);
        self
    }

    pub fn with_compare(mut self, compare: Vec<RequestNode>) -> Self {
        self.compare = Some(compare);
        self
    }

    /// Child comparisons, empty when there are none
    pub fn children(&self) -> &[RequestNode] {
        self.compare.as_deref().unwrap_or(&[])
    }
}

/// Ordered key/value decomposition of a composite field value.
///
/// Serialized as a JSON object whose keys keep their configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedValue(Vec<(String, String)>);

impl NormalizedValue {
    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn first(&self) -> Option<(&str, &str)> {
        self.0.first().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Case-insensitive: does any value equal `needle`?
    pub fn contains_value(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.values().any(|v| v.to_lowercase() == needle)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for NormalizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NormalizedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = NormalizedValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    pairs.push((k, v));
                }
                Ok(NormalizedValue(pairs))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Evaluated comparison: the field and its scored values
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseNode {
    #[serde(rename = "type")]
    pub field_type: String,
    pub values: Vec<ResponseValue>,
}

impl ResponseNode {
    pub fn new(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            values: Vec::new(),
        }
    }
}

/// One scored value of a [`ResponseNode`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseValue {
    pub value: String,
    #[serde(rename = "normalizedValue", default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<NormalizedValue>,
    #[serde(default)]
    pub relatedness: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub foreground_popularity: f64,
    #[serde(default)]
    pub background_popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<Vec<ResponseNode>>,
}

impl ResponseValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_normalized(value: impl Into<String>, normalized: Option<NormalizedValue>) -> Self {
        Self {
            value: value.into(),
            normalized_value: normalized,
            ..Default::default()
        }
    }
}

/// Error body of the response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub msg: String,
    pub code: u16,
}

/// Response envelope: `{data}` on success, `{error}` on failure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelatednessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ResponseNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RelatednessResponse {
    pub fn data(data: Option<Vec<ResponseNode>>) -> Self {
        Self { data, error: None }
    }

    pub fn error(msg: impl Into<String>, code: u16) -> Self {
        Self {
            data: None,
            error: Some(ErrorBody { msg: msg.into(), code }),
        }
    }
}
