//! Mapping between logical field names and the facet fields behind them
//!
//! A field may be configured with a structured extension: its facet field
//! then holds composite values such as `42^Registered Nurse^RN` which
//! decompose into ordered key/value pairs (`id`, `name`, `alt`).

use crate::params::{
    ParameterSet, DEFAULT_FACET_FIELD_DELIMITER, DEFAULT_FACET_FIELD_VALUE_DELIMITER, FACET_FIELD_DELIMITER,
    FACET_FIELD_EXTENSION, FACET_FIELD_SUFFIX, FACET_FIELD_VALUE_DELIMITER, KEY_SUFFIX,
};
use crate::{NormalizedValue, RelatednessError, Result};
use relgraph_core::Corpus;

#[derive(Debug, Clone, PartialEq)]
pub struct ValueAdapter {
    /// Logical field as named in the request
    pub base_field: String,
    /// Physical field faceted on
    pub facet_field: String,
    extension: Option<String>,
    key: String,
    delimiter: String,
    value_delimiter: String,
}

impl ValueAdapter {
    /// Resolve `field` against the invariants and check that both the
    /// logical and the physical field exist in the corpus.
    pub fn new(corpus: &dyn Corpus, params: &ParameterSet, field: &str) -> Result<Self> {
        check_field(corpus, field, field)?;
        let adapter = Self::unchecked(params, field);
        check_field(corpus, field, &adapter.facet_field)?;
        Ok(adapter)
    }

    fn unchecked(params: &ParameterSet, field: &str) -> Self {
        let extension = params.field_invariant(field, FACET_FIELD_SUFFIX).map(str::to_string);
        let global = params.invariant(FACET_FIELD_EXTENSION).filter(|g| !g.is_empty());

        let mut facet_field = field.to_string();
        if let Some(ext) = &extension {
            facet_field.push('.');
            facet_field.push_str(ext);
        }
        if let Some(global) = global {
            facet_field.push('.');
            facet_field.push_str(global);
        }

        Self {
            base_field: field.to_string(),
            facet_field,
            extension,
            key: params.field_invariant(field, KEY_SUFFIX).unwrap_or_default().to_string(),
            delimiter: params
                .invariant(FACET_FIELD_DELIMITER)
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_FACET_FIELD_DELIMITER)
                .to_string(),
            value_delimiter: params
                .invariant(FACET_FIELD_VALUE_DELIMITER)
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_FACET_FIELD_VALUE_DELIMITER)
                .to_string(),
        }
    }

    /// Whether the facet field holds decomposable composite values
    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Decompose a raw facet value; `None` without an extension
    pub fn normalized_value(&self, raw: &str) -> Option<NormalizedValue> {
        let extension = self.extension.as_ref()?;
        let keys = extension.split(self.delimiter.as_str());
        let values = raw.split(self.value_delimiter.as_str());
        Some(keys.zip(values).filter(|(_, v)| !v.is_empty()).collect())
    }

    /// Display string for a raw facet value
    pub fn display_value(&self, raw: &str) -> String {
        self.adapt(raw).0
    }

    /// Display string and decomposition of a raw facet value
    pub fn adapt(&self, raw: &str) -> (String, Option<NormalizedValue>) {
        let Some(normalized) = self.normalized_value(raw) else {
            return (self.flatten(raw), None);
        };
        let display = normalized
            .get(&self.key)
            .or_else(|| normalized.first().map(|(_, v)| v))
            .map(str::to_string)
            .unwrap_or_else(|| self.flatten(raw));
        (display, Some(normalized))
    }

    fn flatten(&self, raw: &str) -> String {
        raw.replace(self.value_delimiter.as_str(), " ")
    }
}

/// Fail with a client error unless `facet_field` is a corpus field
pub fn check_field(corpus: &dyn Corpus, field: &str, facet_field: &str) -> Result<()> {
    if corpus.field_exists(facet_field) {
        Ok(())
    } else {
        Err(RelatednessError::UnknownField {
            field: field.to_string(),
            facet_field: facet_field.to_string(),
        })
    }
}
