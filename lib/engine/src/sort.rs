// Ordering, filtering and truncation of scored values
use crate::params::{ParameterSet, FILTER_ZERO_POPULARITY, SORT};
use crate::ResponseValue;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Relatedness,
    Popularity,
    ForegroundPopularity,
    BackgroundPopularity,
}

impl SortKey {
    fn key(self, value: &ResponseValue) -> f64 {
        match self {
            SortKey::Relatedness => value.relatedness,
            SortKey::Popularity => value.popularity,
            SortKey::ForegroundPopularity => value.foreground_popularity,
            SortKey::BackgroundPopularity => value.background_popularity,
        }
    }

    /// Descending by key, then ascending by lowercased value
    pub fn compare(self, a: &ResponseValue, b: &ResponseValue) -> Ordering {
        self.key(b)
            .total_cmp(&self.key(a))
            .then_with(|| a.value.to_lowercase().cmp(&b.value.to_lowercase()))
    }

    pub fn from_params(params: &ParameterSet) -> Self {
        params.get(SORT).and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relatedness" => Ok(SortKey::Relatedness),
            "popularity" => Ok(SortKey::Popularity),
            "foreground_popularity" => Ok(SortKey::ForegroundPopularity),
            "background_popularity" => Ok(SortKey::BackgroundPopularity),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

pub fn sort_values(values: &mut [ResponseValue], key: SortKey) {
    values.sort_by(|a, b| key.compare(a, b));
}

/// Apply the configured filter and sort, then keep at most `limit` values
pub fn filter_and_sort(mut values: Vec<ResponseValue>, limit: usize, params: &ParameterSet) -> Vec<ResponseValue> {
    if params.get_bool(FILTER_ZERO_POPULARITY, false) {
        values.retain(|v| v.foreground_popularity > 0.0 || v.background_popularity > 0.0);
    }
    sort_values(&mut values, SortKey::from_params(params));
    values.truncate(limit);
    values
}
