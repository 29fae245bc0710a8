use crate::{DocSet, Query, Result};
use serde::{Deserialize, Serialize};

/// One facet bucket: a raw field value and the number of documents holding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub value: String,
    pub count: u64,
}

impl FacetBucket {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Read-only view of a searchable document corpus.
///
/// Every call may run concurrently from the worker pool, so implementations
/// must be `Send + Sync`. Counts are exact intersection cardinalities.
pub trait Corpus: Send + Sync {
    /// Evaluate a query into the set of matching documents
    fn resolve(&self, query: &Query) -> Result<DocSet>;

    /// Intersection of every query's document set; the whole corpus when
    /// `queries` is empty
    fn resolve_all(&self, queries: &[Query]) -> Result<DocSet> {
        let mut domain = self.resolve(&Query::MatchAll)?;
        for query in queries {
            domain = self.intersect(&domain, &self.resolve(query)?);
        }
        Ok(domain)
    }

    fn intersect(&self, a: &DocSet, b: &DocSet) -> DocSet {
        a.intersect(b)
    }

    /// Number of documents in `domain` matching `query`
    fn count(&self, query: &Query, domain: &DocSet) -> Result<u64>;

    /// Most frequent values of `field` among documents in `domain` that also
    /// match `query` (when given). Ordered by count descending, then value
    /// ascending, at most `limit` buckets.
    fn facet_top_values(
        &self,
        field: &str,
        query: Option<&Query>,
        domain: &DocSet,
        limit: usize,
    ) -> Result<Vec<FacetBucket>>;

    /// Whether `name` is a known field of the corpus schema
    fn field_exists(&self, name: &str) -> bool;

    fn total_document_count(&self) -> Result<u64>;
}
