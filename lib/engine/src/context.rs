use crate::{ParameterSet, RelatednessError, RelatednessRequest, Result};
use relgraph_core::{Corpus, DocSet, Query, WorkerPool};
use std::sync::Arc;
use tracing::warn;

/// Everything one level of the comparison tree is evaluated against.
///
/// Contexts are never mutated: recursion derives a narrowed copy with
/// [`NodeContext::narrow`]. Cloning is cheap since every heavy member is
/// shared.
#[derive(Clone)]
pub struct NodeContext {
    pub request: Arc<RelatednessRequest>,
    pub params: Arc<ParameterSet>,
    pub corpus: Arc<dyn Corpus>,
    pub pool: Arc<WorkerPool>,
    pub queries: Arc<Vec<Query>>,
    pub fg_queries: Arc<Vec<Query>>,
    pub bg_queries: Arc<Vec<Query>>,
    pub query_domain: DocSet,
    pub fg_domain: DocSet,
    pub bg_domain: DocSet,
    /// Corpus size used for per-million rates; 1 when unavailable
    pub total_docs: u64,
    /// Number of narrowing steps from the root
    pub depth: usize,
}

impl NodeContext {
    /// Parse the request's queries and resolve the three root domains
    pub fn new(
        request: Arc<RelatednessRequest>,
        params: Arc<ParameterSet>,
        corpus: Arc<dyn Corpus>,
        pool: Arc<WorkerPool>,
    ) -> Result<Self> {
        let queries = parse_queries(&request.queries)?;
        let fg_queries = match &request.foreground_queries {
            Some(fg) => parse_queries(fg)?,
            None => queries.clone(),
        };
        let bg_queries = parse_queries(request.background_queries.as_deref().unwrap_or(&[]))?;

        let query_domain = corpus.resolve_all(&queries)?;
        let fg_domain = corpus.resolve_all(&fg_queries)?;
        let bg_domain = corpus.resolve_all(&bg_queries)?;

        let total_docs = match corpus.total_document_count() {
            Ok(0) => 1,
            Ok(n) => n,
            Err(e) => {
                warn!("Could not count corpus documents, rates fall back to raw counts: {}", e);
                1
            }
        };

        Ok(Self {
            request,
            params,
            corpus,
            pool,
            queries: Arc::new(queries),
            fg_queries: Arc::new(fg_queries),
            bg_queries: Arc::new(bg_queries),
            query_domain,
            fg_domain,
            bg_domain,
            total_docs,
            depth: 0,
        })
    }

    /// Child context restricted to documents matching `filter`.
    ///
    /// The query and foreground domains are intersected with the filter;
    /// the background domain is kept as is.
    pub fn narrow(&self, filter: &Query) -> Result<Self> {
        let matching = self.corpus.resolve(filter)?;
        Ok(Self {
            query_domain: self.corpus.intersect(&self.query_domain, &matching),
            fg_domain: self.corpus.intersect(&self.fg_domain, &matching),
            depth: self.depth + 1,
            ..self.clone()
        })
    }

    /// Filter selecting the documents holding `value` in `field`
    pub fn value_filter(field: &str, value: &str) -> Query {
        if value.is_empty() {
            Query::exists(field)
        } else {
            Query::term(field, value.to_lowercase())
        }
    }
}

fn parse_queries(raw: &[String]) -> Result<Vec<Query>> {
    raw.iter()
        .map(|q| Query::parse(q).map_err(RelatednessError::InvalidQuery))
        .collect()
}
