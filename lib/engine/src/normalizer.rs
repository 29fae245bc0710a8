//! Canonicalization of explicit values
//!
//! For fields with a structured extension, a caller may name a value by any
//! of its parts (`rn`, `Registered Nurse`, `42`). Each explicit value is
//! looked up among the composite values of documents matching it in the
//! logical field; the first composite whose decomposition contains the value
//! replaces it. Unmatched values are kept as given.

use crate::context::NodeContext;
use crate::fanout::{run_aggregations, AggregationTask};
use crate::recurser::LevelNode;
use crate::{ResponseValue, Result};
use relgraph_core::Query;
use tracing::debug;

/// Composite values inspected per explicit value
const NORMALIZE_LIMIT: usize = 100;

/// Rewrite the explicit values of every extended node in one batch
pub fn normalize_values(ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
    let mut slots = Vec::new();
    for (n, node) in level.iter().enumerate() {
        if node.adapter.has_extension() {
            slots.extend((0..node.values.len()).map(|v| (n, v)));
        }
    }
    if slots.is_empty() {
        return Ok(());
    }

    // lookups ignore the request's populations
    let corpus_domain = ctx.corpus.resolve(&Query::MatchAll)?;
    let tasks: Vec<Option<AggregationTask>> = slots
        .iter()
        .enumerate()
        .map(|(index, &(n, v))| {
            let node = &level[n];
            let lookup = Query::term(node.adapter.base_field.clone(), node.values[v].value.to_lowercase());
            Some(AggregationTask::new(
                corpus_domain.clone(),
                node.adapter.facet_field.clone(),
                Some(lookup),
                index,
                NORMALIZE_LIMIT,
            ))
        })
        .collect();

    let results = run_aggregations(&ctx.pool, &ctx.corpus, tasks)?;

    let mut matched = 0usize;
    for ((n, v), buckets) in slots.into_iter().zip(results) {
        let Some(buckets) = buckets else { continue };
        let node = &mut level[n];
        let wanted = node.values[v].value.to_lowercase();

        let canonical = buckets.iter().find_map(|bucket| {
            let (display, normalized) = node.adapter.adapt(&bucket.value);
            normalized
                .filter(|map| map.contains_value(&wanted))
                .map(|map| (display, map))
        });
        if let Some((display, map)) = canonical {
            node.values[v] = ResponseValue::with_normalized(display, Some(map));
            matched += 1;
        }
    }
    debug!("Normalized {} explicit values at depth {}", matched, ctx.depth);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, RelatednessRequest, RequestNode};
    use relgraph_core::{Corpus, MemoryCorpus, WorkerPool};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn corpus() -> Arc<dyn Corpus> {
        Arc::new(
            MemoryCorpus::from_documents(vec![
                json!({"city": "boston", "jobtitle": ["RN", "Registered Nurse"], "jobtitle.id-name-alt": "42^Registered Nurse^RN"}),
                json!({"city": "atlanta", "jobtitle": "nurse", "jobtitle.id-name-alt": "7^Nurse"}),
                json!({"city": "atlanta", "jobtitle": "chef", "jobtitle.id-name-alt": "9^Chef"}),
            ])
            .unwrap(),
        )
    }

    fn context(queries: &str) -> NodeContext {
        let params = EngineConfig::default()
            .with_invariant("jobtitle.facet-field", "id-name-alt")
            .with_invariant("jobtitle.key", "name")
            .parameter_set(HashMap::new());
        let mut request = RelatednessRequest::new(vec![queries.into()], vec![RequestNode::new("jobtitle")]);
        request.normalize = true;
        NodeContext::new(Arc::new(request), Arc::new(params), corpus(), Arc::new(WorkerPool::new(2).unwrap())).unwrap()
    }

    #[test]
    fn test_values_rewritten_to_canonical_form() {
        let ctx = context("*:*");
        let request = RequestNode::new("jobtitle").with_values(["rn", "NURSE", "plumber"]);
        let mut level = vec![LevelNode::resolve(&request, &ctx).unwrap()];
        normalize_values(&ctx, &mut level).unwrap();

        let values = &level[0].values;
        assert_eq!(values[0].value, "Registered Nurse");
        assert_eq!(values[0].normalized_value.as_ref().unwrap().get("id"), Some("42"));
        assert_eq!(values[1].value, "Nurse");
        // no match: kept verbatim without a decomposition
        assert_eq!(values[2].value, "plumber");
        assert!(values[2].normalized_value.is_none());
    }

    #[test]
    fn test_lookup_ignores_query_domain() {
        let ctx = context("city:atlanta");
        let request = RequestNode::new("jobtitle").with_values(["registered nurse"]);
        let mut level = vec![LevelNode::resolve(&request, &ctx).unwrap()];
        normalize_values(&ctx, &mut level).unwrap();
        assert_eq!(level[0].values[0].value, "Registered Nurse");
    }

    #[test]
    fn test_plain_fields_untouched() {
        let ctx = context("*:*");
        let request = RequestNode::new("city").with_values(["BOSTON"]);
        let mut level = vec![LevelNode::resolve(&request, &ctx).unwrap()];
        normalize_values(&ctx, &mut level).unwrap();
        assert_eq!(level[0].values[0].value, "BOSTON");
        assert_eq!(ctx.pool.jobs_submitted(), 0);
    }
}
