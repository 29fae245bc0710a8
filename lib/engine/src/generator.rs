// Value discovery: top facet values of each discovering node's field
use crate::context::NodeContext;
use crate::fanout::{run_aggregations, AggregationTask};
use crate::recurser::LevelNode;
use crate::{ResponseValue, Result};
use ahash::AHashSet;
use relgraph_core::Query;
use tracing::debug;

/// Append discovered values to every node in discovery mode.
///
/// One facet task per discovering node, scoped to the query domain. Values
/// come back in facet order after any values the node already holds; a value
/// equal (trimmed, case-insensitive) to one already present is skipped.
pub fn generate_values(ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
    let tasks: Vec<Option<AggregationTask>> = level
        .iter()
        .enumerate()
        .map(|(index, node)| {
            node.discover.then(|| {
                AggregationTask::new(ctx.query_domain.clone(), node.adapter.facet_field.clone(), None, index, node.limit)
            })
        })
        .collect();

    let results = run_aggregations(&ctx.pool, &ctx.corpus, tasks)?;

    for (node, buckets) in level.iter_mut().zip(results) {
        let Some(buckets) = buckets else { continue };
        let mut seen: AHashSet<String> = node.values.iter().map(|v| Query::normalize_term(&v.value)).collect();
        let before = node.values.len();

        for bucket in buckets {
            let (value, normalized) = node.adapter.adapt(&bucket.value);
            if seen.insert(Query::normalize_term(&value)) {
                node.values.push(ResponseValue::with_normalized(value, normalized));
            }
        }
        debug!(
            "Discovered {} values for {} in {}",
            node.values.len() - before,
            node.field(),
            node.adapter.facet_field
        );
    }
    Ok(())
}
