//! Node scoring
//!
//! Every value of a node is counted in the foreground and background (and
//! the query domain when popularity is requested). Values too sparse in the
//! foreground are re-counted against the node's fallback field if one is
//! configured. Counts are then turned into a relatedness score and
//! per-million rates, filtered, sorted and truncated to the node's limit.

use crate::context::NodeContext;
use crate::fanout::{run_queries, PopulationType, QueryResult, QueryTask};
use crate::params::FALLBACK_SUFFIX;
use crate::recurser::LevelNode;
use crate::scoring::{rate_per_million, relatedness};
use crate::sort::filter_and_sort;
use crate::{ResponseValue, Result};
use relgraph_core::Query;
use std::collections::BTreeSet;
use tracing::debug;

/// Raw counts per value index, one vector per population
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationCounts {
    pub query: Vec<f64>,
    pub foreground: Vec<f64>,
    pub background: Vec<f64>,
}

impl PopulationCounts {
    pub fn new(len: usize) -> Self {
        Self {
            query: vec![0.0; len],
            foreground: vec![0.0; len],
            background: vec![0.0; len],
        }
    }

    /// Store each result in its slot, overwriting what was there
    pub fn record(&mut self, results: &[QueryResult]) {
        for result in results {
            let slots = match result.population {
                PopulationType::Query => &mut self.query,
                PopulationType::Foreground => &mut self.foreground,
                PopulationType::Background => &mut self.background,
            };
            if let Some(slot) = slots.get_mut(result.index) {
                *slot = result.count;
            }
        }
    }
}

/// Indices whose foreground count is zero or below `min_popularity`
pub fn fallback_indices(foreground: &[f64], min_popularity: f64) -> BTreeSet<usize> {
    foreground
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count < min_popularity || count == 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Count tasks for `indices` of `values` against `field`
fn count_tasks<I>(ctx: &NodeContext, field: &str, values: &[ResponseValue], indices: I) -> Vec<QueryTask>
where
    I: IntoIterator<Item = usize>,
{
    let with_popularity = ctx.request.return_popularity;
    let mut tasks = Vec::new();
    for index in indices {
        let query = Query::term(field, Query::normalize_term(&values[index].value));
        tasks.push(QueryTask::new(ctx.fg_domain.clone(), query.clone(), PopulationType::Foreground, index));
        if with_popularity {
            tasks.push(QueryTask::new(ctx.query_domain.clone(), query.clone(), PopulationType::Query, index));
        }
        tasks.push(QueryTask::new(ctx.bg_domain.clone(), query, PopulationType::Background, index));
    }
    tasks
}

/// Count every value of `node` in each population, applying the fallback field
pub fn count_values(ctx: &NodeContext, node: &LevelNode<'_>) -> Result<PopulationCounts> {
    let values = &node.values;
    let mut counts = PopulationCounts::new(values.len());
    if values.is_empty() {
        return Ok(counts);
    }

    let results = run_queries(&ctx.pool, &ctx.corpus, count_tasks(ctx, node.field(), values, 0..values.len()))?;
    counts.record(&results);

    let flagged = fallback_indices(&counts.foreground, node.min_popularity);
    if flagged.is_empty() {
        return Ok(counts);
    }
    if let Some(fallback) = ctx.params.field_invariant(node.field(), FALLBACK_SUFFIX) {
        debug!(
            "Re-counting {} sparse values of {} against {}",
            flagged.len(),
            node.field(),
            fallback
        );
        let results = run_queries(&ctx.pool, &ctx.corpus, count_tasks(ctx, fallback, values, flagged))?;
        counts.record(&results);
    }
    Ok(counts)
}

/// Score every node of a level in place
pub fn score_level(ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
    for node in level.iter_mut() {
        score_node(ctx, node)?;
    }
    Ok(())
}

pub fn score_node(ctx: &NodeContext, node: &mut LevelNode<'_>) -> Result<()> {
    let counts = count_values(ctx, node)?;
    let fg_total = ctx.fg_domain.len() as u64;
    let bg_total = ctx.bg_domain.len() as u64;

    let scored: Vec<ResponseValue> = std::mem::take(&mut node.values)
        .into_iter()
        .enumerate()
        .map(|(i, mut value)| {
            let (fg, bg) = (counts.foreground[i], counts.background[i]);
            value.relatedness = relatedness(fg_total, bg_total, fg, bg);
            value.popularity = rate_per_million(ctx.total_docs, counts.query[i]);
            value.foreground_popularity = rate_per_million(ctx.total_docs, fg);
            value.background_popularity = rate_per_million(ctx.total_docs, bg);
            value
        })
        .collect();

    let candidates = scored.len();
    node.values = filter_and_sort(scored, node.limit, &ctx.params);
    debug!(
        "Scored {}: kept {} of {} values (fg {}, bg {})",
        node.field(),
        node.values.len(),
        candidates,
        fg_total,
        bg_total
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, ParameterSet, RelatednessRequest, RequestNode};
    use relgraph_core::{Corpus, MemoryCorpus, WorkerPool};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn corpus(documents: Vec<Value>) -> Arc<dyn Corpus> {
        Arc::new(MemoryCorpus::from_documents(documents).unwrap())
    }

    fn context(corpus: Arc<dyn Corpus>, request: RelatednessRequest, params: ParameterSet) -> NodeContext {
        NodeContext::new(Arc::new(request), Arc::new(params), corpus, Arc::new(WorkerPool::new(2).unwrap())).unwrap()
    }

    fn result(index: usize, population: PopulationType, count: f64) -> QueryResult {
        QueryResult {
            index,
            population,
            count,
        }
    }

    #[test]
    fn test_fallback_indices() {
        let fg = [0.0, 3.0, 1.0, 3.0];
        assert_eq!(fallback_indices(&fg, 0.0), BTreeSet::from([0]));
        assert_eq!(fallback_indices(&fg, 1.5), BTreeSet::from([0, 2]));
        assert!(fallback_indices(&[], 10.0).is_empty());
    }

    #[test]
    fn test_replacement_preserves_untouched_indices() {
        let mut counts = PopulationCounts::new(4);
        counts.record(&[
            result(0, PopulationType::Foreground, 0.0),
            result(1, PopulationType::Foreground, 3.0),
            result(2, PopulationType::Foreground, 1.0),
            result(3, PopulationType::Foreground, 3.0),
            result(0, PopulationType::Background, 10.0),
            result(1, PopulationType::Background, 11.0),
            result(2, PopulationType::Background, 12.0),
            result(3, PopulationType::Background, 13.0),
        ]);

        counts.record(&[
            result(0, PopulationType::Foreground, 7.0),
            result(0, PopulationType::Background, 70.0),
            result(2, PopulationType::Foreground, 5.0),
            result(2, PopulationType::Background, 50.0),
        ]);

        assert_eq!(counts.foreground, vec![7.0, 3.0, 5.0, 3.0]);
        assert_eq!(counts.background, vec![70.0, 11.0, 50.0, 13.0]);
        assert_eq!(counts.query, vec![0.0; 4]);
    }

    #[test]
    fn test_counts_are_trimmed_and_case_insensitive() {
        let corpus = corpus(vec![
            json!({"jobtitle": "nurse", "skills": "Triage"}),
            json!({"jobtitle": "nurse", "skills": "charting"}),
            json!({"jobtitle": "chef", "skills": "triage"}),
        ]);
        let mut request = RelatednessRequest::new(vec!["jobtitle:nurse".into()], Vec::new());
        request.return_popularity = true;
        let ctx = context(corpus, request, ParameterSet::default());

        let node_request = RequestNode::new("skills").with_values([" TRIAGE "]);
        let node = LevelNode::resolve(&node_request, &ctx).unwrap();
        let counts = count_values(&ctx, &node).unwrap();
        assert_eq!(counts.foreground, vec![1.0]);
        assert_eq!(counts.background, vec![2.0]);
        assert_eq!(counts.query, vec![1.0]);
    }

    #[test]
    fn test_fallback_field_recounts_sparse_values_only() {
        let corpus = corpus(vec![
            json!({"jobtitle": "nurse", "skills": "triage", "skills_alt": ["triage", "suturing"]}),
            json!({"jobtitle": "nurse", "skills": "triage", "skills_alt": "suturing"}),
            json!({"jobtitle": "chef", "skills": "knives", "skills_alt": "triage"}),
        ]);
        let params = EngineConfig::default()
            .with_invariant("skills.fallback", "skills_alt")
            .parameter_set(HashMap::new());
        let request = RelatednessRequest::new(vec!["jobtitle:nurse".into()], Vec::new());
        let ctx = context(corpus, request, params);

        let node_request = RequestNode::new("skills").with_values(["triage", "suturing"]);
        let node = LevelNode::resolve(&node_request, &ctx).unwrap();
        let counts = count_values(&ctx, &node).unwrap();

        // "triage" is counted in skills, "suturing" only exists in skills_alt
        assert_eq!(counts.foreground, vec![2.0, 2.0]);
        assert_eq!(counts.background, vec![2.0, 2.0]);
    }

    #[test]
    fn test_no_fallback_configured() {
        let corpus = corpus(vec![json!({"jobtitle": "nurse", "skills": "triage"})]);
        let request = RelatednessRequest::new(vec!["*:*".into()], Vec::new());
        let ctx = context(corpus, request, ParameterSet::default());

        let node_request = RequestNode::new("skills").with_values(["welding"]);
        let node = LevelNode::resolve(&node_request, &ctx).unwrap();
        let counts = count_values(&ctx, &node).unwrap();
        assert_eq!(counts.foreground, vec![0.0]);
        // one foreground and one background count only
        assert_eq!(ctx.pool.jobs_submitted(), 2);
    }

    #[test]
    fn test_score_node_sorts_and_limits() {
        let mut documents = Vec::new();
        for i in 0..20 {
            let jobtitle = if i < 10 { "nurse" } else { "chef" };
            let mut skills = vec!["communication"];
            if i < 8 {
                skills.push("triage");
            }
            if i >= 10 {
                skills.push("knives");
            }
            documents.push(json!({"jobtitle": jobtitle, "skills": skills}));
        }
        let request = RelatednessRequest::new(vec!["jobtitle:nurse".into()], Vec::new());
        let ctx = context(corpus(documents), request, ParameterSet::default());

        let node_request = RequestNode::new("skills")
            .with_values(["knives", "communication", "triage"])
            .with_limit(2);
        let mut node = LevelNode::resolve(&node_request, &ctx).unwrap();
        score_node(&ctx, &mut node).unwrap();

        let names: Vec<&str> = node.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(names, vec!["triage", "communication"]);

        let triage = &node.values[0];
        assert!(triage.relatedness > 0.5);
        assert_eq!(triage.foreground_popularity, 400_000.0);
        assert_eq!(triage.background_popularity, 400_000.0);
        assert_eq!(triage.popularity, 0.0);
        // present everywhere: exactly the background rate
        assert_eq!(node.values[1].relatedness, 0.5);
    }
}
