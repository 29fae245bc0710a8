//! Depth-first evaluation of the comparison tree
//!
//! Every level runs its phases in a fixed order (defaulting, normalizing,
//! generating, scoring) over all sibling nodes before any child level is
//! started. Children are evaluated once per surviving value, against a
//! context narrowed to the documents holding that value.

use crate::adapter::ValueAdapter;
use crate::context::NodeContext;
use crate::generator::generate_values;
use crate::normalizer::normalize_values;
use crate::scorer::score_level;
use crate::{RequestNode, ResponseNode, ResponseValue, Result};
use tracing::debug;

/// A request node with its defaults applied, accumulating values as the
/// phases run.
#[derive(Debug, Clone)]
pub struct LevelNode<'a> {
    pub request: &'a RequestNode,
    pub adapter: ValueAdapter,
    /// No explicit values: candidates come from the corpus
    pub discover: bool,
    pub limit: usize,
    pub min_popularity: f64,
    pub values: Vec<ResponseValue>,
}

impl<'a> LevelNode<'a> {
    pub fn resolve(request: &'a RequestNode, ctx: &NodeContext) -> Result<Self> {
        let adapter = ValueAdapter::new(ctx.corpus.as_ref(), &ctx.params, &request.field_type)?;
        let explicit = request.values.as_deref().unwrap_or(&[]);
        let discover = explicit.is_empty();
        let limit = match request.limit {
            Some(limit) if limit > 0 => limit,
            _ if discover => 1,
            _ => explicit.len(),
        };

        Ok(Self {
            request,
            adapter,
            discover,
            limit,
            min_popularity: request.min_popularity.unwrap_or(0.0),
            values: explicit.iter().map(ResponseValue::new).collect(),
        })
    }

    pub fn field(&self) -> &str {
        &self.request.field_type
    }
}

/// The phases run against each level of the tree
pub trait LevelPipeline: Send + Sync {
    /// Rewrite explicit values to their canonical corpus form
    fn normalize(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()>;

    /// Append candidate values for nodes in discovery mode
    fn generate(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()>;

    /// Count, score, sort and truncate every node's values
    fn score(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()>;
}

/// Pipeline backed by the corpus in the context
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusPipeline;

impl LevelPipeline for CorpusPipeline {
    fn normalize(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
        normalize_values(ctx, level)
    }

    fn generate(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
        generate_values(ctx, level)
    }

    fn score(&self, ctx: &NodeContext, level: &mut [LevelNode<'_>]) -> Result<()> {
        score_level(ctx, level)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestTreeRecurser<P = CorpusPipeline> {
    pipeline: P,
}

impl<P: LevelPipeline> RequestTreeRecurser<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Evaluate the request's tree. `None` when there is nothing to compare.
    pub fn score(&self, ctx: &NodeContext) -> Result<Option<Vec<ResponseNode>>> {
        let request = ctx.request.clone();
        if request.compare.is_empty() {
            return Ok(None);
        }
        self.evaluate_level(ctx, &request.compare).map(Some)
    }

    fn evaluate_level(&self, ctx: &NodeContext, nodes: &[RequestNode]) -> Result<Vec<ResponseNode>> {
        let mut level = nodes
            .iter()
            .map(|node| LevelNode::resolve(node, ctx))
            .collect::<Result<Vec<_>>>()?;

        if ctx.request.normalize {
            self.pipeline.normalize(ctx, &mut level)?;
        }
        self.pipeline.generate(ctx, &mut level)?;
        self.pipeline.score(ctx, &mut level)?;

        debug!(
            "Level {} scored: {} nodes, {} values",
            ctx.depth,
            level.len(),
            level.iter().map(|n| n.values.len()).sum::<usize>()
        );

        let mut response = Vec::with_capacity(level.len());
        for node in level {
            let request = node.request;
            let mut values = node.values;
            let children = request.children();
            if !children.is_empty() {
                for value in &mut values {
                    let filter = NodeContext::value_filter(&request.field_type, &value.value);
                    let child = ctx.narrow(&filter)?;
                    value.compare = Some(self.evaluate_level(&child, children)?);
                }
            }
            response.push(ResponseNode {
                values,
                ..ResponseNode::new(request.field_type.as_str())
            });
        }
        Ok(response)
    }
}
