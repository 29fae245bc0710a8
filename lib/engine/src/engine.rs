use crate::context::NodeContext;
use crate::recurser::{CorpusPipeline, RequestTreeRecurser};
use crate::validate::validate_request;
use crate::{EngineConfig, RelatednessRequest, RelatednessResponse, ResponseNode, Result};
use relgraph_core::{global_pool, Corpus, WorkerPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Entry point for relatedness requests against one corpus
pub struct RelatednessEngine {
    corpus: Arc<dyn Corpus>,
    config: EngineConfig,
    pool: Arc<WorkerPool>,
}

impl RelatednessEngine {
    /// Engine on a pool of `config.worker_threads` threads, or the shared
    /// process-wide pool when unset
    pub fn new(corpus: Arc<dyn Corpus>, config: EngineConfig) -> Result<Self> {
        let pool = match config.worker_threads {
            Some(threads) => Arc::new(WorkerPool::new(threads)?),
            None => global_pool()?,
        };
        Ok(Self::with_pool(corpus, config, pool))
    }

    pub fn with_pool(corpus: Arc<dyn Corpus>, config: EngineConfig, pool: Arc<WorkerPool>) -> Self {
        Self { corpus, config, pool }
    }

    pub fn corpus(&self) -> &Arc<dyn Corpus> {
        &self.corpus
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Validate and evaluate a request.
    ///
    /// `params` are the request-level parameters; they are merged with the
    /// configured defaults and invariants.
    pub fn evaluate(
        &self,
        request: RelatednessRequest,
        params: HashMap<String, String>,
    ) -> Result<Option<Vec<ResponseNode>>> {
        let start = Instant::now();
        let params = self.config.parameter_set(params);
        validate_request(&request, &params, self.corpus.as_ref())?;

        let ctx = NodeContext::new(Arc::new(request), Arc::new(params), self.corpus.clone(), self.pool.clone())?;
        info!(
            "Evaluating {} compare nodes (fg {}, bg {})",
            ctx.request.compare.len(),
            ctx.fg_domain.len(),
            ctx.bg_domain.len()
        );

        let data = RequestTreeRecurser::new(CorpusPipeline).score(&ctx)?;
        info!("Relatedness request completed in {:.2?}", start.elapsed());
        Ok(data)
    }

    /// Evaluate and wrap the outcome in the response envelope
    pub fn respond(&self, request: RelatednessRequest, params: HashMap<String, String>) -> RelatednessResponse {
        match self.evaluate(request, params) {
            Ok(data) => RelatednessResponse::data(data),
            Err(e) => {
                if e.is_client_error() {
                    warn!("Rejected relatedness request: {}", e);
                } else {
                    error!("Relatedness request failed: {}", e);
                }
                RelatednessResponse::error(e.to_string(), e.status_code())
            }
        }
    }
}
