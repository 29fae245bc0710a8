//! # relgraph
//!
//! A relatedness scoring engine: how much more (or less) common is each value
//! of a field among the documents matching a query than across a reference
//! population, evaluated over a nestable tree of comparisons.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! relgraph --corpus jobs.jsonl --config relgraph.json --http-port 8983
//! curl -X POST localhost:8983/relatedness -H 'content-type: application/json' \
//!      -d '{"queries": ["jobtitle:nurse"], "compare": [{"type": "skills", "limit": 5}]}'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use relgraph::prelude::*;
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let corpus = MemoryCorpus::from_documents(vec![
//!     json!({"jobtitle": "nurse", "city": "atlanta", "skills": ["triage", "charting"]}),
//!     json!({"jobtitle": "nurse", "city": "boston", "skills": ["triage"]}),
//!     json!({"jobtitle": "chef", "city": "atlanta", "skills": ["knives"]}),
//! ]).unwrap();
//!
//! let engine = RelatednessEngine::new(Arc::new(corpus), EngineConfig::default()).unwrap();
//! let request = RelatednessRequest::new(
//!     vec!["jobtitle:nurse".to_string()],
//!     vec![RequestNode::new("skills").with_compare(vec![RequestNode::new("city")])],
//! );
//! let response = engine.respond(request, HashMap::new());
//! let skills = &response.data.unwrap()[0];
//! assert_eq!(skills.values[0].value, "triage");
//! assert!(skills.values[0].compare.is_some());
//! ```
//!
//! ## Crate Structure
//!
//! - [`relgraph-core`](relgraph_core) - corpus interface, document sets, queries, in-memory corpus, worker pool
//! - [`relgraph-engine`](relgraph_engine) - scoring, discovery, normalization and tree evaluation
//! - [`relgraph-api`](relgraph_api) - REST API

// Re-export core types
pub use relgraph_core::{Corpus, DocId, DocSet, FacetBucket, MemoryCorpus, Query, WorkerPool};

// Re-export engine
pub use relgraph_engine::{
    EngineConfig, NormalizedValue, ParameterSet, RelatednessEngine, RelatednessError, RelatednessRequest,
    RelatednessResponse, RequestNode, ResponseNode, ResponseValue,
};

// Re-export API
pub use relgraph_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Corpus, DocSet, EngineConfig, MemoryCorpus, Query, RelatednessEngine, RelatednessError, RelatednessRequest,
        RelatednessResponse, RequestNode, ResponseNode, ResponseValue, RestApi,
    };
}

/// The scoring function and per-million rates
pub mod scoring {
    pub use relgraph_engine::scoring::{rate_per_million, relatedness};
}
