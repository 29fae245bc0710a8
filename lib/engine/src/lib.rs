//! # relgraph Engine
//!
//! Relatedness scoring over a [`relgraph_core::Corpus`].
//!
//! A request names a query population and a tree of comparisons. For every
//! node the engine gathers candidate values (given explicitly or discovered
//! from the corpus), counts each one in the foreground and background
//! populations concurrently, and scores how much more (or less) common the
//! value is in the foreground than the background would predict. Child
//! comparisons are then evaluated inside the documents holding each value.
//!
//! ## Example
//!
//! ```rust
//! use relgraph_core::MemoryCorpus;
//! use relgraph_engine::{EngineConfig, RelatednessEngine, RelatednessRequest, RequestNode};
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let corpus = MemoryCorpus::from_documents(vec![
//!     json!({"jobtitle": "nurse", "skills": ["triage", "charting"]}),
//!     json!({"jobtitle": "nurse", "skills": ["triage"]}),
//!     json!({"jobtitle": "chef", "skills": ["knives"]}),
//! ]).unwrap();
//!
//! let engine = RelatednessEngine::new(Arc::new(corpus), EngineConfig::default()).unwrap();
//! let request = RelatednessRequest::new(
//!     vec!["jobtitle:nurse".to_string()],
//!     vec![RequestNode::new("skills").with_limit(2)],
//! );
//! let data = engine.evaluate(request, HashMap::new()).unwrap().unwrap();
//! assert_eq!(data[0].values[0].value, "triage");
//! ```

pub mod adapter;
pub mod context;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod generator;
pub mod model;
pub mod normalizer;
pub mod params;
pub mod recurser;
pub mod scorer;
pub mod scoring;
pub mod sort;
pub mod validate;

pub use adapter::ValueAdapter;
pub use context::NodeContext;
pub use engine::RelatednessEngine;
pub use error::{RelatednessError, Result};
pub use fanout::{fan_out, AggregationTask, PopulationType, QueryResult, QueryTask};
pub use model::{
    ErrorBody, NormalizedValue, RelatednessRequest, RelatednessResponse, RequestNode, ResponseNode, ResponseValue,
};
pub use params::{EngineConfig, ParameterSet};
pub use recurser::{CorpusPipeline, LevelNode, LevelPipeline, RequestTreeRecurser};
pub use scoring::{rate_per_million, relatedness};
pub use sort::SortKey;
pub use validate::validate_request;
