//! # relgraph Core
//!
//! Core library for the relgraph relatedness engine.
//!
//! This crate provides the pieces the engine consumes from the outside world:
//!
//! - [`Corpus`] - the narrow interface to a searchable document corpus
//! - [`DocSet`] - immutable sorted document id sets
//! - [`Query`] - field queries and their string syntax
//! - [`MemoryCorpus`] - an in-memory corpus of JSON documents
//! - [`WorkerPool`] - the shared pool count and facet tasks run on
//!
//! ## Example
//!
//! ```rust
//! use relgraph_core::{Corpus, MemoryCorpus, Query};
//! use serde_json::json;
//!
//! let corpus = MemoryCorpus::from_documents(vec![
//!     json!({"jobtitle": "nurse", "skills": ["triage", "patient care"]}),
//!     json!({"jobtitle": "engineer", "skills": ["rust"]}),
//! ]).unwrap();
//!
//! let nurses = corpus.resolve(&Query::parse("jobtitle:nurse").unwrap()).unwrap();
//! let triage = corpus.count(&Query::term("skills", "triage"), &nurses).unwrap();
//! assert_eq!(triage, 1);
//! ```

pub mod corpus;
pub mod docset;
pub mod error;
pub mod memory;
pub mod pool;
pub mod query;

pub use corpus::{Corpus, FacetBucket};
pub use docset::{DocId, DocSet};
pub use error::{Error, Result};
pub use memory::MemoryCorpus;
pub use pool::{global_pool, Job, WorkerPool};
pub use query::Query;
