//! Concurrent fan-out of count and facet tasks
//!
//! Tasks are submitted to the shared [`WorkerPool`] and collected back into
//! slots indexed by submission order. Fan-in is a full barrier: every
//! submitted task is awaited before the first failure (lowest slot index) is
//! reported.

use crate::{RelatednessError, Result};
use relgraph_core::{Corpus, DocSet, FacetBucket, Job, Query, WorkerPool};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use tracing::debug;

/// Facet requests fetch this many times the wanted values (at least 25)
const FACET_OVERFETCH: usize = 5;
const FACET_MIN_LIMIT: usize = 25;

/// Run every present task on `pool` and wait for all of them.
///
/// Slot `i` of the result holds the output of `tasks[i]`; absent tasks stay
/// `None` and are never submitted.
pub fn fan_out<T, F>(pool: &WorkerPool, tasks: Vec<Option<F>>) -> Result<Vec<Option<T>>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let slots = tasks.len();
    let (tx, rx) = mpsc::channel::<(usize, std::thread::Result<Result<T>>)>();

    let mut submitted = 0usize;
    let mut submit_error = None;
    for (index, task) in tasks.into_iter().enumerate() {
        let Some(task) = task else { continue };
        let tx = tx.clone();
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task));
            let _ = tx.send((index, outcome));
        });
        if let Err(e) = pool.submit(job) {
            submit_error = Some(e);
            break;
        }
        submitted += 1;
    }
    drop(tx);

    if submitted > 0 {
        debug!("Fan-out of {} tasks over {} slots", submitted, slots);
    }

    let mut results: Vec<Option<T>> = (0..slots).map(|_| None).collect();
    let mut first_failure: Option<(usize, RelatednessError)> = None;
    for _ in 0..submitted {
        let (index, outcome) = rx.recv().map_err(|_| RelatednessError::Interrupted)?;
        let failure = match outcome {
            Ok(Ok(value)) => {
                results[index] = Some(value);
                continue;
            }
            Ok(Err(e)) => e,
            Err(payload) => RelatednessError::TaskPanicked(panic_message(payload.as_ref())),
        };
        if first_failure.as_ref().map_or(true, |(first, _)| index < *first) {
            first_failure = Some((index, failure));
        }
    }

    if let Some(e) = submit_error {
        return Err(e.into());
    }
    match first_failure {
        Some((_, e)) => Err(e),
        None => Ok(results),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Which population a count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulationType {
    /// Overall query domain
    Query,
    Foreground,
    Background,
}

/// Count of documents matching `query` inside `domain`
#[derive(Debug, Clone)]
pub struct QueryTask {
    pub domain: DocSet,
    pub query: Query,
    pub index: usize,
    pub population: PopulationType,
}

/// Completed [`QueryTask`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryResult {
    pub index: usize,
    pub population: PopulationType,
    pub count: f64,
}

impl QueryTask {
    pub fn new(domain: DocSet, query: Query, population: PopulationType, index: usize) -> Self {
        Self {
            domain,
            query,
            index,
            population,
        }
    }

    pub fn run(&self, corpus: &dyn Corpus) -> Result<QueryResult> {
        let count = corpus.count(&self.query, &self.domain)?;
        Ok(QueryResult {
            index: self.index,
            population: self.population,
            count: count as f64,
        })
    }
}

/// Top values of `field` within `domain`, optionally narrowed by a query
#[derive(Debug, Clone)]
pub struct AggregationTask {
    pub domain: DocSet,
    pub field: String,
    pub facet_query: Option<Query>,
    pub index: usize,
    pub limit: usize,
}

impl AggregationTask {
    pub fn new(domain: DocSet, field: impl Into<String>, facet_query: Option<Query>, index: usize, limit: usize) -> Self {
        Self {
            domain,
            field: field.into(),
            facet_query,
            index,
            limit,
        }
    }

    /// Buckets actually requested from the corpus
    pub fn facet_limit(&self) -> usize {
        FACET_OVERFETCH * self.limit.max(FACET_MIN_LIMIT)
    }

    pub fn run(&self, corpus: &dyn Corpus) -> Result<Vec<FacetBucket>> {
        Ok(corpus.facet_top_values(&self.field, self.facet_query.as_ref(), &self.domain, self.facet_limit())?)
    }
}

/// Run count tasks concurrently; results come back in task order
pub fn run_queries(pool: &WorkerPool, corpus: &Arc<dyn Corpus>, tasks: Vec<QueryTask>) -> Result<Vec<QueryResult>> {
    let jobs: Vec<Option<_>> = tasks
        .into_iter()
        .map(|task| {
            let corpus = corpus.clone();
            Some(move || task.run(corpus.as_ref()))
        })
        .collect();
    Ok(fan_out(pool, jobs)?.into_iter().flatten().collect())
}

/// Run facet tasks concurrently; absent tasks yield `None` in their slot
pub fn run_aggregations(
    pool: &WorkerPool,
    corpus: &Arc<dyn Corpus>,
    tasks: Vec<Option<AggregationTask>>,
) -> Result<Vec<Option<Vec<FacetBucket>>>> {
    let jobs: Vec<Option<_>> = tasks
        .into_iter()
        .map(|task| {
            task.map(|task| {
                let corpus = corpus.clone();
                move || task.run(corpus.as_ref())
            })
        })
        .collect();
    fan_out(pool, jobs)
}
