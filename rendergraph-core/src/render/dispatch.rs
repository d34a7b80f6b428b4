//! Group Dispatch
//!
//! Runs one batch of edge groups, either in sequence on the calling thread
//! or on a bounded rayon pool. Either way `run` returns only after every
//! group has been attempted, and it reports one outcome per group in input
//! order. A failing or panicking group never stops its siblings.
//!
//! Pools are built lazily, one per distinct worker count, and reused by
//! later batches of the same size.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{RenderError, StrategyError};
use crate::graph::{EdgeGroup, RenderGraph};

use super::strategy::EvaluationStrategy;
use super::tracker::ValueCache;

/// Outcome of evaluating a single group.
pub type GroupOutcome = Result<(), StrategyError>;

/// Sequential or pooled runner for edge groups.
#[derive(Debug)]
pub struct Dispatcher {
    concurrent: bool,
    max_workers: usize,

    /// Worker pools keyed by thread count.
    pools: Mutex<HashMap<usize, Arc<ThreadPool>>>,
}

impl Dispatcher {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            concurrent: config.concurrent,
            max_workers: config.max_workers.max(1),
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// Evaluate every group and wait for all of them.
    ///
    /// The only error is failing to build the pool; per-group failures come
    /// back in the outcome vector.
    pub fn run<G, S>(
        &self,
        groups: &[EdgeGroup],
        graph: &G,
        strategy: &S,
        cache: &ValueCache,
    ) -> Result<Vec<GroupOutcome>, RenderError>
    where
        G: RenderGraph,
        S: EvaluationStrategy<G>,
    {
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        if !self.concurrent {
            return Ok(groups
                .iter()
                .map(|group| evaluate_group(graph, group, strategy, cache))
                .collect());
        }

        let workers = self.max_workers.min(groups.len());
        debug!(groups = groups.len(), workers, "dispatching on worker pool");

        let pool = self.pool(workers)?;

        // `install` returns once the parallel iterator has drained, which is
        // the barrier the engine's bookkeeping relies on.
        Ok(pool.install(|| {
            groups
                .par_iter()
                .map(|group| evaluate_group(graph, group, strategy, cache))
                .collect()
        }))
    }

    /// The cached pool with `workers` threads, built on first use.
    fn pool(&self, workers: usize) -> Result<Arc<ThreadPool>, RenderError> {
        let mut pools = self.pools.lock();
        if let Some(pool) = pools.get(&workers) {
            return Ok(Arc::clone(pool));
        }

        debug!(workers, "building worker pool");
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("render-worker-{index}"))
            .build()
            .map(Arc::new)
            .map_err(|e| RenderError::Pool(e.to_string()))?;
        pools.insert(workers, Arc::clone(&pool));
        Ok(pool)
    }

    /// Number of worker pools built so far.
    pub fn pool_count(&self) -> usize {
        self.pools.lock().len()
    }
}

fn evaluate_group<G, S>(graph: &G, group: &EdgeGroup, strategy: &S, cache: &ValueCache) -> GroupOutcome
where
    G: RenderGraph,
    S: EvaluationStrategy<G>,
{
    debug!(origin = %group.origin(), label = group.label(), edges = group.len(), "evaluating group");

    panic::catch_unwind(AssertUnwindSafe(|| strategy.evaluate(graph, group, cache))).unwrap_or_else(
        |payload| {
            Err(StrategyError::Panicked {
                origin: group.origin(),
                label: group.label().to_string(),
                message: panic_message(payload.as_ref()),
            })
        },
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
