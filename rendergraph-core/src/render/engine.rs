//! Render Engine
//!
//! The engine drives reference evaluation to a fixpoint.
//!
//! # Algorithm
//!
//! Work starts at the sinks and moves upstream:
//!
//! 1. The frontier starts as every vertex with no outgoing edges and at
//!    least one incoming edge. Their values are already concrete.
//! 2. The pending edges are the incoming edges of the frontier.
//! 3. Each iteration:
//!    - Group pending edges by `(origin, label)` and dispatch the groups
//!    - Record every evaluated edge as done for its origin
//!    - Add each origin whose outgoing edges are now all done to the frontier
//!    - Pending becomes the frontier's incoming edges that are not done yet
//! 4. Configs are materialized and the strategy's fallback pass runs.
//!
//! A cycle never contributes a vertex to the frontier, so cyclic references
//! are simply left behind. The iteration bound caps the work on very deep
//! graphs.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RenderConfig;
use crate::error::{RenderError, StrategyError};
use crate::graph::{Edge, RenderGraph, VertexId};

use super::dispatch::Dispatcher;
use super::grouping::group_edges;
use super::strategy::EvaluationStrategy;
use super::tracker::ConvergenceTracker;

/// Upper bound on main-loop iterations in one pass.
pub const MAX_ITERATIONS: usize = 50;

/// What a render pass achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Main-loop iterations executed.
    pub iterations: usize,

    /// Edges recorded as done.
    pub evaluated_edges: usize,

    /// The loop stopped at [`MAX_ITERATIONS`] with work still pending.
    pub hit_iteration_bound: bool,

    /// Vertices with at least one outgoing edge that was never evaluated.
    pub unresolved: Vec<VertexId>,

    /// Attributes the fallback pass rewrote.
    pub fallback_rewrites: usize,
}

impl RenderReport {
    /// True if every reference in the graph was evaluated.
    pub fn converged(&self) -> bool {
        !self.hit_iteration_bound && self.unresolved.is_empty()
    }
}

/// Fixpoint driver over a [`RenderGraph`].
pub struct RenderEngine<'g, G, S> {
    graph: &'g G,
    strategy: S,
    dispatcher: Dispatcher,
}

impl<'g, G, S> RenderEngine<'g, G, S>
where
    G: RenderGraph,
    S: EvaluationStrategy<G>,
{
    /// Create an engine over `graph`. Fails if the config is invalid.
    pub fn new(graph: &'g G, strategy: S, config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self {
            graph,
            strategy,
            dispatcher: Dispatcher::new(&config),
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run one render pass.
    pub fn render(&self) -> Result<RenderReport, RenderError> {
        self.render_inspect(|_, _| {})
    }

    /// Run one render pass, calling `on_iteration` with the iteration number
    /// and the tracker after each iteration's bookkeeping.
    pub fn render_inspect<F>(&self, mut on_iteration: F) -> Result<RenderReport, RenderError>
    where
        F: FnMut(usize, &ConvergenceTracker),
    {
        let graph = self.graph;
        let mut tracker = ConvergenceTracker::new(graph.vertex_count());

        let mut frontier: IndexSet<VertexId> = graph
            .vertices_with_degree(|out| out == 0, |inn| inn > 0)
            .into_iter()
            .collect();
        let mut pending = self.pending_edges(&frontier, &tracker);

        let mut iterations = 0;
        let mut hit_iteration_bound = false;

        while !pending.is_empty() {
            info!(edges = pending.len(), iteration = iterations, "evaluating edges");

            let groups = group_edges(pending);
            let outcomes = self
                .dispatcher
                .run(&groups, graph, &self.strategy, tracker.cache())?;

            let mut failures: Vec<StrategyError> = Vec::new();
            let mut completed = Vec::with_capacity(groups.len());
            for (group, outcome) in groups.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => {
                        for edge in group.edges() {
                            tracker.mark_done(edge);
                        }
                        completed.push(group.origin());
                    }
                    Err(err) => {
                        warn!(error = %err, "edge group failed");
                        failures.push(err);
                    }
                }
            }

            for origin in completed {
                if tracker.all_done(origin, graph.out_edges_of(origin)) {
                    frontier.insert(origin);
                }
            }

            iterations += 1;
            on_iteration(iterations, &tracker);

            if !failures.is_empty() {
                return Err(RenderError::Evaluation(failures));
            }

            pending = self.pending_edges(&frontier, &tracker);

            if iterations >= MAX_ITERATIONS && !pending.is_empty() {
                warn!(
                    pending = pending.len(),
                    "reached {MAX_ITERATIONS} graph edge iterations, breaking"
                );
                hit_iteration_bound = true;
                break;
            }
        }

        let unresolved: Vec<VertexId> = graph
            .vertices_with_degree(|out| out > 0, |_| true)
            .into_iter()
            .filter(|&vertex| !tracker.all_done(vertex, graph.out_edges_of(vertex)))
            .collect();
        if !unresolved.is_empty() {
            warn!(vertices = unresolved.len(), "vertices left with unevaluated references");
        }

        graph.materialize_configs();
        info!("done evaluating edges");

        let fallback_rewrites = self
            .strategy
            .finalize(graph)
            .map_err(RenderError::Finalize)?;
        if fallback_rewrites > 0 {
            graph.materialize_configs();
        }
        info!(rewrites = fallback_rewrites, "done with non-rendered values");

        Ok(RenderReport {
            iterations,
            evaluated_edges: tracker.total_done(),
            hit_iteration_bound,
            unresolved,
            fallback_rewrites,
        })
    }

    /// Incoming edges of the frontier not yet done, deduplicated, in
    /// frontier order.
    fn pending_edges(&self, frontier: &IndexSet<VertexId>, tracker: &ConvergenceTracker) -> Vec<Edge> {
        self.graph
            .in_edges(frontier)
            .into_iter()
            .filter(|edge| !tracker.is_done(edge))
            .collect::<IndexSet<Edge>>()
            .into_iter()
            .collect()
    }
}
