//! Evaluation Strategy
//!
//! The engine decides *when* an edge group is ready; a strategy decides
//! *what* evaluating it means for a given configuration language.

use crate::error::StrategyError;
use crate::graph::{EdgeGroup, RenderGraph};

use super::tracker::ValueCache;

/// Pluggable evaluation of edge groups.
///
/// `evaluate` may run concurrently for different groups of one dispatch
/// batch, including two groups with the same origin and different labels.
/// Implementations must keep writes scoped to `(group.origin(), group.label())`.
/// The same group is never evaluated twice at once.
pub trait EvaluationStrategy<G: RenderGraph>: Sync {
    /// Read the current values of every destination in `group` and write
    /// the resolved value into the origin's `group.label()` attribute.
    ///
    /// Must give the same result when called again with the same group.
    fn evaluate(&self, graph: &G, group: &EdgeGroup, cache: &ValueCache) -> Result<(), StrategyError>;

    /// Runs once after the main loop and after configs were materialized.
    ///
    /// Returns the number of attributes rewritten; a non-zero count makes
    /// the engine materialize configs again. The default does nothing.
    fn finalize(&self, graph: &G) -> Result<usize, StrategyError> {
        let _ = graph;
        Ok(0)
    }
}
