//! Iterative Rendering
//!
//! This module resolves attribute references across a [`RenderGraph`]
//! by evaluating edges whose destination value is already known and walking
//! upstream until nothing is left or the iteration bound is hit.
//!
//! # Pieces
//!
//! - [`group_edges`] partitions pending edges by `(origin, label)`
//! - [`ConvergenceTracker`] records done edges and owns the [`ValueCache`]
//! - [`Dispatcher`] runs a batch of groups in sequence or on a worker pool
//! - [`EvaluationStrategy`] is the language-specific evaluation hook
//! - [`RenderEngine`] ties them together
//!
//! [`RenderGraph`]: crate::graph::RenderGraph

mod dispatch;
mod engine;
mod grouping;
mod strategy;
mod tracker;

pub use dispatch::{Dispatcher, GroupOutcome};
pub use engine::{RenderEngine, RenderReport, MAX_ITERATIONS};
pub use grouping::group_edges;
pub use strategy::EvaluationStrategy;
pub use tracker::{ConvergenceTracker, Scratch, ValueCache};
