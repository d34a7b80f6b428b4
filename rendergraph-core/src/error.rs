//! Error Types
//!
//! Every fallible operation in the crate reports one of the enums below.
//! Reaching the iteration bound is not an error; it shows up in the
//! [`RenderReport`](crate::render::RenderReport) instead.

use thiserror::Error;

use crate::graph::VertexId;

/// Errors raised by the in-memory graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {0} does not exist in this graph")]
    UnknownVertex(VertexId),

    #[error("a vertex named `{0}` already exists")]
    DuplicateName(String),
}

/// Failure of a single edge group inside an evaluation strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("evaluating `{label}` on vertex {origin} failed: {reason}")]
    Failed {
        origin: VertexId,
        label: String,
        reason: String,
    },

    #[error("evaluating `{label}` on vertex {origin} panicked: {message}")]
    Panicked {
        origin: VertexId,
        label: String,
        message: String,
    },
}

/// Invalid render configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{var}` must be True or False, got `{value}`")]
    InvalidBool { var: &'static str, value: String },

    #[error("`{var}` must be a positive integer, got `{value}`")]
    InvalidWorkerCount { var: &'static str, value: String },

    #[error("max_workers must be at least 1")]
    ZeroWorkers,
}

/// Errors surfaced by [`RenderEngine::render`](crate::render::RenderEngine::render).
#[derive(Error, Debug)]
pub enum RenderError {
    /// One or more groups of a dispatch batch failed. Every other group of
    /// that batch was still evaluated and recorded.
    #[error("{} edge group(s) failed to evaluate", .0.len())]
    Evaluation(Vec<StrategyError>),

    #[error("fallback pass failed: {0}")]
    Finalize(StrategyError),

    #[error("could not build worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RenderError {
    /// The individual group failures, if this is an evaluation error.
    pub fn failures(&self) -> &[StrategyError] {
        match self {
            RenderError::Evaluation(failures) => failures,
            _ => &[],
        }
    }
}
