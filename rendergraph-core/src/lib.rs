//! RenderGraph Core
//!
//! This crate resolves symbolic attribute references between the vertices
//! of a configuration dependency graph. It implements:
//!
//! - A degree-driven fixpoint engine that evaluates references from the
//!   sinks upward
//! - Grouping of references by origin attribute
//! - Sequential or pooled dispatch of evaluation work
//! - Per-vertex convergence tracking and a bounded iteration count, so
//!   cyclic graphs terminate with a partial result
//!
//! The engine is independent of any configuration language. Evaluation is
//! delegated to an [`EvaluationStrategy`](render::EvaluationStrategy), and
//! the graph is anything implementing [`RenderGraph`](graph::RenderGraph).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: vertex and edge types, the graph query trait, an in-memory graph
//! - `render`: grouping, tracking, dispatch and the engine itself
//! - `substitution`: a `${name}` reference strategy for the in-memory graph
//! - `config`: dispatch configuration
//! - `error`: error types
//!
//! # Example
//!
//! ```rust
//! use rendergraph_core::{LocalGraph, ReferenceSubstitution, RenderConfig, RenderEngine};
//! use serde_json::json;
//!
//! let mut graph = LocalGraph::new();
//! let region = graph.add_vertex("region", [("value", json!("eu-west-1"))]).unwrap();
//! let bucket = graph.add_vertex("bucket", [("location", json!("${region}"))]).unwrap();
//! graph.add_edge(bucket, region, "location").unwrap();
//!
//! let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), RenderConfig::default()).unwrap();
//! let report = engine.render().unwrap();
//!
//! assert!(report.converged());
//! assert_eq!(graph.config(bucket), Some(json!({"location": "eu-west-1"})));
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod render;
pub mod substitution;

pub use config::RenderConfig;
pub use error::{ConfigError, GraphError, RenderError, StrategyError};
pub use graph::{Edge, EdgeGroup, LocalGraph, RenderGraph, VertexId};
pub use render::{EvaluationStrategy, RenderEngine, RenderReport};
pub use substitution::ReferenceSubstitution;
