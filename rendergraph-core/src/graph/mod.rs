//! Dependency Graph
//!
//! This module defines what the render engine needs from a dependency graph
//! and ships one in-memory implementation of it.
//!
//! # Overview
//!
//! The graph is directed and may contain cycles:
//!
//! - Vertices are configuration blocks, each with a set of named attributes
//! - An edge `origin -> destination` labelled `attr` means the `attr`
//!   attribute of `origin` references a value defined at `destination`
//!
//! A vertex with no outgoing edges holds only concrete values. Once every
//! outgoing edge of a vertex has been evaluated, its own values are concrete
//! too and the vertices referencing it can proceed.
//!
//! # Design Decisions
//!
//! 1. The engine talks to the graph through [`RenderGraph`] only, so graph
//!    storage stays outside the engine.
//!
//! 2. All query methods take `&self`. Evaluation strategies write attributes
//!    from several workers at once, so implementations keep per-vertex
//!    interior mutability instead of asking for `&mut self`.
//!
//! 3. Edge order is insertion order. The engine's schedule is only as
//!    deterministic as the order the graph reports edges in.

mod edge;
mod local;

pub use edge::{Edge, EdgeGroup, VertexId};
pub use local::{LocalGraph, Vertex};

/// Query surface the render engine consumes.
pub trait RenderGraph: Sync {
    /// Number of vertices in the graph.
    fn vertex_count(&self) -> usize;

    /// Vertices whose out-degree and in-degree satisfy both predicates, in
    /// vertex order.
    fn vertices_with_degree<O, I>(&self, out_degree: O, in_degree: I) -> Vec<VertexId>
    where
        O: Fn(usize) -> bool,
        I: Fn(usize) -> bool;

    /// All edges entering any of `vertices`, grouped by vertex in the order
    /// the vertices are given.
    fn in_edges<'a, V>(&self, vertices: V) -> Vec<Edge>
    where
        V: IntoIterator<Item = &'a VertexId>;

    /// Edges leaving `vertex`. Unknown vertices have none.
    fn out_edges_of(&self, vertex: VertexId) -> &[Edge];

    /// Push values written by the evaluation strategy into the persisted
    /// vertex configurations.
    fn materialize_configs(&self);
}
