//! Vertices, Edges and Edge Groups
//!
//! The engine knows vertices only by their [`VertexId`] and edges only by
//! value. Two edges are the same edge when origin, destination and label all
//! match.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable identifier of a vertex in the dependency graph.
///
/// Identifiers are never reused while the graph is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);

impl VertexId {
    /// Get the raw index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl From<usize> for VertexId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed reference: the `label` attribute of `origin` refers to a value
/// defined at `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub origin: VertexId,
    pub destination: VertexId,
    pub label: String,
}

impl Edge {
    pub fn new(origin: VertexId, destination: VertexId, label: impl Into<String>) -> Self {
        Self {
            origin,
            destination,
            label: label.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.origin, self.label, self.destination)
    }
}

/// Edges that share one origin and one label, evaluated as a single unit.
///
/// A group is never empty, and every edge in it has the group's origin and
/// label. Only [`group_edges`](crate::render::group_edges) builds groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeGroup {
    origin: VertexId,
    label: String,
    edges: SmallVec<[Edge; 4]>,
}

impl EdgeGroup {
    pub(crate) fn new(first: Edge) -> Self {
        let mut edges = SmallVec::new();
        let origin = first.origin;
        let label = first.label.clone();
        edges.push(first);
        Self {
            origin,
            label,
            edges,
        }
    }

    pub(crate) fn push(&mut self, edge: Edge) {
        debug_assert_eq!(edge.origin, self.origin, "edge origin differs from group");
        debug_assert_eq!(edge.label, self.label, "edge label differs from group");
        self.edges.push(edge);
    }

    /// The vertex whose attribute this group rewrites.
    pub fn origin(&self) -> VertexId {
        self.origin
    }

    /// The attribute being rewritten.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the group holds no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Destinations in edge order.
    pub fn destinations(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.edges.iter().map(|edge| edge.destination)
    }
}
