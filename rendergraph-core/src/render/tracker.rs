//! Convergence Tracking
//!
//! The tracker remembers, per origin vertex, which outgoing edges have
//! already been evaluated. A vertex is resolved once all of its outgoing
//! edges are done. Done sets only ever grow during a pass.
//!
//! It also owns the [`ValueCache`], scratch space evaluation strategies use
//! to carry state between iterations.

use std::collections::{HashMap, HashSet};

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;

use crate::graph::{Edge, VertexId};

/// Per-vertex scratch data. Only the evaluation strategy interprets it.
pub type Scratch = IndexMap<String, Value>;

/// Strategy-private scratch values, one independent slot per vertex.
///
/// Slots are created empty on first access; no two vertices ever share a
/// slot. Access is sharded, so workers touching different vertices don't
/// contend.
#[derive(Debug, Default)]
pub struct ValueCache {
    slots: DashMap<VertexId, Scratch>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: DashMap::with_capacity(capacity),
        }
    }

    /// Exclusive access to a vertex's slot, creating it if needed.
    ///
    /// Holding the returned guard blocks other workers on the same shard;
    /// drop it before touching another vertex's slot.
    pub fn slot(&self, vertex: VertexId) -> RefMut<'_, VertexId, Scratch> {
        self.slots.entry(vertex).or_default()
    }

    /// Read one entry from a vertex's slot without creating the slot.
    pub fn get(&self, vertex: VertexId, key: &str) -> Option<Value> {
        self.slots
            .get(&vertex)
            .and_then(|slot| slot.get(key).cloned())
    }

    /// Number of slots created so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Bookkeeping for one render pass.
#[derive(Debug, Default)]
pub struct ConvergenceTracker {
    /// Evaluated edges, keyed by their origin.
    done: HashMap<VertexId, HashSet<Edge>>,

    cache: ValueCache,
}

impl ConvergenceTracker {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            done: HashMap::with_capacity(vertex_count),
            cache: ValueCache::with_capacity(vertex_count),
        }
    }

    /// Record an edge as evaluated. Returns `false` if it already was.
    pub fn mark_done(&mut self, edge: &Edge) -> bool {
        let done = self.done.entry(edge.origin).or_default();
        if done.contains(edge) {
            return false;
        }
        done.insert(edge.clone())
    }

    pub fn is_done(&self, edge: &Edge) -> bool {
        self.done
            .get(&edge.origin)
            .is_some_and(|done| done.contains(edge))
    }

    /// True when every edge in `out_edges` has been recorded for `vertex`.
    pub fn all_done(&self, vertex: VertexId, out_edges: &[Edge]) -> bool {
        match self.done.get(&vertex) {
            Some(done) => out_edges.iter().all(|edge| done.contains(edge)),
            None => out_edges.is_empty(),
        }
    }

    /// Number of evaluated edges originating at `vertex`.
    pub fn done_count(&self, vertex: VertexId) -> usize {
        self.done.get(&vertex).map_or(0, HashSet::len)
    }

    /// Total number of evaluated edges.
    pub fn total_done(&self) -> usize {
        self.done.values().map(HashSet::len).sum()
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }
}
