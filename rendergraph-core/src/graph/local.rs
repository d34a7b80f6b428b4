//! In-Memory Graph
//!
//! [`LocalGraph`] stores vertices in a vector indexed by [`VertexId`] and
//! keeps both outgoing and incoming adjacency lists, so degree queries and
//! edge lookups in either direction are O(1) per vertex.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::edge::{Edge, VertexId};
use super::RenderGraph;
use crate::error::GraphError;

/// A configuration block in the graph.
#[derive(Debug)]
pub struct Vertex {
    /// Unique identifier for this vertex.
    id: VertexId,

    /// Unique name, used by references such as `${name}`.
    name: String,

    /// Working attributes. Evaluation strategies read and write these.
    attributes: RwLock<IndexMap<String, Value>>,

    /// Persisted configuration, refreshed by `materialize_configs`.
    config: RwLock<Value>,
}

impl Vertex {
    fn new(id: VertexId, name: String, attributes: IndexMap<String, Value>) -> Self {
        let config = to_config(&attributes);
        Self {
            id,
            name,
            attributes: RwLock::new(attributes),
            config: RwLock::new(config),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current working value of one attribute.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes.read().get(key).cloned()
    }

    /// Snapshot of all working attributes.
    pub fn attributes(&self) -> IndexMap<String, Value> {
        self.attributes.read().clone()
    }

    /// Overwrite one working attribute. Writes to different attributes of
    /// the same vertex may come from different workers.
    pub fn set_attribute(&self, key: impl Into<String>, value: Value) {
        self.attributes.write().insert(key.into(), value);
    }

    /// Rewrite every attribute in place; `f` returns the replacement, or
    /// `None` to leave a value alone. Returns how many values changed.
    pub fn rewrite_attributes<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&str, &Value) -> Option<Value>,
    {
        let mut attributes = self.attributes.write();
        let mut changed = 0;
        for (key, value) in attributes.iter_mut() {
            if let Some(new_value) = f(key, value) {
                *value = new_value;
                changed += 1;
            }
        }
        changed
    }

    /// The persisted configuration object.
    pub fn config(&self) -> Value {
        self.config.read().clone()
    }

    fn materialize(&self) {
        let config = to_config(&self.attributes.read());
        *self.config.write() = config;
    }
}

fn to_config(attributes: &IndexMap<String, Value>) -> Value {
    let map: Map<String, Value> = attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(map)
}

/// An in-memory dependency graph.
#[derive(Debug, Default)]
pub struct LocalGraph {
    /// All vertices, indexed by `VertexId`.
    vertices: Vec<Vertex>,

    /// Name lookup.
    names: HashMap<String, VertexId>,

    /// Outgoing edges per vertex, in insertion order.
    out_edges: Vec<Vec<Edge>>,

    /// Incoming edges per vertex, in insertion order.
    in_edges: Vec<Vec<Edge>>,

    /// Every edge, for duplicate detection.
    edges: HashSet<Edge>,
}

impl LocalGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with its initial attributes.
    pub fn add_vertex<K, A>(&mut self, name: impl Into<String>, attributes: A) -> Result<VertexId, GraphError>
    where
        K: Into<String>,
        A: IntoIterator<Item = (K, Value)>,
    {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }

        let id = VertexId::from(self.vertices.len());
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();

        self.names.insert(name.clone(), id);
        self.vertices.push(Vertex::new(id, name, attributes));
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        Ok(id)
    }

    /// Add an edge: the `label` attribute of `origin` references
    /// `destination`.
    ///
    /// Returns `false` if the exact same edge was already present.
    pub fn add_edge(
        &mut self,
        origin: VertexId,
        destination: VertexId,
        label: impl Into<String>,
    ) -> Result<bool, GraphError> {
        self.check(origin)?;
        self.check(destination)?;

        let edge = Edge::new(origin, destination, label);
        if !self.edges.insert(edge.clone()) {
            return Ok(false);
        }

        self.in_edges[destination.raw()].push(edge.clone());
        self.out_edges[origin.raw()].push(edge);
        Ok(true)
    }

    fn check(&self, id: VertexId) -> Result<(), GraphError> {
        if id.raw() < self.vertices.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(id))
        }
    }

    /// Get a vertex by id.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.raw())
    }

    /// Look a vertex up by name.
    pub fn vertex_by_name(&self, name: &str) -> Option<&Vertex> {
        self.names.get(name).and_then(|id| self.vertex(*id))
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Persisted configuration of a vertex.
    pub fn config(&self, id: VertexId) -> Option<Value> {
        self.vertex(id).map(Vertex::config)
    }

    /// Persisted configuration of every vertex, keyed by name.
    pub fn configs(&self) -> IndexMap<String, Value> {
        self.vertices
            .iter()
            .map(|vertex| (vertex.name.clone(), vertex.config()))
            .collect()
    }

    /// Overwrite a working attribute.
    pub fn set_attribute(&self, id: VertexId, key: impl Into<String>, value: Value) -> Result<(), GraphError> {
        let vertex = self.vertex(id).ok_or(GraphError::UnknownVertex(id))?;
        vertex.set_attribute(key, value);
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn out_degree(&self, id: VertexId) -> usize {
        self.out_edges.get(id.raw()).map_or(0, Vec::len)
    }

    pub fn in_degree(&self, id: VertexId) -> usize {
        self.in_edges.get(id.raw()).map_or(0, Vec::len)
    }
}

impl RenderGraph for LocalGraph {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertices_with_degree<O, I>(&self, out_degree: O, in_degree: I) -> Vec<VertexId>
    where
        O: Fn(usize) -> bool,
        I: Fn(usize) -> bool,
    {
        self.vertices
            .iter()
            .map(Vertex::id)
            .filter(|&id| out_degree(self.out_degree(id)) && in_degree(self.in_degree(id)))
            .collect()
    }

    fn in_edges<'a, V>(&self, vertices: V) -> Vec<Edge>
    where
        V: IntoIterator<Item = &'a VertexId>,
    {
        vertices
            .into_iter()
            .filter_map(|id| self.in_edges.get(id.raw()))
            .flatten()
            .cloned()
            .collect()
    }

    fn out_edges_of(&self, vertex: VertexId) -> &[Edge] {
        self.out_edges.get(vertex.raw()).map(Vec::as_slice).unwrap_or(&[])
    }

    fn materialize_configs(&self) {
        for vertex in &self.vertices {
            vertex.materialize();
        }
    }
}
