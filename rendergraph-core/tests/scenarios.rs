//! Integration Tests for the Render Engine
//!
//! These tests run the engine with the reference substitution strategy over
//! small hand-built graphs.

use serde_json::{json, Value};

use rendergraph_core::render::ValueCache;
use rendergraph_core::substitution::UNRESOLVED;
use rendergraph_core::{
    EdgeGroup, EvaluationStrategy, LocalGraph, ReferenceSubstitution, RenderConfig, RenderEngine,
    RenderError, StrategyError, VertexId,
};

fn value_of(graph: &LocalGraph, id: VertexId) -> Value {
    graph.config(id).unwrap()["value"].clone()
}

/// A references B, B holds "x": one iteration resolves A.
#[test]
fn single_reference_converges_in_one_iteration() {
    let mut graph = LocalGraph::new();
    let a = graph.add_vertex("A", [("value", json!("${B}"))]).unwrap();
    let b = graph.add_vertex("B", [("value", json!("x"))]).unwrap();
    graph.add_edge(a, b, "value").unwrap();

    let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), RenderConfig::default()).unwrap();
    let report = engine.render().unwrap();

    assert_eq!(report.iterations, 1);
    assert!(report.converged());
    assert_eq!(value_of(&graph, a), json!("x"));
}

/// A -> B -> C -> D with only D concrete takes exactly three iterations.
#[test]
fn chain_converges_one_link_per_iteration() {
    let mut graph = LocalGraph::new();
    let a = graph.add_vertex("A", [("value", json!("${B}"))]).unwrap();
    let b = graph.add_vertex("B", [("value", json!("${C}"))]).unwrap();
    let c = graph.add_vertex("C", [("value", json!("${D}"))]).unwrap();
    let d = graph.add_vertex("D", [("value", json!("x"))]).unwrap();
    graph.add_edge(a, b, "value").unwrap();
    graph.add_edge(b, c, "value").unwrap();
    graph.add_edge(c, d, "value").unwrap();

    let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), RenderConfig::default()).unwrap();
    let report = engine.render().unwrap();

    assert_eq!(report.iterations, 3);
    assert_eq!(report.evaluated_edges, 3);
    for id in [a, b, c, d] {
        assert_eq!(value_of(&graph, id), json!("x"));
    }
}

/// A two-vertex cycle with no outside value terminates, is reported
/// unresolved, and gets the placeholder.
#[test]
fn two_vertex_cycle_falls_back_to_placeholder() {
    let mut graph = LocalGraph::new();
    let a = graph.add_vertex("A", [("value", json!("${B}"))]).unwrap();
    let b = graph.add_vertex("B", [("value", json!("${A}"))]).unwrap();
    graph.add_edge(a, b, "value").unwrap();
    graph.add_edge(b, a, "value").unwrap();

    let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), RenderConfig::default()).unwrap();
    let report = engine.render().unwrap();

    assert!(!report.converged());
    assert_eq!(report.unresolved, vec![a, b]);
    assert_eq!(report.fallback_rewrites, 2);
    assert_eq!(value_of(&graph, a), json!(UNRESOLVED));
    assert_eq!(value_of(&graph, b), json!(UNRESOLVED));
}

/// Only vertices on the cycle, or waiting on it, stay unresolved.
#[test]
fn cycle_does_not_block_the_rest_of_the_graph() {
    let mut graph = LocalGraph::new();
    let a = graph.add_vertex("A", [("value", json!("${B}"))]).unwrap();
    let b = graph.add_vertex("B", [("value", json!("${A}"))]).unwrap();
    let waiter = graph
        .add_vertex("waiter", [("value", json!("${A}")), ("other", json!("${leaf}"))])
        .unwrap();
    let user = graph.add_vertex("user", [("value", json!("${leaf}-ok"))]).unwrap();
    let leaf = graph.add_vertex("leaf", [("value", json!("leaf"))]).unwrap();
    graph.add_edge(a, b, "value").unwrap();
    graph.add_edge(b, a, "value").unwrap();
    graph.add_edge(waiter, a, "value").unwrap();
    graph.add_edge(waiter, leaf, "other").unwrap();
    graph.add_edge(user, leaf, "value").unwrap();

    let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), RenderConfig::default()).unwrap();
    let report = engine.render().unwrap();

    assert_eq!(report.unresolved, vec![a, b, waiter]);
    assert_eq!(value_of(&graph, user), json!("leaf-ok"));

    let waiter_config = graph.config(waiter).unwrap();
    assert_eq!(waiter_config["other"], json!("leaf"));
    assert_eq!(waiter_config["value"], json!(UNRESOLVED));
}

/// Several references in one attribute, with different readiness.
#[test]
fn attribute_with_references_of_different_depth() {
    for config in [RenderConfig::sequential(), RenderConfig::concurrent(4)] {
        let mut graph = LocalGraph::new();
        let app = graph
            .add_vertex("app", [("url", json!("${host}:${port}")), ("replicas", json!("${count}"))])
            .unwrap();
        let host = graph.add_vertex("host", [("value", json!("${domain}"))]).unwrap();
        let domain = graph.add_vertex("domain", [("value", json!("example.org"))]).unwrap();
        let port = graph.add_vertex("port", [("value", json!(443))]).unwrap();
        let count = graph.add_vertex("count", [("value", json!(3))]).unwrap();
        graph.add_edge(app, host, "url").unwrap();
        graph.add_edge(app, port, "url").unwrap();
        graph.add_edge(app, count, "replicas").unwrap();
        graph.add_edge(host, domain, "value").unwrap();

        let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), config).unwrap();
        let report = engine.render().unwrap();

        // The port half of `url` is filled in first, the host half one
        // iteration later.
        assert!(report.converged());
        assert_eq!(report.iterations, 2);
        assert_eq!(
            graph.config(app),
            Some(json!({"url": "example.org:443", "replicas": 3}))
        );
    }
}

fn wide_graph() -> LocalGraph {
    let mut graph = LocalGraph::new();
    let base = graph.add_vertex("base", [("value", json!("b"))]).unwrap();
    let mut previous = Vec::new();
    for layer in 0..4 {
        let mut current = Vec::new();
        for i in 0..16 {
            let refs: Vec<String> = if previous.is_empty() {
                vec!["base".to_string()]
            } else {
                vec![format!("l{}_{}", layer - 1, i), format!("l{}_{}", layer - 1, (i + 1) % 16)]
            };
            let expression: String = refs.iter().map(|r| format!("${{{r}}}")).collect::<Vec<_>>().join("-");
            let id = graph
                .add_vertex(
                    format!("l{layer}_{i}"),
                    [("value", json!(expression)), ("name", json!(format!("${{base}}{i}")))],
                )
                .unwrap();
            if previous.is_empty() {
                graph.add_edge(id, base, "value").unwrap();
            } else {
                graph.add_edge(id, previous[i], "value").unwrap();
                graph.add_edge(id, previous[(i + 1) % 16], "value").unwrap();
            }
            graph.add_edge(id, base, "name").unwrap();
            current.push(id);
        }
        previous = current;
    }
    graph
}

/// Pooled dispatch produces the same configs as sequential dispatch.
#[test]
fn dispatch_modes_render_identically() {
    let render = |config: RenderConfig| {
        let graph = wide_graph();
        let engine = RenderEngine::new(&graph, ReferenceSubstitution::new(), config).unwrap();
        let report = engine.render().unwrap();
        (report, serde_json::to_string(&graph.configs()).unwrap())
    };

    let (sequential_report, sequential) = render(RenderConfig::sequential());
    assert!(sequential_report.converged());
    assert!(!sequential.contains("${"));

    for _ in 0..5 {
        let (report, concurrent) = render(RenderConfig::concurrent(8));
        assert_eq!(report, sequential_report);
        assert_eq!(concurrent, sequential);
    }
}

/// Fails every group for one label and delegates the rest.
struct FailOn {
    label: &'static str,
    inner: ReferenceSubstitution,
}

impl EvaluationStrategy<LocalGraph> for FailOn {
    fn evaluate(&self, graph: &LocalGraph, group: &EdgeGroup, cache: &ValueCache) -> Result<(), StrategyError> {
        if group.label() == self.label {
            return Err(StrategyError::Failed {
                origin: group.origin(),
                label: group.label().to_string(),
                reason: "refused".into(),
            });
        }
        self.inner.evaluate(graph, group, cache)
    }
}

/// A failing group surfaces as an error and leaves persisted configs alone.
#[test]
fn strategy_failure_leaves_configs_untouched() {
    let mut graph = LocalGraph::new();
    let leaf = graph.add_vertex("leaf", [("value", json!("v"))]).unwrap();
    let ok = graph.add_vertex("ok", [("value", json!("${leaf}"))]).unwrap();
    let broken = graph.add_vertex("broken", [("secret", json!("${leaf}"))]).unwrap();
    graph.add_edge(ok, leaf, "value").unwrap();
    graph.add_edge(broken, leaf, "secret").unwrap();

    for config in [RenderConfig::sequential(), RenderConfig::concurrent(2)] {
        let strategy = FailOn {
            label: "secret",
            inner: ReferenceSubstitution::new(),
        };
        let engine = RenderEngine::new(&graph, strategy, config).unwrap();
        let err = engine.render().unwrap_err();

        assert!(matches!(err, RenderError::Evaluation(ref failures) if failures.len() == 1));
        assert_eq!(graph.config(ok), Some(json!({"value": "${leaf}"})));
        assert_eq!(graph.config(broken), Some(json!({"secret": "${leaf}"})));
        // The sibling group still ran.
        assert_eq!(
            graph.vertex(ok).unwrap().attribute("value"),
            Some(json!("v"))
        );
    }
}
