//! Reference Substitution
//!
//! A ready-made [`EvaluationStrategy`] for [`LocalGraph`] that understands
//! `${...}` references:
//!
//! - `${name}` is the `value` attribute of the vertex called `name`
//! - `${name.attr}` is attribute `attr` of that vertex
//!
//! A string made of a single reference takes the referenced value as-is,
//! keeping its JSON type. Anywhere else the value's text is spliced into the
//! string. References nested in arrays and objects are rendered too.
//!
//! # Caching
//!
//! Per origin attribute, the vertex's [`ValueCache`] slot keeps the original
//! expression and every reference resolved so far. Each evaluation renders
//! from the original expression with all known resolutions, so a reference
//! resolved in an earlier iteration survives a later group that only carries
//! the remaining edges, and evaluating the same group twice is harmless.

use std::ops::Range;

use serde_json::{Map, Value};

use crate::error::StrategyError;
use crate::graph::{EdgeGroup, LocalGraph, Vertex};
use crate::render::{EvaluationStrategy, ValueCache};

/// Placeholder written by the fallback pass.
pub const UNRESOLVED: &str = "unresolved";

/// Attribute holding a vertex's own value, targeted by `${name}`.
pub const VALUE_ATTRIBUTE: &str = "value";

/// Attributes that hold templates of their own and are never rendered.
pub const NO_EVAL_ATTRIBUTES: &[&str] = &["template_body", "template"];

const TEMPLATE_KEY: &str = "template";
const RESOLVED_KEY: &str = "resolved";

/// `${...}` substitution over a [`LocalGraph`].
#[derive(Debug, Clone)]
pub struct ReferenceSubstitution {
    placeholder: Value,
}

impl Default for ReferenceSubstitution {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSubstitution {
    pub fn new() -> Self {
        Self {
            placeholder: Value::String(UNRESOLVED.to_string()),
        }
    }

    /// Use a different value for the strings the fallback pass rewrites.
    pub fn with_placeholder(placeholder: Value) -> Self {
        Self { placeholder }
    }

    fn failed(group: &EdgeGroup, reason: impl Into<String>) -> StrategyError {
        StrategyError::Failed {
            origin: group.origin(),
            label: group.label().to_string(),
            reason: reason.into(),
        }
    }
}

impl EvaluationStrategy<LocalGraph> for ReferenceSubstitution {
    fn evaluate(&self, graph: &LocalGraph, group: &EdgeGroup, cache: &ValueCache) -> Result<(), StrategyError> {
        let label = group.label();
        if NO_EVAL_ATTRIBUTES.contains(&label) {
            return Ok(());
        }

        let origin = graph
            .vertex(group.origin())
            .ok_or_else(|| Self::failed(group, "origin vertex missing"))?;

        let mut destinations = Vec::with_capacity(group.len());
        for id in group.destinations() {
            let vertex = graph
                .vertex(id)
                .ok_or_else(|| Self::failed(group, format!("destination {id} missing")))?;
            destinations.push(vertex);
        }

        let rendered = {
            let mut slot = cache.slot(origin.id());
            if !slot.contains_key(label) {
                let template = origin
                    .attribute(label)
                    .ok_or_else(|| Self::failed(group, "attribute missing"))?;
                let mut entry = Map::new();
                entry.insert(TEMPLATE_KEY.to_string(), template);
                entry.insert(RESOLVED_KEY.to_string(), Value::Object(Map::new()));
                slot.insert(label.to_string(), Value::Object(entry));
            }
            let entry = slot
                .get_mut(label)
                .ok_or_else(|| Self::failed(group, "corrupt cache entry"))?;

            let template = entry.get(TEMPLATE_KEY).cloned().unwrap_or(Value::Null);
            let resolved = entry
                .get_mut(RESOLVED_KEY)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| Self::failed(group, "corrupt cache entry"))?;

            let mut expressions = Vec::new();
            collect_expressions(&template, &mut expressions);
            for expression in expressions {
                if resolved.contains_key(expression) {
                    continue;
                }
                if let Some(value) = lookup(&destinations, expression) {
                    resolved.insert(expression.to_string(), value);
                }
            }

            render_value(&template, resolved)
        };

        origin.set_attribute(label, rendered);
        Ok(())
    }

    fn finalize(&self, graph: &LocalGraph) -> Result<usize, StrategyError> {
        let rewrites: usize = graph
            .vertices()
            .map(|vertex| {
                vertex.rewrite_attributes(|key, value| {
                    if NO_EVAL_ATTRIBUTES.contains(&key) {
                        None
                    } else {
                        replace_references(value, &self.placeholder)
                    }
                })
            })
            .sum();
        Ok(rewrites)
    }
}

/// Value of `expression` if it names one of `destinations`. Values that
/// still hold references of their own are not concrete yet.
fn lookup(destinations: &[&Vertex], expression: &str) -> Option<Value> {
    destinations.iter().find_map(|vertex| {
        let attribute = if expression == vertex.name() {
            VALUE_ATTRIBUTE
        } else {
            expression
                .strip_prefix(vertex.name())
                .and_then(|rest| rest.strip_prefix('.'))?
        };
        vertex
            .attribute(attribute)
            .filter(|value| !has_reference(value))
    })
}

struct Reference<'a> {
    span: Range<usize>,
    expression: &'a str,
}

fn references(text: &str) -> Vec<Reference<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find("${") {
        let start = cursor + offset;
        let Some(len) = text[start + 2..].find('}') else {
            break;
        };
        let end = start + 2 + len;
        found.push(Reference {
            span: start..end + 1,
            expression: text[start + 2..end].trim(),
        });
        cursor = end + 1;
    }
    found
}

fn collect_expressions<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(text) => out.extend(references(text).into_iter().map(|r| r.expression)),
        Value::Array(items) => items.iter().for_each(|item| collect_expressions(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_expressions(item, out)),
        _ => {}
    }
}

fn has_reference(value: &Value) -> bool {
    match value {
        Value::String(text) => !references(text).is_empty(),
        Value::Array(items) => items.iter().any(has_reference),
        Value::Object(map) => map.values().any(has_reference),
        _ => false,
    }
}

/// `value` with every string that still holds a reference swapped for
/// `placeholder`. Concrete leaves keep their values. `None` if nothing
/// needed replacing.
fn replace_references(value: &Value, placeholder: &Value) -> Option<Value> {
    if !has_reference(value) {
        return None;
    }
    let replace = |item: &Value| replace_references(item, placeholder).unwrap_or_else(|| item.clone());
    Some(match value {
        Value::Array(items) => Value::Array(items.iter().map(replace).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), replace(item)))
                .collect(),
        ),
        _ => placeholder.clone(),
    })
}

fn render_value(value: &Value, resolved: &Map<String, Value>) -> Value {
    match value {
        Value::String(text) => render_string(text, resolved),
        Value::Array(items) => Value::Array(items.iter().map(|item| render_value(item, resolved)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), render_value(item, resolved)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn render_string(text: &str, resolved: &Map<String, Value>) -> Value {
    let refs = references(text);

    if let [only] = refs.as_slice() {
        if only.span == (0..text.len()) {
            if let Some(value) = resolved.get(only.expression) {
                return value.clone();
            }
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for reference in refs {
        out.push_str(&text[last..reference.span.start]);
        match resolved.get(reference.expression) {
            Some(Value::String(s)) => out.push_str(s),
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(&text[reference.span.clone()]),
        }
        last = reference.span.end;
    }
    out.push_str(&text[last..]);
    Value::String(out)
}
