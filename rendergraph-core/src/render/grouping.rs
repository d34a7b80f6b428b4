//! Edge Grouping
//!
//! All references made from one attribute of one vertex are evaluated
//! together, so the pending edges of an iteration are partitioned by
//! `(origin, label)`.

use indexmap::{Equivalent, IndexMap};

use crate::graph::{Edge, EdgeGroup, VertexId};

/// Bucket key: the exact `(origin, label)` pair.
type GroupKey = (VertexId, String);

/// Borrowed form of [`GroupKey`]. Hashes the same fields in the same order,
/// so lookups don't need an owned label.
#[derive(Hash)]
struct GroupKeyRef<'a> {
    origin: VertexId,
    label: &'a str,
}

impl Equivalent<GroupKey> for GroupKeyRef<'_> {
    fn equivalent(&self, key: &GroupKey) -> bool {
        self.origin == key.0 && self.label == key.1
    }
}

/// Partition `edges` into groups sharing the same origin and label.
///
/// Groups come out in the order their first edge appears in the input, and
/// edges keep their input order inside each group. Buckets are keyed by the
/// exact `(origin, label)` pair, so distinct keys never merge.
pub fn group_edges<I>(edges: I) -> Vec<EdgeGroup>
where
    I: IntoIterator<Item = Edge>,
{
    let mut groups: IndexMap<GroupKey, EdgeGroup> = IndexMap::new();

    for edge in edges {
        let lookup = GroupKeyRef {
            origin: edge.origin,
            label: &edge.label,
        };
        if let Some(group) = groups.get_mut(&lookup) {
            group.push(edge);
        } else {
            groups.insert((edge.origin, edge.label.clone()), EdgeGroup::new(edge));
        }
    }

    groups.into_values().collect()
}
