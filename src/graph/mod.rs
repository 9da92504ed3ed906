//! Knowledge graph module: typed directed multigraph, response normalization and merging.
//!
//! Nodes are keyed by their raw identifier string. Parallel edges between the same
//! ordered pair are allowed; an edge is identified by `(source, target, label, info digest)`
//! so that inserting the same edge twice is a no-op.

mod merge;
mod model;
mod normalize;

pub use merge::{merge, merge_all};
pub use model::{
    info_digest, Edge, EdgeRef, EntityType, EquivalentIds, IdValue, Node, LEVEL_INPUT,
    LEVEL_OUTPUT,
};
pub use normalize::{normalize, NormalizeStats};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Directed multigraph of biomedical entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    /// source -> target -> parallel edges
    adjacency: BTreeMap<String, BTreeMap<String, Vec<Edge>>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency
            .values()
            .flat_map(|targets| targets.values())
            .map(Vec::len)
            .sum()
    }

    pub fn contains_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Insert a level-1 seed node, replacing the structural attributes of an existing one.
    pub fn add_seed(
        &mut self,
        key: &str,
        identifier_kind: Option<&str>,
        entity_type: Option<EntityType>,
    ) {
        self.upsert(key, identifier_kind.map(str::to_string), entity_type, LEVEL_INPUT);
    }

    /// Create or update a node. Resolved `equivalent_ids` are kept across updates.
    pub fn upsert(
        &mut self,
        key: &str,
        identifier_kind: Option<String>,
        entity_type: Option<EntityType>,
        level: u32,
    ) {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.identifier_kind = identifier_kind;
                node.entity_type = entity_type;
                node.level = level;
            }
            None => {
                self.nodes.insert(
                    key.to_string(),
                    Node::new(key, identifier_kind, entity_type, level),
                );
            }
        }
    }

    /// Make sure `key` exists; a missing node is created as a bare level-1 node.
    pub fn ensure_node(&mut self, key: &str) {
        if !self.nodes.contains_key(key) {
            self.nodes
                .insert(key.to_string(), Node::new(key, None, None, LEVEL_INPUT));
        }
    }

    /// Insert a whole node record unless the key is already present.
    /// Returns true if the node was inserted.
    pub fn insert_node_if_absent(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.key) {
            return false;
        }
        self.nodes.insert(node.key.clone(), node);
        true
    }

    /// Attach resolved identifiers. Returns false if the node does not exist or
    /// `ids` is empty (an empty mapping is never stored).
    pub fn set_equivalent_ids(&mut self, key: &str, ids: EquivalentIds) -> bool {
        if ids.is_empty() {
            return false;
        }
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.equivalent_ids = Some(ids);
                true
            }
            None => false,
        }
    }

    /// Add a directed edge, creating missing endpoints as bare nodes.
    ///
    /// Returns the edge key and whether a new edge was stored. An edge with the
    /// same label and payload between the same pair is not duplicated.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        label: &str,
        info: Option<Value>,
    ) -> (usize, bool) {
        self.ensure_node(source);
        self.ensure_node(target);

        let digest = info_digest(info.as_ref());
        let parallel = self
            .adjacency
            .entry(source.to_string())
            .or_default()
            .entry(target.to_string())
            .or_default();

        if let Some(existing) = parallel.iter().find(|e| e.same_identity(label, &digest)) {
            return (existing.key, false);
        }

        let key = parallel.len();
        parallel.push(Edge::new(key, label, info));
        (key, true)
    }

    /// Re-insert an edge taken from another graph, keeping its identity.
    pub(crate) fn add_edge_record(&mut self, source: &str, target: &str, edge: &Edge) -> bool {
        self.add_edge(source, target, &edge.label, edge.info.clone()).1
    }

    /// Parallel edges from `source` to `target` (empty if none).
    pub fn edges_between(&self, source: &str, target: &str) -> &[Edge] {
        self.adjacency
            .get(source)
            .and_then(|targets| targets.get(target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All edges in (source, target, key) order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> {
        self.adjacency.iter().flat_map(|(source, targets)| {
            targets.iter().flat_map(move |(target, edges)| {
                edges.iter().map(move |edge| EdgeRef {
                    source: source.as_str(),
                    target: target.as_str(),
                    edge,
                })
            })
        })
    }
}
