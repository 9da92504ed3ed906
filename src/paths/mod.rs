//! Path extraction: flatten graph traversals into fixed-schema rows.
//!
//! Two input shapes are supported. Node paths (`tabulate_node_paths`) are key sequences
//! looked up against a graph, with every combination of parallel edges expanded into its
//! own row. Edge paths (`tabulate_edge_paths`) arrive already expanded and carry their
//! own labels and payloads.

mod edge_paths;
pub mod provenance;
mod record;

pub use edge_paths::{tabulate_edge_paths, EdgeInfo, EdgeRecord, NodeRef};
pub use provenance::{extract, ProvenanceField};
pub use record::{columns_for, HopColumns, NodeColumns, PathRecord, PathTable, RowFilter};

use serde_json::Value;

use crate::config::TabularConfig;
use crate::error::{BiographError, Result};
use crate::graph::{Edge, KnowledgeGraph, Node};

/// Drop a `namespace:` prefix (`bts:related_to` -> `related_to`).
pub fn strip_namespace(label: &str) -> &str {
    label.split_once(':').map(|(_, rest)| rest).unwrap_or(label)
}

/// Preferred identifier for a node, as `kind:value` with the kind's namespace removed.
///
/// Kinds are tried in the order configured for the node's entity type; a node with no
/// match (or no resolved ids) falls back to its raw key.
pub fn primary_id(node: &Node, config: &TabularConfig) -> String {
    let (Some(ids), Some(entity_type)) = (&node.equivalent_ids, &node.entity_type) else {
        return node.key.clone();
    };
    entity_type
        .names()
        .into_iter()
        .filter_map(|name| config.id_rank.get(name))
        .flatten()
        .find_map(|kind| {
            ids.get(kind)
                .and_then(|v| v.first())
                .map(|value| format!("{}:{}", strip_namespace(kind), value))
        })
        .unwrap_or_else(|| node.key.clone())
}

/// Display name from the configured name kinds; `None` if none is resolved.
pub fn display_name(node: &Node, config: &TabularConfig) -> Option<String> {
    let ids = node.equivalent_ids.as_ref()?;
    config
        .name_kinds
        .iter()
        .find_map(|kind| ids.get(kind).and_then(|v| v.first()))
        .map(str::to_string)
}

fn node_columns(node: &Node, config: &TabularConfig) -> NodeColumns {
    NodeColumns {
        id: Some(primary_id(node, config)),
        name: display_name(node, config),
        entity_type: node.type_label(),
    }
}

pub(crate) fn hop_columns(label: &str, info: Option<&Value>) -> HopColumns {
    HopColumns {
        predicate: Some(strip_namespace(label).to_string()),
        source: extract(info, ProvenanceField::Source),
        api: extract(info, ProvenanceField::Api),
        pubmed: extract(info, ProvenanceField::Pubmed),
    }
}

/// Every combination of one edge per hop, in hop order.
fn expand_edges<'g>(hops: &[&'g [Edge]]) -> Vec<Vec<&'g Edge>> {
    hops.iter().copied().fold(vec![Vec::new()], |combos, choices: &'g [Edge]| {
        combos
            .iter()
            .flat_map(|prefix| {
                choices.iter().map(move |edge| {
                    let mut combo = prefix.clone();
                    combo.push(edge);
                    combo
                })
            })
            .collect()
    })
}

/// Tabulate node-key paths against `graph`.
///
/// Each path must have at least two keys, every key must be a node, and every
/// consecutive pair must be joined by at least one edge; anything else is a
/// [`BiographError::Topology`] error rather than a silently dropped row.
pub fn tabulate_node_paths(
    graph: &KnowledgeGraph,
    paths: &[Vec<String>],
    config: &TabularConfig,
    filter: &RowFilter,
) -> Result<PathTable> {
    let mut rows = Vec::new();

    for path in paths {
        if path.len() < 2 {
            return Err(BiographError::InvalidInput(format!(
                "path needs at least two nodes: {:?}",
                path
            )));
        }

        let nodes = path
            .iter()
            .map(|key| {
                graph.node(key).ok_or_else(|| {
                    BiographError::Topology(format!("node {} is not in the graph", key))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let hops = path
            .windows(2)
            .map(|pair| {
                let edges = graph.edges_between(&pair[0], &pair[1]);
                if edges.is_empty() {
                    Err(BiographError::Topology(format!(
                        "no edge {} -> {}",
                        pair[0], pair[1]
                    )))
                } else {
                    Ok(edges)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let input = nodes[0];
        let intermediates: Vec<NodeColumns> = nodes[1..nodes.len() - 1]
            .iter()
            .map(|n| node_columns(n, config))
            .collect();
        let output = node_columns(nodes[nodes.len() - 1], config);

        for combo in expand_edges(&hops) {
            rows.push(PathRecord {
                input: input.key.clone(),
                input_type: input.type_label(),
                hops: combo
                    .iter()
                    .map(|edge| hop_columns(&edge.label, edge.info.as_ref()))
                    .collect(),
                intermediates: intermediates.clone(),
                output: output.clone(),
            });
        }
    }

    let table = PathTable::new(rows).filter(filter);
    log::info!("Tabulated {} paths into {} rows", paths.len(), table.len());
    Ok(table)
}
