//! Union of independently built graphs.

use super::KnowledgeGraph;

/// Merge `incoming` into `base`.
///
/// Nodes already in `base` keep their attributes; new nodes are copied with theirs.
/// Every incoming edge is added; only an edge with identical endpoints, label and
/// payload collapses onto an existing one.
pub fn merge<'a>(
    base: &'a mut KnowledgeGraph,
    incoming: &KnowledgeGraph,
) -> &'a mut KnowledgeGraph {
    let mut nodes_added = 0;
    for node in incoming.nodes() {
        if base.insert_node_if_absent(node.clone()) {
            nodes_added += 1;
        }
    }

    let mut edges_added = 0;
    for edge in incoming.edges() {
        if base.add_edge_record(edge.source, edge.target, edge.edge) {
            edges_added += 1;
        }
    }

    log::debug!("Merged graph: +{} nodes, +{} edges", nodes_added, edges_added);
    base
}

/// Fold any number of graphs into one by repeated pairwise merge.
pub fn merge_all<I>(graphs: I) -> KnowledgeGraph
where
    I: IntoIterator<Item = KnowledgeGraph>,
{
    let mut iter = graphs.into_iter();
    let mut base = iter.next().unwrap_or_default();
    for graph in iter {
        merge(&mut base, &graph);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityType, IdValue, LEVEL_OUTPUT};
    use serde_json::json;

    fn graph_ab() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_seed("A", Some("bts:symbol"), Some("Gene".into()));
        g.upsert("B", Some("bts:mondo".into()), Some("Disease".into()), LEVEL_OUTPUT);
        g.set_equivalent_ids(
            "B",
            [("bts:mondo".to_string(), IdValue::One("B".into()))].into_iter().collect(),
        );
        g.add_edge("A", "B", "bts:related_to", Some(json!({"$source": "S1"})));
        g
    }

    fn graph_bc() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_seed("B", Some("bts:doid"), Some("Phenotype".into()));
        g.upsert("C", Some("bts:chembl".into()), Some("ChemicalSubstance".into()), LEVEL_OUTPUT);
        g.add_edge("B", "C", "bts:treats", Some(json!({"$source": "S2"})));
        g
    }

    #[test]
    fn test_merge_scenario_keeps_base_attributes() {
        let mut base = graph_ab();
        merge(&mut base, &graph_bc());
        let keys: Vec<_> = base.nodes().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        let b = base.node("B").unwrap();
        assert_eq!(b.entity_type, Some(EntityType::from("Disease")));
        assert_eq!(b.level, LEVEL_OUTPUT);
        assert!(b.equivalent_ids.is_some());
        assert_eq!(base.edge_count(), 2);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let mut g = graph_ab();
        let before = g.clone();
        merge(&mut g, &KnowledgeGraph::new());
        assert_eq!(g, before);
    }

    #[test]
    fn test_merge_is_associative_on_node_and_edge_sets() {
        let mut g3 = KnowledgeGraph::new();
        g3.add_edge("C", "D", "bts:affects", None);
        g3.add_edge("A", "B", "bts:related_to", Some(json!({"$source": "S1"})));

        let mut left = graph_ab();
        merge(&mut left, &graph_bc());
        merge(&mut left, &g3);

        let mut right_tail = graph_bc();
        merge(&mut right_tail, &g3);
        let mut right = graph_ab();
        merge(&mut right, &right_tail);

        let node_keys = |g: &KnowledgeGraph| g.nodes().map(|n| n.key.clone()).collect::<Vec<_>>();
        let edge_ids = |g: &KnowledgeGraph| {
            g.edges()
                .map(|e| {
                    (
                        e.source.to_string(),
                        e.target.to_string(),
                        e.edge.label.clone(),
                        e.edge.digest.clone(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(node_keys(&left), node_keys(&right));
        assert_eq!(edge_ids(&left), edge_ids(&right));
        assert_eq!(left.edge_count(), 3);
    }

    #[test]
    fn test_merge_keeps_parallel_edges_with_distinct_provenance() {
        let mut a = KnowledgeGraph::new();
        a.add_edge("X", "Y", "bts:related_to", Some(json!({"$source": "S1"})));
        let mut b = KnowledgeGraph::new();
        b.add_edge("X", "Y", "bts:related_to", Some(json!({"$source": "S2"})));
        merge(&mut a, &b);
        assert_eq!(a.edges_between("X", "Y").len(), 2);
    }

    #[test]
    fn test_merge_all_folds() {
        let merged = merge_all(vec![graph_ab(), graph_bc(), KnowledgeGraph::new()]);
        assert_eq!(merged.node_count(), 3);
        assert!(merge_all(Vec::new()).is_empty());
    }
}
