use serde::Serialize;
use serde_json::Value;

use crate::config::PresentationConfig;
use crate::graph::{EquivalentIds, KnowledgeGraph, Node};
use crate::paths::strip_namespace;

/// Node/edge collection in the shape a vis.js network expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisPayload {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisNode {
    pub id: String,
    /// `<kind without namespace>:<key>`, or the bare key for untyped nodes.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub level: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Resolved ids as `kind:value` lines joined with `<br>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equivalent_ids: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisFont {
    pub align: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub key: usize,
    pub arrows: &'static str,
    pub font: VisFont,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

fn flatten_ids(ids: &EquivalentIds) -> String {
    ids.iter()
        .flat_map(|(kind, value)| {
            value
                .values()
                .into_iter()
                .map(move |v| format!("{}:{}", kind, v))
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

fn vis_node(node: &Node, config: &PresentationConfig) -> VisNode {
    let label = match &node.identifier_kind {
        Some(kind) => format!("{}:{}", strip_namespace(kind), node.key),
        None => node.key.clone(),
    };
    let color = config.color_for(node.level).map(str::to_string);
    if color.is_none() {
        log::debug!("No color configured for level {}", node.level);
    }
    VisNode {
        id: node.key.clone(),
        label,
        color,
        level: node.level,
        entity_type: node.type_label(),
        identifier: node.identifier_kind.clone(),
        equivalent_ids: node.equivalent_ids.as_ref().map(flatten_ids),
    }
}

/// Build the visualization payload for `graph`.
pub fn to_visjs(graph: &KnowledgeGraph, config: &PresentationConfig) -> VisPayload {
    let nodes = graph.nodes().map(|n| vis_node(n, config)).collect();
    let edges = graph
        .edges()
        .map(|e| VisEdge {
            from: e.source.to_string(),
            to: e.target.to_string(),
            label: e.edge.label.clone(),
            key: e.edge.key,
            arrows: "to",
            font: VisFont { align: "middle" },
            source: e.edge.data_source.clone(),
            info: e.edge.info.clone(),
        })
        .collect();
    VisPayload { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{IdValue, LEVEL_OUTPUT};
    use serde_json::json;

    fn graph() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_seed("CXCR4", Some("bts:symbol"), Some("Gene".into()));
        g.upsert("7852", Some("bts:entrez".into()), Some("Gene".into()), LEVEL_OUTPUT);
        let mut ids = EquivalentIds::new();
        ids.insert("bts:entrez".into(), IdValue::One("7852".into()));
        ids.insert("bts:umls".into(), IdValue::Many(vec!["C1".into(), "C2".into()]));
        g.set_equivalent_ids("7852", ids);
        g.add_edge("CXCR4", "7852", "bts:related_to", Some(json!({"$source": "biogrid"})));
        g
    }

    #[test]
    fn test_nodes_labelled_and_colored() {
        let payload = to_visjs(&graph(), &PresentationConfig::default());
        let seed = payload.nodes.iter().find(|n| n.id == "CXCR4").unwrap();
        assert_eq!(seed.label, "symbol:CXCR4");
        assert_eq!(seed.color.as_deref(), Some("green"));
        let out = payload.nodes.iter().find(|n| n.id == "7852").unwrap();
        assert_eq!(out.color.as_deref(), Some("red"));
        assert_eq!(
            out.equivalent_ids.as_deref(),
            Some("bts:entrez:7852<br>bts:umls:C1<br>bts:umls:C2")
        );
        assert!(seed.equivalent_ids.is_none());
    }

    #[test]
    fn test_edges_use_from_to() {
        let payload = to_visjs(&graph(), &PresentationConfig::default());
        let value = serde_json::to_value(&payload).unwrap();
        let edge = &value["edges"][0];
        assert_eq!(edge["from"], "CXCR4");
        assert_eq!(edge["to"], "7852");
        assert_eq!(edge["arrows"], "to");
        assert_eq!(edge["font"]["align"], "middle");
        assert_eq!(edge["source"], "biogrid");
        assert!(edge.get("target").is_none());
    }

    #[test]
    fn test_untyped_node_and_unknown_level() {
        let mut g = KnowledgeGraph::new();
        g.upsert("x", None, None, 7);
        let payload = to_visjs(&g, &PresentationConfig::default());
        assert_eq!(payload.nodes[0].label, "x");
        assert!(payload.nodes[0].color.is_none());
        assert!(payload.edges.is_empty());
    }
}
