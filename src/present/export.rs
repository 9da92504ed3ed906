//! Flat exports of the graph: an edge list for dataframes and a Graphviz digraph.

use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::graph::KnowledgeGraph;
use crate::paths::{extract, ProvenanceField};

/// One graph edge with its endpoint types and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRow {
    pub n1: String,
    pub n1_type: Option<String>,
    pub n2: String,
    pub n2_type: Option<String>,
    pub predicate: String,
    pub datasource: Option<String>,
    pub api: Option<String>,
    pub pubmed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeTable {
    pub rows: Vec<EdgeRow>,
}

impl EdgeTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write rows as CSV; the header comes from the field names.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Edge list of `graph`. Graphs with fewer than two nodes yield an empty table.
pub fn edge_table(graph: &KnowledgeGraph) -> EdgeTable {
    if graph.node_count() < 2 {
        return EdgeTable::default();
    }
    let type_of = |key: &str| graph.node(key).and_then(|n| n.type_label());
    let rows = graph
        .edges()
        .map(|e| {
            let info = e.edge.info.as_ref();
            EdgeRow {
                n1: e.source.to_string(),
                n1_type: type_of(e.source),
                n2: e.target.to_string(),
                n2_type: type_of(e.target),
                predicate: e.edge.label.clone(),
                datasource: e.edge.data_source.clone(),
                api: extract(info, ProvenanceField::Api),
                pubmed: extract(info, ProvenanceField::Pubmed),
            }
        })
        .collect();
    EdgeTable { rows }
}

fn dot_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render `graph` as a Graphviz digraph with one labelled edge per graph edge.
pub fn to_dot(graph: &KnowledgeGraph) -> String {
    let mut out = String::from("digraph {\n");
    for e in graph.edges() {
        let _ = writeln!(
            out,
            "\t{} -> {} [label={}]",
            dot_quote(e.source),
            dot_quote(e.target),
            dot_quote(&e.edge.label)
        );
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LEVEL_OUTPUT;
    use serde_json::json;

    fn graph() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_seed("CXCR4", Some("bts:symbol"), Some("Gene".into()));
        g.upsert("D1", Some("bts:mondo".into()), Some("Disease".into()), LEVEL_OUTPUT);
        g.add_edge(
            "CXCR4",
            "D1",
            "bts:related_to",
            Some(json!({"$source": "S1", "$api": ["a1", "a2"], "bts:pubmed": [7]})),
        );
        g.add_edge("CXCR4", "D1", "bts:treats", None);
        g
    }

    #[test]
    fn test_edge_rows() {
        let table = edge_table(&graph());
        assert_eq!(table.len(), 2);
        let row = &table.rows[0];
        assert_eq!(row.n1, "CXCR4");
        assert_eq!(row.n1_type.as_deref(), Some("Gene"));
        assert_eq!(row.n2_type.as_deref(), Some("Disease"));
        assert_eq!(row.datasource.as_deref(), Some("S1"));
        assert_eq!(row.api.as_deref(), Some("a1,a2"));
        assert_eq!(row.pubmed.as_deref(), Some("7"));
        assert!(table.rows[1].api.is_none());
    }

    #[test]
    fn test_single_node_graph_is_empty() {
        let mut g = KnowledgeGraph::new();
        g.add_seed("CXCR4", None, None);
        assert!(edge_table(&g).is_empty());
        assert!(edge_table(&KnowledgeGraph::new()).is_empty());
    }

    #[test]
    fn test_edge_csv_header() {
        let mut out = Vec::new();
        edge_table(&graph()).write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("n1,n1_type,n2,n2_type,predicate,datasource,api,pubmed\n"));
        assert!(text.contains("CXCR4,Gene,D1,Disease,bts:related_to,S1,\"a1,a2\",7"));
    }

    #[test]
    fn test_dot_output() {
        let dot = to_dot(&graph());
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"CXCR4\" -> \"D1\" [label=\"bts:related_to\"]"));
        assert_eq!(dot.matches("->").count(), 2);
    }
}
