use async_trait::async_trait;
use biograph::graph::{EquivalentIds, IdValue};
use biograph::input::{discover_response_files, normalize_files, ResponseFile};
use biograph::paths::EdgeRecord;
use biograph::present;
use biograph::resolve::{group_output_nodes, ResolveRequest, ResolvedMap, StaticResolver};
use biograph::{
    merge_all, resolve, tabulate_edge_paths, tabulate_node_paths, BiographError, Config,
    IdResolver, KnowledgeGraph, RowFilter,
};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

const ROUND_ONE: &str = r#"{
    "CXCR4": {
        "@type": "Gene",
        "bts:related_to": [
            {"@type": "Gene", "$source": "biogrid", "$api": "biolink", "bts:entrez": ["7852"]}
        ]
    },
    "NOTHING": null
}"#;

const ROUND_TWO: &str = r#"{
    "7852": {
        "@type": "Gene",
        "bts:related_to": [
            {"@type": "Disease", "$source": "disgenet", "bts:mondo": ["D1"], "bts:pubmed": [111]},
            {"@type": "Disease", "$source": "ctd", "bts:mondo": ["D1"]}
        ]
    }
}"#;

fn ids(pairs: &[(&str, &str)]) -> EquivalentIds {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), IdValue::One(v.to_string())))
        .collect()
}

fn id_table() -> HashMap<String, EquivalentIds> {
    let mut table = HashMap::new();
    table.insert(
        "7852".to_string(),
        ids(&[("bts:entrez", "7852"), ("bts:symbol", "CXCR4")]),
    );
    table.insert(
        "D1".to_string(),
        ids(&[("bts:mondo", "MONDO:0004979"), ("bts:name", "asthma")]),
    );
    table
}

fn write_rounds(dir: &TempDir) {
    fs::write(dir.path().join("round1.json"), ROUND_ONE).unwrap();
    fs::write(dir.path().join("round2.json"), ROUND_TWO).unwrap();
}

/// Two query rounds normalized into one graph, as the CLI does.
fn build_from(files: &[ResponseFile]) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    graph.add_seed("CXCR4", Some("bts:symbol"), Some("Gene".into()));
    normalize_files(files, &mut graph, &Config::default().graph).unwrap();
    graph
}

fn build(dir: &TempDir) -> KnowledgeGraph {
    write_rounds(dir);
    let files = discover_response_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    build_from(&files)
}

#[tokio::test]
async fn test_full_pipeline_to_csv() {
    let dir = TempDir::new().unwrap();
    let mut graph = build(&dir);

    // 7852 keeps the attributes it got as an output of round one
    let gene = graph.node("7852").unwrap();
    assert_eq!(gene.level, 2);
    assert_eq!(gene.identifier_kind.as_deref(), Some("bts:entrez"));
    assert_eq!(graph.edges_between("7852", "D1").len(), 2);

    let outcome = resolve(&mut graph, &StaticResolver::new(id_table())).await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.resolved.len(), 2);

    let config = Config::default();
    let table = tabulate_node_paths(
        &graph,
        &[vec!["CXCR4".into(), "7852".into(), "D1".into()]],
        &config.tabular,
        &RowFilter::default(),
    )
    .unwrap();
    assert_eq!(table.len(), 2);

    let row = &table.rows()[0];
    assert_eq!(row.input, "CXCR4");
    assert_eq!(row.predicate(1), Some("related_to"));
    assert_eq!(row.hops[0].source.as_deref(), Some("biogrid"));
    assert_eq!(row.hops[0].api.as_deref(), Some("biolink"));
    assert_eq!(row.intermediates[0].id.as_deref(), Some("entrez:7852"));
    assert_eq!(row.output.id.as_deref(), Some("mondo:MONDO:0004979"));
    assert_eq!(row.output.name.as_deref(), Some("asthma"));

    let sources: Vec<_> = table
        .rows()
        .iter()
        .filter_map(|r| r.hops[1].source.clone())
        .collect();
    assert!(sources.contains(&"disgenet".to_string()));
    assert!(sources.contains(&"ctd".to_string()));

    let csv_path = dir.path().join("paths.csv");
    table.write_csv(fs::File::create(&csv_path).unwrap()).unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().next().unwrap().ends_with("output_id,output_name,output_type"));
}

struct FailingDiseases {
    inner: StaticResolver,
}

#[async_trait]
impl IdResolver for FailingDiseases {
    async fn convert(&self, requests: Vec<ResolveRequest>) -> biograph::Result<ResolvedMap> {
        if requests.iter().any(|r| r.entity_type == "Disease") {
            return Err(BiographError::Resolver("disease service down".into()));
        }
        self.inner.convert(requests).await
    }
}

#[tokio::test]
async fn test_partial_resolution_keeps_other_groups() {
    let dir = TempDir::new().unwrap();
    let mut graph = build(&dir);
    let resolver = FailingDiseases {
        inner: StaticResolver::new(id_table()),
    };

    let outcome = resolve(&mut graph, &resolver).await;
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        &outcome.failures[0],
        BiographError::ResolverUnavailable { entity_type, .. } if entity_type == "Disease"
    ));
    assert!(graph.node("7852").unwrap().equivalent_ids.is_some());
    assert!(graph.node("D1").unwrap().equivalent_ids.is_none());

    // Unresolved output falls back to its raw key
    let table = tabulate_node_paths(
        &graph,
        &[vec!["CXCR4".into(), "7852".into(), "D1".into()]],
        &Config::default().tabular,
        &RowFilter::default(),
    )
    .unwrap();
    assert_eq!(table.rows()[0].output.id.as_deref(), Some("D1"));
    assert!(table.rows()[0].output.name.is_none());
}

#[test]
fn test_presentation_of_merged_graph() {
    let dir = TempDir::new().unwrap();
    let graph = build(&dir);

    let edges = present::edge_table(&graph);
    assert_eq!(edges.len(), graph.edge_count());
    assert!(edges.rows.iter().any(|r| r.pubmed.as_deref() == Some("111")));

    let payload = present::to_visjs(&graph, &Config::default().presentation);
    assert_eq!(payload.nodes.len(), graph.node_count());
    assert_eq!(payload.edges.len(), graph.edge_count());

    let dot = present::to_dot(&graph);
    assert!(dot.contains("\"7852\" -> \"D1\""));
}

#[test]
fn test_edge_paths_from_json() {
    let records: Vec<Vec<EdgeRecord>> = serde_json::from_value(json!([[
        {
            "input": "bts:symbol-name:CXCR4",
            "output": "bts:entrez-7852",
            "info": {"label": "bts:related_to", "info": {"@type": "Gene", "$source": "biogrid"}}
        },
        {
            "input": "bts:entrez-7852",
            "output": "bts:name-name:asthma",
            "info": {"label": "bts:related_to", "info": {"@type": "Disease", "$api": ["a", "b"]}}
        }
    ]]))
    .unwrap();
    let doubled = vec![records[0].clone(), records[0].clone()];

    let table = tabulate_edge_paths(&doubled, Some("Gene")).unwrap();
    assert_eq!(table.len(), 1);
    let json = table.to_json_records();
    assert_eq!(json[0]["input"], "CXCR4");
    assert_eq!(json[0]["input_type"], "Gene");
    assert_eq!(json[0]["node1_id"], "7852");
    assert_eq!(json[0]["output_name"], "asthma");
    assert_eq!(json[0]["output_type"], "Disease");
    assert_eq!(json[0]["pred2_api"], "a,b");
}

#[test]
fn test_build_is_independent_of_file_order() {
    let dir = TempDir::new().unwrap();
    write_rounds(&dir);
    let files = discover_response_files(dir.path()).unwrap();
    let reversed: Vec<ResponseFile> = files.iter().rev().cloned().collect();

    let forward = build_from(&files);
    let backward = build_from(&reversed);
    assert_eq!(forward, backward);

    let gene = backward.node("7852").unwrap();
    assert_eq!(gene.level, 2);
    assert_eq!(gene.type_label().as_deref(), Some("Gene"));
    assert_eq!(group_output_nodes(&backward).len(), 2);
}

#[test]
fn test_merging_independent_graphs_keeps_parallel_provenance() {
    let dir = TempDir::new().unwrap();
    write_rounds(&dir);
    let graphs = discover_response_files(dir.path())
        .unwrap()
        .into_iter()
        .map(|file| build_from(std::slice::from_ref(&file)))
        .collect::<Vec<_>>();
    let merged = merge_all(graphs);
    assert_eq!(merged.edges_between("7852", "D1").len(), 2);
    assert_eq!(merged.edges_between("CXCR4", "7852").len(), 1);
}
