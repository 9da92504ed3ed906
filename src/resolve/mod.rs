//! Identifier resolution: attach equivalent-ID sets to output nodes.
//!
//! Level-2 nodes are grouped by `(entity_type, identifier_kind)` and each group is sent
//! to the external resolver as one batch. Groups are resolved concurrently and the
//! answers are written back to the graph only after every call has returned.

mod cache;
mod http;

pub use cache::CachingResolver;
pub use http::HttpResolver;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{BiographError, Result};
use crate::graph::{EquivalentIds, KnowledgeGraph, LEVEL_OUTPUT};

/// One batched conversion request: every node key shares a type and identifier kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub node_keys: Vec<String>,
    pub identifier_kind: String,
    pub entity_type: String,
}

/// Node key -> resolved equivalent identifiers.
pub type ResolvedMap = HashMap<String, EquivalentIds>;

/// External identifier conversion capability.
#[async_trait]
pub trait IdResolver: Send + Sync {
    /// Resolve every requested key it recognizes. Unknown keys are simply absent.
    async fn convert(&self, requests: Vec<ResolveRequest>) -> Result<ResolvedMap>;
}

/// Result of a resolution pass: what was attached, and which groups failed.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub resolved: ResolvedMap,
    pub failures: Vec<BiographError>,
}

impl ResolveOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The resolved map, or the first group failure.
    pub fn into_result(self) -> Result<ResolvedMap> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.resolved),
        }
    }
}

/// Partition level-2 node keys by `(entity_type, identifier_kind)`.
///
/// Nodes lacking either attribute cannot be placed in a group and are left out.
pub fn group_output_nodes(graph: &KnowledgeGraph) -> BTreeMap<(String, String), Vec<String>> {
    let mut groups: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for node in graph.nodes().filter(|n| n.level == LEVEL_OUTPUT) {
        match (&node.entity_type, &node.identifier_kind) {
            (Some(entity_type), Some(kind)) => groups
                .entry((entity_type.to_string(), kind.clone()))
                .or_default()
                .push(node.key.clone()),
            _ => log::debug!("Node {} has no type or identifier kind, not resolvable", node.key),
        }
    }
    groups
}

/// Resolve all output nodes of `graph` and attach the answers in place.
///
/// An empty graph, or one without output nodes, is returned untouched with an empty map.
/// A failing group is reported in [`ResolveOutcome::failures`]; the other groups are
/// still applied.
pub async fn resolve<R>(graph: &mut KnowledgeGraph, resolver: &R) -> ResolveOutcome
where
    R: IdResolver + ?Sized,
{
    let groups = group_output_nodes(graph);
    if groups.is_empty() {
        return ResolveOutcome::default();
    }

    let requests: Vec<ResolveRequest> = groups
        .into_iter()
        .map(|((entity_type, identifier_kind), node_keys)| ResolveRequest {
            node_keys,
            identifier_kind,
            entity_type,
        })
        .collect();
    log::info!("Resolving {} identifier groups", requests.len());

    // fan-out
    let answers = join_all(requests.into_iter().map(|request| async move {
        let answer = resolver.convert(vec![request.clone()]).await;
        (request, answer)
    }))
    .await;

    // fan-in
    let mut outcome = ResolveOutcome::default();
    for (request, answer) in answers {
        match answer {
            Ok(map) => {
                for (key, ids) in map {
                    if let Some(node_key) = attach(graph, &key, ids.clone()) {
                        outcome.resolved.insert(node_key, ids);
                    }
                }
            }
            Err(err) => {
                log::warn!(
                    "Resolver failed for {}/{} ({} nodes): {}",
                    request.entity_type,
                    request.identifier_kind,
                    request.node_keys.len(),
                    err
                );
                outcome.failures.push(BiographError::ResolverUnavailable {
                    entity_type: request.entity_type,
                    identifier_kind: request.identifier_kind,
                    reason: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "Resolved {} nodes, {} groups failed",
        outcome.resolved.len(),
        outcome.failures.len()
    );
    outcome
}

/// Store `ids` on the node named by `key`, or by `key` without its `kind:` prefix.
fn attach(graph: &mut KnowledgeGraph, key: &str, ids: EquivalentIds) -> Option<String> {
    let candidates = std::iter::once(key).chain(key.split_once(':').map(|(_, rest)| rest));
    for candidate in candidates {
        if graph.contains_node(candidate) {
            return graph
                .set_equivalent_ids(candidate, ids)
                .then(|| candidate.to_string());
        }
    }
    log::warn!("Resolver returned unknown node key {}", key);
    None
}

/// In-memory resolver backed by a fixed table, keyed by node key.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, EquivalentIds>,
}

impl StaticResolver {
    pub fn new(table: HashMap<String, EquivalentIds>) -> Self {
        Self { table }
    }

    /// Load a `{ "node key": { "kind": id-or-ids } }` JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = serde_json::from_str(&content)?;
        Ok(Self { table })
    }
}

#[async_trait]
impl IdResolver for StaticResolver {
    async fn convert(&self, requests: Vec<ResolveRequest>) -> Result<ResolvedMap> {
        Ok(requests
            .iter()
            .flat_map(|r| r.node_keys.iter())
            .filter_map(|key| self.table.get(key).map(|ids| (key.clone(), ids.clone())))
            .collect())
    }
}
