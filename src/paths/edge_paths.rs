//! Tabulation of paths that arrive already expanded to edge level.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{hop_columns, NodeColumns, PathRecord, PathTable};
use crate::error::{BiographError, Result};
use crate::response::{entity_type_of, TYPE_KEY};

const NAME_MARKER: &str = "name:";

/// One edge of a pre-expanded path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Node reference of the edge's start, e.g. `bts:symbol-name:CXCR4`.
    pub input: String,
    pub output: String,
    /// Type of the input node; overrides the type given for the whole table.
    #[serde(default)]
    pub input_type: Option<String>,
    pub info: EdgeInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub label: String,
    /// Payload of the hop: `@type` of the output plus provenance fields.
    #[serde(default)]
    pub info: Option<Value>,
}

/// A node reference split into its identifier and display name.
///
/// References look like `<kind>-<value>`; a value written as `name:<text>` is a
/// name-keyed node whose display name is `<text>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Last `-` separated segment, marker included.
    pub id: String,
    /// `id` with the name marker removed.
    pub name: String,
    pub is_name: bool,
}

impl NodeRef {
    pub fn parse(raw: &str) -> Self {
        let id = raw.rsplit('-').next().unwrap_or(raw);
        match id.strip_prefix(NAME_MARKER) {
            Some(name) => Self {
                id: id.to_string(),
                name: name.to_string(),
                is_name: true,
            },
            None => Self {
                id: id.to_string(),
                name: id.to_string(),
                is_name: false,
            },
        }
    }
}

fn edge_path_record(path: &[EdgeRecord], input_type: Option<&str>) -> Result<PathRecord> {
    let first = path
        .first()
        .ok_or_else(|| BiographError::InvalidInput("empty edge path".to_string()))?;

    let mut hops = Vec::with_capacity(path.len());
    let mut nodes = Vec::with_capacity(path.len());
    for edge in path {
        let payload = edge.info.info.as_ref();
        hops.push(hop_columns(&edge.info.label, payload));
        let target = NodeRef::parse(&edge.output);
        nodes.push(NodeColumns {
            id: Some(target.id),
            name: Some(target.name),
            entity_type: entity_type_of(payload.and_then(|p| p.get(TYPE_KEY)))
                .map(|t| t.to_string()),
        });
    }
    let output = nodes.pop().unwrap_or_default();

    Ok(PathRecord {
        input: NodeRef::parse(&first.input).name,
        input_type: first
            .input_type
            .clone()
            .or_else(|| input_type.map(str::to_string)),
        hops,
        intermediates: nodes,
        output,
    })
}

/// Flatten edge-level paths into rows; identical rows are reported once.
///
/// `input_type` is the entity type of the paths' inputs, usually the first type of
/// the query path that produced them. A record's own `input_type` takes precedence.
pub fn tabulate_edge_paths(
    paths: &[Vec<EdgeRecord>],
    input_type: Option<&str>,
) -> Result<PathTable> {
    let rows = paths
        .iter()
        .map(|p| edge_path_record(p, input_type))
        .collect::<Result<Vec<_>>>()?;
    let table = PathTable::new(rows).dedup();
    log::info!("Tabulated {} edge paths into {} rows", paths.len(), table.len());
    Ok(table)
}
