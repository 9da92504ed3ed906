//! Typed node and edge records stored in a [`KnowledgeGraph`](super::KnowledgeGraph).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Seed/input layer.
pub const LEVEL_INPUT: u32 = 1;
/// Discovered/output layer.
pub const LEVEL_OUTPUT: u32 = 2;

/// Biomedical entity class of a node: usually one name, sometimes several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityType {
    One(String),
    Many(Vec<String>),
}

impl EntityType {
    /// First (or only) type name.
    pub fn primary(&self) -> Option<&str> {
        match self {
            EntityType::One(t) => Some(t.as_str()),
            EntityType::Many(ts) => ts.first().map(String::as_str),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            EntityType::One(t) => vec![t.as_str()],
            EntityType::Many(ts) => ts.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::One(t) => write!(f, "{}", t),
            EntityType::Many(ts) => write!(f, "{}", ts.join(",")),
        }
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        EntityType::One(value.to_string())
    }
}

/// A resolved identifier value: a single id or an ordered list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    One(String),
    Many(Vec<String>),
}

impl IdValue {
    pub fn first(&self) -> Option<&str> {
        match self {
            IdValue::One(v) => Some(v.as_str()),
            IdValue::Many(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            IdValue::One(v) => vec![v.as_str()],
            IdValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Identifier kind -> equivalent identifier(s) for one real-world entity.
pub type EquivalentIds = BTreeMap<String, IdValue>;

/// Node attributes. The node key is stored alongside for convenience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    /// Schema property the raw value came from (e.g. `bts:entrez`).
    #[serde(default)]
    pub identifier_kind: Option<String>,
    /// `None` when the response omitted `@type`; downstream code must tolerate it.
    #[serde(default)]
    pub entity_type: Option<EntityType>,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalent_ids: Option<EquivalentIds>,
}

impl Node {
    pub fn new(
        key: impl Into<String>,
        identifier_kind: Option<String>,
        entity_type: Option<EntityType>,
        level: u32,
    ) -> Self {
        Self {
            key: key.into(),
            identifier_kind,
            entity_type,
            level,
            equivalent_ids: None,
        }
    }

    /// Entity type rendered for tables; `None` when unknown.
    pub fn type_label(&self) -> Option<String> {
        self.entity_type.as_ref().map(|t| t.to_string())
    }
}

/// One directed edge between an ordered node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Position among the parallel edges of its node pair.
    pub key: usize,
    /// Predicate: the schema property that produced the edge.
    pub label: String,
    /// Full structured payload that produced the target node, if any.
    #[serde(default)]
    pub info: Option<Value>,
    /// Copy of `info.$source`.
    #[serde(default)]
    pub data_source: Option<String>,
    /// SHA-256 of the canonical `info` JSON; part of the edge identity.
    pub digest: String,
}

impl Edge {
    pub(crate) fn new(key: usize, label: &str, info: Option<Value>) -> Self {
        let data_source = info
            .as_ref()
            .and_then(|i| i.get("$source"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let digest = info_digest(info.as_ref());
        Self {
            key,
            label: label.to_string(),
            info,
            data_source,
            digest,
        }
    }

    /// Whether this edge has the same identity (label + payload) as `other`.
    pub fn same_identity(&self, label: &str, digest: &str) -> bool {
        self.label == label && self.digest == digest
    }
}

/// Content hash of an edge payload. `serde_json::Map` is key-sorted, so equal
/// payloads always serialize identically.
pub fn info_digest(info: Option<&Value>) -> String {
    let canonical = match info {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    };
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Borrowed view of an edge together with its endpoints.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub edge: &'a Edge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_display_and_primary() {
        let one = EntityType::from("Gene");
        assert_eq!(one.to_string(), "Gene");
        let many = EntityType::Many(vec!["Gene".into(), "Protein".into()]);
        assert_eq!(many.to_string(), "Gene,Protein");
        assert_eq!(many.primary(), Some("Gene"));
    }

    #[test]
    fn test_id_value_untagged_serde() {
        let ids: EquivalentIds =
            serde_json::from_value(json!({"bts:entrez": ["1017", "1018"], "bts:symbol": "CDK2"}))
                .unwrap();
        assert_eq!(ids["bts:entrez"].first(), Some("1017"));
        assert_eq!(ids["bts:symbol"], IdValue::One("CDK2".to_string()));
    }

    #[test]
    fn test_digest_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"$source":"x","ids":[1]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"ids":[1],"$source":"x"}"#).unwrap();
        assert_eq!(info_digest(Some(&a)), info_digest(Some(&b)));
        assert_ne!(info_digest(Some(&a)), info_digest(None));
    }

    #[test]
    fn test_edge_copies_source() {
        let edge = Edge::new(0, "bts:treats", Some(json!({"$source": "DRUG_DB"})));
        assert_eq!(edge.data_source.as_deref(), Some("DRUG_DB"));
        let bare = Edge::new(1, "bts:treats", None);
        assert!(bare.data_source.is_none());
    }
}
