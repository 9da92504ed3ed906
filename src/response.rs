//! Typed view over semi-structured API responses.
//!
//! A response batch maps each queried input identifier to either `null` or an object
//! whose keys are schema properties. Each property holds a list of values, and each
//! value is either a scalar identifier or a structured entry carrying its own
//! identifier lists plus provenance.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{BiographError, Result};
use crate::graph::EntityType;

/// Input identifier -> raw response (`Value::Null` when the query yielded nothing).
pub type ResponseBatch = BTreeMap<String, Value>;

pub const TYPE_KEY: &str = "@type";
pub const SOURCE_KEY: &str = "$source";
pub const API_KEY: &str = "$api";
pub const PUBMED_KEY: &str = "bts:pubmed";

/// One element of a schema property's value list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue<'a> {
    Scalar(String),
    Structured(StructuredEntry<'a>),
}

/// A structured value: nested identifier lists, declared type and the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredEntry<'a> {
    pub entity_type: Option<EntityType>,
    pub source: Option<&'a str>,
    pub raw: &'a Map<String, Value>,
}

impl<'a> StructuredEntry<'a> {
    /// Non-empty identifier list stored under `kind`, stringified. Scalars count as
    /// one-element lists; nested objects and nulls are ignored.
    pub fn ids(&self, kind: &str) -> Vec<String> {
        match self.raw.get(kind) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Identifier kinds present in the payload, in key order.
    pub fn kinds(&self) -> impl Iterator<Item = &'a str> {
        self.raw.keys().map(String::as_str)
    }
}

impl<'a> ResponseValue<'a> {
    /// Decide the branch for one value. Arrays and nulls do not fit either shape and
    /// yield `None` so the caller can skip just this value.
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(ResponseValue::Structured(StructuredEntry {
                entity_type: entity_type_of(map.get(TYPE_KEY)),
                source: map.get(SOURCE_KEY).and_then(Value::as_str),
                raw: map,
            })),
            Value::Array(_) | Value::Null => None,
            scalar => scalar_to_string(scalar).map(ResponseValue::Scalar),
        }
    }
}

/// Read a declared `@type`: a string, or a list of strings.
pub fn entity_type_of(value: Option<&Value>) -> Option<EntityType> {
    match value? {
        Value::String(t) => Some(EntityType::One(t.clone())),
        Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(EntityType::Many(names))
            }
        }
        _ => None,
    }
}

/// String form of a scalar JSON value.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a response batch from JSON text. The top level must be an object.
pub fn parse_batch(content: &str, path: &str) -> Result<ResponseBatch> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| BiographError::InvalidInput(format!("JSON parse error in {}: {}", path, e)))?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(BiographError::InvalidInput(format!(
            "{}: response batch must be a JSON object keyed by input id",
            path
        ))),
    }
}
