//! Per-edge provenance lookup.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::BiographError;
use crate::response::{scalar_to_string, API_KEY, PUBMED_KEY, SOURCE_KEY};

/// Provenance columns carried for every hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvenanceField {
    Api,
    Source,
    Pubmed,
}

impl ProvenanceField {
    /// Payload key holding this field.
    pub fn key(self) -> &'static str {
        match self {
            ProvenanceField::Api => API_KEY,
            ProvenanceField::Source => SOURCE_KEY,
            ProvenanceField::Pubmed => PUBMED_KEY,
        }
    }
}

impl fmt::Display for ProvenanceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvenanceField::Api => "api",
            ProvenanceField::Source => "source",
            ProvenanceField::Pubmed => "pubmed",
        };
        f.write_str(name)
    }
}

impl FromStr for ProvenanceField {
    type Err = BiographError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(ProvenanceField::Api),
            "source" => Ok(ProvenanceField::Source),
            "pubmed" => Ok(ProvenanceField::Pubmed),
            other => Err(BiographError::InvalidInput(format!(
                "unknown provenance field: {}",
                other
            ))),
        }
    }
}

/// Read one provenance field from an edge payload as a comma-joined string.
///
/// A scalar counts as a one-element list and numeric citation ids are stringified.
/// Returns `None` when the payload, the field, or every value is missing or empty.
pub fn extract(info: Option<&Value>, field: ProvenanceField) -> Option<String> {
    let values: Vec<String> = match info?.get(field.key())? {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };
    let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}
