//! Load one response batch into a graph as level-2 nodes and labelled edges.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::{KnowledgeGraph, LEVEL_OUTPUT};
use crate::error::{BiographError, Result};
use crate::response::{entity_type_of, ResponseBatch, ResponseValue, TYPE_KEY};

/// Counters describing what one normalization pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Inputs whose response was null or empty.
    pub empty_responses: usize,
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Values that were neither a scalar nor a structured entry.
    pub skipped_values: usize,
}

/// Normalize `responses` into `graph` in place.
///
/// Only properties in `accepted_labels` are read. Scalar values become nodes typed
/// with the response's own `@type`; structured values contribute one node per id
/// for every nested identifier kind in `accepted_output_kinds`. Every node gets an
/// edge from the input node that `input_id_map` assigns to the response key.
///
/// The input node is created by the first edge that leaves it. A response key
/// missing from `input_id_map` is an error only when the response has an accepted
/// property, and it is reported before anything is written.
///
/// Running this twice with the same inputs leaves the graph unchanged the second
/// time, since identical edges are not re-inserted.
pub fn normalize(
    responses: &ResponseBatch,
    graph: &mut KnowledgeGraph,
    accepted_labels: &HashSet<String>,
    input_id_map: &HashMap<String, String>,
    accepted_output_kinds: &HashSet<String>,
) -> Result<NormalizeStats> {
    let mut stats = NormalizeStats::default();
    let nodes_before = graph.node_count();

    // Every mapping is checked before the graph is touched, so a failed call
    // leaves it as it was.
    let mut work = Vec::new();
    for (input, response) in responses {
        let properties = match response {
            Value::Object(map) if !map.is_empty() => map,
            Value::Object(_) | Value::Null => {
                stats.empty_responses += 1;
                continue;
            }
            other => {
                log::debug!("Skipping non-object response for {}: {}", input, other);
                stats.empty_responses += 1;
                continue;
            }
        };
        if !properties.keys().any(|label| accepted_labels.contains(label)) {
            log::debug!("Response for {} has no accepted property", input);
            continue;
        }
        let source_node = input_id_map
            .get(input)
            .ok_or_else(|| BiographError::UnmappedInput(input.clone()))?;
        work.push((input, properties, source_node));
    }

    for (input, properties, source_node) in work {
        let response_type = entity_type_of(properties.get(TYPE_KEY));

        for (label, values) in properties {
            if !accepted_labels.contains(label) {
                continue;
            }
            let Value::Array(values) = values else {
                log::debug!("Property {} of {} is not a list, skipping", label, input);
                stats.skipped_values += 1;
                continue;
            };

            for value in values {
                match ResponseValue::classify(value) {
                    Some(ResponseValue::Scalar(id)) => {
                        graph.upsert(
                            &id,
                            Some(label.clone()),
                            response_type.clone(),
                            LEVEL_OUTPUT,
                        );
                        if graph.add_edge(source_node, &id, label, None).1 {
                            stats.edges_added += 1;
                        }
                    }
                    Some(ResponseValue::Structured(entry)) => {
                        if entry.entity_type.is_none() {
                            log::debug!("Entry under {} for {} has no @type", label, input);
                        }
                        let payload = Value::Object(entry.raw.clone());
                        for kind in entry.kinds() {
                            if !accepted_output_kinds.contains(kind) {
                                continue;
                            }
                            for id in entry.ids(kind) {
                                graph.upsert(
                                    &id,
                                    Some(kind.to_string()),
                                    entry.entity_type.clone(),
                                    LEVEL_OUTPUT,
                                );
                                let info = Some(payload.clone());
                                if graph.add_edge(source_node, &id, label, info).1 {
                                    stats.edges_added += 1;
                                }
                            }
                        }
                    }
                    None => {
                        log::debug!("Unrecognized value under {} for {}: {}", label, input, value);
                        stats.skipped_values += 1;
                    }
                }
            }
        }
    }

    stats.nodes_added = graph.node_count() - nodes_before;
    log::info!(
        "Normalized {} responses: +{} nodes, +{} edges ({} empty, {} skipped values)",
        responses.len(),
        stats.nodes_added,
        stats.edges_added,
        stats.empty_responses,
        stats.skipped_values
    );
    Ok(stats)
}
