use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::GraphConfig;
use crate::error::{BiographError, Result};
use crate::graph::{normalize, KnowledgeGraph, NormalizeStats};
use crate::response::{parse_batch, ResponseBatch};

/// A response batch loaded from disk
#[derive(Debug, Clone)]
pub struct ResponseFile {
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub batch: ResponseBatch,
}

impl ResponseFile {
    /// Identity `input_id_map` for this batch: every input key maps to itself.
    pub fn identity_id_map(&self) -> HashMap<String, String> {
        self.batch.keys().map(|k| (k.clone(), k.clone())).collect()
    }
}

/// Load every `*.json` response batch under `root`, in path order.
///
/// `root` may also be a single file. Files that are not valid response batches
/// abort the walk with the offending path in the error.
pub fn discover_response_files(root: &Path) -> Result<Vec<ResponseFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if extension != "json" {
            continue;
        }

        let relative_path = if path == root {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            path.strip_prefix(root)
                .map_err(|_| {
                    BiographError::InvalidInput(format!(
                        "Failed to compute relative path for: {}",
                        path.display()
                    ))
                })?
                .to_string_lossy()
                .to_string()
        };

        let content = std::fs::read_to_string(path)?;
        let batch = parse_batch(&content, &relative_path)?;
        log::debug!("Loaded {} inputs from {}", batch.len(), relative_path);

        files.push(ResponseFile {
            relative_path,
            absolute_path: path.to_path_buf(),
            batch,
        });
    }

    log::info!("Discovered {} response files in {}", files.len(), root.display());
    Ok(files)
}

/// Normalize `files` one after another into the shared `graph`.
///
/// Writes are serialized on one graph, so a node that is an output in one file and an
/// input in another ends up with the same attributes whatever the file order.
pub fn normalize_files(
    files: &[ResponseFile],
    graph: &mut KnowledgeGraph,
    config: &GraphConfig,
) -> Result<NormalizeStats> {
    let labels = config.label_set();
    let kinds = config.output_kind_set();
    let mut total = NormalizeStats::default();

    for file in files {
        let stats = normalize(&file.batch, graph, &labels, &file.identity_id_map(), &kinds)?;
        log::info!(
            "{}: +{} nodes, +{} edges, {} empty responses, {} skipped values",
            file.relative_path,
            stats.nodes_added,
            stats.edges_added,
            stats.empty_responses,
            stats.skipped_values
        );
        total.empty_responses += stats.empty_responses;
        total.nodes_added += stats.nodes_added;
        total.edges_added += stats.edges_added;
        total.skipped_values += stats.skipped_values;
    }

    Ok(total)
}
