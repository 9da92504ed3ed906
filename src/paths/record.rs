//! Fixed-schema rows produced from paths, and the table that holds them.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Write;

use crate::error::Result;

/// Identity columns for one intermediate or output node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodeColumns {
    pub id: Option<String>,
    pub name: Option<String>,
    pub entity_type: Option<String>,
}

/// Predicate and provenance columns for one hop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HopColumns {
    pub predicate: Option<String>,
    pub source: Option<String>,
    pub api: Option<String>,
    pub pubmed: Option<String>,
}

/// One fully expanded path.
///
/// `hops[i]` leads into `intermediates[i]`; the last hop leads into `output`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRecord {
    pub input: String,
    pub input_type: Option<String>,
    pub hops: Vec<HopColumns>,
    pub intermediates: Vec<NodeColumns>,
    pub output: NodeColumns,
}

impl PathRecord {
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Predicate of hop `n` (1-based), as used by `pred{n}`.
    pub fn predicate(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.hops.get(i))
            .and_then(|h| h.predicate.as_deref())
    }

    /// First intermediate node, if the path has one.
    pub fn intermediate(&self) -> Option<&NodeColumns> {
        self.intermediates.first()
    }

    /// Column name -> cell for every column this record defines.
    pub fn cells(&self) -> Vec<(String, Option<String>)> {
        let mut cells = vec![
            ("input".to_string(), Some(self.input.clone())),
            ("input_type".to_string(), self.input_type.clone()),
        ];
        for (i, hop) in self.hops.iter().enumerate() {
            let n = i + 1;
            cells.push((format!("pred{}", n), hop.predicate.clone()));
            cells.push((format!("pred{}_source", n), hop.source.clone()));
            cells.push((format!("pred{}_api", n), hop.api.clone()));
            cells.push((format!("pred{}_pubmed", n), hop.pubmed.clone()));
            let node = if n == self.hops.len() {
                Some(("output".to_string(), &self.output))
            } else {
                self.intermediates.get(i).map(|c| (format!("node{}", n), c))
            };
            if let Some((prefix, columns)) = node {
                cells.push((format!("{}_id", prefix), columns.id.clone()));
                cells.push((format!("{}_name", prefix), columns.name.clone()));
                cells.push((format!("{}_type", prefix), columns.entity_type.clone()));
            }
        }
        cells
    }
}

/// Column order for a table whose longest path has `max_hops` hops.
pub fn columns_for(max_hops: usize) -> Vec<String> {
    let mut columns = vec!["input".to_string(), "input_type".to_string()];
    for n in 1..=max_hops {
        for suffix in ["", "_source", "_api", "_pubmed"] {
            columns.push(format!("pred{}{}", n, suffix));
        }
        if n < max_hops {
            for suffix in ["_id", "_name", "_type"] {
                columns.push(format!("node{}{}", n, suffix));
            }
        }
    }
    if max_hops > 0 {
        for suffix in ["_id", "_name", "_type"] {
            columns.push(format!("output{}", suffix));
        }
    }
    columns
}

/// Exact-match filters on the tabular output. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub pred1: Option<String>,
    pub pred2: Option<String>,
    /// Matches `node1_id`.
    pub intermediate: Option<String>,
    /// Matches `node1_type`.
    pub intermediate_type: Option<String>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        *self == RowFilter::default()
    }

    pub fn matches(&self, record: &PathRecord) -> bool {
        let same = |want: &Option<String>, have: Option<&str>| match want {
            Some(w) => have == Some(w.as_str()),
            None => true,
        };
        let node1 = record.intermediate();
        same(&self.pred1, record.predicate(1))
            && same(&self.pred2, record.predicate(2))
            && same(&self.intermediate, node1.and_then(|n| n.id.as_deref()))
            && same(&self.intermediate_type, node1.and_then(|n| n.entity_type.as_deref()))
    }
}

/// Rows from paths of possibly different lengths sharing one column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTable {
    rows: Vec<PathRecord>,
}

impl PathTable {
    pub fn new(rows: Vec<PathRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PathRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        columns_for(self.rows.iter().map(PathRecord::hop_count).max().unwrap_or(0))
    }

    /// Drop repeated rows, keeping the first occurrence.
    pub fn dedup(mut self) -> Self {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
        self
    }

    pub fn filter(mut self, filter: &RowFilter) -> Self {
        if !filter.is_empty() {
            self.rows.retain(|row| filter.matches(row));
        }
        self
    }

    /// Rows as JSON objects over the full column layout; unused cells are `null`.
    pub fn to_json_records(&self) -> Vec<Map<String, Value>> {
        let columns = self.columns();
        self.rows
            .iter()
            .map(|row| {
                let mut record: Map<String, Value> =
                    columns.iter().map(|c| (c.clone(), Value::Null)).collect();
                for (column, cell) in row.cells() {
                    record.insert(column, cell.map(Value::String).unwrap_or(Value::Null));
                }
                record
            })
            .collect()
    }

    /// Write the table as CSV with a header row; unused cells are empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let columns = self.columns();
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&columns)?;
        for row in &self.rows {
            let cells = row.cells();
            let line = columns.iter().map(|column| {
                cells
                    .iter()
                    .find(|(name, _)| name == column)
                    .and_then(|(_, cell)| cell.as_deref())
                    .unwrap_or("")
            });
            csv.write_record(line)?;
        }
        csv.flush()?;
        Ok(())
    }
}
