//! Presentation adapters: shape a graph for external viewers and exporters.
//!
//! Nothing here feeds back into the graph; every function is a read-only view.

pub mod export;
pub mod visjs;

pub use export::{edge_table, to_dot, EdgeRow, EdgeTable};
pub use visjs::{to_visjs, VisEdge, VisFont, VisNode, VisPayload};
