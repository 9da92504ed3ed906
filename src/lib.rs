pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod paths;
pub mod present;
pub mod resolve;
pub mod response;

pub use config::Config;
pub use error::{BiographError, Result};
pub use graph::{merge, merge_all, normalize, KnowledgeGraph};
pub use paths::{tabulate_edge_paths, tabulate_node_paths, PathTable, RowFilter};
pub use resolve::{resolve, IdResolver, ResolveOutcome};
