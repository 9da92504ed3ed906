use thiserror::Error;

/// Main error type for Biograph
#[derive(Error, Debug)]
pub enum BiographError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path references nodes or edges the graph does not contain
    #[error("Topology error: {0}")]
    Topology(String),

    /// Identifier resolver client errors
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// The identifier resolver failed for one (type, identifier kind) group
    #[error("Resolver unavailable for {entity_type}/{identifier_kind}: {reason}")]
    ResolverUnavailable {
        entity_type: String,
        identifier_kind: String,
        reason: String,
    },

    /// A response key has no entry in the input id map
    #[error("Unmapped input identifier: {0}")]
    UnmappedInput(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using BiographError
pub type Result<T> = std::result::Result<T, BiographError>;
