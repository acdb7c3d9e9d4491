//! Error types for DOM ingestion and ref selection
//!
//! Simple, flat error hierarchy. The traversal itself never fails; only
//! ingestion and selection report errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("CDP protocol error: {0}")]
    CdpError(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Document has no root element to snapshot")]
    NoRoot,

    #[error("No snapshot refs found (looking up \"{ref_id}\"). Call snapshot first.")]
    NoSnapshot { ref_id: String },

    #[error("Ref \"{ref_id}\" not found. Available refs: {available}")]
    RefNotFound { ref_id: String, available: String },

    #[error("Ref \"{ref_id}\" is stale (element detached). Call snapshot again.")]
    StaleRef { ref_id: String },
}
