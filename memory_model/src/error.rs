//! Error types for graph operations and external collaborators.

use thiserror::Error;

use crate::NodeType;

/// Errors returned by knowledge graph operations.
///
/// A failed operation never mutates the graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid node type: {0}")]
    InvalidType(String),

    #[error("invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("node content must not be empty")]
    MissingContent,

    #[error("quota exceeded for node type {0}")]
    QuotaExceeded(NodeType),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed snapshot: {0}")]
    Snapshot(String),
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failure reported by an embedding provider or signal sink.
///
/// The graph swallows these at the boundary; they are never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider failed: {0}")]
    Failed(String),
}
