//! Interfaces to the graph's external collaborators.
//!
//! Both collaborators are optional. Without an embedding provider, dedup
//! falls back to exact matching and search to keywords; without a signal
//! sink, archival notifications are simply not sent.

use memory_model::{NodeId, NodeType, ProviderError};
use serde::{Deserialize, Serialize};

/// Turns text into embedding vectors.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Human-readable provider name, used in log fields.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Receives fire-and-forget notifications about archived nodes.
pub trait SignalSink: Send + Sync {
    /// Called once per archived node, before it is removed.
    fn archived(&self, signal: &ArchivalSignal) -> Result<(), ProviderError>;
}

/// Emitted once per node removed by `prune_and_archive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivalSignal {
    pub agent_id: String,
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub reason: String,
}
