//! Snapshots for the external durable store.
//!
//! Embeddings are never part of a snapshot. After [`KnowledgeGraph::from_map`]
//! every node has `embedding = None` until
//! [`KnowledgeGraph::recompute_embeddings`] runs.

use chrono::{DateTime, Utc};
use memory_model::{
    clamp_score, Edge, GraphError, GraphResult, Node, NodeId, NodeType, PendingItem,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::KnowledgeGraph;
use crate::config::{clamp_quotas, GraphConfig, DEFAULT_DEDUP_THRESHOLD, DEFAULT_MAX_ACTIVE};

fn default_max_active() -> usize {
    DEFAULT_MAX_ACTIVE
}

fn default_dedup_threshold() -> f64 {
    DEFAULT_DEDUP_THRESHOLD
}

/// Serialized shape of a graph. Every field but `agent_id` defaults when
/// missing so that older snapshots keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub agent_id: String,
    #[serde(default)]
    pub nodes: HashMap<NodeId, Node>,
    #[serde(default)]
    pub edges: HashMap<NodeId, Vec<Edge>>,
    #[serde(default)]
    pub pending_facts: Vec<PendingItem>,
    #[serde(default)]
    pub pending_learnings: Vec<PendingItem>,
    #[serde(default)]
    pub config: GraphConfig,
    #[serde(default)]
    pub active_set: Vec<NodeId>,
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub type_quotas: HashMap<NodeType, f64>,
    #[serde(default)]
    pub last_decay_at: Option<DateTime<Utc>>,
}

impl KnowledgeGraph {
    /// Capture the persistent state of the graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            agent_id: self.agent_id.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            pending_facts: self.pending_facts.clone(),
            pending_learnings: self.pending_learnings.clone(),
            config: self.config.clone(),
            active_set: self.active_set.clone(),
            max_active: self.max_active,
            dedup_threshold: self.dedup_threshold,
            max_tokens: self.max_tokens,
            type_quotas: self.type_quotas.clone(),
            last_decay_at: self.last_decay_at,
        }
    }

    /// Serialize the graph into a JSON map for the durable store.
    pub fn to_map(&self) -> GraphResult<serde_json::Value> {
        serde_json::to_value(self.snapshot()).map_err(|e| GraphError::Snapshot(e.to_string()))
    }

    /// Restore a graph from a map produced by [`KnowledgeGraph::to_map`].
    pub fn from_map(map: serde_json::Value) -> GraphResult<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_value(map).map_err(|e| GraphError::Snapshot(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Rebuild a graph, repairing anything that violates the graph invariants:
    /// out-of-range scores are clamped, edges to unknown nodes and unknown
    /// active-set ids are dropped.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut nodes = snapshot.nodes;
        for node in nodes.values_mut() {
            node.relevance = clamp_score(node.relevance, 0.0, 1.0);
            node.confidence = clamp_score(node.confidence, 0.0, 1.0);
            node.embedding = None;
        }

        let mut dropped_edges = 0;
        let mut edges = snapshot.edges;
        edges.retain(|source, list| {
            let before = list.len();
            list.retain(|e| nodes.contains_key(source) && nodes.contains_key(&e.target_id));
            dropped_edges += before - list.len();
            !list.is_empty()
        });

        let mut active_set = snapshot.active_set;
        active_set.retain(|id| nodes.contains_key(id));
        active_set.truncate(snapshot.max_active);

        if dropped_edges > 0 {
            warn!(agent_id = %snapshot.agent_id, dropped_edges, "snapshot contained dangling edges");
        }

        Self {
            agent_id: snapshot.agent_id,
            nodes,
            edges,
            pending_facts: snapshot.pending_facts,
            pending_learnings: snapshot.pending_learnings,
            config: snapshot.config.clamped(),
            active_set,
            max_active: snapshot.max_active,
            dedup_threshold: clamp_score(snapshot.dedup_threshold, 0.0, 1.0),
            max_tokens: snapshot.max_tokens,
            type_quotas: clamp_quotas(&snapshot.type_quotas),
            last_decay_at: snapshot.last_decay_at,
            embedder: None,
            signals: None,
        }
    }
}
