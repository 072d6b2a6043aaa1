//! Knowledge Graph - the core data structure for long-term memory.

use chrono::{DateTime, Utc};
use memory_model::{
    clamp_score, estimate_tokens, Edge, EdgeId, EdgeOptions, GraphError, GraphResult, NewNode,
    Node, NodeId, NodeType, NodeUpdate, PendingItem, Relationship, DEDUP_BOOST,
    EDGE_STRENGTH_INCREMENT, MAX_EDGE_STRENGTH,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::dedup::dedup_text;
use crate::config::{GraphConfig, GraphOptions};
use crate::providers::{EmbeddingProvider, SignalSink};

/// The knowledge graph of a single agent.
///
/// Nodes are stored by id; edges live in outgoing adjacency lists keyed by
/// their source. The graph is a plain owned value: callers that share it
/// across tasks must bring their own synchronization.
#[derive(Clone)]
pub struct KnowledgeGraph {
    pub(crate) agent_id: String,

    pub(crate) nodes: HashMap<NodeId, Node>,

    /// Outgoing edges by source id.
    pub(crate) edges: HashMap<NodeId, Vec<Edge>>,

    pub(crate) pending_facts: Vec<PendingItem>,
    pub(crate) pending_learnings: Vec<PendingItem>,

    pub(crate) config: GraphConfig,

    /// Most recently touched first; always a subset of `nodes`.
    pub(crate) active_set: Vec<NodeId>,
    pub(crate) max_active: usize,

    pub(crate) dedup_threshold: f64,
    pub(crate) max_tokens: Option<usize>,
    pub(crate) type_quotas: HashMap<NodeType, f64>,

    pub(crate) last_decay_at: Option<DateTime<Utc>>,

    pub(crate) embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub(crate) signals: Option<Arc<dyn SignalSink>>,
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("agent_id", &self.agent_id)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edge_count())
            .field("active_set", &self.active_set.len())
            .field("pending", &(self.pending_facts.len() + self.pending_learnings.len()))
            .field("embedder", &self.embedder.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

/// Summary counters for a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub active_count: usize,
    pub pending_count: usize,
    pub nodes_by_type: HashMap<NodeType, usize>,
    pub total_capacity: usize,
    pub mean_relevance: f64,
}

impl KnowledgeGraph {
    /// Create an empty graph with default options.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::with_options(agent_id, GraphOptions::default())
    }

    /// Create an empty graph. Out-of-range options are clamped.
    pub fn with_options(agent_id: impl Into<String>, options: GraphOptions) -> Self {
        Self {
            agent_id: agent_id.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            pending_facts: Vec::new(),
            pending_learnings: Vec::new(),
            config: options.graph_config(),
            active_set: Vec::new(),
            max_active: options.max_active,
            dedup_threshold: clamp_score(options.dedup_threshold, 0.0, 1.0),
            max_tokens: options.max_tokens,
            type_quotas: options.clamped_quotas(),
            last_decay_at: None,
            embedder: None,
            signals: None,
        }
    }

    /// Attach an embedding provider used for dedup and semantic search.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Attach a sink for archival notifications.
    pub fn with_signals(mut self, signals: Arc<dyn SignalSink>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// The agent this graph belongs to.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Decay, pruning and capacity settings.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Upper bound on the active set.
    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Minimum cosine similarity for a semantic duplicate.
    pub fn dedup_threshold(&self) -> f64 {
        self.dedup_threshold
    }

    /// Token budget applied when reading the active set.
    pub fn max_tokens(&self) -> Option<usize> {
        self.max_tokens
    }

    /// Per-type fractions of the token budget.
    pub fn type_quotas(&self) -> &HashMap<NodeType, f64> {
        &self.type_quotas
    }

    /// When exponential decay last ran.
    pub fn last_decay_at(&self) -> Option<DateTime<Utc>> {
        self.last_decay_at
    }

    /// Active-set ids, most recently touched first.
    pub fn active_ids(&self) -> &[NodeId] {
        &self.active_set
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all nodes in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All nodes of one type.
    pub fn nodes_by_type(&self, node_type: NodeType) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.node_type == node_type)
            .collect()
    }

    pub(crate) fn count_of_type(&self, node_type: NodeType) -> usize {
        self.nodes
            .values()
            .filter(|n| n.node_type == node_type)
            .count()
    }

    /// Edges leaving `id`.
    pub fn outgoing_edges(&self, id: &NodeId) -> &[Edge] {
        self.edges.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Edges pointing at `id`. Requires a scan of every adjacency list.
    pub fn incoming_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .flatten()
            .filter(|e| &e.target_id == id)
            .collect()
    }

    /// Summary counters for the whole graph.
    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_type: HashMap<NodeType, usize> = HashMap::new();
        for node in self.nodes.values() {
            *nodes_by_type.entry(node.node_type).or_default() += 1;
        }

        let mean_relevance = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes.values().map(|n| n.relevance).sum::<f64>() / self.nodes.len() as f64
        };

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edge_count(),
            active_count: self.active_set.len(),
            pending_count: self.pending_facts.len() + self.pending_learnings.len(),
            nodes_by_type,
            total_capacity: self.config.total_capacity(),
            mean_relevance,
        }
    }

    /// Embed `text` with the attached provider. Failures degrade to `None`.
    pub(crate) fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(text) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(agent_id = %self.agent_id, provider = embedder.name(), error = %e, "embedding failed, falling back to exact matching");
                None
            }
        }
    }

    /// Re-embed every node, e.g. after restoring a snapshot.
    ///
    /// Returns the number of nodes that received an embedding.
    pub fn recompute_embeddings(&mut self) -> usize {
        if self.embedder.is_none() {
            return 0;
        }

        let computed: Vec<(NodeId, Option<Vec<f32>>)> = self
            .nodes
            .values()
            .map(|n| {
                let text = dedup_text(n.node_type, &n.content, &n.metadata);
                (n.id.clone(), self.embed(&text))
            })
            .collect();

        let mut embedded = 0;
        for (id, embedding) in computed {
            if let Some(node) = self.nodes.get_mut(&id) {
                embedded += usize::from(embedding.is_some());
                node.embedding = embedding;
            }
        }
        debug!(agent_id = %self.agent_id, embedded, "recomputed embeddings");
        embedded
    }

    /// Add a node, or boost and return an existing duplicate.
    ///
    /// Fails with [`GraphError::MissingContent`] on blank content and
    /// [`GraphError::QuotaExceeded`] when the type is at capacity.
    pub fn add_node(&mut self, data: NewNode) -> GraphResult<NodeId> {
        if data.content.trim().is_empty() {
            return Err(GraphError::MissingContent);
        }

        let node_type = data.node_type;
        if self.count_of_type(node_type) >= self.config.capacity_for(node_type) {
            return Err(GraphError::QuotaExceeded(node_type));
        }

        let text = dedup_text(node_type, &data.content, &data.metadata);
        let embedding = self.embed(&text);

        if let Some(existing) = self.find_duplicate(node_type, &data.content, embedding.as_deref()) {
            debug!(agent_id = %self.agent_id, node_id = %existing, "duplicate insert, boosting existing node");
            self.boost_node(&existing, DEDUP_BOOST);
            return Ok(existing);
        }

        let id = NodeId::new();
        let mut node = Node::from_new(id.clone(), data, Utc::now());
        node.embedding = embedding;
        debug!(agent_id = %self.agent_id, node_id = %id, node_type = %node_type, "added node");

        self.nodes.insert(id.clone(), node);
        self.touch_active(&id);
        Ok(id)
    }

    /// Look up a node; fails with [`GraphError::NotFound`].
    pub fn get_node(&self, id: &NodeId) -> GraphResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    /// Edit content, metadata (merged) or the pin flag of a node.
    ///
    /// The node is re-embedded whenever its embedded text changes: new
    /// content, or a new `name` / `description` metadata value.
    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> GraphResult<&Node> {
        let current = self.get_node(id)?;

        if matches!(&update.content, Some(content) if content.trim().is_empty()) {
            return Err(GraphError::MissingContent);
        }

        let content = update.content.as_deref().unwrap_or(&current.content);
        let mut metadata = current.metadata.clone();
        if let Some(extra) = &update.metadata {
            metadata.extend(extra.clone());
        }

        let text = dedup_text(current.node_type, content, &metadata);
        let reembed = (text != dedup_text(current.node_type, &current.content, &current.metadata))
            .then(|| self.embed(&text));

        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        if let Some(content) = update.content {
            node.cached_tokens = estimate_tokens(&content);
            node.content = content;
        }
        if let Some(metadata) = update.metadata {
            node.metadata.extend(metadata);
        }
        if let Some(pinned) = update.pinned {
            node.pinned = pinned;
        }
        if let Some(embedding) = reembed {
            node.embedding = embedding;
        }

        Ok(node)
    }

    /// Remove a node together with its edges and active-set entry.
    pub fn remove_node(&mut self, id: &NodeId) -> GraphResult<Node> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.to_string()));
        }

        let removed: HashSet<NodeId> = HashSet::from([id.clone()]);
        self.detach_nodes(&removed)
            .pop()
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    /// Drop the given nodes and everything that references them.
    pub(crate) fn detach_nodes(&mut self, ids: &HashSet<NodeId>) -> Vec<Node> {
        let removed: Vec<Node> = ids.iter().filter_map(|id| self.nodes.remove(id)).collect();

        self.edges.retain(|source, list| {
            if ids.contains(source) {
                return false;
            }
            list.retain(|e| !ids.contains(&e.target_id));
            !list.is_empty()
        });
        self.active_set.retain(|id| !ids.contains(id));

        removed
    }

    /// Link `source` to `target`.
    ///
    /// Re-linking an existing (target, relationship) pair strengthens that
    /// edge by 0.5 (capped at 10.0) and merges metadata instead of adding a
    /// second edge.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: Relationship,
        options: EdgeOptions,
    ) -> GraphResult<EdgeId> {
        for id in [source, target] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::NotFound(id.to_string()));
            }
        }

        let list = self.edges.entry(source.clone()).or_default();

        if let Some(existing) = list
            .iter_mut()
            .find(|e| &e.target_id == target && e.relationship == relationship)
        {
            existing.strength = (existing.strength + EDGE_STRENGTH_INCREMENT).min(MAX_EDGE_STRENGTH);
            existing.metadata.extend(options.metadata);
            debug!(edge_id = %existing.id, strength = existing.strength, "strengthened edge");
            return Ok(existing.id.clone());
        }

        let edge = Edge::new(
            source.clone(),
            target.clone(),
            relationship,
            options.strength,
            options.metadata,
            Utc::now(),
        );
        let id = edge.id.clone();
        debug!(edge_id = %id, %source, %target, %relationship, "added edge");
        list.push(edge);
        Ok(id)
    }

    /// Remove the `relationship` edge from `source` to `target`.
    pub fn unlink(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: Relationship,
    ) -> GraphResult<Edge> {
        let not_found = || GraphError::NotFound(format!("{source} -[{relationship}]-> {target}"));

        let list = self.edges.get_mut(source).ok_or_else(not_found)?;
        let index = list
            .iter()
            .position(|e| &e.target_id == target && e.relationship == relationship)
            .ok_or_else(not_found)?;

        let edge = list.remove(index);
        if list.is_empty() {
            self.edges.remove(source);
        }
        Ok(edge)
    }
}
