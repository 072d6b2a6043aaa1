//! Knowledge nodes - the scored entries of the graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::{clamp_score, estimate_tokens, GraphError, DEFAULT_CONFIDENCE, DEFAULT_RELEVANCE};

/// Free-form, string-keyed node and edge metadata.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Unique identifier for nodes. Opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of knowledge a node can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Fact,
    Experience,
    Skill,
    Insight,
    Relationship,
    Goal,
    Observation,
    Trait,
    Intention,
    Custom,
}

impl NodeType {
    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 10] = [
        NodeType::Fact,
        NodeType::Experience,
        NodeType::Skill,
        NodeType::Insight,
        NodeType::Relationship,
        NodeType::Goal,
        NodeType::Observation,
        NodeType::Trait,
        NodeType::Intention,
        NodeType::Custom,
    ];

    /// The snake_case tag used in snapshots and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Fact => "fact",
            NodeType::Experience => "experience",
            NodeType::Skill => "skill",
            NodeType::Insight => "insight",
            NodeType::Relationship => "relationship",
            NodeType::Goal => "goal",
            NodeType::Observation => "observation",
            NodeType::Trait => "trait",
            NodeType::Intention => "intention",
            NodeType::Custom => "custom",
        }
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GraphError::InvalidType(s.to_string()))
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

fn default_relevance() -> f64 {
    DEFAULT_RELEVANCE
}

/// A scored piece of knowledge stored in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Human-readable content of the node.
    pub content: String,

    /// Current salience (0.0 - 1.0).
    #[serde(default = "default_relevance")]
    pub relevance: f64,

    /// How much the agent trusts this knowledge (0.0 - 1.0).
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default)]
    pub access_count: u64,

    pub created_at: DateTime<Utc>,

    pub last_accessed: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Pinned nodes are never decayed or pruned.
    #[serde(default)]
    pub pinned: bool,

    /// Never persisted; recomputed after a snapshot is loaded.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,

    /// Estimated token cost of the content.
    #[serde(default)]
    pub cached_tokens: usize,
}

impl Node {
    /// Materialize a node from an insert request.
    pub fn from_new(id: NodeId, data: NewNode, now: DateTime<Utc>) -> Self {
        let cached_tokens = estimate_tokens(&data.content);
        Self {
            id,
            node_type: data.node_type,
            content: data.content,
            relevance: clamp_score(data.relevance, 0.0, 1.0),
            confidence: clamp_score(data.confidence, 0.0, 1.0),
            access_count: 0,
            created_at: now,
            last_accessed: now,
            metadata: data.metadata,
            pinned: data.pinned,
            embedding: None,
            cached_tokens,
        }
    }

    /// Token cost used for budget packing. Falls back to a fresh estimate
    /// for nodes restored from snapshots that predate token caching.
    pub fn token_cost(&self) -> usize {
        if self.cached_tokens > 0 {
            self.cached_tokens
        } else {
            estimate_tokens(&self.content)
        }
    }

    /// Fractional days elapsed since the last access.
    pub fn days_since_access(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.last_accessed);
        (elapsed.num_milliseconds() as f64 / 86_400_000.0).max(0.0)
    }

    /// Metadata value as a string, if present and textual.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// An insert request for [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub node_type: NodeType,
    pub content: String,
    pub relevance: f64,
    pub confidence: f64,
    pub metadata: Metadata,
    pub pinned: bool,
}

impl NewNode {
    /// Create an insert request with default scores.
    pub fn new(node_type: NodeType, content: impl Into<String>) -> Self {
        Self {
            node_type,
            content: content.into(),
            relevance: DEFAULT_RELEVANCE,
            confidence: DEFAULT_CONFIDENCE,
            metadata: Metadata::new(),
            pinned: false,
        }
    }

    /// Parse the type tag first; fails with [`GraphError::InvalidType`].
    pub fn parse(node_type: &str, content: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self::new(node_type.parse()?, content))
    }

    /// Set the initial relevance, clamped to [0, 1].
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = clamp_score(relevance, 0.0, 1.0);
        self
    }

    /// Set the initial confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_score(confidence, 0.0, 1.0);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a whole metadata map.
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Exempt the node from decay and pruning.
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }
}

/// Changes accepted by `update_node`. Only content, metadata and the pin flag
/// can be edited; scores move through decay and reinforcement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub content: Option<String>,
    /// Merged into the existing metadata.
    pub metadata: Option<Metadata>,
    pub pinned: Option<bool>,
}

impl NodeUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Merge these metadata entries.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set or clear the pin flag.
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }
}
