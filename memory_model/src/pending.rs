//! Pending items - proposed knowledge awaiting approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{clamp_score, Metadata, NewNode, NodeType, DEFAULT_CONFIDENCE};

/// Unique identifier for pending items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingId(pub String);

impl PendingId {
    /// Create a new random pending ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PendingId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PendingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for PendingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a pending item will become once approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    /// Becomes a [`NodeType::Fact`] node.
    Fact,
    /// Becomes a [`NodeType::Skill`] node.
    Learning,
}

impl PendingKind {
    /// The node type an approved item becomes.
    pub fn node_type(&self) -> NodeType {
        match self {
            PendingKind::Fact => NodeType::Fact,
            PendingKind::Learning => NodeType::Skill,
        }
    }
}

/// A proposed fact or learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub id: PendingId,
    pub kind: PendingKind,
    pub content: String,
    pub confidence: f64,
    #[serde(default)]
    pub source: Option<String>,
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl PendingItem {
    /// Create a pending item, clamping the proposed confidence.
    pub fn new(kind: PendingKind, content: impl Into<String>, proposal: Proposal, now: DateTime<Utc>) -> Self {
        Self {
            id: PendingId::new(),
            kind,
            content: content.into(),
            confidence: clamp_score(proposal.confidence, 0.0, 1.0),
            source: proposal.source,
            extracted_at: now,
            metadata: proposal.metadata,
        }
    }

    /// The insert request this item turns into on approval. The source, if
    /// any, is carried over into the node metadata.
    pub fn to_new_node(&self) -> NewNode {
        let mut data = NewNode::new(self.kind.node_type(), self.content.clone())
            .with_confidence(self.confidence)
            .with_metadata_map(self.metadata.clone());
        if let Some(source) = &self.source {
            data = data.with_metadata("source", source.clone());
        }
        data
    }
}

/// Optional attributes of a proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub confidence: f64,
    pub source: Option<String>,
    pub metadata: Metadata,
}

impl Default for Proposal {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            source: None,
            metadata: Metadata::new(),
        }
    }
}

impl Proposal {
    /// Set the proposed confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Record where the proposal came from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
