//! Typed, weighted edges between knowledge nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{clamp_score, GraphError, Metadata, NodeId, DEFAULT_EDGE_STRENGTH, MAX_EDGE_STRENGTH};

/// Unique identifier for edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new random edge ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How two nodes are related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Supports,
    Contradicts,
    RelatesTo,
    DerivedFrom,
    Causes,
    PartOf,
    Supersedes,
}

impl Relationship {
    /// Every relationship, in declaration order.
    pub const ALL: [Relationship; 7] = [
        Relationship::Supports,
        Relationship::Contradicts,
        Relationship::RelatesTo,
        Relationship::DerivedFrom,
        Relationship::Causes,
        Relationship::PartOf,
        Relationship::Supersedes,
    ];

    /// The snake_case tag used in snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Supports => "supports",
            Relationship::Contradicts => "contradicts",
            Relationship::RelatesTo => "relates_to",
            Relationship::DerivedFrom => "derived_from",
            Relationship::Causes => "causes",
            Relationship::PartOf => "part_of",
            Relationship::Supersedes => "supersedes",
        }
    }
}

impl FromStr for Relationship {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relationship::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GraphError::InvalidRelationship(s.to_string()))
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge, stored in the adjacency list of its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub relationship: Relationship,
    /// Link strength, capped at [`MAX_EDGE_STRENGTH`].
    pub strength: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Edge {
    /// Create an edge, clamping `strength` to [0, `MAX_EDGE_STRENGTH`].
    pub fn new(
        source_id: NodeId,
        target_id: NodeId,
        relationship: Relationship,
        strength: f64,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            source_id,
            target_id,
            relationship,
            strength: clamp_score(strength, 0.0, MAX_EDGE_STRENGTH),
            created_at: now,
            metadata,
        }
    }
}

/// Options for linking two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeOptions {
    pub strength: f64,
    pub metadata: Metadata,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            strength: DEFAULT_EDGE_STRENGTH,
            metadata: Metadata::new(),
        }
    }
}

impl EdgeOptions {
    /// Set the initial strength.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
