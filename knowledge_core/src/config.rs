//! Graph configuration.
//!
//! [`GraphOptions`] carries every construction option and can be read from
//! TOML; [`GraphConfig`] is the persisted subset that governs decay, pruning
//! and per-type capacity.

use memory_model::{clamp_score, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Linear decay step per pass.
pub const DEFAULT_DECAY_RATE: f64 = 0.10;
/// Capacity of each node type without an explicit limit.
pub const DEFAULT_MAX_NODES_PER_TYPE: usize = 500;
/// Relevance below which unpinned nodes are pruned.
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.1;
/// Default upper bound on the active set.
pub const DEFAULT_MAX_ACTIVE: usize = 50;
/// Default minimum cosine similarity for a semantic duplicate.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.85;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Decay, pruning and capacity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Linear decay step, also the default exponential rate per day.
    pub decay_rate: f64,

    /// Capacity for every node type without an explicit limit.
    pub max_nodes_per_type: usize,

    /// Relevance below which unpinned nodes are pruned.
    pub prune_threshold: f64,

    /// Per-type capacity overrides.
    pub type_limits: HashMap<NodeType, usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
            max_nodes_per_type: DEFAULT_MAX_NODES_PER_TYPE,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            type_limits: HashMap::new(),
        }
    }
}

impl GraphConfig {
    /// Maximum number of nodes of the given type.
    pub fn capacity_for(&self, node_type: NodeType) -> usize {
        self.type_limits
            .get(&node_type)
            .copied()
            .unwrap_or(self.max_nodes_per_type)
    }

    /// Aggregate capacity over all node types.
    pub fn total_capacity(&self) -> usize {
        NodeType::ALL.iter().map(|t| self.capacity_for(*t)).sum()
    }

    pub(crate) fn clamped(mut self) -> Self {
        self.decay_rate = self.decay_rate.max(0.0);
        self.prune_threshold = clamp_score(self.prune_threshold, 0.0, 1.0);
        self
    }
}

/// All options accepted when constructing a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub decay_rate: f64,
    pub max_nodes_per_type: usize,
    /// Per-type capacity overrides.
    pub type_limits: HashMap<NodeType, usize>,
    pub prune_threshold: f64,
    /// Upper bound on the active set.
    pub max_active: usize,
    /// Minimum cosine similarity for two same-type nodes to be duplicates.
    pub dedup_threshold: f64,
    /// Token budget applied when reading the active set.
    pub max_tokens: Option<usize>,
    /// Fraction of `max_tokens` each node type may use.
    pub type_quotas: HashMap<NodeType, f64>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
            max_nodes_per_type: DEFAULT_MAX_NODES_PER_TYPE,
            type_limits: HashMap::new(),
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            max_active: DEFAULT_MAX_ACTIVE,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            max_tokens: None,
            type_quotas: HashMap::new(),
        }
    }
}

impl GraphOptions {
    /// Parse options from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Bound the active set.
    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Set the default per-type capacity.
    pub fn with_max_nodes_per_type(mut self, max: usize) -> Self {
        self.max_nodes_per_type = max;
        self
    }

    /// Override the capacity of one node type.
    pub fn with_type_limit(mut self, node_type: NodeType, max: usize) -> Self {
        self.type_limits.insert(node_type, max);
        self
    }

    /// Set the semantic dedup threshold.
    pub fn with_dedup_threshold(mut self, threshold: f64) -> Self {
        self.dedup_threshold = threshold;
        self
    }

    /// Enable budgeted reads of the active set.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Cap one node type at `fraction` of the token budget.
    pub fn with_type_quota(mut self, node_type: NodeType, fraction: f64) -> Self {
        self.type_quotas.insert(node_type, fraction);
        self
    }

    /// Set the linear decay step.
    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = rate;
        self
    }

    /// Set the prune threshold.
    pub fn with_prune_threshold(mut self, threshold: f64) -> Self {
        self.prune_threshold = threshold;
        self
    }

    /// The persisted decay/capacity subset, clamped into range.
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            decay_rate: self.decay_rate,
            max_nodes_per_type: self.max_nodes_per_type,
            prune_threshold: self.prune_threshold,
            type_limits: self.type_limits.clone(),
        }
        .clamped()
    }

    /// Quota fractions clamped to [0, 1].
    pub(crate) fn clamped_quotas(&self) -> HashMap<NodeType, f64> {
        clamp_quotas(&self.type_quotas)
    }
}

pub(crate) fn clamp_quotas(quotas: &HashMap<NodeType, f64>) -> HashMap<NodeType, f64> {
    quotas
        .iter()
        .map(|(t, q)| (*t, clamp_score(*q, 0.0, 1.0)))
        .collect()
}
