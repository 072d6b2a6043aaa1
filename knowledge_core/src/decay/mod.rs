//! Decay Engine - relevance decay and pruning.
//!
//! Two decay models are available:
//! - **Linear** ([`KnowledgeGraph::decay`]): subtract `decay_rate`, floored at 0.0
//! - **Exponential** ([`KnowledgeGraph::apply_decay`]):
//!   `relevance * e^(-lambda * days_since_last_access)`, floored at `MIN_RELEVANCE`
//!
//! Pinned nodes are exempt from both, and from pruning. Every operation here
//! is total: it never fails, whatever state the graph is in.

mod archive;

pub use archive::*;

use chrono::{DateTime, Utc};
use memory_model::{clamp_score, NodeId, MIN_RELEVANCE};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::knowledge_base::KnowledgeGraph;

/// Options for exponential decay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayOptions {
    /// Decay constant per day; defaults to the graph's `decay_rate`.
    pub lambda: Option<f64>,
    /// Reference time; defaults to now.
    pub now: Option<DateTime<Utc>>,
    /// Nodes exempt from this pass, in addition to pinned ones.
    pub protected: HashSet<NodeId>,
}

impl DecayOptions {
    /// Override the decay constant.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = Some(lambda);
        self
    }

    /// Decay as of this instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Exempt a node from this pass.
    pub fn protect(mut self, id: NodeId) -> Self {
        self.protected.insert(id);
        self
    }
}

impl KnowledgeGraph {
    /// Linear decay: subtract `decay_rate` from every unpinned node.
    ///
    /// Returns the number of nodes decayed.
    pub fn decay(&mut self) -> usize {
        let rate = self.config.decay_rate;
        let mut decayed = 0;
        for node in self.nodes.values_mut().filter(|n| !n.pinned) {
            node.relevance = clamp_score(node.relevance - rate, 0.0, 1.0);
            decayed += 1;
        }
        debug!(agent_id = %self.agent_id, decayed, rate, "linear decay");
        decayed
    }

    /// Exponential, time-based decay followed by an active-set refresh.
    ///
    /// Returns the number of nodes decayed.
    pub fn apply_decay(&mut self, options: &DecayOptions) -> usize {
        let lambda = options.lambda.unwrap_or(self.config.decay_rate).max(0.0);
        let now = options.now.unwrap_or_else(Utc::now);

        let mut decayed = 0;
        for node in self
            .nodes
            .values_mut()
            .filter(|n| !n.pinned && !options.protected.contains(&n.id))
        {
            let days = node.days_since_access(now);
            node.relevance = clamp_score(node.relevance * (-lambda * days).exp(), MIN_RELEVANCE, 1.0);
            decayed += 1;
        }

        self.last_decay_at = Some(now);
        self.refresh_active_set();
        debug!(agent_id = %self.agent_id, decayed, lambda, "exponential decay");
        decayed
    }

    /// Ids of unpinned nodes below `threshold`.
    pub(crate) fn prune_candidates(&self, threshold: f64) -> HashSet<NodeId> {
        self.nodes
            .values()
            .filter(|n| !n.pinned && n.relevance < threshold)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Remove every unpinned node below `threshold`, with its edges and
    /// active-set entry. Returns the number of nodes removed.
    pub fn prune(&mut self, threshold: f64) -> usize {
        let doomed = self.prune_candidates(threshold);
        if doomed.is_empty() {
            return 0;
        }
        let pruned = self.detach_nodes(&doomed).len();
        info!(agent_id = %self.agent_id, pruned, threshold, "pruned nodes");
        pruned
    }
}
