//! Reinforcement and spreading activation.

use chrono::Utc;
use memory_model::{clamp_score, GraphError, GraphResult, NodeId, MIN_RELEVANCE, REINFORCE_BOOST};
use std::collections::HashSet;
use tracing::debug;

use crate::knowledge_base::KnowledgeGraph;

/// Configuration for a cascade recall.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOptions {
    /// Multiplier applied to the boost at each hop (0.0-1.0).
    pub decay_factor: f64,

    /// Maximum number of hops from the starting node.
    pub max_depth: u32,

    /// Spreading stops once the boost falls below this.
    pub min_boost: f64,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            decay_factor: 0.5,
            max_depth: 3,
            min_boost: 0.05,
        }
    }
}

impl KnowledgeGraph {
    /// Record an access: bumps `access_count`, refreshes `last_accessed` and
    /// raises relevance by a fixed 0.15 (capped at 1.0).
    pub fn reinforce(&mut self, id: &NodeId) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        node.access_count += 1;
        node.last_accessed = Utc::now();
        node.relevance = clamp_score(node.relevance + REINFORCE_BOOST, MIN_RELEVANCE, 1.0);

        self.touch_active(id);
        Ok(())
    }

    /// Shift a node's relevance by `amount`, clamped to
    /// [`MIN_RELEVANCE`, 1.0]. A NaN amount leaves relevance unchanged.
    /// Returns `false`, changing nothing, when the node does not exist.
    pub fn boost_node(&mut self, id: &NodeId, amount: f64) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if !amount.is_nan() {
            node.relevance = clamp_score(node.relevance + amount, MIN_RELEVANCE, 1.0);
        }
        self.touch_active(id);
        true
    }

    /// Spreading activation from `id`.
    ///
    /// # Algorithm
    ///
    /// 1. Boost the starting node by `boost`, unconditionally
    /// 2. Breadth-first, for each hop:
    ///    a. Multiply the amount by `decay_factor`
    ///    b. Collect unvisited neighbours over outgoing and incoming edges
    ///    c. Boost each by the current amount
    /// 3. Stop at `max_depth`, when the amount drops below `min_boost`, or
    ///    when no unvisited neighbours remain
    ///
    /// Each node is boosted at most once per call, so cycles terminate.
    /// Returns the boost applied to every reached node, in visit order.
    pub fn cascade_recall(
        &mut self,
        id: &NodeId,
        boost: f64,
        options: &CascadeOptions,
    ) -> Vec<(NodeId, f64)> {
        if !self.boost_node(id, boost) {
            return Vec::new();
        }

        let mut visited: HashSet<NodeId> = HashSet::from([id.clone()]);
        let mut frontier = vec![id.clone()];
        let mut applied = vec![(id.clone(), boost)];
        let mut amount = boost;
        let mut depth = 0;

        while depth < options.max_depth {
            amount *= options.decay_factor;
            if amount < options.min_boost {
                break;
            }

            let mut next = Vec::new();
            for node_id in &frontier {
                for neighbor in self.neighbors(node_id, None) {
                    if visited.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }

            for node_id in &next {
                self.boost_node(node_id, amount);
                applied.push((node_id.clone(), amount));
            }
            frontier = next;
            depth += 1;
        }

        debug!(agent_id = %self.agent_id, start = %id, reached = applied.len(), depth, "cascade recall");
        applied
    }
}
