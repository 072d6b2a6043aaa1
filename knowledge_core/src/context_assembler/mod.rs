//! Context Assembler - decides which knowledge the agent is currently "thinking about".
//!
//! The active set is an ordered list of node ids maintained incrementally:
//! 1. **Touch**: every create, reinforce or boost moves the node to the front
//! 2. **Evict**: past `max_active`, the lowest-relevance member is dropped
//! 3. **Refresh**: a full recompute after decay re-ranks from scratch
//! 4. **Select**: reads return the set by relevance, optionally packed into a
//!    token budget with per-type quotas

mod activation;
mod budget;

pub use activation::*;
pub use budget::*;

use memory_model::{Node, NodeId, NodeType, MIN_RELEVANCE};
use std::collections::HashMap;

use crate::knowledge_base::KnowledgeGraph;

/// Per-call overrides for reading the active set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSetOptions {
    /// Overrides the graph's configured token budget.
    pub max_tokens: Option<usize>,
    /// Overrides the graph's configured type quotas.
    pub type_quotas: Option<HashMap<NodeType, f64>>,
}

impl ActiveSetOptions {
    /// Pack into this many tokens.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Use these per-type quotas instead of the configured ones.
    pub fn with_type_quotas(mut self, quotas: HashMap<NodeType, f64>) -> Self {
        self.type_quotas = Some(quotas);
        self
    }
}

fn by_relevance_desc(a: &&Node, b: &&Node) -> std::cmp::Ordering {
    b.relevance
        .partial_cmp(&a.relevance)
        .unwrap_or(std::cmp::Ordering::Equal)
}

impl KnowledgeGraph {
    /// Move `id` to the front of the active set, evicting the lowest-relevance
    /// member when the set outgrows `max_active`.
    pub(crate) fn touch_active(&mut self, id: &NodeId) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.active_set.retain(|a| a != id);
        self.active_set.insert(0, id.clone());

        while self.active_set.len() > self.max_active {
            let mut ranked: Vec<&Node> = self
                .active_set
                .iter()
                .filter_map(|a| self.nodes.get(a))
                .collect();
            ranked.sort_by(by_relevance_desc);

            let Some(evicted) = ranked.last().map(|n| n.id.clone()) else {
                self.active_set.clear();
                break;
            };
            self.active_set.retain(|a| a != &evicted);
        }
    }

    /// Recompute the active set from scratch: every node at or above
    /// `MIN_RELEVANCE`, highest relevance first, at most `max_active`.
    pub fn refresh_active_set(&mut self) {
        let mut ranked: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.relevance >= MIN_RELEVANCE)
            .collect();
        ranked.sort_by(by_relevance_desc);

        self.active_set = ranked
            .into_iter()
            .take(self.max_active)
            .map(|n| n.id.clone())
            .collect();
    }

    /// The active set, highest relevance first.
    ///
    /// When a token budget is configured or supplied, the result is packed
    /// with [`select_by_token_budget`].
    pub fn active_set(&self, options: &ActiveSetOptions) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .active_set
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect();
        nodes.sort_by(by_relevance_desc);

        match options.max_tokens.or(self.max_tokens) {
            Some(max_tokens) => {
                let quotas = options
                    .type_quotas
                    .as_ref()
                    .map(crate::config::clamp_quotas)
                    .unwrap_or_else(|| self.type_quotas.clone());
                select_by_token_budget(nodes, max_tokens, &quotas)
            }
            None => nodes,
        }
    }

    /// Render the selected active set as prompt-ready markdown, grouped by
    /// node type in declaration order.
    pub fn render_active_context(&self, options: &ActiveSetOptions) -> String {
        let selected = self.active_set(options);
        if selected.is_empty() {
            return String::new();
        }

        let mut prompt = String::from("## Knowledge\n");
        for node_type in NodeType::ALL {
            let group: Vec<&&Node> = selected.iter().filter(|n| n.node_type == node_type).collect();
            if group.is_empty() {
                continue;
            }
            prompt.push_str(&format!("### {}\n", node_type));
            for node in group {
                prompt.push_str(&format!("- {} (relevance {:.2})\n", node.content, node.relevance));
            }
        }
        prompt
    }
}
