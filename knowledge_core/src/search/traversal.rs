//! Multi-hop relationship traversal.

use memory_model::{GraphError, GraphResult, Node, NodeId, Relationship};
use std::collections::HashSet;

use crate::knowledge_base::KnowledgeGraph;

/// Options for [`KnowledgeGraph::find_related`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedOptions {
    /// Maximum number of hops.
    pub depth: u32,
    /// Only follow edges of this relationship.
    pub relationship: Option<Relationship>,
}

impl Default for RelatedOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            relationship: None,
        }
    }
}

impl RelatedOptions {
    /// Follow at most `depth` hops.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Only follow edges of this relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }
}

impl KnowledgeGraph {
    /// Nodes one hop away in either direction, outgoing first.
    pub(crate) fn neighbors(&self, id: &NodeId, relationship: Option<Relationship>) -> Vec<NodeId> {
        let matches = |r: Relationship| relationship.map_or(true, |wanted| wanted == r);

        let outgoing = self
            .outgoing_edges(id)
            .iter()
            .filter(|e| matches(e.relationship))
            .map(|e| e.target_id.clone());

        let incoming = self
            .incoming_edges(id)
            .into_iter()
            .filter(|e| matches(e.relationship))
            .map(|e| e.source_id.clone());

        outgoing.chain(incoming).collect()
    }

    /// Breadth-first search over both edge directions up to `depth` hops.
    ///
    /// The start node is excluded; results are sorted by relevance, highest
    /// first.
    pub fn find_related(&self, id: &NodeId, options: &RelatedOptions) -> GraphResult<Vec<&Node>> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.to_string()));
        }

        let mut visited: HashSet<NodeId> = HashSet::from([id.clone()]);
        let mut frontier = vec![id.clone()];
        let mut found = Vec::new();

        for _depth in 0..options.depth {
            let mut next = Vec::new();
            for node_id in &frontier {
                for neighbor in self.neighbors(node_id, options.relationship) {
                    if visited.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            found.extend(next.iter().cloned());
            frontier = next;
        }

        let mut related: Vec<&Node> = found.iter().filter_map(|n| self.nodes.get(n)).collect();
        related.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(related)
    }
}
