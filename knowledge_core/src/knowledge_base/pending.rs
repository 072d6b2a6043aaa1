//! Pending queue - proposed facts and learnings awaiting approval.
//!
//! An item is either approved (it becomes a node through the normal insert
//! path, subject to quota and dedup) or rejected (discarded). Both are
//! terminal: a second attempt on the same id reports `NotFound`.

use chrono::Utc;
use memory_model::{GraphError, GraphResult, NodeId, PendingId, PendingItem, PendingKind, Proposal};
use tracing::{debug, warn};

use super::KnowledgeGraph;

impl KnowledgeGraph {
    /// Queue a proposed fact.
    pub fn add_pending_fact(&mut self, content: impl Into<String>, proposal: Proposal) -> PendingId {
        self.add_pending(PendingKind::Fact, content.into(), proposal)
    }

    /// Queue a proposed learning. Approved learnings become skill nodes.
    pub fn add_pending_learning(&mut self, content: impl Into<String>, proposal: Proposal) -> PendingId {
        self.add_pending(PendingKind::Learning, content.into(), proposal)
    }

    fn add_pending(&mut self, kind: PendingKind, content: String, proposal: Proposal) -> PendingId {
        let item = PendingItem::new(kind, content, proposal, Utc::now());
        let id = item.id.clone();
        debug!(agent_id = %self.agent_id, pending_id = %id, ?kind, "queued pending item");
        self.queue_mut(kind).push(item);
        id
    }

    /// Facts awaiting review, oldest first.
    pub fn pending_facts(&self) -> &[PendingItem] {
        &self.pending_facts
    }

    /// Learnings awaiting review, oldest first.
    pub fn pending_learnings(&self) -> &[PendingItem] {
        &self.pending_learnings
    }

    fn queue_mut(&mut self, kind: PendingKind) -> &mut Vec<PendingItem> {
        match kind {
            PendingKind::Fact => &mut self.pending_facts,
            PendingKind::Learning => &mut self.pending_learnings,
        }
    }

    fn locate_pending(&self, id: &PendingId) -> Option<(PendingKind, usize)> {
        let find = |queue: &[PendingItem]| queue.iter().position(|item| &item.id == id);
        find(&self.pending_facts)
            .map(|i| (PendingKind::Fact, i))
            .or_else(|| find(&self.pending_learnings).map(|i| (PendingKind::Learning, i)))
    }

    /// Turn a pending item into a node.
    ///
    /// The item leaves its queue only if the insert succeeds; a quota failure
    /// keeps it queued.
    pub fn approve_pending(&mut self, id: &PendingId) -> GraphResult<NodeId> {
        let (kind, index) = self
            .locate_pending(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        let data = self.queue_mut(kind)[index].to_new_node();
        let node_id = self.add_node(data)?;

        self.queue_mut(kind).remove(index);
        debug!(agent_id = %self.agent_id, pending_id = %id, node_id = %node_id, "approved pending item");
        Ok(node_id)
    }

    /// Discard a pending item.
    pub fn reject_pending(&mut self, id: &PendingId) -> GraphResult<PendingItem> {
        let (kind, index) = self
            .locate_pending(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        let item = self.queue_mut(kind).remove(index);
        debug!(agent_id = %self.agent_id, pending_id = %id, "rejected pending item");
        Ok(item)
    }

    /// Approve every queued fact. Failed items stay queued.
    pub fn approve_all_facts(&mut self) -> Vec<NodeId> {
        self.approve_all(PendingKind::Fact)
    }

    /// Approve every queued learning. Failed items stay queued.
    pub fn approve_all_learnings(&mut self) -> Vec<NodeId> {
        self.approve_all(PendingKind::Learning)
    }

    fn approve_all(&mut self, kind: PendingKind) -> Vec<NodeId> {
        let ids: Vec<PendingId> = self.queue_mut(kind).iter().map(|i| i.id.clone()).collect();

        ids.iter()
            .filter_map(|id| match self.approve_pending(id) {
                Ok(node_id) => Some(node_id),
                Err(e) => {
                    warn!(agent_id = %self.agent_id, pending_id = %id, error = %e, "pending item stays queued");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GraphOptions;
    use crate::KnowledgeGraph;
    use memory_model::{GraphError, NodeType, PendingId, Proposal};

    #[test]
    fn test_approve_fact() {
        let mut graph = KnowledgeGraph::new("agent-1");
        let pending = graph.add_pending_fact(
            "The API rate limit is 100/min",
            Proposal::default().with_confidence(0.8).with_source("docs"),
        );
        assert_eq!(graph.pending_facts().len(), 1);

        let node_id = graph.approve_pending(&pending).unwrap();
        let node = graph.get_node(&node_id).unwrap();
        assert_eq!(node.node_type, NodeType::Fact);
        assert_eq!(node.confidence, 0.8);
        assert_eq!(node.metadata_str("source"), Some("docs"));
        assert!(graph.pending_facts().is_empty());
    }

    #[test]
    fn test_approve_learning_creates_skill() {
        let mut graph = KnowledgeGraph::new("agent-1");
        let pending = graph.add_pending_learning("Prefer iterators over index loops", Proposal::default());

        let node_id = graph.approve_pending(&pending).unwrap();
        assert_eq!(graph.get_node(&node_id).unwrap().node_type, NodeType::Skill);
        assert!(graph.pending_learnings().is_empty());
    }

    #[test]
    fn test_terminal_states_report_not_found() {
        let mut graph = KnowledgeGraph::new("agent-1");
        let approved = graph.add_pending_fact("a", Proposal::default());
        let rejected = graph.add_pending_fact("b", Proposal::default());
        graph.add_pending_fact("c", Proposal::default());

        graph.approve_pending(&approved).unwrap();
        let item = graph.reject_pending(&rejected).unwrap();
        assert_eq!(item.content, "b");
        assert_eq!(graph.pending_facts().len(), 1);

        assert!(matches!(graph.approve_pending(&approved), Err(GraphError::NotFound(_))));
        assert!(matches!(graph.approve_pending(&rejected), Err(GraphError::NotFound(_))));
        assert!(matches!(graph.reject_pending(&rejected), Err(GraphError::NotFound(_))));
        assert!(matches!(
            graph.reject_pending(&PendingId::from("nope")),
            Err(GraphError::NotFound(_))
        ));
        assert_eq!(graph.pending_facts().len(), 1);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_quota_failure_keeps_item_queued() {
        let mut graph = KnowledgeGraph::with_options(
            "agent-1",
            GraphOptions::default().with_type_limit(NodeType::Fact, 1),
        );
        let first = graph.add_pending_fact("first", Proposal::default());
        let second = graph.add_pending_fact("second", Proposal::default());

        graph.approve_pending(&first).unwrap();
        assert_eq!(
            graph.approve_pending(&second),
            Err(GraphError::QuotaExceeded(NodeType::Fact))
        );
        assert_eq!(graph.pending_facts().len(), 1);
        assert_eq!(graph.pending_facts()[0].id, second);
    }

    #[test]
    fn test_approve_all() {
        let mut graph = KnowledgeGraph::new("agent-1");
        graph.add_pending_fact("one", Proposal::default());
        graph.add_pending_fact("two", Proposal::default());
        graph.add_pending_fact("ONE", Proposal::default());
        graph.add_pending_learning("three", Proposal::default());

        let created = graph.approve_all_facts();
        // The third fact dedups onto the first.
        assert_eq!(created.len(), 3);
        assert_eq!(created[0], created[2]);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.pending_facts().is_empty());
        assert_eq!(graph.pending_learnings().len(), 1);

        let learned = graph.approve_all_learnings();
        assert_eq!(learned.len(), 1);
        assert!(graph.pending_learnings().is_empty());
    }
}
