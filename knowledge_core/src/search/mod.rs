//! Read-only recall over the graph: keyword recall, hybrid semantic search,
//! and relationship traversal.

mod traversal;

pub use traversal::*;

use memory_model::{Node, NodeType};
use serde::Serialize;

use crate::knowledge_base::{cosine_similarity, KnowledgeGraph};

/// Weight of embedding similarity in the hybrid score.
pub const SEMANTIC_WEIGHT: f64 = 0.7;
/// Weight of keyword overlap in the hybrid score.
pub const KEYWORD_WEIGHT: f64 = 0.3;

const DEFAULT_LIMIT: usize = 10;

/// Filters shared by [`KnowledgeGraph::recall`] and
/// [`KnowledgeGraph::semantic_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Restrict to these types; empty means all.
    pub types: Vec<NodeType>,
    pub min_relevance: f64,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            min_relevance: 0.0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchOptions {
    /// Admit this node type. Repeatable.
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.types.push(node_type);
        self
    }

    /// Skip nodes below this relevance.
    pub fn with_min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    /// Return at most `limit` results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn admits(&self, node: &Node) -> bool {
        (self.types.is_empty() || self.types.contains(&node.node_type))
            && node.relevance >= self.min_relevance
    }
}

/// A scored search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    pub node: &'a Node,
    pub score: f64,
}

/// Fraction of whitespace-separated query terms found in `content`,
/// case-insensitively.
pub fn keyword_overlap(query: &str, content: &str) -> f64 {
    let content = content.to_lowercase();
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return 0.0;
    }
    let hits = terms.iter().filter(|t| content.contains(t.as_str())).count();
    hits as f64 / terms.len() as f64
}

impl KnowledgeGraph {
    /// Case-insensitive substring match on content, highest relevance first.
    pub fn recall(&self, query: &str, options: &SearchOptions) -> Vec<&Node> {
        let needle = query.to_lowercase();
        let mut matches: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| options.admits(n))
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(options.limit);
        matches
    }

    /// Hybrid search: `0.7 * cosine + 0.3 * keyword overlap` for nodes with
    /// embeddings when the query can be embedded, keyword overlap alone
    /// otherwise. Non-positive scores are dropped.
    pub fn semantic_search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit<'_>> {
        let query_embedding = self.embed(query);

        let mut hits: Vec<SearchHit<'_>> = self
            .nodes
            .values()
            .filter(|n| options.admits(n))
            .filter_map(|node| {
                let keyword = keyword_overlap(query, &node.content);
                let score = match (query_embedding.as_deref(), node.embedding.as_deref()) {
                    (Some(q), Some(e)) => {
                        SEMANTIC_WEIGHT * cosine_similarity(q, e) + KEYWORD_WEIGHT * keyword
                    }
                    _ => keyword,
                };
                (score > 0.0).then_some(SearchHit { node, score })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(options.limit);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticEmbedder;
    use memory_model::NewNode;
    use std::sync::Arc;

    fn add(graph: &mut KnowledgeGraph, node_type: NodeType, content: &str, relevance: f64) {
        graph
            .add_node(NewNode::new(node_type, content).with_relevance(relevance))
            .unwrap();
    }

    #[test]
    fn test_keyword_overlap() {
        assert_eq!(keyword_overlap("Rust borrow", "the rust borrow checker"), 1.0);
        assert_eq!(keyword_overlap("rust python", "rust only"), 0.5);
        assert_eq!(keyword_overlap("", "anything"), 0.0);
    }

    #[test]
    fn test_recall_filters_and_orders() {
        let mut graph = KnowledgeGraph::new("agent-1");
        add(&mut graph, NodeType::Fact, "Deploys go through staging", 0.4);
        add(&mut graph, NodeType::Fact, "Staging mirrors production", 0.9);
        add(&mut graph, NodeType::Skill, "Roll back staging with one command", 0.7);
        add(&mut graph, NodeType::Fact, "Unrelated note", 1.0);

        let all = graph.recall("STAGING", &SearchOptions::default());
        let contents: Vec<&str> = all.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "Staging mirrors production",
                "Roll back staging with one command",
                "Deploys go through staging"
            ]
        );

        let facts = graph.recall(
            "staging",
            &SearchOptions::default()
                .with_type(NodeType::Fact)
                .with_min_relevance(0.5),
        );
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].content, "Staging mirrors production");

        let limited = graph.recall("staging", &SearchOptions::default().with_limit(2));
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_semantic_search_keyword_fallback() {
        let mut graph = KnowledgeGraph::new("agent-1");
        add(&mut graph, NodeType::Fact, "The database uses postgres", 0.5);
        add(&mut graph, NodeType::Fact, "The cache uses redis", 0.5);
        add(&mut graph, NodeType::Fact, "Nothing in common", 0.5);

        let hits = graph.semantic_search("postgres database", &SearchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node.content, "The database uses postgres");
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn test_semantic_search_hybrid_scoring() {
        let embedder = StaticEmbedder::new()
            .with("Cats purr when content", vec![1.0, 0.0])
            .with("Dogs bark at strangers", vec![0.0, 1.0])
            .with("feline happiness", vec![1.0, 0.0]);
        let mut graph = KnowledgeGraph::new("agent-1").with_embedder(Arc::new(embedder));
        add(&mut graph, NodeType::Fact, "Cats purr when content", 0.5);
        add(&mut graph, NodeType::Fact, "Dogs bark at strangers", 0.5);

        let hits = graph.semantic_search("feline happiness", &SearchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node.content, "Cats purr when content");
        assert!((hits[0].score - 0.7).abs() < 1e-9);
    }
}
