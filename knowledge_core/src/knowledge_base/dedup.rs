//! Duplicate detection for inserts: semantic when embeddings exist, exact otherwise.

use memory_model::{Metadata, NodeId, NodeType};

use super::KnowledgeGraph;

/// Cosine similarity between two vectors.
/// Returns 0.0 for mismatched lengths, empty or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// The text embedded for a node: content, type tag, and the optional
/// `name` / `description` metadata fields.
pub fn dedup_text(node_type: NodeType, content: &str, metadata: &Metadata) -> String {
    let mut text = format!("{content} [{node_type}]");
    for key in ["name", "description"] {
        if let Some(value) = metadata.get(key).and_then(|v| v.as_str()) {
            text.push_str(&format!(" {key}: {value}"));
        }
    }
    text
}

impl KnowledgeGraph {
    /// Find an existing same-type node that `content` duplicates.
    ///
    /// With an embedding, the most similar node at or above the dedup
    /// threshold wins. Without one, or without a semantic match, falls back to
    /// case-insensitive content equality.
    pub fn find_duplicate(
        &self,
        node_type: NodeType,
        content: &str,
        embedding: Option<&[f32]>,
    ) -> Option<NodeId> {
        let same_type = || self.nodes.values().filter(move |n| n.node_type == node_type);

        if let Some(query) = embedding {
            let best = same_type()
                .filter_map(|n| {
                    n.embedding
                        .as_deref()
                        .map(|e| (n, cosine_similarity(query, e)))
                })
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            if let Some((node, similarity)) = best {
                if similarity >= self.dedup_threshold {
                    return Some(node.id.clone());
                }
            }
        }

        let needle = content.trim().to_lowercase();
        same_type()
            .find(|n| n.content.trim().to_lowercase() == needle)
            .map(|n| n.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_model::NewNode;

    #[test]
    fn test_identical_vectors_have_similarity_one() {
        let v = vec![1.0f32, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_vectors_have_similarity_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_vectors_return_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_dedup_text_includes_name_and_description() {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), "deploys".into());
        metadata.insert("description".to_string(), "release cadence".into());
        metadata.insert("owner".to_string(), "ops".into());

        let text = dedup_text(NodeType::Skill, "Deploy on tuesdays", &metadata);
        assert_eq!(
            text,
            "Deploy on tuesdays [skill] name: deploys description: release cadence"
        );
    }

    #[test]
    fn test_exact_match_ignores_case_and_padding() {
        let mut graph = KnowledgeGraph::new("agent-1");
        let id = graph
            .add_node(NewNode::new(NodeType::Insight, "Caching hides latency"))
            .unwrap();

        assert_eq!(
            graph.find_duplicate(NodeType::Insight, "  caching HIDES latency ", None),
            Some(id)
        );
        assert_eq!(
            graph.find_duplicate(NodeType::Fact, "caching hides latency", None),
            None
        );
    }

    #[test]
    fn test_below_threshold_falls_back_to_exact() {
        let mut graph = KnowledgeGraph::new("agent-1");
        let id = graph
            .add_node(NewNode::new(NodeType::Fact, "alpha"))
            .unwrap();
        graph.nodes.get_mut(&id).unwrap().embedding = Some(vec![1.0, 0.0]);

        // Dissimilar vector, identical text.
        assert_eq!(
            graph.find_duplicate(NodeType::Fact, "ALPHA", Some(&[0.0, 1.0][..])),
            Some(id.clone())
        );
        // Dissimilar vector, different text.
        assert_eq!(
            graph.find_duplicate(NodeType::Fact, "beta", Some(&[0.0, 1.0][..])),
            None
        );
        // Similar vector, different text.
        assert_eq!(
            graph.find_duplicate(NodeType::Fact, "beta", Some(&[0.9, 0.05][..])),
            Some(id)
        );
    }
}
