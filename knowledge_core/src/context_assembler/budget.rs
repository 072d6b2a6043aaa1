//! Greedy token-budget packing with per-type quotas.

use memory_model::{Node, NodeType};
use std::collections::HashMap;

/// Pack nodes into `max_tokens`, highest relevance first.
///
/// A node is skipped when it would overflow the total budget or its type's
/// ceiling (`max_tokens * quota`); packing then continues with the next
/// node. This is a single greedy pass, not an optimal knapsack: a skipped
/// high-relevance node is never revisited. Types without a quota are only
/// bound by the total budget.
pub fn select_by_token_budget<'a>(
    mut nodes: Vec<&'a Node>,
    max_tokens: usize,
    type_quotas: &HashMap<NodeType, f64>,
) -> Vec<&'a Node> {
    nodes.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut used = 0usize;
    let mut used_by_type: HashMap<NodeType, usize> = HashMap::new();
    let mut selected = Vec::new();

    for node in nodes {
        let cost = node.token_cost();
        if used + cost > max_tokens {
            continue;
        }

        let type_used = used_by_type.get(&node.node_type).copied().unwrap_or(0);
        if let Some(quota) = type_quotas.get(&node.node_type) {
            let ceiling = max_tokens as f64 * quota;
            if (type_used + cost) as f64 > ceiling {
                continue;
            }
        }

        used += cost;
        used_by_type.insert(node.node_type, type_used + cost);
        selected.push(node);
    }

    selected
}
