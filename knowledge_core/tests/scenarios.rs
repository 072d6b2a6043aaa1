//! End-to-end behaviour of the knowledge graph through its public API.

use chrono::Utc;
use knowledge_core::{
    select_by_token_budget, ActiveSetOptions, CascadeOptions, EdgeOptions, GraphError,
    GraphOptions, KnowledgeGraph, NewNode, Node, NodeId, NodeType, Proposal, Relationship,
    SearchOptions,
};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness; filter with `RUST_LOG`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fact(content: &str, relevance: f64) -> NewNode {
    NewNode::new(NodeType::Fact, content).with_relevance(relevance)
}

fn sized(node_type: NodeType, tokens: usize, relevance: f64, tag: char) -> Node {
    let content: String = std::iter::repeat(tag).take(tokens * 4).collect();
    Node::from_new(
        NodeId::new(),
        NewNode::new(node_type, content).with_relevance(relevance),
        Utc::now(),
    )
}

#[test]
fn active_set_keeps_most_relevant_within_bound() {
    init_logging();
    let mut graph =
        KnowledgeGraph::with_options("agent-a", GraphOptions::default().with_max_active(2));
    let high = graph.add_node(fact("first", 0.9)).unwrap();
    let low = graph.add_node(fact("second", 0.5)).unwrap();
    let mid = graph.add_node(fact("third", 0.7)).unwrap();

    let active: Vec<NodeId> = graph
        .active_set(&ActiveSetOptions::default())
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(active, vec![high, mid]);
    assert!(!graph.active_ids().contains(&low));
    assert!(graph.contains(&low));
}

#[test]
fn cascade_recall_halves_boost_per_hop() {
    init_logging();
    let mut graph = KnowledgeGraph::new("agent-b");
    let n1 = graph.add_node(fact("n1", 0.0)).unwrap();
    let n2 = graph.add_node(fact("n2", 0.0)).unwrap();
    let n3 = graph.add_node(fact("n3", 0.0)).unwrap();
    graph.add_edge(&n1, &n2, Relationship::Causes, EdgeOptions::default()).unwrap();
    graph.add_edge(&n2, &n3, Relationship::Causes, EdgeOptions::default()).unwrap();

    let options = CascadeOptions {
        decay_factor: 0.5,
        max_depth: 2,
        ..CascadeOptions::default()
    };
    let applied = graph.cascade_recall(&n1, 1.0, &options);

    assert_eq!(applied, vec![(n1.clone(), 1.0), (n2.clone(), 0.5), (n3.clone(), 0.25)]);
    assert_eq!(graph.get_node(&n1).unwrap().relevance, 1.0);
    assert_eq!(graph.get_node(&n2).unwrap().relevance, 0.5);
    assert_eq!(graph.get_node(&n3).unwrap().relevance, 0.25);
}

#[test]
fn token_budget_respects_type_quota() {
    let fact_high = sized(NodeType::Fact, 40, 0.9, 'a');
    let fact_next = sized(NodeType::Fact, 20, 0.8, 'b');
    let goal = sized(NodeType::Goal, 40, 0.3, 'c');
    let quotas = HashMap::from([(NodeType::Fact, 0.5)]);

    let selected = select_by_token_budget(vec![&goal, &fact_next, &fact_high], 100, &quotas);

    let fact_tokens: usize = selected
        .iter()
        .filter(|n| n.node_type == NodeType::Fact)
        .map(|n| n.token_cost())
        .sum();
    assert!(fact_tokens <= 50);
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].id, fact_high.id);
    assert_eq!(selected[1].id, goal.id);
}

#[test]
fn approving_a_resolved_item_is_not_found() {
    init_logging();
    let mut graph = KnowledgeGraph::new("agent-d");
    let approved = graph.add_pending_fact("Builds run nightly", Proposal::default());
    let rejected = graph.add_pending_fact("Builds never run", Proposal::default());
    graph.add_pending_fact("Still waiting", Proposal::default());

    graph.approve_pending(&approved).unwrap();
    graph.reject_pending(&rejected).unwrap();
    assert_eq!(graph.pending_facts().len(), 1);

    assert!(matches!(graph.approve_pending(&approved), Err(GraphError::NotFound(_))));
    assert!(matches!(graph.approve_pending(&rejected), Err(GraphError::NotFound(_))));
    assert_eq!(graph.pending_facts().len(), 1);
}

#[test]
fn repeated_inserts_converge_on_one_node() {
    let mut graph = KnowledgeGraph::new("agent-e");
    let first = graph.add_node(fact("Prefer small pull requests", 0.2)).unwrap();
    for _ in 0..20 {
        let again = graph.add_node(fact("  prefer SMALL pull requests ", 0.2)).unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.get_node(&first).unwrap().relevance, 1.0);
}

#[test]
fn full_type_rejects_before_dedup() {
    let mut graph = KnowledgeGraph::with_options(
        "agent-f",
        GraphOptions::default().with_max_nodes_per_type(1),
    );
    graph.add_node(fact("only one", 0.5)).unwrap();
    assert_eq!(
        graph.add_node(fact("only one", 0.5)),
        Err(GraphError::QuotaExceeded(NodeType::Fact))
    );
}

#[test]
fn snapshot_round_trip_preserves_structure() {
    init_logging();
    let mut graph = KnowledgeGraph::with_options(
        "agent-g",
        GraphOptions::default()
            .with_max_active(3)
            .with_max_tokens(200)
            .with_type_quota(NodeType::Fact, 0.5),
    );
    let a = graph.add_node(fact("Service A calls service B", 0.8)).unwrap();
    let b = graph
        .add_node(NewNode::new(NodeType::Relationship, "Service B").with_metadata("name", "svc-b"))
        .unwrap();
    graph.add_edge(&a, &b, Relationship::RelatesTo, EdgeOptions::default()).unwrap();
    graph.add_pending_learning("Retry with backoff", Proposal::default().with_source("incident"));

    let restored = KnowledgeGraph::from_map(graph.to_map().unwrap()).unwrap();

    assert_eq!(restored.agent_id(), "agent-g");
    assert_eq!(restored.node_count(), 2);
    assert_eq!(restored.edge_count(), 1);
    assert_eq!(restored.active_ids(), graph.active_ids());
    assert_eq!(restored.pending_learnings().len(), 1);
    assert_eq!(restored.max_tokens(), Some(200));
    assert_eq!(restored.type_quotas().get(&NodeType::Fact), Some(&0.5));
    assert_eq!(
        restored.get_node(&b).unwrap().metadata_str("name"),
        Some("svc-b")
    );
    assert_eq!(restored.outgoing_edges(&a)[0].target_id, b);
}

#[test]
fn recall_after_maintenance() {
    init_logging();
    let mut graph = KnowledgeGraph::new("agent-h");
    graph.add_node(fact("Deploy window is Tuesday", 0.9)).unwrap();
    graph.add_node(fact("Deploy freeze in December", 0.05)).unwrap();

    graph.prune(0.1);

    let hits = graph.recall("deploy", &SearchOptions::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "Deploy window is Tuesday");
}
