//! Knowledge Base module - the node/edge store and everything that writes to it.
//!
//! - **graph**: the [`KnowledgeGraph`] aggregate with node and edge CRUD
//! - **dedup**: semantic and exact duplicate detection on insert
//! - **pending**: the propose/approve/reject queue for facts and learnings
//! - **snapshot**: `to_map` / `from_map` for the external durable store

mod dedup;
mod graph;
mod pending;
mod snapshot;

pub use dedup::*;
pub use graph::*;
pub use snapshot::*;
