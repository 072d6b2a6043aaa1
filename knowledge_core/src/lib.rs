//! # Knowledge Core (The Cortex)
//!
//! Long-term memory for a single agent. Knowledge lives in a typed,
//! weighted graph whose nodes fade unless they are used, and whose most
//! relevant part is packed into a token budget for prompt assembly.
//!
//! ## Core Components
//!
//! - **knowledge_base**: The node/edge store, dedup, pending proposals and snapshots
//! - **context_assembler**: The active set, reinforcement, spreading activation and budgeted selection
//! - **decay**: Linear and exponential decay, pruning and archival
//! - **search**: Keyword recall, hybrid semantic search and multi-hop traversal
//! - **providers**: Optional embedding and archival-signal collaborators
//! - **config**: Tunables, loadable from TOML
//!
//! ## Design Philosophy
//!
//! - **Owned State**: A graph is a plain value; persistence is a snapshot away
//! - **Graceful Degradation**: Missing or failing collaborators never fail a write
//! - **Bounded**: Per-type capacity, a bounded active set and a token budget keep memory finite

pub mod config;
pub mod context_assembler;
pub mod decay;
pub mod knowledge_base;
pub mod providers;
pub mod search;

pub use config::*;
pub use context_assembler::*;
pub use decay::*;
pub use knowledge_base::*;
pub use providers::*;
pub use search::*;

pub use memory_model::*;

#[cfg(test)]
pub(crate) mod test_support;
