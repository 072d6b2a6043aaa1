//! # Memory Model
//!
//! The data model crate for the agent knowledge graph. It defines what a
//! knowledge node, an edge, and a pending proposal look like, and the error
//! taxonomy shared by every graph operation. It contains no graph logic.

pub mod constants;
pub mod edge;
pub mod error;
pub mod node;
pub mod pending;
pub mod tokens;

pub use constants::*;
pub use edge::*;
pub use error::*;
pub use node::*;
pub use pending::*;
pub use tokens::*;
