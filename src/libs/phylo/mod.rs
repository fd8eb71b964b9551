pub mod coalescence;
pub mod error;
pub mod guided_nj;
pub mod join_cost;
pub mod node;
pub mod normalize;
pub mod parser;
pub mod reconcile;
pub mod species;
pub mod tree;

pub use error::TreeError;
pub use node::{Node, NodeId, SENTINEL_LENGTH};
pub use tree::Tree;
