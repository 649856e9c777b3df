//! Hierarchical chart of accounts: coding rules, nodes, and resolution

pub mod code;
pub mod index;
pub mod manager;
pub mod node;

pub use code::*;
pub use index::*;
pub use manager::*;
pub use node::*;
