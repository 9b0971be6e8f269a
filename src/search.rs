//! Game-tree search: proof-number search over an arena-backed tree.

pub mod pns;
pub mod pns_tree;

pub use pns::{MoveStat, PnsParams, PnsResult, PnsSearch, PnsType};
pub use pns_tree::{PnsNode, PnsTree, INF_NODES};
