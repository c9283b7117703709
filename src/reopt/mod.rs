//! Reoptimization tree (§4.8): a persistent, compressed fragment of a prior
//! search tree plus a trie of previously captured feasible solutions, both
//! keyed so a later solve of a related problem (typically after an
//! objective change) can reuse pruning and feasibility work instead of
//! starting cold.
//!
//! Submodule layout mirrors the split in [`crate::lp`]: node-local data
//! ([`node`]), the tree that owns the node arena and the operations that
//! need to see more than one node at a time ([`tree`]), the solution trie
//! ([`soltree`]), and the restart-policy parameters ([`params`]).

pub mod node;
pub mod params;
pub mod soltree;
pub mod tree;

pub use node::{
    BoundType, BranchingPath, DualBoundChangeCons, LocalConstraint, NodeId, ReoptNode, ReoptType,
};
pub use params::{ReoptParams, RestartDecision, RestartReason};
pub use soltree::SolTree;
pub use tree::ReoptTree;
