//! Node-local data for the reoptimization tree (§4.8 "Node operations").
//!
//! A [`ReoptNode`] never references another node by pointer: like
//! [`crate::lp::column::ColId`]/[`crate::lp::row::RowId`], nodes are
//! addressed by a stable [`NodeId`] into the tree's own arena, and the
//! parent/child relationship is just `NodeId`s stored in each node.

use crate::E;
use crate::variable::VarId;

/// Stable identifier for a node within a [`crate::reopt::ReoptTree`]'s
/// arena. Index `0` is reserved for the root (§4 data model). Ids are
/// recycled via the tree's free-id queue once a node is shrunk away or its
/// subtree is deleted, so this is not a monotone counter the way
/// [`crate::stat::Stat`]'s column/row indices are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Which side of a variable's range a branching or dual-fixing entry
/// constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    Lower,
    Upper,
}

/// A branching-path prefix relative to a node's stored parent, after
/// variable transformation into the original (non-aggregated,
/// non-negated) space (§3 `ReoptTree`).
///
/// The three arrays are parallel and always the same length: entry `i` is
/// "`vars[i]` has its `boundtypes[i]` bound tightened to `bounds[i]`".
#[derive(Debug, Clone, Default)]
pub struct BranchingPath {
    pub vars: Vec<VarId>,
    pub bounds: Vec<E>,
    pub boundtypes: Vec<BoundType>,
}

impl BranchingPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn push(&mut self, var: VarId, bound: E, boundtype: BoundType) {
        self.vars.push(var);
        self.bounds.push(bound);
        self.boundtypes.push(boundtype);
    }

    /// Appends every entry of `other` to `self`, used when a shrunk node's
    /// path is folded into its ancestor (§4.8 `shrinkNode`).
    pub fn extend(&mut self, other: &BranchingPath) {
        self.vars.extend_from_slice(&other.vars);
        self.bounds.extend_from_slice(&other.bounds);
        self.boundtypes.extend(other.boundtypes.iter().copied());
    }
}

/// A disjunctive "at least one of these bound choices must differ"
/// constraint induced by a strong-branching cutoff (§4.8 "Dual-bound-change
/// constraints"), stored on the negated literals of the branching
/// candidates it was derived from.
#[derive(Debug, Clone, Default)]
pub struct DualBoundChangeCons {
    pub vars: Vec<VarId>,
    pub bounds: Vec<E>,
    pub boundtypes: Vec<BoundType>,
}

impl DualBoundChangeCons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A local constraint recorded on a node (§3 `ReoptTree`, §6 "local
/// constraints"), stored opaquely as a logicor-style disjunction over
/// literals in the same `(var, bound, boundtype)` shape used for branching
/// and dual-bound-change entries — the core does not interpret the
/// constraint's semantics, only stores and replays it.
#[derive(Debug, Clone)]
pub struct LocalConstraint {
    pub vars: Vec<VarId>,
    pub bounds: Vec<E>,
    pub boundtypes: Vec<BoundType>,
}

/// The role a saved node plays in the reoptimization tree, determining how
/// it is restored on a later solve (§3, §4.8, GLOSSARY "Node `reopttype`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReoptType {
    /// Not yet classified.
    None,
    /// An internal node the search merely passed through.
    Transit,
    /// A transit node additionally carrying a logicor-style local
    /// constraint.
    LogicorNode,
    /// A leaf of the prior search (no further children were explored).
    Leaf,
    /// Pruned by bound; the subtree remains valid for the relaxation.
    Pruned,
    /// A feasible solution was found at or below this node.
    Feasible,
    /// Strong branching ran at this node and induced a dual-bound-change
    /// disjunction.
    StrBranched,
    /// The entire subtree below this node was proven infeasible or
    /// dominated and has been discarded.
    InfSubtree,
    /// The node itself (not just its subtree) is infeasible.
    Infeasible,
}

/// One stored fragment of a prior search tree (§3 `ReoptTree`).
#[derive(Debug, Clone)]
pub struct ReoptNode {
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,

    /// Branching path relative to `parent_id`, in original-variable space.
    pub path: BranchingPath,
    /// Bound changes that were applied by dual reasoning rather than
    /// branching (Design Notes: "must not be confused with branching bound
    /// changes"), recorded separately so a re-solve knows to re-derive
    /// rather than re-branch them.
    pub afterdual: BranchingPath,

    pub localconss: Vec<LocalConstraint>,

    /// The dual-bound-change constraint in effect for the current
    /// reoptimization iteration.
    pub dualcons_current: Option<DualBoundChangeCons>,
    /// A dual-bound-change constraint produced by a later strong-branching
    /// call during the same iteration; graduates to `dualcons_current` on
    /// the next split (Design Notes "two slots exist").
    pub dualcons_next: Option<DualBoundChangeCons>,

    pub reopttype: ReoptType,
    /// Set once `afterdual` holds entries that must be applied on re-solve.
    pub dualfixing: bool,
}

impl ReoptNode {
    pub fn new(parent_id: Option<NodeId>) -> Self {
        Self {
            parent_id,
            child_ids: Vec::new(),
            path: BranchingPath::new(),
            afterdual: BranchingPath::new(),
            localconss: Vec::new(),
            dualcons_current: None,
            dualcons_next: None,
            reopttype: ReoptType::None,
            dualfixing: false,
        }
    }

    /// A node is a leaf in the *stored* tree iff it has no recorded
    /// children, independent of `reopttype`.
    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }

    /// Promotes a pending `dualcons_next` to `dualcons_current`, clearing
    /// the slot it vacated (§4.8 "next graduates to current after split").
    pub fn promote_dual_cons(&mut self) {
        if let Some(next) = self.dualcons_next.take() {
            self.dualcons_current = Some(next);
        }
    }
}
