//! The reoptimization tree (§4.8): owns the node arena, the free-id queue,
//! and every operation that must see more than one node at once (shrinking
//! a chain of transit nodes, deleting or marking a subtree, dry-branching
//! children before they are applied, checking whether the tree is still
//! worth reusing at all).
//!
//! Nodes are addressed by [`NodeId`], never by reference: the arena is a
//! `Vec<Option<ReoptNode>>` and a node's parent/children are just ids into
//! it, the same index-not-pointer discipline
//! [`crate::lp::container::Lp`] uses for its column/row arenas.

use crate::E;
use crate::numerics::Tolerances;
use crate::reopt::node::{BoundType, BranchingPath, NodeId, ReoptNode, ReoptType};
use crate::reopt::params::{ReoptParams, RestartDecision, RestartReason};
use crate::variable::VarId;

/// The persistent search-tree fragment (§3 `ReoptTree`).
#[derive(Debug, Clone)]
pub struct ReoptTree {
    /// Arena indexed by `NodeId`; a `None` slot is free for reuse.
    nodes: Vec<Option<ReoptNode>>,
    /// Ids of freed slots, recycled by `alloc_id` before the arena grows.
    free_ids: Vec<NodeId>,
    /// Consecutive reopt-driven-heuristic runs that matched the optimum
    /// (§4.8 "Similarity metric", third restart trigger).
    heur_optimum_streak: u32,
}

impl Default for ReoptTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ReoptTree {
    /// A fresh tree with only the root (index 0, per §3's data model).
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(ReoptNode::new(None))],
            free_ids: Vec::new(),
            heur_optimum_streak: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> &ReoptNode {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("dereferenced a freed or out-of-range reopt node id")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ReoptNode {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("dereferenced a freed or out-of-range reopt node id")
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0 as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Number of live (non-freed) nodes, including the root.
    pub fn nsavednodes(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    fn alloc_id(&mut self) -> NodeId {
        if let Some(id) = self.free_ids.pop() {
            id
        } else {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(None);
            id
        }
    }

    fn free_id(&mut self, id: NodeId) {
        debug_assert_ne!(id, NodeId::ROOT, "the root is never freed");
        self.nodes[id.0 as usize] = None;
        self.free_ids.push(id);
    }

    /// `addNode` (§4.8). If `id` names an existing node, updates it in
    /// place and branches on `reopttype`; otherwise allocates a fresh node
    /// under `parent` (required unless the caller means the root, which
    /// already exists and is always addressed by `Some(NodeId::ROOT)`).
    ///
    /// `new_props` are constraint propagations to append to the node's
    /// stored path since its last save; `afterdual`, when present, is
    /// appended to the node's after-dual bound changes and flips
    /// `dualfixing`. `nbinvars` feeds the dynamic shrink threshold.
    pub fn add_node(
        &mut self,
        id: Option<NodeId>,
        parent: Option<NodeId>,
        new_props: BranchingPath,
        afterdual: Option<BranchingPath>,
        reopttype: ReoptType,
        params: &ReoptParams,
        nbinvars: usize,
    ) -> NodeId {
        if let Some(existing) = id {
            {
                let node = self.node_mut(existing);
                node.path.extend(&new_props);
                if let Some(ad) = &afterdual {
                    node.afterdual.extend(ad);
                    node.dualfixing = true;
                }
                node.reopttype = reopttype;
            }
            self.apply_reopttype_effects(existing, reopttype, params, nbinvars);
            existing
        } else {
            let parent =
                parent.expect("a newly saved reopt node below the root must have a parent");
            let new_id = self.alloc_id();
            let mut node = ReoptNode::new(Some(parent));
            node.path = new_props;
            if let Some(ad) = afterdual {
                node.afterdual = ad;
                node.dualfixing = true;
            }
            node.reopttype = reopttype;
            self.nodes[new_id.0 as usize] = Some(node);
            self.node_mut(parent).child_ids.push(new_id);
            self.apply_reopttype_effects(new_id, reopttype, params, nbinvars);
            new_id
        }
    }

    fn apply_reopttype_effects(
        &mut self,
        id: NodeId,
        reopttype: ReoptType,
        params: &ReoptParams,
        nbinvars: usize,
    ) {
        match reopttype {
            ReoptType::Transit | ReoptType::LogicorNode | ReoptType::Leaf => {
                if params.shrinktransit && self.node(id).localconss.is_empty() {
                    self.maybe_shrink_parent(id, params, nbinvars);
                }
            }
            ReoptType::InfSubtree => {
                self.delete_subtree(id);
                self.node_mut(id).dualfixing = true;
            }
            ReoptType::StrBranched => {
                self.mark_subtree(id, ReoptType::Pruned);
                self.node_mut(id).dualfixing = true;
            }
            ReoptType::Feasible | ReoptType::Pruned => {
                if params.reducetofrontier {
                    self.delete_subtree(id);
                }
            }
            ReoptType::None | ReoptType::Infeasible => {}
        }
    }

    /// Recursively frees every descendant of `id`, leaving `id` itself as a
    /// childless leaf. Used when a proven-infeasible or already-explored
    /// subtree no longer needs to be kept around.
    fn delete_subtree(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).child_ids);
        for child in children {
            self.delete_subtree(child);
            self.free_id(child);
        }
    }

    /// Recursively stamps `reopttype` on every descendant of `id` without
    /// deleting anything (§4.8 "mark subtree as pruned... they remain
    /// valid solutions to the relaxation").
    fn mark_subtree(&mut self, id: NodeId, reopttype: ReoptType) {
        let children = self.node(id).child_ids.clone();
        for child in children {
            self.node_mut(child).reopttype = reopttype;
            self.mark_subtree(child, reopttype);
        }
    }

    /// Considers collapsing `node_id`'s parent into its own grandparent
    /// (`shrinkNode`, §4.8): if the parent carries no local constraints and
    /// its stored path is short enough, every one of the parent's children
    /// is reparented to the grandparent with the parent's path prefixed
    /// onto its own, and the parent's id is recycled.
    fn maybe_shrink_parent(&mut self, node_id: NodeId, params: &ReoptParams, nbinvars: usize) {
        let Some(parent_id) = self.node(node_id).parent_id else {
            return;
        };
        if parent_id == NodeId::ROOT {
            return;
        }
        let parent = self.node(parent_id);
        if !parent.localconss.is_empty() {
            return;
        }
        let Some(grandparent_id) = parent.parent_id else {
            return;
        };
        let pathlen = parent.path.len();
        let threshold = if params.dynamicdiffofnodes {
            let remaining = nbinvars.saturating_sub(pathlen) as f64;
            if remaining <= 1.0 {
                0
            } else {
                remaining.log2().ceil() as usize
            }
        } else {
            params.maxdiffofnodes
        };
        if pathlen > threshold {
            return;
        }

        let parent_path = parent.path.clone();
        let children = parent.child_ids.clone();
        for child in &children {
            let mut new_path = parent_path.clone();
            new_path.extend(&self.node(*child).path);
            let child_node = self.node_mut(*child);
            child_node.path = new_path;
            child_node.parent_id = Some(grandparent_id);
        }
        let grandparent = self.node_mut(grandparent_id);
        grandparent.child_ids.retain(|&c| c != parent_id);
        grandparent.child_ids.extend(children);
        self.free_id(parent_id);
    }

    /// `dryBranch` (§4.8): before a stored node's children are applied as
    /// real search-tree nodes, drops bound-change entries that are already
    /// implied by `current_bounds`, flags entries that contradict it for
    /// cutoff, and collapses any child left with no bound changes and no
    /// local constraints into `parent_id` (adopting its own children).
    /// Runs to a fixpoint and returns the ids of children to cut off.
    pub fn dry_branch(
        &mut self,
        parent_id: NodeId,
        tol: &Tolerances,
        current_bounds: impl Fn(VarId) -> (E, E),
    ) -> Vec<NodeId> {
        let mut cutoff = Vec::new();
        loop {
            let mut changed = false;
            let children = self.node(parent_id).child_ids.clone();
            for child in children {
                if cutoff.contains(&child) {
                    continue;
                }
                let node = self.node(child);
                let mut kept = BranchingPath::new();
                let mut contradicted = false;
                for i in 0..node.path.len() {
                    let var = node.path.vars[i];
                    let bound = node.path.bounds[i];
                    let boundtype = node.path.boundtypes[i];
                    let (cur_lb, cur_ub) = current_bounds(var);
                    match boundtype {
                        BoundType::Lower => {
                            if tol.is_gt(bound, cur_ub) {
                                contradicted = true;
                                break;
                            }
                            if tol.is_le(bound, cur_lb) {
                                continue;
                            }
                        }
                        BoundType::Upper => {
                            if tol.is_lt(bound, cur_lb) {
                                contradicted = true;
                                break;
                            }
                            if tol.is_ge(bound, cur_ub) {
                                continue;
                            }
                        }
                    }
                    kept.push(var, bound, boundtype);
                }

                if contradicted {
                    cutoff.push(child);
                    changed = true;
                    continue;
                }

                if kept.len() != node.path.len() {
                    self.node_mut(child).path = kept;
                    changed = true;
                }

                let node = self.node(child);
                if node.path.is_empty() && node.localconss.is_empty() {
                    let grandchildren = node.child_ids.clone();
                    for gc in &grandchildren {
                        self.node_mut(*gc).parent_id = Some(parent_id);
                    }
                    let parent = self.node_mut(parent_id);
                    parent.child_ids.retain(|&c| c != child);
                    parent.child_ids.extend(grandchildren);
                    self.free_id(child);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        cutoff
    }

    /// Records whether the reopt-driven heuristic reproduced the optimum
    /// this run, feeding the third restart trigger in [`Self::check_restart`].
    pub fn record_heuristic_result(&mut self, matched_optimum: bool) {
        if matched_optimum {
            self.heur_optimum_streak += 1;
        } else {
            self.heur_optimum_streak = 0;
        }
    }

    /// Cosine similarity between two normalized objective vectors, ∈ [-1,
    /// 1]; returns the `-2` sentinel when the vectors aren't comparable
    /// (different lengths, or either is the zero vector) (§4.8 "Similarity
    /// metric").
    pub fn similarity(a: &[E], b: &[E]) -> E {
        if a.len() != b.len() || a.is_empty() {
            return -2.0;
        }
        let norm_a = a.iter().map(|v| v * v).sum::<E>().sqrt();
        let norm_b = b.iter().map(|v| v * v).sum::<E>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return -2.0;
        }
        let dot: E = a.iter().zip(b).map(|(x, y)| x * y).sum();
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    /// Whether a global restart is warranted before solving `new_obj`
    /// against this tree (§4.8's three triggers, in the order the original
    /// solver's `SCIPreoptCheckReopt` checks them).
    pub fn check_restart(
        &self,
        new_obj: &[E],
        prev_obj: Option<&[E]>,
        params: &ReoptParams,
    ) -> RestartDecision {
        if self.nsavednodes() > params.maxsavednodes {
            return RestartDecision::GlobalRestart(RestartReason::SavedNodeCapExceeded);
        }
        if self.heur_optimum_streak >= params.forceheurrestart {
            return RestartDecision::GlobalRestart(RestartReason::ForcedHeuristicRestart);
        }
        if let Some(prev) = prev_obj {
            let sim = Self::similarity(new_obj, prev);
            if sim > -2.0 && sim < params.delay {
                return RestartDecision::GlobalRestart(RestartReason::LowSimilarity);
            }
        }
        RestartDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reopt::node::BoundType;

    fn path(entries: &[(u32, E, BoundType)]) -> BranchingPath {
        let mut p = BranchingPath::new();
        for &(var, bound, bt) in entries {
            p.push(VarId(var), bound, bt);
        }
        p
    }

    #[test]
    fn add_node_without_parent_attaches_to_root() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams {
            shrinktransit: false,
            ..ReoptParams::default()
        };
        let a = tree.add_node(
            None,
            Some(NodeId::ROOT),
            path(&[(0, 1.0, BoundType::Lower)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        assert_eq!(tree.node(NodeId::ROOT).child_ids, vec![a]);
        assert_eq!(tree.node(a).path.len(), 1);
    }

    #[test]
    fn shrink_collapses_transit_parent_into_root() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams {
            shrinktransit: true,
            dynamicdiffofnodes: false,
            maxdiffofnodes: 2,
            ..ReoptParams::default()
        };
        let a = tree.add_node(
            None,
            Some(NodeId::ROOT),
            path(&[(0, 1.0, BoundType::Lower)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        let b = tree.add_node(
            None,
            Some(a),
            path(&[(1, 0.0, BoundType::Upper)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );

        // `a` should have been shrunk away: `b`'s parent is the root, its
        // path carries both bound changes, and `a`'s id is free again.
        assert_eq!(tree.node(b).parent_id, Some(NodeId::ROOT));
        assert_eq!(tree.node(b).path.vars, vec![VarId(0), VarId(1)]);
        assert_eq!(tree.node(NodeId::ROOT).child_ids, vec![b]);
        assert!(!tree.contains(a));

        // The freed id is handed back out before the arena grows again.
        let c = tree.add_node(
            None,
            Some(NodeId::ROOT),
            BranchingPath::new(),
            None,
            ReoptType::Leaf,
            &ReoptParams {
                shrinktransit: false,
                ..params
            },
            10,
        );
        assert_eq!(c, a);
    }

    #[test]
    fn shrink_is_blocked_by_a_local_constraint() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams {
            shrinktransit: true,
            dynamicdiffofnodes: false,
            maxdiffofnodes: 2,
            ..ReoptParams::default()
        };
        let a = tree.add_node(
            None,
            Some(NodeId::ROOT),
            path(&[(0, 1.0, BoundType::Lower)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        tree.node_mut(a).localconss.push(crate::reopt::node::LocalConstraint {
            vars: vec![VarId(0)],
            bounds: vec![1.0],
            boundtypes: vec![BoundType::Lower],
        });
        let b = tree.add_node(
            None,
            Some(a),
            path(&[(1, 0.0, BoundType::Upper)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        assert_eq!(tree.node(b).parent_id, Some(a));
        assert!(tree.contains(a));
    }

    #[test]
    fn infsubtree_deletes_descendants_and_marks_dual_fixed() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams::default();
        let a = tree.add_node(
            None,
            Some(NodeId::ROOT),
            BranchingPath::new(),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        let b = tree.add_node(
            None,
            Some(a),
            BranchingPath::new(),
            None,
            ReoptType::Leaf,
            &params,
            10,
        );
        tree.add_node(
            Some(a),
            None,
            BranchingPath::new(),
            None,
            ReoptType::InfSubtree,
            &params,
            10,
        );
        assert!(tree.node(a).dualfixing);
        assert!(tree.node(a).child_ids.is_empty());
        assert!(!tree.contains(b));
    }

    #[test]
    fn strbranched_prunes_descendants_without_deleting_them() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams::default();
        let a = tree.add_node(
            None,
            Some(NodeId::ROOT),
            BranchingPath::new(),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        let b = tree.add_node(
            None,
            Some(a),
            BranchingPath::new(),
            None,
            ReoptType::Leaf,
            &params,
            10,
        );
        tree.add_node(
            Some(a),
            None,
            BranchingPath::new(),
            None,
            ReoptType::StrBranched,
            &params,
            10,
        );
        assert!(tree.node(a).dualfixing);
        assert!(tree.contains(b));
        assert_eq!(tree.node(b).reopttype, ReoptType::Pruned);
    }

    #[test]
    fn dry_branch_cuts_off_contradicted_children_and_collapses_empty_ones() {
        let mut tree = ReoptTree::new();
        let params = ReoptParams {
            shrinktransit: false,
            ..ReoptParams::default()
        };
        // child 0 conflicts with the current bound on var 0.
        let cutoff_child = tree.add_node(
            None,
            Some(NodeId::ROOT),
            path(&[(0, 5.0, BoundType::Lower)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        // child 1 is already implied by the current bound and has no
        // other entries, so it should collapse into the root, adopting
        // its own child.
        let redundant_child = tree.add_node(
            None,
            Some(NodeId::ROOT),
            path(&[(1, -1.0, BoundType::Lower)]),
            None,
            ReoptType::Transit,
            &params,
            10,
        );
        let grandchild = tree.add_node(
            None,
            Some(redundant_child),
            path(&[(2, 2.0, BoundType::Upper)]),
            None,
            ReoptType::Leaf,
            &params,
            10,
        );

        let tol = Tolerances::default();
        let bounds = |v: VarId| match v.0 {
            0 => (0.0, 1.0), // 5.0 lower bound contradicts this
            1 => (-1.0, 10.0), // -1.0 lower bound already holds
            _ => (-tol.infinity, tol.infinity),
        };
        let cutoff = tree.dry_branch(NodeId::ROOT, &tol, bounds);

        assert_eq!(cutoff, vec![cutoff_child]);
        assert!(!tree.contains(redundant_child));
        assert_eq!(tree.node(grandchild).parent_id, Some(NodeId::ROOT));
        assert!(tree.node(NodeId::ROOT).child_ids.contains(&grandchild));
    }

    #[test]
    fn similarity_is_cosine_and_sentinel_on_mismatch() {
        assert_eq!(ReoptTree::similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(ReoptTree::similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
        assert_eq!(ReoptTree::similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(ReoptTree::similarity(&[1.0], &[1.0, 0.0]), -2.0);
        assert_eq!(ReoptTree::similarity(&[0.0, 0.0], &[1.0, 0.0]), -2.0);
    }

    #[test]
    fn check_restart_triggers_on_each_condition_independently() {
        let tree = ReoptTree::new();
        let mut params = ReoptParams {
            maxsavednodes: 0,
            ..ReoptParams::default()
        };
        assert_eq!(
            tree.check_restart(&[1.0], Some(&[1.0]), &params),
            RestartDecision::GlobalRestart(RestartReason::SavedNodeCapExceeded)
        );

        params.maxsavednodes = usize::MAX;
        params.delay = 0.9;
        assert_eq!(
            tree.check_restart(&[1.0, 0.0], Some(&[0.0, 1.0]), &params),
            RestartDecision::GlobalRestart(RestartReason::LowSimilarity)
        );

        params.delay = -1.0;
        assert_eq!(
            tree.check_restart(&[1.0, 0.0], Some(&[0.0, 1.0]), &params),
            RestartDecision::Continue
        );

        let mut streak_tree = ReoptTree::new();
        for _ in 0..3 {
            streak_tree.record_heuristic_result(true);
        }
        assert_eq!(
            streak_tree.check_restart(&[1.0], None, &params),
            RestartDecision::GlobalRestart(RestartReason::ForcedHeuristicRestart)
        );
    }
}
