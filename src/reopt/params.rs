//! Reoptimization parameters (§6 "reopt.*") and the restart-decision type
//! `ReoptTree::check_restart` returns (SPEC_FULL §4.8 supplement).
//!
//! Kept as a plain struct in the style of
//! [`crate::numerics::Tolerances`]/[`crate::lp::solve::SolveParams`] rather
//! than routed through the `macros::build_options!` registry: nothing else
//! in this crate currently registers options through that macro either
//! (`CoreOptions` is constructed but never populated), so a second,
//! inconsistent path through it here would add machinery without a caller
//! that needs the dynamic get/set-by-name surface. See DESIGN.md.

use crate::E;

/// Tunables steering the reoptimization tree (§6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReoptParams {
    /// Maximum number of feasible solutions kept in the solution trie.
    pub savesols: usize,
    /// Minimum objective similarity (§4.8) below which a global restart is
    /// triggered.
    pub delay: E,
    /// Maximum number of saved nodes before a global restart is forced
    /// regardless of similarity.
    pub maxsavednodes: usize,
    /// Static threshold on the number of bound changes between a node and
    /// its nearest stored ancestor, above which `shrinkNode` refuses to
    /// merge them (ignored when `dynamicdiffofnodes` is set).
    pub maxdiffofnodes: usize,
    /// Use `ceil(log2(nbinvars - pathlen))` instead of `maxdiffofnodes`.
    pub dynamicdiffofnodes: bool,
    /// Allow `transit`/`logicornode` nodes with no local constraints to be
    /// merged into their nearest stored ancestor.
    pub shrinktransit: bool,
    pub reducetofrontier: bool,
    pub savelpbasis: bool,
    pub localdelay: E,
    pub objsimrootlp: E,
    /// Number of consecutive reopt-driven-heuristic optima that forces a
    /// restart (re-exploration) rather than continued reuse.
    pub forceheurrestart: u32,
    pub solvelp: u32,
    pub solvelpdiff: u32,
    pub sepainfsubtrees: bool,
    pub sepasols: bool,
}

impl Default for ReoptParams {
    fn default() -> Self {
        Self {
            savesols: 10,
            delay: 0.8,
            maxsavednodes: usize::MAX,
            maxdiffofnodes: 0,
            dynamicdiffofnodes: true,
            shrinktransit: true,
            reducetofrontier: true,
            savelpbasis: false,
            localdelay: 0.8,
            objsimrootlp: -1.0,
            forceheurrestart: 3,
            solvelp: 1,
            solvelpdiff: 1,
            sepainfsubtrees: true,
            sepasols: false,
        }
    }
}

/// Which of §4.8's three triggers fired a global restart, so a caller can
/// log the reason via [`crate::callback::DiagnosticEvent::ReoptRestart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Similarity to the previous objective fell below `reopt.delay`.
    LowSimilarity,
    /// Stored-node count exceeds `reopt.maxsavednodes`.
    SavedNodeCapExceeded,
    /// The reopt-driven heuristic produced the optimum in the last
    /// `reopt.forceheurrestart` runs, forcing re-exploration.
    ForcedHeuristicRestart,
}

impl RestartReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartReason::LowSimilarity => "objective similarity below delay threshold",
            RestartReason::SavedNodeCapExceeded => "saved node count exceeds maxsavednodes",
            RestartReason::ForcedHeuristicRestart => {
                "reopt heuristic found the optimum too many runs in a row"
            }
        }
    }
}

/// `ReoptTree::check_restart`'s verdict (SPEC_FULL §4.8 supplement,
/// mirroring the original solver's `SCIPreoptCheckReopt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Continue,
    GlobalRestart(RestartReason),
}
