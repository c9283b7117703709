//! LP-management core for a constraint-integer-programming branch-and-cut
//! engine: the sparse column/row matrix shared with an external LP solver,
//! its flush/solve cycle, MIR cut derivation, and a reoptimization tree that
//! persists search-tree fragments across restarts.
//!
//! This crate does not implement a simplex algorithm, a branching or node
//! selection policy, or file-format I/O; it owns the data structures and
//! bookkeeping a branch-and-cut node processor drives an LP solver through,
//! and hands control to an [`lp::lpi::LpSolverHandle`] implementation for the
//! actual numerical solve.

use std::any::Any;

use dyn_clone::DynClone;
use macros::build_options;

pub type E = f64;
pub type I = usize;

pub mod callback;
pub mod error;
pub mod lp;
pub mod numerics;
pub mod reopt;
pub mod stat;
pub mod terminators;
pub mod variable;

pub trait OptionTrait: Any + Sync + Send + DynClone {}
impl OptionTrait for &'static str {}
impl OptionTrait for String {}
impl OptionTrait for bool {}
impl OptionTrait for usize {}
impl OptionTrait for u8 {}
impl OptionTrait for u16 {}
impl OptionTrait for u32 {}
impl OptionTrait for u64 {}
impl OptionTrait for i8 {}
impl OptionTrait for i16 {}
impl OptionTrait for i32 {}
impl OptionTrait for i64 {}
impl OptionTrait for f32 {}
impl OptionTrait for f64 {}

impl Clone for Box<dyn OptionTrait> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

/// LP solve status, decoded from whatever an [`lp::lpi::LpSolverHandle`]
/// reports (§4.6 of the design notes this crate follows).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Status {
    /// No solve has been performed against the current LP yet.
    #[default]
    NotSolved,
    /// A solve is in progress; used by [`terminators::Terminator`] polling
    /// loops, never stored on the LP itself once a solve finishes.
    InProgress,
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped at the cutoff / objective limit before reaching optimality.
    ObjLimit,
    IterLimit,
    TimeLimit,
    Interrupted,
    /// The solver failed and the stability ladder was exhausted.
    Error,
}

impl Status {
    /// A status from which primal/dual solution values may be read.
    pub fn has_solution(&self) -> bool {
        matches!(self, Status::Optimal | Status::ObjLimit)
    }

    /// A status that ends the stability ladder retry loop: either a
    /// conclusive answer or an exhausted retry budget.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::NotSolved | Status::InProgress)
    }
}

build_options!(registry_name = OPTION_REGISTRY);

/// Friendlier name for the options bag generated by [`build_options`]: the
/// macro always names its output type `Options` regardless of any `name`
/// passed at the call site, so this alias is what the rest of the crate
/// spells instead.
pub type CoreOptions = Options;
