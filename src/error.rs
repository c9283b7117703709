//! Error taxonomy for the LP-management core.
//!
//! Every fallible operation returns `Result<T, problemo::Problem>`, the same
//! shape `copters::linalg::solver` uses for its `LinearSolverError`. Leaf
//! error enums implement `Display`/`std::error::Error` via `derive_more` and
//! are lifted into a `Problem` with `problemo::ProblemResult::via`.

use derive_more::{Display, Error};

/// The five-way status taxonomy: `Okay` is represented by `Result::Ok`, the
/// remaining variants are the possible error arms.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Caller violated a contract: a locked row was mutated, an unknown
    /// column/row handle was passed, or a coefficient below `epsilon` was
    /// added where a nonzero was expected.
    #[display("invalid data: {_0}")]
    InvalidData(#[error(ignore)] String),

    /// Operation was called in the wrong state, e.g. reading a solution
    /// before `solve` ran, or mutating structure while diving.
    #[display("invalid call: {_0}")]
    InvalidCall(#[error(ignore)] String),

    /// The LP solver failed irrecoverably after the full stability ladder
    /// (§4.6) was exhausted.
    #[display("LP solver error: {_0}")]
    LpError(#[error(ignore)] String),

    /// Allocation failed.
    #[display("out of memory")]
    NoMemory,

    /// Unknown status or programming-error fallback.
    #[display("internal error: {_0}")]
    Error(#[error(ignore)] String),
}

impl CoreError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn invalid_call(msg: impl Into<String>) -> Self {
        Self::InvalidCall(msg.into())
    }

    pub fn lp_error(msg: impl Into<String>) -> Self {
        Self::LpError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }
}

pub type CoreResult<T> = Result<T, problemo::Problem>;
