//! The LP-management core: a sparse, cross-linked column/row matrix kept in
//! sync with an external LP solver, plus the operations a branch-and-cut
//! node processor drives it through.
//!
//! Submodule layout mirrors the split between column-local data
//! ([`column`]), row-local data ([`row`]), the cross-cutting container that
//! owns both arenas and everything that must see both sides of a link
//! ([`container`]), the algorithm that reconciles the container against an
//! external solver ([`flush`]), the trait contract an external solver must
//! satisfy ([`lpi`]), the stability-ladder solve loop ([`solve`]), and MIR
//! cut derivation ([`mir`]).

pub mod column;
pub mod container;
pub mod flush;
pub mod lpi;
pub mod mir;
pub mod row;
pub mod solve;

pub use column::{Col, ColId};
pub use container::Lp;
pub use row::{Row, RowId};
