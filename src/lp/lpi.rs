//! The contract an external LP solver must satisfy (§6).
//!
//! No implementation ships outside `#[cfg(test)]`: the actual simplex solver
//! is an external collaborator, exactly as `copters::linalg::solver` stays
//! behind a `LinearSolver` trait instead of owning a factorization
//! algorithm. [`Lp`](crate::lp::container::Lp) only ever talks to an
//! `&mut dyn LpSolverHandle`.

use crate::E;
use crate::error::CoreResult;

/// Real-valued parameters settable on the handle (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpRealParam {
    ObjLimit,
    FeasTol,
    DualFeasTol,
}

/// Integer-valued parameters settable on the handle (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpIntParam {
    FromScratch,
    FastMip,
    Scaling,
    Pricing,
    LpInfo,
    LpIter,
}

/// Which direction a solve optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

/// Which basis-feasibility / limit flags the solver reports after a solve
/// (§6 "query limit statuses (objlim, iterlim, timelim, infeasible,
/// unbounded, optimal)").
#[derive(Debug, Clone, Copy, Default)]
pub struct LpSolveInfo {
    pub primal_feasible: bool,
    pub dual_feasible: bool,
    pub stable: bool,
    pub iterations: i64,
    pub optimal: bool,
    pub infeasible: bool,
    pub unbounded: bool,
    pub objlimit_reached: bool,
    pub iterlimit_reached: bool,
    pub timelimit_reached: bool,
}

/// The full primal/dual solution vectors (§6, "get solution").
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub colvals: Vec<E>,
    pub rowduals: Vec<E>,
    pub rowactivities: Vec<E>,
    pub redcosts: Vec<E>,
}

/// Strong-branching result on one column (§6).
#[derive(Debug, Clone, Copy)]
pub struct StrongBranchResult {
    pub down: E,
    pub up: E,
    pub iterations: i64,
    pub downvalid: bool,
    pub upvalid: bool,
}

/// Opaque basis state handle; the core never inspects its contents, only
/// stores and replays it (§6 "get/set basis state").
#[derive(Debug, Clone)]
pub struct BasisState(pub Vec<u8>);

/// Operations the LP-management core requires from an external LP solver
/// (§6, first paragraph). All operations are fallible; a solver that cannot
/// service a request returns [`CoreError::LpError`](crate::error::CoreError::LpError).
pub trait LpSolverHandle {
    /// The solver's own representation of infinity, substituted for the
    /// set's infinity at the boundary.
    fn infinity(&self) -> E;

    fn add_cols(
        &mut self,
        obj: &[E],
        lb: &[E],
        ub: &[E],
        names: &[String],
        col_rows: &[Vec<i64>],
        col_vals: &[Vec<E>],
    ) -> CoreResult<()>;

    fn del_cols(&mut self, first: i64, last: i64) -> CoreResult<()>;

    fn add_rows(
        &mut self,
        lhs: &[E],
        rhs: &[E],
        names: &[String],
        row_cols: &[Vec<i64>],
        row_vals: &[Vec<E>],
    ) -> CoreResult<()>;

    fn del_rows(&mut self, first: i64, last: i64) -> CoreResult<()>;

    fn chg_obj(&mut self, cols: &[i64], vals: &[E]) -> CoreResult<()>;

    fn chg_bounds(&mut self, cols: &[i64], lb: &[E], ub: &[E]) -> CoreResult<()>;

    fn chg_sides(&mut self, rows: &[i64], lhs: &[E], rhs: &[E]) -> CoreResult<()>;

    fn set_real_param(&mut self, param: LpRealParam, value: E) -> CoreResult<()>;
    fn get_real_param(&self, param: LpRealParam) -> CoreResult<E>;

    fn set_int_param(&mut self, param: LpIntParam, value: i64) -> CoreResult<()>;
    fn get_int_param(&self, param: LpIntParam) -> CoreResult<i64>;

    fn set_obj_sense(&mut self, sense: ObjSense) -> CoreResult<()>;

    fn solve_primal(&mut self) -> CoreResult<LpSolveInfo>;
    fn solve_dual(&mut self) -> CoreResult<LpSolveInfo>;

    fn iterations(&self) -> CoreResult<i64>;

    fn get_solution(&self) -> CoreResult<LpSolution>;
    fn get_primal_ray(&self) -> CoreResult<Vec<E>>;
    fn get_dual_farkas(&self) -> CoreResult<Vec<E>>;

    fn strong_branch(
        &mut self,
        col: i64,
        colval: E,
        itlim: i32,
    ) -> CoreResult<StrongBranchResult>;

    fn get_basis(&self) -> CoreResult<BasisState>;
    fn set_basis(&mut self, basis: &BasisState) -> CoreResult<()>;

    /// Debug side-channel used only by the final step of the stability
    /// fallback (§4.6, §7 "unresolved instability").
    fn write_lp(&self, path: &str) -> CoreResult<()>;

    fn is_stable(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod mock {
    //! An in-memory [`LpSolverHandle`] used only by this crate's own tests,
    //! backed by a dense tableau re-derived from scratch on every solve.
    //! Good enough to exercise flush/solve/evaluate end to end; nowhere
    //! near a real simplex implementation.

    use super::*;
    use crate::error::CoreError;

    #[derive(Debug, Clone, Default)]
    pub struct MockLpi {
        pub obj: Vec<E>,
        pub lb: Vec<E>,
        pub ub: Vec<E>,
        pub col_rows: Vec<Vec<i64>>,
        pub col_vals: Vec<Vec<E>>,
        pub row_lhs: Vec<E>,
        pub row_rhs: Vec<E>,
        pub row_cols: Vec<Vec<i64>>,
        pub row_vals: Vec<Vec<E>>,
        pub sense: Option<ObjSense>,
        pub last_solution: Option<LpSolution>,
        pub iters: i64,
        pub stable: bool,
        /// Test knob: the solve reports unstable for this many calls before
        /// turning stable, so the stability ladder (§4.6) has something to
        /// iterate through.
        pub unstable_for: u32,
        /// Test knob: next solve reports `unbounded` instead of evaluating
        /// feasibility at the best bound.
        pub force_unbounded: bool,
        last_stable: bool,
        real_params: [E; 3],
        int_params: [i64; 6],
    }

    fn real_param_idx(param: LpRealParam) -> usize {
        match param {
            LpRealParam::ObjLimit => 0,
            LpRealParam::FeasTol => 1,
            LpRealParam::DualFeasTol => 2,
        }
    }

    fn int_param_idx(param: LpIntParam) -> usize {
        match param {
            LpIntParam::FromScratch => 0,
            LpIntParam::FastMip => 1,
            LpIntParam::Scaling => 2,
            LpIntParam::Pricing => 3,
            LpIntParam::LpInfo => 4,
            LpIntParam::LpIter => 5,
        }
    }

    impl MockLpi {
        pub fn new() -> Self {
            Self {
                stable: true,
                last_stable: true,
                real_params: [1e20, 1e-6, 1e-7],
                int_params: [0; 6],
                ..Default::default()
            }
        }

        fn ncols(&self) -> usize {
            self.obj.len()
        }

        fn nrows(&self) -> usize {
            self.row_lhs.len()
        }

        /// Wraps [`MockLpi::solve_at_best_bound`] with the two test knobs:
        /// a countdown of unstable solves, and a forced-unbounded result.
        fn solve_general(&mut self) -> LpSolveInfo {
            if self.force_unbounded {
                self.iters += 1;
                self.last_stable = true;
                return LpSolveInfo {
                    unbounded: true,
                    stable: true,
                    iterations: self.iters,
                    ..Default::default()
                };
            }
            let mut info = self.solve_at_best_bound();
            if self.unstable_for > 0 {
                self.unstable_for -= 1;
                info.stable = false;
            }
            self.last_stable = info.stable;
            info
        }

        /// Evaluates activities at the best bound of every column (a
        /// feasible point whenever bounds alone satisfy the rows), enough
        /// for the scenarios this crate's own tests need.
        fn solve_at_best_bound(&mut self) -> LpSolveInfo {
            let maximize = matches!(self.sense, Some(ObjSense::Maximize));
            let colvals: Vec<E> = (0..self.ncols())
                .map(|j| {
                    let want_low = if maximize {
                        self.obj[j] <= 0.0
                    } else {
                        self.obj[j] >= 0.0
                    };
                    if want_low { self.lb[j] } else { self.ub[j] }
                })
                .collect();

            let rowactivities: Vec<E> = (0..self.nrows())
                .map(|i| {
                    self.row_cols[i]
                        .iter()
                        .zip(&self.row_vals[i])
                        .map(|(&c, &v)| v * colvals[c as usize])
                        .sum()
                })
                .collect();

            let primal_feasible = (0..self.nrows()).all(|i| {
                rowactivities[i] >= self.row_lhs[i] - 1e-6
                    && rowactivities[i] <= self.row_rhs[i] + 1e-6
            });

            self.last_solution = Some(LpSolution {
                colvals,
                rowduals: vec![0.0; self.nrows()],
                rowactivities,
                redcosts: self.obj.clone(),
            });
            self.iters += 1;

            LpSolveInfo {
                primal_feasible,
                dual_feasible: true,
                stable: self.stable,
                iterations: self.iters,
                optimal: primal_feasible,
                infeasible: !primal_feasible,
                unbounded: false,
                objlimit_reached: false,
                iterlimit_reached: false,
                timelimit_reached: false,
            }
        }
    }

    impl LpSolverHandle for MockLpi {
        fn infinity(&self) -> E {
            1e20
        }

        fn add_cols(
            &mut self,
            obj: &[E],
            lb: &[E],
            ub: &[E],
            _names: &[String],
            col_rows: &[Vec<i64>],
            col_vals: &[Vec<E>],
        ) -> CoreResult<()> {
            self.obj.extend_from_slice(obj);
            self.lb.extend_from_slice(lb);
            self.ub.extend_from_slice(ub);
            self.col_rows.extend_from_slice(col_rows);
            self.col_vals.extend_from_slice(col_vals);
            Ok(())
        }

        fn del_cols(&mut self, first: i64, last: i64) -> CoreResult<()> {
            let (first, last) = (first as usize, last as usize);
            self.obj.drain(first..=last);
            self.lb.drain(first..=last);
            self.ub.drain(first..=last);
            self.col_rows.drain(first..=last);
            self.col_vals.drain(first..=last);
            Ok(())
        }

        fn add_rows(
            &mut self,
            lhs: &[E],
            rhs: &[E],
            _names: &[String],
            row_cols: &[Vec<i64>],
            row_vals: &[Vec<E>],
        ) -> CoreResult<()> {
            self.row_lhs.extend_from_slice(lhs);
            self.row_rhs.extend_from_slice(rhs);
            self.row_cols.extend_from_slice(row_cols);
            self.row_vals.extend_from_slice(row_vals);
            Ok(())
        }

        fn del_rows(&mut self, first: i64, last: i64) -> CoreResult<()> {
            let (first, last) = (first as usize, last as usize);
            self.row_lhs.drain(first..=last);
            self.row_rhs.drain(first..=last);
            self.row_cols.drain(first..=last);
            self.row_vals.drain(first..=last);
            Ok(())
        }

        fn chg_obj(&mut self, cols: &[i64], vals: &[E]) -> CoreResult<()> {
            for (&c, &v) in cols.iter().zip(vals) {
                self.obj[c as usize] = v;
            }
            Ok(())
        }

        fn chg_bounds(&mut self, cols: &[i64], lb: &[E], ub: &[E]) -> CoreResult<()> {
            for ((&c, &l), &u) in cols.iter().zip(lb).zip(ub) {
                self.lb[c as usize] = l;
                self.ub[c as usize] = u;
            }
            Ok(())
        }

        fn chg_sides(&mut self, rows: &[i64], lhs: &[E], rhs: &[E]) -> CoreResult<()> {
            for ((&r, &l), &u) in rows.iter().zip(lhs).zip(rhs) {
                self.row_lhs[r as usize] = l;
                self.row_rhs[r as usize] = u;
            }
            Ok(())
        }

        fn set_real_param(&mut self, param: LpRealParam, value: E) -> CoreResult<()> {
            self.real_params[real_param_idx(param)] = value;
            Ok(())
        }

        fn get_real_param(&self, param: LpRealParam) -> CoreResult<E> {
            Ok(self.real_params[real_param_idx(param)])
        }

        fn set_int_param(&mut self, param: LpIntParam, value: i64) -> CoreResult<()> {
            self.int_params[int_param_idx(param)] = value;
            Ok(())
        }

        fn get_int_param(&self, param: LpIntParam) -> CoreResult<i64> {
            Ok(self.int_params[int_param_idx(param)])
        }

        fn set_obj_sense(&mut self, sense: ObjSense) -> CoreResult<()> {
            self.sense = Some(sense);
            Ok(())
        }

        fn solve_primal(&mut self) -> CoreResult<LpSolveInfo> {
            Ok(self.solve_general())
        }

        fn solve_dual(&mut self) -> CoreResult<LpSolveInfo> {
            Ok(self.solve_general())
        }

        fn iterations(&self) -> CoreResult<i64> {
            Ok(self.iters)
        }

        fn get_solution(&self) -> CoreResult<LpSolution> {
            self.last_solution
                .clone()
                .ok_or_else(|| CoreError::invalid_call("no solve performed yet").into())
        }

        /// Direction that strictly improves the objective without bound: for
        /// a column with nonzero cost it moves opposite the cost's sign
        /// (downhill to minimize), and for a zero-cost column it still moves
        /// by 1 unit so the ray itself is never degenerate.
        fn get_primal_ray(&self) -> CoreResult<Vec<E>> {
            let maximize = matches!(self.sense, Some(ObjSense::Maximize));
            let dir = if maximize { 1.0 } else { -1.0 };
            Ok(self
                .obj
                .iter()
                .map(|&c| if c != 0.0 { dir * c.signum() } else { dir })
                .collect())
        }

        fn get_dual_farkas(&self) -> CoreResult<Vec<E>> {
            Ok(vec![0.0; self.nrows()])
        }

        fn strong_branch(
            &mut self,
            _col: i64,
            colval: E,
            _itlim: i32,
        ) -> CoreResult<StrongBranchResult> {
            Ok(StrongBranchResult {
                down: colval.floor(),
                up: colval.ceil(),
                iterations: 1,
                downvalid: true,
                upvalid: true,
            })
        }

        fn get_basis(&self) -> CoreResult<BasisState> {
            Ok(BasisState(Vec::new()))
        }

        fn set_basis(&mut self, _basis: &BasisState) -> CoreResult<()> {
            Ok(())
        }

        fn write_lp(&self, _path: &str) -> CoreResult<()> {
            Ok(())
        }

        fn is_stable(&self) -> bool {
            self.last_stable
        }
    }
}
