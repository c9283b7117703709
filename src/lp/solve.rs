//! Solve: simplex with numerical fallbacks, status decoding, and
//! evaluate-and-commit (§4.6).
//!
//! `lp_solve_and_eval` is the single entry point the rest of the crate calls
//! once a flush has synchronized the current LP with the solver LP. Nothing
//! here mutates `lp`'s structure; only the tagged solution caches on
//! [`Col`](crate::lp::column::Col)/[`Row`](crate::lp::row::Row) and the
//! handful of scalar fields on [`Lp`] itself.

use crate::E;
use crate::Status;
use crate::callback::{DiagnosticEvent, Diagnostics};
use crate::error::{CoreError, CoreResult};
use crate::lp::container::Lp;
use crate::lp::lpi::{LpIntParam, LpRealParam, LpSolveInfo, LpSolverHandle};
use crate::numerics::Tolerances;
use crate::stat::Stat;

/// Solver knobs the stability ladder walks through (§4.6). The default is
/// the fast path: warm basis, FASTMIP on, scaling on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveParams {
    pub fastmip: bool,
    pub fromscratch: bool,
    pub scaling: bool,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            fastmip: true,
            fromscratch: false,
            scaling: true,
        }
    }
}

/// Pushes `params` and the cutoff-derived objective limit down to the
/// solver.
fn apply_solver_params(
    lp: &Lp,
    tol: &Tolerances,
    lpi: &mut dyn LpSolverHandle,
    params: &SolveParams,
) -> CoreResult<()> {
    let uobjlim = tol.to_solver_inf(lp.cutoffbound - lp.looseobjval, lpi.infinity());
    lpi.set_real_param(LpRealParam::ObjLimit, uobjlim)?;
    lpi.set_real_param(LpRealParam::FeasTol, tol.feastol)?;
    lpi.set_real_param(LpRealParam::DualFeasTol, tol.dualfeastol)?;
    lpi.set_int_param(LpIntParam::FromScratch, params.fromscratch as i64)?;
    lpi.set_int_param(LpIntParam::FastMip, params.fastmip as i64)?;
    lpi.set_int_param(LpIntParam::Scaling, params.scaling as i64)?;
    Ok(())
}

/// Dual simplex is preferred whenever the last known basis is dually
/// feasible or not primally feasible; primal otherwise (§4.6).
fn choose_dual(lp: &Lp) -> bool {
    lp.dualfeasible || !lp.primalfeasible
}

/// Runs one simplex call of the requested kind and records its iteration
/// count into the per-kind counters.
fn run_simplex(
    stat: &mut Stat,
    lpi: &mut dyn LpSolverHandle,
    use_dual: bool,
) -> CoreResult<LpSolveInfo> {
    let info = if use_dual {
        lpi.solve_dual()?
    } else {
        lpi.solve_primal()?
    };
    if use_dual {
        stat.record_dual_lp(info.iterations);
    } else {
        stat.record_primal_lp(info.iterations);
    }
    Ok(info)
}

/// Runs the stability ladder (§4.6): one simplex call, and on an unstable
/// report, a sequence of looser settings retried in order until either the
/// solver reports stable or the ladder is exhausted. Exhausting it persists
/// the LP to disk and raises [`CoreError::LpError`].
pub fn lp_solve_stable(
    lp: &Lp,
    stat: &mut Stat,
    tol: &Tolerances,
    lpi: &mut dyn LpSolverHandle,
    mut params: SolveParams,
    mut diag: Option<&mut dyn Diagnostics>,
    mut use_dual: bool,
) -> CoreResult<LpSolveInfo> {
    apply_solver_params(lp, tol, lpi, &params)?;
    let mut info = run_simplex(stat, lpi, use_dual)?;
    if lpi.is_stable() {
        return Ok(info);
    }

    let mut tightened_tol = *tol;
    let steps: [&str; 6] = [
        "fastmip off",
        "fromscratch",
        "tightened feastol",
        "switched algorithm",
        "toggled scaling",
        "switched algorithm + toggled scaling",
    ];
    for (attempt, &next) in steps.iter().enumerate() {
        if let Some(diag) = diag.as_deref_mut() {
            diag.report(&DiagnosticEvent::StabilityRetry {
                attempt: attempt as u32,
                status: Status::Error,
                next,
            });
        }
        match attempt {
            0 => params.fastmip = false,
            1 => params.fromscratch = true,
            2 => {
                tightened_tol.feastol /= 1000.0;
                tightened_tol.dualfeastol /= 1000.0;
            }
            3 => use_dual = !use_dual,
            4 => params.scaling = !params.scaling,
            5 => {
                use_dual = !use_dual;
                params.scaling = !params.scaling;
            }
            _ => unreachable!(),
        }
        apply_solver_params(lp, &tightened_tol, lpi, &params)?;
        info = run_simplex(stat, lpi, use_dual)?;
        if lpi.is_stable() {
            return Ok(info);
        }
    }

    lpi.write_lp("unstable.lp")?;
    Err(CoreError::lp_error("LP solve remained unstable after exhausting the stability ladder").into())
}

/// Maps an [`LpSolveInfo`] to a [`Status`], handling the objlimit/primal
/// special case and the optimal-above-cutoff downgrade (§4.6).
fn decode_status(info: &LpSolveInfo, lp: &Lp, tol: &Tolerances, used_primal: bool) -> CoreResult<Status> {
    if info.timelimit_reached {
        return Ok(Status::TimeLimit);
    }
    if info.iterlimit_reached {
        return Ok(Status::IterLimit);
    }
    if info.objlimit_reached {
        if used_primal && tol.is_infinity(lp.cutoffbound) {
            return Err(CoreError::internal(
                "primal simplex reported objlimit reached with no finite cutoff bound",
            )
            .into());
        }
        return Ok(Status::ObjLimit);
    }
    if info.unbounded {
        return Ok(Status::Unbounded);
    }
    if info.infeasible {
        return Ok(Status::Infeasible);
    }
    if info.optimal {
        return Ok(Status::Optimal);
    }
    Ok(Status::Error)
}

/// Open Question #2: `colCalcFarkas` sums `val * row.dualfarkas` over a
/// column's entries, then scales by whichever bound applies to the sign of
/// that sum. When the sum is exactly `0.0` and the applicable bound is
/// infinite, the naive `bound * sum` is `∞ * 0 = NaN`; treated as `0.0`
/// instead, since an unbounded column contributes nothing to a Farkas proof
/// it has no finite side to support.
pub fn col_farkas(lp: &mut Lp, stat: &Stat, tol: &Tolerances, col_id: crate::lp::column::ColId) -> E {
    if let Some(v) = lp.col(col_id).farkas.get(stat.lpcount) {
        return v;
    }
    let len = lp.col(col_id).len();
    let mut sum = 0.0;
    for i in 0..len {
        let r = lp.col(col_id).rows()[i];
        let v = lp.col(col_id).vals()[i];
        sum += v * lp.row(r).dualfarkas.value;
    }
    let col = lp.col(col_id);
    let bound = if sum > 0.0 { col.ub } else { col.lb };
    let bound_infinite = tol.is_infinity(bound) || tol.is_neg_infinity(bound);
    let farkas = if sum == 0.0 && bound_infinite {
        0.0
    } else {
        sum * bound
    };
    lp.col_mut(col_id).farkas.set(farkas, stat.lpcount);
    farkas
}

/// Writes back one optimal/objlimit solution's primal/dual values into the
/// tagged column/row caches, all stamped at `stat.lpcount`.
fn commit_solution(lp: &mut Lp, stat: &Stat, sol: &crate::lp::lpi::LpSolution) {
    for (pos, &col_id) in lp.lpicols().to_vec().iter().enumerate() {
        let primsol = sol.colvals.get(pos).copied().unwrap_or(0.0);
        let redcost = sol.redcosts.get(pos).copied().unwrap_or(0.0);
        let col = lp.col_mut(col_id);
        col.primsol.set(primsol, stat.lpcount);
        col.redcost.set(redcost, stat.lpcount);
    }
    for (pos, &row_id) in lp.lpirows().to_vec().iter().enumerate() {
        let dualsol = sol.rowduals.get(pos).copied().unwrap_or(0.0);
        let activity = sol.rowactivities.get(pos).copied().unwrap_or(0.0);
        let row = lp.row_mut(row_id);
        row.dualsol.set(dualsol, stat.lpcount);
        row.activity.set(activity, stat.lpcount);
    }
}

/// Writes back a Farkas proof of infeasibility into row `dualfarkas`.
fn commit_farkas(lp: &mut Lp, stat: &Stat, farkas: &[E]) {
    for (pos, &row_id) in lp.lpirows().to_vec().iter().enumerate() {
        let f = farkas.get(pos).copied().unwrap_or(0.0);
        lp.row_mut(row_id).dualfarkas.set(f, stat.lpcount);
    }
}

/// Writes back the extended point `x' = x + alpha * ray` into column
/// `primsol`, a finite witness of unbounded objective value.
fn commit_unbounded(lp: &mut Lp, stat: &Stat, sol: &crate::lp::lpi::LpSolution, ray: &[E], alpha: E) {
    for (pos, &col_id) in lp.lpicols().to_vec().iter().enumerate() {
        let base = sol.colvals.get(pos).copied().unwrap_or(0.0);
        let r = ray.get(pos).copied().unwrap_or(0.0);
        lp.col_mut(col_id).primsol.set(base + alpha * r, stat.lpcount);
    }
}

/// Largest `rhs - activity` / `activity - lhs` violation across every row in
/// the solver LP, used by the feasibility recheck after an optimal solve.
fn max_infeasibility(lp: &Lp, tol: &Tolerances) -> E {
    let mut worst = 0.0;
    for &row_id in lp.lpirows() {
        let activity = lp.row(row_id).activity.value;
        let feas = lp.feasibility(row_id, activity);
        if feas < -tol.feastol && -feas > worst {
            worst = -feas;
        }
    }
    worst
}

/// Top-level orchestrator (`SCIPlpSolveAndEval`): solves, decodes status,
/// and commits whichever solution artifact the status calls for, including
/// the feasibility-recheck retry loop on an optimal result (§4.6).
pub fn lp_solve_and_eval(
    lp: &mut Lp,
    stat: &mut Stat,
    tol: &Tolerances,
    lpi: &mut dyn LpSolverHandle,
    mut diag: Option<&mut dyn Diagnostics>,
) -> CoreResult<Status> {
    let mut params = SolveParams::default();
    let use_dual = choose_dual(lp);
    let used_primal = !use_dual;

    loop {
        let info = lp_solve_stable(lp, stat, tol, lpi, params, diag.as_deref_mut(), use_dual)?;
        stat.advance_lpcount();
        lp.primalfeasible = info.primal_feasible;
        lp.dualfeasible = info.dual_feasible;

        let mut status = decode_status(&info, lp, tol, used_primal)?;

        if status == Status::Optimal {
            let sol = lpi.get_solution()?;
            let uobjlim = lp.cutoffbound - lp.looseobjval;
            let raw_obj: E = sol
                .colvals
                .iter()
                .zip(lp.lpicols().iter())
                .map(|(&v, &c)| lp.col(c).obj * v)
                .sum();
            if !tol.is_infinity(uobjlim) && raw_obj >= uobjlim {
                status = Status::ObjLimit;
                lp.lpobjval = tol.infinity;
            } else {
                lp.lpobjval = raw_obj + lp.looseobjval;
            }
            commit_solution(lp, stat, &sol);

            let violation = max_infeasibility(lp, tol);
            if violation > 0.0 {
                if let Some(diag) = diag.as_deref_mut() {
                    diag.report(&DiagnosticEvent::SolutionFeasibilityWarning { violation });
                }
                if params.fastmip {
                    params.fastmip = false;
                    continue;
                }
                if !params.fromscratch {
                    params.fromscratch = true;
                    continue;
                }
            }
        } else if status == Status::ObjLimit {
            lp.lpobjval = tol.infinity;
            let sol = lpi.get_solution()?;
            commit_solution(lp, stat, &sol);
        } else if status == Status::Infeasible {
            if lp.lpicols().len() < lp.cols().len() {
                let farkas = lpi.get_dual_farkas()?;
                commit_farkas(lp, stat, &farkas);
            }
            lp.lpobjval = tol.infinity;
        } else if status == Status::Unbounded {
            let sol = lpi.get_solution()?;
            let ray = lpi.get_primal_ray()?;
            let rayobj: E = ray
                .iter()
                .zip(lp.lpicols().iter())
                .map(|(&r, &c)| lp.col(c).obj * r)
                .sum();
            if rayobj != 0.0 {
                let alpha = -2.0 * tol.infinity / rayobj;
                commit_unbounded(lp, stat, &sol, &ray, alpha);
            } else {
                commit_solution(lp, stat, &sol);
            }
            lp.lpobjval = -tol.infinity;
        }

        lp.lpsolstat = status;
        lp.solved = true;
        return Ok(status);
    }
}
