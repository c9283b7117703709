//! MIR (Mixed-Integer Rounding) cut derivation and the row-summation
//! utilities it builds on (§4.7).
//!
//! The pipeline is four narrow phases threaded through one accumulator: sum
//! a weighted set of rows into a single aggregated row, transform it to
//! standard form (every variable shifted so its relevant bound sits at
//! zero), round the transformed coefficients against the shifted side's
//! fractionality, then substitute back any row slack that entered with a
//! negative sign. `SCIPlpSumRows` is the un-rounded sibling, exposed on its
//! own since other callers want the weighted sum without the rounding step.

use crate::E;
use crate::lp::container::Lp;
use crate::lp::row::RowId;
use crate::numerics::Tolerances;
use crate::variable::{VarStatus, Variable};

/// Switch threshold used when a variable's two bounds are both finite: the
/// upper bound is used only when the solution value sits within
/// `1 - BOUNDSWITCH` of the bound width from it.
pub const BOUNDSWITCH: E = 0.9999;

/// The weighted, un-rounded sum of a set of rows, both sides kept separate
/// from whichever side later gets picked for rounding (`SCIPlpSumRows`).
#[derive(Debug, Clone)]
pub struct RowSum {
    /// Dense, indexed by variable `probindex`.
    pub coef: Vec<E>,
    pub sumlhs: E,
    pub sumrhs: E,
    pub lhsinfinite: bool,
    pub rhsinfinite: bool,
}

/// Weighted sum of `rows` with no side selection and no rounding. Unlike a
/// naive port, the accumulated `sumlhs`/`sumrhs` are the function's actual
/// output: a row whose side is infinite only sets the corresponding
/// `*infinite` flag and leaves the finite accumulator alone, so a caller
/// that mixes finite and infinite rows still gets a usable finite side back
/// for whichever direction stayed finite.
pub fn lp_sum_rows(lp: &Lp, tol: &Tolerances, rows: &[(RowId, E)], nvars: usize) -> RowSum {
    let mut coef = vec![0.0; nvars];
    let mut sumlhs = 0.0;
    let mut sumrhs = 0.0;
    let mut lhsinfinite = false;
    let mut rhsinfinite = false;

    for &(row_id, w) in rows {
        if tol.is_zero(w) {
            continue;
        }
        let row = lp.row(row_id);
        for i in 0..row.len() {
            let probindex = row.cols_probindex()[i];
            coef[probindex] += w * row.vals()[i];
        }
        if tol.is_neg_infinity(row.lhs) {
            lhsinfinite = true;
        } else {
            sumlhs += w * (row.lhs - row.constant);
        }
        if tol.is_infinity(row.rhs) {
            rhsinfinite = true;
        } else {
            sumrhs += w * (row.rhs - row.constant);
        }
    }

    RowSum {
        coef,
        sumlhs,
        sumrhs,
        lhsinfinite,
        rhsinfinite,
    }
}

/// One row's contribution to a MIR aggregation, kept around for the
/// substitution phase: which row, what weight, and which side's slack was
/// picked (`-1` for lhs, `+1` for rhs).
#[derive(Debug, Clone, Copy)]
pub struct MirRowContribution {
    pub row_id: RowId,
    pub weight: E,
    pub slacksign: i8,
}

/// Phase 1 (`sumMIRRow`): aggregate non-modifiable rows with nonzero weight
/// into a single dense coefficient vector and scalar rhs, each row
/// contributing through whichever side its current activity sits closer to
/// violating.
pub fn sum_mir_row(
    lp: &Lp,
    tol: &Tolerances,
    rows: &[(RowId, E)],
    nvars: usize,
) -> (Vec<E>, E, Vec<MirRowContribution>) {
    let mut mircoef = vec![0.0; nvars];
    let mut mirrhs = 0.0;
    let mut used = Vec::new();

    for &(row_id, w) in rows {
        if tol.is_zero(w) {
            continue;
        }
        let row = lp.row(row_id);
        if row.modifiable {
            continue;
        }
        let activity = row.activity.value;
        let mid = (row.lhs + row.rhs) / 2.0;
        let (side, slacksign) = if activity < mid {
            (row.lhs, -1i8)
        } else {
            (row.rhs, 1i8)
        };
        mirrhs += w * (side - row.constant);
        for i in 0..row.len() {
            let probindex = row.cols_probindex()[i];
            mircoef[probindex] += w * row.vals()[i];
        }
        used.push(MirRowContribution {
            row_id,
            weight: w,
            slacksign,
        });
    }

    (mircoef, mirrhs, used)
}

/// Intermediate bookkeeping `roundMIRRow` needs to re-sign and re-shift the
/// rounded coefficients back into original-variable space.
struct TransformInfo {
    varsign: Vec<E>,
    boundval: Vec<E>,
}

/// Phase 2 (`transformMIRRow`): shifts every variable with a nonzero
/// aggregated coefficient so its chosen bound sits at zero. Returns `None`
/// (no MIR possible) the moment a free variable carries a nonzero
/// coefficient.
fn transform_mir_row(
    lp: &Lp,
    mircoef: &mut [E],
    mirrhs: &mut E,
    vars: &[Variable],
    tol: &Tolerances,
) -> Option<TransformInfo> {
    let mut varsign = vec![1.0; mircoef.len()];
    let mut boundval = vec![0.0; mircoef.len()];

    for (j, coef) in mircoef.iter_mut().enumerate() {
        if tol.is_zero(*coef) {
            continue;
        }
        let var = &vars[j];
        let lb_finite = !tol.is_neg_infinity(var.lb);
        let ub_finite = !tol.is_infinity(var.ub);

        let (use_ub, bound) = match (lb_finite, ub_finite) {
            (false, false) => return None,
            (true, false) => (false, var.lb),
            (false, true) => (true, var.ub),
            (true, true) => {
                if var.status == VarStatus::Column {
                    let val = var
                        .colid
                        .map(|c| lp.col(c).primsol.value)
                        .unwrap_or(var.best_bound());
                    let width = var.ub - var.lb;
                    let use_ub = !tol.is_zero(width) && (var.ub - val) <= (1.0 - BOUNDSWITCH) * width;
                    (use_ub, if use_ub { var.ub } else { var.lb })
                } else {
                    let bb = var.best_bound();
                    (tol.is_eq(bb, var.ub), bb)
                }
            }
        };

        varsign[j] = if use_ub { -1.0 } else { 1.0 };
        boundval[j] = bound;
        *mirrhs -= *coef * bound;
        *coef *= varsign[j];
    }

    Some(TransformInfo { varsign, boundval })
}

/// Phase 3 (`roundMIRRow`): rounds the transformed coefficients against the
/// shifted rhs's fractional part `f0`, aborting if `f0` doesn't clear
/// `minfrac`. Returns `f0` on success.
fn round_mir_row(mircoef: &mut [E], mirrhs: E, vars: &[Variable], tol: &Tolerances, minfrac: E) -> Option<E> {
    let f0 = mirrhs - tol.floor(mirrhs);
    if f0 < minfrac || tol.is_zero(f0) {
        return None;
    }

    for (j, coef) in mircoef.iter_mut().enumerate() {
        if tol.is_zero(*coef) {
            continue;
        }
        if vars[j].is_integral_type() {
            let floor_aj = tol.floor(*coef);
            let fj = *coef - floor_aj;
            *coef = if fj <= f0 {
                floor_aj
            } else {
                floor_aj + (fj - f0) / (1.0 - f0)
            };
        } else if *coef < 0.0 {
            *coef /= 1.0 - f0;
        } else {
            *coef = 0.0;
        }
    }

    Some(f0)
}

/// Phase 4 (`substituteMIRRow`): any row whose slack entered with a
/// negative sign would otherwise leave a nonzero continuous-slack
/// coefficient in the cut; eliminate it by subtracting `w/(1-f0)` times that
/// row back out of the aggregated coefficients.
fn substitute_mir_row(lp: &Lp, mircoef: &mut [E], rows: &[MirRowContribution], f0: E) {
    for contrib in rows {
        if contrib.slacksign >= 0 {
            continue;
        }
        let row = lp.row(contrib.row_id);
        let factor = contrib.weight / (1.0 - f0);
        for i in 0..row.len() {
            let probindex = row.cols_probindex()[i];
            mircoef[probindex] -= factor * row.vals()[i];
        }
    }
}

/// Outcome of [`derive_mir_cut`]: `mircoef · x <= mirrhs` in original-space
/// variables, or `success = false` if any phase aborted (coefficients and
/// rhs are then whatever the aggregation phase produced, unrounded).
#[derive(Debug, Clone)]
pub struct MirCut {
    pub mircoef: Vec<E>,
    pub mirrhs: E,
    pub success: bool,
}

/// Runs all four phases of §4.7 in order.
pub fn derive_mir_cut(
    lp: &Lp,
    tol: &Tolerances,
    rows: &[(RowId, E)],
    vars: &[Variable],
    minfrac: E,
) -> MirCut {
    let nvars = vars.len();
    let (mut mircoef, orig_rhs, contributions) = sum_mir_row(lp, tol, rows, nvars);
    let mut mirrhs = orig_rhs;

    let Some(transform) = transform_mir_row(lp, &mut mircoef, &mut mirrhs, vars, tol) else {
        return MirCut {
            mircoef,
            mirrhs: orig_rhs,
            success: false,
        };
    };

    let Some(f0) = round_mir_row(&mut mircoef, mirrhs, vars, tol, minfrac) else {
        return MirCut {
            mircoef,
            mirrhs: orig_rhs,
            success: false,
        };
    };

    substitute_mir_row(lp, &mut mircoef, &contributions, f0);

    let mut final_rhs = tol.floor(mirrhs);
    for j in 0..mircoef.len() {
        let transformed_coef = mircoef[j];
        if tol.is_zero(transformed_coef) {
            continue;
        }
        final_rhs += transformed_coef * transform.varsign[j] * transform.boundval[j];
        coef_restore_sign(&mut mircoef, j, transform.varsign[j]);
    }

    MirCut {
        mircoef,
        mirrhs: final_rhs,
        success: true,
    }
}

/// Multiplies `mircoef[j]` by `sign`, re-expressing a transformed-space
/// coefficient back in original-variable space.
fn coef_restore_sign(mircoef: &mut [E], j: usize, sign: E) {
    mircoef[j] *= sign;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::Stat;
    use crate::variable::{VarId, VarType};

    fn build_row(lp: &mut Lp, stat: &mut Stat, tol: &Tolerances, lhs: E, rhs: E, coeffs: &[(VarId, E)]) -> RowId {
        let row = lp.create_row(stat, "cut-row", lhs, rhs);
        for &(varid, val) in coeffs {
            let col = lp.create_col(stat, varid, 0.0, 0.0, 1.0);
            lp.add_coeff(stat, tol, col, row, val).unwrap();
        }
        row
    }

    fn loose_var(probindex: usize, lb: E, ub: E) -> Variable {
        let mut v = Variable::new(probindex, 0.0, lb, ub, VarType::Integer);
        v.status = VarStatus::Loose;
        v
    }

    #[test]
    fn infeasible_fractionality_aborts_the_cut() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let tol = Tolerances::default();
        let row = build_row(
            &mut lp,
            &mut stat,
            &tol,
            -tol.infinity,
            4.0,
            &[(VarId(0), 2.0), (VarId(1), 3.0), (VarId(2), -1.0)],
        );
        lp.row_mut(row).activity.value = 0.0;

        let vars = vec![
            loose_var(0, 0.0, 1.0),
            loose_var(1, 0.0, 1.0),
            loose_var(2, 0.0, 1.0),
        ];

        let cut = derive_mir_cut(&lp, &tol, &[(row, 1.0)], &vars, 1e-4);
        assert!(!cut.success);
    }

    #[test]
    fn half_fractional_rhs_produces_the_expected_cut() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let tol = Tolerances::default();
        let row = build_row(
            &mut lp,
            &mut stat,
            &tol,
            -tol.infinity,
            3.5,
            &[(VarId(0), 2.0), (VarId(1), 3.0), (VarId(2), -1.0)],
        );
        lp.row_mut(row).activity.value = 0.0;

        let mut z = loose_var(2, 0.0, 1.0);
        z.vartype = VarType::Continuous;
        let vars = vec![loose_var(0, 0.0, 1.0), loose_var(1, 0.0, 1.0), z];

        let cut = derive_mir_cut(&lp, &tol, &[(row, 1.0)], &vars, 1e-4);

        assert!(cut.success);
        assert_eq!(cut.mircoef, vec![2.0, 3.0, -2.0]);
        assert_eq!(cut.mirrhs, 3.0);
    }

    #[test]
    fn substitution_eliminates_a_negative_sign_rows_slack() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let tol = Tolerances::default();
        let row_a = build_row(&mut lp, &mut stat, &tol, 1.0, tol.infinity, &[(VarId(0), 1.0)]);
        lp.row_mut(row_a).activity.value = 10.0;
        let row_b = build_row(&mut lp, &mut stat, &tol, 0.0, 5.0, &[(VarId(0), 1.0)]);
        lp.row_mut(row_b).activity.value = 0.0;

        let vars = vec![loose_var(0, 0.0, 1.0)];
        let (mut mircoef, mirrhs, contributions) =
            sum_mir_row(&lp, &tol, &[(row_a, 1.0), (row_b, 1.0)], vars.len());
        assert_eq!(contributions.len(), 2);
        let before = mircoef.clone();
        substitute_mir_row(&lp, &mut mircoef, &contributions, 0.5);
        assert_ne!(mircoef, before);
        let _ = mirrhs;
    }

    #[test]
    fn lp_sum_rows_keeps_the_finite_side_and_flags_the_infinite_one() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let tol = Tolerances::default();
        let row = build_row(&mut lp, &mut stat, &tol, -tol.infinity, 4.0, &[(VarId(0), 2.0)]);

        let sum = lp_sum_rows(&lp, &tol, &[(row, 1.0)], 1);

        assert!(sum.lhsinfinite);
        assert!(!sum.rhsinfinite);
        assert_eq!(sum.sumrhs, 4.0);
        assert_eq!(sum.coef, vec![2.0]);
    }

    #[test]
    fn free_variable_with_nonzero_coefficient_aborts_transform() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let tol = Tolerances::default();
        let row = build_row(&mut lp, &mut stat, &tol, -tol.infinity, 4.0, &[(VarId(0), 1.0)]);
        lp.row_mut(row).activity.value = 0.0;

        let vars = vec![loose_var(0, -tol.infinity, tol.infinity)];
        let cut = derive_mir_cut(&lp, &tol, &[(row, 1.0)], &vars, 1e-4);
        assert!(!cut.success);
    }
}
