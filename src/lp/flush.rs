//! Flush: synchronizing the current LP with the solver LP (§4.5).
//!
//! A sequence of six narrow, idempotent phases. Each phase only touches the
//! slice of state it owns (deleted columns, deleted rows, changed columns,
//! changed rows, added columns, added rows) so that a failure partway
//! through leaves the remaining phases as future work rather than corrupting
//! what already succeeded — `lp.flushed` is only set once every phase has
//! returned `Ok`.

use crate::E;
use crate::callback::{DiagnosticEvent, Diagnostics};
use crate::error::CoreResult;
use crate::lp::column::{ColId, StrongBranchCache, Tagged};
use crate::lp::container::Lp;
use crate::lp::lpi::LpSolverHandle;
use crate::lp::row::RowId;
use crate::numerics::Tolerances;
use crate::stat::Stat;

/// Runs every flush phase in order, then marks `lp.flushed`. No-op if the LP
/// is already flushed.
pub fn flush(
    lp: &mut Lp,
    stat: &mut Stat,
    tol: &Tolerances,
    lpi: &mut dyn LpSolverHandle,
    diag: Option<&mut dyn Diagnostics>,
) -> CoreResult<()> {
    if lp.flushed {
        return Ok(());
    }

    let ndeleted_cols = flush_del_cols(lp, lpi)?;
    let ndeleted_rows = flush_del_rows(lp, lpi)?;
    flush_chg_cols(lp, tol, lpi)?;
    flush_chg_rows(lp, tol, lpi)?;
    let nadded_cols = flush_add_cols(lp, stat, tol, lpi)?;
    let nadded_rows = flush_add_rows(lp, stat, tol, lpi)?;

    lp.flushed = true;

    if let Some(diag) = diag {
        diag.report(&DiagnosticEvent::FlushApplied {
            ndeleted: ndeleted_cols + ndeleted_rows,
            nadded: nadded_cols + nadded_rows,
        });
    }
    Ok(())
}

/// Phase 1: advance `lpifirstchgcol` past the unchanged prefix, then delete
/// everything beyond it from the solver.
fn flush_del_cols(lp: &mut Lp, lpi: &mut dyn LpSolverHandle) -> CoreResult<usize> {
    let mut first = lp.lpifirstchgcol().max(0) as usize;
    let shared = lp.cols().len().min(lp.lpicols().len());
    while first < shared && lp.cols()[first] == lp.lpicols()[first] && !lp.col(lp.cols()[first]).coefchanged {
        first += 1;
    }
    lp.set_lpifirstchgcol(first as i64);

    let nlpicols = lp.lpicols().len();
    if first >= nlpicols {
        return Ok(0);
    }

    lpi.del_cols(first as i64, nlpicols as i64 - 1)?;
    for i in first..nlpicols {
        let col_id = lp.lpicols()[i];
        let col = lp.col_mut(col_id);
        col.lpipos = -1;
        col.primsol = Tagged::default();
        col.redcost = Tagged::default();
        col.farkas = Tagged::default();
        col.strongbranch = StrongBranchCache::default();
    }
    lp.lpicols_mut().truncate(first);
    Ok(nlpicols - first)
}

/// Phase 2: symmetric to [`flush_del_cols`].
fn flush_del_rows(lp: &mut Lp, lpi: &mut dyn LpSolverHandle) -> CoreResult<usize> {
    let mut first = lp.lpifirstchgrow().max(0) as usize;
    let shared = lp.rows().len().min(lp.lpirows().len());
    while first < shared && lp.rows()[first] == lp.lpirows()[first] && !lp.row(lp.rows()[first]).coefchanged {
        first += 1;
    }
    lp.set_lpifirstchgrow(first as i64);

    let nlpirows = lp.lpirows().len();
    if first >= nlpirows {
        return Ok(0);
    }

    lpi.del_rows(first as i64, nlpirows as i64 - 1)?;
    for i in first..nlpirows {
        let row_id = lp.lpirows()[i];
        let row = lp.row_mut(row_id);
        row.lpipos = -1;
        row.dualsol = Tagged::default();
        row.activity = Tagged::default();
        row.dualfarkas = Tagged::default();
    }
    lp.lpirows_mut().truncate(first);
    Ok(nlpirows - first)
}

/// Phase 3: apply pending objective/bound changes on columns already known
/// to the solver. A column not yet flushed picks up its current `obj`/`lb`/
/// `ub` directly when [`flush_add_cols`] adds it, so its flags are cleared
/// here without a solver call.
fn flush_chg_cols(lp: &mut Lp, tol: &Tolerances, lpi: &mut dyn LpSolverHandle) -> CoreResult<()> {
    let chgcols: Vec<ColId> = lp.chgcols().to_vec();
    let solver_inf = lpi.infinity();

    let mut obj_idx = Vec::new();
    let mut obj_val = Vec::new();
    let mut bnd_idx = Vec::new();
    let mut bnd_lb = Vec::new();
    let mut bnd_ub = Vec::new();

    for &col_id in &chgcols {
        let col = lp.col(col_id);
        if col.lpipos < 0 {
            continue;
        }
        if col.objchanged {
            obj_idx.push(col.lpipos);
            obj_val.push(col.obj);
        }
        if col.lbchanged || col.ubchanged {
            bnd_idx.push(col.lpipos);
            bnd_lb.push(tol.to_solver_inf(col.lb, solver_inf));
            bnd_ub.push(tol.to_solver_inf(col.ub, solver_inf));
        }
    }

    if !obj_idx.is_empty() {
        lpi.chg_obj(&obj_idx, &obj_val)?;
    }
    if !bnd_idx.is_empty() {
        lpi.chg_bounds(&bnd_idx, &bnd_lb, &bnd_ub)?;
    }

    for &col_id in &chgcols {
        let col = lp.col_mut(col_id);
        col.objchanged = false;
        col.lbchanged = false;
        col.ubchanged = false;
        col.coefchanged = false;
    }
    lp.clear_chgcols();
    Ok(())
}

/// Phase 4: symmetric to [`flush_chg_cols`] for row sides, translating
/// `(lhs, rhs)` by `-constant` before they reach the solver.
fn flush_chg_rows(lp: &mut Lp, tol: &Tolerances, lpi: &mut dyn LpSolverHandle) -> CoreResult<()> {
    let chgrows: Vec<RowId> = lp.chgrows().to_vec();
    let solver_inf = lpi.infinity();

    let mut idx = Vec::new();
    let mut lhs = Vec::new();
    let mut rhs = Vec::new();

    for &row_id in &chgrows {
        let row = lp.row(row_id);
        if row.lpipos < 0 {
            continue;
        }
        if row.lhschanged || row.rhschanged {
            idx.push(row.lpipos);
            lhs.push(tol.to_solver_inf(row.lhs - row.constant, solver_inf));
            rhs.push(tol.to_solver_inf(row.rhs - row.constant, solver_inf));
        }
    }

    if !idx.is_empty() {
        lpi.chg_sides(&idx, &lhs, &rhs)?;
    }

    for &row_id in &chgrows {
        let row = lp.row_mut(row_id);
        row.lhschanged = false;
        row.rhschanged = false;
        row.coefchanged = false;
    }
    lp.clear_chgrows();
    Ok(())
}

/// Phase 5: link every not-yet-flushed column, then add it to the solver
/// with only the sparse entries that reference already-flushed rows; the
/// rest are realized when their row is added in [`flush_add_rows`] (§4.5
/// step 5 commentary on the fixed point this reaches in one flush call).
fn flush_add_cols(
    lp: &mut Lp,
    stat: &mut Stat,
    tol: &Tolerances,
    lpi: &mut dyn LpSolverHandle,
) -> CoreResult<usize> {
    let nlpicols = lp.lpicols().len();
    let ncols = lp.cols().len();
    if ncols <= nlpicols {
        return Ok(0);
    }
    let new_cols: Vec<ColId> = lp.cols()[nlpicols..].to_vec();
    for &col_id in &new_cols {
        lp.link_col(stat, tol, col_id);
    }

    let solver_inf = lpi.infinity();
    let mut obj = Vec::with_capacity(new_cols.len());
    let mut lb = Vec::with_capacity(new_cols.len());
    let mut ub = Vec::with_capacity(new_cols.len());
    let mut names = Vec::with_capacity(new_cols.len());
    let mut col_rows: Vec<Vec<i64>> = Vec::with_capacity(new_cols.len());
    let mut col_vals: Vec<Vec<E>> = Vec::with_capacity(new_cols.len());

    for &col_id in &new_cols {
        let col = lp.col(col_id);
        obj.push(col.obj);
        lb.push(tol.to_solver_inf(col.lb, solver_inf));
        ub.push(tol.to_solver_inf(col.ub, solver_inf));
        names.push(format!("c{}", col.index));

        let mut rows = Vec::new();
        let mut vals = Vec::new();
        for (i, &row_id) in col.rows().iter().enumerate() {
            if lp.row(row_id).lpipos >= 0 {
                rows.push(lp.row(row_id).lpipos);
                vals.push(col.vals()[i]);
            }
        }
        col_rows.push(rows);
        col_vals.push(vals);
    }

    lpi.add_cols(&obj, &lb, &ub, &names, &col_rows, &col_vals)?;

    for (i, &col_id) in new_cols.iter().enumerate() {
        lp.col_mut(col_id).lpipos = (nlpicols + i) as i64;
    }
    lp.lpicols_mut().extend(new_cols.iter().copied());
    Ok(new_cols.len())
}

/// Phase 6: link every not-yet-flushed row (which may mark a referenced
/// column `coefchanged` if that column is already in the solver — picked up
/// on the *next* flush) then add it with only entries referencing
/// already-flushed columns.
fn flush_add_rows(lp: &mut Lp, stat: &mut Stat, tol: &Tolerances, lpi: &mut dyn LpSolverHandle) -> CoreResult<usize> {
    let nlpirows = lp.lpirows().len();
    let nrows = lp.rows().len();
    if nrows <= nlpirows {
        return Ok(0);
    }
    let new_rows: Vec<RowId> = lp.rows()[nlpirows..].to_vec();
    for &row_id in &new_rows {
        lp.link_row(stat, row_id);
    }

    let solver_inf = lpi.infinity();
    let mut lhs = Vec::with_capacity(new_rows.len());
    let mut rhs = Vec::with_capacity(new_rows.len());
    let mut names = Vec::with_capacity(new_rows.len());
    let mut row_cols: Vec<Vec<i64>> = Vec::with_capacity(new_rows.len());
    let mut row_vals: Vec<Vec<E>> = Vec::with_capacity(new_rows.len());

    for &row_id in &new_rows {
        let row = lp.row(row_id);
        lhs.push(tol.to_solver_inf(row.lhs - row.constant, solver_inf));
        rhs.push(tol.to_solver_inf(row.rhs - row.constant, solver_inf));
        names.push(row.name.clone());

        let mut cols = Vec::new();
        let mut vals = Vec::new();
        for (i, &col_id) in row.cols().iter().enumerate() {
            if lp.col(col_id).lpipos >= 0 {
                cols.push(lp.col(col_id).lpipos);
                vals.push(row.vals()[i]);
            }
        }
        row_cols.push(cols);
        row_vals.push(vals);
    }

    lpi.add_rows(&lhs, &rhs, &names, &row_cols, &row_vals)?;

    for (i, &row_id) in new_rows.iter().enumerate() {
        lp.row_mut(row_id).lpipos = (nlpirows + i) as i64;
    }
    lp.lpirows_mut().extend(new_rows.iter().copied());
    Ok(new_rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::lpi::mock::MockLpi;
    use crate::variable::VarId;

    fn setup() -> (Lp, Stat, Tolerances, MockLpi) {
        (Lp::new(), Stat::new(), Tolerances::default(), MockLpi::new())
    }

    #[test]
    fn flush_adds_one_column_and_one_row() {
        let (mut lp, mut stat, tol, mut lpi) = setup();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        lp.add_coeff(&mut stat, &tol, col, row, 1.0).unwrap();
        lp.add_col(col).unwrap();
        lp.add_row(row).unwrap();

        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();

        assert!(lp.flushed);
        assert_eq!(lp.lpicols().len(), 1);
        assert_eq!(lp.lpirows().len(), 1);
        assert_eq!(lp.col(col).lpipos, 0);
        assert_eq!(lp.row(row).lpipos, 0);
        assert_eq!(lpi.row_cols[0], vec![0]);
        assert_eq!(lpi.row_vals[0], vec![1.0]);
    }

    #[test]
    fn second_flush_is_a_no_op() {
        let (mut lp, mut stat, tol, mut lpi) = setup();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        lp.add_col(col).unwrap();
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();
        assert_eq!(lp.lpicols().len(), 1);

        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();
        assert_eq!(lp.lpicols().len(), 1);
        assert!(lp.chgcols().is_empty());
    }

    #[test]
    fn row_added_before_its_column_realizes_the_coefficient_on_next_flush() {
        let (mut lp, mut stat, tol, mut lpi) = setup();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        lp.add_coeff(&mut stat, &tol, col, row, 2.0).unwrap();
        // Only the row enters the LP first; the column is unflushed so the
        // entry is dropped from this flush's row-add call.
        lp.add_row(row).unwrap();
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();
        assert_eq!(lpi.row_cols[0], Vec::<i64>::new());

        lp.add_col(col).unwrap();
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();
        assert_eq!(lp.col(col).lpipos, 0);
        // The coefficient is now picked up as a column-add entry referencing
        // the already-flushed row.
        assert_eq!(lpi.col_rows[0], vec![0]);
        assert_eq!(lpi.col_vals[0], vec![2.0]);
    }

    #[test]
    fn chg_cols_and_chg_rows_reach_the_solver() {
        let (mut lp, mut stat, tol, mut lpi) = setup();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        lp.add_col(col).unwrap();
        lp.add_row(row).unwrap();
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();

        lp.chg_obj(&tol, col, 5.0);
        lp.chg_ub(&tol, &mut stat, col, 3.0);
        lp.chg_rhs(&tol, row, 20.0);
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();

        assert_eq!(lpi.obj[0], 5.0);
        assert_eq!(lpi.ub[0], 3.0);
        assert_eq!(lpi.row_rhs[0], 20.0);
        assert!(!lp.col(col).objchanged);
        assert!(!lp.col(col).ubchanged);
        assert!(!lp.row(row).rhschanged);
    }

    #[test]
    fn deleted_columns_are_removed_from_the_solver_and_caches_reset() {
        let (mut lp, mut stat, tol, mut lpi) = setup();
        let c0 = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let c1 = lp.create_col(&mut stat, VarId(1), 1.0, 0.0, 10.0);
        lp.add_col(c0).unwrap();
        lp.add_col(c1).unwrap();
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();
        assert_eq!(lpi.obj.len(), 2);

        lp.del_colset(&mut stat, &[false, true]);
        flush(&mut lp, &mut stat, &tol, &mut lpi, None).unwrap();

        assert_eq!(lpi.obj.len(), 1);
        assert_eq!(lp.col(c1).lpipos, -1);
        assert_eq!(lp.col(c1).primsol.valid_at, 0);
    }
}
