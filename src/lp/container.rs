//! The `Lp` container: two arenas of stable-ID [`Col`]/[`Row`] entries plus
//! every cross-cutting operation that must see both sides of a link at once
//! (§4.1 linking/sorting/`coefChanged`, §4.2 row sides, §4.3 activities,
//! §4.4 membership and aging).
//!
//! Columns and rows never hold `Rc`/`Weak` pointers to each other: a `Col`
//! stores `RowId`s and a `linkpos` recording where its mirror entry lives in
//! that row's own arrays, and vice versa. Only `Lp` can dereference an id
//! into the other arena, which is why every two-sided operation lives here
//! rather than on `Col`/`Row` themselves.

use crate::E;
use crate::Status;
use crate::error::{CoreError, CoreResult};
use crate::lp::column::{Col, ColId};
use crate::lp::row::{Row, RowId};
use crate::numerics::Tolerances;
use crate::stat::Stat;
use crate::variable::Variable;

/// The LP-management core's own view of the problem: two arenas, the
/// current LP's membership order, the solver's last-known order, and the
/// flush bookkeeping that reconciles the two (§3, §4.4, §4.5).
#[derive(Debug, Clone)]
pub struct Lp {
    col_arena: Vec<Option<Col>>,
    row_arena: Vec<Option<Row>>,

    /// Columns currently in the LP, in the core's own order.
    cols: Vec<ColId>,
    /// Rows currently in the LP, in the core's own order.
    rows: Vec<RowId>,

    /// The solver's last-known column order (as of the last successful
    /// flush).
    lpicols: Vec<ColId>,
    /// The solver's last-known row order.
    lpirows: Vec<RowId>,

    /// Columns with a pending, not-yet-flushed objective/bound change.
    chgcols: Vec<ColId>,
    /// Rows with a pending, not-yet-flushed side change.
    chgrows: Vec<RowId>,

    /// Solver-order (`lpipos`) position below which columns are guaranteed
    /// unchanged since the last flush.
    lpifirstchgcol: i64,
    /// Same, for rows.
    lpifirstchgrow: i64,

    pub flushed: bool,
    pub solved: bool,
    pub primalfeasible: bool,
    pub dualfeasible: bool,

    pub lpobjval: E,
    pub lpsolstat: Status,

    /// Cutoff bound (§4.6): solves set the solver's objective limit to
    /// `cutoffbound - looseobjval`.
    pub cutoffbound: E,
    /// Sum of objective contributions from variables with no column.
    pub looseobjval: E,

    nremoveablecols: usize,
    nremoveablerows: usize,

    /// Recorded by [`Lp::mark_size`]; bounds the scope of `*_new` aging
    /// sweeps to entities added since the mark.
    firstnewcol: usize,
    firstnewrow: usize,

    pub diving: bool,
    /// Snapshot of the solver's basis taken by [`Lp::start_dive`], restored
    /// by [`Lp::end_dive`] (§4.4 diving supplement).
    divelpistate: Option<crate::lp::lpi::BasisState>,
    /// Set once an objective coefficient is changed while diving, so
    /// [`Lp::end_dive`] knows the pseudo objective needs recomputing.
    pub divingobjchg: bool,
}

impl Default for Lp {
    fn default() -> Self {
        Self::new()
    }
}

impl Lp {
    pub fn new() -> Self {
        Self {
            col_arena: Vec::new(),
            row_arena: Vec::new(),
            cols: Vec::new(),
            rows: Vec::new(),
            lpicols: Vec::new(),
            lpirows: Vec::new(),
            chgcols: Vec::new(),
            chgrows: Vec::new(),
            lpifirstchgcol: 0,
            lpifirstchgrow: 0,
            flushed: true,
            solved: false,
            primalfeasible: false,
            dualfeasible: false,
            lpobjval: 0.0,
            lpsolstat: Status::NotSolved,
            cutoffbound: E::INFINITY,
            looseobjval: 0.0,
            nremoveablecols: 0,
            nremoveablerows: 0,
            firstnewcol: 0,
            firstnewrow: 0,
            diving: false,
            divelpistate: None,
            divingobjchg: false,
        }
    }

    /// Rejects structural modification while diving (§4.4, §5 "operations
    /// that assume diving off assert on entry"). Objective/bound changes are
    /// exempt and go through [`Lp::chg_obj`]/[`Lp::chg_lb`]/[`Lp::chg_ub`]
    /// unconditionally.
    fn check_not_diving(&self) -> CoreResult<()> {
        if self.diving {
            return Err(CoreError::invalid_call(
                "structural LP modification is forbidden while diving",
            )
            .into());
        }
        Ok(())
    }

    /// `lpStartDive`: snapshots the solver's basis and enters diving mode,
    /// during which only objective/bound probing is allowed (§4.4
    /// supplement).
    pub fn start_dive(&mut self, lpi: &mut dyn crate::lp::lpi::LpSolverHandle) -> CoreResult<()> {
        if self.diving {
            return Err(CoreError::invalid_call("already diving").into());
        }
        self.divelpistate = Some(lpi.get_basis()?);
        self.divingobjchg = false;
        self.diving = true;
        Ok(())
    }

    /// `lpEndDive`: restores the solver basis snapshotted by
    /// [`Lp::start_dive`] and leaves diving mode.
    pub fn end_dive(&mut self, lpi: &mut dyn crate::lp::lpi::LpSolverHandle) -> CoreResult<()> {
        if !self.diving {
            return Err(CoreError::invalid_call("not diving").into());
        }
        if let Some(state) = self.divelpistate.take() {
            lpi.set_basis(&state)?;
        }
        self.divingobjchg = false;
        self.diving = false;
        Ok(())
    }

    // ---- arena access -------------------------------------------------

    pub fn col(&self, id: ColId) -> &Col {
        self.col_arena[id.0 as usize]
            .as_ref()
            .expect("dangling ColId")
    }

    pub fn col_mut(&mut self, id: ColId) -> &mut Col {
        self.col_arena[id.0 as usize]
            .as_mut()
            .expect("dangling ColId")
    }

    pub fn row(&self, id: RowId) -> &Row {
        self.row_arena[id.0 as usize]
            .as_ref()
            .expect("dangling RowId")
    }

    pub fn row_mut(&mut self, id: RowId) -> &mut Row {
        self.row_arena[id.0 as usize]
            .as_mut()
            .expect("dangling RowId")
    }

    pub fn cols(&self) -> &[ColId] {
        &self.cols
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn lpicols(&self) -> &[ColId] {
        &self.lpicols
    }

    pub fn lpirows(&self) -> &[RowId] {
        &self.lpirows
    }

    pub(crate) fn lpicols_mut(&mut self) -> &mut Vec<ColId> {
        &mut self.lpicols
    }

    pub(crate) fn lpirows_mut(&mut self) -> &mut Vec<RowId> {
        &mut self.lpirows
    }

    pub fn lpifirstchgcol(&self) -> i64 {
        self.lpifirstchgcol
    }

    pub fn lpifirstchgrow(&self) -> i64 {
        self.lpifirstchgrow
    }

    pub(crate) fn set_lpifirstchgcol(&mut self, v: i64) {
        self.lpifirstchgcol = v;
    }

    pub(crate) fn set_lpifirstchgrow(&mut self, v: i64) {
        self.lpifirstchgrow = v;
    }

    pub fn chgcols(&self) -> &[ColId] {
        &self.chgcols
    }

    pub fn chgrows(&self) -> &[RowId] {
        &self.chgrows
    }

    pub(crate) fn clear_chgcols(&mut self) {
        self.chgcols.clear();
    }

    pub(crate) fn clear_chgrows(&mut self) {
        self.chgrows.clear();
    }

    pub fn nremoveablecols(&self) -> usize {
        self.nremoveablecols
    }

    pub fn nremoveablerows(&self) -> usize {
        self.nremoveablerows
    }

    // ---- allocation -----------------------------------------------------

    /// Allocates a new column in the arena, not yet a member of the LP
    /// (`lppos == -1`).
    pub fn create_col(
        &mut self,
        stat: &mut Stat,
        varid: crate::variable::VarId,
        obj: E,
        lb: E,
        ub: E,
    ) -> ColId {
        let index = stat.next_col_index();
        let id = ColId(self.col_arena.len() as u32);
        self.col_arena.push(Some(Col::new(varid, obj, lb, ub, index)));
        id
    }

    pub fn create_row(
        &mut self,
        stat: &mut Stat,
        name: impl Into<String>,
        lhs: E,
        rhs: E,
    ) -> RowId {
        let index = stat.next_row_index();
        let id = RowId(self.row_arena.len() as u32);
        self.row_arena.push(Some(Row::new(name, lhs, rhs, index)));
        id
    }

    // ---- §4.1 coefficient maintenance -----------------------------------

    /// Adds a nonzero entry `(row_id, col_id, val)` to both sides,
    /// unlinked; [`Lp::link_col`]/[`Lp::link_row`] resolve the cross-link
    /// later (at latest, during the next flush). Precondition: `val != 0`
    /// within `tol.epsilon` (`colAddCoeff`/`rowAddCoeff`, §4.1).
    pub fn add_coeff(
        &mut self,
        stat: &mut Stat,
        tol: &Tolerances,
        col_id: ColId,
        row_id: RowId,
        val: E,
    ) -> CoreResult<()> {
        if tol.is_zero(val) {
            return Err(CoreError::invalid_data("coefficient added is zero").into());
        }

        let col_last_index = self.col(col_id).rows().last().map(|&r| self.row(r).index);
        {
            let col = self.col_mut(col_id);
            col.raw_append(row_id, val, -1);
            if let Some(prev) = col_last_index {
                if self.row(row_id).index < prev {
                    self.col_mut(col_id).sorted = false;
                }
            }
        }

        let row_last_index = self.row(row_id).cols().last().map(|&c| self.col(c).index);
        {
            let col_index = self.col(col_id).index;
            let probindex = self.col(col_id).varid.0 as usize;
            let row = self.row_mut(row_id);
            row.raw_append(col_id, probindex, val, -1);
            if let Some(prev) = row_last_index {
                if col_index < prev {
                    row.sorted = false;
                }
            }
            if !row.delaysort {
                row.add_norms(row.len() - 1, val, tol);
            }
        }

        self.coef_changed(stat, row_id, col_id);
        Ok(())
    }

    /// Removes the entry linking `col_id` and `row_id` from both sides,
    /// fixing up the back-pointer of whatever entry was swapped into the
    /// vacated slot on each side (`colDelCoeffPos`/`rowDelCoeffPos`, §4.1).
    pub fn del_coeff(
        &mut self,
        stat: &mut Stat,
        tol: &Tolerances,
        col_id: ColId,
        row_id: RowId,
    ) -> CoreResult<()> {
        let col_pos = self
            .col(col_id)
            .find_linear(row_id)
            .ok_or_else(|| CoreError::invalid_data("no such coefficient"))?;
        let val = self.col(col_id).vals()[col_pos];

        let (_, removed_linkpos, moved) = self.col_mut(col_id).raw_remove(col_pos);
        if let Some((new_pos, moved_row_id)) = moved {
            let mirror_pos = self.col(col_id).linkpos()[new_pos];
            if mirror_pos >= 0 {
                self.row_mut(moved_row_id)
                    .set_linkpos(mirror_pos as usize, new_pos as i32);
            }
        }

        let row_pos = if removed_linkpos >= 0 {
            removed_linkpos as usize
        } else {
            self.row(row_id)
                .find_linear(col_id)
                .ok_or_else(|| CoreError::invalid_data("cross-link missing on row side"))?
        };

        if !self.row(row_id).delaysort {
            let needs_recalc = self.row_mut(row_id).del_norms(val, tol);
            if needs_recalc {
                let tol = *tol;
                self.row_mut(row_id).calc_norms(&tol);
            }
        }

        let (_, _, moved) = self.row_mut(row_id).raw_remove(row_pos);
        if let Some((new_pos, moved_col_id)) = moved {
            let mirror_pos = self.row(row_id).linkpos()[new_pos];
            if mirror_pos >= 0 {
                self.col_mut(moved_col_id)
                    .set_linkpos(mirror_pos as usize, new_pos as i32);
            }
        }

        self.coef_changed(stat, row_id, col_id);
        Ok(())
    }

    /// Zero clears the entry, unchanged is a no-op, otherwise updates in
    /// place and calls `coefChanged` (`colChgCoeffPos`/`rowChgCoeffPos`,
    /// §4.1).
    pub fn chg_coeff(
        &mut self,
        stat: &mut Stat,
        tol: &Tolerances,
        col_id: ColId,
        row_id: RowId,
        val: E,
    ) -> CoreResult<()> {
        let col_pos = self
            .col(col_id)
            .find_linear(row_id)
            .ok_or_else(|| CoreError::invalid_data("no such coefficient"))?;
        let old = self.col(col_id).vals()[col_pos];

        if tol.is_zero(val) {
            return self.del_coeff(stat, tol, col_id, row_id);
        }
        if tol.is_eq(old, val) {
            return Ok(());
        }

        self.col_mut(col_id).set_val(col_pos, val);
        let row_pos = self
            .row(row_id)
            .find_linear(col_id)
            .ok_or_else(|| CoreError::invalid_data("cross-link missing on row side"))?;
        self.row_mut(row_id).set_val(row_pos, val);

        if !self.row(row_id).delaysort {
            let needs_recalc = self.row_mut(row_id).del_norms(old, tol);
            self.row_mut(row_id).add_norms(row_pos, val, tol);
            if needs_recalc {
                let tol = *tol;
                self.row_mut(row_id).calc_norms(&tol);
            }
        }

        self.coef_changed(stat, row_id, col_id);
        Ok(())
    }

    /// §4.1 `coefChanged`: decide which side remembers a coefficient
    /// change so the solver readback doesn't double-count it, then
    /// invalidate every cache that depends on LP structure.
    fn coef_changed(&mut self, stat: &mut Stat, row_id: RowId, col_id: ColId) {
        let row_lpipos = self.row(row_id).lpipos;
        let col_lpipos = self.col(col_id).lpipos;

        if row_lpipos >= 0 && row_lpipos >= self.lpifirstchgrow {
            self.tag_row_changed(row_id);
        } else if col_lpipos >= 0 && col_lpipos >= self.lpifirstchgcol {
            self.tag_col_changed(col_id);
        } else if row_lpipos >= 0 || col_lpipos >= 0 {
            let row_gap = if row_lpipos >= 0 {
                self.lpifirstchgrow - row_lpipos
            } else {
                i64::MAX
            };
            let col_gap = if col_lpipos >= 0 {
                self.lpifirstchgcol - col_lpipos
            } else {
                i64::MAX
            };
            if row_gap <= col_gap {
                self.lpifirstchgrow = self.lpifirstchgrow.min(row_lpipos);
                self.tag_row_changed(row_id);
            } else {
                self.lpifirstchgcol = self.lpifirstchgcol.min(col_lpipos);
                self.tag_col_changed(col_id);
            }
        }

        self.flushed = false;
        self.solved = false;
        self.primalfeasible = false;
        self.dualfeasible = false;
        self.lpobjval = E::NAN;
        self.lpsolstat = Status::NotSolved;

        let row = self.row_mut(row_id);
        row.pseudoactivity.invalidate();
        row.minactivity.invalidate();
        row.maxactivity.invalidate();
        let _ = stat;
    }

    fn tag_row_changed(&mut self, row_id: RowId) {
        let row = self.row_mut(row_id);
        if !row.coefchanged {
            row.coefchanged = true;
            self.chgrows.push(row_id);
        }
    }

    fn tag_col_changed(&mut self, col_id: ColId) {
        let col = self.col_mut(col_id);
        if !col.coefchanged {
            col.coefchanged = true;
            self.chgcols.push(col_id);
        }
    }

    // ---- §4.1 linking ----------------------------------------------------

    /// Resolves every currently-unlinked entry of `col_id` against the
    /// corresponding row, creating the mirror entry on the row side if it
    /// doesn't already exist (`colLink`, §4.1).
    pub fn link_col(&mut self, stat: &mut Stat, tol: &Tolerances, col_id: ColId) {
        let positions: Vec<usize> = (0..self.col(col_id).len())
            .filter(|&p| self.col(col_id).linkpos()[p] == -1)
            .collect();

        for pos in positions {
            let row_id = self.col(col_id).rows()[pos];
            let val = self.col(col_id).vals()[pos];
            if let Some(row_pos) = self.row(row_id).find_linear(col_id) {
                self.col_mut(col_id).set_linkpos(pos, row_pos as i32);
                self.row_mut(row_id).set_linkpos(row_pos, pos as i32);
            } else {
                let probindex = self.col(col_id).varid.0 as usize;
                let row = self.row_mut(row_id);
                let row_pos = row.raw_append(col_id, probindex, val, pos as i32);
                if !row.delaysort {
                    row.add_norms(row_pos, val, tol);
                }
                self.col_mut(col_id).set_linkpos(pos, row_pos as i32);
                if self.row(row_id).is_flushed() {
                    self.tag_row_changed(row_id);
                }
            }
        }
        let _ = stat;
    }

    /// Symmetric to [`Lp::link_col`]: resolves unlinked row entries,
    /// creating the mirror column entry via an equivalent of `colAddCoeff`
    /// if it's missing (`rowLink`, §4.1, §4.5 step 6).
    pub fn link_row(&mut self, stat: &mut Stat, row_id: RowId) {
        let positions: Vec<usize> = (0..self.row(row_id).len())
            .filter(|&p| self.row(row_id).linkpos()[p] == -1)
            .collect();

        for pos in positions {
            let col_id = self.row(row_id).cols()[pos];
            let val = self.row(row_id).vals()[pos];
            if let Some(col_pos) = self.col(col_id).find_linear(row_id) {
                self.row_mut(row_id).set_linkpos(pos, col_pos as i32);
                self.col_mut(col_id).set_linkpos(col_pos, pos as i32);
            } else {
                let col_pos = self.col_mut(col_id).raw_append(row_id, val, pos as i32);
                self.row_mut(row_id).set_linkpos(pos, col_pos as i32);
                if self.col(col_id).is_flushed() {
                    self.tag_col_changed(col_id);
                }
            }
        }
        let _ = stat;
    }

    pub fn unlink_col(&mut self, col_id: ColId) {
        let entries: Vec<(RowId, i32)> = self
            .col(col_id)
            .rows()
            .iter()
            .copied()
            .zip(self.col(col_id).linkpos().iter().copied())
            .collect();
        for (row_id, linkpos) in entries {
            if linkpos >= 0 {
                self.row_mut(row_id).set_linkpos(linkpos as usize, -1);
            }
        }
        for p in self.col_mut(col_id).linkpos_mut() {
            *p = -1;
        }
    }

    pub fn unlink_row(&mut self, row_id: RowId) {
        let entries: Vec<(ColId, i32)> = self
            .row(row_id)
            .cols()
            .iter()
            .copied()
            .zip(self.row(row_id).linkpos().iter().copied())
            .collect();
        for (col_id, linkpos) in entries {
            if linkpos >= 0 {
                self.col_mut(col_id).set_linkpos(linkpos as usize, -1);
            }
        }
        for p in self.row_mut(row_id).linkpos_mut() {
            *p = -1;
        }
    }

    // ---- §4.1 sorting ------------------------------------------------------

    pub fn sort_col(&mut self, col_id: ColId) {
        if self.col(col_id).sorted {
            return;
        }
        let len = self.col(col_id).len();
        let mut order: Vec<usize> = (0..len).collect();
        let indices: Vec<u64> = self
            .col(col_id)
            .rows()
            .iter()
            .map(|&r| self.row(r).index)
            .collect();
        order.sort_by_key(|&i| indices[i]);

        let rows: Vec<RowId> = order.iter().map(|&i| self.col(col_id).rows()[i]).collect();
        let vals: Vec<E> = order.iter().map(|&i| self.col(col_id).vals()[i]).collect();
        let linkpos: Vec<i32> = order
            .iter()
            .map(|&i| self.col(col_id).linkpos()[i])
            .collect();

        self.col_mut(col_id).replace_arrays(rows.clone(), vals, linkpos.clone());

        for (new_pos, (&row_id, &mirror_pos)) in rows.iter().zip(linkpos.iter()).enumerate() {
            if mirror_pos >= 0 {
                self.row_mut(row_id)
                    .set_linkpos(mirror_pos as usize, new_pos as i32);
            }
        }
        self.col_mut(col_id).sorted = true;
    }

    pub fn sort_row(&mut self, row_id: RowId) {
        if self.row(row_id).sorted || self.row(row_id).delaysort {
            return;
        }
        self.force_sort_row_unchecked(row_id);
    }

    /// `SCIProwForceSort`: sorts regardless of `delaysort`, merges adjacent
    /// equal-column entries (summing values), and drops zero-valued ones.
    /// The row must be fully unlinked beforehand; relinking afterward is
    /// the caller's responsibility (§4.1 "Sorting").
    pub fn force_sort_row(&mut self, tol: &Tolerances, row_id: RowId) {
        debug_assert!(
            self.row(row_id).linkpos().iter().all(|&p| p == -1),
            "row must be unlinked before a force-sort merge"
        );
        self.force_sort_row_unchecked(row_id);
        self.merge_row_duplicates(tol, row_id);
    }

    fn force_sort_row_unchecked(&mut self, row_id: RowId) {
        let len = self.row(row_id).len();
        let mut order: Vec<usize> = (0..len).collect();
        let indices: Vec<u64> = self
            .row(row_id)
            .cols()
            .iter()
            .map(|&c| self.col(c).index)
            .collect();
        order.sort_by_key(|&i| indices[i]);

        let cols: Vec<ColId> = order.iter().map(|&i| self.row(row_id).cols()[i]).collect();
        let vals: Vec<E> = order.iter().map(|&i| self.row(row_id).vals()[i]).collect();
        let linkpos: Vec<i32> = order
            .iter()
            .map(|&i| self.row(row_id).linkpos()[i])
            .collect();
        let probindex: Vec<usize> = order
            .iter()
            .map(|&i| self.row(row_id).cols_probindex()[i])
            .collect();

        self.row_mut(row_id)
            .replace_arrays(cols.clone(), probindex, vals, linkpos.clone());

        for (new_pos, (&col_id, &mirror_pos)) in cols.iter().zip(linkpos.iter()).enumerate() {
            if mirror_pos >= 0 {
                self.col_mut(col_id)
                    .set_linkpos(mirror_pos as usize, new_pos as i32);
            }
        }
        self.row_mut(row_id).sorted = true;
    }

    fn merge_row_duplicates(&mut self, tol: &Tolerances, row_id: RowId) {
        let len = self.row(row_id).len();
        let mut write = 0usize;
        let mut cols = Vec::with_capacity(len);
        let mut vals: Vec<E> = Vec::with_capacity(len);
        let mut probindex = Vec::with_capacity(len);

        for read in 0..len {
            let col_id = self.row(row_id).cols()[read];
            let val = self.row(row_id).vals()[read];
            let pidx = self.row(row_id).cols_probindex()[read];
            if write > 0 && cols[write - 1] == col_id {
                vals[write - 1] += val;
            } else {
                cols.push(col_id);
                vals.push(val);
                probindex.push(pidx);
                write += 1;
            }
        }

        let (cols, vals, probindex): (Vec<_>, Vec<_>, Vec<_>) = cols
            .into_iter()
            .zip(vals)
            .zip(probindex)
            .filter(|((_, v), _)| !tol.is_zero(*v))
            .map(|((c, v), p)| (c, v, p))
            .fold(
                (Vec::new(), Vec::new(), Vec::new()),
                |(mut cs, mut vs, mut ps), (c, v, p)| {
                    cs.push(c);
                    vs.push(v);
                    ps.push(p);
                    (cs, vs, ps)
                },
            );

        let linkpos = vec![-1i32; cols.len()];
        self.row_mut(row_id)
            .replace_arrays(cols, probindex, vals, linkpos);
        let tol_copy = *tol;
        self.row_mut(row_id).calc_norms(&tol_copy);
    }

    // ---- §4.2 row sides --------------------------------------------------

    pub fn chg_lhs(&mut self, tol: &Tolerances, row_id: RowId, lhs: E) {
        if tol.is_eq(self.row(row_id).lhs, lhs) {
            return;
        }
        let row = self.row_mut(row_id);
        row.lhs = lhs;
        row.lhschanged = true;
        self.enqueue_row_change(row_id);
    }

    pub fn chg_rhs(&mut self, tol: &Tolerances, row_id: RowId, rhs: E) {
        if tol.is_eq(self.row(row_id).rhs, rhs) {
            return;
        }
        let row = self.row_mut(row_id);
        row.rhs = rhs;
        row.rhschanged = true;
        self.enqueue_row_change(row_id);
    }

    fn enqueue_row_change(&mut self, row_id: RowId) {
        if !self.chgrows.contains(&row_id) {
            self.chgrows.push(row_id);
        }
        self.flushed = false;
        self.solved = false;
    }

    // ---- column objective/bound changes ---------------------------------

    /// `SCIPlpChgObj`: allowed even while diving (§4.4 diving supplement),
    /// recorded in `divingobjchg` so [`Lp::end_dive`] knows the pseudo
    /// objective needs recomputing.
    pub fn chg_obj(&mut self, tol: &Tolerances, col_id: ColId, obj: E) {
        if tol.is_eq(self.col(col_id).obj, obj) {
            return;
        }
        let col = self.col_mut(col_id);
        col.obj = obj;
        col.objchanged = true;
        if self.diving {
            self.divingobjchg = true;
        }
        self.enqueue_col_change(col_id);
    }

    pub fn chg_lb(&mut self, tol: &Tolerances, stat: &mut Stat, col_id: ColId, lb: E) {
        if tol.is_eq(self.col(col_id).lb, lb) {
            return;
        }
        let col = self.col_mut(col_id);
        col.lb = lb;
        col.lbchanged = true;
        self.invalidate_bound_caches(col_id);
        stat.advance_bound_change();
        self.enqueue_col_change(col_id);
    }

    pub fn chg_ub(&mut self, tol: &Tolerances, stat: &mut Stat, col_id: ColId, ub: E) {
        if tol.is_eq(self.col(col_id).ub, ub) {
            return;
        }
        let col = self.col_mut(col_id);
        col.ub = ub;
        col.ubchanged = true;
        self.invalidate_bound_caches(col_id);
        stat.advance_bound_change();
        self.enqueue_col_change(col_id);
    }

    /// A column bound change invalidates the pseudo/bound activity of every
    /// row the column participates in (§4.3); `stat.advance_bound_change`
    /// already moved the epoch forward, but the row caches carry their own
    /// `Tagged` copy that must be force-missed too since it may have been
    /// read-and-cached at the *old* epoch value within the same tick.
    fn invalidate_bound_caches(&mut self, col_id: ColId) {
        let rows: Vec<RowId> = self.col(col_id).rows().to_vec();
        for row_id in rows {
            let row = self.row_mut(row_id);
            row.pseudoactivity.invalidate();
            row.minactivity.invalidate();
            row.maxactivity.invalidate();
        }
    }

    fn enqueue_col_change(&mut self, col_id: ColId) {
        if !self.chgcols.contains(&col_id) {
            self.chgcols.push(col_id);
        }
        self.flushed = false;
        self.solved = false;
    }

    /// `SCIProwChgConstant`: shifts `constant`, bumping already-valid
    /// pseudo/bound activities in place rather than invalidating them,
    /// since they remain correct under the same bound-change epoch once
    /// adjusted by `c - constant` (§4.2).
    pub fn chg_constant(&mut self, stat: &Stat, row_id: RowId, c: E) {
        let delta = c - self.row(row_id).constant;
        let row = self.row_mut(row_id);
        row.constant = c;
        if let Some(v) = row.pseudoactivity.get(stat.nboundchanges) {
            row.pseudoactivity.set(v + delta, stat.nboundchanges);
        }
        if let Some(v) = row.minactivity.get(stat.nboundchanges) {
            row.minactivity.set(v + delta, stat.nboundchanges);
        }
        if let Some(v) = row.maxactivity.get(stat.nboundchanges) {
            row.maxactivity.set(v + delta, stat.nboundchanges);
        }
        row.lhschanged = true;
        row.rhschanged = true;
        self.enqueue_row_change(row_id);
    }

    /// `SCIProwMakeRational`: tries, in order, (1) scale by `1/min|v| * 2^k`,
    /// (2) scale by `2^k` directly, (3) a bounded-denominator rational
    /// scale. Returns `true` on success, after which every coefficient and
    /// both sides have been rescaled via [`Lp::scale_row`].
    pub fn make_rational(
        &mut self,
        tol: &Tolerances,
        row_id: RowId,
        maxdnom: i64,
        maxscale: E,
        vars: &[Variable],
    ) -> bool {
        let vals: Vec<E> = self.row(row_id).vals().to_vec();
        if vals.is_empty() {
            return true;
        }

        if let Some(scale) = Self::scale_candidate_min_pow2(&vals, tol, maxscale) {
            self.scale_row(tol, row_id, scale, vars);
            return true;
        }
        if let Some(scale) = Self::scale_candidate_pow2(&vals, tol, maxscale) {
            self.scale_row(tol, row_id, scale, vars);
            return true;
        }
        if let Some(scale) = Self::scale_candidate_rational(&vals, tol, maxdnom, maxscale) {
            self.scale_row(tol, row_id, scale, vars);
            return true;
        }
        false
    }

    fn scale_candidate_min_pow2(vals: &[E], tol: &Tolerances, maxscale: E) -> Option<E> {
        let minabs = vals
            .iter()
            .map(|v| v.abs())
            .filter(|v| *v > 0.0)
            .fold(E::INFINITY, E::min);
        if !minabs.is_finite() {
            return None;
        }
        for k in 0..64 {
            let scale = (1.0 / minabs) * (2.0f64).powi(k);
            if scale > maxscale {
                return None;
            }
            if vals.iter().all(|v| tol.is_integral(v * scale)) {
                return Some(scale);
            }
        }
        None
    }

    fn scale_candidate_pow2(vals: &[E], tol: &Tolerances, maxscale: E) -> Option<E> {
        for k in 0..64 {
            let scale = (2.0f64).powi(k);
            if scale > maxscale {
                return None;
            }
            if vals
                .iter()
                .all(|v| (v * scale - (v * scale).round()).abs() < tol.epsilon * 10.0)
            {
                return Some(scale);
            }
        }
        None
    }

    fn scale_candidate_rational(
        vals: &[E],
        tol: &Tolerances,
        maxdnom: i64,
        maxscale: E,
    ) -> Option<E> {
        fn gcd(a: i64, b: i64) -> i64 {
            if b == 0 { a.abs() } else { gcd(b, a % b) }
        }
        fn lcm(a: i64, b: i64) -> i64 {
            if a == 0 || b == 0 { 0 } else { (a / gcd(a, b)).abs() * b.abs() }
        }

        let mut num_gcd = 0i64;
        let mut den_lcm = 1i64;
        for &v in vals {
            let (p, q) = Self::rational_approx(v, maxdnom, tol);
            num_gcd = gcd(num_gcd, p);
            den_lcm = lcm(den_lcm, q);
            if den_lcm == 0 || den_lcm.unsigned_abs() as E > maxscale {
                return None;
            }
        }
        if num_gcd == 0 {
            return None;
        }
        let scale = den_lcm as E / num_gcd as E;
        if scale.abs() > maxscale || !scale.is_finite() {
            return None;
        }
        Some(scale)
    }

    /// Continued-fraction rational approximation of `v` with denominator
    /// bounded by `maxdnom`.
    fn rational_approx(v: E, maxdnom: i64, tol: &Tolerances) -> (i64, i64) {
        if tol.is_zero(v) {
            return (0, 1);
        }
        let sign = if v < 0.0 { -1 } else { 1 };
        let v = v.abs();
        let (mut p0, mut q0, mut p1, mut q1) = (0i64, 1i64, 1i64, 0i64);
        let mut x = v;
        for _ in 0..32 {
            let a = x.floor() as i64;
            let p2 = a * p1 + p0;
            let q2 = a * q1 + q0;
            if q2 > maxdnom {
                break;
            }
            p0 = p1;
            q0 = q1;
            p1 = p2;
            q1 = q2;
            let frac = x - a as E;
            if tol.is_zero(frac) {
                break;
            }
            x = 1.0 / frac;
        }
        if q1 == 0 { (sign, 1) } else { (sign * p1, q1) }
    }

    /// `rowScale`: multiplies every coefficient by `scale` (rounding
    /// near-integers), moves `constant` into both sides by the same
    /// factor, zeroes `constant`, and rounds the sides outward if the row
    /// has no continuous entries left.
    pub fn scale_row(&mut self, tol: &Tolerances, row_id: RowId, scale: E, vars: &[Variable]) {
        let len = self.row(row_id).len();
        for pos in 0..len {
            let v = self.row(row_id).vals()[pos] * scale;
            let rounded = v.round();
            let v = if tol.is_zero(v - rounded) { rounded } else { v };
            self.row_mut(row_id).set_val(pos, v);
        }

        let row = self.row_mut(row_id);
        let constant = row.constant;
        if !tol.is_neg_infinity(row.lhs) {
            row.lhs = (row.lhs - constant) * scale;
        }
        if !tol.is_infinity(row.rhs) {
            row.rhs = (row.rhs - constant) * scale;
        }
        row.constant = 0.0;

        let all_integral = self
            .row(row_id)
            .cols_probindex()
            .iter()
            .all(|&probindex| vars[probindex].is_integral_type());
        if all_integral {
            let row = self.row_mut(row_id);
            if !tol.is_neg_infinity(row.lhs) {
                row.lhs = tol.ceil(row.lhs);
            }
            if !tol.is_infinity(row.rhs) {
                row.rhs = tol.floor(row.rhs);
            }
        }

        let tol_copy = *tol;
        self.row_mut(row_id).calc_norms(&tol_copy);
    }

    // ---- §4.3 activities ---------------------------------------------------

    pub fn lp_activity(&mut self, stat: &Stat, row_id: RowId) -> E {
        if let Some(v) = self.row(row_id).activity.get(stat.lpcount) {
            return v;
        }
        let len = self.row(row_id).len();
        let mut act = self.row(row_id).constant;
        for i in 0..len {
            let c = self.row(row_id).cols()[i];
            let v = self.row(row_id).vals()[i];
            act += v * self.col(c).primsol.value;
        }
        self.row_mut(row_id).activity.set(act, stat.lpcount);
        act
    }

    pub fn pseudo_activity(&mut self, stat: &Stat, row_id: RowId) -> E {
        if let Some(v) = self.row(row_id).pseudoactivity.get(stat.nboundchanges) {
            return v;
        }
        let len = self.row(row_id).len();
        let mut act = self.row(row_id).constant;
        for i in 0..len {
            let c = self.row(row_id).cols()[i];
            let v = self.row(row_id).vals()[i];
            act += v * self.col(c).best_bound();
        }
        self.row_mut(row_id)
            .pseudoactivity
            .set(act, stat.nboundchanges);
        act
    }

    pub fn min_activity(&mut self, stat: &Stat, tol: &Tolerances, row_id: RowId) -> E {
        if let Some(v) = self.row(row_id).minactivity.get(stat.nboundchanges) {
            return v;
        }
        let v = self.bound_activity(tol, row_id, true);
        self.row_mut(row_id).minactivity.set(v, stat.nboundchanges);
        v
    }

    pub fn max_activity(&mut self, stat: &Stat, tol: &Tolerances, row_id: RowId) -> E {
        if let Some(v) = self.row(row_id).maxactivity.get(stat.nboundchanges) {
            return v;
        }
        let v = self.bound_activity(tol, row_id, false);
        self.row_mut(row_id).maxactivity.set(v, stat.nboundchanges);
        v
    }

    fn bound_activity(&self, tol: &Tolerances, row_id: RowId, minimize: bool) -> E {
        let len = self.row(row_id).len();
        let mut act = self.row(row_id).constant;
        for i in 0..len {
            let c = self.row(row_id).cols()[i];
            let v = self.row(row_id).vals()[i];
            let col = self.col(c);
            let use_lb = (v >= 0.0) == minimize;
            let bound = if use_lb { col.lb } else { col.ub };
            let contributes_neg_inf = (v >= 0.0 && minimize && tol.is_neg_infinity(bound))
                || (v < 0.0 && minimize && tol.is_infinity(bound));
            let contributes_pos_inf = (v >= 0.0 && !minimize && tol.is_infinity(bound))
                || (v < 0.0 && !minimize && tol.is_neg_infinity(bound));
            if contributes_neg_inf {
                return -tol.infinity;
            }
            if contributes_pos_inf {
                return tol.infinity;
            }
            act += v * bound;
        }
        act
    }

    pub fn sol_activity(&self, row_id: RowId, colval: impl Fn(ColId) -> E) -> E {
        let len = self.row(row_id).len();
        let mut act = self.row(row_id).constant;
        for i in 0..len {
            let c = self.row(row_id).cols()[i];
            let v = self.row(row_id).vals()[i];
            act += v * colval(c);
        }
        act
    }

    pub fn feasibility(&self, row_id: RowId, activity: E) -> E {
        let row = self.row(row_id);
        (row.rhs - activity).min(activity - row.lhs)
    }

    /// `redcost = obj - sum(vals * row.dualsol)` over the column's own
    /// sparse entries (§4.3).
    pub fn reduced_cost(&mut self, stat: &Stat, col_id: ColId) -> E {
        if let Some(v) = self.col(col_id).redcost.get(stat.lpcount) {
            return v;
        }
        let len = self.col(col_id).len();
        let mut rc = self.col(col_id).obj;
        for i in 0..len {
            let r = self.col(col_id).rows()[i];
            let v = self.col(col_id).vals()[i];
            rc -= v * self.row(r).dualsol.value;
        }
        self.col_mut(col_id).redcost.set(rc, stat.lpcount);
        rc
    }

    /// Feasibility of the dual constraint a column indexes (§4.3): the
    /// expected sign of `redcost` depends on which of the column's bounds
    /// are finite. Positive is feasible, negative magnitude is violation.
    pub fn dual_row_feasibility(&mut self, stat: &Stat, tol: &Tolerances, col_id: ColId) -> E {
        let rc = self.reduced_cost(stat, col_id);
        let col = self.col(col_id);
        let lb_finite = !tol.is_neg_infinity(col.lb);
        let ub_finite = !tol.is_infinity(col.ub);

        if tol.is_eq(col.lb, col.ub) {
            return tol.infinity;
        }
        match (lb_finite, ub_finite) {
            (true, true) => -rc.abs(),
            (true, false) => rc,
            (false, true) => -rc,
            (false, false) => tol.infinity,
        }
    }

    // ---- §4.4 membership, aging ---------------------------------------------

    pub fn add_col(&mut self, col_id: ColId) -> CoreResult<()> {
        self.check_not_diving()?;
        let removeable = self.col(col_id).removeable;
        self.col_mut(col_id).lppos = self.cols.len() as i64;
        self.cols.push(col_id);
        if removeable {
            self.nremoveablecols += 1;
        }
        self.flushed = false;
        self.solved = false;
        Ok(())
    }

    pub fn add_row(&mut self, row_id: RowId) -> CoreResult<()> {
        self.check_not_diving()?;
        let removeable = self.row(row_id).removeable;
        {
            let row = self.row_mut(row_id);
            row.lppos = self.rows.len() as i64;
            row.age = 0;
        }
        self.rows.push(row_id);
        if removeable {
            self.nremoveablerows += 1;
        }
        self.flushed = false;
        self.solved = false;
        Ok(())
    }

    pub fn shrink_cols(&mut self, n: usize) -> CoreResult<()> {
        self.check_not_diving()?;
        if n >= self.cols.len() {
            return Ok(());
        }
        for &col_id in &self.cols[n..] {
            self.col_mut(col_id).lppos = -1;
        }
        self.cols.truncate(n);
        if self.lpifirstchgcol > n as i64 {
            self.lpifirstchgcol = n as i64;
        }
        self.flushed = false;
        self.solved = false;
        Ok(())
    }

    pub fn shrink_rows(&mut self, n: usize) -> CoreResult<()> {
        self.check_not_diving()?;
        if n >= self.rows.len() {
            return Ok(());
        }
        for &row_id in &self.rows[n..] {
            let row = self.row_mut(row_id);
            row.lppos = -1;
            if row.nuses > 0 {
                row.nuses -= 1;
            }
        }
        self.rows.truncate(n);
        if self.lpifirstchgrow > n as i64 {
            self.lpifirstchgrow = n as i64;
        }
        self.flushed = false;
        self.solved = false;
        Ok(())
    }

    pub fn clear(&mut self) -> CoreResult<()> {
        self.shrink_cols(0)?;
        self.shrink_rows(0)
    }

    pub fn mark_size(&mut self) {
        self.firstnewcol = self.cols.len();
        self.firstnewrow = self.rows.len();
    }

    /// `SCIPlpUpdateAges`: ages every column toward obsolescence when it's
    /// at a bound (`primsol == 0`), resets otherwise; ages rows toward
    /// obsolescence when strictly interior to both sides, resets otherwise
    /// (§4.4).
    pub fn update_ages(&mut self, tol: &Tolerances) {
        for i in 0..self.cols.len() {
            let col_id = self.cols[i];
            let zero = tol.is_zero(self.col(col_id).primsol.value);
            let col = self.col_mut(col_id);
            if zero {
                col.age += 1;
            } else {
                col.age = 0;
            }
        }
        for i in 0..self.rows.len() {
            let row_id = self.rows[i];
            let activity = self.row(row_id).activity.value;
            let row = self.row(row_id);
            let interior = tol.is_gt(activity, row.lhs) && tol.is_gt(row.rhs, activity);
            let row = self.row_mut(row_id);
            if interior {
                row.age += 1;
            } else {
                row.age = 0;
            }
        }
    }

    fn obsolete_candidates(
        &self,
        stat: &Stat,
        tol: &Tolerances,
        scope_from: usize,
        require_age: bool,
        col_age_limit: i32,
    ) -> Vec<bool> {
        self.cols
            .iter()
            .enumerate()
            .map(|(i, &col_id)| {
                if i < scope_from {
                    return false;
                }
                let col = self.col(col_id);
                let aged = !require_age || col.age > col_age_limit;
                aged
                    && tol.is_zero(col.best_bound())
                    && col.obsoletenode != stat.current_node
            })
            .collect()
    }

    /// Marks for deletion every column added since [`Lp::mark_size`] whose
    /// age exceeds the limit and best bound is zero, skipping columns
    /// already checked this node (§4.4 cycle avoidance), then deletes them.
    pub fn remove_new_obsoletes(&mut self, stat: &mut Stat, tol: &Tolerances, age_limit: i32) {
        let candidates = self.obsolete_candidates(stat, tol, self.firstnewcol, true, age_limit);
        self.del_colset(stat, &candidates);
    }

    pub fn remove_all_obsoletes(&mut self, stat: &mut Stat, tol: &Tolerances, age_limit: i32) {
        let candidates = self.obsolete_candidates(stat, tol, 0, true, age_limit);
        self.del_colset(stat, &candidates);
    }

    pub fn cleanup_new(&mut self, stat: &mut Stat, tol: &Tolerances) {
        let candidates = self.obsolete_candidates(stat, tol, self.firstnewcol, false, 0);
        self.del_colset(stat, &candidates);
    }

    pub fn cleanup_all(&mut self, stat: &mut Stat, tol: &Tolerances) {
        let candidates = self.obsolete_candidates(stat, tol, 0, false, 0);
        self.del_colset(stat, &candidates);
    }

    /// Compacts `self.cols` in place according to a deletion mask, the way
    /// `lpDelColset` rewrites positions after a batch removal (§4.4).
    pub fn del_colset(&mut self, stat: &mut Stat, deleted: &[bool]) {
        debug_assert_eq!(deleted.len(), self.cols.len());
        if !deleted.iter().any(|&d| d) {
            return;
        }
        let mut kept = Vec::with_capacity(self.cols.len());
        for (i, &col_id) in self.cols.iter().enumerate() {
            if deleted[i] {
                self.col_mut(col_id).lppos = -1;
                if self.col(col_id).removeable {
                    self.nremoveablecols -= 1;
                }
            } else {
                let new_pos = kept.len() as i64;
                self.col_mut(col_id).lppos = new_pos;
                self.col_mut(col_id).obsoletenode = stat.current_node;
                kept.push(col_id);
            }
        }
        self.cols = kept;
        if self.lpifirstchgcol > self.cols.len() as i64 {
            self.lpifirstchgcol = self.cols.len() as i64;
        }
        self.flushed = false;
        self.solved = false;
    }

    pub fn del_rowset(&mut self, stat: &mut Stat, deleted: &[bool]) {
        debug_assert_eq!(deleted.len(), self.rows.len());
        if !deleted.iter().any(|&d| d) {
            return;
        }
        let mut kept = Vec::with_capacity(self.rows.len());
        for (i, &row_id) in self.rows.iter().enumerate() {
            if deleted[i] {
                let row = self.row_mut(row_id);
                row.lppos = -1;
                if row.nuses > 0 {
                    row.nuses -= 1;
                }
                if row.removeable {
                    self.nremoveablerows -= 1;
                }
            } else {
                let new_pos = kept.len() as i64;
                let row = self.row_mut(row_id);
                row.lppos = new_pos;
                row.obsoletenode = stat.current_node;
                kept.push(row_id);
            }
        }
        self.rows = kept;
        if self.lpifirstchgrow > self.rows.len() as i64 {
            self.lpifirstchgrow = self.rows.len() as i64;
        }
        self.flushed = false;
        self.solved = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VarId;

    fn tol() -> Tolerances {
        Tolerances::default()
    }

    #[test]
    fn add_coeff_creates_mutual_links_once_linked() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();

        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        lp.add_coeff(&mut stat, &t, col, row, 2.0).unwrap();
        lp.link_col(&mut stat, &t, col);

        assert_eq!(lp.col(col).len(), 1);
        assert_eq!(lp.row(row).len(), 1);
        assert_eq!(lp.col(col).linkpos()[0], 0);
        assert_eq!(lp.row(row).linkpos()[0], 0);
    }

    #[test]
    fn del_coeff_fixes_up_moved_back_pointer() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();

        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let r0 = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        let r1 = lp.create_row(&mut stat, "r1", 0.0, 10.0);
        let r2 = lp.create_row(&mut stat, "r2", 0.0, 10.0);

        lp.add_coeff(&mut stat, &t, col, r0, 1.0).unwrap();
        lp.add_coeff(&mut stat, &t, col, r1, 2.0).unwrap();
        lp.add_coeff(&mut stat, &t, col, r2, 3.0).unwrap();
        lp.link_col(&mut stat, &t, col);

        lp.del_coeff(&mut stat, &t, col, r0).unwrap();

        assert_eq!(lp.col(col).len(), 2);
        for &row_id in lp.col(col).rows() {
            let pos = lp.col(col).find_linear(row_id).unwrap();
            let mirror = lp.col(col).linkpos()[pos];
            assert_eq!(lp.row(row_id).cols()[mirror as usize], col);
        }
    }

    #[test]
    fn coef_changed_invalidates_solved_state() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        lp.flushed = true;
        lp.solved = true;

        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 10.0);
        lp.add_coeff(&mut stat, &t, col, row, 1.0).unwrap();

        assert!(!lp.flushed);
        assert!(!lp.solved);
    }

    #[test]
    fn activities_use_best_bound_when_not_yet_solved() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();

        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 5.0);
        let row = lp.create_row(&mut stat, "r0", 0.0, 100.0);
        lp.add_coeff(&mut stat, &t, col, row, 2.0).unwrap();
        lp.link_col(&mut stat, &t, col);

        // obj >= 0 => best_bound is lb (0.0)
        let act = lp.pseudo_activity(&stat, row);
        assert_eq!(act, 0.0);
    }

    #[test]
    fn del_colset_compacts_and_reindexes() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();

        let c0 = lp.create_col(&mut stat, VarId(0), 0.0, 0.0, 1.0);
        let c1 = lp.create_col(&mut stat, VarId(1), 0.0, 0.0, 1.0);
        let c2 = lp.create_col(&mut stat, VarId(2), 0.0, 0.0, 1.0);
        lp.add_col(c0).unwrap();
        lp.add_col(c1).unwrap();
        lp.add_col(c2).unwrap();

        lp.del_colset(&mut stat, &[false, true, false]);

        assert_eq!(lp.cols(), &[c0, c2]);
        assert_eq!(lp.col(c0).lppos, 0);
        assert_eq!(lp.col(c2).lppos, 1);
        assert_eq!(lp.col(c1).lppos, -1);
    }

    #[test]
    fn chg_bounds_enqueue_col_and_advance_bound_change() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 1.0);

        lp.chg_lb(&t, &mut stat, col, 0.5);
        assert_eq!(lp.col(col).lb, 0.5);
        assert!(lp.col(col).lbchanged);
        assert_eq!(lp.chgcols(), &[col]);
        assert_eq!(stat.nboundchanges, 1);

        // Re-enqueuing the same column must not duplicate it.
        lp.chg_ub(&t, &mut stat, col, 0.9);
        assert_eq!(lp.chgcols(), &[col]);
        assert_eq!(stat.nboundchanges, 2);
    }

    #[test]
    fn chg_obj_is_noop_within_tolerance() {
        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 1.0);

        lp.chg_obj(&t, col, 1.0 + 1e-12);
        assert!(!lp.col(col).objchanged);
        assert!(lp.chgcols().is_empty());

        lp.chg_obj(&t, col, 2.0);
        assert!(lp.col(col).objchanged);
        assert_eq!(lp.chgcols(), &[col]);
    }

    #[test]
    fn diving_rejects_structural_changes_but_allows_obj_changes() {
        use crate::lp::lpi::mock::MockLpi;

        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        let mut lpi = MockLpi::new();
        let col = lp.create_col(&mut stat, VarId(0), 1.0, 0.0, 1.0);

        lp.start_dive(&mut lpi).unwrap();
        assert!(lp.diving);
        assert!(lp.add_col(col).is_err());

        lp.chg_obj(&t, col, 5.0);
        assert!(lp.divingobjchg);

        lp.end_dive(&mut lpi).unwrap();
        assert!(!lp.diving);
        lp.add_col(col).unwrap();
        assert_eq!(lp.cols(), &[col]);
    }

    #[test]
    fn scale_row_scales_each_side_once() {
        use crate::variable::{VarType, Variable};

        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        let col = lp.create_col(&mut stat, VarId(0), 0.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 2.0, 10.0);
        lp.add_coeff(&mut stat, &t, col, row, 1.0).unwrap();
        lp.link_col(&mut stat, &t, col);

        let vars = vec![Variable::new(0, 0.0, 0.0, 10.0, VarType::Continuous)];
        lp.scale_row(&t, row, 3.0, &vars);

        assert_eq!(lp.row(row).lhs, 6.0);
        assert_eq!(lp.row(row).rhs, 30.0);
    }

    #[test]
    fn scale_row_rounds_sides_outward_when_all_integral() {
        use crate::variable::{VarType, Variable};

        let mut lp = Lp::new();
        let mut stat = Stat::new();
        let t = tol();
        let col = lp.create_col(&mut stat, VarId(0), 0.0, 0.0, 10.0);
        let row = lp.create_row(&mut stat, "r0", 1.2, 4.8);
        lp.add_coeff(&mut stat, &t, col, row, 1.0).unwrap();
        lp.link_col(&mut stat, &t, col);

        let vars = vec![Variable::new(0, 0.0, 0.0, 10.0, VarType::Integer)];
        lp.scale_row(&t, row, 1.0, &vars);

        assert_eq!(lp.row(row).lhs, 2.0);
        assert_eq!(lp.row(row).rhs, 4.0);
    }
}
