//! Row data (§3 `Row`) and the row-local sparse-vector and norm-maintenance
//! primitives of §4.1-4.2.

use crate::E;
use crate::lp::column::{ColId, Tagged};
use crate::numerics::Tolerances;

/// Stable identifier for a row within an [`Lp`](crate::lp::container::Lp)'s
/// arena. Never reused within the lifetime of one `Lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

/// Cached maximum- or minimum-absolute-value tracker with multiplicity, as
/// maintained incrementally by `rowAddNorms`/`rowDelNorms` (§4.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremalTracker {
    pub val: E,
    pub count: u32,
    /// Position (within the row's own `cols[]`) of one column attaining
    /// `val`.
    pub idx: i32,
}

/// One linear constraint active in the LP (§3 `Row`).
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub lhs: E,
    pub rhs: E,
    /// Additive shift moved into the sides on flush.
    pub constant: E,

    pub(crate) cols: Vec<ColId>,
    pub(crate) cols_probindex: Vec<usize>,
    pub(crate) vals: Vec<E>,
    pub(crate) linkpos: Vec<i32>,

    /// Unique, monotonically assigned index (`stat.next_row_index()`).
    pub index: u64,

    pub sqrnorm: E,
    pub maxval: ExtremalTracker,
    pub minval: ExtremalTracker,
    pub validminmaxidx: bool,

    pub dualsol: Tagged<E>,
    pub activity: Tagged<E>,
    pub dualfarkas: Tagged<E>,

    /// Valid against `stat.nboundchanges`, not `stat.lpcount` (§4.3).
    pub pseudoactivity: Tagged<E>,
    pub minactivity: Tagged<E>,
    pub maxactivity: Tagged<E>,

    pub nuses: u32,
    pub nlocks: u32,

    pub sorted: bool,
    pub delaysort: bool,
    pub lhschanged: bool,
    pub rhschanged: bool,
    pub coefchanged: bool,
    pub local: bool,
    pub modifiable: bool,
    pub removeable: bool,

    pub lppos: i64,
    pub lpipos: i64,

    pub age: i32,
    pub obsoletenode: u64,
}

impl Row {
    pub fn new(name: impl Into<String>, lhs: E, rhs: E, index: u64) -> Self {
        Self {
            name: name.into(),
            lhs,
            rhs,
            constant: 0.0,
            cols: Vec::new(),
            cols_probindex: Vec::new(),
            vals: Vec::new(),
            linkpos: Vec::new(),
            index,
            sqrnorm: 0.0,
            maxval: ExtremalTracker::default(),
            minval: ExtremalTracker::default(),
            validminmaxidx: true,
            dualsol: Tagged::default(),
            activity: Tagged::default(),
            dualfarkas: Tagged::default(),
            pseudoactivity: Tagged::default(),
            minactivity: Tagged::default(),
            maxactivity: Tagged::default(),
            nuses: 1,
            nlocks: 0,
            sorted: true,
            delaysort: false,
            lhschanged: false,
            rhschanged: false,
            coefchanged: false,
            local: false,
            modifiable: false,
            removeable: false,
            lppos: -1,
            lpipos: -1,
            age: 0,
            obsoletenode: u64::MAX,
        }
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn cols(&self) -> &[ColId] {
        &self.cols
    }

    pub fn vals(&self) -> &[E] {
        &self.vals
    }

    pub fn linkpos(&self) -> &[i32] {
        &self.linkpos
    }

    pub fn cols_probindex(&self) -> &[usize] {
        &self.cols_probindex
    }

    pub fn nunlinked(&self) -> usize {
        self.linkpos.iter().filter(|&&p| p == -1).count()
    }

    pub fn is_in_lp(&self) -> bool {
        self.lppos >= 0
    }

    pub fn is_flushed(&self) -> bool {
        self.lpipos >= 0
    }

    pub fn is_locked(&self) -> bool {
        self.nlocks > 0
    }

    pub(crate) fn raw_append(
        &mut self,
        col: ColId,
        probindex: usize,
        val: E,
        linkpos: i32,
    ) -> usize {
        let pos = self.cols.len();
        self.cols.push(col);
        self.cols_probindex.push(probindex);
        self.vals.push(val);
        self.linkpos.push(linkpos);
        pos
    }

    /// §4.1 `rowDelCoeffPos`: swap-remove at `pos`. Returns `(removed_col,
    /// removed_linkpos, moved)` like `Col::raw_remove`.
    pub(crate) fn raw_remove(&mut self, pos: usize) -> (ColId, i32, Option<(usize, ColId)>) {
        let last = self.cols.len() - 1;
        let removed_col = self.cols[pos];
        let removed_linkpos = self.linkpos[pos];
        if pos != last {
            self.cols.swap(pos, last);
            self.cols_probindex.swap(pos, last);
            self.vals.swap(pos, last);
            self.linkpos.swap(pos, last);
            self.sorted = false;
        }
        let moved = if pos != last {
            Some((pos, self.cols[pos]))
        } else {
            None
        };
        self.cols.pop();
        self.cols_probindex.pop();
        self.vals.pop();
        self.linkpos.pop();
        self.validminmaxidx = false;
        (removed_col, removed_linkpos, moved)
    }

    pub(crate) fn set_linkpos(&mut self, pos: usize, linkpos: i32) {
        self.linkpos[pos] = linkpos;
    }

    pub(crate) fn linkpos_mut(&mut self) -> &mut [i32] {
        &mut self.linkpos
    }

    pub(crate) fn set_val(&mut self, pos: usize, val: E) {
        self.vals[pos] = val;
    }

    /// Replaces the four parallel arrays wholesale, e.g. after a sort
    /// permutation or a duplicate-merge pass.
    pub(crate) fn replace_arrays(
        &mut self,
        cols: Vec<ColId>,
        cols_probindex: Vec<usize>,
        vals: Vec<E>,
        linkpos: Vec<i32>,
    ) {
        self.cols = cols;
        self.cols_probindex = cols_probindex;
        self.vals = vals;
        self.linkpos = linkpos;
    }

    pub(crate) fn find_linear(&self, col: ColId) -> Option<usize> {
        self.cols.iter().position(|&c| c == col)
    }

    /// §4.1 `rowAddNorms`: widen `sqrnorm`, `minval`/`maxval` (with
    /// multiplicity) for a newly present entry at `pos` with value `val`.
    pub(crate) fn add_norms(&mut self, pos: usize, val: E, tol: &Tolerances) {
        self.sqrnorm += val * val;
        let aval = val.abs();

        if self.maxval.count == 0 || tol.is_gt(aval, self.maxval.val) {
            self.maxval = ExtremalTracker {
                val: aval,
                count: 1,
                idx: pos as i32,
            };
        } else if tol.is_eq(aval, self.maxval.val) {
            self.maxval.count += 1;
        }

        if self.minval.count == 0 || tol.is_lt(aval, self.minval.val) {
            self.minval = ExtremalTracker {
                val: aval,
                count: 1,
                idx: pos as i32,
            };
        } else if tol.is_eq(aval, self.minval.val) {
            self.minval.count += 1;
        }
    }

    /// §4.1 `rowDelNorms`: shrink `sqrnorm` for a removed entry; drops the
    /// multiplicity counters and signals a rescan is needed once they hit
    /// zero (`numminval == 0 => rowCalcNorms`).
    pub(crate) fn del_norms(&mut self, val: E, tol: &Tolerances) -> bool {
        self.sqrnorm -= val * val;
        if self.sqrnorm < 0.0 {
            self.sqrnorm = 0.0;
        }
        let aval = val.abs();
        let mut needs_recalc = false;

        if self.maxval.count > 0 && tol.is_eq(aval, self.maxval.val) {
            self.maxval.count -= 1;
            if self.maxval.count == 0 {
                needs_recalc = true;
            }
        }
        if self.minval.count > 0 && tol.is_eq(aval, self.minval.val) {
            self.minval.count -= 1;
            if self.minval.count == 0 {
                needs_recalc = true;
            }
        }
        self.validminmaxidx = false;
        needs_recalc
    }

    /// §4.1 `rowCalcNorms`: full recompute of the numeric aggregates
    /// (`sqrnorm`, `minval`/`maxval` and their multiplicities) from scratch.
    /// Sortedness depends on the linked columns' `index` values, which this
    /// row doesn't own; callers that also know column order re-check it
    /// themselves and call `mark_sorted` explicitly.
    pub(crate) fn calc_norms(&mut self, tol: &Tolerances) {
        self.sqrnorm = 0.0;
        self.maxval = ExtremalTracker::default();
        self.minval = ExtremalTracker::default();

        for pos in 0..self.cols.len() {
            let val = self.vals[pos];
            self.add_norms(pos, val, tol);
        }
        self.validminmaxidx = true;
    }

    pub fn feasibility(&self, activity: E, tol: &Tolerances) -> E {
        let _ = tol;
        (self.rhs - activity).min(activity - self.lhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new("r0", 0.0, 10.0, 0)
    }

    #[test]
    fn norms_track_sum_of_squares() {
        let tol = Tolerances::default();
        let mut r = row();
        r.raw_append(ColId(0), 0, 3.0, -1);
        r.add_norms(0, 3.0, &tol);
        r.raw_append(ColId(1), 1, -4.0, -1);
        r.add_norms(1, -4.0, &tol);
        assert!((r.sqrnorm - 25.0).abs() < 1e-12);
        assert!((r.maxval.val - 4.0).abs() < 1e-12);
        assert!((r.minval.val - 3.0).abs() < 1e-12);
    }

    #[test]
    fn del_norms_signals_recalc_when_multiplicity_hits_zero() {
        let tol = Tolerances::default();
        let mut r = row();
        r.raw_append(ColId(0), 0, 2.0, -1);
        r.add_norms(0, 2.0, &tol);
        let needs = r.del_norms(2.0, &tol);
        assert!(needs);
        assert_eq!(r.minval.count, 0);
    }

    #[test]
    fn feasibility_is_slack_to_nearer_side() {
        let tol = Tolerances::default();
        let r = Row::new("r", 1.0, 5.0, 0);
        assert_eq!(r.feasibility(3.0, &tol), 2.0);
        assert_eq!(r.feasibility(0.5, &tol), -0.5);
        assert_eq!(r.feasibility(5.5, &tol), -0.5);
    }
}
