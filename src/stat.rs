//! Monotone counters and bookkeeping shared by the LP, column/row, and
//! reoptimization-tree modules.
//!
//! Per the Design Notes: "The only process-wide state is the monotone
//! `ncolidx`/`nrowidx` counters on the `Stat` object. These are not globals
//! but fields, and must remain monotone for the index-based sorting and
//! linking." `Stat` is the one place that state lives; every other module
//! takes a `&Stat`/`&mut Stat` rather than reaching for a global.

/// Shared counters and aging limits. One `Stat` is created per solve and
/// threaded through every LP/column/row/reopt operation.
#[derive(Debug, Clone)]
pub struct Stat {
    /// Number of times the LP has been (re-)solved to a usable status.
    /// Validity tags on `primsol`/`redcost`/`farkas`/`activity` are compared
    /// against this counter.
    pub lpcount: u64,
    /// Number of global bound changes applied so far. Validity tags on
    /// pseudo/bound activities are compared against this counter instead of
    /// `lpcount`, since those quantities don't depend on having solved.
    pub nboundchanges: u64,
    /// Monotonically increasing column index source.
    ncolidx: u64,
    /// Monotonically increasing row index source.
    nrowidx: u64,
    /// Current search-tree node identifier, used to stamp `obsoletenode` and
    /// detect cycle-avoidance in the aging/cleanup sweep (§4.4).
    pub current_node: u64,

    /// Age (number of consecutive "basic at bound" solves) beyond which an
    /// obsolete column becomes a deletion candidate.
    pub colagelimit: i32,
    /// Age (number of consecutive strictly-interior solves) beyond which an
    /// obsolete row becomes a deletion candidate.
    pub rowagelimit: i32,

    /// Number of primal-simplex calls made (§4.6 "counts iterations into
    /// per-kind statistics").
    pub nprimallps: u64,
    /// Number of dual-simplex calls made.
    pub nduallps: u64,
    /// Total primal-simplex iterations across all calls.
    pub primallpiterations: u64,
    /// Total dual-simplex iterations across all calls.
    pub duallpiterations: u64,
}

impl Default for Stat {
    fn default() -> Self {
        Self {
            lpcount: 0,
            nboundchanges: 0,
            ncolidx: 0,
            nrowidx: 0,
            current_node: 0,
            colagelimit: 10,
            rowagelimit: 10,
            nprimallps: 0,
            nduallps: 0,
            primallpiterations: 0,
            duallpiterations: 0,
        }
    }
}

impl Stat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next column index, bumping the monotone counter.
    pub fn next_col_index(&mut self) -> u64 {
        let idx = self.ncolidx;
        self.ncolidx += 1;
        idx
    }

    /// Allocates the next row index, bumping the monotone counter.
    pub fn next_row_index(&mut self) -> u64 {
        let idx = self.nrowidx;
        self.nrowidx += 1;
        idx
    }

    /// Records that the LP was (re-)solved, invalidating prior validity
    /// tags by advancing `lpcount`.
    pub fn advance_lpcount(&mut self) {
        self.lpcount += 1;
    }

    /// Records a global bound change, invalidating pseudo/bound-activity
    /// validity tags.
    pub fn advance_bound_change(&mut self) {
        self.nboundchanges += 1;
    }

    /// Records one primal-simplex call's iteration count.
    pub fn record_primal_lp(&mut self, iterations: i64) {
        self.nprimallps += 1;
        self.primallpiterations += iterations.max(0) as u64;
    }

    /// Records one dual-simplex call's iteration count.
    pub fn record_dual_lp(&mut self, iterations: i64) {
        self.nduallps += 1;
        self.duallpiterations += iterations.max(0) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_monotone_and_distinct() {
        let mut stat = Stat::new();
        let a = stat.next_col_index();
        let b = stat.next_col_index();
        let c = stat.next_row_index();
        assert!(a < b);
        assert_eq!(c, 0);
    }

    #[test]
    fn lpcount_advances_independently_of_bound_changes() {
        let mut stat = Stat::new();
        stat.advance_bound_change();
        stat.advance_bound_change();
        assert_eq!(stat.nboundchanges, 2);
        assert_eq!(stat.lpcount, 0);
        stat.advance_lpcount();
        assert_eq!(stat.lpcount, 1);
    }
}
