//! Tolerances and comparison predicates shared by every other module.
//!
//! This is the one leaf dependency everything else in the crate builds on
//! (column/row algebra, flush, solve, MIR derivation, reoptimization): a
//! bundle of numerical tolerances plus tolerance-aware comparisons so that no
//! module has to hardcode an epsilon of its own.

use crate::E;

/// Numerical tolerances used throughout the LP-management core.
///
/// Mirrors `SCIP_SET`'s numerical fields: one object, passed by reference,
/// that every comparison in the crate goes through instead of comparing
/// floats directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Value treated as a practical infinity; bounds/sides at or beyond this
    /// magnitude are "infinite" for feasibility and activity purposes.
    pub infinity: E,
    /// General-purpose absolute tolerance for "is this value zero".
    pub epsilon: E,
    /// Tolerance for accepting primal feasibility of an LP solution.
    pub feastol: E,
    /// Tolerance for accepting dual feasibility of an LP solution.
    pub dualfeastol: E,
    /// Tolerance used when comparing accumulated (summed) quantities, which
    /// is allowed to be looser than `epsilon` because summation error grows
    /// with the number of terms.
    pub sumepsilon: E,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            infinity: 1e20,
            epsilon: 1e-9,
            feastol: 1e-6,
            dualfeastol: 1e-7,
            sumepsilon: 1e-6,
        }
    }
}

impl Tolerances {
    pub fn new(infinity: E, epsilon: E, feastol: E, dualfeastol: E, sumepsilon: E) -> Self {
        Self {
            infinity,
            epsilon,
            feastol,
            dualfeastol,
            sumepsilon,
        }
    }

    /// Is `val` infinite in magnitude (at or beyond `infinity`)?
    pub fn is_infinity(&self, val: E) -> bool {
        val >= self.infinity
    }

    /// Is `-val` infinite in magnitude?
    pub fn is_neg_infinity(&self, val: E) -> bool {
        val <= -self.infinity
    }

    /// `|val| < epsilon`.
    pub fn is_zero(&self, val: E) -> bool {
        val.abs() < self.epsilon
    }

    /// `|val1 - val2| < epsilon`.
    pub fn is_eq(&self, val1: E, val2: E) -> bool {
        self.is_zero(val1 - val2)
    }

    /// `val1 < val2 - epsilon` negated, i.e. `val1 <= val2` within tolerance.
    pub fn is_le(&self, val1: E, val2: E) -> bool {
        val1 - val2 <= self.epsilon
    }

    /// `val1 >= val2` within tolerance.
    pub fn is_ge(&self, val1: E, val2: E) -> bool {
        val1 - val2 > -self.epsilon
    }

    /// `val1 < val2` outside tolerance.
    pub fn is_lt(&self, val1: E, val2: E) -> bool {
        val1 - val2 < -self.epsilon
    }

    /// `val1 > val2` outside tolerance.
    pub fn is_gt(&self, val1: E, val2: E) -> bool {
        val1 - val2 > self.epsilon
    }

    /// Feasibility-tolerance equality, used when comparing against a
    /// computed LP solution rather than structural data.
    pub fn is_feas_eq(&self, val1: E, val2: E) -> bool {
        (val1 - val2).abs() < self.feastol
    }

    /// `val1 <= val2` at feasibility tolerance.
    pub fn is_feas_le(&self, val1: E, val2: E) -> bool {
        val1 - val2 < self.feastol
    }

    /// `val1 <= val2` at the looser summation tolerance.
    pub fn is_sum_le(&self, val1: E, val2: E) -> bool {
        val1 - val2 < self.sumepsilon
    }

    /// `val1 == val2` at the looser summation tolerance.
    pub fn is_sum_eq(&self, val1: E, val2: E) -> bool {
        (val1 - val2).abs() < self.sumepsilon
    }

    /// Is `val` within `epsilon` of an integer?
    pub fn is_integral(&self, val: E) -> bool {
        self.is_zero(val - val.round())
    }

    /// Greatest integer `<= val` within tolerance (rounds up first if `val`
    /// is within `epsilon` of the next integer, to avoid floor(3.0 - 1e-16)
    /// silently becoming 2).
    pub fn floor(&self, val: E) -> E {
        let rounded = val.round();
        if self.is_zero(val - rounded) {
            rounded
        } else {
            val.floor()
        }
    }

    /// Least integer `>= val` within tolerance, symmetric to `floor`.
    pub fn ceil(&self, val: E) -> E {
        let rounded = val.round();
        if self.is_zero(val - rounded) {
            rounded
        } else {
            val.ceil()
        }
    }

    /// Fractional part of `val` relative to its tolerance-aware floor, always
    /// in `[0, 1)`.
    pub fn frac(&self, val: E) -> E {
        val - self.floor(val)
    }

    /// Substitutes the solver's own representation of infinity for `val` at
    /// the boundary between the core's `infinity` and an external LPI (§6,
    /// §4.5 "substituting `±solver_infinity` for `±set.infinity`").
    pub fn to_solver_inf(&self, val: E, solver_inf: E) -> E {
        if self.is_infinity(val) {
            solver_inf
        } else if self.is_neg_infinity(val) {
            -solver_inf
        } else {
            val
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_eq_respect_epsilon() {
        let tol = Tolerances::default();
        assert!(tol.is_zero(1e-12));
        assert!(!tol.is_zero(1e-3));
        assert!(tol.is_eq(1.0, 1.0 + 1e-12));
    }

    #[test]
    fn floor_snaps_near_integers() {
        let tol = Tolerances::default();
        assert_eq!(tol.floor(3.0 - 1e-13), 3.0);
        assert_eq!(tol.floor(3.4), 3.0);
        assert_eq!(tol.ceil(3.0 + 1e-13), 3.0);
        assert_eq!(tol.ceil(3.1), 4.0);
    }

    #[test]
    fn is_le_includes_the_epsilon_boundary() {
        let tol = Tolerances::default();
        assert!(tol.is_le(1.0 + tol.epsilon, 1.0));
        assert!(tol.is_le(1.0, 1.0));
        assert!(!tol.is_le(1.0 + 10.0 * tol.epsilon, 1.0));
    }

    #[test]
    fn is_integral_detects_near_integers() {
        let tol = Tolerances::default();
        assert!(tol.is_integral(2.0));
        assert!(tol.is_integral(2.0 + 1e-12));
        assert!(!tol.is_integral(2.5));
    }

    #[test]
    fn infinity_predicates() {
        let tol = Tolerances::default();
        assert!(tol.is_infinity(1e20));
        assert!(tol.is_infinity(1e25));
        assert!(!tol.is_infinity(1e10));
        assert!(tol.is_neg_infinity(-1e20));
    }

    #[test]
    fn to_solver_inf_substitutes_only_at_the_boundary() {
        let tol = Tolerances::default();
        assert_eq!(tol.to_solver_inf(1e20, 1e30), 1e30);
        assert_eq!(tol.to_solver_inf(-1e20, 1e30), -1e30);
        assert_eq!(tol.to_solver_inf(3.5, 1e30), 3.5);
    }
}
