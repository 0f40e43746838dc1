//! Generic non-relational numerical environment.

use core::fmt;

use argus_num::{Bound, Congruence, Int, Interval, IntervalCongruence};

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintKind, LinearConstraint, LinearExpression};
use crate::separate::{LatticeValue, SeparateDomain};
use crate::var::Variable;

use super::value::NumValue;
use super::{NumBinOp, NumOperand, NumericDomain};

/// Non-relational environment over any [`NumValue`] lattice.
///
/// Assignments evaluate the right-hand side under the current environment;
/// constraints are propagated by per-variable bound refinement.
pub struct EnvDomain<V: Variable, L: NumValue> {
    env: SeparateDomain<V, L>,
}

/// Interval environment.
pub type IntervalDomain<V> = EnvDomain<V, Interval>;

/// Congruence environment.
pub type CongruenceDomain<V> = EnvDomain<V, Congruence>;

/// Reduced interval-congruence environment.
pub type IntervalCongruenceDomain<V> = EnvDomain<V, IntervalCongruence>;

impl<V: Variable, L: NumValue> Clone for EnvDomain<V, L> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
        }
    }
}

impl<V: Variable, L: NumValue> EnvDomain<V, L> {
    /// The value of a variable under the current environment.
    pub fn get(&self, x: &V) -> L {
        self.env.get(x)
    }

    /// Evaluate a linear expression to a value.
    fn eval(&self, e: &LinearExpression<V>) -> L {
        let mut acc = L::singleton_of(e.cst());
        for (v, coeff) in e.terms() {
            let term = L::apply(NumBinOp::Mul, &L::singleton_of(coeff), &self.env.get(v));
            acc = L::apply(NumBinOp::Add, &acc, &term);
        }
        acc
    }

    fn operand_value(&self, o: &NumOperand<V>) -> L {
        match o {
            NumOperand::Var(v) => self.env.get(v),
            NumOperand::Const(n) => L::singleton_of(n),
        }
    }

    /// Refine every variable of an (in)equality `e ⋈ 0` by bound
    /// propagation: solve the constraint for each variable in turn using
    /// the intervals of the others.
    fn propagate(&mut self, e: &LinearExpression<V>, kind: ConstraintKind) {
        let vars: Vec<V> = e.vars().cloned().collect();
        for x in &vars {
            let coeff = e.coefficient(x);
            // a·x ⋈ -c - Σ other terms
            let mut rest = Interval::singleton_of(-e.cst().clone());
            for (v, c) in e.terms() {
                if v == x {
                    continue;
                }
                let term = self
                    .env
                    .get(v)
                    .to_bounds()
                    .mul(&Interval::singleton_of(c.clone()));
                rest = &rest - &term;
            }
            if rest.is_bottom() {
                self.env.set_to_bottom();
                return;
            }
            let bounds = match kind {
                ConstraintKind::Equality => solve_eq(&coeff, &rest),
                ConstraintKind::Inequality => solve_le(&coeff, &rest),
                ConstraintKind::Disequation => {
                    // a·x != rest: only useful when the right side is a
                    // single value sitting exactly on a bound of x.
                    let current = self.env.get(x).to_bounds();
                    match (rest.singleton(), current.is_bottom()) {
                        (Some(n), false) if n.is_multiple_of(&coeff) => {
                            let forbidden = n / &coeff;
                            shrink_bound(&current, &forbidden)
                        }
                        _ => continue,
                    }
                }
            };
            let refined = self.env.get(x).refine_bounds(&bounds);
            self.env.set(x.clone(), refined);
            if self.env.is_bottom() {
                return;
            }
        }
    }
}

/// Solutions of `a·x == rhs` for x.
fn solve_eq(a: &Int, rhs: &Interval) -> Interval {
    let lb = rhs.lb().div_ceil(a);
    let ub = rhs.ub().div_floor(a);
    if a.is_negative() {
        Interval::new(ub, lb)
    } else {
        Interval::new(lb, ub)
    }
}

/// Solutions of `a·x <= rhs_ub`.
fn solve_le(a: &Int, rhs: &Interval) -> Interval {
    if a.is_negative() {
        // x >= ceil(rhs_ub / a)
        Interval::new(rhs.ub().div_ceil(a), Bound::plus_infinity())
    } else {
        // x <= floor(rhs_ub / a)
        Interval::new(Bound::minus_infinity(), rhs.ub().div_floor(a))
    }
}

/// Remove `forbidden` from an interval when it sits exactly on a bound.
fn shrink_bound(current: &Interval, forbidden: &Int) -> Interval {
    let b = Bound::from(forbidden.clone());
    if *current.lb() == b {
        Interval::new(forbidden + &Int::one(), current.ub().clone())
    } else if *current.ub() == b {
        Interval::new(current.lb().clone(), forbidden - &Int::one())
    } else {
        current.clone()
    }
}

impl<V: Variable, L: NumValue> AbstractDomain for EnvDomain<V, L> {
    fn bottom() -> Self {
        Self {
            env: SeparateDomain::bottom(),
        }
    }

    fn top() -> Self {
        Self {
            env: SeparateDomain::top(),
        }
    }

    fn is_bottom(&self) -> bool {
        self.env.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.env.is_top()
    }

    fn leq(&self, other: &Self) -> bool {
        self.env.leq(&other.env)
    }

    fn equals(&self, other: &Self) -> bool {
        self.env.equals(&other.env)
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            env: self.env.join(&other.env),
        }
    }

    fn widening(&self, other: &Self) -> Self {
        Self {
            env: self.env.widening(&other.env),
        }
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Self {
            env: self.env.widening_threshold(&other.env, threshold),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        Self {
            env: self.env.meet(&other.env),
        }
    }

    fn narrowing(&self, other: &Self) -> Self {
        Self {
            env: self.env.narrowing(&other.env),
        }
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Self {
            env: self.env.narrowing_threshold(&other.env, threshold),
        }
    }
}

impl<V: Variable, L: NumValue> NumericDomain<V> for EnvDomain<V, L> {
    fn assign(&mut self, x: &V, e: &LinearExpression<V>) {
        if self.is_bottom() {
            return;
        }
        let value = self.eval(e);
        self.env.set(x.clone(), value);
    }

    fn apply(&mut self, op: NumBinOp, x: &V, y: &NumOperand<V>, z: &NumOperand<V>) {
        if self.is_bottom() {
            return;
        }
        let value = L::apply(op, &self.operand_value(y), &self.operand_value(z));
        self.env.set(x.clone(), value);
    }

    fn add_constraint(&mut self, cst: &LinearConstraint<V>) {
        if self.is_bottom() {
            return;
        }
        if let Some(decided) = cst.constant_value() {
            if !decided {
                self.set_to_bottom();
            }
            return;
        }
        self.propagate(cst.expression(), cst.kind());
    }

    fn set(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom() {
            return;
        }
        self.env.set(x.clone(), L::from_interval_congruence(value));
    }

    fn refine(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom() {
            return;
        }
        let refined = self.env.get(x).meet(&L::from_interval_congruence(value));
        self.env.set(x.clone(), refined);
    }

    fn forget(&mut self, x: &V) {
        self.env.forget(x);
    }

    fn to_interval(&self, x: &V) -> Interval {
        if self.is_bottom() {
            return Interval::bottom();
        }
        self.env.get(x).to_bounds()
    }

    fn to_congruence(&self, x: &V) -> Congruence {
        if self.is_bottom() {
            return Congruence::bottom();
        }
        self.env.get(x).to_congruence()
    }
}

impl<V: Variable, L: NumValue + fmt::Display> fmt::Display for EnvDomain<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.env.fmt(f)
    }
}

impl<V: Variable + fmt::Debug, L: NumValue + fmt::Debug> fmt::Debug for EnvDomain<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.env.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = IntervalDomain<u64>;

    const X: u64 = 1;
    const Y: u64 = 2;
    const Z: u64 = 3;

    fn expr_c(n: i64) -> LinearExpression<u64> {
        LinearExpression::constant(n)
    }

    #[test]
    fn assign_and_read_back() {
        let mut d = D::top();
        d.assign(&X, &expr_c(5));
        assert_eq!(d.to_interval(&X), Interval::new(5, 5));
    }

    #[test]
    fn linear_assign() {
        let mut d = D::top();
        d.assign(&X, &expr_c(5));
        d.assign(&Y, &expr_c(7));
        // z := 2*x + y - 1
        let mut e = LinearExpression::term(X, 2);
        e.add_term(Y, Int::one());
        e.add_constant(&Int::from(-1));
        d.assign(&Z, &e);
        assert_eq!(d.to_interval(&Z), Interval::new(16, 16));
    }

    #[test]
    fn apply_add() {
        let mut d = D::top();
        d.assign(&X, &expr_c(5));
        d.apply(
            NumBinOp::Add,
            &Z,
            &NumOperand::Var(X),
            &NumOperand::constant(7),
        );
        assert_eq!(d.to_interval(&Z), Interval::new(12, 12));
    }

    #[test]
    fn constraint_refines_both_sides() {
        let mut d = D::top();
        d.set(
            &X,
            &IntervalCongruence::from_interval(Interval::new(0, 10)),
        );
        // x <= 5
        d.add_constraint(&LinearConstraint::le(
            LinearExpression::var(X),
            expr_c(5),
        ));
        assert_eq!(d.to_interval(&X), Interval::new(0, 5));
        // 3 <= x
        d.add_constraint(&LinearConstraint::ge(
            LinearExpression::var(X),
            expr_c(3),
        ));
        assert_eq!(d.to_interval(&X), Interval::new(3, 5));
    }

    #[test]
    fn equality_propagates_between_variables() {
        let mut d = D::top();
        d.set(
            &X,
            &IntervalCongruence::from_interval(Interval::new(0, 10)),
        );
        d.set(&Y, &IntervalCongruence::from_interval(Interval::new(4, 20)));
        // x == y
        d.add_constraint(&LinearConstraint::eq(
            LinearExpression::var(X),
            LinearExpression::var(Y),
        ));
        assert_eq!(d.to_interval(&X), Interval::new(4, 10));
        assert_eq!(d.to_interval(&Y), Interval::new(4, 10));
    }

    #[test]
    fn contradiction_is_bottom() {
        let mut d = D::top();
        d.assign(&X, &expr_c(5));
        d.add_constraint(&LinearConstraint::eq(LinearExpression::var(X), expr_c(6)));
        assert!(d.is_bottom());
    }

    #[test]
    fn disequation_shaves_bound() {
        let mut d = D::top();
        d.set(&X, &IntervalCongruence::from_interval(Interval::new(0, 10)));
        d.add_constraint(&LinearConstraint::ne(LinearExpression::var(X), expr_c(0)));
        assert_eq!(d.to_interval(&X), Interval::new(1, 10));
    }

    #[test]
    fn congruence_env_tracks_strides() {
        let mut d = CongruenceDomain::<u64>::top();
        // x := 4*y + 1
        let mut e = LinearExpression::term(Y, 4);
        e.add_constant(&Int::one());
        d.assign(&X, &e);
        assert_eq!(d.to_congruence(&X), Congruence::new(4, 1));
    }
}
