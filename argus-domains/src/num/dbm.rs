//! Difference-bound matrix domain.

use core::fmt;

use argus_num::{Bound, Congruence, Int, Interval, IntervalCongruence};
use hashbrown::HashMap;

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintKind, LinearConstraint, LinearExpression};
use crate::var::Variable;

use super::{NumBinOp, NumOperand, NumericDomain};
use super::value::NumValue;

/// Difference-bound matrix: conjunctions of `xᵢ - xⱼ <= c` and `±xᵢ <= c`.
///
/// Row/column 0 is the constant zero, so `m[i][0]` bounds `xᵢ` from above
/// and `m[0][i]` bounds `-xᵢ`. Entries are `+∞` or finite, never `-∞`;
/// infeasibility shows up as a negative diagonal after closure.
///
/// The matrix is closed lazily: mutating operations record that the closed
/// form is stale, and observers close a scratch copy when they need the
/// tight bounds. Every observer is sound on a non-closed matrix.
pub struct Dbm<V: Variable> {
    is_bottom: bool,
    normalized: bool,
    vars: Vec<V>,
    index: HashMap<V, usize>,
    matrix: Vec<Bound>,
}

impl<V: Variable> Clone for Dbm<V> {
    fn clone(&self) -> Self {
        Self {
            is_bottom: self.is_bottom,
            normalized: self.normalized,
            vars: self.vars.clone(),
            index: self.index.clone(),
            matrix: self.matrix.clone(),
        }
    }
}

impl<V: Variable> Dbm<V> {
    fn dim(&self) -> usize {
        self.vars.len() + 1
    }

    fn at(&self, i: usize, j: usize) -> &Bound {
        &self.matrix[i * self.dim() + j]
    }

    fn set_at(&mut self, i: usize, j: usize, b: Bound) {
        let dim = self.dim();
        self.matrix[i * dim + j] = b;
    }

    fn tighten_at(&mut self, i: usize, j: usize, b: Bound) {
        if b < *self.at(i, j) {
            self.set_at(i, j, b);
            self.normalized = false;
        }
    }

    /// Matrix index of `v`, growing the matrix if needed.
    fn ensure(&mut self, v: &V) -> usize {
        if let Some(i) = self.index.get(v) {
            return *i;
        }
        let old_dim = self.dim();
        let new_dim = old_dim + 1;
        let mut matrix = vec![Bound::plus_infinity(); new_dim * new_dim];
        for i in 0..old_dim {
            for j in 0..old_dim {
                matrix[i * new_dim + j] = self.matrix[i * old_dim + j].clone();
            }
        }
        matrix[old_dim * new_dim + old_dim] = Bound::zero();
        self.matrix = matrix;
        self.vars.push(v.clone());
        self.index.insert(v.clone(), old_dim);
        old_dim
    }

    fn lookup(&self, v: &V) -> Option<usize> {
        self.index.get(v).copied()
    }

    /// Floyd-Warshall closure; detects infeasibility on the diagonal.
    fn close_in_place(&mut self) {
        if self.normalized || self.is_bottom {
            self.normalized = true;
            return;
        }
        let dim = self.dim();
        tracing::trace!(dim, "closing difference-bound matrix");
        for k in 0..dim {
            for i in 0..dim {
                if self.at(i, k).is_infinite() {
                    continue;
                }
                for j in 0..dim {
                    let through = self.at(i, k) + self.at(k, j);
                    if through < *self.at(i, j) {
                        self.set_at(i, j, through);
                    }
                }
            }
        }
        for i in 0..dim {
            if *self.at(i, i) < Bound::zero() {
                self.set_to_bottom();
                return;
            }
            self.set_at(i, i, Bound::zero());
        }
        self.normalized = true;
    }

    /// A closed copy (or `self` if already closed).
    fn closed(&self) -> Self {
        if self.normalized {
            self.clone()
        } else {
            let mut c = self.clone();
            c.close_in_place();
            c
        }
    }

    /// Expand `self` with the variables of `other`, in a canonical order,
    /// so both matrices can be combined pointwise.
    fn unified_with(&self, other: &Self) -> (Self, Self) {
        let mut left = self.clone();
        for v in &other.vars {
            left.ensure(v);
        }
        let mut right = other.clone();
        for v in &left.vars {
            right.ensure(v);
        }
        // Same variable set; align right's layout on left's.
        let dim = left.dim();
        let mut aligned = right.clone();
        aligned.vars = left.vars.clone();
        aligned.index = left.index.clone();
        aligned.matrix = vec![Bound::plus_infinity(); dim * dim];
        let map_index = |l: &Self, r: &Self, i: usize| -> usize {
            if i == 0 {
                0
            } else {
                r.index[&l.vars[i - 1]]
            }
        };
        for i in 0..dim {
            let ri = map_index(&left, &right, i);
            for j in 0..dim {
                let rj = map_index(&left, &right, j);
                aligned.matrix[i * dim + j] = right.at(ri, rj).clone();
            }
        }
        (left, aligned)
    }

    /// Unbounded value of the variable at index `i` (requires closure for
    /// the tightest answer; sound regardless).
    fn bounds_of(&self, i: usize) -> Interval {
        Interval::new(-self.at(0, i), self.at(i, 0).clone())
    }

    /// Forget all constraints on index `i`.
    fn project(&mut self, i: usize) {
        self.close_in_place();
        if self.is_bottom {
            return;
        }
        let dim = self.dim();
        for j in 0..dim {
            if j != i {
                self.set_at(i, j, Bound::plus_infinity());
                self.set_at(j, i, Bound::plus_infinity());
            }
        }
    }

    /// Pin index `i` to exactly the given interval, discarding relations.
    fn set_bounds(&mut self, i: usize, bounds: &Interval) {
        if bounds.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.project(i);
        if self.is_bottom {
            return;
        }
        self.set_at(i, 0, bounds.ub().clone());
        self.set_at(0, i, -bounds.lb());
        self.normalized = false;
    }

    /// Recognize `±x + c <= 0` and `x - y + c <= 0` forms; anything else
    /// falls back to interval propagation on each variable.
    fn add_inequality(&mut self, e: &LinearExpression<V>) {
        let c = e.cst().clone();
        let terms: Vec<(&V, &Int)> = e.terms().collect();
        match terms.as_slice() {
            [(x, a)] if **a == Int::one() => {
                // x <= -c
                let i = self.ensure(x);
                self.tighten_at(i, 0, Bound::from(-c));
            }
            [(x, a)] if **a == -Int::one() => {
                // -x <= -c, i.e. x >= c
                let i = self.ensure(x);
                self.tighten_at(0, i, Bound::from(-c));
            }
            [(x, ax), (y, ay)] if **ax == Int::one() && **ay == -Int::one() => {
                // x - y <= -c
                let i = self.ensure(x);
                let j = self.ensure(y);
                self.tighten_at(i, j, Bound::from(-c));
            }
            [(x, ax), (y, ay)] if **ax == -Int::one() && **ay == Int::one() => {
                // y - x <= -c
                let i = self.ensure(x);
                let j = self.ensure(y);
                self.tighten_at(j, i, Bound::from(-c));
            }
            _ => self.fallback_propagate(e),
        }
    }

    /// Interval propagation for constraints outside the DBM fragment.
    fn fallback_propagate(&mut self, e: &LinearExpression<V>) {
        let closed = self.closed();
        if closed.is_bottom {
            self.set_to_bottom();
            return;
        }
        let vars: Vec<V> = e.vars().cloned().collect();
        for x in &vars {
            let a = e.coefficient(x);
            let mut rest = Interval::singleton_of(-e.cst().clone());
            for (v, coeff) in e.terms() {
                if v == x {
                    continue;
                }
                let value = closed
                    .lookup(v)
                    .map(|i| closed.bounds_of(i))
                    .unwrap_or_else(Interval::top);
                rest = &rest - &value.mul(&Interval::singleton_of(coeff.clone()));
            }
            let solution = if a.is_negative() {
                Interval::new(rest.ub().div_ceil(&a), Bound::plus_infinity())
            } else {
                Interval::new(Bound::minus_infinity(), rest.ub().div_floor(&a))
            };
            let i = self.ensure(x);
            self.tighten_at(i, 0, solution.ub().clone());
            let lb = solution.lb();
            if lb.is_finite() {
                self.tighten_at(0, i, -lb);
            }
            if self.closed().is_bottom {
                self.set_to_bottom();
                return;
            }
        }
    }
}

impl<V: Variable> AbstractDomain for Dbm<V> {
    fn bottom() -> Self {
        Self {
            is_bottom: true,
            normalized: true,
            vars: Vec::new(),
            index: HashMap::new(),
            matrix: vec![Bound::zero()],
        }
    }

    fn top() -> Self {
        Self {
            is_bottom: false,
            normalized: true,
            vars: Vec::new(),
            index: HashMap::new(),
            matrix: vec![Bound::zero()],
        }
    }

    fn is_bottom(&self) -> bool {
        if self.is_bottom {
            return true;
        }
        if self.normalized {
            return false;
        }
        self.closed().is_bottom
    }

    fn is_top(&self) -> bool {
        !self.is_bottom
            && self
                .matrix
                .iter()
                .enumerate()
                .all(|(k, b)| k % (self.dim() + 1) == 0 || b.is_infinite())
    }

    fn set_to_bottom(&mut self) {
        *self = Self::bottom();
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        let (left, right) = self.closed().unified_with(other);
        if left.is_bottom {
            return true;
        }
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                if left.at(i, j) > right.at(i, j) {
                    return false;
                }
            }
        }
        true
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let (mut left, right) = self.closed().unified_with(&other.closed());
        if left.is_bottom {
            return right;
        }
        if right.is_bottom {
            return left;
        }
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                let merged = left.at(i, j).clone().max(right.at(i, j).clone());
                left.set_at(i, j, merged);
            }
        }
        left.normalized = false;
        left
    }

    fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        // The left argument must not be closed here: closing it can undo
        // previous extrapolations and break termination.
        let (mut left, right) = self.unified_with(&other.closed());
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                if right.at(i, j) > left.at(i, j) {
                    left.set_at(i, j, Bound::plus_infinity());
                }
            }
        }
        left.normalized = false;
        left
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let t = Bound::from(threshold.clone());
        let (mut left, right) = self.unified_with(&other.closed());
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                if right.at(i, j) > left.at(i, j) {
                    let jumped = if *right.at(i, j) <= t {
                        t.clone()
                    } else {
                        Bound::plus_infinity()
                    };
                    left.set_at(i, j, jumped);
                }
            }
        }
        left.normalized = false;
        left
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let (mut left, right) = self.unified_with(other);
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                let merged = left.at(i, j).clone().min(right.at(i, j).clone());
                left.set_at(i, j, merged);
            }
        }
        left.normalized = false;
        left
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let (mut left, right) = self.closed().unified_with(&other.closed());
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                if left.at(i, j).is_infinite() {
                    left.set_at(i, j, right.at(i, j).clone());
                }
            }
        }
        left.normalized = false;
        left
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let t = Bound::from(threshold.clone());
        let (mut left, right) = self.closed().unified_with(&other.closed());
        let dim = left.dim();
        for i in 0..dim {
            for j in 0..dim {
                if left.at(i, j).is_infinite() || *left.at(i, j) == t {
                    left.set_at(i, j, right.at(i, j).clone());
                }
            }
        }
        left.normalized = false;
        left
    }

    fn normalize(&mut self) {
        self.close_in_place();
    }
}

impl<V: Variable> NumericDomain<V> for Dbm<V> {
    fn assign(&mut self, x: &V, e: &LinearExpression<V>) {
        if self.is_bottom {
            return;
        }
        if e.is_constant() {
            let i = self.ensure(x);
            self.set_bounds(i, &Interval::singleton_of(e.cst().clone()));
            return;
        }
        // x := y + c keeps the difference structure exact.
        if e.num_terms() == 1 {
            let (y, a) = e.terms().next().map(|(v, c)| (v.clone(), c.clone())).unwrap();
            if a == Int::one() {
                let c = e.cst().clone();
                if y == *x {
                    // x := x + c: shift every bound involving x.
                    self.close_in_place();
                    if self.is_bottom {
                        return;
                    }
                    let i = self.ensure(x);
                    let dim = self.dim();
                    for j in 0..dim {
                        if j == i {
                            continue;
                        }
                        let up = self.at(i, j) + &c;
                        self.set_at(i, j, up);
                        let down = self.at(j, i) - &Bound::from(c.clone());
                        self.set_at(j, i, down);
                    }
                    return;
                }
                self.close_in_place();
                if self.is_bottom {
                    return;
                }
                let i = self.ensure(x);
                self.project(i);
                let j = self.ensure(&y);
                let i = self.lookup(x).unwrap();
                // x - y <= c and y - x <= -c
                self.set_at(i, j, Bound::from(c.clone()));
                self.set_at(j, i, Bound::from(-c));
                self.normalized = false;
                return;
            }
        }
        // General case: evaluate to an interval.
        let value = self.to_interval_expr(e);
        let i = self.ensure(x);
        self.set_bounds(i, &value);
    }

    fn apply(&mut self, op: NumBinOp, x: &V, y: &NumOperand<V>, z: &NumOperand<V>) {
        if self.is_bottom {
            return;
        }
        match (op, y, z) {
            (NumBinOp::Add, NumOperand::Var(y), NumOperand::Const(c)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_constant(c);
                self.assign(x, &e);
            }
            (NumBinOp::Add, NumOperand::Const(c), NumOperand::Var(y)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_constant(c);
                self.assign(x, &e);
            }
            (NumBinOp::Sub, NumOperand::Var(y), NumOperand::Const(c)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_constant(&-c.clone());
                self.assign(x, &e);
            }
            _ => {
                let vy = self.operand_interval(y);
                let vz = self.operand_interval(z);
                let value = <Interval as NumValue>::apply(op, &vy, &vz);
                let i = self.ensure(x);
                self.set_bounds(i, &value);
            }
        }
    }

    fn add_constraint(&mut self, cst: &LinearConstraint<V>) {
        if self.is_bottom {
            return;
        }
        if let Some(decided) = cst.constant_value() {
            if !decided {
                self.set_to_bottom();
            }
            return;
        }
        match cst.kind() {
            ConstraintKind::Inequality => self.add_inequality(cst.expression()),
            ConstraintKind::Equality => {
                self.add_inequality(cst.expression());
                if !self.is_bottom {
                    self.add_inequality(&-cst.expression());
                }
            }
            ConstraintKind::Disequation => {
                // Only useful when the expression is pinned to a single
                // non-zero value.
                let value = self.to_interval_expr(cst.expression());
                if let Some(n) = value.singleton() {
                    if n.is_zero() {
                        self.set_to_bottom();
                    }
                }
            }
        }
    }

    fn set(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom {
            return;
        }
        let i = self.ensure(x);
        self.set_bounds(i, value.interval());
    }

    fn refine(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom {
            return;
        }
        let i = self.ensure(x);
        let refined = self.closed().bounds_of(i).meet(value.interval());
        if refined.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.tighten_at(i, 0, refined.ub().clone());
        let lb = refined.lb();
        if lb.is_finite() {
            self.tighten_at(0, i, -lb);
        }
    }

    fn forget(&mut self, x: &V) {
        if self.is_bottom {
            return;
        }
        if let Some(i) = self.lookup(x) {
            self.project(i);
        }
    }

    fn to_interval(&self, x: &V) -> Interval {
        if self.is_bottom {
            return Interval::bottom();
        }
        match self.lookup(x) {
            Some(i) => self.closed().bounds_of(i),
            None => Interval::top(),
        }
    }

    fn to_congruence(&self, x: &V) -> Congruence {
        if self.is_bottom {
            return Congruence::bottom();
        }
        match self.to_interval(x).singleton() {
            Some(n) => Congruence::singleton_of(n.clone()),
            None => Congruence::top(),
        }
    }
}

impl<V: Variable> Dbm<V> {
    fn operand_interval(&self, o: &NumOperand<V>) -> Interval {
        match o {
            NumOperand::Var(v) => self.to_interval(v),
            NumOperand::Const(n) => Interval::singleton_of(n.clone()),
        }
    }
}

impl<V: Variable> fmt::Display for Dbm<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            return write!(f, "_|_");
        }
        let mut first = true;
        let dim = self.dim();
        let name = |i: usize| -> String {
            if i == 0 {
                "0".into()
            } else {
                self.vars[i - 1].to_string()
            }
        };
        for i in 0..dim {
            for j in 0..dim {
                if i == j || self.at(i, j).is_infinite() {
                    continue;
                }
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{} - {} <= {}", name(i), name(j), self.at(i, j))?;
                first = false;
            }
        }
        if first {
            write!(f, "{{}}")?;
        }
        Ok(())
    }
}

impl<V: Variable> fmt::Debug for Dbm<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = Dbm<u64>;

    const X: u64 = 1;
    const Y: u64 = 2;

    #[test]
    fn constant_assignment() {
        let mut d = D::top();
        d.assign(&X, &LinearExpression::constant(5));
        assert_eq!(d.to_interval(&X), Interval::new(5, 5));
    }

    #[test]
    fn difference_is_tracked() {
        let mut d = D::top();
        // y := x + 3, 0 <= x <= 10
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::from(3));
        d.assign(&Y, &e);
        d.add_constraint(&LinearConstraint::ge(
            LinearExpression::var(X),
            LinearExpression::constant(0),
        ));
        d.add_constraint(&LinearConstraint::le(
            LinearExpression::var(X),
            LinearExpression::constant(10),
        ));
        assert_eq!(d.to_interval(&Y), Interval::new(3, 13));
    }

    #[test]
    fn closure_detects_conflict() {
        let mut d = D::top();
        // x - y <= -1 and y - x <= -1 is infeasible
        d.add_constraint(&LinearConstraint::lt(
            LinearExpression::var(X),
            LinearExpression::var(Y),
        ));
        d.add_constraint(&LinearConstraint::lt(
            LinearExpression::var(Y),
            LinearExpression::var(X),
        ));
        assert!(d.is_bottom());
    }

    #[test]
    fn increment_shifts_bounds() {
        let mut d = D::top();
        d.assign(&X, &LinearExpression::constant(4));
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::one());
        d.assign(&X, &e);
        assert_eq!(d.to_interval(&X), Interval::new(5, 5));
    }

    #[test]
    fn join_keeps_common_constraints() {
        let mut a = D::top();
        a.assign(&X, &LinearExpression::constant(0));
        let mut b = D::top();
        b.assign(&X, &LinearExpression::constant(10));
        let j = a.join(&b);
        assert_eq!(j.to_interval(&X), Interval::new(0, 10));
    }

    #[test]
    fn widening_stabilizes() {
        let mut a = D::top();
        a.assign(&X, &LinearExpression::constant(0));
        let mut b = D::top();
        b.set(
            &X,
            &IntervalCongruence::from_interval(Interval::new(0, 1)),
        );
        let w = a.widening(&b);
        let ivl = w.to_interval(&X);
        assert_eq!(ivl.lb(), &Bound::zero());
        assert!(ivl.ub().is_infinite());
        // A second widening with a larger state must be a fixpoint.
        let mut c = D::top();
        c.set(&X, &IntervalCongruence::from_interval(Interval::new(0, 2)));
        let w2 = w.widening(&c);
        assert!(w.equals(&w2));
    }

    #[test]
    fn project_keeps_others() {
        let mut d = D::top();
        d.assign(&X, &LinearExpression::constant(1));
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::from(2));
        d.assign(&Y, &e);
        d.forget(&X);
        assert!(d.to_interval(&X).is_top());
        assert_eq!(d.to_interval(&Y), Interval::new(3, 3));
    }
}
