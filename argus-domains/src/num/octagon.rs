//! Octagon domain: `±xᵢ ± xⱼ <= c` constraints.

use core::fmt;

use argus_num::{Bound, Congruence, Int, Interval, IntervalCongruence};
use hashbrown::HashMap;

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintKind, LinearConstraint, LinearExpression};
use crate::var::Variable;

use super::{NumBinOp, NumOperand, NumericDomain};
use super::value::NumValue;

/// Octagonal constraints over a 2n x 2n difference-bound matrix.
///
/// Variable `xₖ` (1-based index `k`) owns two matrix slots: `2k-1` encodes
/// `+xₖ` and `2k` encodes `-xₖ`. Entry `m(i, j)` bounds `Vᵢ - Vⱼ`, so
/// `m(2k-1, 2k)` bounds `2xₖ` and `m(2k, 2k-1)` bounds `-2xₖ`.
///
/// `normalize` runs Miné's strong closure: a Floyd-Warshall pass through
/// both slots of each pivot followed by the half-sum tightening step that
/// closes the interaction between a variable's two slots. A per-variable
/// normalization vector records which pivots are already closed, so
/// repeated normalization after touching one variable does not rescan the
/// whole matrix. A negative diagonal after closure means the constraints
/// are infeasible.
pub struct Octagon<V: Variable> {
    is_bottom: bool,
    normalized: bool,
    vars: Vec<V>,
    index: HashMap<V, usize>,
    /// Row-major (2n)², 0-based storage for the 1-based matrix.
    matrix: Vec<Bound>,
    /// Per-variable "already closed" flags.
    norm: Vec<bool>,
}

impl<V: Variable> Clone for Octagon<V> {
    fn clone(&self) -> Self {
        Self {
            is_bottom: self.is_bottom,
            normalized: self.normalized,
            vars: self.vars.clone(),
            index: self.index.clone(),
            matrix: self.matrix.clone(),
            norm: self.norm.clone(),
        }
    }
}

/// The other slot of the same variable: `2k-1 <-> 2k`.
fn bar(i: usize) -> usize {
    if i % 2 == 1 {
        i + 1
    } else {
        i - 1
    }
}

impl<V: Variable> Octagon<V> {
    fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn dim(&self) -> usize {
        2 * self.vars.len()
    }

    /// One-based access.
    fn at(&self, i: usize, j: usize) -> &Bound {
        &self.matrix[(i - 1) * self.dim() + (j - 1)]
    }

    fn set_at(&mut self, i: usize, j: usize, b: Bound) {
        let dim = self.dim();
        self.matrix[(i - 1) * dim + (j - 1)] = b;
    }

    fn tighten_at(&mut self, i: usize, j: usize, b: Bound) {
        if b < *self.at(i, j) {
            self.set_at(i, j, b);
            self.touch(i);
            self.touch(j);
        }
    }

    /// Mark the variable owning slot `i` as needing re-closure.
    fn touch(&mut self, i: usize) {
        let var = (i + 1) / 2;
        self.norm[var - 1] = false;
        self.normalized = false;
    }

    /// 1-based variable index, growing the matrix if needed.
    fn ensure(&mut self, v: &V) -> usize {
        if let Some(k) = self.index.get(v) {
            return *k;
        }
        let old_n = self.num_vars();
        let old_dim = 2 * old_n;
        let new_dim = old_dim + 2;
        let mut matrix = vec![Bound::plus_infinity(); new_dim * new_dim];
        for i in 0..old_dim {
            for j in 0..old_dim {
                matrix[i * new_dim + j] = self.matrix[i * old_dim + j].clone();
            }
        }
        for d in [old_dim, old_dim + 1] {
            matrix[d * new_dim + d] = Bound::zero();
        }
        self.matrix = matrix;
        self.vars.push(v.clone());
        self.index.insert(v.clone(), old_n + 1);
        self.norm.push(false);
        self.normalized = false;
        old_n + 1
    }

    fn lookup(&self, v: &V) -> Option<usize> {
        self.index.get(v).copied()
    }

    /// Miné's strong closure.
    fn close_in_place(&mut self) {
        if self.normalized || self.is_bottom {
            self.normalized = true;
            return;
        }
        let n = self.num_vars();
        let dim = self.dim();
        tracing::trace!(variables = n, "strong-closing octagon");
        for k in 1..=n {
            if self.norm[k - 1] {
                continue;
            }
            let pos = 2 * k - 1;
            let neg = 2 * k;
            for i in 1..=dim {
                for j in 1..=dim {
                    let mut best = self.at(i, j).clone();
                    let candidates = [
                        self.at(i, pos) + self.at(pos, j),
                        self.at(i, neg) + self.at(neg, j),
                        &(self.at(i, pos) + self.at(pos, neg)) + self.at(neg, j),
                        &(self.at(i, neg) + self.at(neg, pos)) + self.at(pos, j),
                    ];
                    for c in candidates {
                        if c < best {
                            best = c;
                        }
                    }
                    self.set_at(i, j, best);
                }
            }
            // Tightening through each variable's own pair of slots:
            // Vᵢ - Vⱼ <= (2Vᵢ's bound + (-2Vⱼ)'s bound) / 2.
            for i in 1..=dim {
                for j in 1..=dim {
                    let half = (self.at(i, bar(i)) + self.at(bar(j), j))
                        .div_floor(&Int::from(2));
                    if half < *self.at(i, j) {
                        self.set_at(i, j, half);
                    }
                }
            }
            self.norm[k - 1] = true;
        }
        for i in 1..=dim {
            if *self.at(i, i) < Bound::zero() {
                self.set_to_bottom();
                return;
            }
            self.set_at(i, i, Bound::zero());
        }
        self.normalized = true;
    }

    fn closed(&self) -> Self {
        if self.normalized {
            self.clone()
        } else {
            let mut c = self.clone();
            c.close_in_place();
            c
        }
    }

    fn unified_with(&self, other: &Self) -> (Self, Self) {
        let mut left = self.clone();
        for v in &other.vars {
            left.ensure(v);
        }
        let mut right = other.clone();
        for v in &left.vars {
            right.ensure(v);
        }
        let dim = left.dim();
        let mut aligned = right.clone();
        aligned.vars = left.vars.clone();
        aligned.index = left.index.clone();
        aligned.matrix = vec![Bound::plus_infinity(); dim * dim];
        aligned.norm = vec![false; left.num_vars()];
        // Map left's slot i to right's slot for the same variable.
        let slot = |i: usize| -> usize {
            let var = (i + 1) / 2;
            let rk = right.index[&left.vars[var - 1]];
            if i % 2 == 1 {
                2 * rk - 1
            } else {
                2 * rk
            }
        };
        for i in 1..=dim {
            let ri = slot(i);
            for j in 1..=dim {
                let rj = slot(j);
                aligned.matrix[(i - 1) * dim + (j - 1)] = right.at(ri, rj).clone();
            }
        }
        (left, aligned)
    }

    /// Bounds of variable `k` (1-based).
    fn bounds_of(&self, k: usize) -> Interval {
        let two = Int::from(2);
        let ub = self.at(2 * k - 1, 2 * k).div_floor(&two);
        let lb = -self.at(2 * k, 2 * k - 1).div_floor(&two);
        Interval::new(lb, ub)
    }

    fn project(&mut self, k: usize) {
        self.close_in_place();
        if self.is_bottom {
            return;
        }
        let dim = self.dim();
        for slot in [2 * k - 1, 2 * k] {
            for j in 1..=dim {
                if j != slot {
                    self.set_at(slot, j, Bound::plus_infinity());
                    self.set_at(j, slot, Bound::plus_infinity());
                }
            }
        }
        self.set_at(2 * k - 1, 2 * k, Bound::plus_infinity());
        self.set_at(2 * k, 2 * k - 1, Bound::plus_infinity());
        self.norm[k - 1] = false;
        self.normalized = false;
    }

    fn set_bounds(&mut self, k: usize, bounds: &Interval) {
        if bounds.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.project(k);
        if self.is_bottom {
            return;
        }
        let two = Bound::from(Int::from(2));
        self.set_at(2 * k - 1, 2 * k, bounds.ub() * &two);
        self.set_at(2 * k, 2 * k - 1, &-bounds.lb() * &two);
        self.touch(2 * k - 1);
    }

    /// Add `Vᵢ - Vⱼ <= c` together with its coherent dual.
    fn add_edge(&mut self, i: usize, j: usize, c: Bound) {
        self.tighten_at(i, j, c.clone());
        self.tighten_at(bar(j), bar(i), c);
    }

    /// Recognize the octagonal fragment of `e <= 0`; fall back to interval
    /// propagation otherwise.
    fn add_inequality(&mut self, e: &LinearExpression<V>) {
        let c = Bound::from(-e.cst().clone());
        let one = Int::one();
        let minus_one = -Int::one();
        let terms: Vec<(&V, &Int)> = e.terms().collect();
        match terms.as_slice() {
            [(x, a)] if **a == one => {
                // x <= c, i.e. 2x <= 2c
                let k = self.ensure(x);
                let two = Bound::from(Int::from(2));
                self.tighten_at(2 * k - 1, 2 * k, &c * &two);
            }
            [(x, a)] if **a == minus_one => {
                let k = self.ensure(x);
                let two = Bound::from(Int::from(2));
                self.tighten_at(2 * k, 2 * k - 1, &c * &two);
            }
            [(x, ax), (y, ay)] if (**ax == one || **ax == minus_one) && (**ay == one || **ay == minus_one) => {
                let i = self.ensure(x);
                let j = self.ensure(y);
                match (**ax == one, **ay == one) {
                    // x - y <= c
                    (true, false) => self.add_edge(2 * i - 1, 2 * j - 1, c),
                    // y - x <= c
                    (false, true) => self.add_edge(2 * j - 1, 2 * i - 1, c),
                    // x + y <= c
                    (true, true) => self.add_edge(2 * i - 1, 2 * j, c),
                    // -x - y <= c
                    (false, false) => self.add_edge(2 * i, 2 * j - 1, c),
                }
            }
            _ => self.fallback_propagate(e),
        }
    }

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
                    .map(|k| closed.bounds_of(k))
                    .unwrap_or_else(Interval::top);
                rest = &rest - &value.mul(&Interval::singleton_of(coeff.clone()));
            }
            let k = self.ensure(x);
            let current = self.closed().bounds_of(k);
            let solution = if a.is_negative() {
                Interval::new(rest.ub().div_ceil(&a), Bound::plus_infinity())
            } else {
                Interval::new(Bound::minus_infinity(), rest.ub().div_floor(&a))
            };
            let refined = current.meet(&solution);
            if refined.is_bottom() {
                self.set_to_bottom();
                return;
            }
            self.set_bounds(k, &refined);
        }
    }

    fn operand_interval(&self, o: &NumOperand<V>) -> Interval {
        match o {
            NumOperand::Var(v) => self.to_interval(v),
            NumOperand::Const(n) => Interval::singleton_of(n.clone()),
        }
    }
}

impl<V: Variable> AbstractDomain for Octagon<V> {
    fn bottom() -> Self {
        Self {
            is_bottom: true,
            normalized: true,
            vars: Vec::new(),
            index: HashMap::new(),
            matrix: Vec::new(),
            norm: Vec::new(),
        }
    }

    fn top() -> Self {
        Self {
            is_bottom: false,
            normalized: true,
            vars: Vec::new(),
            index: HashMap::new(),
            matrix: Vec::new(),
            norm: Vec::new(),
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
            && (0..self.dim()).all(|i| {
                (0..self.dim()).all(|j| i == j || self.matrix[i * self.dim() + j].is_infinite())
            })
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
        for i in 1..=dim {
            for j in 1..=dim {
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
        for i in 1..=dim {
            for j in 1..=dim {
                let merged = left.at(i, j).clone().max(right.at(i, j).clone());
                left.set_at(i, j, merged);
            }
        }
        // Pointwise max of strongly closed matrices is closed.
        left.normalized = true;
        left.norm = vec![true; left.num_vars()];
        left
    }

    fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        // Do not close the left argument: closing can refine entries that
        // a previous widening set to infinity and defeat termination.
        let (mut left, right) = self.unified_with(&other.closed());
        let dim = left.dim();
        for i in 1..=dim {
            for j in 1..=dim {
                if right.at(i, j) > left.at(i, j) {
                    left.set_at(i, j, Bound::plus_infinity());
                }
            }
        }
        left.normalized = false;
        left.norm = vec![false; left.num_vars()];
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
        for i in 1..=dim {
            for j in 1..=dim {
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
        left.norm = vec![false; left.num_vars()];
        left
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let (mut left, right) = self.unified_with(other);
        let dim = left.dim();
        for i in 1..=dim {
            for j in 1..=dim {
                let merged = left.at(i, j).clone().min(right.at(i, j).clone());
                left.set_at(i, j, merged);
            }
        }
        left.normalized = false;
        left.norm = vec![false; left.num_vars()];
        left
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let (mut left, right) = self.closed().unified_with(&other.closed());
        let dim = left.dim();
        for i in 1..=dim {
            for j in 1..=dim {
                if left.at(i, j).is_infinite() {
                    left.set_at(i, j, right.at(i, j).clone());
                }
            }
        }
        left.normalized = false;
        left.norm = vec![false; left.num_vars()];
        left
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        // Threshold narrowing does not tighten per-constraint here; fall
        // back to the plain variant. Per-constraint tightening is a
        // possible future refinement.
        let _ = threshold;
        self.narrowing(other)
    }

    fn normalize(&mut self) {
        self.close_in_place();
    }
}

impl<V: Variable> NumericDomain<V> for Octagon<V> {
    fn assign(&mut self, x: &V, e: &LinearExpression<V>) {
        if self.is_bottom {
            return;
        }
        if e.is_constant() {
            let k = self.ensure(x);
            self.set_bounds(k, &Interval::singleton_of(e.cst().clone()));
            return;
        }
        if e.num_terms() == 1 {
            let (y, a) = e.terms().next().map(|(v, c)| (v.clone(), c.clone())).unwrap();
            if a == Int::one() {
                let c = e.cst().clone();
                if y == *x {
                    // x := x + c: shift both slots of x.
                    self.close_in_place();
                    if self.is_bottom {
                        return;
                    }
                    let k = self.ensure(x);
                    let (pos, neg) = (2 * k - 1, 2 * k);
                    let dim = self.dim();
                    let cb = Bound::from(c);
                    for j in 1..=dim {
                        if j == pos || j == neg {
                            continue;
                        }
                        let v = self.at(pos, j) + &cb;
                        self.set_at(pos, j, v);
                        let v = self.at(j, pos) - &cb;
                        self.set_at(j, pos, v);
                        let v = self.at(neg, j) - &cb;
                        self.set_at(neg, j, v);
                        let v = self.at(j, neg) + &cb;
                        self.set_at(j, neg, v);
                    }
                    let two_c = &cb + &cb;
                    let v = self.at(pos, neg) + &two_c;
                    self.set_at(pos, neg, v);
                    let v = self.at(neg, pos) - &two_c;
                    self.set_at(neg, pos, v);
                    return;
                }
                // x := y + c
                self.close_in_place();
                if self.is_bottom {
                    return;
                }
                let k = self.ensure(x);
                self.project(k);
                let ky = self.ensure(&y);
                let cb = Bound::from(c);
                // x - y <= c and y - x <= -c
                self.add_edge(2 * k - 1, 2 * ky - 1, cb.clone());
                self.add_edge(2 * ky - 1, 2 * k - 1, -&cb);
                return;
            }
            if a == -Int::one() && y != *x {
                // x := -y + c
                self.close_in_place();
                if self.is_bottom {
                    return;
                }
                let k = self.ensure(x);
                self.project(k);
                let ky = self.ensure(&y);
                let c = e.cst().clone();
                let cb = Bound::from(c);
                // x + y <= c and -x - y <= -c
                self.add_edge(2 * k - 1, 2 * ky, cb.clone());
                self.add_edge(2 * k, 2 * ky - 1, -&cb);
                return;
            }
        }
        let value = self.to_interval_expr(e);
        let k = self.ensure(x);
        self.set_bounds(k, &value);
    }

    fn apply(&mut self, op: NumBinOp, x: &V, y: &NumOperand<V>, z: &NumOperand<V>) {
        if self.is_bottom {
            return;
        }
        match (op, y, z) {
            (NumBinOp::Add, NumOperand::Var(y), NumOperand::Const(c))
            | (NumBinOp::Add, NumOperand::Const(c), NumOperand::Var(y)) => {
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
                let k = self.ensure(x);
                self.set_bounds(k, &value);
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
        let k = self.ensure(x);
        self.set_bounds(k, value.interval());
    }

    fn refine(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom {
            return;
        }
        let k = self.ensure(x);
        let refined = self.closed().bounds_of(k).meet(value.interval());
        if refined.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let two = Bound::from(Int::from(2));
        self.tighten_at(2 * k - 1, 2 * k, refined.ub() * &two);
        self.tighten_at(2 * k, 2 * k - 1, &-refined.lb() * &two);
    }

    fn forget(&mut self, x: &V) {
        if self.is_bottom {
            return;
        }
        if let Some(k) = self.lookup(x) {
            self.project(k);
        }
    }

    fn to_interval(&self, x: &V) -> Interval {
        if self.is_bottom {
            return Interval::bottom();
        }
        match self.lookup(x) {
            Some(k) => self.closed().bounds_of(k),
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

impl<V: Variable> fmt::Display for Octagon<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            return write!(f, "_|_");
        }
        let term = |i: usize| -> String {
            let var = &self.vars[(i + 1) / 2 - 1];
            if i % 2 == 1 {
                format!("{var}")
            } else {
                format!("-{var}")
            }
        };
        let mut first = true;
        let dim = self.dim();
        for i in 1..=dim {
            for j in 1..=dim {
                if i == j || self.at(i, j).is_infinite() {
                    continue;
                }
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{} - ({}) <= {}", term(i), term(j), self.at(i, j))?;
                first = false;
            }
        }
        if first {
            write!(f, "{{}}")?;
        }
        Ok(())
    }
}

impl<V: Variable> fmt::Debug for Octagon<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = Octagon<u64>;

    const X: u64 = 1;
    const Y: u64 = 2;

    fn cst(n: i64) -> LinearExpression<u64> {
        LinearExpression::constant(n)
    }

    #[test]
    fn constant_assign() {
        let mut d = D::top();
        d.assign(&X, &cst(7));
        assert_eq!(d.to_interval(&X), Interval::new(7, 7));
    }

    #[test]
    fn sum_constraint() {
        let mut d = D::top();
        // x + y <= 10, x >= 4, y >= 2
        let mut sum = LinearExpression::var(X);
        sum.add_term(Y, Int::one());
        d.add_constraint(&LinearConstraint::le(sum, cst(10)));
        d.add_constraint(&LinearConstraint::ge(LinearExpression::var(X), cst(4)));
        d.add_constraint(&LinearConstraint::ge(LinearExpression::var(Y), cst(2)));
        // Closure derives x <= 8 and y <= 6.
        assert_eq!(d.to_interval(&X), Interval::new(4, 8));
        assert_eq!(d.to_interval(&Y), Interval::new(2, 6));
    }

    #[test]
    fn negated_alias() {
        let mut d = D::top();
        d.assign(&X, &cst(5));
        // y := -x
        d.assign(&Y, &LinearExpression::term(X, -1));
        assert_eq!(d.to_interval(&Y), Interval::new(-5, -5));
    }

    #[test]
    fn infeasible_pair() {
        let mut d = D::top();
        let mut sum = LinearExpression::var(X);
        sum.add_term(Y, Int::one());
        // x + y <= -1 and x >= 0 and y >= 0
        d.add_constraint(&LinearConstraint::le(sum, cst(-1)));
        d.add_constraint(&LinearConstraint::ge(LinearExpression::var(X), cst(0)));
        d.add_constraint(&LinearConstraint::ge(LinearExpression::var(Y), cst(0)));
        assert!(d.is_bottom());
    }

    #[test]
    fn shift_in_place() {
        let mut d = D::top();
        d.assign(&X, &cst(1));
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::from(2));
        d.assign(&X, &e);
        assert_eq!(d.to_interval(&X), Interval::new(3, 3));
    }

    #[test]
    fn join_and_widening() {
        let mut a = D::top();
        a.assign(&X, &cst(0));
        let mut b = D::top();
        b.assign(&X, &cst(1));
        let j = a.join(&b);
        assert_eq!(j.to_interval(&X), Interval::new(0, 1));

        let w = a.widening(&j);
        let ivl = w.to_interval(&X);
        assert_eq!(ivl.lb(), &Bound::zero());
        assert!(ivl.ub().is_infinite());
    }

    #[test]
    fn difference_tracked_through_join() {
        // On both branches y = x + 1, with different x.
        let mk = |n: i64| {
            let mut d = D::top();
            d.assign(&X, &cst(n));
            let mut e = LinearExpression::var(X);
            e.add_constant(&Int::one());
            d.assign(&Y, &e);
            d
        };
        let j = mk(0).join(&mk(10));
        // x ∈ [0,10], y ∈ [1,11], and y - x == 1 is preserved.
        let mut diff = LinearExpression::var(Y);
        diff.add_term(X, -Int::one());
        let mut probe = j.clone();
        probe.add_constraint(&LinearConstraint::eq(diff, cst(5)));
        assert!(probe.is_bottom());
    }
}
