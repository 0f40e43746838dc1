//! Linear expressions and constraints.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use std::collections::BTreeMap;

use argus_num::Int;

use crate::var::Variable;

/// `Σ aᵢ·xᵢ + c` with non-zero coefficients, ordered by variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearExpression<V: Variable> {
    constant: Int,
    terms: BTreeMap<V, Int>,
}

impl<V: Variable> LinearExpression<V> {
    pub fn constant(c: impl Into<Int>) -> Self {
        Self {
            constant: c.into(),
            terms: BTreeMap::new(),
        }
    }

    pub fn zero() -> Self {
        Self::constant(0)
    }

    pub fn var(v: V) -> Self {
        Self::term(v, 1)
    }

    pub fn term(v: V, coeff: impl Into<Int>) -> Self {
        let mut e = Self::zero();
        e.add_term(v, coeff.into());
        e
    }

    /// Add `coeff·v` to the expression.
    pub fn add_term(&mut self, v: V, coeff: Int) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.get_mut(&v) {
            Some(existing) => {
                *existing += &coeff;
                if existing.is_zero() {
                    self.terms.remove(&v);
                }
            }
            None => {
                self.terms.insert(v, coeff);
            }
        }
    }

    pub fn add_constant(&mut self, c: &Int) {
        self.constant += c;
    }

    pub fn cst(&self) -> &Int {
        &self.constant
    }

    /// Iterate `(variable, coefficient)` pairs in variable order.
    pub fn terms(&self) -> impl Iterator<Item = (&V, &Int)> {
        self.terms.iter()
    }

    pub fn vars(&self) -> impl Iterator<Item = &V> {
        self.terms.keys()
    }

    pub fn coefficient(&self, v: &V) -> Int {
        self.terms.get(v).cloned().unwrap_or_else(Int::zero)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// `Some(v)` if the expression is exactly `1·v + 0`.
    pub fn as_var(&self) -> Option<&V> {
        if self.constant.is_zero() && self.terms.len() == 1 {
            let (v, coeff) = self.terms.iter().next().unwrap();
            if *coeff == Int::one() {
                return Some(v);
            }
        }
        None
    }

    pub fn scale(&self, factor: &Int) -> Self {
        if factor.is_zero() {
            return Self::zero();
        }
        Self {
            constant: &self.constant * factor,
            terms: self
                .terms
                .iter()
                .map(|(v, c)| (v.clone(), c * factor))
                .collect(),
        }
    }
}

impl<V: Variable> From<Int> for LinearExpression<V> {
    fn from(c: Int) -> Self {
        Self::constant(c)
    }
}

impl<V: Variable> Add for &LinearExpression<V> {
    type Output = LinearExpression<V>;

    fn add(self, rhs: &LinearExpression<V>) -> LinearExpression<V> {
        let mut out = self.clone();
        out.constant += &rhs.constant;
        for (v, c) in &rhs.terms {
            out.add_term(v.clone(), c.clone());
        }
        out
    }
}

impl<V: Variable> Sub for &LinearExpression<V> {
    type Output = LinearExpression<V>;

    fn sub(self, rhs: &LinearExpression<V>) -> LinearExpression<V> {
        self + &-rhs
    }
}

impl<V: Variable> Neg for &LinearExpression<V> {
    type Output = LinearExpression<V>;

    fn neg(self) -> LinearExpression<V> {
        self.scale(&Int::from(-1))
    }
}

impl<V: Variable> Mul<&Int> for &LinearExpression<V> {
    type Output = LinearExpression<V>;

    fn mul(self, rhs: &Int) -> LinearExpression<V> {
        self.scale(rhs)
    }
}

impl<V: Variable> fmt::Display for LinearExpression<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (v, c) in &self.terms {
            if first {
                if *c == Int::one() {
                    write!(f, "{v}")?;
                } else {
                    write!(f, "{c}*{v}")?;
                }
                first = false;
            } else if c.is_negative() {
                write!(f, " - {}*{v}", c.abs())?;
            } else {
                write!(f, " + {c}*{v}")?;
            }
        }
        if first {
            write!(f, "{}", self.constant)
        } else if self.constant.is_negative() {
            write!(f, " - {}", self.constant.abs())
        } else if !self.constant.is_zero() {
            write!(f, " + {}", self.constant)
        } else {
            Ok(())
        }
    }
}

/// Relation of a [`LinearConstraint`] to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `e == 0`
    Equality,
    /// `e <= 0`
    Inequality,
    /// `e != 0`
    Disequation,
}

/// A linear constraint `e ⋈ 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint<V: Variable> {
    expr: LinearExpression<V>,
    kind: ConstraintKind,
}

impl<V: Variable> LinearConstraint<V> {
    pub fn new(expr: LinearExpression<V>, kind: ConstraintKind) -> Self {
        Self { expr, kind }
    }

    /// `lhs == rhs`
    pub fn eq(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        Self::new(&lhs - &rhs, ConstraintKind::Equality)
    }

    /// `lhs != rhs`
    pub fn ne(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        Self::new(&lhs - &rhs, ConstraintKind::Disequation)
    }

    /// `lhs <= rhs`
    pub fn le(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        Self::new(&lhs - &rhs, ConstraintKind::Inequality)
    }

    /// `lhs >= rhs`
    pub fn ge(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        Self::new(&rhs - &lhs, ConstraintKind::Inequality)
    }

    /// `lhs < rhs`, i.e. `lhs <= rhs - 1` over the integers.
    pub fn lt(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        let mut e = &lhs - &rhs;
        e.add_constant(&Int::one());
        Self::new(e, ConstraintKind::Inequality)
    }

    /// `lhs > rhs`
    pub fn gt(lhs: LinearExpression<V>, rhs: LinearExpression<V>) -> Self {
        Self::lt(rhs, lhs)
    }

    /// A constraint that always holds.
    pub fn tautology() -> Self {
        Self::new(LinearExpression::zero(), ConstraintKind::Equality)
    }

    /// A constraint that never holds.
    pub fn contradiction() -> Self {
        Self::new(LinearExpression::zero(), ConstraintKind::Disequation)
    }

    pub fn expression(&self) -> &LinearExpression<V> {
        &self.expr
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// `Some(true)` / `Some(false)` if the constraint is trivially
    /// decided, `None` if it involves variables.
    pub fn constant_value(&self) -> Option<bool> {
        if !self.expr.is_constant() {
            return None;
        }
        let c = self.expr.cst();
        Some(match self.kind {
            ConstraintKind::Equality => c.is_zero(),
            ConstraintKind::Inequality => !c.is_positive(),
            ConstraintKind::Disequation => !c.is_zero(),
        })
    }
}

impl<V: Variable> fmt::Display for LinearConstraint<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.kind {
            ConstraintKind::Equality => "==",
            ConstraintKind::Inequality => "<=",
            ConstraintKind::Disequation => "!=",
        };
        write!(f, "{} {op} 0", self.expr)
    }
}

/// Conjunction of linear constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSystem<V: Variable> {
    constraints: Vec<LinearConstraint<V>>,
}

impl<V: Variable> ConstraintSystem<V> {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    pub fn push(&mut self, cst: LinearConstraint<V>) {
        self.constraints.push(cst);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinearConstraint<V>> {
        self.constraints.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }
}

impl<V: Variable> fmt::Display for ConstraintSystem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use itertools::Itertools;
        write!(f, "{{{}}}", self.constraints.iter().format("; "))
    }
}

impl<V: Variable> FromIterator<LinearConstraint<V>> for ConstraintSystem<V> {
    fn from_iter<I: IntoIterator<Item = LinearConstraint<V>>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

impl<V: Variable> IntoIterator for ConstraintSystem<V> {
    type Item = LinearConstraint<V>;
    type IntoIter = std::vec::IntoIter<LinearConstraint<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> u64 {
        1
    }

    fn y() -> u64 {
        2
    }

    #[test]
    fn terms_cancel() {
        let mut e = LinearExpression::term(x(), 2);
        e.add_term(x(), Int::from(-2));
        assert!(e.is_constant());
        assert_eq!(e, LinearExpression::zero());
    }

    #[test]
    fn as_var() {
        assert_eq!(LinearExpression::var(x()).as_var(), Some(&x()));
        assert_eq!(LinearExpression::term(x(), 2).as_var(), None);
    }

    #[test]
    fn strict_inequality_is_tightened() {
        // x < y  ==>  x - y + 1 <= 0
        let c = LinearConstraint::lt(LinearExpression::var(x()), LinearExpression::var(y()));
        assert_eq!(c.kind(), ConstraintKind::Inequality);
        assert_eq!(c.expression().cst(), &Int::one());
    }

    #[test]
    fn constant_constraints_decide() {
        let c = LinearConstraint::<u64>::le(
            LinearExpression::constant(3),
            LinearExpression::constant(5),
        );
        assert_eq!(c.constant_value(), Some(true));
        let c = LinearConstraint::<u64>::eq(
            LinearExpression::constant(3),
            LinearExpression::constant(5),
        );
        assert_eq!(c.constant_value(), Some(false));
    }
}
