//! Numerical abstract domains over unbounded integers.
//!
//! These domains reason about arbitrary-precision values; the machine
//! integer layer ([`crate::machine`]) wraps them to bounded types. The
//! non-relational environments ([`IntervalDomain`], [`CongruenceDomain`],
//! [`IntervalCongruenceDomain`]) share one generic implementation; the
//! relational domains ([`Dbm`], [`Octagon`], [`GaugeDomain`]) track
//! difference, octagonal and counter-affine constraints.

mod dbm;
mod env;
mod gauge;
mod octagon;
mod value;

pub use dbm::Dbm;
pub use env::{CongruenceDomain, EnvDomain, IntervalCongruenceDomain, IntervalDomain};
pub use gauge::{Gauge, GaugeBound, GaugeDomain};
pub use octagon::Octagon;
pub use value::NumValue;

use argus_num::{Congruence, Int, Interval, IntervalCongruence};

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintSystem, LinearConstraint, LinearExpression};
use crate::var::Variable;

/// Binary operation on unbounded integers.
///
/// Division and remainder truncate toward zero; the shift amount of `Shl`
/// and `AShr` must be non-negative. The machine layer lowers its
/// signed/unsigned variants onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NumBinOp {
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Sub,
    #[display(fmt = "*")]
    Mul,
    #[display(fmt = "/")]
    Div,
    #[display(fmt = "%")]
    Rem,
    #[display(fmt = "<<")]
    Shl,
    #[display(fmt = ">>")]
    AShr,
    #[display(fmt = "&")]
    And,
    #[display(fmt = "|")]
    Or,
    #[display(fmt = "^")]
    Xor,
}

/// Operand of a numerical operation: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumOperand<V> {
    Var(V),
    Const(Int),
}

impl<V> From<V> for NumOperand<V> {
    fn from(v: V) -> Self {
        NumOperand::Var(v)
    }
}

impl<V> NumOperand<V> {
    pub fn constant(n: impl Into<Int>) -> Self {
        NumOperand::Const(n.into())
    }
}

/// Interface of the numerical domains.
///
/// The environment maps variables to unbounded integer sets. All
/// operations are total; a definite runtime error (division by a
/// definitely-zero divisor) transitions the state to bottom.
pub trait NumericDomain<V: Variable>: AbstractDomain {
    /// `x := e`.
    fn assign(&mut self, x: &V, e: &LinearExpression<V>);

    /// `x := y op z`.
    fn apply(&mut self, op: NumBinOp, x: &V, y: &NumOperand<V>, z: &NumOperand<V>);

    /// Add a constraint, refining the state.
    fn add_constraint(&mut self, cst: &LinearConstraint<V>);

    fn add_constraints(&mut self, csts: &ConstraintSystem<V>) {
        for cst in csts.iter() {
            if self.is_bottom() {
                return;
            }
            self.add_constraint(cst);
        }
    }

    /// Overwrite the value of `x`.
    fn set(&mut self, x: &V, value: &IntervalCongruence);

    /// Meet the value of `x` with `value`.
    fn refine(&mut self, x: &V, value: &IntervalCongruence);

    fn forget(&mut self, x: &V);

    fn to_interval(&self, x: &V) -> Interval;

    fn to_congruence(&self, x: &V) -> Congruence;

    fn to_interval_congruence(&self, x: &V) -> IntervalCongruence {
        IntervalCongruence::new(self.to_interval(x), self.to_congruence(x))
    }

    /// Evaluate a linear expression to an interval.
    fn to_interval_expr(&self, e: &LinearExpression<V>) -> Interval {
        let mut result = Interval::singleton_of(e.cst().clone());
        for (v, coeff) in e.terms() {
            let term = self
                .to_interval(v)
                .mul(&Interval::singleton_of(coeff.clone()));
            result = &result + &term;
        }
        result
    }

    /// Declare `x` as a loop counter. Only the gauge domain reacts.
    fn counter_mark(&mut self, _x: &V) {}

    fn counter_unmark(&mut self, _x: &V) {}

    /// `x := c` for a counter variable.
    fn counter_init(&mut self, x: &V, c: &Int) {
        self.assign(x, &LinearExpression::constant(c.clone()));
    }

    /// `x := x + k` for a counter variable, `k >= 0`.
    fn counter_incr(&mut self, x: &V, k: &Int) {
        let mut e = LinearExpression::var(x.clone());
        e.add_constant(k);
        self.assign(x, &e);
    }

    fn counter_forget(&mut self, x: &V) {
        self.forget(x);
    }
}
