//! Machine-integer abstract domain layer.
//!
//! Statements of the analyzed program operate on bounded integers; the
//! numerical domains operate on unbounded ones. The [`WrapDomain`] adapter
//! sits between the two: it forwards arithmetic to any
//! [`NumericDomain`](crate::num::NumericDomain) and wraps results that
//! escape their type's range.

mod wrap;

pub use wrap::WrapDomain;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{MachineInt, Sign};

use crate::lattice::AbstractDomain;
use crate::linear::LinearExpression;
use crate::var::ScalarVariable;

/// Unary machine-integer cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntUnaryOp {
    /// Truncate to a smaller width.
    Trunc(u32),
    /// Zero/sign extend to a larger width.
    Ext(u32),
    /// Reinterpret with the other signedness.
    SignCast(Sign),
    /// Arbitrary cast: trunc/ext then sign change.
    Cast(u32, Sign),
}

/// Binary machine-integer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum IntBinaryOp {
    #[display(fmt = "add")]
    Add,
    #[display(fmt = "sub")]
    Sub,
    #[display(fmt = "mul")]
    Mul,
    #[display(fmt = "udiv")]
    UDiv,
    #[display(fmt = "sdiv")]
    SDiv,
    #[display(fmt = "urem")]
    URem,
    #[display(fmt = "srem")]
    SRem,
    #[display(fmt = "shl")]
    Shl,
    #[display(fmt = "lshr")]
    LShr,
    #[display(fmt = "ashr")]
    AShr,
    #[display(fmt = "and")]
    And,
    #[display(fmt = "or")]
    Or,
    #[display(fmt = "xor")]
    Xor,
}

/// Comparison predicate, evaluated in the operands' signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum IntPredicate {
    #[display(fmt = "==")]
    Eq,
    #[display(fmt = "!=")]
    Ne,
    #[display(fmt = ">")]
    Gt,
    #[display(fmt = ">=")]
    Ge,
    #[display(fmt = "<")]
    Lt,
    #[display(fmt = "<=")]
    Le,
}

impl IntPredicate {
    pub fn negate(self) -> Self {
        match self {
            IntPredicate::Eq => IntPredicate::Ne,
            IntPredicate::Ne => IntPredicate::Eq,
            IntPredicate::Gt => IntPredicate::Le,
            IntPredicate::Ge => IntPredicate::Lt,
            IntPredicate::Lt => IntPredicate::Ge,
            IntPredicate::Le => IntPredicate::Gt,
        }
    }
}

/// Operand of a machine-integer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOperand<V> {
    Var(V),
    Const(MachineInt),
}

impl<V> From<MachineInt> for IntOperand<V> {
    fn from(n: MachineInt) -> Self {
        IntOperand::Const(n)
    }
}

/// Abstract domain over machine-integer variables.
///
/// All operations are width- and sign-aware; mixing operand widths is a
/// programming error and panics. Division or remainder by a definitely
/// zero divisor sets the state to bottom.
pub trait MachineIntDomain<V: ScalarVariable>: AbstractDomain {
    /// `x := n`.
    fn int_assign(&mut self, x: &V, n: &MachineInt);

    /// `x := y`.
    fn int_assign_var(&mut self, x: &V, y: &V);

    /// `x := e` for a linear expression over machine integers.
    fn int_assign_expr(&mut self, x: &V, e: &LinearExpression<V>);

    /// `x := ?`, any value of x's type.
    fn int_assign_nondet(&mut self, x: &V);

    /// `x := op(y)`.
    fn int_apply_unary(&mut self, op: IntUnaryOp, x: &V, y: &V);

    /// `x := y op z`.
    fn int_apply(&mut self, op: IntBinaryOp, x: &V, y: &IntOperand<V>, z: &IntOperand<V>);

    /// Assume `x pred y`.
    fn int_add(&mut self, pred: IntPredicate, x: &IntOperand<V>, y: &IntOperand<V>);

    fn int_set(&mut self, x: &V, value: &IntIntervalCongruence);

    fn int_refine(&mut self, x: &V, value: &IntIntervalCongruence);

    fn int_forget(&mut self, x: &V);

    fn int_to_interval(&self, x: &V) -> IntInterval;

    fn int_to_congruence(&self, x: &V) -> IntCongruence;

    fn int_to_interval_congruence(&self, x: &V) -> IntIntervalCongruence {
        IntIntervalCongruence::new(self.int_to_interval(x), self.int_to_congruence(x))
    }

    /// Evaluate a linear expression to an interval of x's type.
    fn int_to_interval_expr(&self, e: &LinearExpression<V>, width: u32, sign: Sign)
        -> IntInterval;

    /// Declare a loop counter (gauge support).
    fn counter_mark(&mut self, _x: &V) {}

    fn counter_unmark(&mut self, _x: &V) {}

    fn counter_init(&mut self, x: &V, c: &MachineInt);

    fn counter_incr(&mut self, x: &V, k: &MachineInt);

    fn counter_forget(&mut self, x: &V);
}
