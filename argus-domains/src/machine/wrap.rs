//! Wrap-aware adapter over an unbounded numerical domain.

use core::fmt;
use core::marker::PhantomData;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{Int, Interval, IntervalCongruence, MachineInt, Sign};

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintSystem, LinearConstraint, LinearExpression};
use crate::num::{NumBinOp, NumOperand, NumValue, NumericDomain};
use crate::var::ScalarVariable;

use super::{IntBinaryOp, IntOperand, IntPredicate, IntUnaryOp, MachineIntDomain};

/// Machine-integer semantics on top of any [`NumericDomain`].
///
/// Variables hold their semantic values (signed or unsigned per their
/// declared type) in the underlying unbounded domain. After every
/// arithmetic operation the result variable is wrapped: if its interval
/// fits the type range the relational information survives untouched,
/// otherwise the variable is reduced to its wrapped range.
pub struct WrapDomain<V: ScalarVariable, D: NumericDomain<V>> {
    inner: D,
    _vars: PhantomData<fn() -> V>,
}

impl<V: ScalarVariable, D: NumericDomain<V>> Clone for WrapDomain<V, D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _vars: PhantomData,
        }
    }
}

fn assert_same_type<V: ScalarVariable>(x: &V, y: &V) {
    assert!(
        x.bit_width() == y.bit_width() && x.sign() == y.sign(),
        "incompatible machine integer variables {x} and {y}"
    );
}

impl<V: ScalarVariable, D: NumericDomain<V>> WrapDomain<V, D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            _vars: PhantomData,
        }
    }

    /// Access to the underlying unbounded domain.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn type_range(width: u32, sign: Sign) -> Interval {
        IntInterval::top(width, sign).to_interval().clone()
    }

    /// Re-establish `x ∈ [min, max]` of its type after an operation,
    /// keeping relations when no wrap can have happened.
    fn wrap_var(&mut self, x: &V) {
        let width = x.bit_width();
        let sign = x.sign();
        let value = self.inner.to_interval(x);
        if value.leq(&Self::type_range(width, sign)) {
            return;
        }
        let wrapped = IntInterval::from_unbounded(value, width, sign);
        self.inner.set(
            x,
            &IntervalCongruence::from_interval(wrapped.to_interval().clone()),
        );
    }

    fn operand_type(&self, o: &IntOperand<V>) -> (u32, Sign) {
        match o {
            IntOperand::Var(v) => (v.bit_width(), v.sign()),
            IntOperand::Const(n) => (n.bit_width(), n.sign()),
        }
    }

    fn to_num_operand(o: &IntOperand<V>) -> NumOperand<V> {
        match o {
            IntOperand::Var(v) => NumOperand::Var(v.clone()),
            IntOperand::Const(n) => NumOperand::Const(n.to_int()),
        }
    }

    fn operand_interval(&self, o: &IntOperand<V>) -> Interval {
        match o {
            IntOperand::Var(v) => self.inner.to_interval(v),
            IntOperand::Const(n) => Interval::singleton_of(n.to_int()),
        }
    }

    fn operand_expr(o: &IntOperand<V>) -> LinearExpression<V> {
        match o {
            IntOperand::Var(v) => LinearExpression::var(v.clone()),
            IntOperand::Const(n) => LinearExpression::constant(n.to_int()),
        }
    }

    /// Operand interval reinterpreted with the given signedness.
    fn reinterpreted(&self, o: &IntOperand<V>, sign: Sign) -> Interval {
        let (width, _) = self.operand_type(o);
        IntInterval::from_unbounded(self.operand_interval(o), width, sign)
            .to_interval()
            .clone()
    }

    /// Divisor handling shared by the division/remainder family: bottom on
    /// a definite zero divisor.
    fn check_divisor(&mut self, z: &IntOperand<V>) -> bool {
        let divisor = self.operand_interval(z);
        if let Some(n) = divisor.singleton() {
            if n.is_zero() {
                self.set_to_bottom();
                return false;
            }
        }
        if divisor.is_bottom() {
            self.set_to_bottom();
            return false;
        }
        true
    }

    /// Clamp a shift operand to `[0, width)`; bottom when impossible.
    fn check_shift(&mut self, z: &IntOperand<V>, width: u32) -> bool {
        let amount = self
            .operand_interval(z)
            .meet(&Interval::new(Int::zero(), Int::from(i64::from(width) - 1)));
        if amount.is_bottom() {
            self.set_to_bottom();
            return false;
        }
        if let IntOperand::Var(v) = z {
            self.inner
                .refine(v, &IntervalCongruence::from_interval(amount));
        }
        true
    }

    /// Interval-only fallback: compute the unsigned or signed view of both
    /// operands, apply, wrap into x's type.
    fn apply_via_intervals(
        &mut self,
        op: NumBinOp,
        x: &V,
        y: &IntOperand<V>,
        z: &IntOperand<V>,
        view: Sign,
    ) {
        let vy = self.reinterpreted(y, view);
        let vz = self.reinterpreted(z, view);
        let result = <Interval as NumValue>::apply(op, &vy, &vz);
        if result.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let wrapped = IntInterval::from_unbounded(result, x.bit_width(), x.sign());
        self.inner.set(
            x,
            &IntervalCongruence::from_interval(wrapped.to_interval().clone()),
        );
    }
}

impl<V: ScalarVariable, D: NumericDomain<V>> AbstractDomain for WrapDomain<V, D> {
    fn bottom() -> Self {
        Self::new(D::bottom())
    }

    fn top() -> Self {
        Self::new(D::top())
    }

    fn is_bottom(&self) -> bool {
        self.inner.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.inner.is_top()
    }

    fn leq(&self, other: &Self) -> bool {
        self.inner.leq(&other.inner)
    }

    fn equals(&self, other: &Self) -> bool {
        self.inner.equals(&other.inner)
    }

    fn join(&self, other: &Self) -> Self {
        Self::new(self.inner.join(&other.inner))
    }

    fn join_loop(&self, other: &Self) -> Self {
        Self::new(self.inner.join_loop(&other.inner))
    }

    fn join_iter(&self, other: &Self) -> Self {
        Self::new(self.inner.join_iter(&other.inner))
    }

    fn widening(&self, other: &Self) -> Self {
        Self::new(self.inner.widening(&other.inner))
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Self::new(self.inner.widening_threshold(&other.inner, threshold))
    }

    fn meet(&self, other: &Self) -> Self {
        Self::new(self.inner.meet(&other.inner))
    }

    fn narrowing(&self, other: &Self) -> Self {
        Self::new(self.inner.narrowing(&other.inner))
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Self::new(self.inner.narrowing_threshold(&other.inner, threshold))
    }

    fn normalize(&mut self) {
        self.inner.normalize();
    }
}

impl<V: ScalarVariable, D: NumericDomain<V>> MachineIntDomain<V> for WrapDomain<V, D> {
    fn int_assign(&mut self, x: &V, n: &MachineInt) {
        assert!(
            x.bit_width() == n.bit_width() && x.sign() == n.sign(),
            "assigning {n:?} to incompatible variable {x}"
        );
        self.inner
            .assign(x, &LinearExpression::constant(n.to_int()));
    }

    fn int_assign_var(&mut self, x: &V, y: &V) {
        assert_same_type(x, y);
        self.inner.assign(x, &LinearExpression::var(y.clone()));
    }

    fn int_assign_expr(&mut self, x: &V, e: &LinearExpression<V>) {
        for (v, _) in e.terms() {
            assert_same_type(x, v);
        }
        self.inner.assign(x, e);
        self.wrap_var(x);
    }

    fn int_assign_nondet(&mut self, x: &V) {
        self.inner.set(
            x,
            &IntervalCongruence::from_interval(Self::type_range(x.bit_width(), x.sign())),
        );
    }

    fn int_apply_unary(&mut self, op: IntUnaryOp, x: &V, y: &V) {
        if self.is_bottom() {
            return;
        }
        match op {
            IntUnaryOp::Trunc(width) => {
                assert!(width < y.bit_width(), "trunc must shrink the width");
                assert!(x.bit_width() == width && x.sign() == y.sign());
            }
            IntUnaryOp::Ext(width) => {
                assert!(width > y.bit_width(), "ext must grow the width");
                assert!(x.bit_width() == width && x.sign() == y.sign());
            }
            IntUnaryOp::SignCast(sign) => {
                assert!(sign != y.sign(), "sign cast must change the sign");
                assert!(x.bit_width() == y.bit_width() && x.sign() == sign);
            }
            IntUnaryOp::Cast(width, sign) => {
                assert!(x.bit_width() == width && x.sign() == sign);
            }
        }
        // The semantic value is preserved whenever it fits the result
        // type; assigning then wrapping captures exactly that.
        self.inner.assign(x, &LinearExpression::var(y.clone()));
        self.wrap_var(x);
    }

    fn int_apply(&mut self, op: IntBinaryOp, x: &V, y: &IntOperand<V>, z: &IntOperand<V>) {
        if self.is_bottom() {
            return;
        }
        let (width, sign) = (x.bit_width(), x.sign());
        let (wy, sy) = self.operand_type(y);
        let (wz, sz) = self.operand_type(z);
        assert!(
            width == wy && width == wz && sign == sy && sign == sz,
            "mixed operand types in {op}"
        );
        match op {
            IntBinaryOp::Add | IntBinaryOp::Sub | IntBinaryOp::Mul => {
                let nop = match op {
                    IntBinaryOp::Add => NumBinOp::Add,
                    IntBinaryOp::Sub => NumBinOp::Sub,
                    _ => NumBinOp::Mul,
                };
                self.inner
                    .apply(nop, x, &Self::to_num_operand(y), &Self::to_num_operand(z));
                self.wrap_var(x);
            }
            IntBinaryOp::SDiv | IntBinaryOp::SRem => {
                if !self.check_divisor(z) {
                    return;
                }
                let nop = if op == IntBinaryOp::SDiv {
                    NumBinOp::Div
                } else {
                    NumBinOp::Rem
                };
                if sign == Sign::Signed {
                    self.inner
                        .apply(nop, x, &Self::to_num_operand(y), &Self::to_num_operand(z));
                    self.wrap_var(x);
                } else {
                    self.apply_via_intervals(nop, x, y, z, Sign::Signed);
                }
            }
            IntBinaryOp::UDiv | IntBinaryOp::URem => {
                if !self.check_divisor(z) {
                    return;
                }
                let nop = if op == IntBinaryOp::UDiv {
                    NumBinOp::Div
                } else {
                    NumBinOp::Rem
                };
                if sign == Sign::Unsigned {
                    self.inner
                        .apply(nop, x, &Self::to_num_operand(y), &Self::to_num_operand(z));
                    self.wrap_var(x);
                } else {
                    self.apply_via_intervals(nop, x, y, z, Sign::Unsigned);
                }
            }
            IntBinaryOp::Shl => {
                if !self.check_shift(z, width) {
                    return;
                }
                self.inner.apply(
                    NumBinOp::Shl,
                    x,
                    &Self::to_num_operand(y),
                    &Self::to_num_operand(z),
                );
                self.wrap_var(x);
            }
            IntBinaryOp::LShr => {
                if !self.check_shift(z, width) {
                    return;
                }
                if sign == Sign::Unsigned {
                    self.inner.apply(
                        NumBinOp::AShr,
                        x,
                        &Self::to_num_operand(y),
                        &Self::to_num_operand(z),
                    );
                    self.wrap_var(x);
                } else {
                    // Logical shift reads the bits unsigned.
                    self.apply_via_intervals(NumBinOp::AShr, x, y, z, Sign::Unsigned);
                }
            }
            IntBinaryOp::AShr => {
                if !self.check_shift(z, width) {
                    return;
                }
                if sign == Sign::Signed {
                    self.inner.apply(
                        NumBinOp::AShr,
                        x,
                        &Self::to_num_operand(y),
                        &Self::to_num_operand(z),
                    );
                    self.wrap_var(x);
                } else {
                    self.apply_via_intervals(NumBinOp::AShr, x, y, z, Sign::Signed);
                }
            }
            IntBinaryOp::And | IntBinaryOp::Or | IntBinaryOp::Xor => {
                let nop = match op {
                    IntBinaryOp::And => NumBinOp::And,
                    IntBinaryOp::Or => NumBinOp::Or,
                    _ => NumBinOp::Xor,
                };
                if sign == Sign::Unsigned {
                    self.inner
                        .apply(nop, x, &Self::to_num_operand(y), &Self::to_num_operand(z));
                } else {
                    self.apply_via_intervals(nop, x, y, z, Sign::Unsigned);
                }
                self.wrap_var(x);
            }
        }
    }

    fn int_add(&mut self, pred: IntPredicate, x: &IntOperand<V>, y: &IntOperand<V>) {
        if self.is_bottom() {
            return;
        }
        let (wx, sx) = self.operand_type(x);
        let (wy, sy) = self.operand_type(y);
        assert!(wx == wy && sx == sy, "mixed operand types in comparison");
        let ex = Self::operand_expr(x);
        let ey = Self::operand_expr(y);
        let cst = match pred {
            IntPredicate::Eq => LinearConstraint::eq(ex, ey),
            IntPredicate::Ne => LinearConstraint::ne(ex, ey),
            IntPredicate::Gt => LinearConstraint::gt(ex, ey),
            IntPredicate::Ge => LinearConstraint::ge(ex, ey),
            IntPredicate::Lt => LinearConstraint::lt(ex, ey),
            IntPredicate::Le => LinearConstraint::le(ex, ey),
        };
        self.inner.add_constraint(&cst);
    }

    fn int_set(&mut self, x: &V, value: &IntIntervalCongruence) {
        assert!(x.bit_width() == value.bit_width() && x.sign() == value.sign());
        self.inner.set(
            x,
            &IntervalCongruence::new(
                value.interval().to_interval().clone(),
                value.congruence().to_congruence().clone(),
            ),
        );
    }

    fn int_refine(&mut self, x: &V, value: &IntIntervalCongruence) {
        assert!(x.bit_width() == value.bit_width() && x.sign() == value.sign());
        self.inner.refine(
            x,
            &IntervalCongruence::new(
                value.interval().to_interval().clone(),
                value.congruence().to_congruence().clone(),
            ),
        );
    }

    fn int_forget(&mut self, x: &V) {
        self.inner.forget(x);
    }

    fn int_to_interval(&self, x: &V) -> IntInterval {
        IntInterval::from_unbounded(self.inner.to_interval(x), x.bit_width(), x.sign())
    }

    fn int_to_congruence(&self, x: &V) -> IntCongruence {
        IntCongruence::from_unbounded(self.inner.to_congruence(x), x.bit_width(), x.sign())
    }

    fn int_to_interval_expr(
        &self,
        e: &LinearExpression<V>,
        width: u32,
        sign: Sign,
    ) -> IntInterval {
        IntInterval::from_unbounded(self.inner.to_interval_expr(e), width, sign)
    }

    fn counter_mark(&mut self, x: &V) {
        self.inner.counter_mark(x);
    }

    fn counter_unmark(&mut self, x: &V) {
        self.inner.counter_unmark(x);
    }

    fn counter_init(&mut self, x: &V, c: &MachineInt) {
        self.inner.counter_init(x, &c.to_int());
    }

    fn counter_incr(&mut self, x: &V, k: &MachineInt) {
        self.inner.counter_incr(x, &k.to_int());
        self.wrap_var(x);
    }

    fn counter_forget(&mut self, x: &V) {
        self.inner.counter_forget(x);
    }
}

impl<V: ScalarVariable, D: NumericDomain<V>> WrapDomain<V, D> {
    /// Assume a whole constraint system.
    pub fn int_add_system(&mut self, csts: &ConstraintSystem<V>) {
        self.inner.add_constraints(csts);
    }
}

impl<V: ScalarVariable, D: NumericDomain<V> + fmt::Display> fmt::Display for WrapDomain<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<V: ScalarVariable, D: NumericDomain<V> + fmt::Debug> fmt::Debug for WrapDomain<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::{Context, Var};
    use crate::num::IntervalDomain;

    type D = WrapDomain<Var, IntervalDomain<Var>>;

    fn u8var(ctx: &Context, name: &str) -> Var {
        ctx.int_var(name, 8, Sign::Unsigned)
    }

    fn mi(n: i64) -> MachineInt {
        MachineInt::new(n, 8, Sign::Unsigned)
    }

    #[test]
    fn add_wraps() {
        let ctx = Context::new();
        let x = u8var(&ctx, "x");
        let y = u8var(&ctx, "y");
        let mut d = D::top();
        d.int_assign(&x, &mi(200));
        d.int_apply(
            IntBinaryOp::Add,
            &y,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi(100)),
        );
        let ivl = d.int_to_interval(&y);
        assert_eq!(ivl.singleton(), Some(mi(44)));
    }

    #[test]
    fn in_range_addition_stays_exact() {
        let ctx = Context::new();
        let x = u8var(&ctx, "x2");
        let y = u8var(&ctx, "y2");
        let mut d = D::top();
        d.int_assign(&x, &mi(5));
        d.int_apply(
            IntBinaryOp::Add,
            &y,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi(7)),
        );
        assert_eq!(d.int_to_interval(&y).singleton(), Some(mi(12)));
    }

    #[test]
    fn division_by_definite_zero_is_bottom() {
        let ctx = Context::new();
        let x = u8var(&ctx, "x3");
        let y = u8var(&ctx, "y3");
        let mut d = D::top();
        d.int_assign(&x, &mi(10));
        d.int_apply(
            IntBinaryOp::UDiv,
            &y,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi(0)),
        );
        assert!(d.is_bottom());
    }

    #[test]
    fn sign_cast_reinterprets() {
        let ctx = Context::new();
        let x = u8var(&ctx, "x4");
        let y = ctx.int_var("y4", 8, Sign::Signed);
        let mut d = D::top();
        d.int_assign(&x, &mi(200));
        d.int_apply_unary(IntUnaryOp::SignCast(Sign::Signed), &y, &x);
        assert_eq!(
            d.int_to_interval(&y).singleton(),
            Some(MachineInt::new(-56, 8, Sign::Signed))
        );
    }

    #[test]
    fn comparison_constrains() {
        let ctx = Context::new();
        let x = u8var(&ctx, "x5");
        let mut d = D::top();
        d.int_assign_nondet(&x);
        d.int_add(
            IntPredicate::Le,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi(9)),
        );
        let ivl = d.int_to_interval(&x);
        assert_eq!(ivl.to_interval(), &Interval::new(0, 9));
    }
}
