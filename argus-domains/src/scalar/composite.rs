//! Scalar composite domain.

use core::fmt;
use core::marker::PhantomData;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{Int, MachineInt, Sign};

use crate::lattice::AbstractDomain;
use crate::linear::{LinearExpression};
use crate::machine::{IntBinaryOp, IntOperand, IntPredicate, IntUnaryOp, MachineIntDomain};
use crate::nullity::{Nullity, NullityDomain};
use crate::pointer::{PointerAbsValue, PointsToSet};
use crate::separate::{LatticeValue, SeparateDomain};
use crate::uninit::{Uninitialized, UninitializedDomain};
use crate::var::{MemoryLocation, ScalarVariable};

use super::ScalarDomain;

/// Scalar domain assembled from four underlying abstractions.
///
/// Per variable kind, the state kept is:
///
/// | kind    | state |
/// |---------|-------|
/// | int     | initialization + machine integer value |
/// | float   | initialization only |
/// | pointer | initialization + nullity + points-to + offset |
/// | dynamic | all of the above on the same variable |
///
/// Bitfield idiom: a bitwise and/or with a constant does not assert the
/// initialization of the variable operand, because such reads of
/// uninitialized padding are legitimate.
pub struct CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    uninitialized: UninitializedDomain<V>,
    integer: D,
    nullity: NullityDomain<V>,
    points_to: SeparateDomain<V, PointsToSet<M>>,
    _vars: PhantomData<fn() -> V>,
}

impl<V, M, D> Clone for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    fn clone(&self) -> Self {
        Self {
            uninitialized: self.uninitialized.clone(),
            integer: self.integer.clone(),
            nullity: self.nullity.clone(),
            points_to: self.points_to.clone(),
            _vars: PhantomData,
        }
    }
}

impl<V, M, D> CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    /// Quick bottom check that avoids normalizing the integer domain.
    fn is_bottom_fast(&self) -> bool {
        self.uninitialized.is_bottom()
    }

    /// Collapse to bottom if the initialization layer became infeasible.
    fn check_uninit(&mut self) -> bool {
        if self.uninitialized.is_bottom() {
            self.set_to_bottom();
            false
        } else {
            true
        }
    }

    /// The and/or-with-constant bitfield exception: those reads may touch
    /// uninitialized padding and are not initialization errors.
    fn assert_initialized_unless_masking(&mut self, op: IntBinaryOp, v: &V) {
        if matches!(op, IntBinaryOp::And | IntBinaryOp::Or) {
            return;
        }
        self.uninitialized.assert_initialized(v);
    }

    fn zero_offset(&mut self, p: &V) {
        let offset = p.offset_var();
        let zero = MachineInt::zero(offset.bit_width(), offset.sign());
        self.integer.int_assign(&offset, &zero);
    }
}

impl<V, M, D> AbstractDomain for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    fn bottom() -> Self {
        Self {
            uninitialized: UninitializedDomain::bottom(),
            integer: D::bottom(),
            nullity: NullityDomain::bottom(),
            points_to: SeparateDomain::bottom(),
            _vars: PhantomData,
        }
    }

    fn top() -> Self {
        Self {
            uninitialized: UninitializedDomain::top(),
            integer: D::top(),
            nullity: NullityDomain::top(),
            points_to: SeparateDomain::top(),
            _vars: PhantomData,
        }
    }

    fn is_bottom(&self) -> bool {
        self.uninitialized.is_bottom()
            || self.nullity.is_bottom()
            || self.points_to.is_bottom()
            || self.integer.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.uninitialized.is_top()
            && self.nullity.is_top()
            && self.points_to.is_top()
            && self.integer.is_top()
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            true
        } else if other.is_bottom() {
            false
        } else {
            self.uninitialized.leq(&other.uninitialized)
                && self.integer.leq(&other.integer)
                && self.nullity.leq(&other.nullity)
                && self.points_to.leq(&other.points_to)
        }
    }

    fn equals(&self, other: &Self) -> bool {
        if self.is_bottom() {
            other.is_bottom()
        } else if other.is_bottom() {
            false
        } else {
            self.uninitialized.equals(&other.uninitialized)
                && self.integer.equals(&other.integer)
                && self.nullity.equals(&other.nullity)
                && self.points_to.equals(&other.points_to)
        }
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        Self {
            uninitialized: self.uninitialized.join(&other.uninitialized),
            integer: self.integer.join(&other.integer),
            nullity: self.nullity.join(&other.nullity),
            points_to: self.points_to.join(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        Self {
            uninitialized: self.uninitialized.widening(&other.uninitialized),
            integer: self.integer.widening(&other.integer),
            nullity: self.nullity.widening(&other.nullity),
            points_to: self.points_to.widening(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        Self {
            uninitialized: self.uninitialized.widening(&other.uninitialized),
            integer: self.integer.widening_threshold(&other.integer, threshold),
            nullity: self.nullity.widening(&other.nullity),
            points_to: self.points_to.widening(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self {
            uninitialized: self.uninitialized.meet(&other.uninitialized),
            integer: self.integer.meet(&other.integer),
            nullity: self.nullity.meet(&other.nullity),
            points_to: self.points_to.meet(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self {
            uninitialized: self.uninitialized.narrowing(&other.uninitialized),
            integer: self.integer.narrowing(&other.integer),
            nullity: self.nullity.narrowing(&other.nullity),
            points_to: self.points_to.narrowing(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self {
            uninitialized: self.uninitialized.narrowing(&other.uninitialized),
            integer: self.integer.narrowing_threshold(&other.integer, threshold),
            nullity: self.nullity.narrowing(&other.nullity),
            points_to: self.points_to.narrowing(&other.points_to),
            _vars: PhantomData,
        }
    }

    fn normalize(&mut self) {
        if self.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.integer.normalize();
        if self.integer.is_bottom() {
            self.set_to_bottom();
        }
    }
}

impl<V, M, D> MachineIntDomain<V> for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    fn int_assign(&mut self, x: &V, n: &MachineInt) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_assign(x, n);
    }

    fn int_assign_var(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
        self.integer.int_assign_var(x, y);
    }

    fn int_assign_expr(&mut self, x: &V, e: &LinearExpression<V>) {
        if self.is_bottom_fast() {
            return;
        }
        for (v, _) in e.terms() {
            self.uninitialized.assert_initialized(v);
        }
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_assign_expr(x, e);
    }

    fn int_assign_nondet(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_forget(x);
    }

    fn int_apply_unary(&mut self, op: IntUnaryOp, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(y);
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_apply_unary(op, x, y);
    }

    fn int_apply(&mut self, op: IntBinaryOp, x: &V, y: &IntOperand<V>, z: &IntOperand<V>) {
        if self.is_bottom_fast() {
            return;
        }
        match (y, z) {
            (IntOperand::Var(vy), IntOperand::Var(vz)) => {
                self.uninitialized.assert_initialized(vy);
                self.uninitialized.assert_initialized(vz);
            }
            (IntOperand::Var(vy), IntOperand::Const(_)) => {
                self.assert_initialized_unless_masking(op, vy);
            }
            (IntOperand::Const(_), IntOperand::Var(vz)) => {
                self.assert_initialized_unless_masking(op, vz);
            }
            (IntOperand::Const(_), IntOperand::Const(_)) => {}
        }
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_apply(op, x, y, z);
    }

    fn int_add(&mut self, pred: IntPredicate, x: &IntOperand<V>, y: &IntOperand<V>) {
        if self.is_bottom_fast() {
            return;
        }
        for operand in [x, y] {
            if let IntOperand::Var(v) = operand {
                self.uninitialized.assert_initialized(v);
            }
        }
        if !self.check_uninit() {
            return;
        }
        self.integer.int_add(pred, x, y);
    }

    fn int_set(&mut self, x: &V, value: &IntIntervalCongruence) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_set(x, value);
    }

    fn int_refine(&mut self, x: &V, value: &IntIntervalCongruence) {
        self.integer.int_refine(x, value);
    }

    fn int_forget(&mut self, x: &V) {
        self.uninitialized.forget(x);
        self.integer.int_forget(x);
    }

    fn int_to_interval(&self, x: &V) -> IntInterval {
        self.integer.int_to_interval(x)
    }

    fn int_to_congruence(&self, x: &V) -> IntCongruence {
        self.integer.int_to_congruence(x)
    }

    fn int_to_interval_expr(
        &self,
        e: &LinearExpression<V>,
        width: u32,
        sign: Sign,
    ) -> IntInterval {
        self.integer.int_to_interval_expr(e, width, sign)
    }

    fn counter_mark(&mut self, x: &V) {
        self.integer.counter_mark(x);
    }

    fn counter_unmark(&mut self, x: &V) {
        self.integer.counter_unmark(x);
    }

    fn counter_init(&mut self, x: &V, c: &MachineInt) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.counter_init(x, c);
    }

    fn counter_incr(&mut self, x: &V, k: &MachineInt) {
        self.integer.counter_incr(x, k);
    }

    fn counter_forget(&mut self, x: &V) {
        self.integer.counter_forget(x);
    }
}

impl<V, M, D> ScalarDomain<V, M> for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V>,
{
    fn uninit_assert_initialized(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(x);
        self.check_uninit();
    }

    fn uninit_is_initialized(&self, x: &V) -> bool {
        self.uninitialized.is_initialized(x)
    }

    fn uninit_is_uninitialized(&self, x: &V) -> bool {
        self.uninitialized.is_uninitialized(x)
    }

    fn uninit_refine(&mut self, x: &V, value: Uninitialized) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.refine(x.clone(), value);
        self.check_uninit();
    }

    fn uninit_to_uninitialized(&self, x: &V) -> Uninitialized {
        self.uninitialized.get(x)
    }

    fn int_assign_undef(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_uninitialized(x.clone());
        self.integer.int_forget(x);
    }

    fn float_assign_undef(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_uninitialized(x.clone());
    }

    fn float_assign_nondet(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
    }

    fn float_assign(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
    }

    fn float_forget(&mut self, x: &V) {
        self.uninitialized.forget(x);
    }

    fn nullity_assert_null(&mut self, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.nullity.assert_null(p);
        if self.nullity.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.points_to.set(p.clone(), PointsToSet::empty());
    }

    fn nullity_assert_non_null(&mut self, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.nullity.assert_non_null(p);
        if self.nullity.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn nullity_is_null(&self, p: &V) -> bool {
        self.nullity.is_null(p)
    }

    fn nullity_is_non_null(&self, p: &V) -> bool {
        self.nullity.is_non_null(p)
    }

    fn nullity_set(&mut self, p: &V, value: Nullity) {
        if self.is_bottom_fast() {
            return;
        }
        self.nullity.set(p.clone(), value);
    }

    fn nullity_refine(&mut self, p: &V, value: Nullity) {
        if self.is_bottom_fast() {
            return;
        }
        self.nullity.refine(p.clone(), value);
        if self.nullity.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn nullity_to_nullity(&self, p: &V) -> Nullity {
        self.nullity.get(p)
    }

    fn pointer_assign_address(&mut self, p: &V, addr: &M, nullity: Nullity) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(p.clone());
        self.nullity.set(p.clone(), nullity);
        self.points_to
            .set(p.clone(), PointsToSet::singleton(addr.clone()));
        self.zero_offset(p);
    }

    fn pointer_assign_null(&mut self, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(p.clone());
        self.nullity.assign_null(p.clone());
        self.points_to.set(p.clone(), PointsToSet::empty());
        self.zero_offset(p);
    }

    fn pointer_assign_undef(&mut self, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_uninitialized(p.clone());
        self.nullity.forget(p);
        self.points_to.set(p.clone(), PointsToSet::empty());
        self.integer.int_forget(&p.offset_var());
    }

    fn pointer_assign_nondet(&mut self, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(p.clone());
        self.nullity.forget(p);
        self.points_to.forget(p);
        self.integer.int_forget(&p.offset_var());
    }

    fn pointer_assign_var(&mut self, p: &V, q: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(p.clone(), q);
        self.nullity.assign_var(p.clone(), q);
        let addrs = self.points_to.get(q);
        self.points_to.set(p.clone(), addrs);
        self.integer
            .int_assign_var(&p.offset_var(), &q.offset_var());
    }

    fn pointer_assign_offset(&mut self, p: &V, q: &V, o: &LinearExpression<V>) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(q);
        for (v, _) in o.terms() {
            self.uninitialized.assert_initialized(v);
        }
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(p.clone());
        self.nullity.assign_var(p.clone(), q);
        let addrs = self.points_to.get(q);
        self.points_to.set(p.clone(), addrs);
        let mut shifted = o.clone();
        shifted.add_term(q.offset_var(), Int::one());
        self.integer.int_assign_expr(&p.offset_var(), &shifted);
    }

    fn pointer_add(&mut self, pred: IntPredicate, p: &V, q: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(p);
        self.uninitialized.assert_initialized(q);
        if !self.check_uninit() {
            return;
        }
        self.nullity.add(pred, p, q);
        if self.nullity.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let addrs_p = self.points_to.get(p);
        let addrs_q = self.points_to.get(q);
        match pred {
            IntPredicate::Eq => {
                let met = addrs_p.meet(&addrs_q);
                if met.is_bottom() || (met.is_empty() && self.nullity.is_non_null(p)) {
                    self.set_to_bottom();
                    return;
                }
                self.points_to.set(p.clone(), met.clone());
                self.points_to.set(q.clone(), met);
                self.integer.int_add(
                    IntPredicate::Eq,
                    &IntOperand::Var(p.offset_var()),
                    &IntOperand::Var(q.offset_var()),
                );
            }
            _ => {
                // Offset reasoning is only sound when both pointers target
                // the same single object.
                let same_object = self.nullity.is_non_null(p)
                    && self.nullity.is_non_null(q)
                    && addrs_p.singleton_location().is_some()
                    && addrs_p == addrs_q;
                if same_object {
                    self.integer.int_add(
                        pred,
                        &IntOperand::Var(p.offset_var()),
                        &IntOperand::Var(q.offset_var()),
                    );
                }
            }
        }
    }

    fn pointer_refine_points_to(&mut self, p: &V, addrs: &PointsToSet<M>) {
        if self.is_bottom_fast() {
            return;
        }
        self.points_to.refine(p.clone(), addrs.clone());
        if self.points_to.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn pointer_refine(&mut self, p: &V, value: &PointerAbsValue<M>) {
        if self.is_bottom_fast() {
            return;
        }
        if value.is_bottom() {
            self.set_to_bottom();
            return;
        }
        self.uninitialized.refine(p.clone(), value.uninitialized());
        self.nullity.refine(p.clone(), value.nullity());
        self.points_to.refine(p.clone(), value.points_to().clone());
        self.integer.int_refine(
            &p.offset_var(),
            &IntIntervalCongruence::from_interval(value.offset().clone()),
        );
        if self.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn pointer_offset_to_int(&mut self, x: &V, p: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(p);
        if !self.check_uninit() {
            return;
        }
        let offset = p.offset_var();
        self.uninitialized.assign_initialized(x.clone());
        if *x == offset {
            return;
        }
        if x.sign() == offset.sign() && x.bit_width() == offset.bit_width() {
            self.integer.int_assign_var(x, &offset);
        } else {
            self.integer.int_apply_unary(
                IntUnaryOp::Cast(x.bit_width(), x.sign()),
                x,
                &offset,
            );
        }
    }

    fn pointer_offset_to_interval(&self, p: &V) -> IntInterval {
        self.integer.int_to_interval(&p.offset_var())
    }

    fn pointer_to_points_to(&self, p: &V) -> PointsToSet<M> {
        if self.is_bottom() {
            return PointsToSet::Bottom;
        }
        self.points_to.get(p)
    }

    fn pointer_to_value(&self, p: &V) -> PointerAbsValue<M> {
        PointerAbsValue::new(
            self.uninitialized.get(p),
            self.nullity.get(p),
            self.pointer_to_points_to(p),
            self.pointer_offset_to_interval(p),
        )
    }

    fn pointer_forget_offset(&mut self, p: &V) {
        self.integer.int_forget(&p.offset_var());
    }

    fn pointer_forget(&mut self, p: &V) {
        self.uninitialized.forget(p);
        self.nullity.forget(p);
        self.points_to.forget(p);
        self.integer.int_forget(&p.offset_var());
    }

    fn dynamic_assign(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
        self.nullity.assign_var(x.clone(), y);
        let addrs = self.points_to.get(y);
        self.points_to.set(x.clone(), addrs);
        self.integer.int_assign_var(x, y);
        self.integer
            .int_assign_var(&x.offset_var(), &y.offset_var());
    }

    fn dynamic_write_undef(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_uninitialized(x.clone());
        self.nullity.forget(x);
        self.points_to.set(x.clone(), PointsToSet::empty());
        self.integer.int_forget(x);
        self.integer.int_forget(&x.offset_var());
    }

    fn dynamic_write_nondet(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.nullity.forget(x);
        self.points_to.forget(x);
        self.integer.int_forget(x);
        self.integer.int_forget(&x.offset_var());
    }

    fn dynamic_write_int(&mut self, x: &V, n: &MachineInt) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_assign(x, n);
        // Integer zero doubles as the null pointer under the implicit
        // int-to-pointer reduction.
        if n.is_zero() {
            self.nullity.assign_null(x.clone());
        } else {
            self.nullity.assign_non_null(x.clone());
        }
        self.points_to.set(x.clone(), PointsToSet::empty());
    }

    fn dynamic_write_nondet_int(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_forget(x);
        self.nullity.forget(x);
        self.points_to.set(x.clone(), PointsToSet::empty());
    }

    fn dynamic_write_int_var(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
        // Cells and registers may disagree on width or signedness; the
        // store is a bitcast.
        if x.bit_width() == y.bit_width() && x.sign() == y.sign() {
            self.integer.int_assign_var(x, y);
        } else {
            self.integer
                .int_apply_unary(IntUnaryOp::Cast(x.bit_width(), x.sign()), x, y);
        }
        self.nullity.forget(x);
        self.points_to.set(x.clone(), PointsToSet::empty());
    }

    fn dynamic_write_float_var(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
        self.integer.int_forget(x);
        self.nullity.forget(x);
        self.points_to.set(x.clone(), PointsToSet::empty());
    }

    fn dynamic_write_nondet_float(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.integer.int_forget(x);
        self.nullity.forget(x);
        self.points_to.set(x.clone(), PointsToSet::empty());
    }

    fn dynamic_write_null(&mut self, x: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        let zero = MachineInt::zero(x.bit_width(), x.sign());
        self.integer.int_assign(x, &zero);
        self.nullity.assign_null(x.clone());
        self.points_to.set(x.clone(), PointsToSet::empty());
        self.zero_offset(x);
    }

    fn dynamic_write_pointer(&mut self, x: &V, addr: &M, nullity: Nullity) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        self.nullity.set(x.clone(), nullity);
        self.points_to
            .set(x.clone(), PointsToSet::singleton(addr.clone()));
        self.integer.int_forget(x);
        self.zero_offset(x);
    }

    fn dynamic_write_pointer_var(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assign_var(x.clone(), y);
        self.nullity.assign_var(x.clone(), y);
        let addrs = self.points_to.get(y);
        self.points_to.set(x.clone(), addrs);
        self.integer.int_forget(x);
        self.integer
            .int_assign_var(&x.offset_var(), &y.offset_var());
    }

    fn dynamic_read_int(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(y);
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        if self.nullity.is_null(y) {
            // Null read as an integer is zero.
            let zero = MachineInt::zero(x.bit_width(), x.sign());
            self.integer.int_assign(x, &zero);
        } else if x.bit_width() == y.bit_width() && x.sign() == y.sign() {
            self.integer.int_assign_var(x, y);
        } else {
            self.integer
                .int_apply_unary(IntUnaryOp::Cast(x.bit_width(), x.sign()), x, y);
        }
    }

    fn dynamic_read_pointer(&mut self, x: &V, y: &V) {
        if self.is_bottom_fast() {
            return;
        }
        self.uninitialized.assert_initialized(y);
        if !self.check_uninit() {
            return;
        }
        self.uninitialized.assign_initialized(x.clone());
        // An integer zero stored in the register reads as null.
        let value = self.integer.int_to_interval(y);
        let nullity = if let Some(n) = value.singleton() {
            if n.is_zero() {
                Nullity::Null
            } else {
                self.nullity.get(y)
            }
        } else {
            self.nullity.get(y)
        };
        self.nullity.set(x.clone(), nullity);
        let addrs = self.points_to.get(y);
        self.points_to.set(x.clone(), addrs);
        self.integer
            .int_assign_var(&x.offset_var(), &y.offset_var());
    }

    fn dynamic_forget(&mut self, x: &V) {
        self.uninitialized.forget(x);
        self.nullity.forget(x);
        self.points_to.forget(x);
        self.integer.int_forget(x);
        self.integer.int_forget(&x.offset_var());
    }

    fn scalar_assign_undef(&mut self, x: &V) {
        match x.kind() {
            crate::var::VariableKind::Int { .. } => self.int_assign_undef(x),
            crate::var::VariableKind::Float => self.float_assign_undef(x),
            crate::var::VariableKind::Pointer => self.pointer_assign_undef(x),
            crate::var::VariableKind::Dynamic { .. } => self.dynamic_write_undef(x),
        }
    }

    fn scalar_assign_nondet(&mut self, x: &V) {
        match x.kind() {
            crate::var::VariableKind::Int { .. } => self.int_assign_nondet(x),
            crate::var::VariableKind::Float => self.float_assign_nondet(x),
            crate::var::VariableKind::Pointer => self.pointer_assign_nondet(x),
            crate::var::VariableKind::Dynamic { .. } => self.dynamic_write_nondet(x),
        }
    }

    fn scalar_forget(&mut self, x: &V) {
        match x.kind() {
            crate::var::VariableKind::Int { .. } => self.int_forget(x),
            crate::var::VariableKind::Float => self.float_forget(x),
            crate::var::VariableKind::Pointer => self.pointer_forget(x),
            crate::var::VariableKind::Dynamic { .. } => self.dynamic_forget(x),
        }
    }
}

impl<V, M, D> fmt::Display for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V> + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        write!(
            f,
            "(int: {}, uninit: {}, nullity: {}, points-to: {})",
            self.integer, self.uninitialized, self.nullity, self.points_to
        )
    }
}

impl<V, M, D> fmt::Debug for CompositeDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MachineIntDomain<V> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        f.debug_struct("CompositeDomain")
            .field("integer", &self.integer)
            .field("uninitialized", &self.uninitialized)
            .field("nullity", &self.nullity)
            .field("points_to", &self.points_to)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::{Context, MemLoc, Var};
    use crate::machine::WrapDomain;
    use crate::num::IntervalDomain;
    use argus_num::Interval;

    type Scalar = CompositeDomain<Var, MemLoc, WrapDomain<Var, IntervalDomain<Var>>>;

    fn mi32(n: i64) -> MachineInt {
        MachineInt::new(n, 32, Sign::Signed)
    }

    #[test]
    fn read_of_uninitialized_is_bottom() {
        let ctx = Context::new();
        let x = ctx.int_var("x", 32, Sign::Signed);
        let y = ctx.int_var("y", 32, Sign::Signed);
        let mut s = Scalar::top();
        s.int_assign_undef(&x);
        s.int_apply(
            IntBinaryOp::Add,
            &y,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi32(1)),
        );
        assert!(s.is_bottom());
    }

    #[test]
    fn masking_reads_are_exempt() {
        let ctx = Context::new();
        let x = ctx.int_var("x", 32, Sign::Signed);
        let y = ctx.int_var("y", 32, Sign::Signed);
        let mut s = Scalar::top();
        s.int_assign_undef(&x);
        s.int_apply(
            IntBinaryOp::And,
            &y,
            &IntOperand::Var(x.clone()),
            &IntOperand::Const(mi32(0xff)),
        );
        assert!(!s.is_bottom());
        assert!(s.uninit_is_initialized(&y));
    }

    #[test]
    fn pointer_assign_and_query() {
        let ctx = Context::new();
        let p = ctx.ptr_var("p");
        let m = ctx.mem("m");
        let mut s = Scalar::top();
        s.pointer_assign_address(&p, &m, Nullity::NonNull);
        assert!(s.nullity_is_non_null(&p));
        assert_eq!(s.pointer_to_points_to(&p), PointsToSet::singleton(m));
        assert_eq!(
            s.pointer_offset_to_interval(&p).to_interval(),
            &Interval::new(0, 0)
        );
    }

    #[test]
    fn pointer_equality_meets_addresses() {
        let ctx = Context::new();
        let p = ctx.ptr_var("p1");
        let q = ctx.ptr_var("q1");
        let m = ctx.mem("m1");
        let n = ctx.mem("n1");
        let mut s = Scalar::top();
        s.pointer_assign_address(&p, &m, Nullity::NonNull);
        s.pointer_assign_address(&q, &n, Nullity::NonNull);
        // Disjoint singletons cannot be equal.
        s.pointer_add(IntPredicate::Eq, &p, &q);
        assert!(s.is_bottom());
    }

    #[test]
    fn dynamic_null_reads_as_zero() {
        let ctx = Context::new();
        let d = ctx.dyn_var("d", 32, Sign::Signed);
        let x = ctx.int_var("xi", 32, Sign::Signed);
        let mut s = Scalar::top();
        s.dynamic_write_null(&d);
        s.dynamic_read_int(&x, &d);
        assert_eq!(s.int_to_interval(&x).singleton(), Some(mi32(0)));
    }

    #[test]
    fn dynamic_zero_reads_as_null() {
        let ctx = Context::new();
        let d = ctx.dyn_var("d2", 64, Sign::Unsigned);
        let p = ctx.ptr_var("p2");
        let mut s = Scalar::top();
        s.dynamic_write_int(&d, &MachineInt::zero(64, Sign::Unsigned));
        s.dynamic_read_pointer(&p, &d);
        assert!(s.nullity_is_null(&p));
    }
}
