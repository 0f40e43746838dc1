//! Scalar abstract domain: machine integers, floats, pointers and untyped
//! registers under one interface.

mod composite;

pub use composite::CompositeDomain;

use argus_num::machine::IntInterval;
use argus_num::MachineInt;

use crate::linear::LinearExpression;
use crate::machine::{IntPredicate, MachineIntDomain};
use crate::nullity::Nullity;
use crate::pointer::{PointerAbsValue, PointsToSet};
use crate::uninit::Uninitialized;
use crate::var::{MemoryLocation, ScalarVariable};

/// Interface of the scalar layer.
///
/// Extends the machine-integer interface with initialization, floats,
/// nullity, points-to and untyped (dynamic) registers. Every operation
/// routes to the relevant sub-domains based on the variable's static kind;
/// reads assert initialization, and a definitely-uninitialized read makes
/// the state bottom.
pub trait ScalarDomain<V: ScalarVariable, M: MemoryLocation>: MachineIntDomain<V> {
    // Initialization

    /// Assert that `x` is initialized before a read.
    fn uninit_assert_initialized(&mut self, x: &V);

    fn uninit_is_initialized(&self, x: &V) -> bool;

    fn uninit_is_uninitialized(&self, x: &V) -> bool;

    fn uninit_refine(&mut self, x: &V, value: Uninitialized);

    fn uninit_to_uninitialized(&self, x: &V) -> Uninitialized;

    /// `x := undef` for an integer variable.
    fn int_assign_undef(&mut self, x: &V);

    // Floats: the value itself is top, only initialization is tracked.

    fn float_assign_undef(&mut self, x: &V);

    fn float_assign_nondet(&mut self, x: &V);

    fn float_assign(&mut self, x: &V, y: &V);

    fn float_forget(&mut self, x: &V);

    // Nullity

    fn nullity_assert_null(&mut self, p: &V);

    fn nullity_assert_non_null(&mut self, p: &V);

    fn nullity_is_null(&self, p: &V) -> bool;

    fn nullity_is_non_null(&self, p: &V) -> bool;

    fn nullity_set(&mut self, p: &V, value: Nullity);

    fn nullity_refine(&mut self, p: &V, value: Nullity);

    fn nullity_to_nullity(&self, p: &V) -> Nullity;

    // Pointers

    /// `p := &addr`, with the given nullity and offset zero.
    fn pointer_assign_address(&mut self, p: &V, addr: &M, nullity: Nullity);

    fn pointer_assign_null(&mut self, p: &V);

    fn pointer_assign_undef(&mut self, p: &V);

    fn pointer_assign_nondet(&mut self, p: &V);

    /// `p := q`.
    fn pointer_assign_var(&mut self, p: &V, q: &V);

    /// `p := q + o` where `o` is a linear expression over machine-int
    /// variables.
    fn pointer_assign_offset(&mut self, p: &V, q: &V, o: &LinearExpression<V>);

    /// Assume `p pred q` on two pointers.
    fn pointer_add(&mut self, pred: IntPredicate, p: &V, q: &V);

    fn pointer_refine_points_to(&mut self, p: &V, addrs: &PointsToSet<M>);

    fn pointer_refine(&mut self, p: &V, value: &PointerAbsValue<M>);

    /// `x := offset(p)` as an integer.
    fn pointer_offset_to_int(&mut self, x: &V, p: &V);

    fn pointer_offset_to_interval(&self, p: &V) -> IntInterval;

    fn pointer_to_points_to(&self, p: &V) -> PointsToSet<M>;

    fn pointer_to_value(&self, p: &V) -> PointerAbsValue<M>;

    fn pointer_forget_offset(&mut self, p: &V);

    fn pointer_forget(&mut self, p: &V);

    // Dynamic (untyped) registers: hold either an integer or a pointer.

    fn dynamic_assign(&mut self, x: &V, y: &V);

    fn dynamic_write_undef(&mut self, x: &V);

    fn dynamic_write_nondet(&mut self, x: &V);

    fn dynamic_write_int(&mut self, x: &V, n: &MachineInt);

    fn dynamic_write_nondet_int(&mut self, x: &V);

    fn dynamic_write_int_var(&mut self, x: &V, y: &V);

    fn dynamic_write_nondet_float(&mut self, x: &V);

    fn dynamic_write_float_var(&mut self, x: &V, y: &V);

    fn dynamic_write_null(&mut self, x: &V);

    fn dynamic_write_pointer(&mut self, x: &V, addr: &M, nullity: Nullity);

    fn dynamic_write_pointer_var(&mut self, x: &V, y: &V);

    /// `x := (int) y`; a null-only dynamic value reads as zero.
    fn dynamic_read_int(&mut self, x: &V, y: &V);

    /// `x := (ptr) y`; a zero integer reads as the null pointer.
    fn dynamic_read_pointer(&mut self, x: &V, y: &V);

    fn dynamic_forget(&mut self, x: &V);

    // Kind-dispatched entry points

    fn scalar_assign_undef(&mut self, x: &V);

    fn scalar_assign_nondet(&mut self, x: &V);

    fn scalar_forget(&mut self, x: &V);
}
