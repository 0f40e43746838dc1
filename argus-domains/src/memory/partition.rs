//! Value-partitioning memory domain combinator.

use core::fmt;
use core::marker::PhantomData;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{Int, MachineInt, Sign};
use smallvec::{smallvec, SmallVec};

use crate::lattice::AbstractDomain;
use crate::lifetime::Lifetime;
use crate::linear::LinearExpression;
use crate::literal::Literal;
use crate::machine::{IntBinaryOp, IntOperand, IntPredicate, IntUnaryOp, MachineIntDomain};
use crate::nullity::Nullity;
use crate::pointer::{PointerAbsValue, PointsToSet};
use crate::scalar::ScalarDomain;
use crate::uninit::Uninitialized;
use crate::var::{MemoryLocation, ScalarVariable};

use super::MemoryDomain;

/// One disjunct: a memory state guarded by an interval of the pivot.
#[derive(Clone)]
struct Partition<D> {
    interval: IntInterval,
    memory: D,
}

/// Finite disjunction of memory states, indexed by the value of one pivot
/// integer variable.
///
/// Invariants:
///
/// * there is always at least one partition;
/// * partition intervals are non-empty, pairwise disjoint and ordered;
/// * without a pivot there is exactly one partition with a top interval;
/// * with a pivot, each partition's memory constrains the pivot within
///   the partition interval;
/// * after normalization at most one partition may be bottom, and only if
///   it is the only one.
pub struct PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    variable: Option<V>,
    partitions: SmallVec<[Partition<D>; 1]>,
    _vars: PhantomData<fn() -> (V, M)>,
}

impl<V, M, D> Clone for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    fn clone(&self) -> Self {
        Self {
            variable: self.variable.clone(),
            partitions: self.partitions.clone(),
            _vars: PhantomData,
        }
    }
}

fn top_interval() -> IntInterval {
    IntInterval::top(1, Sign::Signed)
}

impl<V, M, D> PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    /// Lift a memory state into a single-partition disjunction.
    pub fn new(memory: D) -> Self {
        Self {
            variable: None,
            partitions: smallvec![Partition {
                interval: top_interval(),
                memory,
            }],
            _vars: PhantomData,
        }
    }

    fn for_each(&mut self, mut f: impl FnMut(&mut D)) {
        for partition in &mut self.partitions {
            f(&mut partition.memory);
        }
    }

    /// Apply an operation that may move the pivot variable.
    fn for_each_pivot(&mut self, touched: &V, f: impl FnMut(&mut D)) {
        self.for_each(f);
        if self.variable.as_ref() == Some(touched) {
            self.update_partitions();
        }
    }

    /// Query accessor folding over all partitions.
    fn fold_query<T>(&self, f: impl Fn(&D) -> T, join: impl Fn(T, T) -> T) -> T {
        let mut it = self.partitions.iter();
        let first = f(&it.next().expect("at least one partition").memory);
        it.fold(first, |acc, p| join(acc, f(&p.memory)))
    }

    /// Collapse all partitions into one.
    fn join_partitions(&self) -> Partition<D> {
        let mut it = self.partitions.iter();
        let first = it.next().expect("at least one partition");
        let mut merged = first.clone();
        for p in it {
            merged.interval = merged.interval.join(&p.interval);
            merged.memory = merged.memory.join(&p.memory);
        }
        merged
    }

    /// Re-establish the invariants after the pivot may have moved:
    /// recompute each partition's interval, drop infeasible partitions,
    /// sort by lower bound and merge overlapping neighbors.
    fn update_partitions(&mut self) {
        let Some(v) = self.variable.clone() else {
            return;
        };
        let mut updated: Vec<Partition<D>> = Vec::with_capacity(self.partitions.len());
        for p in self.partitions.drain(..) {
            let mut memory = p.memory;
            memory.normalize();
            let interval = memory.int_to_interval(&v);
            if interval.is_bottom() {
                continue;
            }
            updated.push(Partition { interval, memory });
        }
        if updated.is_empty() {
            // Keep a single infeasible partition rather than none.
            let mut memory = D::bottom();
            memory.normalize();
            self.partitions = smallvec![Partition {
                interval: top_interval(),
                memory,
            }];
            return;
        }
        updated.sort_by(|a, b| a.interval.to_interval().lb().cmp(b.interval.to_interval().lb()));
        let mut merged: Vec<Partition<D>> = Vec::with_capacity(updated.len());
        for p in updated {
            match merged.last_mut() {
                Some(last)
                    if !last
                        .interval
                        .to_interval()
                        .meet(p.interval.to_interval())
                        .is_bottom()
                        || touches(&last.interval, &p.interval) =>
                {
                    last.interval = last.interval.join(&p.interval);
                    last.memory = last.memory.join(&p.memory);
                }
                _ => merged.push(p),
            }
        }
        self.partitions = merged.into();
    }

    fn is_same_partitioning(&self, other: &Self) -> bool {
        self.variable == other.variable
            && self.partitions.len() == other.partitions.len()
            && self
                .partitions
                .iter()
                .zip(other.partitions.iter())
                .all(|(a, b)| a.interval == b.interval)
    }

    /// The memory state of the partition containing `value`, if any.
    pub fn partition_at(&self, value: &MachineInt) -> Option<&D> {
        self.partitions
            .iter()
            .find(|p| p.interval.contains(value))
            .map(|p| &p.memory)
    }

    /// Number of live partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

/// Adjacent intervals: `[.., a] [a+1, ..]`.
fn touches(left: &IntInterval, right: &IntInterval) -> bool {
    match (left.to_interval().ub().number(), right.to_interval().lb().number()) {
        (Some(ub), Some(lb)) => &(ub + &Int::one()) >= lb,
        _ => false,
    }
}

impl<V, M, D> AbstractDomain for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    fn bottom() -> Self {
        Self::new(D::bottom())
    }

    fn top() -> Self {
        Self::new(D::top())
    }

    fn is_bottom(&self) -> bool {
        self.partitions.iter().all(|p| p.memory.is_bottom())
    }

    fn is_top(&self) -> bool {
        self.partitions.iter().all(|p| p.memory.is_top())
    }

    fn set_to_bottom(&mut self) {
        self.variable = None;
        self.partitions = smallvec![Partition {
            interval: top_interval(),
            memory: D::bottom(),
        }];
    }

    fn set_to_top(&mut self) {
        self.variable = None;
        self.partitions = smallvec![Partition {
            interval: top_interval(),
            memory: D::top(),
        }];
    }

    fn leq(&self, other: &Self) -> bool {
        if self.variable != other.variable {
            return self
                .join_partitions()
                .memory
                .leq(&other.join_partitions().memory);
        }
        let mut other_slice: &[Partition<D>] = &other.partitions;
        for p in &self.partitions {
            // Skip partitions of `other` entirely to the left of `p`.
            while let Some(first) = other_slice.first() {
                if first.interval.to_interval().ub() < p.interval.to_interval().lb() {
                    other_slice = &other_slice[1..];
                } else {
                    break;
                }
            }
            match other_slice.first() {
                None => {
                    if !p.memory.is_bottom() {
                        return false;
                    }
                }
                Some(first) if p.interval.to_interval().ub() < first.interval.to_interval().lb() => {
                    // No matching partition on the right.
                    if !p.memory.is_bottom() {
                        return false;
                    }
                }
                Some(first) if p.interval.to_interval().ub() <= first.interval.to_interval().ub() => {
                    if !p.memory.leq(&first.memory) {
                        return false;
                    }
                }
                Some(first) => {
                    // `p` spans several partitions of `other`.
                    let mut merged = first.memory.clone();
                    for q in &other_slice[1..] {
                        if p.interval.to_interval().ub() < q.interval.to_interval().lb() {
                            break;
                        }
                        merged = merged.join(&q.memory);
                    }
                    if !p.memory.leq(&merged) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn equals(&self, other: &Self) -> bool {
        if self.variable != other.variable {
            self.join_partitions()
                .memory
                .equals(&other.join_partitions().memory)
        } else {
            self.leq(other) && other.leq(self)
        }
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        if self.variable != other.variable {
            let mut result = self.clone();
            result.partitioning_disable();
            let merged = other.join_partitions();
            result.partitions[0].memory = result.partitions[0].memory.join(&merged.memory);
            return result;
        }
        // Same pivot: merge the two ordered interval lists, joining
        // overlapping partitions.
        let mut result = self.clone();
        for q in &other.partitions {
            let mut i = 0;
            let mut merged_in = false;
            while i < result.partitions.len() {
                let p = &mut result.partitions[i];
                if p.interval.to_interval().ub() < q.interval.to_interval().lb() {
                    i += 1;
                    continue;
                }
                if q.interval.to_interval().ub() < p.interval.to_interval().lb() {
                    result.partitions.insert(
                        i,
                        Partition {
                            interval: q.interval.clone(),
                            memory: q.memory.clone(),
                        },
                    );
                    merged_in = true;
                    break;
                }
                // Overlap: grow the existing partition, then absorb any
                // following partitions the widened interval now reaches.
                p.interval = p.interval.join(&q.interval);
                p.memory = p.memory.join(&q.memory);
                while i + 1 < result.partitions.len()
                    && result.partitions[i].interval.to_interval().ub()
                        >= result.partitions[i + 1].interval.to_interval().lb()
                {
                    let next = result.partitions.remove(i + 1);
                    let p = &mut result.partitions[i];
                    p.interval = p.interval.join(&next.interval);
                    p.memory = p.memory.join(&next.memory);
                }
                merged_in = true;
                break;
            }
            if !merged_in {
                result.partitions.push(Partition {
                    interval: q.interval.clone(),
                    memory: q.memory.clone(),
                });
            }
        }
        result
    }

    fn widening(&self, other: &Self) -> Self {
        self.pointwise_or_collapsed(other, |a, b| a.widening(b))
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        self.pointwise_or_collapsed(other, |a, b| a.widening_threshold(b, threshold))
    }

    fn meet(&self, other: &Self) -> Self {
        self.pointwise_or_collapsed(other, |a, b| a.meet(b))
    }

    fn narrowing(&self, other: &Self) -> Self {
        self.pointwise_or_collapsed(other, |a, b| a.narrowing(b))
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        self.pointwise_or_collapsed(other, |a, b| a.narrowing_threshold(b, threshold))
    }

    fn normalize(&mut self) {
        // Remove infeasible partitions; always keep one.
        let mut kept: Vec<Partition<D>> = Vec::with_capacity(self.partitions.len());
        for p in self.partitions.drain(..) {
            let mut p = p;
            p.memory.normalize();
            if !p.memory.is_bottom() {
                kept.push(p);
            }
        }
        if kept.is_empty() {
            self.set_to_bottom();
        } else {
            self.partitions = kept.into();
        }
    }
}

impl<V, M, D> PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    /// Binary lattice operations other than join: pointwise when both
    /// sides have the same partitioning, on collapsed states otherwise.
    fn pointwise_or_collapsed(&self, other: &Self, op: impl Fn(&D, &D) -> D) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        if self.is_same_partitioning(other) {
            let mut result = self.clone();
            for (p, q) in result.partitions.iter_mut().zip(other.partitions.iter()) {
                p.memory = op(&p.memory, &q.memory);
            }
            return result;
        }
        let left = self.join_partitions();
        let right = other.join_partitions();
        Self {
            variable: None,
            partitions: smallvec![Partition {
                interval: top_interval(),
                memory: op(&left.memory, &right.memory),
            }],
            _vars: PhantomData,
        }
    }
}

impl<V, M, D> fmt::Display for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M> + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variable {
            None => self.partitions[0].memory.fmt(f),
            Some(v) => {
                for (i, p) in self.partitions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " \\/ ")?;
                    }
                    write!(f, "({v} in {} => {})", p.interval, p.memory)?;
                }
                Ok(())
            }
        }
    }
}

impl<V, M, D> fmt::Debug for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitioningDomain")
            .field("variable", &self.variable)
            .field("partitions", &self.partitions.len())
            .finish()
    }
}

// Every statement-level operation is dispatched to all partitions. An
// operation that may move the pivot variable is followed by
// update_partitions, which re-sorts, re-merges and prunes the disjuncts.
impl<V, M, D> MachineIntDomain<V> for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    fn int_assign(&mut self, x: &V, n: &MachineInt) {
        self.for_each_pivot(x, |m| m.int_assign(x, n));
    }

    fn int_assign_var(&mut self, x: &V, y: &V) {
        self.for_each_pivot(x, |m| m.int_assign_var(x, y));
    }

    fn int_assign_expr(&mut self, x: &V, e: &LinearExpression<V>) {
        self.for_each_pivot(x, |m| m.int_assign_expr(x, e));
    }

    fn int_assign_nondet(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.int_assign_nondet(x));
    }

    fn int_apply_unary(&mut self, op: IntUnaryOp, x: &V, y: &V) {
        self.for_each_pivot(x, |m| m.int_apply_unary(op, x, y));
    }

    fn int_apply(&mut self, op: IntBinaryOp, x: &V, y: &IntOperand<V>, z: &IntOperand<V>) {
        self.for_each_pivot(x, |m| m.int_apply(op, x, y, z));
    }

    fn int_add(&mut self, pred: IntPredicate, x: &IntOperand<V>, y: &IntOperand<V>) {
        self.for_each(|m| m.int_add(pred, x, y));
        let pivot_touched = [x, y].iter().any(|o| match o {
            IntOperand::Var(v) => self.variable.as_ref() == Some(v),
            IntOperand::Const(_) => false,
        });
        if pivot_touched {
            self.update_partitions();
        }
    }

    fn int_set(&mut self, x: &V, value: &IntIntervalCongruence) {
        self.for_each_pivot(x, |m| m.int_set(x, value));
    }

    fn int_refine(&mut self, x: &V, value: &IntIntervalCongruence) {
        self.for_each_pivot(x, |m| m.int_refine(x, value));
    }

    fn int_forget(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.int_forget(x));
    }

    fn int_to_interval(&self, x: &V) -> IntInterval {
        self.fold_query(|m| m.int_to_interval(x), |a, b| a.join(&b))
    }

    fn int_to_congruence(&self, x: &V) -> IntCongruence {
        self.fold_query(|m| m.int_to_congruence(x), |a, b| a.join(&b))
    }

    fn int_to_interval_expr(
        &self,
        e: &LinearExpression<V>,
        width: u32,
        sign: Sign,
    ) -> IntInterval {
        self.fold_query(|m| m.int_to_interval_expr(e, width, sign), |a, b| a.join(&b))
    }

    fn counter_mark(&mut self, x: &V) {
        self.for_each(|m| m.counter_mark(x));
    }

    fn counter_unmark(&mut self, x: &V) {
        self.for_each(|m| m.counter_unmark(x));
    }

    fn counter_init(&mut self, x: &V, c: &MachineInt) {
        self.for_each_pivot(x, |m| m.counter_init(x, c));
    }

    fn counter_incr(&mut self, x: &V, k: &MachineInt) {
        self.for_each_pivot(x, |m| m.counter_incr(x, k));
    }

    fn counter_forget(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.counter_forget(x));
    }
}

impl<V, M, D> ScalarDomain<V, M> for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    fn uninit_assert_initialized(&mut self, x: &V) {
        self.for_each(|m| m.uninit_assert_initialized(x));
    }

    fn uninit_is_initialized(&self, x: &V) -> bool {
        self.partitions.iter().all(|p| p.memory.uninit_is_initialized(x))
    }

    fn uninit_is_uninitialized(&self, x: &V) -> bool {
        self.partitions
            .iter()
            .all(|p| p.memory.uninit_is_uninitialized(x))
    }

    fn uninit_refine(&mut self, x: &V, value: Uninitialized) {
        self.for_each(|m| m.uninit_refine(x, value));
    }

    fn uninit_to_uninitialized(&self, x: &V) -> Uninitialized {
        use crate::separate::LatticeValue;
        self.fold_query(|m| m.uninit_to_uninitialized(x), |a, b| a.join(&b))
    }

    fn int_assign_undef(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.int_assign_undef(x));
    }

    fn float_assign_undef(&mut self, x: &V) {
        self.for_each(|m| m.float_assign_undef(x));
    }

    fn float_assign_nondet(&mut self, x: &V) {
        self.for_each(|m| m.float_assign_nondet(x));
    }

    fn float_assign(&mut self, x: &V, y: &V) {
        self.for_each(|m| m.float_assign(x, y));
    }

    fn float_forget(&mut self, x: &V) {
        self.for_each(|m| m.float_forget(x));
    }

    fn nullity_assert_null(&mut self, p: &V) {
        self.for_each(|m| m.nullity_assert_null(p));
    }

    fn nullity_assert_non_null(&mut self, p: &V) {
        self.for_each(|m| m.nullity_assert_non_null(p));
    }

    fn nullity_is_null(&self, p: &V) -> bool {
        self.partitions.iter().all(|q| q.memory.nullity_is_null(p))
    }

    fn nullity_is_non_null(&self, p: &V) -> bool {
        self.partitions
            .iter()
            .all(|q| q.memory.nullity_is_non_null(p))
    }

    fn nullity_set(&mut self, p: &V, value: Nullity) {
        self.for_each(|m| m.nullity_set(p, value));
    }

    fn nullity_refine(&mut self, p: &V, value: Nullity) {
        self.for_each(|m| m.nullity_refine(p, value));
    }

    fn nullity_to_nullity(&self, p: &V) -> Nullity {
        use crate::separate::LatticeValue;
        self.fold_query(|m| m.nullity_to_nullity(p), |a, b| a.join(&b))
    }

    fn pointer_assign_address(&mut self, p: &V, addr: &M, nullity: Nullity) {
        self.for_each(|m| m.pointer_assign_address(p, addr, nullity));
    }

    fn pointer_assign_null(&mut self, p: &V) {
        self.for_each(|m| m.pointer_assign_null(p));
    }

    fn pointer_assign_undef(&mut self, p: &V) {
        self.for_each(|m| m.pointer_assign_undef(p));
    }

    fn pointer_assign_nondet(&mut self, p: &V) {
        self.for_each(|m| m.pointer_assign_nondet(p));
    }

    fn pointer_assign_var(&mut self, p: &V, q: &V) {
        self.for_each(|m| m.pointer_assign_var(p, q));
    }

    fn pointer_assign_offset(&mut self, p: &V, q: &V, o: &LinearExpression<V>) {
        self.for_each(|m| m.pointer_assign_offset(p, q, o));
    }

    fn pointer_add(&mut self, pred: IntPredicate, p: &V, q: &V) {
        self.for_each(|m| m.pointer_add(pred, p, q));
    }

    fn pointer_refine_points_to(&mut self, p: &V, addrs: &PointsToSet<M>) {
        self.for_each(|m| m.pointer_refine_points_to(p, addrs));
    }

    fn pointer_refine(&mut self, p: &V, value: &PointerAbsValue<M>) {
        self.for_each(|m| m.pointer_refine(p, value));
    }

    fn pointer_offset_to_int(&mut self, x: &V, p: &V) {
        self.for_each_pivot(x, |m| m.pointer_offset_to_int(x, p));
    }

    fn pointer_offset_to_interval(&self, p: &V) -> IntInterval {
        self.fold_query(|m| m.pointer_offset_to_interval(p), |a, b| a.join(&b))
    }

    fn pointer_to_points_to(&self, p: &V) -> PointsToSet<M> {
        use crate::separate::LatticeValue;
        self.fold_query(|m| m.pointer_to_points_to(p), |a, b| a.join(&b))
    }

    fn pointer_to_value(&self, p: &V) -> PointerAbsValue<M> {
        self.fold_query(|m| m.pointer_to_value(p), |a, b| a.join(&b))
    }

    fn pointer_forget_offset(&mut self, p: &V) {
        self.for_each(|m| m.pointer_forget_offset(p));
    }

    fn pointer_forget(&mut self, p: &V) {
        self.for_each(|m| m.pointer_forget(p));
    }

    fn dynamic_assign(&mut self, x: &V, y: &V) {
        self.for_each_pivot(x, |m| m.dynamic_assign(x, y));
    }

    fn dynamic_write_undef(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.dynamic_write_undef(x));
    }

    fn dynamic_write_nondet(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.dynamic_write_nondet(x));
    }

    fn dynamic_write_int(&mut self, x: &V, n: &MachineInt) {
        self.for_each_pivot(x, |m| m.dynamic_write_int(x, n));
    }

    fn dynamic_write_nondet_int(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.dynamic_write_nondet_int(x));
    }

    fn dynamic_write_int_var(&mut self, x: &V, y: &V) {
        self.for_each_pivot(x, |m| m.dynamic_write_int_var(x, y));
    }

    fn dynamic_write_nondet_float(&mut self, x: &V) {
        self.for_each(|m| m.dynamic_write_nondet_float(x));
    }

    fn dynamic_write_float_var(&mut self, x: &V, y: &V) {
        self.for_each(|m| m.dynamic_write_float_var(x, y));
    }

    fn dynamic_write_null(&mut self, x: &V) {
        self.for_each(|m| m.dynamic_write_null(x));
    }

    fn dynamic_write_pointer(&mut self, x: &V, addr: &M, nullity: Nullity) {
        self.for_each(|m| m.dynamic_write_pointer(x, addr, nullity));
    }

    fn dynamic_write_pointer_var(&mut self, x: &V, y: &V) {
        self.for_each(|m| m.dynamic_write_pointer_var(x, y));
    }

    fn dynamic_read_int(&mut self, x: &V, y: &V) {
        self.for_each_pivot(x, |m| m.dynamic_read_int(x, y));
    }

    fn dynamic_read_pointer(&mut self, x: &V, y: &V) {
        self.for_each(|m| m.dynamic_read_pointer(x, y));
    }

    fn dynamic_forget(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.dynamic_forget(x));
    }

    fn scalar_assign_undef(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.scalar_assign_undef(x));
    }

    fn scalar_assign_nondet(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.scalar_assign_nondet(x));
    }

    fn scalar_forget(&mut self, x: &V) {
        self.for_each_pivot(x, |m| m.scalar_forget(x));
    }
}

impl<V, M, D> MemoryDomain<V, M> for PartitioningDomain<V, M, D>
where
    V: ScalarVariable,
    M: MemoryLocation,
    D: MemoryDomain<V, M>,
{
    fn mem_write(&mut self, p: &V, v: &Literal<V>, size: &MachineInt) {
        self.for_each(|m| m.mem_write(p, v, size));
    }

    fn mem_read(&mut self, x: &Literal<V>, p: &V, size: &MachineInt) {
        self.for_each(|m| m.mem_read(x, p, size));
        if let Some(v) = x.var() {
            if self.variable.as_ref() == Some(v) {
                self.update_partitions();
            }
        }
    }

    fn mem_copy(&mut self, dest: &V, src: &V, size: &Literal<V>) {
        self.for_each(|m| m.mem_copy(dest, src, size));
    }

    fn mem_set(&mut self, dest: &V, value: &Literal<V>, size: &Literal<V>) {
        self.for_each(|m| m.mem_set(dest, value, size));
    }

    fn mem_forget_all(&mut self) {
        self.for_each(|m| m.mem_forget_all());
    }

    fn mem_forget(&mut self, addr: &M) {
        self.for_each(|m| m.mem_forget(addr));
    }

    fn mem_forget_range(&mut self, addr: &M, offset: &IntInterval, size: &MachineInt) {
        self.for_each(|m| m.mem_forget_range(addr, offset, size));
    }

    fn mem_forget_reachable(&mut self, p: &V) {
        self.for_each(|m| m.mem_forget_reachable(p));
    }

    fn mem_forget_reachable_size(&mut self, p: &V, size: &MachineInt) {
        self.for_each(|m| m.mem_forget_reachable_size(p, size));
    }

    fn mem_abstract_reachable(&mut self, p: &V) {
        self.for_each(|m| m.mem_abstract_reachable(p));
    }

    fn mem_abstract_reachable_size(&mut self, p: &V, size: &MachineInt) {
        self.for_each(|m| m.mem_abstract_reachable_size(p, size));
    }

    fn mem_zero_reachable(&mut self, p: &V) {
        self.for_each(|m| m.mem_zero_reachable(p));
    }

    fn mem_uninitialize_reachable(&mut self, p: &V) {
        self.for_each(|m| m.mem_uninitialize_reachable(p));
    }

    fn lifetime_assign_allocated(&mut self, m: &M) {
        self.for_each(|mem| mem.lifetime_assign_allocated(m));
    }

    fn lifetime_assign_deallocated(&mut self, m: &M) {
        self.for_each(|mem| mem.lifetime_assign_deallocated(m));
    }

    fn lifetime_assert_allocated(&mut self, m: &M) {
        self.for_each(|mem| mem.lifetime_assert_allocated(m));
    }

    fn lifetime_assert_deallocated(&mut self, m: &M) {
        self.for_each(|mem| mem.lifetime_assert_deallocated(m));
    }

    fn lifetime_set(&mut self, m: &M, value: Lifetime) {
        self.for_each(|mem| mem.lifetime_set(m, value));
    }

    fn lifetime_forget(&mut self, m: &M) {
        self.for_each(|mem| mem.lifetime_forget(m));
    }

    fn lifetime_to_lifetime(&self, m: &M) -> Lifetime {
        use crate::separate::LatticeValue;
        self.fold_query(|mem| mem.lifetime_to_lifetime(m), |a, b| a.join(&b))
    }

    fn partitioning_set_variable(&mut self, x: &V) {
        if !x.is_int() {
            self.partitioning_disable();
            return;
        }
        if self.variable.as_ref() == Some(x) {
            return;
        }
        self.variable = Some(x.clone());
        self.update_partitions();
    }

    fn partitioning_variable(&self) -> Option<V> {
        self.variable.clone()
    }

    fn partitioning_join(&mut self) {
        let merged = self.join_partitions();
        self.partitions = smallvec![merged];
    }

    fn partitioning_disable(&mut self) {
        if self.variable.is_none() {
            debug_assert!(self.partitions.len() == 1);
            return;
        }
        self.partitioning_join();
        self.variable = None;
        self.partitions[0].interval = top_interval();
    }
}
