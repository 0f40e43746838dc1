//! Cell-based memory abstract domain.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use std::collections::BTreeSet;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{Bound, Int, Interval, MachineInt, Sign};
use argus_tree::{Indexable, PatriciaTreeMap};

use crate::lattice::AbstractDomain;
use crate::lifetime::{Lifetime, LifetimeDomain};
use crate::linear::LinearExpression;
use crate::literal::Literal;
use crate::machine::{IntBinaryOp, IntOperand, IntPredicate, IntUnaryOp, MachineIntDomain};
use crate::nullity::Nullity;
use crate::pointer::{PointerAbsValue, PointsToSet};
use crate::scalar::ScalarDomain;
use crate::separate::LatticeValue;
use crate::uninit::Uninitialized;
use crate::var::{MemoryLocation, ScalarVariable, VariableFactory};

use super::MemoryDomain;

/// A synthetic memory cell: the bytes of `base` at
/// `[offset, offset + size - 1]`.
///
/// The scalar variable is a deterministic function of `(base, offset,
/// size)`, so two independently realized cells over the same bytes share
/// their abstract value.
#[derive(Clone)]
struct Cell<V, M> {
    base: M,
    offset: Int,
    size: Int,
    scalar_var: V,
}

impl<V: ScalarVariable, M: MemoryLocation> Cell<V, M> {
    fn new<F: VariableFactory<V, M>>(factory: &F, base: M, offset: Int, size: Int) -> Self {
        assert!(offset.is_non_negative() && size >= Int::one());
        let scalar_var = factory.cell_var(&base, &offset, &size);
        Self {
            base,
            offset,
            size,
            scalar_var,
        }
    }

    /// Byte range covered by the cell.
    fn range(&self) -> Interval {
        Interval::new(
            self.offset.clone(),
            &self.offset + &self.size - Int::one(),
        )
    }

    fn overlaps_range(&self, range: &Interval) -> bool {
        !self.range().meet(range).is_bottom()
    }

    fn overlaps(&self, other: &Cell<V, M>) -> bool {
        self.overlaps_range(&other.range())
    }
}

impl<V, M: PartialEq> PartialEq for Cell<V, M> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.offset == other.offset && self.size == other.size
    }
}

impl<V, M: Eq> Eq for Cell<V, M> {}

impl<V, M: MemoryLocation> PartialOrd for Cell<V, M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, M: MemoryLocation> Ord for Cell<V, M> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then_with(|| self.size.cmp(&other.size))
            .then_with(|| self.base.index().cmp(&other.base.index()))
    }
}

impl<V, M: fmt::Display> fmt::Debug for Cell<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{{{},{},{}}}", self.base, self.offset, self.size)
    }
}

type CellSet<V, M> = BTreeSet<Cell<V, M>>;

/// Byte-level memory abstraction over a scalar domain.
///
/// Memory contents live in synthetic cells, realized lazily on access and
/// kept non-overlapping per object: writes drop the cells they straddle,
/// and reads with no exact realization give their destination up rather
/// than materialize an overlapping cell. The embedded scalar state holds
/// the value of every cell (through its dynamic scalar variable) and the
/// surface of program variables.
pub struct CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    cells: PatriciaTreeMap<M, CellSet<V, M>>,
    scalar: S,
    lifetime: LifetimeDomain<M>,
    factory: F,
    _vars: PhantomData<fn() -> V>,
}

impl<V, M, S, F> Clone for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            scalar: self.scalar.clone(),
            lifetime: self.lifetime.clone(),
            factory: self.factory.clone(),
            _vars: PhantomData,
        }
    }
}

impl<V, M, S, F> CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    /// The initial (top) state using the given cell-variable factory.
    ///
    /// Prefer this over [`AbstractDomain::top`], which falls back to a
    /// default-constructed factory.
    pub fn new(factory: F) -> Self {
        Self {
            cells: PatriciaTreeMap::new(),
            scalar: S::top(),
            lifetime: LifetimeDomain::top(),
            factory,
            _vars: PhantomData,
        }
    }

    /// The embedded scalar state.
    pub fn scalar(&self) -> &S {
        &self.scalar
    }

    fn add_cell(&mut self, c: Cell<V, M>) {
        let mut set = self.cells.get(&c.base).cloned().unwrap_or_default();
        set.insert(c.clone());
        self.cells.insert(c.base, set);
    }

    fn remove_cell(&mut self, c: &Cell<V, M>) {
        if let Some(set) = self.cells.get(&c.base) {
            let mut set = set.clone();
            set.remove(c);
            if set.is_empty() {
                self.cells.remove(&c.base);
            } else {
                self.cells.insert(c.base.clone(), set);
            }
        }
        self.scalar.dynamic_forget(&c.scalar_var);
    }

    fn cells_of(&self, base: &M) -> CellSet<V, M> {
        self.cells.get(base).cloned().unwrap_or_default()
    }

    /// Offset interval of a pointer, clipped to the addressable range.
    fn offset_interval(&self, p: &V) -> Interval {
        self.scalar
            .pointer_offset_to_interval(p)
            .to_interval()
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()))
    }

    /// How many distinct write offsets can touch the cell.
    fn number_overlaps(&self, c: &Cell<V, M>, offset_var: &V, size: &Int) -> Bound {
        let mut probe = self.scalar.clone();
        let width = offset_var.bit_width();
        let sign = offset_var.sign();
        let to_mi = |n: &Int| MachineInt::new(n.clone(), width, sign);
        // offset + size - 1 >= c.offset and offset <= c.offset + c.size - 1.
        // The lower bound is clamped at zero: offsets are unsigned and a
        // negative bound would wrap into a huge one.
        let lo = &c.offset - &(size - &Int::one());
        if lo.is_positive() {
            probe.int_add(
                IntPredicate::Ge,
                &IntOperand::Var(offset_var.clone()),
                &IntOperand::Const(to_mi(&lo)),
            );
        }
        probe.int_add(
            IntPredicate::Le,
            &IntOperand::Var(offset_var.clone()),
            &IntOperand::Const(to_mi(&(&c.offset + &c.size - Int::one()))),
        );
        if probe.is_bottom() {
            return Bound::zero();
        }
        let rng = probe.int_to_interval(offset_var);
        match (rng.lb().number(), rng.ub().number()) {
            (Some(lb), Some(ub)) => Bound::from(ub - lb + Int::one()),
            _ => Bound::plus_infinity(),
        }
    }

    /// Whether the write at `offset_var` of `size` bytes can land exactly
    /// on the cell.
    fn cell_realizes(&self, c: &Cell<V, M>, offset_var: &V, size: &Int) -> bool {
        if c.size != *size {
            return false;
        }
        let mut probe = self.scalar.clone();
        probe.int_add(
            IntPredicate::Eq,
            &IntOperand::Var(offset_var.clone()),
            &IntOperand::Const(MachineInt::new(
                c.offset.clone(),
                offset_var.bit_width(),
                offset_var.sign(),
            )),
        );
        !probe.is_bottom()
    }

    /// Realize the cell written by a store at an exact offset. Overlapping
    /// cells lose their contents.
    fn write_realize_single_cell(&mut self, base: M, offset: Int, size: Int) -> Cell<V, M> {
        let c = Cell::new(&self.factory, base, offset, size);
        let existing = self.cells_of(&c.base);
        let mut found = false;
        for other in &existing {
            if *other == c {
                found = true;
            } else if c.overlaps(other) {
                self.remove_cell(other);
            }
        }
        if !found {
            self.add_cell(c.clone());
        }
        c
    }

    /// Realize the cells touched by a store at an approximated offset.
    ///
    /// Returns the cells to weak-update: those with exactly one way to be
    /// hit by the write. Every other overlapped cell is dropped.
    fn write_realize_range_cells(&mut self, base: &M, offset_var: &V, size: &Int) -> Vec<Cell<V, M>> {
        let offset_intv = self
            .scalar
            .int_to_interval(offset_var)
            .to_interval()
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
        let range = &offset_intv
            + &Interval::new(Int::zero(), size - &Int::one());
        tracing::trace!(?range, "realizing range write");
        let mut kept = Vec::new();
        for c in self.cells_of(base) {
            if !c.overlaps_range(&range) {
                continue;
            }
            if self.number_overlaps(&c, offset_var, size) == Bound::one()
                && self.cell_realizes(&c, offset_var, size)
            {
                // Only one way to hit this cell: its value can be weakly
                // updated instead of lost.
                kept.push(c);
            } else {
                self.remove_cell(&c);
            }
        }
        kept
    }

    /// Realize a cell for a load at an exact offset: the matching cell if
    /// it already exists, a fresh cell when nothing overlaps the read
    /// range, and nothing when the read straddles an existing cell. A
    /// partial overlap has no exact realization, and materializing one
    /// would break the non-overlap invariant of the cell set.
    fn read_realize_single_cell(&mut self, base: M, offset: Int, size: Int) -> Option<Cell<V, M>> {
        let c = Cell::new(&self.factory, base, offset, size);
        let existing = self.cells_of(&c.base);
        if existing.contains(&c) {
            return Some(c);
        }
        if existing.iter().any(|other| c.overlaps(other)) {
            return None;
        }
        self.add_cell(c.clone());
        Some(c)
    }

    /// Write a literal into a scalar variable, strongly.
    fn literal_write(scalar: &mut S, lhs: &V, rhs: &Literal<V>) {
        match rhs {
            Literal::MachineInt(n) => {
                // Stores are bitcasts: the cell keeps the bit pattern.
                let cast = if n.bit_width() == lhs.bit_width() && n.sign() == lhs.sign() {
                    n.clone()
                } else {
                    n.cast(lhs.bit_width(), lhs.sign())
                };
                scalar.dynamic_write_int(lhs, &cast);
            }
            Literal::Float => scalar.dynamic_write_nondet_float(lhs),
            Literal::Undefined => scalar.dynamic_write_undef(lhs),
            Literal::Null => scalar.dynamic_write_null(lhs),
            Literal::IntVar(v) => scalar.dynamic_write_int_var(lhs, v),
            Literal::FloatVar(v) => scalar.dynamic_write_float_var(lhs, v),
            Literal::PointerVar(v) => scalar.dynamic_write_pointer_var(lhs, v),
        }
    }

    /// Read a scalar variable into a literal destination, strongly.
    fn literal_read(scalar: &mut S, lhs: &Literal<V>, rhs: &V) {
        match lhs {
            Literal::IntVar(v) => scalar.dynamic_read_int(v, rhs),
            Literal::FloatVar(v) => scalar.float_assign(v, rhs),
            Literal::PointerVar(v) => scalar.dynamic_read_pointer(v, rhs),
            _ => panic!("memory read into a constant"),
        }
    }

    fn strong_update(&mut self, lhs: &V, rhs: &Literal<V>) {
        Self::literal_write(&mut self.scalar, lhs, rhs);
    }

    fn weak_update(&mut self, lhs: &V, rhs: &Literal<V>) {
        let mut updated = self.scalar.clone();
        Self::literal_write(&mut updated, lhs, rhs);
        self.scalar = self.scalar.join(&updated);
    }

    fn strong_read(&mut self, lhs: &Literal<V>, rhs: &V) {
        Self::literal_read(&mut self.scalar, lhs, rhs);
    }

    fn weak_read(&mut self, lhs: &Literal<V>, rhs: &V) {
        let mut updated = self.scalar.clone();
        Self::literal_read(&mut updated, lhs, rhs);
        self.scalar = self.scalar.join(&updated);
    }

    /// Null or undefined dereference check; both are definite errors.
    fn check_dereference(&mut self, p: &V) -> bool {
        if self.scalar.nullity_is_null(p) || self.scalar.uninit_is_uninitialized(p) {
            self.set_to_bottom();
            return false;
        }
        true
    }

    fn forget_cells_of(&mut self, base: &M) {
        for c in self.cells_of(base) {
            self.scalar.dynamic_forget(&c.scalar_var);
        }
        self.cells.remove(base);
    }

    fn forget_cells_in_range(&mut self, base: &M, range: &Interval) {
        for c in self.cells_of(base) {
            if c.overlaps_range(range) {
                self.remove_cell(&c);
            }
        }
    }

    fn forget_all_cells(&mut self) {
        let bases: Vec<M> = self.cells.keys().cloned().collect();
        for base in bases {
            self.forget_cells_of(&base);
        }
    }

    /// Forget the cells reachable through `p`, optionally only within
    /// `size` bytes of the pointer offset.
    fn forget_reachable_cells(&mut self, p: &V, size: Option<&Interval>) {
        if self.is_bottom() {
            return;
        }
        if self.scalar.nullity_is_null(p) || self.scalar.uninit_is_uninitialized(p) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(p);
        if addrs.is_top() {
            self.forget_all_cells();
            return;
        }
        if addrs.is_bottom() {
            return;
        }
        let range = size.map(|size_intv| {
            let size_intv =
                size_intv.meet(&Interval::new(Bound::one(), Bound::plus_infinity()));
            let offset = self.offset_interval(p);
            &offset + &Interval::new(Bound::zero(), size_intv.ub() - &Bound::one())
        });
        let addrs: Vec<M> = addrs.iter().cloned().collect();
        for base in addrs {
            match &range {
                Some(range) => self.forget_cells_in_range(&base, range),
                None => self.forget_cells_of(&base),
            }
        }
    }

    /// Overwrite every realized cell reachable through `p` with a literal:
    /// a strong update when `p` has a single target, a weak one otherwise.
    /// Used by the whole-object intrinsics (zeroing, uninitializing),
    /// where the bytes never observed as cells simply stay unknown.
    fn update_reachable_cells(&mut self, p: &V, value_of: &impl Fn(&V) -> Literal<V>) {
        if self.is_bottom() {
            return;
        }
        if self.scalar.nullity_is_null(p) || self.scalar.uninit_is_uninitialized(p) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(p);
        if addrs.is_top() {
            self.forget_all_cells();
            return;
        }
        if addrs.is_bottom() {
            return;
        }
        let single = addrs.size() == Some(1);
        let bases: Vec<M> = addrs.iter().cloned().collect();
        for base in bases {
            for c in self.cells_of(&base) {
                let value = value_of(&c.scalar_var);
                if single {
                    self.strong_update(&c.scalar_var, &value);
                } else {
                    self.weak_update(&c.scalar_var, &value);
                }
            }
        }
    }

    fn literal_interval(&self, l: &Literal<V>) -> Interval {
        match l {
            Literal::MachineInt(n) => Interval::singleton_of(n.to_int()),
            Literal::Null => Interval::singleton_of(Int::zero()),
            Literal::IntVar(v) => self.scalar.int_to_interval(v).to_interval().clone(),
            _ => Interval::top(),
        }
    }
}

impl<V, M, S, F> AbstractDomain for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn bottom() -> Self {
        let mut d = Self::new(F::default());
        d.scalar = S::bottom();
        d.lifetime = LifetimeDomain::bottom();
        d
    }

    fn top() -> Self {
        Self::new(F::default())
    }

    fn is_bottom(&self) -> bool {
        self.scalar.is_bottom() || self.lifetime.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.cells.is_empty() && self.scalar.is_top() && self.lifetime.is_top()
    }

    fn set_to_bottom(&mut self) {
        self.cells = PatriciaTreeMap::new();
        self.scalar.set_to_bottom();
        self.lifetime.set_to_bottom();
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        // A cell unknown on our side would have an unconstrained value, so
        // every cell of `other` must exist here.
        self.cells.leq(&other.cells, |ours, theirs| {
            theirs.is_subset(ours)
        }) && self.scalar.leq(&other.scalar)
            && self.lifetime.leq(&other.lifetime)
    }

    fn join(&self, other: &Self) -> Self {
        self.merge(other, |a, b| a.join(b), |a, b| a.join(b))
    }

    fn widening(&self, other: &Self) -> Self {
        self.merge(other, |a, b| a.widening(b), |a, b| a.widening(b))
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        self.merge(
            other,
            |a, b| a.widening_threshold(b, threshold),
            |a, b| a.widening(b),
        )
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        // Meet keeps the union of the cells.
        let cells = self.cells.join_with(&other.cells, |a, b| {
            let mut merged = a.clone();
            merged.extend(b.iter().cloned());
            Some(merged)
        });
        let mut result = self.clone();
        result.cells = cells;
        result.scalar = self.scalar.meet(&other.scalar);
        result.lifetime = self.lifetime.meet(&other.lifetime);
        result
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let mut result = self.clone();
        result.scalar = self.scalar.narrowing(&other.scalar);
        result.lifetime = self.lifetime.narrowing(&other.lifetime);
        result
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let mut result = self.clone();
        result.scalar = self.scalar.narrowing_threshold(&other.scalar, threshold);
        result.lifetime = self.lifetime.narrowing(&other.lifetime);
        result
    }

    fn normalize(&mut self) {
        self.scalar.normalize();
        if self.scalar.is_bottom() {
            self.set_to_bottom();
        }
    }
}

impl<V, M, S, F> CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    /// Shared shape of join-like operations: cells present on both sides
    /// survive, everything else becomes unknown; the scalar variables of
    /// dropped cells are forgotten on the surviving side before combining.
    fn merge(
        &self,
        other: &Self,
        combine_scalar: impl Fn(&S, &S) -> S,
        combine_lifetime: impl Fn(&LifetimeDomain<M>, &LifetimeDomain<M>) -> LifetimeDomain<M>,
    ) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let cells = self.cells.intersect_with(&other.cells, |a, b| {
            let common: CellSet<V, M> = a.intersection(b).cloned().collect();
            (!common.is_empty()).then_some(common)
        });
        // Values of cells that did not survive must not leak into the
        // combined scalar state.
        let mut left = self.scalar.clone();
        let mut prune = |state: &mut S, mine: &PatriciaTreeMap<M, CellSet<V, M>>| {
            for (base, set) in mine.iter() {
                let surviving = cells.get(base);
                for c in set {
                    let kept = surviving.map_or(false, |s| s.contains(c));
                    if !kept {
                        state.dynamic_forget(&c.scalar_var);
                    }
                }
            }
        };
        prune(&mut left, &self.cells);
        let mut right = other.scalar.clone();
        prune(&mut right, &other.cells);
        Self {
            cells,
            scalar: combine_scalar(&left, &right),
            lifetime: combine_lifetime(&self.lifetime, &other.lifetime),
            factory: self.factory.clone(),
            _vars: PhantomData,
        }
    }
}

impl<V, M, S, F> MemoryDomain<V, M> for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn mem_write(&mut self, p: &V, v: &Literal<V>, size: &MachineInt) {
        if self.is_bottom() {
            return;
        }
        if !self.check_dereference(p) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(p);
        if addrs.is_top() {
            // No idea where the write lands: every known byte dies.
            self.forget_all_cells();
            return;
        }
        if addrs.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let offset_intv = self.offset_interval(p);
        if offset_intv.is_bottom() {
            // Buffer underflow: the offset is definitely negative.
            self.set_to_bottom();
            return;
        }
        let size = size.to_int();
        let single = addrs.size() == Some(1);
        let bases: Vec<M> = addrs.iter().cloned().collect();
        if let Some(o) = offset_intv.singleton().cloned() {
            for base in bases {
                let c = self.write_realize_single_cell(base, o.clone(), size.clone());
                if single {
                    self.strong_update(&c.scalar_var, v);
                } else {
                    self.weak_update(&c.scalar_var, v);
                }
            }
        } else {
            // Range write: cells with a unique hit keep their identity and
            // get a weak update; the rest are dropped.
            let offset_var = p.offset_var();
            for base in bases {
                let kept = self.write_realize_range_cells(&base, &offset_var, &size);
                for c in kept {
                    self.weak_update(&c.scalar_var, v);
                }
            }
        }
    }

    fn mem_read(&mut self, x: &Literal<V>, p: &V, size: &MachineInt) {
        assert!(x.is_var(), "memory read into a constant");
        if self.is_bottom() {
            return;
        }
        if !self.check_dereference(p) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(p);
        if addrs.is_top() {
            if let Some(v) = x.var() {
                self.scalar.scalar_forget(v);
            }
            return;
        }
        if addrs.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let offset_intv = self.offset_interval(p);
        if offset_intv.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let size = size.to_int();
        if let Some(o) = offset_intv.singleton().cloned() {
            let bases: Vec<M> = addrs.iter().cloned().collect();
            let mut first = true;
            for base in bases {
                match self.read_realize_single_cell(base, o.clone(), size.clone()) {
                    Some(c) => {
                        if first {
                            self.strong_read(x, &c.scalar_var);
                            first = false;
                        } else {
                            self.weak_read(x, &c.scalar_var);
                        }
                    }
                    None => {
                        // No exact realization on this base: the read
                        // target is unknown.
                        if let Some(v) = x.var() {
                            self.scalar.scalar_forget(v);
                        }
                        return;
                    }
                }
            }
        } else {
            // Reading through an imprecise offset would need a summarizing
            // array abstraction; give the destination up instead.
            if let Some(v) = x.var() {
                self.scalar.scalar_forget(v);
            }
        }
    }

    fn mem_copy(&mut self, dest: &V, src: &V, size: &Literal<V>) {
        if self.is_bottom() {
            return;
        }
        if !self.check_dereference(dest) || !self.check_dereference(src) {
            return;
        }
        let dest_addrs = self.scalar.pointer_to_points_to(dest);
        let src_addrs = self.scalar.pointer_to_points_to(src);
        if dest_addrs.is_top() {
            self.forget_all_cells();
            return;
        }
        let dest_intv = self.offset_interval(dest);
        let src_intv = self.offset_interval(src);
        if dest_intv.is_bottom() || src_intv.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let size_intv = self
            .literal_interval(size)
            .meet(&Interval::new(Bound::one(), Bound::plus_infinity()));
        if size_intv.is_bottom() {
            return;
        }
        // Soundness first: everything the copy may clobber is dropped.
        self.forget_reachable_cells(dest, Some(&size_intv));

        let exact = dest_addrs.size() == Some(1)
            && dest_intv.singleton().is_some()
            && !src_addrs.is_top()
            && !src_addrs.is_bottom()
            && src_intv.singleton().is_some()
            && size_intv.lb().is_finite();
        if !exact {
            return;
        }
        let dest_base = dest_addrs.singleton_location().unwrap();
        let dest_offset = dest_intv.singleton().unwrap().clone();
        let src_offset = src_intv.singleton().unwrap().clone();
        let size_lb = size_intv.lb().to_int();
        let window = Interval::new(
            src_offset.clone(),
            &src_offset + &size_lb - Int::one(),
        );

        let prev = self.clone();
        let mut first = true;
        let src_bases: Vec<M> = src_addrs.iter().cloned().collect();
        for src_base in src_bases {
            let mut inv = prev.clone();
            for c in prev.cells_of(&src_base) {
                if c.range().leq(&window) {
                    let copied = Cell::new(
                        &inv.factory,
                        dest_base.clone(),
                        &dest_offset + &(&c.offset - &src_offset),
                        c.size.clone(),
                    );
                    inv.add_cell(copied.clone());
                    inv.scalar.dynamic_assign(&copied.scalar_var, &c.scalar_var);
                }
            }
            if first {
                *self = inv;
                first = false;
            } else {
                *self = self.join(&inv);
            }
        }
    }

    fn mem_set(&mut self, dest: &V, value: &Literal<V>, size: &Literal<V>) {
        if self.is_bottom() {
            return;
        }
        if !self.check_dereference(dest) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(dest);
        if addrs.is_top() {
            self.forget_all_cells();
            return;
        }
        let dest_intv = self.offset_interval(dest);
        if dest_intv.is_bottom() {
            self.set_to_bottom();
            return;
        }
        let size_intv = self
            .literal_interval(size)
            .meet(&Interval::new(Bound::one(), Bound::plus_infinity()));
        if size_intv.is_bottom() {
            return;
        }
        let value_intv = self.literal_interval(value);
        let zero = value_intv.singleton().map_or(false, |n| n.is_zero());
        if !zero || !size_intv.lb().is_finite() {
            self.forget_reachable_cells(dest, Some(&size_intv));
            return;
        }
        let size_lb = size_intv.lb().to_int();
        // Bytes certainly written regardless of where in the offset range
        // the write starts.
        let safe_range = if dest_intv.ub().is_finite() {
            Interval::new(
                dest_intv.lb().clone(),
                dest_intv.lb() + &(&size_lb - &Int::one()),
            )
            .meet(&Interval::new(
                dest_intv.ub().clone(),
                dest_intv.ub() + &(&size_lb - &Int::one()),
            ))
        } else {
            Interval::bottom()
        };
        let unsafe_range = &dest_intv
            + &Interval::new(Bound::zero(), size_intv.ub() - &Bound::one());
        let single = addrs.size() == Some(1);
        let bases: Vec<M> = addrs.iter().cloned().collect();
        for base in bases {
            for c in self.cells_of(&base) {
                if c.range().leq(&safe_range) {
                    let zero_lit = Literal::MachineInt(MachineInt::zero(
                        c.scalar_var.bit_width(),
                        c.scalar_var.sign(),
                    ));
                    if single {
                        self.strong_update(&c.scalar_var, &zero_lit);
                    } else {
                        self.weak_update(&c.scalar_var, &zero_lit);
                    }
                } else if c.overlaps_range(&unsafe_range) {
                    self.remove_cell(&c);
                }
            }
        }
    }

    fn mem_forget_all(&mut self) {
        if self.is_bottom() {
            return;
        }
        self.forget_all_cells();
    }

    fn mem_forget(&mut self, addr: &M) {
        if self.is_bottom() {
            return;
        }
        self.forget_cells_of(addr);
    }

    fn mem_forget_range(&mut self, addr: &M, offset: &IntInterval, size: &MachineInt) {
        if self.is_bottom() {
            return;
        }
        let offset = offset
            .to_interval()
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
        let range = &offset + &Interval::new(Int::zero(), size.to_int() - Int::one());
        self.forget_cells_in_range(addr, &range);
    }

    fn mem_forget_reachable(&mut self, p: &V) {
        self.forget_reachable_cells(p, None);
    }

    fn mem_forget_reachable_size(&mut self, p: &V, size: &MachineInt) {
        self.forget_reachable_cells(p, Some(&Interval::singleton_of(size.to_int())));
    }

    fn mem_abstract_reachable(&mut self, p: &V) {
        // In the value domain a cell with an unknown content and a dropped
        // cell read back the same way, so abstracting coincides with
        // forgetting. The summary domain refines this with a wide output
        // cell.
        self.forget_reachable_cells(p, None);
    }

    fn mem_abstract_reachable_size(&mut self, p: &V, size: &MachineInt) {
        self.forget_reachable_cells(p, Some(&Interval::singleton_of(size.to_int())));
    }

    fn mem_zero_reachable(&mut self, p: &V) {
        // Zero every already-realized cell of the reachable objects. The
        // object extents are unknown, so bytes without a cell stay
        // unknown until a later access realizes them.
        self.update_reachable_cells(p, &|c| {
            Literal::MachineInt(MachineInt::zero(c.bit_width(), c.sign()))
        });
    }

    fn mem_uninitialize_reachable(&mut self, p: &V) {
        self.update_reachable_cells(p, &|_| Literal::Undefined);
    }

    fn lifetime_assign_allocated(&mut self, m: &M) {
        if self.is_bottom() {
            return;
        }
        self.lifetime.assign_allocated(m.clone());
    }

    fn lifetime_assign_deallocated(&mut self, m: &M) {
        if self.is_bottom() {
            return;
        }
        self.lifetime.assign_deallocated(m.clone());
    }

    fn lifetime_assert_allocated(&mut self, m: &M) {
        if self.is_bottom() {
            return;
        }
        self.lifetime.assert_allocated(m);
        if self.lifetime.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn lifetime_assert_deallocated(&mut self, m: &M) {
        if self.is_bottom() {
            return;
        }
        self.lifetime.assert_deallocated(m);
        if self.lifetime.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn lifetime_set(&mut self, m: &M, value: Lifetime) {
        if self.is_bottom() {
            return;
        }
        self.lifetime.set(m.clone(), value);
        if self.lifetime.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn lifetime_forget(&mut self, m: &M) {
        self.lifetime.forget(m);
    }

    fn lifetime_to_lifetime(&self, m: &M) -> Lifetime {
        self.lifetime.get(m)
    }
}

impl<V, M, S, F> fmt::Display for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M> + fmt::Display,
    F: VariableFactory<V, M> + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        write!(f, "(cells: {{")?;
        let mut first = true;
        for (base, set) in self.cells.iter() {
            for c in set {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{c:?}")?;
                first = false;
            }
            let _ = base;
        }
        write!(f, "}}, scalar: {})", self.scalar)
    }
}

impl<V, M, S, F> fmt::Debug for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M> + fmt::Debug,
    F: VariableFactory<V, M> + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        f.debug_struct("CellDomain")
            .field("cells", &self.cells)
            .field("scalar", &self.scalar)
            .finish()
    }
}

// The scalar surface of the memory domain: every scalar operation goes
// straight to the embedded scalar state. Cells are only involved through
// the mem_* entry points.
impl<V, M, S, F> MachineIntDomain<V> for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn int_assign(&mut self, x: &V, n: &MachineInt) {
        self.scalar.int_assign(x, n);
    }

    fn int_assign_var(&mut self, x: &V, y: &V) {
        self.scalar.int_assign_var(x, y);
    }

    fn int_assign_expr(&mut self, x: &V, e: &LinearExpression<V>) {
        self.scalar.int_assign_expr(x, e);
    }

    fn int_assign_nondet(&mut self, x: &V) {
        self.scalar.int_assign_nondet(x);
    }

    fn int_apply_unary(&mut self, op: IntUnaryOp, x: &V, y: &V) {
        self.scalar.int_apply_unary(op, x, y);
    }

    fn int_apply(&mut self, op: IntBinaryOp, x: &V, y: &IntOperand<V>, z: &IntOperand<V>) {
        self.scalar.int_apply(op, x, y, z);
    }

    fn int_add(&mut self, pred: IntPredicate, x: &IntOperand<V>, y: &IntOperand<V>) {
        self.scalar.int_add(pred, x, y);
    }

    fn int_set(&mut self, x: &V, value: &IntIntervalCongruence) {
        self.scalar.int_set(x, value);
    }

    fn int_refine(&mut self, x: &V, value: &IntIntervalCongruence) {
        self.scalar.int_refine(x, value);
    }

    fn int_forget(&mut self, x: &V) {
        self.scalar.int_forget(x);
    }

    fn int_to_interval(&self, x: &V) -> IntInterval {
        self.scalar.int_to_interval(x)
    }

    fn int_to_congruence(&self, x: &V) -> IntCongruence {
        self.scalar.int_to_congruence(x)
    }

    fn int_to_interval_expr(
        &self,
        e: &LinearExpression<V>,
        width: u32,
        sign: Sign,
    ) -> IntInterval {
        self.scalar.int_to_interval_expr(e, width, sign)
    }

    fn counter_mark(&mut self, x: &V) {
        self.scalar.counter_mark(x);
    }

    fn counter_unmark(&mut self, x: &V) {
        self.scalar.counter_unmark(x);
    }

    fn counter_init(&mut self, x: &V, c: &MachineInt) {
        self.scalar.counter_init(x, c);
    }

    fn counter_incr(&mut self, x: &V, k: &MachineInt) {
        self.scalar.counter_incr(x, k);
    }

    fn counter_forget(&mut self, x: &V) {
        self.scalar.counter_forget(x);
    }
}

impl<V, M, S, F> ScalarDomain<V, M> for CellDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn uninit_assert_initialized(&mut self, x: &V) {
        self.scalar.uninit_assert_initialized(x);
    }

    fn uninit_is_initialized(&self, x: &V) -> bool {
        self.scalar.uninit_is_initialized(x)
    }

    fn uninit_is_uninitialized(&self, x: &V) -> bool {
        self.scalar.uninit_is_uninitialized(x)
    }

    fn uninit_refine(&mut self, x: &V, value: Uninitialized) {
        self.scalar.uninit_refine(x, value);
    }

    fn uninit_to_uninitialized(&self, x: &V) -> Uninitialized {
        self.scalar.uninit_to_uninitialized(x)
    }

    fn int_assign_undef(&mut self, x: &V) {
        self.scalar.int_assign_undef(x);
    }

    fn float_assign_undef(&mut self, x: &V) {
        self.scalar.float_assign_undef(x);
    }

    fn float_assign_nondet(&mut self, x: &V) {
        self.scalar.float_assign_nondet(x);
    }

    fn float_assign(&mut self, x: &V, y: &V) {
        self.scalar.float_assign(x, y);
    }

    fn float_forget(&mut self, x: &V) {
        self.scalar.float_forget(x);
    }

    fn nullity_assert_null(&mut self, p: &V) {
        self.scalar.nullity_assert_null(p);
        if self.scalar.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn nullity_assert_non_null(&mut self, p: &V) {
        self.scalar.nullity_assert_non_null(p);
        if self.scalar.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn nullity_is_null(&self, p: &V) -> bool {
        self.scalar.nullity_is_null(p)
    }

    fn nullity_is_non_null(&self, p: &V) -> bool {
        self.scalar.nullity_is_non_null(p)
    }

    fn nullity_set(&mut self, p: &V, value: Nullity) {
        self.scalar.nullity_set(p, value);
    }

    fn nullity_refine(&mut self, p: &V, value: Nullity) {
        self.scalar.nullity_refine(p, value);
    }

    fn nullity_to_nullity(&self, p: &V) -> Nullity {
        self.scalar.nullity_to_nullity(p)
    }

    fn pointer_assign_address(&mut self, p: &V, addr: &M, nullity: Nullity) {
        self.scalar.pointer_assign_address(p, addr, nullity);
    }

    fn pointer_assign_null(&mut self, p: &V) {
        self.scalar.pointer_assign_null(p);
    }

    fn pointer_assign_undef(&mut self, p: &V) {
        self.scalar.pointer_assign_undef(p);
    }

    fn pointer_assign_nondet(&mut self, p: &V) {
        self.scalar.pointer_assign_nondet(p);
    }

    fn pointer_assign_var(&mut self, p: &V, q: &V) {
        self.scalar.pointer_assign_var(p, q);
    }

    fn pointer_assign_offset(&mut self, p: &V, q: &V, o: &LinearExpression<V>) {
        self.scalar.pointer_assign_offset(p, q, o);
    }

    fn pointer_add(&mut self, pred: IntPredicate, p: &V, q: &V) {
        self.scalar.pointer_add(pred, p, q);
        if self.scalar.is_bottom() {
            self.set_to_bottom();
        }
    }

    fn pointer_refine_points_to(&mut self, p: &V, addrs: &PointsToSet<M>) {
        self.scalar.pointer_refine_points_to(p, addrs);
    }

    fn pointer_refine(&mut self, p: &V, value: &PointerAbsValue<M>) {
        self.scalar.pointer_refine(p, value);
    }

    fn pointer_offset_to_int(&mut self, x: &V, p: &V) {
        self.scalar.pointer_offset_to_int(x, p);
    }

    fn pointer_offset_to_interval(&self, p: &V) -> IntInterval {
        self.scalar.pointer_offset_to_interval(p)
    }

    fn pointer_to_points_to(&self, p: &V) -> PointsToSet<M> {
        self.scalar.pointer_to_points_to(p)
    }

    fn pointer_to_value(&self, p: &V) -> PointerAbsValue<M> {
        self.scalar.pointer_to_value(p)
    }

    fn pointer_forget_offset(&mut self, p: &V) {
        self.scalar.pointer_forget_offset(p);
    }

    fn pointer_forget(&mut self, p: &V) {
        self.scalar.pointer_forget(p);
    }

    fn dynamic_assign(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_assign(x, y);
    }

    fn dynamic_write_undef(&mut self, x: &V) {
        self.scalar.dynamic_write_undef(x);
    }

    fn dynamic_write_nondet(&mut self, x: &V) {
        self.scalar.dynamic_write_nondet(x);
    }

    fn dynamic_write_int(&mut self, x: &V, n: &MachineInt) {
        self.scalar.dynamic_write_int(x, n);
    }

    fn dynamic_write_nondet_int(&mut self, x: &V) {
        self.scalar.dynamic_write_nondet_int(x);
    }

    fn dynamic_write_int_var(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_write_int_var(x, y);
    }

    fn dynamic_write_nondet_float(&mut self, x: &V) {
        self.scalar.dynamic_write_nondet_float(x);
    }

    fn dynamic_write_float_var(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_write_float_var(x, y);
    }

    fn dynamic_write_null(&mut self, x: &V) {
        self.scalar.dynamic_write_null(x);
    }

    fn dynamic_write_pointer(&mut self, x: &V, addr: &M, nullity: Nullity) {
        self.scalar.dynamic_write_pointer(x, addr, nullity);
    }

    fn dynamic_write_pointer_var(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_write_pointer_var(x, y);
    }

    fn dynamic_read_int(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_read_int(x, y);
    }

    fn dynamic_read_pointer(&mut self, x: &V, y: &V) {
        self.scalar.dynamic_read_pointer(x, y);
    }

    fn dynamic_forget(&mut self, x: &V) {
        self.scalar.dynamic_forget(x);
    }

    fn scalar_assign_undef(&mut self, x: &V) {
        self.scalar.scalar_assign_undef(x);
    }

    fn scalar_assign_nondet(&mut self, x: &V) {
        self.scalar.scalar_assign_nondet(x);
    }

    fn scalar_forget(&mut self, x: &V) {
        self.scalar.scalar_forget(x);
    }
}
