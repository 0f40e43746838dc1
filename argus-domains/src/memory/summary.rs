//! Function-summary memory domain: relational input/output cells.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use std::collections::BTreeSet;

use argus_num::machine::{IntCongruence, IntInterval, IntIntervalCongruence};
use argus_num::{Bound, Int, Interval, MachineInt, Sign};
use argus_tree::{Indexable, MergeOperator, PatriciaTreeMap};

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
use crate::var::{CellKind, MemoryLocation, ScalarVariable, VariableFactory};

use super::MemoryDomain;

/// A summary cell: the bytes of `base` at `[offset, offset + size - 1]`,
/// before (`Input`) or after (`Output`) the summarized body runs.
///
/// The size is a bound: a cell may cover `[offset, +oo)` when a forget has
/// clobbered an unbounded range.
#[derive(Clone)]
pub struct SummaryCell<V, M> {
    base: M,
    offset: Int,
    size: Bound,
    kind: CellKind,
    scalar_var: V,
}

impl<V: ScalarVariable, M: MemoryLocation> SummaryCell<V, M> {
    fn new<F: VariableFactory<V, M>>(
        factory: &F,
        base: M,
        offset: Int,
        size: Bound,
        kind: CellKind,
    ) -> Self {
        assert!(offset.is_non_negative() && size >= Bound::one());
        let scalar_var = factory.summary_cell_var(&base, &offset, &size, kind);
        Self {
            base,
            offset,
            size,
            kind,
            scalar_var,
        }
    }

    /// Cell covering exactly the byte range.
    fn from_range<F: VariableFactory<V, M>>(
        factory: &F,
        base: M,
        range: &Interval,
        kind: CellKind,
    ) -> Self {
        let offset = range
            .lb()
            .number()
            .expect("summary cell range must have a finite start")
            .clone();
        let size = range.ub() - &Bound::from(offset.clone()) + Bound::one();
        Self::new(factory, base, offset, size, kind)
    }

    pub fn base(&self) -> &M {
        &self.base
    }

    pub fn offset(&self) -> &Int {
        &self.offset
    }

    pub fn size(&self) -> &Bound {
        &self.size
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn scalar_var(&self) -> &V {
        &self.scalar_var
    }

    fn is_input(&self) -> bool {
        self.kind == CellKind::Input
    }

    fn is_output(&self) -> bool {
        self.kind == CellKind::Output
    }

    fn range(&self) -> Interval {
        Interval::new(
            Bound::from(self.offset.clone()),
            &Bound::from(self.offset.clone()) + &self.size - Bound::one(),
        )
    }

    fn overlaps_range(&self, range: &Interval) -> bool {
        !self.range().meet(range).is_bottom()
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.overlaps_range(&other.range())
    }

    /// The input twin of an output cell.
    fn input_twin<F: VariableFactory<V, M>>(&self, factory: &F) -> Self {
        assert!(self.is_output());
        Self::new(
            factory,
            self.base.clone(),
            self.offset.clone(),
            self.size.clone(),
            CellKind::Input,
        )
    }
}

impl<V, M: PartialEq> PartialEq for SummaryCell<V, M> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.offset == other.offset
            && self.size == other.size
            && self.kind == other.kind
    }
}

impl<V, M: Eq> Eq for SummaryCell<V, M> {}

impl<V, M: MemoryLocation> PartialOrd for SummaryCell<V, M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, M: MemoryLocation> Ord for SummaryCell<V, M> {
    /// Lexicographic on (offset, size, kind, base), so walking a set
    /// visits cells in offset order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then_with(|| self.size.cmp(&other.size))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.base.index().cmp(&other.base.index()))
    }
}

impl<V, M: fmt::Display> fmt::Debug for SummaryCell<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C{{{},{},{},{}}}",
            self.base, self.offset, self.size, self.kind
        )
    }
}

type CellSet<V, M> = BTreeSet<SummaryCell<V, M>>;

fn outputs<'a, V: ScalarVariable, M: MemoryLocation>(
    set: &'a CellSet<V, M>,
) -> impl Iterator<Item = &'a SummaryCell<V, M>> {
    set.iter().filter(|c| c.is_output())
}

fn inputs<'a, V: ScalarVariable, M: MemoryLocation>(
    set: &'a CellSet<V, M>,
) -> impl Iterator<Item = &'a SummaryCell<V, M>> {
    set.iter().filter(|c| c.is_input())
}

/// Relational effect of one function body on memory.
///
/// Per memory object the domain keeps input cells (byte values before the
/// call) and output cells (byte values written by the body). No output
/// cell over a range means those bytes are unchanged; this is distinct
/// from top, which means anything may have changed.
pub struct SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    is_top: bool,
    cells: PatriciaTreeMap<M, CellSet<V, M>>,
    scalar: S,
    lifetime: LifetimeDomain<M>,
    factory: F,
    _vars: PhantomData<fn() -> V>,
}

impl<V, M, S, F> Clone for SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn clone(&self) -> Self {
        Self {
            is_top: self.is_top,
            cells: self.cells.clone(),
            scalar: self.scalar.clone(),
            lifetime: self.lifetime.clone(),
            factory: self.factory.clone(),
            _vars: PhantomData,
        }
    }
}

impl<V, M, S, F> SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    /// The summary of a body with no effect: every byte unchanged.
    pub fn unchanged(factory: F) -> Self {
        Self {
            is_top: false,
            cells: PatriciaTreeMap::new(),
            scalar: S::top(),
            lifetime: LifetimeDomain::top(),
            factory,
            _vars: PhantomData,
        }
    }

    pub fn scalar(&self) -> &S {
        &self.scalar
    }

    fn add_cell(&mut self, c: SummaryCell<V, M>) {
        let mut set = self.cells.get(&c.base).cloned().unwrap_or_default();
        set.insert(c.clone());
        self.cells.insert(c.base, set);
    }

    fn remove_cell(&mut self, c: &SummaryCell<V, M>) {
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

    /// Shrink `shrunk` so that it no longer covers any byte of `overlap`.
    fn shrink_cell(&mut self, shrunk: &SummaryCell<V, M>, overlap: &SummaryCell<V, M>) {
        let range = shrunk.range();
        let meet = range.meet(&overlap.range());
        assert!(!meet.is_bottom());
        let left = Interval::new(range.lb().clone(), meet.lb() - &Bound::one());
        if !left.is_bottom() {
            let c = SummaryCell::from_range(
                &self.factory,
                shrunk.base.clone(),
                &left,
                shrunk.kind,
            );
            self.add_cell(c);
        }
        let right = Interval::new(meet.ub() + &Bound::one(), range.ub().clone());
        if !right.is_bottom() {
            let c = SummaryCell::from_range(
                &self.factory,
                shrunk.base.clone(),
                &right,
                shrunk.kind,
            );
            self.add_cell(c);
        }
        self.remove_cell(shrunk);
    }

    /// Realize the output cell of a store at an exact offset.
    fn realize_single_out_cell(&mut self, base: M, offset: Int, size: Int) -> SummaryCell<V, M> {
        let c = SummaryCell::new(
            &self.factory,
            base,
            offset,
            Bound::from(size),
            CellKind::Output,
        );
        let set = self.cells_of(&c.base);
        if set.contains(&c) {
            return c;
        }
        for other in outputs(&set) {
            if c.overlaps(other) {
                self.shrink_cell(other, &c);
            }
        }
        self.add_cell(c.clone());
        c
    }

    /// Realize a cell for a load at an exact offset: the matching output
    /// cell if it exists, a fresh input cell when no output overlaps, and
    /// nothing when the read straddles an output cell.
    fn realize_single_in_cell(
        &mut self,
        base: M,
        offset: Int,
        size: Int,
    ) -> Option<SummaryCell<V, M>> {
        let c_in = SummaryCell::new(
            &self.factory,
            base.clone(),
            offset.clone(),
            Bound::from(size.clone()),
            CellKind::Input,
        );
        let c_out = SummaryCell::new(
            &self.factory,
            base,
            offset,
            Bound::from(size),
            CellKind::Output,
        );
        let set = self.cells_of(&c_in.base);
        if set.contains(&c_out) {
            return Some(c_out);
        }
        for other in outputs(&set) {
            if c_out.overlaps(other) {
                // Reading across an output cell boundary has no exact
                // realization.
                return None;
            }
        }
        self.add_cell(c_in.clone());
        Some(c_in)
    }

    /// Realize the output cells of a store at an approximated offset.
    ///
    /// Cells with a unique way to be hit survive for a weak update; the
    /// uncovered remainder of the range is replaced by fresh covering
    /// output cells with unknown contents.
    fn realize_range_out_cells(
        &mut self,
        base: &M,
        offset_var: &V,
        size: &Int,
    ) -> Vec<SummaryCell<V, M>> {
        let offset_intv = self
            .scalar
            .int_to_interval(offset_var)
            .to_interval()
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
        assert!(!offset_intv.is_bottom());
        let mut range = &offset_intv + &Interval::new(Int::zero(), size - &Int::one());
        let set = self.cells_of(base);
        if set.is_empty() {
            let c = SummaryCell::from_range(&self.factory, base.clone(), &range, CellKind::Output);
            self.add_cell(c);
            return Vec::new();
        }
        let mut updated = Vec::new();
        for c in outputs(&set) {
            if range.is_bottom() || !c.overlaps_range(&range) {
                continue;
            }
            if self.number_overlaps(c, offset_var, size) == Bound::one()
                && self.cell_realizes(c, offset_var, size)
            {
                updated.push(c.clone());
                // Cover the bytes before the cell, if any.
                let before = Interval::new(range.lb().clone(), Bound::from(&c.offset - &Int::one()));
                if !before.is_bottom() {
                    let cover = SummaryCell::from_range(
                        &self.factory,
                        base.clone(),
                        &before,
                        CellKind::Output,
                    );
                    self.add_cell(cover);
                }
                let cell_end = &Bound::from(c.offset.clone()) + &c.size - Bound::one();
                if *range.ub() <= cell_end {
                    range = Interval::bottom();
                } else {
                    range = Interval::new(&cell_end + &Bound::one(), range.ub().clone());
                }
            } else {
                range = range.join(&c.range());
                self.remove_cell(c);
            }
        }
        if !range.is_bottom() && range.lb().is_finite() {
            let c = SummaryCell::from_range(&self.factory, base.clone(), &range, CellKind::Output);
            self.add_cell(c);
        }
        updated
    }

    fn number_overlaps(&self, c: &SummaryCell<V, M>, offset_var: &V, size: &Int) -> Bound {
        let mut probe = self.scalar.clone();
        let width = offset_var.bit_width();
        let sign = offset_var.sign();
        let lo = &c.offset - &(size - &Int::one());
        if lo.is_positive() {
            probe.int_add(
                IntPredicate::Ge,
                &IntOperand::Var(offset_var.clone()),
                &IntOperand::Const(MachineInt::new(lo, width, sign)),
            );
        }
        if let Some(cell_size) = c.size.number() {
            probe.int_add(
                IntPredicate::Le,
                &IntOperand::Var(offset_var.clone()),
                &IntOperand::Const(MachineInt::new(
                    &c.offset + cell_size - Int::one(),
                    width,
                    sign,
                )),
            );
        }
        if probe.is_bottom() {
            return Bound::zero();
        }
        let rng = probe.int_to_interval(offset_var);
        match (rng.lb().number(), rng.ub().number()) {
            (Some(lb), Some(ub)) => Bound::from(ub - lb + Int::one()),
            _ => Bound::plus_infinity(),
        }
    }

    fn cell_realizes(&self, c: &SummaryCell<V, M>, offset_var: &V, size: &Int) -> bool {
        match c.size.number() {
            Some(cell_size) if cell_size == size => {}
            _ => return false,
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

    fn literal_write(scalar: &mut S, lhs: &V, rhs: &Literal<V>) {
        match rhs {
            Literal::MachineInt(n) => {
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

    fn check_dereference(&mut self, p: &V) -> bool {
        if self.scalar.nullity_is_null(p) || self.scalar.uninit_is_uninitialized(p) {
            self.set_to_bottom();
            return false;
        }
        true
    }

    fn offset_interval(&self, p: &V) -> Interval {
        self.scalar
            .pointer_offset_to_interval(p)
            .to_interval()
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()))
    }

    fn literal_interval(&self, l: &Literal<V>) -> Interval {
        match l {
            Literal::MachineInt(n) => Interval::singleton_of(n.to_int()),
            Literal::Null => Interval::singleton_of(Int::zero()),
            Literal::IntVar(v) => self.scalar.int_to_interval(v).to_interval().clone(),
            _ => Interval::top(),
        }
    }

    /// Drop all knowledge about one object: its bytes may all have
    /// changed, to unknown values.
    fn forget_cells_of(&mut self, base: &M) {
        for c in self.cells_of(base) {
            self.scalar.dynamic_forget(&c.scalar_var);
        }
        self.cells.remove(base);
        let wide = SummaryCell::new(
            &self.factory,
            base.clone(),
            Int::zero(),
            Bound::plus_infinity(),
            CellKind::Output,
        );
        self.add_cell(wide);
    }

    fn forget_cells_in_range(&mut self, base: &M, range: &Interval) {
        if range.is_bottom() || range.lb().number().is_none() {
            return;
        }
        let mut covering = range.clone();
        for c in self.cells_of(base) {
            if c.overlaps_range(range) {
                covering = covering.join(&c.range());
                self.remove_cell(&c);
            }
        }
        let wide = SummaryCell::from_range(&self.factory, base.clone(), &covering, CellKind::Output);
        self.add_cell(wide);
    }

    fn forget_all_cells(&mut self) {
        let bases: Vec<M> = self.cells.keys().cloned().collect();
        for base in &bases {
            for c in self.cells_of(base) {
                self.scalar.dynamic_forget(&c.scalar_var);
            }
        }
        // Without an enumeration of every live object the only sound
        // erasure of all memory is top.
        self.is_top = true;
        self.cells = PatriciaTreeMap::new();
        self.scalar.set_to_top();
        self.lifetime.set_to_top();
    }

    fn forget_reachable_cells(&mut self, p: &V, size: Option<&Interval>) {
        if self.is_bottom() || self.is_top {
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
        let bases: Vec<M> = addrs.iter().cloned().collect();
        match size {
            Some(size_intv) => {
                let size_intv =
                    size_intv.meet(&Interval::new(Bound::one(), Bound::plus_infinity()));
                let offset = self.offset_interval(p);
                let range =
                    &offset + &Interval::new(Bound::zero(), size_intv.ub() - &Bound::one());
                for base in bases {
                    self.forget_cells_in_range(&base, &range);
                }
            }
            None => {
                for base in bases {
                    self.forget_cells_of(&base);
                }
            }
        }
    }
}

/// Record `Output(o, s) == Input(o, s)` in a scalar state, making an
/// implicitly unchanged range explicit before a merge or comparison.
fn add_unchanged_relation<V, M, S, F>(
    factory: &F,
    c: &SummaryCell<V, M>,
    scalar: &mut S,
) -> SummaryCell<V, M>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    let twin = c.input_twin(factory);
    scalar.dynamic_assign(&c.scalar_var, &twin.scalar_var);
    twin
}

/// Walk two output-cell sequences of one object and merge them per the
/// summary join: identical cells are kept, overlapping runs collapse into
/// the smallest enclosing output cell, and a cell matched by nothing on
/// the other side forces the unchanged relation there.
struct MergeCellsOp<'a, V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    factory: &'a F,
    left_scalar: &'a mut S,
    right_scalar: &'a mut S,
    _vars: PhantomData<fn() -> (V, M)>,
}

impl<'a, V, M, S, F> MergeOperator<CellSet<V, M>> for MergeCellsOp<'a, V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    fn apply(&mut self, left: &CellSet<V, M>, right: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        let base = left
            .iter()
            .next()
            .or_else(|| right.iter().next())
            .expect("cell sets are never empty")
            .base
            .clone();
        let mut result: CellSet<V, M> = CellSet::new();
        result.extend(inputs(left).cloned());
        result.extend(inputs(right).cloned());

        let left_out: Vec<&SummaryCell<V, M>> = outputs(left).collect();
        let right_out: Vec<&SummaryCell<V, M>> = outputs(right).collect();
        let mut i = 0;
        let mut j = 0;
        while i < left_out.len() && j < right_out.len() {
            let lc = left_out[i];
            let rc = right_out[j];
            if lc == rc {
                result.insert(lc.clone());
                i += 1;
                j += 1;
            } else if lc.overlaps(rc) {
                // Merge the whole overlapping run into one covering cell.
                let mut range = lc.range().join(&rc.range());
                i += 1;
                j += 1;
                loop {
                    if i < left_out.len() && left_out[i].overlaps_range(&range) {
                        range = range.join(&left_out[i].range());
                        i += 1;
                    } else if j < right_out.len() && right_out[j].overlaps_range(&range) {
                        range = range.join(&right_out[j].range());
                        j += 1;
                    } else {
                        break;
                    }
                }
                result.insert(SummaryCell::from_range(
                    self.factory,
                    base.clone(),
                    &range,
                    CellKind::Output,
                ));
            } else if lc.offset < rc.offset {
                result.insert(lc.clone());
                let twin = add_unchanged_relation(self.factory, lc, self.right_scalar);
                result.insert(twin);
                i += 1;
            } else {
                result.insert(rc.clone());
                let twin = add_unchanged_relation(self.factory, rc, self.left_scalar);
                result.insert(twin);
                j += 1;
            }
        }
        for lc in &left_out[i..] {
            result.insert((*lc).clone());
            let twin = add_unchanged_relation(self.factory, lc, self.right_scalar);
            result.insert(twin);
        }
        for rc in &right_out[j..] {
            result.insert((*rc).clone());
            let twin = add_unchanged_relation(self.factory, rc, self.left_scalar);
            result.insert(twin);
        }
        Some(result)
    }

    fn apply_left(&mut self, left: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        let mut result = left.clone();
        for c in outputs(left) {
            let twin = add_unchanged_relation(self.factory, c, self.right_scalar);
            result.insert(twin);
        }
        Some(result)
    }

    fn apply_right(&mut self, right: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        let mut result = right.clone();
        for c in outputs(right) {
            let twin = add_unchanged_relation(self.factory, c, self.left_scalar);
            result.insert(twin);
        }
        Some(result)
    }

    fn default_is_absorbing(&self) -> bool {
        false
    }
}

impl<V, M, S, F> SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    /// Merge the cell maps of two summaries, preparing both scalar states.
    fn merge_cells(
        &self,
        other: &Self,
        left_scalar: &mut S,
        right_scalar: &mut S,
    ) -> PatriciaTreeMap<M, CellSet<V, M>> {
        let mut op = MergeCellsOp {
            factory: &self.factory,
            left_scalar,
            right_scalar,
            _vars: PhantomData,
        };
        self.cells.merge_with(&other.cells, &mut op)
    }

    fn merge(
        &self,
        other: &Self,
        combine_scalar: impl Fn(&S, &S) -> S,
        combine_lifetime: impl Fn(&LifetimeDomain<M>, &LifetimeDomain<M>) -> LifetimeDomain<M>,
    ) -> Self {
        if self.is_top() || other.is_top() {
            let mut top = self.clone();
            top.set_to_top();
            return top;
        }
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let mut left_scalar = self.scalar.clone();
        let mut right_scalar = other.scalar.clone();
        let cells = self.merge_cells(other, &mut left_scalar, &mut right_scalar);
        Self {
            is_top: false,
            cells,
            scalar: combine_scalar(&left_scalar, &right_scalar),
            lifetime: combine_lifetime(&self.lifetime, &other.lifetime),
            factory: self.factory.clone(),
            _vars: PhantomData,
        }
    }

    /// Summary of "run `self`'s body, then `other`'s body".
    ///
    /// Callee input cells that exactly match a caller output cell read the
    /// caller's write: both are equated to a fresh temporary that survives
    /// into the meet of the scalar states. Callee outputs win over caller
    /// outputs wherever they overlap.
    pub fn compose(&self, other: &Self) -> Self {
        if self.is_top() || other.is_top() {
            let mut top = self.clone();
            top.set_to_top();
            return top;
        }
        if self.is_bottom() || other.is_bottom() {
            let mut bottom = self.clone();
            bottom.set_to_bottom();
            return bottom;
        }
        let mut left_scalar = self.scalar.clone();
        let mut right_scalar = other.scalar.clone();
        let mut tmp_vars: Vec<V> = Vec::new();
        let mut op = ComposeCellsOp {
            factory: &self.factory,
            left_scalar: &mut left_scalar,
            right_scalar: &mut right_scalar,
            tmp_vars: &mut tmp_vars,
            _vars: PhantomData,
        };
        let cells = self.cells.merge_with(&other.cells, &mut op);
        let mut scalar = left_scalar.meet(&right_scalar);
        for tmp in &tmp_vars {
            scalar.int_forget(tmp);
        }
        Self {
            is_top: false,
            cells,
            scalar,
            lifetime: self.lifetime.meet(&other.lifetime),
            factory: self.factory.clone(),
            _vars: PhantomData,
        }
    }
}

/// The caller/callee cell walk of summary composition.
struct ComposeCellsOp<'a, V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    factory: &'a F,
    left_scalar: &'a mut S,
    right_scalar: &'a mut S,
    tmp_vars: &'a mut Vec<V>,
    _vars: PhantomData<fn() -> (V, M)>,
}

impl<'a, V, M, S, F> ComposeCellsOp<'a, V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    fn fresh_tmp(&mut self, like: &V) -> V {
        let tmp = self
            .factory
            .tmp_var(like.bit_width(), like.sign());
        self.tmp_vars.push(tmp.clone());
        tmp
    }
}

impl<'a, V, M, S, F> MergeOperator<CellSet<V, M>> for ComposeCellsOp<'a, V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M>,
{
    fn apply(&mut self, left: &CellSet<V, M>, right: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        let base = left
            .iter()
            .next()
            .or_else(|| right.iter().next())
            .expect("cell sets are never empty")
            .base
            .clone();
        let mut result: CellSet<V, M> = CellSet::new();

        // 1. Caller input cells describe the true pre-state.
        result.extend(inputs(left).cloned());

        // 2. Match callee input cells against caller output cells.
        let left_out: Vec<&SummaryCell<V, M>> = outputs(left).collect();
        let mut lo = 0;
        for rin in inputs(right) {
            while lo < left_out.len() && *left_out[lo].range().ub() < Bound::from(rin.offset.clone())
            {
                lo += 1;
            }
            if lo == left_out.len() {
                // No caller write here: the composed summary still reads
                // the pre-state.
                result.insert(rin.clone());
            } else if rin.range() == left_out[lo].range() {
                // The callee reads exactly what the caller wrote: equate
                // both through a temporary and retire the callee cell.
                let tmp = self.fresh_tmp(&rin.scalar_var);
                self.left_scalar
                    .dynamic_write_int_var(&tmp, &left_out[lo].scalar_var);
                self.right_scalar
                    .dynamic_write_int_var(&tmp, &rin.scalar_var);
                self.right_scalar.dynamic_forget(&rin.scalar_var);
            } else if rin.overlaps(left_out[lo]) {
                // Partial overlap: the callee's view of the pre-state is
                // unknown.
                self.right_scalar.dynamic_forget(&rin.scalar_var);
            } else {
                result.insert(rin.clone());
            }
        }

        // 3. Callee output cells are the final values.
        result.extend(outputs(right).cloned());

        // 4. Caller output cells survive only outside callee outputs.
        let right_out: Vec<&SummaryCell<V, M>> = outputs(right).collect();
        let mut ro = 0;
        for lc in &left_out {
            while ro < right_out.len()
                && *right_out[ro].range().ub() < Bound::from(lc.offset.clone())
            {
                ro += 1;
            }
            if ro == right_out.len() {
                result.insert((*lc).clone());
                continue;
            }
            if !lc.overlaps(right_out[ro]) {
                result.insert((*lc).clone());
                continue;
            }
            // The callee overwrote part of this cell; keep the remainder.
            self.left_scalar.dynamic_forget(&lc.scalar_var);
            let mut range = lc.range();
            let mut k = ro;
            while !range.is_bottom() && k < right_out.len() && right_out[k].overlaps_range(&range) {
                let meet = range.meet(&right_out[k].range());
                let before = Interval::new(range.lb().clone(), meet.lb() - &Bound::one());
                if !before.is_bottom() {
                    result.insert(SummaryCell::from_range(
                        self.factory,
                        base.clone(),
                        &before,
                        CellKind::Output,
                    ));
                }
                if meet.ub().is_finite() {
                    range = Interval::new(meet.ub() + &Bound::one(), range.ub().clone());
                } else {
                    range = Interval::bottom();
                }
                if !range.is_bottom() {
                    k += 1;
                }
            }
            if !range.is_bottom() {
                result.insert(SummaryCell::from_range(
                    self.factory,
                    base.clone(),
                    &range,
                    CellKind::Output,
                ));
            }
        }

        Some(result)
    }

    fn apply_left(&mut self, left: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        Some(left.clone())
    }

    fn apply_right(&mut self, right: &CellSet<V, M>) -> Option<CellSet<V, M>> {
        Some(right.clone())
    }

    fn default_is_absorbing(&self) -> bool {
        false
    }
}

impl<V, M, S, F> AbstractDomain for SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn bottom() -> Self {
        let mut d = Self::unchanged(F::default());
        d.scalar = S::bottom();
        d.lifetime = LifetimeDomain::bottom();
        d
    }

    /// Top: anything may have changed.
    fn top() -> Self {
        let mut d = Self::unchanged(F::default());
        d.is_top = true;
        d
    }

    fn is_bottom(&self) -> bool {
        !self.is_top && (self.scalar.is_bottom() || self.lifetime.is_bottom())
    }

    fn is_top(&self) -> bool {
        self.is_top
    }

    fn set_to_bottom(&mut self) {
        self.is_top = false;
        self.cells = PatriciaTreeMap::new();
        self.scalar.set_to_bottom();
        self.lifetime.set_to_bottom();
    }

    fn set_to_top(&mut self) {
        self.is_top = true;
        self.cells = PatriciaTreeMap::new();
        self.scalar.set_to_top();
        self.lifetime.set_to_top();
    }

    fn leq(&self, other: &Self) -> bool {
        if other.is_top() {
            return true;
        }
        if self.is_top() {
            return false;
        }
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        // Where one side has an output cell and the other does not, the
        // other is implicitly unchanged there; make that explicit before
        // comparing the scalar states.
        let mut left_scalar = self.scalar.clone();
        let mut right_scalar = other.scalar.clone();
        let bases: BTreeSet<M> = self
            .cells
            .keys()
            .chain(other.cells.keys())
            .cloned()
            .collect();
        for base in &bases {
            let left_set = self.cells_of(base);
            let right_set = other.cells_of(base);
            let left_out: Vec<&SummaryCell<V, M>> = outputs(&left_set).collect();
            let right_out: Vec<&SummaryCell<V, M>> = outputs(&right_set).collect();
            let mut i = 0;
            let mut j = 0;
            while i < left_out.len() && j < right_out.len() {
                let lc = left_out[i];
                let rc = right_out[j];
                if lc == rc {
                    i += 1;
                    j += 1;
                } else if lc.overlaps(rc) {
                    // Differently shaped writes over the same bytes are
                    // incomparable.
                    return false;
                } else if lc.offset < rc.offset {
                    add_unchanged_relation(&self.factory, lc, &mut right_scalar);
                    i += 1;
                } else {
                    add_unchanged_relation(&self.factory, rc, &mut left_scalar);
                    j += 1;
                }
            }
            for lc in &left_out[i..] {
                add_unchanged_relation(&self.factory, lc, &mut right_scalar);
            }
            for rc in &right_out[j..] {
                add_unchanged_relation(&self.factory, rc, &mut left_scalar);
            }
        }
        left_scalar.leq(&right_scalar) && self.lifetime.leq(&other.lifetime)
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
        if self.is_top() {
            return other.clone();
        }
        if other.is_top() {
            return self.clone();
        }
        if self.is_bottom() || other.is_bottom() {
            let mut bottom = self.clone();
            bottom.set_to_bottom();
            return bottom;
        }
        self.merge(other, |a, b| a.meet(b), |a, b| a.meet(b))
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_top() {
            return other.clone();
        }
        if other.is_top() {
            return self.clone();
        }
        if self.is_bottom() || other.is_bottom() {
            let mut bottom = self.clone();
            bottom.set_to_bottom();
            return bottom;
        }
        self.merge(other, |a, b| a.narrowing(b), |a, b| a.narrowing(b))
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        let _ = threshold;
        self.narrowing(other)
    }

    fn normalize(&mut self) {
        if self.is_top {
            return;
        }
        self.scalar.normalize();
        if self.scalar.is_bottom() {
            self.set_to_bottom();
        }
    }
}

impl<V, M, S, F> MemoryDomain<V, M> for SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M>,
    F: VariableFactory<V, M> + Default,
{
    fn mem_write(&mut self, p: &V, v: &Literal<V>, size: &MachineInt) {
        if self.is_bottom() || self.is_top {
            return;
        }
        if !self.check_dereference(p) {
            return;
        }
        let addrs = self.scalar.pointer_to_points_to(p);
        if addrs.is_top() {
            self.forget_all_cells();
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
        let single = addrs.size() == Some(1);
        let bases: Vec<M> = addrs.iter().cloned().collect();
        if let Some(o) = offset_intv.singleton().cloned() {
            for base in bases {
                let c = self.realize_single_out_cell(base, o.clone(), size.clone());
                if single {
                    self.strong_update(&c.scalar_var, v);
                } else {
                    self.weak_update(&c.scalar_var, v);
                }
            }
        } else {
            let offset_var = p.offset_var();
            for base in bases {
                let kept = self.realize_range_out_cells(&base, &offset_var, &size);
                for c in kept {
                    self.weak_update(&c.scalar_var, v);
                }
            }
        }
    }

    fn mem_read(&mut self, x: &Literal<V>, p: &V, size: &MachineInt) {
        assert!(x.is_var(), "memory read into a constant");
        if self.is_bottom() || self.is_top {
            if self.is_top {
                if let Some(v) = x.var() {
                    self.scalar.scalar_forget(v);
                }
            }
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
                match self.realize_single_in_cell(base, o.clone(), size.clone()) {
                    Some(c) => {
                        if first {
                            Self::literal_read(&mut self.scalar, x, &c.scalar_var);
                            first = false;
                        } else {
                            let mut updated = self.scalar.clone();
                            Self::literal_read(&mut updated, x, &c.scalar_var);
                            self.scalar = self.scalar.join(&updated);
                        }
                    }
                    None => {
                        if let Some(v) = x.var() {
                            self.scalar.scalar_forget(v);
                        }
                        return;
                    }
                }
            }
        } else if let Some(v) = x.var() {
            self.scalar.scalar_forget(v);
        }
    }

    fn mem_copy(&mut self, dest: &V, src: &V, size: &Literal<V>) {
        if self.is_bottom() || self.is_top {
            return;
        }
        if !self.check_dereference(dest) || !self.check_dereference(src) {
            return;
        }
        let dest_addrs = self.scalar.pointer_to_points_to(dest);
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
        // The copied bytes become output cells with unknown contents.
        self.forget_reachable_cells(dest, Some(&size_intv));
    }

    fn mem_set(&mut self, dest: &V, value: &Literal<V>, size: &Literal<V>) {
        if self.is_bottom() || self.is_top {
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
        let unsafe_range =
            &dest_intv + &Interval::new(Bound::zero(), size_intv.ub() - &Bound::one());
        let single = addrs.size() == Some(1);
        let bases: Vec<M> = addrs.iter().cloned().collect();
        for base in bases {
            for c in outputs(&self.cells_of(&base)).cloned().collect::<Vec<_>>() {
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
            // When nothing is left over the definitely-zeroed range,
            // record the write as one zeroed output cell.
            if !safe_range.is_bottom() {
                let set = self.cells_of(&base);
                if !outputs(&set).any(|c| c.overlaps_range(&safe_range)) {
                    let wide = SummaryCell::from_range(
                        &self.factory,
                        base.clone(),
                        &safe_range,
                        CellKind::Output,
                    );
                    let zero_lit = Literal::MachineInt(MachineInt::zero(
                        wide.scalar_var.bit_width(),
                        wide.scalar_var.sign(),
                    ));
                    let var = wide.scalar_var.clone();
                    self.add_cell(wide);
                    if single {
                        self.strong_update(&var, &zero_lit);
                    } else {
                        self.weak_update(&var, &zero_lit);
                    }
                }
            }
        }
    }

    fn mem_forget_all(&mut self) {
        if self.is_bottom() || self.is_top {
            return;
        }
        self.forget_all_cells();
    }

    fn mem_forget(&mut self, addr: &M) {
        if self.is_bottom() || self.is_top {
            return;
        }
        self.forget_cells_of(addr);
    }

    fn mem_forget_range(&mut self, addr: &M, offset: &IntInterval, size: &MachineInt) {
        if self.is_bottom() || self.is_top {
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
        self.forget_reachable_cells(p, None);
    }

    fn mem_abstract_reachable_size(&mut self, p: &V, size: &MachineInt) {
        self.forget_reachable_cells(p, Some(&Interval::singleton_of(size.to_int())));
    }

    fn mem_zero_reachable(&mut self, p: &V) {
        self.forget_reachable_cells(p, None);
    }

    fn mem_uninitialize_reachable(&mut self, p: &V) {
        self.forget_reachable_cells(p, None);
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

impl<V, M, S, F> fmt::Display for SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M> + fmt::Display,
    F: VariableFactory<V, M> + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top {
            return write!(f, "T");
        }
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        write!(f, "(cells: {{")?;
        let mut first = true;
        for (_, set) in self.cells.iter() {
            for c in set {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{c:?}")?;
                first = false;
            }
        }
        write!(f, "}}, scalar: {})", self.scalar)
    }
}

impl<V, M, S, F> fmt::Debug for SummaryDomain<V, M, S, F>
where
    V: ScalarVariable,
    M: MemoryLocation,
    S: ScalarDomain<V, M> + fmt::Debug,
    F: VariableFactory<V, M> + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryDomain")
            .field("is_top", &self.is_top)
            .field("cells", &self.cells)
            .field("scalar", &self.scalar)
            .finish()
    }
}

// The scalar surface: forwarded to the embedded scalar state. Input and
// output cells only come into play through the mem_* entry points.
impl<V, M, S, F> MachineIntDomain<V> for SummaryDomain<V, M, S, F>
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

impl<V, M, S, F> ScalarDomain<V, M> for SummaryDomain<V, M, S, F>
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
