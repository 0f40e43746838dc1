//! Gauge domain: affine bounds over non-negative loop counters.

use core::fmt;
use std::collections::BTreeMap;

use argus_num::{Bound, Congruence, Int, Interval, IntervalCongruence};
use argus_tree::{PatriciaTreeMap, PatriciaTreeSet};

use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintKind, LinearConstraint, LinearExpression};
use crate::separate::{LatticeValue, SeparateDomain};
use crate::var::Variable;

use super::{NumBinOp, NumOperand, NumericDomain};
use super::value::NumValue;

/// One bound of a gauge: an affine expression over the loop counters, or an
/// infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GaugeBound<V: Variable> {
    MinusInfinity,
    Finite {
        constant: Int,
        /// Non-zero coefficients on counter variables.
        terms: BTreeMap<V, Int>,
    },
    PlusInfinity,
}

impl<V: Variable> GaugeBound<V> {
    pub fn constant(n: impl Into<Int>) -> Self {
        GaugeBound::Finite {
            constant: n.into(),
            terms: BTreeMap::new(),
        }
    }

    pub fn counter(v: V) -> Self {
        Self::term(v, Int::one())
    }

    pub fn term(v: V, coeff: Int) -> Self {
        let mut terms = BTreeMap::new();
        if !coeff.is_zero() {
            terms.insert(v, coeff);
        }
        GaugeBound::Finite {
            constant: Int::zero(),
            terms,
        }
    }

    /// Add two bounds, rounding toward the given infinity on conflict.
    fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (GaugeBound::MinusInfinity, GaugeBound::PlusInfinity)
            | (GaugeBound::PlusInfinity, GaugeBound::MinusInfinity) => {
                panic!("adding -oo and +oo gauge bounds")
            }
            (GaugeBound::MinusInfinity, _) | (_, GaugeBound::MinusInfinity) => {
                GaugeBound::MinusInfinity
            }
            (GaugeBound::PlusInfinity, _) | (_, GaugeBound::PlusInfinity) => {
                GaugeBound::PlusInfinity
            }
            (
                GaugeBound::Finite { constant: c1, terms: t1 },
                GaugeBound::Finite { constant: c2, terms: t2 },
            ) => {
                let mut terms = t1.clone();
                for (v, c) in t2 {
                    let entry = terms.entry(v.clone()).or_insert_with(Int::zero);
                    *entry += c;
                    if entry.is_zero() {
                        terms.remove(v);
                    }
                }
                GaugeBound::Finite {
                    constant: c1 + c2,
                    terms,
                }
            }
        }
    }

    fn scale(&self, factor: &Int) -> Self {
        if factor.is_zero() {
            return GaugeBound::constant(0);
        }
        match self {
            GaugeBound::MinusInfinity => {
                if factor.is_negative() {
                    GaugeBound::PlusInfinity
                } else {
                    GaugeBound::MinusInfinity
                }
            }
            GaugeBound::PlusInfinity => {
                if factor.is_negative() {
                    GaugeBound::MinusInfinity
                } else {
                    GaugeBound::PlusInfinity
                }
            }
            GaugeBound::Finite { constant, terms } => GaugeBound::Finite {
                constant: constant * factor,
                terms: terms
                    .iter()
                    .map(|(v, c)| (v.clone(), c * factor))
                    .collect(),
            },
        }
    }

    /// Substitute `v := v - k`, reflecting an increment of the counter.
    fn shift_counter(&self, v: &V, k: &Int) -> Self {
        match self {
            GaugeBound::Finite { constant, terms } => match terms.get(v) {
                Some(c) => GaugeBound::Finite {
                    constant: constant - &(c * k),
                    terms: terms.clone(),
                },
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Evaluate over counter intervals.
    fn eval(&self, counters: &SeparateDomain<V, Interval>) -> Interval {
        match self {
            GaugeBound::MinusInfinity => {
                Interval::new(Bound::minus_infinity(), Bound::minus_infinity())
            }
            GaugeBound::PlusInfinity => {
                Interval::new(Bound::plus_infinity(), Bound::plus_infinity())
            }
            GaugeBound::Finite { constant, terms } => {
                let mut acc = Interval::singleton_of(constant.clone());
                for (v, c) in terms {
                    let value = counters
                        .get(v)
                        .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
                    acc = &acc + &value.mul(&Interval::singleton_of(c.clone()));
                }
                acc
            }
        }
    }

    /// `self >= other` for every valuation within the counter intervals.
    fn ge(&self, other: &Self, counters: &SeparateDomain<V, Interval>) -> bool {
        match (self, other) {
            (GaugeBound::PlusInfinity, _) | (_, GaugeBound::MinusInfinity) => true,
            (GaugeBound::MinusInfinity, _) | (_, GaugeBound::PlusInfinity) => false,
            _ => {
                let diff = self.add(&other.scale(&-Int::one()));
                *diff.eval(counters).lb() >= Bound::zero()
            }
        }
    }

    /// Coefficient-wise comparison, valid for arbitrary non-negative
    /// counter valuations.
    fn ge_coefficientwise(&self, other: &Self) -> bool {
        match (self, other) {
            (GaugeBound::PlusInfinity, _) | (_, GaugeBound::MinusInfinity) => true,
            (GaugeBound::MinusInfinity, _) | (_, GaugeBound::PlusInfinity) => false,
            (
                GaugeBound::Finite { constant: c1, terms: t1 },
                GaugeBound::Finite { constant: c2, terms: t2 },
            ) => {
                if c1 < c2 {
                    return false;
                }
                let keys: std::collections::BTreeSet<&V> =
                    t1.keys().chain(t2.keys()).collect();
                keys.into_iter().all(|v| {
                    let a = t1.get(v).cloned().unwrap_or_else(Int::zero);
                    let b = t2.get(v).cloned().unwrap_or_else(Int::zero);
                    a >= b
                })
            }
        }
    }
}

impl<V: Variable> fmt::Display for GaugeBound<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GaugeBound::MinusInfinity => write!(f, "-oo"),
            GaugeBound::PlusInfinity => write!(f, "+oo"),
            GaugeBound::Finite { constant, terms } => {
                write!(f, "{constant}")?;
                for (v, c) in terms {
                    if c.is_negative() {
                        write!(f, " - {}*{v}", c.abs())?;
                    } else {
                        write!(f, " + {c}*{v}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// A pair of affine bounds `l <= x <= u` over the loop counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gauge<V: Variable> {
    lb: GaugeBound<V>,
    ub: GaugeBound<V>,
}

impl<V: Variable> Gauge<V> {
    pub fn new(lb: GaugeBound<V>, ub: GaugeBound<V>) -> Self {
        Self { lb, ub }
    }

    pub fn top() -> Self {
        Self {
            lb: GaugeBound::MinusInfinity,
            ub: GaugeBound::PlusInfinity,
        }
    }

    pub fn singleton_of(n: impl Into<Int> + Clone) -> Self {
        Self {
            lb: GaugeBound::constant(n.clone()),
            ub: GaugeBound::constant(n),
        }
    }

    pub fn exactly(b: GaugeBound<V>) -> Self {
        Self {
            lb: b.clone(),
            ub: b,
        }
    }

    pub fn from_interval(i: &Interval) -> Self {
        let lb = match i.lb() {
            Bound::Finite(n) => GaugeBound::constant(n.clone()),
            _ => GaugeBound::MinusInfinity,
        };
        let ub = match i.ub() {
            Bound::Finite(n) => GaugeBound::constant(n.clone()),
            _ => GaugeBound::PlusInfinity,
        };
        Self { lb, ub }
    }

    pub fn lb(&self) -> &GaugeBound<V> {
        &self.lb
    }

    pub fn ub(&self) -> &GaugeBound<V> {
        &self.ub
    }

    fn is_top(&self) -> bool {
        self.lb == GaugeBound::MinusInfinity && self.ub == GaugeBound::PlusInfinity
    }

    fn add(&self, other: &Self) -> Self {
        Self {
            lb: self.lb.add(&other.lb),
            ub: self.ub.add(&other.ub),
        }
    }

    fn scale(&self, factor: &Int) -> Self {
        if factor.is_negative() {
            Self {
                lb: self.ub.scale(factor),
                ub: self.lb.scale(factor),
            }
        } else {
            Self {
                lb: self.lb.scale(factor),
                ub: self.ub.scale(factor),
            }
        }
    }

    fn shift_counter(&self, v: &V, k: &Int) -> Self {
        Self {
            lb: self.lb.shift_counter(v, k),
            ub: self.ub.shift_counter(v, k),
        }
    }

    fn eval(&self, counters: &SeparateDomain<V, Interval>) -> Interval {
        let lb = self.lb.eval(counters);
        let ub = self.ub.eval(counters);
        Interval::new(lb.lb().clone(), ub.ub().clone())
    }
}

impl<V: Variable> fmt::Display for Gauge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lb, self.ub)
    }
}

/// The gauge domain.
///
/// Loop counters are non-negative variables with known increments,
/// declared through the `counter_*` operations; every other variable may
/// carry a [`Gauge`], a pair of affine bounds over those counters. Counter
/// values themselves are tracked as intervals.
pub struct GaugeDomain<V: Variable> {
    is_bottom: bool,
    counters: PatriciaTreeSet<V>,
    counter_bounds: SeparateDomain<V, Interval>,
    gauges: PatriciaTreeMap<V, Gauge<V>>,
}

impl<V: Variable> Clone for GaugeDomain<V> {
    fn clone(&self) -> Self {
        Self {
            is_bottom: self.is_bottom,
            counters: self.counters.clone(),
            counter_bounds: self.counter_bounds.clone(),
            gauges: self.gauges.clone(),
        }
    }
}

impl<V: Variable> GaugeDomain<V> {
    fn is_counter(&self, v: &V) -> bool {
        self.counters.contains(v)
    }

    pub fn gauge(&self, x: &V) -> Gauge<V> {
        self.gauges.get(x).cloned().unwrap_or_else(Gauge::top)
    }

    fn set_gauge(&mut self, x: V, g: Gauge<V>) {
        if g.is_top() {
            self.gauges.remove(&x);
        } else {
            self.gauges.insert(x, g);
        }
    }

    /// Evaluate a linear expression to a gauge under the current state.
    fn eval(&self, e: &LinearExpression<V>) -> Gauge<V> {
        let mut acc = Gauge::singleton_of(e.cst().clone());
        for (v, coeff) in e.terms() {
            let term = if self.is_counter(v) {
                Gauge::exactly(GaugeBound::counter(v.clone())).scale(coeff)
            } else {
                self.gauge(v).scale(coeff)
            };
            acc = acc.add(&term);
        }
        acc
    }

    /// Drop a counter from every gauge, replacing its contribution by its
    /// current interval.
    fn eliminate_counter(&mut self, v: &V) {
        let bounds = self
            .counter_bounds
            .get(v)
            .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
        let gauges = self.gauges.clone();
        for (x, g) in gauges.iter() {
            let relevant = |b: &GaugeBound<V>| match b {
                GaugeBound::Finite { terms, .. } => terms.contains_key(v),
                _ => false,
            };
            if !relevant(&g.lb) && !relevant(&g.ub) {
                continue;
            }
            let eliminate = |b: &GaugeBound<V>, lower: bool| -> GaugeBound<V> {
                match b {
                    GaugeBound::Finite { constant, terms } if terms.contains_key(v) => {
                        let c = &terms[v];
                        let contribution =
                            bounds.mul(&Interval::singleton_of(c.clone()));
                        let picked = if lower {
                            contribution.lb().clone()
                        } else {
                            contribution.ub().clone()
                        };
                        let mut terms = terms.clone();
                        terms.remove(v);
                        match picked {
                            Bound::Finite(n) => GaugeBound::Finite {
                                constant: constant + &n,
                                terms,
                            },
                            Bound::MinusInfinity => GaugeBound::MinusInfinity,
                            Bound::PlusInfinity => GaugeBound::PlusInfinity,
                        }
                    }
                    _ => b.clone(),
                }
            };
            let new = Gauge {
                lb: eliminate(&g.lb, true),
                ub: eliminate(&g.ub, false),
            };
            self.set_gauge(x.clone(), new);
        }
    }

    fn operand_interval(&self, o: &NumOperand<V>) -> Interval {
        match o {
            NumOperand::Var(v) => self.to_interval(v),
            NumOperand::Const(n) => Interval::singleton_of(n.clone()),
        }
    }

    /// A counter whose value is pinned to two different constants on the
    /// two sides; the axis along which bounds can be interpolated.
    fn interpolation_axis(&self, other: &Self) -> Option<(V, Int, Int)> {
        for k in self.counters.union(&other.counters).iter() {
            let a1 = self.counter_bounds.get(k);
            let a2 = other.counter_bounds.get(k);
            if let (Some(a1), Some(a2)) = (a1.singleton(), a2.singleton()) {
                if a1 != a2 {
                    return Some((k.clone(), a1.clone(), a2.clone()));
                }
            }
        }
        None
    }

    /// Join two upper (or lower) gauge bounds: keep the larger comparable
    /// bound, interpolate along a counter axis when the bounds differ only
    /// in their constant, and fall back to the constant hull.
    fn join_bound(
        &self,
        other: &Self,
        b1: &GaugeBound<V>,
        b2: &GaugeBound<V>,
        axis: &Option<(V, Int, Int)>,
        upper: bool,
    ) -> GaugeBound<V> {
        let (hi, lo) = if b1.ge_coefficientwise(b2) {
            if b2.ge_coefficientwise(b1) {
                // Equal bounds.
                return b1.clone();
            }
            (b1, b2)
        } else if b2.ge_coefficientwise(b1) {
            (b2, b1)
        } else {
            return self.hull_bound(other, b1, b2, upper);
        };
        // Comparable but unequal: interpolation along a pinned counter can
        // keep the bound affine instead of jumping to the hull.
        if let (
            Some((k, a1, a2)),
            GaugeBound::Finite { constant: c1, terms: t1 },
            GaugeBound::Finite { constant: c2, terms: t2 },
        ) = (axis, b1, b2)
        {
            if t1 == t2 && !t1.contains_key(k) {
                let delta_c = c2 - c1;
                let delta_a = a2 - a1;
                let slope = if upper {
                    delta_c.div_ceil(&delta_a)
                } else {
                    delta_c.div_floor(&delta_a)
                };
                // b(k) = c1 - slope*a1 + slope*k passes through both
                // sections; check it on both sides before adopting it.
                let mut terms = t1.clone();
                if !slope.is_zero() {
                    terms.insert(k.clone(), slope.clone());
                }
                let candidate = GaugeBound::Finite {
                    constant: c1 - &(&slope * a1),
                    terms,
                };
                let sound = if upper {
                    candidate.ge(b1, &self.counter_bounds)
                        && candidate.ge(b2, &other.counter_bounds)
                } else {
                    b1.ge(&candidate, &self.counter_bounds)
                        && b2.ge(&candidate, &other.counter_bounds)
                };
                if sound {
                    return candidate;
                }
            }
        }
        if upper {
            hi.clone()
        } else {
            lo.clone()
        }
    }

    /// Constant hull of two bounds, evaluated under each side's counters.
    fn hull_bound(
        &self,
        other: &Self,
        b1: &GaugeBound<V>,
        b2: &GaugeBound<V>,
        upper: bool,
    ) -> GaugeBound<V> {
        let hull = b1
            .eval(&self.counter_bounds)
            .join(&b2.eval(&other.counter_bounds));
        let picked = if upper { hull.ub() } else { hull.lb() };
        match picked {
            Bound::Finite(n) => GaugeBound::constant(n.clone()),
            Bound::PlusInfinity => GaugeBound::PlusInfinity,
            Bound::MinusInfinity => GaugeBound::MinusInfinity,
        }
    }

    fn gauge_join(&self, other: &Self, g1: &Gauge<V>, g2: &Gauge<V>) -> Gauge<V> {
        let axis = self.interpolation_axis(other);
        Gauge {
            lb: self.join_bound(other, &g1.lb, &g2.lb, &axis, false),
            ub: self.join_bound(other, &g1.ub, &g2.ub, &axis, true),
        }
    }
}

impl<V: Variable> AbstractDomain for GaugeDomain<V> {
    fn bottom() -> Self {
        Self {
            is_bottom: true,
            counters: PatriciaTreeSet::new(),
            counter_bounds: SeparateDomain::bottom(),
            gauges: PatriciaTreeMap::new(),
        }
    }

    fn top() -> Self {
        Self {
            is_bottom: false,
            counters: PatriciaTreeSet::new(),
            counter_bounds: SeparateDomain::top(),
            gauges: PatriciaTreeMap::new(),
        }
    }

    fn is_bottom(&self) -> bool {
        self.is_bottom || self.counter_bounds.is_bottom()
    }

    fn is_top(&self) -> bool {
        !self.is_bottom() && self.gauges.is_empty() && self.counter_bounds.is_top()
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
        if !self.counter_bounds.leq(&other.counter_bounds) {
            return false;
        }
        // Every gauge of `other` must contain the corresponding gauge of
        // `self`, evaluated under self's counter ranges.
        other.gauges.iter().all(|(x, og)| {
            let sg = self.gauge(x);
            sg.lb.ge(&og.lb, &self.counter_bounds) && og.ub.ge(&sg.ub, &self.counter_bounds)
        })
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let gauges = self.gauges.intersect_with(&other.gauges, |g1, g2| {
            let j = self.gauge_join(other, g1, g2);
            (!j.is_top()).then_some(j)
        });
        Self {
            is_bottom: false,
            counters: self.counters.union(&other.counters),
            counter_bounds: self.counter_bounds.join(&other.counter_bounds),
            gauges,
        }
    }

    fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let counter_bounds = self.counter_bounds.widening(&other.counter_bounds);
        let gauges = self.gauges.intersect_with(&other.gauges, |g1, g2| {
            // Keep bounds that did not grow; extrapolate the others in the
            // counter direction.
            let lb = if g2.lb.ge_coefficientwise(&g1.lb) {
                g1.lb.clone()
            } else {
                GaugeBound::MinusInfinity
            };
            let ub = if g1.ub.ge_coefficientwise(&g2.ub) {
                g1.ub.clone()
            } else {
                GaugeBound::PlusInfinity
            };
            let g = Gauge { lb, ub };
            (!g.is_top()).then_some(g)
        });
        Self {
            is_bottom: false,
            counters: self.counters.union(&other.counters),
            counter_bounds,
            gauges,
        }
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        let mut widened = self.widening(other);
        widened.counter_bounds = self
            .counter_bounds
            .widening_threshold(&other.counter_bounds, threshold);
        widened
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let counter_bounds = self.counter_bounds.meet(&other.counter_bounds);
        if counter_bounds.is_bottom() {
            return Self::bottom();
        }
        // Keep the tighter gauge where both sides constrain a variable;
        // a coefficient-wise comparison decides, otherwise keep self.
        let gauges = self.gauges.join_with(&other.gauges, |g1, g2| {
            let lb = if g1.lb.ge_coefficientwise(&g2.lb) {
                g1.lb.clone()
            } else {
                g2.lb.clone()
            };
            let ub = if g2.ub.ge_coefficientwise(&g1.ub) {
                g1.ub.clone()
            } else {
                g2.ub.clone()
            };
            Some(Gauge { lb, ub })
        });
        Self {
            is_bottom: false,
            counters: self.counters.union(&other.counters),
            counter_bounds,
            gauges,
        }
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let counter_bounds = self.counter_bounds.narrowing(&other.counter_bounds);
        // Refine only unconstrained bounds.
        let gauges = self.gauges.join_with(&other.gauges, |g1, g2| {
            let lb = if g1.lb == GaugeBound::MinusInfinity {
                g2.lb.clone()
            } else {
                g1.lb.clone()
            };
            let ub = if g1.ub == GaugeBound::PlusInfinity {
                g2.ub.clone()
            } else {
                g1.ub.clone()
            };
            Some(Gauge { lb, ub })
        });
        Self {
            is_bottom: false,
            counters: self.counters.union(&other.counters),
            counter_bounds,
            gauges,
        }
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        // Same fallback as the octagon: no per-constraint tightening yet.
        let _ = threshold;
        self.narrowing(other)
    }
}

impl<V: Variable> NumericDomain<V> for GaugeDomain<V> {
    fn assign(&mut self, x: &V, e: &LinearExpression<V>) {
        if self.is_bottom() {
            return;
        }
        if self.is_counter(x) {
            // Counters are driven by the counter operations; a direct
            // assignment retires the counter role.
            self.counter_forget(x);
        }
        let g = self.eval(e);
        self.set_gauge(x.clone(), g);
    }

    fn apply(&mut self, op: NumBinOp, x: &V, y: &NumOperand<V>, z: &NumOperand<V>) {
        if self.is_bottom() {
            return;
        }
        match (op, y, z) {
            (NumBinOp::Add, NumOperand::Var(y), NumOperand::Const(c))
            | (NumBinOp::Add, NumOperand::Const(c), NumOperand::Var(y)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_constant(c);
                self.assign(x, &e);
            }
            (NumBinOp::Add, NumOperand::Var(y), NumOperand::Var(z)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_term(z.clone(), Int::one());
                self.assign(x, &e);
            }
            (NumBinOp::Sub, NumOperand::Var(y), NumOperand::Const(c)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_constant(&-c.clone());
                self.assign(x, &e);
            }
            (NumBinOp::Sub, NumOperand::Var(y), NumOperand::Var(z)) => {
                let mut e = LinearExpression::var(y.clone());
                e.add_term(z.clone(), -Int::one());
                self.assign(x, &e);
            }
            _ => {
                let vy = self.operand_interval(y);
                let vz = self.operand_interval(z);
                let value = <Interval as NumValue>::apply(op, &vy, &vz);
                if value.is_bottom() {
                    self.set_to_bottom();
                    return;
                }
                if self.is_counter(x) {
                    self.counter_forget(x);
                }
                self.set_gauge(x.clone(), Gauge::from_interval(&value));
            }
        }
    }

    fn add_constraint(&mut self, cst: &LinearConstraint<V>) {
        if self.is_bottom() {
            return;
        }
        if let Some(decided) = cst.constant_value() {
            if !decided {
                self.set_to_bottom();
            }
            return;
        }
        if cst.kind() == ConstraintKind::Disequation {
            return;
        }
        // Interval-level propagation on each variable.
        let e = cst.expression();
        let vars: Vec<V> = e.vars().cloned().collect();
        for x in &vars {
            let a = e.coefficient(x);
            let mut rest = Interval::singleton_of(-e.cst().clone());
            for (v, coeff) in e.terms() {
                if v == x {
                    continue;
                }
                rest = &rest
                    - &self
                        .to_interval(v)
                        .mul(&Interval::singleton_of(coeff.clone()));
            }
            let solution = match cst.kind() {
                ConstraintKind::Equality => {
                    let lb = rest.lb().div_ceil(&a);
                    let ub = rest.ub().div_floor(&a);
                    if a.is_negative() {
                        Interval::new(ub, lb)
                    } else {
                        Interval::new(lb, ub)
                    }
                }
                _ => {
                    if a.is_negative() {
                        Interval::new(rest.ub().div_ceil(&a), Bound::plus_infinity())
                    } else {
                        Interval::new(Bound::minus_infinity(), rest.ub().div_floor(&a))
                    }
                }
            };
            let refined = self.to_interval(x).meet(&solution);
            if refined.is_bottom() {
                self.set_to_bottom();
                return;
            }
            if self.is_counter(x) {
                self.counter_bounds.refine(
                    x.clone(),
                    refined.meet(&Interval::new(Bound::zero(), Bound::plus_infinity())),
                );
            } else {
                // Meet with the constant gauge; keep the affine bounds when
                // they are at least as tight.
                let current = self.gauge(x);
                let constant = Gauge::from_interval(&refined);
                let lb = if current.lb.ge(&constant.lb, &self.counter_bounds) {
                    current.lb.clone()
                } else {
                    constant.lb
                };
                let ub = if constant.ub.ge(&current.ub, &self.counter_bounds) {
                    current.ub.clone()
                } else {
                    constant.ub
                };
                self.set_gauge(x.clone(), Gauge { lb, ub });
            }
        }
    }

    fn set(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom() {
            return;
        }
        if value.is_bottom() {
            self.set_to_bottom();
            return;
        }
        if self.is_counter(x) {
            self.counter_forget(x);
        }
        self.set_gauge(x.clone(), Gauge::from_interval(value.interval()));
    }

    fn refine(&mut self, x: &V, value: &IntervalCongruence) {
        if self.is_bottom() {
            return;
        }
        let refined = self.to_interval(x).meet(value.interval());
        if refined.is_bottom() {
            self.set_to_bottom();
            return;
        }
        if self.is_counter(x) {
            self.counter_bounds.refine(x.clone(), refined);
        } else {
            self.set_gauge(x.clone(), Gauge::from_interval(&refined));
        }
    }

    fn forget(&mut self, x: &V) {
        if self.is_bottom() {
            return;
        }
        if self.is_counter(x) {
            self.counter_forget(x);
        } else {
            self.gauges.remove(x);
        }
    }

    fn to_interval(&self, x: &V) -> Interval {
        if self.is_bottom() {
            return Interval::bottom();
        }
        if self.is_counter(x) {
            return self
                .counter_bounds
                .get(x)
                .meet(&Interval::new(Bound::zero(), Bound::plus_infinity()));
        }
        self.gauge(x).eval(&self.counter_bounds)
    }

    fn to_congruence(&self, x: &V) -> Congruence {
        if self.is_bottom() {
            return Congruence::bottom();
        }
        match self.to_interval(x).singleton() {
            Some(n) => Congruence::singleton_of(n.clone()),
            None => Congruence::top(),
        }
    }

    fn counter_mark(&mut self, x: &V) {
        if self.is_bottom() {
            return;
        }
        self.counters.insert(x.clone());
        self.gauges.remove(x);
        self.counter_bounds.refine(
            x.clone(),
            Interval::new(Bound::zero(), Bound::plus_infinity()),
        );
    }

    fn counter_unmark(&mut self, x: &V) {
        self.counter_forget(x);
    }

    fn counter_init(&mut self, x: &V, c: &Int) {
        if self.is_bottom() {
            return;
        }
        assert!(c.is_non_negative(), "counter initialized negative");
        if !self.is_counter(x) {
            self.counter_mark(x);
        }
        self.counter_bounds
            .set(x.clone(), Interval::singleton_of(c.clone()));
    }

    fn counter_incr(&mut self, x: &V, k: &Int) {
        if self.is_bottom() {
            return;
        }
        assert!(k.is_non_negative(), "counter increment is negative");
        assert!(self.is_counter(x), "increment of an undeclared counter");
        // Every affine bound mentioning the counter shifts by -coeff*k,
        // keeping the invariant relative to the new counter value.
        let gauges = self.gauges.transform(|_, g| Some(g.shift_counter(x, k)));
        self.gauges = gauges;
        let shifted = &self.counter_bounds.get(x) + &Interval::singleton_of(k.clone());
        self.counter_bounds.set(x.clone(), shifted);
    }

    fn counter_forget(&mut self, x: &V) {
        if self.is_bottom() {
            return;
        }
        if self.is_counter(x) {
            self.eliminate_counter(x);
            self.counters.remove(x);
        }
        self.counter_bounds.forget(x);
        self.gauges.remove(x);
    }
}

impl<V: Variable> fmt::Display for GaugeDomain<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        write!(f, "{{")?;
        let mut first = true;
        for (x, g) in self.gauges.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{x} in {g}")?;
            first = false;
        }
        for v in self.counters.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "counter {v} in {}", self.counter_bounds.get(v))?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl<V: Variable> fmt::Debug for GaugeDomain<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = GaugeDomain<u64>;

    const X: u64 = 1;
    const I: u64 = 10;
    const K: u64 = 11;

    #[test]
    fn counter_relative_bound() {
        let mut d = D::top();
        d.counter_init(&I, &Int::zero());
        // x := 2*i + 1
        let mut e = LinearExpression::term(I, 2);
        e.add_constant(&Int::one());
        d.assign(&X, &e);
        assert_eq!(d.to_interval(&X), Interval::new(1, 1));

        // After i += 1, the gauge shifts: x = 2*i - 1 relative to the new i.
        d.counter_incr(&I, &Int::one());
        assert_eq!(d.to_interval(&I), Interval::new(1, 1));
        assert_eq!(d.to_interval(&X), Interval::new(1, 1));
    }

    #[test]
    fn loop_invariant_synthesis() {
        // i := 0; x := 0; loop { x += 2; i += 1 }
        let mut d = D::top();
        d.counter_init(&I, &Int::zero());
        d.assign(&X, &LinearExpression::constant(0));

        // One loop iteration:
        let mut body = d.clone();
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::from(2));
        body.assign(&X, &e);
        body.counter_incr(&I, &Int::one());

        let joined = d.join(&body);
        // Interpolation along i recovers the exact relation x = 2i.
        let g = joined.gauge(&X);
        assert_eq!(g.lb(), &GaugeBound::term(I, Int::from(2)));
        assert_eq!(g.ub(), &GaugeBound::term(I, Int::from(2)));
        assert_eq!(joined.to_interval(&X), Interval::new(0, 2));
    }

    #[test]
    fn counter_forget_uses_range() {
        let mut d = D::top();
        d.counter_init(&K, &Int::from(3));
        // x := k
        d.assign(&X, &LinearExpression::var(K));
        d.counter_forget(&K);
        assert_eq!(d.to_interval(&X), Interval::new(3, 3));
    }

    #[test]
    fn widening_extrapolates() {
        let mut a = D::top();
        a.counter_init(&I, &Int::zero());
        a.assign(&X, &LinearExpression::constant(0));
        let mut b = a.clone();
        let mut e = LinearExpression::var(X);
        e.add_constant(&Int::one());
        b.assign(&X, &e);
        let w = a.widening(&b);
        let g = w.gauge(&X);
        assert_eq!(g.lb(), &GaugeBound::constant(0));
        assert_eq!(g.ub(), &GaugeBound::PlusInfinity);
    }
}
