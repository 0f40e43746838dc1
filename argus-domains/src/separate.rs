//! Pointwise lifting of a value lattice over variables.

use core::fmt;

use argus_num::{Congruence, Int, Interval, IntervalCongruence};
use argus_tree::PatriciaTreeMap;

use crate::var::Variable;

/// A value lattice suitable for pointwise lifting.
///
/// Top values are never stored in the environment; a bottom value anywhere
/// makes the whole environment bottom.
pub trait LatticeValue: Clone + PartialEq {
    fn top() -> Self;
    fn bottom() -> Self;
    fn is_top(&self) -> bool;
    fn is_bottom(&self) -> bool;
    fn leq(&self, other: &Self) -> bool;
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;

    fn widening(&self, other: &Self) -> Self {
        self.join(other)
    }

    fn widening_threshold(&self, other: &Self, _threshold: &Int) -> Self {
        self.widening(other)
    }

    fn narrowing(&self, other: &Self) -> Self {
        self.meet(other)
    }

    fn narrowing_threshold(&self, other: &Self, _threshold: &Int) -> Self {
        self.narrowing(other)
    }
}

impl LatticeValue for Interval {
    fn top() -> Self {
        Interval::top()
    }

    fn bottom() -> Self {
        Interval::bottom()
    }

    fn is_top(&self) -> bool {
        Interval::is_top(self)
    }

    fn is_bottom(&self) -> bool {
        Interval::is_bottom(self)
    }

    fn leq(&self, other: &Self) -> bool {
        Interval::leq(self, other)
    }

    fn join(&self, other: &Self) -> Self {
        Interval::join(self, other)
    }

    fn meet(&self, other: &Self) -> Self {
        Interval::meet(self, other)
    }

    fn widening(&self, other: &Self) -> Self {
        Interval::widening(self, other)
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Interval::widening_threshold(self, other, threshold)
    }

    fn narrowing(&self, other: &Self) -> Self {
        Interval::narrowing(self, other)
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Interval::narrowing_threshold(self, other, threshold)
    }
}

impl LatticeValue for Congruence {
    fn top() -> Self {
        Congruence::top()
    }

    fn bottom() -> Self {
        Congruence::bottom()
    }

    fn is_top(&self) -> bool {
        Congruence::is_top(self)
    }

    fn is_bottom(&self) -> bool {
        Congruence::is_bottom(self)
    }

    fn leq(&self, other: &Self) -> bool {
        Congruence::leq(self, other)
    }

    fn join(&self, other: &Self) -> Self {
        Congruence::join(self, other)
    }

    fn meet(&self, other: &Self) -> Self {
        Congruence::meet(self, other)
    }

    fn widening(&self, other: &Self) -> Self {
        Congruence::widening(self, other)
    }

    fn narrowing(&self, other: &Self) -> Self {
        Congruence::narrowing(self, other)
    }
}

impl LatticeValue for IntervalCongruence {
    fn top() -> Self {
        IntervalCongruence::top()
    }

    fn bottom() -> Self {
        IntervalCongruence::bottom()
    }

    fn is_top(&self) -> bool {
        IntervalCongruence::is_top(self)
    }

    fn is_bottom(&self) -> bool {
        IntervalCongruence::is_bottom(self)
    }

    fn leq(&self, other: &Self) -> bool {
        IntervalCongruence::leq(self, other)
    }

    fn join(&self, other: &Self) -> Self {
        IntervalCongruence::join(self, other)
    }

    fn meet(&self, other: &Self) -> Self {
        IntervalCongruence::meet(self, other)
    }

    fn widening(&self, other: &Self) -> Self {
        IntervalCongruence::widening(self, other)
    }

    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        IntervalCongruence::widening_threshold(self, other, threshold)
    }

    fn narrowing(&self, other: &Self) -> Self {
        IntervalCongruence::narrowing(self, other)
    }
}

/// Environment mapping variables to lattice values, pointwise.
///
/// Bindings to top are dropped, so the empty environment is top. A single
/// bottom value collapses the whole environment; the canonical bottom has
/// an empty map and the flag set.
pub struct SeparateDomain<V: Variable, L: LatticeValue> {
    is_bottom: bool,
    map: PatriciaTreeMap<V, L>,
}

impl<V: Variable, L: LatticeValue> Clone for SeparateDomain<V, L> {
    fn clone(&self) -> Self {
        Self {
            is_bottom: self.is_bottom,
            map: self.map.clone(),
        }
    }
}

impl<V: Variable, L: LatticeValue> Default for SeparateDomain<V, L> {
    fn default() -> Self {
        Self::top()
    }
}

impl<V: Variable, L: LatticeValue> SeparateDomain<V, L> {
    pub fn top() -> Self {
        Self {
            is_bottom: false,
            map: PatriciaTreeMap::new(),
        }
    }

    pub fn bottom() -> Self {
        Self {
            is_bottom: true,
            map: PatriciaTreeMap::new(),
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    pub fn is_top(&self) -> bool {
        !self.is_bottom && self.map.is_empty()
    }

    pub fn set_to_bottom(&mut self) {
        *self = Self::bottom();
    }

    pub fn set_to_top(&mut self) {
        *self = Self::top();
    }

    /// The value of `v`; top if unbound.
    pub fn get(&self, v: &V) -> L {
        if self.is_bottom {
            return L::bottom();
        }
        self.map.get(v).cloned().unwrap_or_else(L::top)
    }

    /// Bind `v` to `value`, collapsing to bottom on a bottom value.
    pub fn set(&mut self, v: V, value: L) {
        if self.is_bottom {
            return;
        }
        if value.is_bottom() {
            self.set_to_bottom();
        } else if value.is_top() {
            self.map.remove(&v);
        } else {
            self.map.insert(v, value);
        }
    }

    /// Meet the binding of `v` with `value`.
    pub fn refine(&mut self, v: V, value: L) {
        if self.is_bottom {
            return;
        }
        let refined = self.get(&v).meet(&value);
        self.set(v, refined);
    }

    pub fn forget(&mut self, v: &V) {
        if self.is_bottom {
            return;
        }
        self.map.remove(v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&V, &L)> {
        self.map.iter()
    }

    pub fn assign_var(&mut self, x: V, y: &V) {
        if self.is_bottom {
            return;
        }
        let value = self.get(y);
        self.set(x, value);
    }

    pub fn leq(&self, other: &Self) -> bool {
        if self.is_bottom {
            true
        } else if other.is_bottom {
            false
        } else {
            self.map.leq(&other.map, |a, b| a.leq(b))
        }
    }

    pub fn equals(&self, other: &Self) -> bool {
        if self.is_bottom {
            other.is_bottom
        } else if other.is_bottom {
            false
        } else {
            self.map.equals(&other.map)
        }
    }

    fn pointwise_join(
        &self,
        other: &Self,
        combine: impl Fn(&L, &L) -> L,
    ) -> Self {
        if self.is_bottom {
            return other.clone();
        }
        if other.is_bottom {
            return self.clone();
        }
        // Join: an unbound side is top, which absorbs, so only keys bound
        // on both sides survive.
        let map = self.map.intersect_with(&other.map, |a, b| {
            let v = combine(a, b);
            (!v.is_top()).then_some(v)
        });
        Self {
            is_bottom: false,
            map,
        }
    }

    fn pointwise_meet(
        &self,
        other: &Self,
        combine: impl Fn(&L, &L) -> L,
    ) -> Self {
        if self.is_bottom || other.is_bottom {
            return Self::bottom();
        }
        let mut hit_bottom = false;
        let map = self.map.join_with(&other.map, |a, b| {
            let v = combine(a, b);
            if v.is_bottom() {
                hit_bottom = true;
            }
            (!v.is_top()).then_some(v)
        });
        if hit_bottom {
            Self::bottom()
        } else {
            Self {
                is_bottom: false,
                map,
            }
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        self.pointwise_join(other, |a, b| a.join(b))
    }

    pub fn widening(&self, other: &Self) -> Self {
        self.pointwise_join(other, |a, b| a.widening(b))
    }

    pub fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        self.pointwise_join(other, |a, b| a.widening_threshold(b, threshold))
    }

    pub fn meet(&self, other: &Self) -> Self {
        self.pointwise_meet(other, |a, b| a.meet(b))
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        self.pointwise_meet(other, |a, b| a.narrowing(b))
    }

    pub fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        self.pointwise_meet(other, |a, b| a.narrowing_threshold(b, threshold))
    }
}

impl<V: Variable, L: LatticeValue + fmt::Display> fmt::Display for SeparateDomain<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            return write!(f, "_|_");
        }
        write!(f, "{{")?;
        for (i, (v, value)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v} -> {value}")?;
        }
        write!(f, "}}")
    }
}

impl<V: Variable + fmt::Debug, L: LatticeValue + fmt::Debug> fmt::Debug for SeparateDomain<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            write!(f, "_|_")
        } else {
            self.map.fmt(f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type IntervalEnv = SeparateDomain<u64, Interval>;

    #[test]
    fn absent_is_top() {
        let env = IntervalEnv::top();
        assert!(env.get(&1).is_top());
    }

    #[test]
    fn join_drops_one_sided() {
        let mut a = IntervalEnv::top();
        a.set(1, Interval::new(0, 1));
        a.set(2, Interval::new(5, 5));
        let mut b = IntervalEnv::top();
        b.set(1, Interval::new(3, 4));
        let j = a.join(&b);
        assert_eq!(j.get(&1), Interval::new(0, 4));
        assert!(j.get(&2).is_top());
    }

    #[test]
    fn meet_keeps_one_sided() {
        let mut a = IntervalEnv::top();
        a.set(1, Interval::new(0, 10));
        let mut b = IntervalEnv::top();
        b.set(1, Interval::new(5, 20));
        b.set(2, Interval::new(1, 1));
        let m = a.meet(&b);
        assert_eq!(m.get(&1), Interval::new(5, 10));
        assert_eq!(m.get(&2), Interval::new(1, 1));
    }

    #[test]
    fn meet_to_bottom_collapses() {
        let mut a = IntervalEnv::top();
        a.set(1, Interval::new(0, 1));
        let mut b = IntervalEnv::top();
        b.set(1, Interval::new(5, 6));
        assert!(a.meet(&b).is_bottom());
    }

    #[test]
    fn bottom_value_collapses() {
        let mut env = IntervalEnv::top();
        env.set(1, Interval::bottom());
        assert!(env.is_bottom());
    }
}
