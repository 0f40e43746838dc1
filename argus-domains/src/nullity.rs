//! Nullity lattice and its pointwise domain.

use crate::machine::IntPredicate;
use crate::separate::{LatticeValue, SeparateDomain};
use crate::var::Variable;

/// Whether a pointer is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Nullity {
    #[display(fmt = "_|_")]
    Bottom,
    #[display(fmt = "null")]
    Null,
    #[display(fmt = "non-null")]
    NonNull,
    #[display(fmt = "T")]
    Top,
}

impl Nullity {
    pub fn is_null(&self) -> bool {
        *self == Nullity::Null
    }

    pub fn is_non_null(&self) -> bool {
        *self == Nullity::NonNull
    }
}

impl LatticeValue for Nullity {
    fn top() -> Self {
        Nullity::Top
    }

    fn bottom() -> Self {
        Nullity::Bottom
    }

    fn is_top(&self) -> bool {
        *self == Nullity::Top
    }

    fn is_bottom(&self) -> bool {
        *self == Nullity::Bottom
    }

    fn leq(&self, other: &Self) -> bool {
        matches!((self, other), (Nullity::Bottom, _) | (_, Nullity::Top)) || self == other
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Nullity::Bottom, x) | (x, Nullity::Bottom) => *x,
            (x, y) if x == y => *x,
            _ => Nullity::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Nullity::Top, x) | (x, Nullity::Top) => *x,
            (x, y) if x == y => *x,
            _ => Nullity::Bottom,
        }
    }
}

/// Per-pointer nullity state.
pub type NullityDomain<V> = SeparateDomain<V, Nullity>;

impl<V: Variable> NullityDomain<V> {
    pub fn assign_null(&mut self, p: V) {
        self.set(p, Nullity::Null);
    }

    pub fn assign_non_null(&mut self, p: V) {
        self.set(p, Nullity::NonNull);
    }

    pub fn is_null(&self, p: &V) -> bool {
        self.get(p).is_null()
    }

    pub fn is_non_null(&self, p: &V) -> bool {
        self.get(p).is_non_null()
    }

    pub fn assert_null(&mut self, p: &V) {
        self.refine(p.clone(), Nullity::Null);
    }

    pub fn assert_non_null(&mut self, p: &V) {
        self.refine(p.clone(), Nullity::NonNull);
    }

    /// Refine both sides after `p == q` (equality) or `p != q`
    /// (disequality).
    pub fn add(&mut self, pred: IntPredicate, p: &V, q: &V) {
        match pred {
            IntPredicate::Eq => {
                let met = self.get(p).meet(&self.get(q));
                self.set(p.clone(), met);
                let met = self.get(p).meet(&self.get(q));
                self.set(q.clone(), met);
            }
            IntPredicate::Ne => {
                // Only informative when one side is definitely null.
                if self.is_null(p) {
                    self.assert_non_null(q);
                } else if self.is_null(q) {
                    self.assert_non_null(p);
                }
            }
            _ => {
                // Ordered comparisons of pointers carry no nullity
                // information.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_meets() {
        let mut env: NullityDomain<u64> = NullityDomain::top();
        env.assign_null(1);
        env.add(IntPredicate::Eq, &1, &2);
        assert!(env.is_null(&2));
    }

    #[test]
    fn contradictory_equality_is_bottom() {
        let mut env: NullityDomain<u64> = NullityDomain::top();
        env.assign_null(1);
        env.assign_non_null(2);
        env.add(IntPredicate::Eq, &1, &2);
        assert!(env.is_bottom());
    }

    #[test]
    fn disequality_with_null() {
        let mut env: NullityDomain<u64> = NullityDomain::top();
        env.assign_null(1);
        env.add(IntPredicate::Ne, &1, &2);
        assert!(env.is_non_null(&2));
    }
}
