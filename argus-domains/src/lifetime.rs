//! Allocation lifetime lattice and its pointwise domain.

use crate::separate::{LatticeValue, SeparateDomain};
use crate::var::MemoryLocation;

/// Whether a memory object is currently allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Lifetime {
    #[display(fmt = "_|_")]
    Bottom,
    #[display(fmt = "allocated")]
    Allocated,
    #[display(fmt = "deallocated")]
    Deallocated,
    #[display(fmt = "T")]
    Top,
}

impl Lifetime {
    pub fn is_allocated(&self) -> bool {
        *self == Lifetime::Allocated
    }

    pub fn is_deallocated(&self) -> bool {
        *self == Lifetime::Deallocated
    }
}

impl LatticeValue for Lifetime {
    fn top() -> Self {
        Lifetime::Top
    }

    fn bottom() -> Self {
        Lifetime::Bottom
    }

    fn is_top(&self) -> bool {
        *self == Lifetime::Top
    }

    fn is_bottom(&self) -> bool {
        *self == Lifetime::Bottom
    }

    fn leq(&self, other: &Self) -> bool {
        matches!((self, other), (Lifetime::Bottom, _) | (_, Lifetime::Top)) || self == other
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Lifetime::Bottom, x) | (x, Lifetime::Bottom) => *x,
            (x, y) if x == y => *x,
            _ => Lifetime::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Lifetime::Top, x) | (x, Lifetime::Top) => *x,
            (x, y) if x == y => *x,
            _ => Lifetime::Bottom,
        }
    }
}

/// Per-memory-object lifetime state.
pub type LifetimeDomain<M> = SeparateDomain<M, Lifetime>;

impl<M: MemoryLocation> LifetimeDomain<M> {
    pub fn assign_allocated(&mut self, m: M) {
        self.set(m, Lifetime::Allocated);
    }

    pub fn assign_deallocated(&mut self, m: M) {
        self.set(m, Lifetime::Deallocated);
    }

    /// Assert that `m` is allocated; a definitely deallocated object makes
    /// the state bottom.
    pub fn assert_allocated(&mut self, m: &M) {
        self.refine(m.clone(), Lifetime::Allocated);
    }

    pub fn assert_deallocated(&mut self, m: &M) {
        self.refine(m.clone(), Lifetime::Deallocated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_free_is_bottom() {
        let mut env: LifetimeDomain<u64> = LifetimeDomain::top();
        env.assign_deallocated(1);
        env.assert_allocated(&1);
        assert!(env.is_bottom());
    }
}
