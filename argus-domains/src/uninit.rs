//! Initialization lattice and its pointwise domain.

use crate::separate::{LatticeValue, SeparateDomain};
use crate::var::Variable;

/// Whether a variable has been given a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Uninitialized {
    #[display(fmt = "_|_")]
    Bottom,
    #[display(fmt = "init")]
    Initialized,
    #[display(fmt = "uninit")]
    Uninitialized,
    #[display(fmt = "T")]
    Top,
}

impl LatticeValue for Uninitialized {
    fn top() -> Self {
        Uninitialized::Top
    }

    fn bottom() -> Self {
        Uninitialized::Bottom
    }

    fn is_top(&self) -> bool {
        *self == Uninitialized::Top
    }

    fn is_bottom(&self) -> bool {
        *self == Uninitialized::Bottom
    }

    fn leq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Uninitialized::Bottom, _) | (_, Uninitialized::Top)
        ) || self == other
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Uninitialized::Bottom, x) | (x, Uninitialized::Bottom) => *x,
            (x, y) if x == y => *x,
            _ => Uninitialized::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Uninitialized::Top, x) | (x, Uninitialized::Top) => *x,
            (x, y) if x == y => *x,
            _ => Uninitialized::Bottom,
        }
    }
}

/// Per-variable initialization state.
pub type UninitializedDomain<V> = SeparateDomain<V, Uninitialized>;

impl<V: Variable> UninitializedDomain<V> {
    pub fn assign_initialized(&mut self, x: V) {
        self.set(x, Uninitialized::Initialized);
    }

    pub fn assign_uninitialized(&mut self, x: V) {
        self.set(x, Uninitialized::Uninitialized);
    }

    pub fn is_initialized(&self, x: &V) -> bool {
        self.get(x) == Uninitialized::Initialized
    }

    pub fn is_uninitialized(&self, x: &V) -> bool {
        self.get(x) == Uninitialized::Uninitialized
    }

    /// Assert that `x` is initialized before a read. A definitely
    /// uninitialized variable makes the state bottom; an unknown one is
    /// refined to initialized.
    pub fn assert_initialized(&mut self, x: &V) {
        self.refine(x.clone(), Uninitialized::Initialized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_shape() {
        use super::Uninitialized::*;
        assert!(LatticeValue::leq(&Bottom, &Initialized));
        assert!(LatticeValue::leq(&Initialized, &Top));
        assert!(!LatticeValue::leq(&Initialized, &Uninitialized));
        assert_eq!(Initialized.join(&Uninitialized), Top);
        assert_eq!(Initialized.meet(&Uninitialized), Bottom);
    }

    #[test]
    fn assert_on_uninitialized_is_bottom() {
        let mut env: UninitializedDomain<u64> = UninitializedDomain::top();
        env.assign_uninitialized(1);
        env.assert_initialized(&1);
        assert!(env.is_bottom());
    }

    #[test]
    fn assert_on_unknown_refines() {
        let mut env: UninitializedDomain<u64> = UninitializedDomain::top();
        env.assert_initialized(&1);
        assert!(env.is_initialized(&1));
    }
}
