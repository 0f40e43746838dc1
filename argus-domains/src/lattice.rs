//! The common lattice interface of every abstract domain.

use argus_num::Int;

/// Lattice operations shared by every abstract domain.
///
/// Contracts:
///
/// * `join` and the widenings never shrink; `meet` and the narrowings never
///   grow.
/// * For every ascending chain `x₀ ≤ x₁ ≤ …`, the sequence
///   `yᵢ₊₁ = yᵢ.widening(xᵢ₊₁)` stabilizes after finitely many steps.
/// * `normalize` may perform closure or reduction; every other observer
///   must return correct results whether or not it has been called.
pub trait AbstractDomain: Clone {
    fn bottom() -> Self;

    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    fn set_to_bottom(&mut self) {
        *self = Self::bottom();
    }

    fn set_to_top(&mut self) {
        *self = Self::top();
    }

    fn leq(&self, other: &Self) -> bool;

    fn equals(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }

    fn join(&self, other: &Self) -> Self;

    /// Join at a loop head. Defaults to `join`; domains with cheaper or
    /// more precise loop-merge strategies override it.
    fn join_loop(&self, other: &Self) -> Self {
        self.join(other)
    }

    /// Join between two iterations of the same fixpoint. Defaults to `join`.
    fn join_iter(&self, other: &Self) -> Self {
        self.join(other)
    }

    fn widening(&self, other: &Self) -> Self;

    /// Widening against a landmark value: prefers the smallest landmark
    /// above the growing bound over jumping to infinity.
    fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self;

    fn meet(&self, other: &Self) -> Self;

    fn narrowing(&self, other: &Self) -> Self;

    fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self;

    fn normalize(&mut self) {}
}
