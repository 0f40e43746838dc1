//! Machine-integer value lattices.
//!
//! These mirror [`Interval`](crate::Interval), [`Congruence`](crate::Congruence)
//! and their product, but each value carries a bit width and signedness and
//! knows how to wrap an unbounded result into the type's range.

mod congruence;
mod interval;
mod interval_congruence;

pub use congruence::IntCongruence;
pub use interval::IntInterval;
pub use interval_congruence::IntIntervalCongruence;
