//! Number kernel of the Argus analyzer.
//!
//! Two families of integers live here. [`Int`] is an arbitrary-precision
//! signed integer used by the relational domains, where wrapping would be
//! unsound. [`MachineInt`] is a bounded two's-complement integer carrying its
//! bit width and signedness, with wrap-aware arithmetic and explicit overflow
//! reporting, used everywhere the analyzed program's own semantics apply.
//!
//! On top of those sit the value lattices: [`Bound`] (an integer or an
//! infinity), [`Interval`], [`Congruence`] and their reduced product
//! [`IntervalCongruence`], plus machine-integer counterparts in [`machine`]
//! that know how to wrap an unbounded result into a bounded type.

mod bound;
mod congruence;
mod error;
mod int;
mod interval;
mod interval_congruence;
mod machine_int;

pub mod machine;

pub use bound::Bound;
pub use congruence::Congruence;
pub use error::NumberError;
pub use int::Int;
pub use interval::Interval;
pub use interval_congruence::IntervalCongruence;
pub use machine_int::{MachineInt, Sign};
