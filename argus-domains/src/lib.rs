//! Abstract domains of the Argus analyzer.
//!
//! This crate is the core of a whole-program abstract interpreter: a library
//! of lattice-structured abstract domains that over-approximate the
//! reachable states of low-level imperative code. The client (a CFG driver)
//! owns one abstract value of the top-level memory domain, pushes statement
//! effects into it, joins and widens at merge points, and queries the final
//! invariants.
//!
//! The domains are layered, leaves first:
//!
//! * numerical domains over unbounded integers ([`num`]): intervals,
//!   congruences, their reduced product, difference-bound matrices,
//!   octagons, gauges;
//! * the machine-integer adapter ([`machine`]) that makes any numerical
//!   domain wrap-aware;
//! * flag lattices for initialization, nullity and allocation state
//!   ([`uninit`], [`nullity`], [`lifetime`]) and the points-to abstraction
//!   ([`pointer`]);
//! * the scalar composite ([`scalar`]) routing each operation per variable
//!   kind;
//! * the memory domains ([`memory`]): the cell-based byte-level model, the
//!   input/output function-summary domain and the value-partitioning
//!   combinator.
//!
//! Abstract values are semantically immutable: combinators return new
//! values, and the Patricia-tree environments make those copies cheap.

pub mod ctx;
pub mod lattice;
pub mod lifetime;
pub mod linear;
pub mod literal;
pub mod machine;
pub mod memory;
pub mod nullity;
pub mod num;
pub mod pointer;
pub mod scalar;
pub mod separate;
pub mod uninit;
pub mod var;

pub use ctx::{Context, MemLoc, Var};
pub use lattice::AbstractDomain;
pub use lifetime::{Lifetime, LifetimeDomain};
pub use linear::{ConstraintKind, ConstraintSystem, LinearConstraint, LinearExpression};
pub use literal::Literal;
pub use machine::{IntBinaryOp, IntOperand, IntPredicate, IntUnaryOp, MachineIntDomain, WrapDomain};
pub use memory::{CellDomain, MemoryDomain, PartitioningDomain, SummaryDomain};
pub use nullity::{Nullity, NullityDomain};
pub use num::NumericDomain;
pub use pointer::{PointerAbsValue, PointsToSet};
pub use scalar::{CompositeDomain, ScalarDomain};
pub use separate::{LatticeValue, SeparateDomain};
pub use uninit::{Uninitialized, UninitializedDomain};
pub use var::{CellKind, MemoryLocation, ScalarVariable, Variable, VariableFactory, VariableKind};
