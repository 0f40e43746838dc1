//! Memory abstract domains.
//!
//! [`CellDomain`] models byte-addressable memory as a dynamic set of
//! synthetic non-overlapping cells per memory object. [`SummaryDomain`]
//! models the relational input/output effect of a whole function body.
//! [`PartitioningDomain`] lifts any memory domain into a finite disjunction
//! guarded by value ranges of one pivot variable.

mod cell;
mod partition;
mod summary;

pub use cell::CellDomain;
pub use partition::PartitioningDomain;
pub use summary::{SummaryCell, SummaryDomain};

use argus_num::machine::IntInterval;
use argus_num::MachineInt;

use crate::lifetime::Lifetime;
use crate::literal::Literal;
use crate::scalar::ScalarDomain;
use crate::var::{MemoryLocation, ScalarVariable};

/// Interface of the memory layer: scalar operations plus loads, stores,
/// bulk copies and the forget taxonomy.
///
/// A dereference of a definitely null or definitely uninitialized pointer
/// transitions the state to bottom; the checkers read the bottom invariant
/// at the statement to report a definite error.
pub trait MemoryDomain<V: ScalarVariable, M: MemoryLocation>: ScalarDomain<V, M> {
    /// `*p := v`, writing `size` bytes.
    fn mem_write(&mut self, p: &V, v: &Literal<V>, size: &MachineInt);

    /// `x := *p`, reading `size` bytes.
    fn mem_read(&mut self, x: &Literal<V>, p: &V, size: &MachineInt);

    /// `memcpy(dest, src, size)`.
    fn mem_copy(&mut self, dest: &V, src: &V, size: &Literal<V>);

    /// `memset(dest, value, size)`.
    fn mem_set(&mut self, dest: &V, value: &Literal<V>, size: &Literal<V>);

    /// Forget every memory byte.
    fn mem_forget_all(&mut self);

    /// Forget all bytes of one object.
    fn mem_forget(&mut self, addr: &M);

    /// Forget the bytes of `addr` overlapping
    /// `[offset, offset + size - 1]`.
    fn mem_forget_range(&mut self, addr: &M, offset: &IntInterval, size: &MachineInt);

    /// Forget everything reachable through `p`.
    fn mem_forget_reachable(&mut self, p: &V);

    /// Forget the `size` bytes reachable through `p`.
    fn mem_forget_reachable_size(&mut self, p: &V, size: &MachineInt);

    /// Like `mem_forget_reachable`, but record that the bytes may have
    /// been overwritten (used when applying opaque function summaries).
    fn mem_abstract_reachable(&mut self, p: &V);

    fn mem_abstract_reachable_size(&mut self, p: &V, size: &MachineInt);

    /// Write zero over every byte reachable through `p`.
    fn mem_zero_reachable(&mut self, p: &V);

    /// Mark every byte reachable through `p` uninitialized.
    fn mem_uninitialize_reachable(&mut self, p: &V);

    // Lifetime of memory objects

    fn lifetime_assign_allocated(&mut self, m: &M);

    fn lifetime_assign_deallocated(&mut self, m: &M);

    /// Assert that `m` is allocated; bottom if it is definitely not.
    fn lifetime_assert_allocated(&mut self, m: &M);

    fn lifetime_assert_deallocated(&mut self, m: &M);

    fn lifetime_set(&mut self, m: &M, value: Lifetime);

    fn lifetime_forget(&mut self, m: &M);

    fn lifetime_to_lifetime(&self, m: &M) -> Lifetime;

    // Partitioning hooks; no-ops except in the partitioning combinator.

    fn partitioning_set_variable(&mut self, _x: &V) {}

    fn partitioning_variable(&self) -> Option<V> {
        None
    }

    fn partitioning_join(&mut self) {}

    fn partitioning_disable(&mut self) {}
}
