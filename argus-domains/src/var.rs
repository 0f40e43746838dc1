//! Variable and memory-location traits.
//!
//! The domains do not own a variable representation; they work through
//! these traits so that a front-end can plug in its own interned handles.
//! [`crate::ctx`] provides a ready-made implementation.

use core::fmt;
use core::hash::Hash;

use argus_num::Sign;
use argus_tree::Indexable;

/// Static kind of a scalar variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Machine integer of the given width and signedness.
    Int { width: u32, sign: Sign },
    /// Floating point; the value itself is abstracted away.
    Float,
    /// Pointer, with a synthetic offset variable attached.
    Pointer,
    /// Untyped register holding either an integer or a pointer.
    Dynamic { width: u32, sign: Sign },
}

/// Minimal requirements on the identifiers used as domain keys.
pub trait Variable:
    Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Indexable
{
}

impl<T> Variable for T where
    T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Indexable
{
}

/// A variable as seen by the scalar and memory layers.
pub trait ScalarVariable: Variable {
    fn kind(&self) -> VariableKind;

    /// The synthetic machine-integer variable holding this pointer's byte
    /// offset. Deterministic: the same pointer always yields the same
    /// offset variable.
    fn offset_var(&self) -> Self;

    /// Bit width of an int or dynamic variable.
    ///
    /// Calling this on a float or pointer is a programming error.
    fn bit_width(&self) -> u32 {
        match self.kind() {
            VariableKind::Int { width, .. } | VariableKind::Dynamic { width, .. } => width,
            k => panic!("variable {self} of kind {k:?} has no bit width"),
        }
    }

    /// Signedness of an int or dynamic variable.
    fn sign(&self) -> Sign {
        match self.kind() {
            VariableKind::Int { sign, .. } | VariableKind::Dynamic { sign, .. } => sign,
            k => panic!("variable {self} of kind {k:?} has no signedness"),
        }
    }

    fn is_int(&self) -> bool {
        matches!(self.kind(), VariableKind::Int { .. })
    }

    fn is_float(&self) -> bool {
        matches!(self.kind(), VariableKind::Float)
    }

    fn is_pointer(&self) -> bool {
        matches!(self.kind(), VariableKind::Pointer)
    }

    fn is_dynamic(&self) -> bool {
        matches!(self.kind(), VariableKind::Dynamic { .. })
    }
}

/// A symbolic memory region: a stack slot, a global, a heap allocation.
///
/// The domains require only equality, an ordered index and a debug
/// rendering; everything else stays on the front-end side.
pub trait MemoryLocation: Variable {}

impl<T: Variable> MemoryLocation for T {}

/// Kind of a memory cell: the value before the function runs (input) or
/// the value it wrote (output).
///
/// The cell-based memory domain only uses output cells; the summary domain
/// uses both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum CellKind {
    #[display(fmt = "I")]
    Input,
    #[display(fmt = "O")]
    Output,
}

/// Factory for the synthetic variables the memory domains need.
///
/// Cell variables must be deterministic: two independently constructed
/// cells with the same `(base, offset, size, kind)` must map to the same
/// scalar variable, otherwise summary composition cannot equate them.
pub trait VariableFactory<V, M>: Clone {
    /// Scalar variable of the cell `(base, offset, size)` of the value
    /// domain. The variable is dynamic, `8 * size` bits wide.
    fn cell_var(&self, base: &M, offset: &argus_num::Int, size: &argus_num::Int) -> V;

    /// Scalar variable of a summary cell; the size may be infinite.
    fn summary_cell_var(
        &self,
        base: &M,
        offset: &argus_num::Int,
        size: &argus_num::Bound,
        kind: CellKind,
    ) -> V;

    /// A fresh temporary, never returned twice.
    fn tmp_var(&self, width: u32, sign: Sign) -> V;
}
