//! Interning context: the reference variable and memory-location types.
//!
//! A [`Context`] owns every interned variable and memory location built from
//! it; handles stay valid for as long as the context lives, and two handles
//! interned under the same name are the same object. The context is
//! read-mostly: lookups take a read lock, so concurrent readers from several
//! analyzer threads are safe; interning new names takes the write lock.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use argus_num::{Bound, Int, Sign};
use argus_tree::Indexable;
use hashbrown::HashMap;

use crate::var::{CellKind, ScalarVariable, VariableFactory, VariableKind};

#[derive(Debug)]
struct VarData {
    index: u64,
    name: String,
    kind: VariableKind,
}

#[derive(Debug)]
struct MemData {
    index: u64,
    name: String,
}

#[derive(Debug, Default)]
struct Inner {
    vars: HashMap<String, Var>,
    mems: HashMap<String, MemLoc>,
    next_var: u64,
    next_mem: u64,
    next_tmp: u64,
}

/// Owner of interned variables and memory locations.
///
/// Cheap to clone; clones share the same intern tables.
#[derive(Clone)]
pub struct Context {
    inner: Arc<RwLock<Inner>>,
    addr_width: u32,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context for a 64-bit address space.
    pub fn new() -> Self {
        Self::with_address_width(64)
    }

    /// A context whose pointer offset variables are `addr_width` bits wide.
    pub fn with_address_width(addr_width: u32) -> Self {
        assert!(addr_width >= 1);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            addr_width,
        }
    }

    pub fn address_width(&self) -> u32 {
        self.addr_width
    }

    /// Intern a variable under `name` with the given kind.
    ///
    /// Re-interning an existing name with a different kind is a programming
    /// error.
    pub fn var(&self, name: impl Into<String>, kind: VariableKind) -> Var {
        let name = name.into();
        {
            let inner = self.inner.read().unwrap();
            if let Some(v) = inner.vars.get(&name) {
                assert!(
                    v.kind() == kind,
                    "variable {name} re-interned with kind {kind:?}, was {:?}",
                    v.kind()
                );
                return v.clone();
            }
        }
        let mut inner = self.inner.write().unwrap();
        // Racing interner may have won between the locks.
        if let Some(v) = inner.vars.get(&name) {
            return v.clone();
        }
        let index = inner.next_var;
        inner.next_var += 1;
        let var = Var {
            data: Arc::new(VarData {
                index,
                name: name.clone(),
                kind,
            }),
            ctx: Arc::downgrade(&self.inner),
            addr_width: self.addr_width,
        };
        inner.vars.insert(name, var.clone());
        var
    }

    pub fn int_var(&self, name: impl Into<String>, width: u32, sign: Sign) -> Var {
        self.var(name, VariableKind::Int { width, sign })
    }

    pub fn float_var(&self, name: impl Into<String>) -> Var {
        self.var(name, VariableKind::Float)
    }

    pub fn ptr_var(&self, name: impl Into<String>) -> Var {
        self.var(name, VariableKind::Pointer)
    }

    pub fn dyn_var(&self, name: impl Into<String>, width: u32, sign: Sign) -> Var {
        self.var(name, VariableKind::Dynamic { width, sign })
    }

    /// Intern a memory location.
    pub fn mem(&self, name: impl Into<String>) -> MemLoc {
        let name = name.into();
        {
            let inner = self.inner.read().unwrap();
            if let Some(m) = inner.mems.get(&name) {
                return m.clone();
            }
        }
        let mut inner = self.inner.write().unwrap();
        if let Some(m) = inner.mems.get(&name) {
            return m.clone();
        }
        let index = inner.next_mem;
        inner.next_mem += 1;
        let mem = MemLoc {
            data: Arc::new(MemData {
                index,
                name: name.clone(),
            }),
        };
        inner.mems.insert(name, mem.clone());
        mem
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap();
        f.debug_struct("Context")
            .field("variables", &inner.vars.len())
            .field("memory_locations", &inner.mems.len())
            .finish()
    }
}

/// An interned variable handle.
///
/// Equality, ordering and hashing go through the interned index, so they
/// are consistent with pointer identity within one context.
#[derive(Clone)]
pub struct Var {
    data: Arc<VarData>,
    ctx: Weak<RwLock<Inner>>,
    addr_width: u32,
}

impl Var {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    fn with_ctx(&self) -> Context {
        Context {
            inner: self
                .ctx
                .upgrade()
                .expect("variable outlived its context"),
            addr_width: self.addr_width,
        }
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.data.index == other.data.index
    }
}

impl Eq for Var {}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data.index.cmp(&other.data.index)
    }
}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.index.hash(state);
    }
}

impl Indexable for Var {
    fn index(&self) -> u64 {
        self.data.index
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data.name)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.name)
    }
}

impl ScalarVariable for Var {
    fn kind(&self) -> VariableKind {
        self.data.kind
    }

    fn offset_var(&self) -> Self {
        assert!(
            matches!(
                self.data.kind,
                VariableKind::Pointer | VariableKind::Dynamic { .. }
            ),
            "offset_var on non-pointer {self}"
        );
        let ctx = self.with_ctx();
        ctx.int_var(
            format!("{}.offset", self.data.name),
            self.addr_width,
            Sign::Unsigned,
        )
    }
}

/// An interned memory location handle.
#[derive(Clone)]
pub struct MemLoc {
    data: Arc<MemData>,
}

impl MemLoc {
    pub fn name(&self) -> &str {
        &self.data.name
    }
}

impl PartialEq for MemLoc {
    fn eq(&self, other: &Self) -> bool {
        self.data.index == other.data.index
    }
}

impl Eq for MemLoc {}

impl PartialOrd for MemLoc {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemLoc {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data.index.cmp(&other.data.index)
    }
}

impl std::hash::Hash for MemLoc {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.index.hash(state);
    }
}

impl Indexable for MemLoc {
    fn index(&self) -> u64 {
        self.data.index
    }
}

impl fmt::Display for MemLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data.name)
    }
}

impl fmt::Debug for MemLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.name)
    }
}

impl VariableFactory<Var, MemLoc> for Context {
    fn cell_var(&self, base: &MemLoc, offset: &Int, size: &Int) -> Var {
        let width = (size.clone() * Int::from(8))
            .to_u32()
            .unwrap_or(u32::MAX);
        self.var(
            format!("C{{{base},{offset},{size}}}"),
            VariableKind::Dynamic {
                width: width.max(1),
                sign: Sign::Unsigned,
            },
        )
    }

    fn summary_cell_var(&self, base: &MemLoc, offset: &Int, size: &Bound, kind: CellKind) -> Var {
        let width = size
            .number()
            .and_then(|s| (s.clone() * Int::from(8)).to_u32())
            .unwrap_or(self.addr_width);
        self.var(
            format!("C{{{base},{offset},{size},{kind}}}"),
            VariableKind::Dynamic {
                width: width.max(1),
                sign: Sign::Unsigned,
            },
        )
    }

    fn tmp_var(&self, width: u32, sign: Sign) -> Var {
        let n = {
            let mut inner = self.inner.write().unwrap();
            let n = inner.next_tmp;
            inner.next_tmp += 1;
            n
        };
        self.var(format!("shadow.tmp.{n}"), VariableKind::Int { width, sign })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let ctx = Context::new();
        let a = ctx.int_var("x", 32, Sign::Signed);
        let b = ctx.int_var("x", 32, Sign::Signed);
        assert_eq!(a, b);
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn offset_var_is_deterministic() {
        let ctx = Context::new();
        let p = ctx.ptr_var("p");
        assert_eq!(p.offset_var(), p.offset_var());
        assert_eq!(p.offset_var().kind(), VariableKind::Int {
            width: 64,
            sign: Sign::Unsigned
        });
    }

    #[test]
    fn cell_vars_compare_equal_through_their_tuple() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        let a = ctx.cell_var(&m, &Int::from(4), &Int::from(4));
        let b = ctx.cell_var(&m, &Int::from(4), &Int::from(4));
        let c = ctx.cell_var(&m, &Int::from(8), &Int::from(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    #[should_panic(expected = "re-interned")]
    fn kind_mismatch_panics() {
        let ctx = Context::new();
        ctx.int_var("x", 32, Sign::Signed);
        ctx.float_var("x");
    }
}
