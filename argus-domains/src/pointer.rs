//! Points-to abstraction.

use core::fmt;

use argus_num::machine::IntInterval;
use argus_tree::PatriciaTreeSet;

use crate::nullity::Nullity;
use crate::separate::LatticeValue;
use crate::uninit::Uninitialized;
use crate::var::MemoryLocation;

/// Over-approximation of the memory locations a pointer may refer to.
///
/// The empty set is meaningful: it abstracts pointers that are only null or
/// uninitialized and thus point to no object at all.
#[derive(Clone, PartialEq, Eq)]
pub enum PointsToSet<M: MemoryLocation> {
    Bottom,
    Set(PatriciaTreeSet<M>),
    Top,
}

impl<M: MemoryLocation> PointsToSet<M> {
    pub fn empty() -> Self {
        PointsToSet::Set(PatriciaTreeSet::new())
    }

    pub fn singleton(m: M) -> Self {
        PointsToSet::Set(PatriciaTreeSet::singleton(m))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PointsToSet::Set(s) if s.is_empty())
    }

    /// The only location, if the set is a singleton.
    pub fn singleton_location(&self) -> Option<M> {
        match self {
            PointsToSet::Set(s) if s.size() == 1 => s.iter().next().cloned(),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<usize> {
        match self {
            PointsToSet::Set(s) => Some(s.size()),
            _ => None,
        }
    }

    pub fn contains(&self, m: &M) -> bool {
        match self {
            PointsToSet::Bottom => false,
            PointsToSet::Set(s) => s.contains(m),
            PointsToSet::Top => true,
        }
    }

    pub fn add(&mut self, m: M) {
        if let PointsToSet::Set(s) = self {
            s.insert(m);
        }
    }

    /// Iterate the locations of a finite set.
    ///
    /// Callers must handle `Top` separately; iterating it is a programming
    /// error.
    pub fn iter(&self) -> impl Iterator<Item = &M> {
        match self {
            PointsToSet::Set(s) => s.iter(),
            PointsToSet::Bottom => {
                panic!("iterating a bottom points-to set")
            }
            PointsToSet::Top => panic!("iterating an unbounded points-to set"),
        }
    }
}

impl<M: MemoryLocation> LatticeValue for PointsToSet<M> {
    fn top() -> Self {
        PointsToSet::Top
    }

    fn bottom() -> Self {
        PointsToSet::Bottom
    }

    fn is_top(&self) -> bool {
        matches!(self, PointsToSet::Top)
    }

    fn is_bottom(&self) -> bool {
        matches!(self, PointsToSet::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (PointsToSet::Bottom, _) | (_, PointsToSet::Top) => true,
            (_, PointsToSet::Bottom) | (PointsToSet::Top, _) => false,
            (PointsToSet::Set(a), PointsToSet::Set(b)) => a.is_subset(b),
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (PointsToSet::Bottom, x) | (x, PointsToSet::Bottom) => x.clone(),
            (PointsToSet::Top, _) | (_, PointsToSet::Top) => PointsToSet::Top,
            (PointsToSet::Set(a), PointsToSet::Set(b)) => PointsToSet::Set(a.union(b)),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (PointsToSet::Bottom, _) | (_, PointsToSet::Bottom) => PointsToSet::Bottom,
            (PointsToSet::Top, x) | (x, PointsToSet::Top) => x.clone(),
            (PointsToSet::Set(a), PointsToSet::Set(b)) => {
                PointsToSet::Set(a.intersection(b))
            }
        }
    }
}

impl<M: MemoryLocation> fmt::Display for PointsToSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointsToSet::Bottom => write!(f, "_|_"),
            PointsToSet::Top => write!(f, "T"),
            PointsToSet::Set(s) => {
                write!(f, "{{")?;
                for (i, m) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl<M: MemoryLocation> fmt::Debug for PointsToSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The full abstract value of one pointer: address set, byte offset,
/// nullity and initialization. Used by query accessors and refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerAbsValue<M: MemoryLocation> {
    uninitialized: Uninitialized,
    nullity: Nullity,
    points_to: PointsToSet<M>,
    offset: IntInterval,
}

impl<M: MemoryLocation> PointerAbsValue<M> {
    pub fn new(
        uninitialized: Uninitialized,
        nullity: Nullity,
        points_to: PointsToSet<M>,
        offset: IntInterval,
    ) -> Self {
        Self {
            uninitialized,
            nullity,
            points_to,
            offset,
        }
    }

    pub fn uninitialized(&self) -> Uninitialized {
        self.uninitialized
    }

    pub fn nullity(&self) -> Nullity {
        self.nullity
    }

    pub fn points_to(&self) -> &PointsToSet<M> {
        &self.points_to
    }

    pub fn offset(&self) -> &IntInterval {
        &self.offset
    }

    pub fn is_bottom(&self) -> bool {
        self.uninitialized.is_bottom()
            || self.nullity.is_bottom()
            || self.points_to.is_bottom()
            || self.offset.is_bottom()
    }

    pub fn is_null(&self) -> bool {
        self.nullity.is_null()
    }

    pub fn is_uninitialized(&self) -> bool {
        self.uninitialized == Uninitialized::Uninitialized
    }

    pub fn join(&self, other: &Self) -> Self {
        Self {
            uninitialized: self.uninitialized.join(&other.uninitialized),
            nullity: self.nullity.join(&other.nullity),
            points_to: self.points_to.join(&other.points_to),
            offset: self.offset.join(&other.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powerset_lattice() {
        let a: PointsToSet<u64> = PointsToSet::singleton(1);
        let mut ab = a.clone();
        ab.add(2);
        assert!(a.leq(&ab));
        assert!(!ab.leq(&a));
        assert!(ab.leq(&PointsToSet::Top));
        assert_eq!(a.join(&PointsToSet::singleton(2)), ab);
        assert_eq!(ab.meet(&a), a);
    }

    #[test]
    fn empty_set_is_not_bottom() {
        let e: PointsToSet<u64> = PointsToSet::empty();
        assert!(!e.is_bottom());
        assert!(e.is_empty());
        assert!(e.leq(&PointsToSet::singleton(1)));
    }
}
