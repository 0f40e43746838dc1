//! Reduced product of interval and congruence.

use core::fmt;

use crate::{Bound, Congruence, Int, Interval};

/// Reduced product of [`Interval`] and [`Congruence`].
///
/// Reduction snaps the interval bounds onto the congruence class and
/// collapses singleton intervals into singleton congruences; an empty
/// intersection makes the whole value bottom.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalCongruence {
    interval: Interval,
    congruence: Congruence,
}

impl IntervalCongruence {
    pub fn bottom() -> Self {
        Self {
            interval: Interval::bottom(),
            congruence: Congruence::bottom(),
        }
    }

    pub fn top() -> Self {
        Self {
            interval: Interval::top(),
            congruence: Congruence::top(),
        }
    }

    pub fn new(interval: Interval, congruence: Congruence) -> Self {
        Self { interval, congruence }.reduced()
    }

    pub fn singleton_of(n: impl Into<Int>) -> Self {
        let n = n.into();
        Self {
            interval: Interval::singleton_of(n.clone()),
            congruence: Congruence::singleton_of(n),
        }
    }

    pub fn from_interval(interval: Interval) -> Self {
        Self::new(interval, Congruence::top())
    }

    pub fn from_congruence(congruence: Congruence) -> Self {
        Self::new(Interval::top(), congruence)
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn congruence(&self) -> &Congruence {
        &self.congruence
    }

    pub fn is_bottom(&self) -> bool {
        self.interval.is_bottom() || self.congruence.is_bottom()
    }

    pub fn is_top(&self) -> bool {
        self.interval.is_top() && self.congruence.is_top()
    }

    pub fn singleton(&self) -> Option<&Int> {
        self.interval.singleton()
    }

    pub fn contains(&self, n: &Int) -> bool {
        self.interval.contains(n) && self.congruence.contains(n)
    }

    /// Tighten each member against the other.
    fn reduced(self) -> Self {
        if self.interval.is_bottom() || self.congruence.is_bottom() {
            return Self::bottom();
        }
        let (modulus, residue) = match (self.congruence.modulus(), self.congruence.residue()) {
            (Some(m), Some(r)) => (m.clone(), r.clone()),
            _ => return Self::bottom(),
        };
        if modulus.is_zero() {
            // Singleton congruence: the interval must contain it.
            return if self.interval.contains(&residue) {
                Self {
                    interval: Interval::singleton_of(residue),
                    congruence: self.congruence,
                }
            } else {
                Self::bottom()
            };
        }
        // Snap the interval bounds onto the congruence class.
        let lb = match self.interval.lb() {
            Bound::Finite(n) => {
                let delta = (&residue - n).mod_floor(&modulus);
                Bound::from(n + &delta)
            }
            b => b.clone(),
        };
        let ub = match self.interval.ub() {
            Bound::Finite(n) => {
                let delta = (n - &residue).mod_floor(&modulus);
                Bound::from(n - &delta)
            }
            b => b.clone(),
        };
        let interval = Interval::new(lb, ub);
        if interval.is_bottom() {
            return Self::bottom();
        }
        if let Some(n) = interval.singleton() {
            let n = n.clone();
            return Self {
                interval,
                congruence: Congruence::singleton_of(n),
            };
        }
        Self {
            interval,
            congruence: self.congruence,
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            true
        } else if other.is_bottom() {
            false
        } else {
            self.interval.leq(&other.interval) && self.congruence.leq(&other.congruence)
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        Self::new(
            self.interval.join(&other.interval),
            self.congruence.join(&other.congruence),
        )
    }

    pub fn meet(&self, other: &Self) -> Self {
        Self::new(
            self.interval.meet(&other.interval),
            self.congruence.meet(&other.congruence),
        )
    }

    pub fn widening(&self, other: &Self) -> Self {
        Self::new(
            self.interval.widening(&other.interval),
            self.congruence.widening(&other.congruence),
        )
    }

    pub fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        Self::new(
            self.interval.widening_threshold(&other.interval, threshold),
            self.congruence.widening(&other.congruence),
        )
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        Self::new(
            self.interval.narrowing(&other.interval),
            self.congruence.narrowing(&other.congruence),
        )
    }
}

impl fmt::Display for IntervalCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            write!(f, "_|_")
        } else {
            write!(f, "({} ^ {})", self.interval, self.congruence)
        }
    }
}

impl fmt::Debug for IntervalCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_snaps_bounds() {
        let v = IntervalCongruence::new(Interval::new(1, 10), Congruence::new(4, 0));
        assert_eq!(v.interval(), &Interval::new(4, 8));
    }

    #[test]
    fn reduction_to_singleton() {
        let v = IntervalCongruence::new(Interval::new(5, 8), Congruence::new(8, 7));
        assert_eq!(v.singleton(), Some(&Int::from(7)));
        assert_eq!(v.congruence(), &Congruence::singleton_of(7));
    }

    #[test]
    fn reduction_to_bottom() {
        let v = IntervalCongruence::new(Interval::new(5, 6), Congruence::new(8, 0));
        assert!(v.is_bottom());
    }
}
