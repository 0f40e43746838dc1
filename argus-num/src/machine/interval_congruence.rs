//! Reduced product of machine-integer interval and congruence.

use core::fmt;

use crate::machine::{IntCongruence, IntInterval};
use crate::{IntervalCongruence, MachineInt, Sign};

/// Reduced product of [`IntInterval`] and [`IntCongruence`].
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntIntervalCongruence {
    interval: IntInterval,
    congruence: IntCongruence,
}

impl IntIntervalCongruence {
    pub fn top(width: u32, sign: Sign) -> Self {
        Self {
            interval: IntInterval::top(width, sign),
            congruence: IntCongruence::top(width, sign),
        }
    }

    pub fn bottom(width: u32, sign: Sign) -> Self {
        Self {
            interval: IntInterval::bottom(width, sign),
            congruence: IntCongruence::bottom(width, sign),
        }
    }

    pub fn new(interval: IntInterval, congruence: IntCongruence) -> Self {
        assert!(
            interval.bit_width() == congruence.bit_width()
                && interval.sign() == congruence.sign(),
            "incompatible machine integer values"
        );
        let width = interval.bit_width();
        let sign = interval.sign();
        // Reduce through the unbounded product.
        let reduced = IntervalCongruence::new(
            interval.to_interval().clone(),
            congruence.to_congruence().clone(),
        );
        if reduced.is_bottom() {
            return Self::bottom(width, sign);
        }
        Self {
            interval: IntInterval::from_unbounded(reduced.interval().clone(), width, sign),
            congruence: IntCongruence::from_unbounded(
                reduced.congruence().clone(),
                width,
                sign,
            ),
        }
    }

    pub fn singleton_of(n: &MachineInt) -> Self {
        Self {
            interval: IntInterval::singleton_of(n),
            congruence: IntCongruence::singleton_of(n),
        }
    }

    pub fn from_interval(interval: IntInterval) -> Self {
        let congruence = IntCongruence::top(interval.bit_width(), interval.sign());
        Self::new(interval, congruence)
    }

    pub fn from_congruence(congruence: IntCongruence) -> Self {
        let interval = IntInterval::top(congruence.bit_width(), congruence.sign());
        Self::new(interval, congruence)
    }

    pub fn bit_width(&self) -> u32 {
        self.interval.bit_width()
    }

    pub fn sign(&self) -> Sign {
        self.interval.sign()
    }

    pub fn interval(&self) -> &IntInterval {
        &self.interval
    }

    pub fn congruence(&self) -> &IntCongruence {
        &self.congruence
    }

    pub fn is_bottom(&self) -> bool {
        self.interval.is_bottom() || self.congruence.is_bottom()
    }

    pub fn is_top(&self) -> bool {
        self.interval.is_top() && self.congruence.is_top()
    }

    pub fn singleton(&self) -> Option<MachineInt> {
        self.interval.singleton()
    }

    pub fn contains(&self, n: &MachineInt) -> bool {
        self.interval.contains(n) && self.congruence.contains(n)
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
        if self.is_bottom() {
            other.clone()
        } else if other.is_bottom() {
            self.clone()
        } else {
            Self::new(
                self.interval.join(&other.interval),
                self.congruence.join(&other.congruence),
            )
        }
    }

    pub fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            Self::bottom(self.bit_width(), self.sign())
        } else {
            Self::new(
                self.interval.meet(&other.interval),
                self.congruence.meet(&other.congruence),
            )
        }
    }

    pub fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            other.clone()
        } else if other.is_bottom() {
            self.clone()
        } else {
            Self::new(
                self.interval.widening(&other.interval),
                self.congruence.widening(&other.congruence),
            )
        }
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            Self::bottom(self.bit_width(), self.sign())
        } else {
            Self::new(
                self.interval.narrowing(&other.interval),
                self.congruence.narrowing(&other.congruence),
            )
        }
    }
}

impl fmt::Display for IntIntervalCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            write!(f, "_|_")
        } else {
            write!(f, "({} ^ {})", self.interval, self.congruence)
        }
    }
}

impl fmt::Debug for IntIntervalCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Congruence, Interval};

    #[test]
    fn product_reduces() {
        let v = IntIntervalCongruence::new(
            IntInterval::from_unbounded(Interval::new(1, 10), 32, Sign::Signed),
            IntCongruence::from_unbounded(Congruence::new(4, 0), 32, Sign::Signed),
        );
        assert_eq!(v.interval().to_interval(), &Interval::new(4, 8));
        assert!(!v.is_bottom());
        assert!(v.contains(&MachineInt::new(8, 32, Sign::Signed)));
        assert!(!v.contains(&MachineInt::new(6, 32, Sign::Signed)));
        assert!(v.singleton().is_none());
    }
}
