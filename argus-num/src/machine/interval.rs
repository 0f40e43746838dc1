//! Machine-integer interval.

use core::fmt;

use crate::{Bound, Int, Interval, MachineInt, Sign};

/// An interval of machine integers of one `(width, sign)` type.
///
/// The inner interval always lies within the type's range. Operands of
/// binary lattice operations must have the same type; mixing is a
/// programming error and panics.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntInterval {
    interval: Interval,
    width: u32,
    sign: Sign,
}

fn assert_compatible(lhs: &IntInterval, rhs: &IntInterval) {
    assert!(
        lhs.width == rhs.width && lhs.sign == rhs.sign,
        "incompatible machine integer intervals"
    );
}

impl IntInterval {
    /// The full range of the type.
    pub fn top(width: u32, sign: Sign) -> Self {
        Self {
            interval: Interval::new(
                MachineInt::min(width, sign).to_int(),
                MachineInt::max(width, sign).to_int(),
            ),
            width,
            sign,
        }
    }

    pub fn bottom(width: u32, sign: Sign) -> Self {
        Self {
            interval: Interval::bottom(),
            width,
            sign,
        }
    }

    /// The interval `[lb, ub]` of the operands' type.
    pub fn range(lb: &MachineInt, ub: &MachineInt) -> Self {
        assert!(
            lb.bit_width() == ub.bit_width() && lb.sign() == ub.sign(),
            "incompatible machine integer bounds"
        );
        Self {
            interval: Interval::new(lb.to_int(), ub.to_int()),
            width: lb.bit_width(),
            sign: lb.sign(),
        }
    }

    /// The singleton `[n, n]`.
    pub fn singleton_of(n: &MachineInt) -> Self {
        Self {
            interval: Interval::singleton_of(n.to_int()),
            width: n.bit_width(),
            sign: n.sign(),
        }
    }

    /// Wrap an unbounded interval into the type.
    ///
    /// A window that fits the range is kept exactly. A window that spans
    /// `2^w` values or more, or that straddles the range boundary once
    /// shifted, becomes the full range.
    pub fn from_unbounded(interval: Interval, width: u32, sign: Sign) -> Self {
        if interval.is_bottom() {
            return Self::bottom(width, sign);
        }
        let top = Self::top(width, sign);
        if interval.leq(&top.interval) {
            return Self {
                interval,
                width,
                sign,
            };
        }
        match (interval.lb().number(), interval.ub().number()) {
            (Some(lb), Some(ub)) => {
                if &(ub - lb) >= &(Int::pow2(width) - Int::one()) {
                    return top;
                }
                let lb = MachineInt::new(lb.clone(), width, sign).to_int();
                let ub = MachineInt::new(ub.clone(), width, sign).to_int();
                if lb <= ub {
                    Self {
                        interval: Interval::new(lb, ub),
                        width,
                        sign,
                    }
                } else {
                    top
                }
            }
            _ => top,
        }
    }

    pub fn bit_width(&self) -> u32 {
        self.width
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The unbounded view of this interval.
    pub fn to_interval(&self) -> &Interval {
        &self.interval
    }

    pub fn is_bottom(&self) -> bool {
        self.interval.is_bottom()
    }

    pub fn is_top(&self) -> bool {
        self.interval == Self::top(self.width, self.sign).interval
    }

    pub fn lb(&self) -> &Bound {
        self.interval.lb()
    }

    pub fn ub(&self) -> &Bound {
        self.interval.ub()
    }

    pub fn singleton(&self) -> Option<MachineInt> {
        self.interval
            .singleton()
            .map(|n| MachineInt::new(n.clone(), self.width, self.sign))
    }

    pub fn contains(&self, n: &MachineInt) -> bool {
        assert!(n.bit_width() == self.width && n.sign() == self.sign);
        self.interval.contains(&n.to_int())
    }

    pub fn leq(&self, other: &Self) -> bool {
        assert_compatible(self, other);
        self.interval.leq(&other.interval)
    }

    pub fn join(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self {
            interval: self.interval.join(&other.interval),
            width: self.width,
            sign: self.sign,
        }
    }

    pub fn meet(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self {
            interval: self.interval.meet(&other.interval),
            width: self.width,
            sign: self.sign,
        }
    }

    /// Widening, clamped to the type's range instead of infinity.
    pub fn widening(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self::from_unbounded(
            self.interval
                .widening(&other.interval)
                .meet(&Self::top(self.width, self.sign).interval),
            self.width,
            self.sign,
        )
    }

    pub fn widening_threshold(&self, other: &Self, threshold: &MachineInt) -> Self {
        assert_compatible(self, other);
        Self::from_unbounded(
            self.interval
                .widening_threshold(&other.interval, &threshold.to_int())
                .meet(&Self::top(self.width, self.sign).interval),
            self.width,
            self.sign,
        )
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        // The range bounds play the role of infinities.
        let top = Self::top(self.width, self.sign);
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom(self.width, self.sign);
        }
        let lb = if self.interval.lb() == top.interval.lb() {
            other.interval.lb().clone()
        } else {
            self.interval.lb().clone()
        };
        let ub = if self.interval.ub() == top.interval.ub() {
            other.interval.ub().clone()
        } else {
            self.interval.ub().clone()
        };
        Self {
            interval: Interval::new(lb, ub),
            width: self.width,
            sign: self.sign,
        }
    }

    /// Cast to another machine integer type, wrapping as needed.
    pub fn cast(&self, width: u32, sign: Sign) -> Self {
        if self.is_bottom() {
            return Self::bottom(width, sign);
        }
        Self::from_unbounded(self.interval.clone(), width, sign)
    }
}

impl From<MachineInt> for IntInterval {
    fn from(n: MachineInt) -> Self {
        Self::singleton_of(&n)
    }
}

impl fmt::Display for IntInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.interval.fmt(f)
    }
}

impl fmt::Debug for IntInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.interval, self.sign, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_in_range_is_exact() {
        let i = IntInterval::from_unbounded(Interval::new(10, 20), 8, Sign::Unsigned);
        assert_eq!(i.to_interval(), &Interval::new(10, 20));
    }

    #[test]
    fn wrap_shifts_whole_window() {
        let i = IntInterval::from_unbounded(Interval::new(256, 260), 8, Sign::Unsigned);
        assert_eq!(i.to_interval(), &Interval::new(0, 4));
    }

    #[test]
    fn wrap_straddling_goes_top() {
        let i = IntInterval::from_unbounded(Interval::new(250, 260), 8, Sign::Unsigned);
        assert!(i.is_top());
    }

    #[test]
    fn wrap_wide_goes_top() {
        let i = IntInterval::from_unbounded(Interval::new(0, 300), 8, Sign::Unsigned);
        assert!(i.is_top());
    }

    #[test]
    fn widening_clamps_to_range() {
        let a = IntInterval::from_unbounded(Interval::new(0, 1), 8, Sign::Unsigned);
        let b = IntInterval::from_unbounded(Interval::new(0, 2), 8, Sign::Unsigned);
        let w = a.widening(&b);
        assert_eq!(w.to_interval(), &Interval::new(0, 255));
    }
}
