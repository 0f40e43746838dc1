//! Closed interval over the arbitrary-precision integers.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

use crate::{Bound, Int};

/// An interval `[lb, ub]` over ℤ ∪ {−∞, +∞}, or bottom.
///
/// The empty interval is canonical: `lb = +∞, ub = −∞`. Any constructor
/// producing `lb > ub` collapses to it.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    lb: Bound,
    ub: Bound,
}

impl Interval {
    /// The empty interval.
    pub fn bottom() -> Self {
        Self {
            lb: Bound::plus_infinity(),
            ub: Bound::minus_infinity(),
        }
    }

    /// The interval `(-∞, +∞)`.
    pub fn top() -> Self {
        Self {
            lb: Bound::minus_infinity(),
            ub: Bound::plus_infinity(),
        }
    }

    /// The interval `[lb, ub]`; bottom if `lb > ub`.
    pub fn new(lb: impl Into<Bound>, ub: impl Into<Bound>) -> Self {
        let lb = lb.into();
        let ub = ub.into();
        if lb > ub {
            Self::bottom()
        } else {
            Self { lb, ub }
        }
    }

    /// The singleton `[n, n]`.
    pub fn singleton_of(n: impl Into<Int>) -> Self {
        let n = n.into();
        Self {
            lb: Bound::from(n.clone()),
            ub: Bound::from(n),
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.lb > self.ub
    }

    pub fn is_top(&self) -> bool {
        self.lb.is_infinite() && self.ub.is_infinite() && !self.is_bottom()
    }

    pub fn lb(&self) -> &Bound {
        &self.lb
    }

    pub fn ub(&self) -> &Bound {
        &self.ub
    }

    /// The unique element, if the interval is a singleton.
    pub fn singleton(&self) -> Option<&Int> {
        match (self.lb.number(), self.ub.number()) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn contains(&self, n: &Int) -> bool {
        let b = Bound::from(n.clone());
        self.lb <= b && b <= self.ub
    }

    pub fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            true
        } else if other.is_bottom() {
            false
        } else {
            other.lb <= self.lb && self.ub <= other.ub
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            other.clone()
        } else if other.is_bottom() {
            self.clone()
        } else {
            Self {
                lb: self.lb.clone().min(other.lb.clone()),
                ub: self.ub.clone().max(other.ub.clone()),
            }
        }
    }

    pub fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            Self::bottom()
        } else {
            Self::new(
                self.lb.clone().max(other.lb.clone()),
                self.ub.clone().min(other.ub.clone()),
            )
        }
    }

    /// Standard interval widening: bounds that grew jump to infinity.
    pub fn widening(&self, other: &Self) -> Self {
        if self.is_bottom() {
            other.clone()
        } else if other.is_bottom() {
            self.clone()
        } else {
            let lb = if other.lb < self.lb {
                Bound::minus_infinity()
            } else {
                self.lb.clone()
            };
            let ub = if other.ub > self.ub {
                Bound::plus_infinity()
            } else {
                self.ub.clone()
            };
            Self { lb, ub }
        }
    }

    /// Widening against a landmark: a growing bound jumps to the nearest
    /// landmark that still contains it, or to infinity past the landmark.
    pub fn widening_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        let t = Bound::from(threshold.clone());
        let lb = if other.lb < self.lb {
            if t <= other.lb {
                t.clone()
            } else {
                Bound::minus_infinity()
            }
        } else {
            self.lb.clone()
        };
        let ub = if other.ub > self.ub {
            if t >= other.ub {
                t
            } else {
                Bound::plus_infinity()
            }
        } else {
            self.ub.clone()
        };
        Self { lb, ub }
    }

    /// Standard interval narrowing: refine only infinite bounds.
    pub fn narrowing(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            Self::bottom()
        } else {
            let lb = if self.lb.is_infinite() {
                other.lb.clone()
            } else {
                self.lb.clone()
            };
            let ub = if self.ub.is_infinite() {
                other.ub.clone()
            } else {
                self.ub.clone()
            };
            Self::new(lb, ub)
        }
    }

    /// Narrowing that also refines bounds sitting exactly on the threshold.
    pub fn narrowing_threshold(&self, other: &Self, threshold: &Int) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let t = Bound::from(threshold.clone());
        let lb = if self.lb.is_infinite() || self.lb == t {
            other.lb.clone()
        } else {
            self.lb.clone()
        };
        let ub = if self.ub.is_infinite() || self.ub == t {
            other.ub.clone()
        } else {
            self.ub.clone()
        };
        Self::new(lb, ub)
    }

    /// Truncated division, excluding zero from the divisor.
    ///
    /// Bottom if the divisor can only be zero.
    pub fn div(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let pos = other.meet(&Self::new(Bound::one(), Bound::plus_infinity()));
        let neg = other.meet(&Self::new(
            Bound::minus_infinity(),
            Bound::from(Int::from(-1)),
        ));
        self.div_known_sign(&pos).join(&self.div_known_sign(&neg))
    }

    fn div_known_sign(&self, divisor: &Self) -> Self {
        if divisor.is_bottom() {
            return Self::bottom();
        }
        // Truncated quotient bounds: evaluate at the four corners.
        let corner = |n: &Bound, d: &Bound| -> Bound {
            match (n, d) {
                (Bound::Finite(a), Bound::Finite(b)) => Bound::from(a / b),
                _ => {
                    // The divisor magnitude only shrinks the quotient, so an
                    // infinite divisor yields 0 for finite dividends.
                    if n.is_finite() {
                        Bound::zero()
                    } else {
                        n * d
                    }
                }
            }
        };
        // An infinite divisor bound means arbitrarily large magnitude: the
        // quotient of a finite dividend approaches 0, so 0 is a corner.
        let candidates = [
            corner(&self.lb, &divisor.lb),
            corner(&self.lb, &divisor.ub),
            corner(&self.ub, &divisor.lb),
            corner(&self.ub, &divisor.ub),
        ];
        let mut lb = candidates[0].clone();
        let mut ub = candidates[0].clone();
        for c in &candidates[1..] {
            lb = lb.min(c.clone());
            ub = ub.max(c.clone());
        }
        // Quotients closer to zero than any corner exist inside the range.
        if self.contains(&Int::zero()) || divisor.lb.is_infinite() || divisor.ub.is_infinite() {
            lb = lb.min(Bound::zero());
            ub = ub.max(Bound::zero());
        }
        Self::new(lb, ub)
    }

    /// Truncated remainder. The result takes the sign of the dividend and
    /// its magnitude is below the divisor's.
    pub fn rem(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let max_divisor = (-other.lb()).max(other.ub().clone());
        let bound = match max_divisor {
            Bound::Finite(n) => Bound::from(&n - &Int::one()),
            _ => Bound::plus_infinity(),
        };
        let lb = if self.lb >= Bound::zero() {
            Bound::zero()
        } else {
            -&bound
        };
        let ub = if self.ub <= Bound::zero() {
            Bound::zero()
        } else {
            bound
        };
        // A singleton pair is exact.
        if let (Some(a), Some(b)) = (self.singleton(), other.singleton()) {
            if !b.is_zero() {
                return Self::singleton_of(a % b);
            }
            return Self::bottom();
        }
        Self::new(lb, ub).meet(&self.join(&Self::singleton_of(0)))
    }

    /// Left shift by a non-negative amount.
    pub fn shl(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let shift = other.meet(&Self::new(Bound::zero(), Bound::plus_infinity()));
        if shift.is_bottom() {
            return Self::bottom();
        }
        let factor = |b: &Bound| -> Option<Int> {
            b.number().and_then(|n| n.to_u32()).map(Int::pow2)
        };
        match (factor(shift.lb()), factor(shift.ub())) {
            (Some(lo), Some(hi)) => {
                let factors = Self::new(Bound::from(lo), Bound::from(hi));
                self.mul(&factors)
            }
            (Some(_), None) => {
                // Unbounded shift: magnitude grows without limit.
                if self.is_bottom() {
                    Self::bottom()
                } else {
                    Self::top()
                }
            }
            _ => Self::top(),
        }
    }

    /// Arithmetic right shift by a non-negative amount (floor division by a
    /// power of two).
    pub fn ashr(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let shift = other.meet(&Self::new(Bound::zero(), Bound::plus_infinity()));
        if shift.is_bottom() {
            return Self::bottom();
        }
        let pow = |b: &Bound| b.number().and_then(|n| n.to_u32());
        match (pow(shift.lb()), pow(shift.ub())) {
            (Some(lo), Some(hi)) => {
                let small = Int::pow2(lo);
                let large = Int::pow2(hi);
                let lb = self
                    .lb
                    .div_floor(&small)
                    .min(self.lb.div_floor(&large));
                let ub = self.ub.div_floor(&small).max(self.ub.div_floor(&large));
                Self::new(lb, ub)
            }
            _ => Self::top(),
        }
    }

    /// Multiplication: min/max over the four corner products.
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let corners = [
            &self.lb * &other.lb,
            &self.lb * &other.ub,
            &self.ub * &other.lb,
            &self.ub * &other.ub,
        ];
        let mut lb = corners[0].clone();
        let mut ub = corners[0].clone();
        for c in &corners[1..] {
            lb = lb.min(c.clone());
            ub = ub.max(c.clone());
        }
        Self { lb, ub }
    }
}

impl Add for &Interval {
    type Output = Interval;

    fn add(self, rhs: &Interval) -> Interval {
        if self.is_bottom() || rhs.is_bottom() {
            return Interval::bottom();
        }
        Interval {
            lb: &self.lb + &rhs.lb,
            ub: &self.ub + &rhs.ub,
        }
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        &self + &rhs
    }
}

impl Sub for &Interval {
    type Output = Interval;

    fn sub(self, rhs: &Interval) -> Interval {
        if self.is_bottom() || rhs.is_bottom() {
            return Interval::bottom();
        }
        Interval {
            lb: &self.lb - &rhs.ub,
            ub: &self.ub - &rhs.lb,
        }
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        &self - &rhs
    }
}

impl Mul for &Interval {
    type Output = Interval;

    fn mul(self, rhs: &Interval) -> Interval {
        Interval::mul(self, rhs)
    }
}

impl Neg for &Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        if self.is_bottom() {
            return Interval::bottom();
        }
        Interval {
            lb: -&self.ub,
            ub: -&self.lb,
        }
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        -&self
    }
}

impl From<Int> for Interval {
    fn from(n: Int) -> Self {
        Self::singleton_of(n)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            write!(f, "_|_")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itv(lb: i64, ub: i64) -> Interval {
        Interval::new(lb, ub)
    }

    #[test]
    fn empty_is_canonical() {
        assert!(Interval::new(3, 2).is_bottom());
        assert_eq!(Interval::new(3, 2), Interval::bottom());
    }

    #[test]
    fn join_meet() {
        assert_eq!(itv(0, 2).join(&itv(5, 7)), itv(0, 7));
        assert_eq!(itv(0, 5).meet(&itv(3, 9)), itv(3, 5));
        assert!(itv(0, 1).meet(&itv(4, 5)).is_bottom());
    }

    #[test]
    fn widening_jumps() {
        assert_eq!(
            itv(0, 1).widening(&itv(0, 2)),
            Interval::new(Bound::zero(), Bound::plus_infinity())
        );
        assert_eq!(itv(0, 2).widening(&itv(0, 2)), itv(0, 2));
    }

    #[test]
    fn widening_threshold_lands() {
        let w = itv(0, 1).widening_threshold(&itv(0, 2), &Int::from(64));
        assert_eq!(w, itv(0, 64));
        let w = itv(0, 1).widening_threshold(&itv(0, 100), &Int::from(64));
        assert_eq!(w, Interval::new(Bound::zero(), Bound::plus_infinity()));
    }

    #[test]
    fn mul_corners() {
        assert_eq!(itv(-2, 3).mul(&itv(-5, 4)), itv(-15, 12));
    }

    #[test]
    fn div_excludes_zero() {
        assert_eq!(itv(10, 20).div(&itv(2, 2)), itv(5, 10));
        assert_eq!(itv(10, 20).div(&itv(0, 2)), itv(5, 20));
        assert!(itv(1, 2).div(&itv(0, 0)).is_bottom());
        assert_eq!(itv(10, 20).div(&itv(-2, 2)), itv(-20, 20));
    }

    #[test]
    fn rem_singleton_exact() {
        assert_eq!(itv(7, 7).rem(&itv(4, 4)), itv(3, 3));
        assert_eq!(itv(-7, -7).rem(&itv(4, 4)), itv(-3, -3));
    }

    #[test]
    fn shifts() {
        assert_eq!(itv(1, 2).shl(&itv(1, 3)), itv(2, 16));
        assert_eq!(itv(-8, 8).ashr(&itv(1, 1)), itv(-4, 4));
    }
}
