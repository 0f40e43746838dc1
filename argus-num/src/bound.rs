//! Integer bound: an integer or an infinity.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

use crate::Int;

/// An element of ℤ ∪ {−∞, +∞}.
///
/// Arithmetic follows the usual rules on infinities, with `0 · ±∞ = 0`.
/// Adding `−∞` to `+∞` is meaningless and panics.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    MinusInfinity,
    Finite(Int),
    PlusInfinity,
}

use Bound::{Finite, MinusInfinity, PlusInfinity};

impl Bound {
    pub fn minus_infinity() -> Self {
        MinusInfinity
    }

    pub fn plus_infinity() -> Self {
        PlusInfinity
    }

    pub fn zero() -> Self {
        Finite(Int::zero())
    }

    pub fn one() -> Self {
        Finite(Int::one())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Finite(_))
    }

    pub fn is_infinite(&self) -> bool {
        !self.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Finite(n) if n.is_zero())
    }

    /// The finite value, if any.
    pub fn number(&self) -> Option<&Int> {
        match self {
            Finite(n) => Some(n),
            _ => None,
        }
    }

    /// The finite value; panics on infinities.
    pub fn to_int(&self) -> Int {
        match self {
            Finite(n) => n.clone(),
            MinusInfinity => panic!("bound is -oo"),
            PlusInfinity => panic!("bound is +oo"),
        }
    }

    /// Division rounding toward negative infinity. `±∞ / n` keeps the sign
    /// of the quotient; the divisor must be finite and non-zero.
    pub fn div_floor(&self, rhs: &Int) -> Bound {
        assert!(!rhs.is_zero(), "division by zero");
        match self {
            Finite(n) => Finite(n.div_floor(rhs)),
            MinusInfinity => {
                if rhs.is_negative() {
                    PlusInfinity
                } else {
                    MinusInfinity
                }
            }
            PlusInfinity => {
                if rhs.is_negative() {
                    MinusInfinity
                } else {
                    PlusInfinity
                }
            }
        }
    }

    /// Division rounding toward positive infinity.
    pub fn div_ceil(&self, rhs: &Int) -> Bound {
        assert!(!rhs.is_zero(), "division by zero");
        match self {
            Finite(n) => Finite(n.div_ceil(rhs)),
            _ => self.div_floor(rhs),
        }
    }

    pub fn min(self, other: Bound) -> Bound {
        if self <= other {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Bound) -> Bound {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl From<Int> for Bound {
    fn from(n: Int) -> Self {
        Finite(n)
    }
}

macro_rules! bound_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Bound {
                fn from(n: $t) -> Self {
                    Finite(Int::from(n))
                }
            }
        )*
    };
}

bound_from!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize, isize);

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MinusInfinity, MinusInfinity) | (PlusInfinity, PlusInfinity) => Ordering::Equal,
            (MinusInfinity, _) | (_, PlusInfinity) => Ordering::Less,
            (_, MinusInfinity) | (PlusInfinity, _) => Ordering::Greater,
            (Finite(a), Finite(b)) => a.cmp(b),
        }
    }
}

impl Add for &Bound {
    type Output = Bound;

    fn add(self, rhs: &Bound) -> Bound {
        match (self, rhs) {
            (MinusInfinity, PlusInfinity) | (PlusInfinity, MinusInfinity) => {
                panic!("adding -oo and +oo")
            }
            (MinusInfinity, _) | (_, MinusInfinity) => MinusInfinity,
            (PlusInfinity, _) | (_, PlusInfinity) => PlusInfinity,
            (Finite(a), Finite(b)) => Finite(a + b),
        }
    }
}

impl Add for Bound {
    type Output = Bound;

    fn add(self, rhs: Bound) -> Bound {
        &self + &rhs
    }
}

impl Add<&Int> for &Bound {
    type Output = Bound;

    fn add(self, rhs: &Int) -> Bound {
        self + &Finite(rhs.clone())
    }
}

impl Sub for &Bound {
    type Output = Bound;

    fn sub(self, rhs: &Bound) -> Bound {
        self + &-rhs
    }
}

impl Sub for Bound {
    type Output = Bound;

    fn sub(self, rhs: Bound) -> Bound {
        &self - &rhs
    }
}

impl Mul for &Bound {
    type Output = Bound;

    fn mul(self, rhs: &Bound) -> Bound {
        if self.is_zero() || rhs.is_zero() {
            return Bound::zero();
        }
        match (self, rhs) {
            (Finite(a), Finite(b)) => Finite(a * b),
            _ => {
                let negative = match (self, rhs) {
                    (MinusInfinity, b) => !matches!(b, MinusInfinity) && b > &Bound::zero(),
                    (a, MinusInfinity) => a > &Bound::zero(),
                    (PlusInfinity, b) => b < &Bound::zero(),
                    (a, PlusInfinity) => a < &Bound::zero(),
                    _ => unreachable!(),
                };
                if negative {
                    MinusInfinity
                } else {
                    PlusInfinity
                }
            }
        }
    }
}

impl Mul for Bound {
    type Output = Bound;

    fn mul(self, rhs: Bound) -> Bound {
        &self * &rhs
    }
}

impl Neg for &Bound {
    type Output = Bound;

    fn neg(self) -> Bound {
        match self {
            MinusInfinity => PlusInfinity,
            PlusInfinity => MinusInfinity,
            Finite(n) => Finite(-n),
        }
    }
}

impl Neg for Bound {
    type Output = Bound;

    fn neg(self) -> Bound {
        -&self
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinusInfinity => write!(f, "-oo"),
            PlusInfinity => write!(f, "+oo"),
            Finite(n) => n.fmt(f),
        }
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Bound::minus_infinity() < Bound::from(0));
        assert!(Bound::from(0) < Bound::plus_infinity());
        assert!(Bound::from(-3) < Bound::from(2));
    }

    #[test]
    fn zero_times_infinity() {
        assert_eq!(Bound::zero() * Bound::plus_infinity(), Bound::zero());
        assert_eq!(Bound::minus_infinity() * Bound::zero(), Bound::zero());
    }

    #[test]
    fn infinity_signs() {
        assert_eq!(
            Bound::from(-2) * Bound::plus_infinity(),
            Bound::minus_infinity()
        );
        assert_eq!(
            Bound::minus_infinity() * Bound::minus_infinity(),
            Bound::plus_infinity()
        );
    }

    #[test]
    #[should_panic(expected = "adding -oo and +oo")]
    fn contradictory_sum_panics() {
        let _ = Bound::minus_infinity() + Bound::plus_infinity();
    }
}
