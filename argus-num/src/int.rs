//! Arbitrary-precision signed integer.

use core::fmt;
use core::ops::{Add, AddAssign, BitAnd, BitOr, BitXor, Mul, MulAssign, Neg, Rem, Sub, SubAssign};
use core::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::NumberError;

/// Arbitrary-precision signed integer.
///
/// Division and `%` truncate toward zero, as in C; [`Int::mod_floor`] gives
/// the non-negative representative when one is needed.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Int(BigInt);

impl Int {
    /// The integer zero.
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// The integer one.
    pub fn one() -> Self {
        Self(BigInt::one())
    }

    /// `2^exp`.
    pub fn pow2(exp: u32) -> Self {
        Self(BigInt::one() << (exp as usize))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_non_negative(&self) -> bool {
        !self.0.is_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Greatest common divisor. `gcd(0, 0) = 0`.
    pub fn gcd(&self, other: &Self) -> Self {
        Self(self.0.gcd(&other.0))
    }

    /// Least common multiple.
    pub fn lcm(&self, other: &Self) -> Self {
        Self(self.0.lcm(&other.0))
    }

    /// Euclidean remainder: the representative of `self mod m` in `[0, |m|)`.
    ///
    /// Panics if `m` is zero.
    pub fn mod_floor(&self, m: &Self) -> Self {
        assert!(!m.is_zero(), "modulo by zero");
        Self(self.0.mod_floor(&m.0.abs()))
    }

    /// Division rounding toward negative infinity.
    pub fn div_floor(&self, other: &Self) -> Self {
        assert!(!other.is_zero(), "division by zero");
        Self(Integer::div_floor(&self.0, &other.0))
    }

    /// Division rounding toward positive infinity.
    pub fn div_ceil(&self, other: &Self) -> Self {
        assert!(!other.is_zero(), "division by zero");
        Self(Integer::div_ceil(&self.0, &other.0))
    }

    /// Whether `other` divides `self` exactly.
    pub fn is_multiple_of(&self, other: &Self) -> bool {
        !other.is_zero() && self.0.is_multiple_of(&other.0)
    }

    /// Number of bits of the absolute value.
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    /// Left shift by `n` bits.
    pub fn shl(&self, n: u32) -> Self {
        Self(&self.0 << (n as usize))
    }

    /// Arithmetic right shift by `n` bits (rounds toward negative infinity).
    pub fn shr(&self, n: u32) -> Self {
        Self(&self.0 >> (n as usize))
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.0.to_u32()
    }

    pub fn to_usize(&self) -> Option<usize> {
        self.0.to_usize()
    }
}

impl FromStr for Int {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_str(s)
            .map(Self)
            .map_err(|_| NumberError::InvalidLiteral(s.into()))
    }
}

macro_rules! int_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Int {
                fn from(n: $t) -> Self {
                    Self(BigInt::from(n))
                }
            }
        )*
    };
}

int_from!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize, isize);

impl From<BigInt> for Int {
    fn from(n: BigInt) -> Self {
        Self(n)
    }
}

macro_rules! int_binop {
    ($trait:ident, $method:ident) => {
        impl $trait for Int {
            type Output = Int;

            fn $method(self, rhs: Int) -> Int {
                Int((self.0).$method(rhs.0))
            }
        }

        impl $trait<&Int> for Int {
            type Output = Int;

            fn $method(self, rhs: &Int) -> Int {
                Int((self.0).$method(&rhs.0))
            }
        }

        impl $trait<Int> for &Int {
            type Output = Int;

            fn $method(self, rhs: Int) -> Int {
                Int((&self.0).$method(rhs.0))
            }
        }

        impl $trait<&Int> for &Int {
            type Output = Int;

            fn $method(self, rhs: &Int) -> Int {
                Int((&self.0).$method(&rhs.0))
            }
        }
    };
}

int_binop!(Add, add);
int_binop!(Sub, sub);
int_binop!(Mul, mul);
int_binop!(BitAnd, bitand);
int_binop!(BitOr, bitor);
int_binop!(BitXor, bitxor);

/// Truncated division, as in C. Panics on division by zero.
impl core::ops::Div for &Int {
    type Output = Int;

    fn div(self, rhs: &Int) -> Int {
        assert!(!rhs.is_zero(), "division by zero");
        Int(&self.0 / &rhs.0)
    }
}

impl core::ops::Div for Int {
    type Output = Int;

    fn div(self, rhs: Int) -> Int {
        &self / &rhs
    }
}

/// Truncated remainder: takes the sign of the dividend. Panics on zero.
impl Rem for &Int {
    type Output = Int;

    fn rem(self, rhs: &Int) -> Int {
        assert!(!rhs.is_zero(), "remainder by zero");
        Int(&self.0 % &rhs.0)
    }
}

impl Rem for Int {
    type Output = Int;

    fn rem(self, rhs: Int) -> Int {
        &self % &rhs
    }
}

impl Neg for Int {
    type Output = Int;

    fn neg(self) -> Int {
        Int(-self.0)
    }
}

impl Neg for &Int {
    type Output = Int;

    fn neg(self) -> Int {
        Int(-&self.0)
    }
}

impl AddAssign<&Int> for Int {
    fn add_assign(&mut self, rhs: &Int) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Int> for Int {
    fn sub_assign(&mut self, rhs: &Int) {
        self.0 -= &rhs.0;
    }
}

impl MulAssign<&Int> for Int {
    fn mul_assign(&mut self, rhs: &Int) {
        self.0 *= &rhs.0;
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_division() {
        let a = Int::from(-7);
        let b = Int::from(2);
        assert_eq!(&a / &b, Int::from(-3));
        assert_eq!(&a % &b, Int::from(-1));
        assert_eq!(a.mod_floor(&b), Int::from(1));
    }

    #[test]
    fn floor_division() {
        assert_eq!(Int::from(-7).div_floor(&Int::from(2)), Int::from(-4));
        assert_eq!(Int::from(-7).div_ceil(&Int::from(2)), Int::from(-3));
    }

    #[test]
    fn pow2() {
        assert_eq!(Int::pow2(0), Int::one());
        assert_eq!(Int::pow2(8), Int::from(256));
        assert_eq!(Int::pow2(64), Int::from(1u128 << 64));
    }

    #[test]
    fn gcd_of_zeros() {
        assert_eq!(Int::zero().gcd(&Int::zero()), Int::zero());
        assert_eq!(Int::from(12).gcd(&Int::from(-8)), Int::from(4));
    }

    #[test]
    fn parse() {
        assert_eq!("-42".parse::<Int>().unwrap(), Int::from(-42));
        assert!("4x2".parse::<Int>().is_err());
    }
}
