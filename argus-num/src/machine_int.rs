//! Bounded two's-complement machine integer.

use core::cmp::Ordering;
use core::fmt;

use crate::Int;

/// Signedness of a machine integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sign {
    #[display(fmt = "signed")]
    Signed,
    #[display(fmt = "unsigned")]
    Unsigned,
}

/// Normalized representative of ℤ/2^w ℤ, interpreted as signed or unsigned.
///
/// The stored value is always within `[0, 2^w)`; the semantic value is
/// recovered on demand by [`MachineInt::to_int`]. Arithmetic wraps, and the
/// `*_overflow` variants additionally report whether wrapping occurred.
///
/// Operands of a binary operation must have the same width and sign;
/// mixing them is a programming error and panics.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineInt {
    /// Stored representative, within `[0, 2^width)`.
    bits: Int,
    width: u32,
    sign: Sign,
}

fn assert_compatible(lhs: &MachineInt, rhs: &MachineInt) {
    assert!(
        lhs.width == rhs.width && lhs.sign == rhs.sign,
        "incompatible machine integer types: {}{} and {}{}",
        lhs.sign,
        lhs.width,
        rhs.sign,
        rhs.width,
    );
}

impl MachineInt {
    /// Create a machine integer from any integer, wrapping into the type.
    pub fn new(value: impl Into<Int>, width: u32, sign: Sign) -> Self {
        assert!(width >= 1, "bit width must be at least 1");
        let bits = value.into().mod_floor(&Int::pow2(width));
        Self { bits, width, sign }
    }

    /// The minimum value of the type.
    pub fn min(width: u32, sign: Sign) -> Self {
        match sign {
            Sign::Signed => Self::new(-Int::pow2(width - 1), width, sign),
            Sign::Unsigned => Self::new(Int::zero(), width, sign),
        }
    }

    /// The maximum value of the type.
    pub fn max(width: u32, sign: Sign) -> Self {
        match sign {
            Sign::Signed => Self::new(Int::pow2(width - 1) - Int::one(), width, sign),
            Sign::Unsigned => Self::new(Int::pow2(width) - Int::one(), width, sign),
        }
    }

    /// The zero of the type.
    pub fn zero(width: u32, sign: Sign) -> Self {
        Self::new(Int::zero(), width, sign)
    }

    /// The value with all bits set.
    pub fn all_ones(width: u32, sign: Sign) -> Self {
        Self::new(Int::pow2(width) - Int::one(), width, sign)
    }

    pub fn bit_width(&self) -> u32 {
        self.width
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The semantic value: within `[-2^(w-1), 2^(w-1))` if signed,
    /// `[0, 2^w)` if unsigned.
    pub fn to_int(&self) -> Int {
        match self.sign {
            Sign::Unsigned => self.bits.clone(),
            Sign::Signed => {
                if self.high_bit() {
                    &self.bits - Int::pow2(self.width)
                } else {
                    self.bits.clone()
                }
            }
        }
    }

    /// The sign bit.
    pub fn high_bit(&self) -> bool {
        self.bits >= Int::pow2(self.width - 1)
    }

    pub fn is_zero(&self) -> bool {
        self.bits.is_zero()
    }

    pub fn is_min(&self) -> bool {
        *self == Self::min(self.width, self.sign)
    }

    pub fn is_max(&self) -> bool {
        *self == Self::max(self.width, self.sign)
    }

    /// Strictly negative. Always false for unsigned integers.
    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Signed && self.high_bit()
    }

    pub fn is_non_negative(&self) -> bool {
        !self.is_negative()
    }

    /// Number of leading zero bits.
    pub fn leading_zeros(&self) -> u32 {
        let used = self.bits.bits() as u32;
        self.width - used
    }

    /// Number of leading one bits.
    pub fn leading_ones(&self) -> u32 {
        let flipped = Self::new(
            Int::pow2(self.width) - Int::one() - &self.bits,
            self.width,
            self.sign,
        );
        flipped.leading_zeros()
    }

    /// Truncate to a strictly smaller bit width, keeping the low bits.
    pub fn trunc(&self, width: u32) -> Self {
        assert!(width < self.width, "trunc must shrink the bit width");
        Self::new(self.bits.clone(), width, self.sign)
    }

    /// Extend to a strictly larger bit width, preserving the semantic value.
    pub fn ext(&self, width: u32) -> Self {
        assert!(width > self.width, "ext must grow the bit width");
        Self::new(self.to_int(), width, self.sign)
    }

    /// Reinterpret the bits with the other signedness.
    pub fn sign_cast(&self, sign: Sign) -> Self {
        assert!(self.sign != sign, "sign_cast must change the signedness");
        Self {
            bits: self.bits.clone(),
            width: self.width,
            sign,
        }
    }

    /// Cast to an arbitrary width and sign.
    ///
    /// Equivalent to `trunc`/`ext` in the original signedness, then
    /// `sign_cast`.
    pub fn cast(&self, width: u32, sign: Sign) -> Self {
        match width.cmp(&self.width) {
            Ordering::Less => Self::new(self.bits.clone(), width, sign),
            _ => Self::new(self.to_int(), width, sign),
        }
    }
}

// Binary operations. Each returns a wrapped result; the `*_overflow` /
// `*_exact` variants also report whether information was lost.
impl MachineInt {
    pub fn add(lhs: &Self, rhs: &Self) -> Self {
        Self::add_overflow(lhs, rhs).0
    }

    pub fn add_overflow(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let exact = lhs.to_int() + rhs.to_int();
        let result = Self::new(exact.clone(), lhs.width, lhs.sign);
        let overflow = result.to_int() != exact;
        (result, overflow)
    }

    pub fn sub(lhs: &Self, rhs: &Self) -> Self {
        Self::sub_overflow(lhs, rhs).0
    }

    pub fn sub_overflow(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let exact = lhs.to_int() - rhs.to_int();
        let result = Self::new(exact.clone(), lhs.width, lhs.sign);
        let overflow = result.to_int() != exact;
        (result, overflow)
    }

    pub fn mul(lhs: &Self, rhs: &Self) -> Self {
        Self::mul_overflow(lhs, rhs).0
    }

    pub fn mul_overflow(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let exact = lhs.to_int() * rhs.to_int();
        let result = Self::new(exact.clone(), lhs.width, lhs.sign);
        let overflow = result.to_int() != exact;
        (result, overflow)
    }

    /// Truncated division on semantic values. Panics if `rhs` is zero;
    /// callers are expected to have handled the zero divisor.
    pub fn div(lhs: &Self, rhs: &Self) -> Self {
        Self::div_overflow(lhs, rhs).0
    }

    /// Division with overflow (`MIN / -1`) and exactness reporting.
    pub fn div_overflow(lhs: &Self, rhs: &Self) -> (Self, bool, bool) {
        assert_compatible(lhs, rhs);
        assert!(!rhs.is_zero(), "machine integer division by zero");
        let a = lhs.to_int();
        let b = rhs.to_int();
        let quotient = &a / &b;
        let exact = (&a % &b).is_zero();
        let result = Self::new(quotient.clone(), lhs.width, lhs.sign);
        let overflow = result.to_int() != quotient;
        (result, overflow, exact)
    }

    /// Truncated remainder on semantic values: takes the sign of the
    /// dividend. Panics if `rhs` is zero.
    pub fn rem(lhs: &Self, rhs: &Self) -> Self {
        assert_compatible(lhs, rhs);
        assert!(!rhs.is_zero(), "machine integer remainder by zero");
        Self::new(lhs.to_int() % rhs.to_int(), lhs.width, lhs.sign)
    }

    /// Left shift. The shift count must be within `[0, w)`.
    pub fn shl(lhs: &Self, rhs: &Self) -> Self {
        Self::shl_overflow(lhs, rhs).0
    }

    pub fn shl_overflow(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let count = Self::shift_count(lhs, rhs);
        let exact = lhs.to_int().shl(count);
        let result = Self::new(exact.clone(), lhs.width, lhs.sign);
        let overflow = result.to_int() != exact;
        (result, overflow)
    }

    /// Logical right shift on the stored bits.
    pub fn lshr(lhs: &Self, rhs: &Self) -> Self {
        Self::lshr_exact(lhs, rhs).0
    }

    pub fn lshr_exact(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let count = Self::shift_count(lhs, rhs);
        let shifted = lhs.bits.shr(count);
        let exact = shifted.shl(count) == lhs.bits;
        (Self::new(shifted, lhs.width, lhs.sign), exact)
    }

    /// Arithmetic right shift on the semantic value.
    pub fn ashr(lhs: &Self, rhs: &Self) -> Self {
        Self::ashr_exact(lhs, rhs).0
    }

    pub fn ashr_exact(lhs: &Self, rhs: &Self) -> (Self, bool) {
        assert_compatible(lhs, rhs);
        let count = Self::shift_count(lhs, rhs);
        let value = lhs.to_int();
        let shifted = value.shr(count);
        let exact = shifted.shl(count) == value;
        (Self::new(shifted, lhs.width, lhs.sign), exact)
    }

    pub fn and(lhs: &Self, rhs: &Self) -> Self {
        assert_compatible(lhs, rhs);
        Self::new(&lhs.bits & &rhs.bits, lhs.width, lhs.sign)
    }

    pub fn or(lhs: &Self, rhs: &Self) -> Self {
        assert_compatible(lhs, rhs);
        Self::new(&lhs.bits | &rhs.bits, lhs.width, lhs.sign)
    }

    pub fn xor(lhs: &Self, rhs: &Self) -> Self {
        assert_compatible(lhs, rhs);
        Self::new(&lhs.bits ^ &rhs.bits, lhs.width, lhs.sign)
    }

    /// Greatest common divisor of the semantic absolute values.
    pub fn gcd(lhs: &Self, rhs: &Self) -> Self {
        assert_compatible(lhs, rhs);
        Self::new(lhs.to_int().gcd(&rhs.to_int()), lhs.width, lhs.sign)
    }

    fn shift_count(lhs: &Self, rhs: &Self) -> u32 {
        let count = rhs.to_int();
        assert!(count.is_non_negative(), "shift count is negative");
        let count = count.to_u32().filter(|c| *c < lhs.width);
        count.expect("shift count exceeds the bit width")
    }
}

impl PartialOrd for MachineInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MachineInt {
    /// Comparison on semantic values; requires identical width and sign.
    fn cmp(&self, other: &Self) -> Ordering {
        assert_compatible(self, other);
        self.to_int().cmp(&other.to_int())
    }
}

impl fmt::Display for MachineInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_int().fmt(f)
    }
}

impl fmt::Debug for MachineInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.to_int(), self.sign, self.width)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn si32(n: i64) -> MachineInt {
        MachineInt::new(n, 32, Sign::Signed)
    }

    fn u8v(n: i64) -> MachineInt {
        MachineInt::new(n, 8, Sign::Unsigned)
    }

    #[test]
    fn normalization() {
        assert_eq!(u8v(256), u8v(0));
        assert_eq!(u8v(-1), u8v(255));
        assert_eq!(MachineInt::new(-1, 8, Sign::Signed).to_int(), Int::from(-1));
    }

    #[test]
    fn add_wraps_and_flags() {
        let (r, o) = MachineInt::add_overflow(&u8v(200), &u8v(100));
        assert_eq!(r, u8v(44));
        assert!(o);

        let (r, o) = MachineInt::add_overflow(&si32(1), &si32(2));
        assert_eq!(r, si32(3));
        assert!(!o);

        let max = MachineInt::max(32, Sign::Signed);
        let (r, o) = MachineInt::add_overflow(&max, &si32(1));
        assert_eq!(r, MachineInt::min(32, Sign::Signed));
        assert!(o);
    }

    #[test]
    fn division() {
        let (r, o, exact) = MachineInt::div_overflow(&si32(-7), &si32(2));
        assert_eq!(r, si32(-3));
        assert!(!o);
        assert!(!exact);

        let min = MachineInt::min(32, Sign::Signed);
        let (r, o, _) = MachineInt::div_overflow(&min, &si32(-1));
        assert_eq!(r, min);
        assert!(o);
    }

    #[test]
    fn shifts() {
        let (r, o) = MachineInt::shl_overflow(&u8v(0b0110_0000), &u8v(2));
        assert_eq!(r, u8v(0b1000_0000));
        assert!(o);

        let (r, exact) = MachineInt::lshr_exact(&u8v(0b100), &u8v(2));
        assert_eq!(r, u8v(1));
        assert!(exact);

        let (r, exact) = MachineInt::ashr_exact(&si32(-5), &si32(1));
        assert_eq!(r, si32(-3));
        assert!(!exact);
    }

    #[test]
    fn casts() {
        let n = MachineInt::new(-1, 8, Sign::Signed);
        assert_eq!(n.ext(32), si32(-1));
        assert_eq!(n.sign_cast(Sign::Unsigned), u8v(255));
        assert_eq!(si32(0x1ff).trunc(8), MachineInt::new(-1, 8, Sign::Signed));
        assert_eq!(n.cast(32, Sign::Unsigned).to_int(), Int::from(u32::MAX));
    }

    #[test]
    #[should_panic(expected = "incompatible machine integer types")]
    fn width_mismatch_panics() {
        MachineInt::add(&u8v(1), &si32(1));
    }

    #[quickcheck_macros::quickcheck]
    fn arithmetic_is_modular(a: i64, b: i64) -> bool {
        let x = MachineInt::new(a, 32, Sign::Unsigned);
        let y = MachineInt::new(b, 32, Sign::Unsigned);
        let modulus = Int::pow2(32);
        MachineInt::add(&x, &y).to_int() == (Int::from(a) + Int::from(b)).mod_floor(&modulus)
            && MachineInt::mul(&x, &y).to_int()
                == (Int::from(a) * Int::from(b)).mod_floor(&modulus)
    }

    #[quickcheck_macros::quickcheck]
    fn overflow_flag_matches_range(a: i32, b: i32) -> bool {
        let x = MachineInt::new(a, 32, Sign::Signed);
        let y = MachineInt::new(b, 32, Sign::Signed);
        let (_, overflow) = MachineInt::add_overflow(&x, &y);
        overflow == i32::checked_add(a, b).is_none()
    }
}
