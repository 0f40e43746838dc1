//! Machine-integer congruence.

use core::fmt;

use crate::{Congruence, Int, MachineInt, Sign};

/// A congruence `aℤ + b` over the machine integers of one `(width, sign)`
/// type.
///
/// Wrapping modulo `2^w` preserves any congruence whose modulus divides
/// `2^w`; other moduli are weakened to `gcd(a, 2^w)`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntCongruence {
    congruence: Congruence,
    width: u32,
    sign: Sign,
}

fn assert_compatible(lhs: &IntCongruence, rhs: &IntCongruence) {
    assert!(
        lhs.width == rhs.width && lhs.sign == rhs.sign,
        "incompatible machine integer congruences"
    );
}

impl IntCongruence {
    pub fn top(width: u32, sign: Sign) -> Self {
        Self {
            congruence: Congruence::top(),
            width,
            sign,
        }
    }

    pub fn bottom(width: u32, sign: Sign) -> Self {
        Self {
            congruence: Congruence::bottom(),
            width,
            sign,
        }
    }

    pub fn singleton_of(n: &MachineInt) -> Self {
        Self {
            congruence: Congruence::singleton_of(n.to_int()),
            width: n.bit_width(),
            sign: n.sign(),
        }
    }

    /// Wrap an unbounded congruence into the type.
    pub fn from_unbounded(congruence: Congruence, width: u32, sign: Sign) -> Self {
        let congruence = match (congruence.modulus(), congruence.residue()) {
            (Some(modulus), Some(residue)) => {
                if modulus.is_zero() {
                    Congruence::singleton_of(MachineInt::new(residue.clone(), width, sign).to_int())
                } else {
                    let m = modulus.gcd(&Int::pow2(width));
                    Congruence::new(m, residue.clone())
                }
            }
            _ => Congruence::bottom(),
        };
        Self {
            congruence,
            width,
            sign,
        }
    }

    pub fn bit_width(&self) -> u32 {
        self.width
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn to_congruence(&self) -> &Congruence {
        &self.congruence
    }

    pub fn is_bottom(&self) -> bool {
        self.congruence.is_bottom()
    }

    pub fn is_top(&self) -> bool {
        self.congruence.is_top()
    }

    pub fn singleton(&self) -> Option<MachineInt> {
        self.congruence
            .singleton()
            .map(|n| MachineInt::new(n.clone(), self.width, self.sign))
    }

    pub fn contains(&self, n: &MachineInt) -> bool {
        assert!(n.bit_width() == self.width && n.sign() == self.sign);
        self.congruence.contains(&n.to_int())
    }

    pub fn leq(&self, other: &Self) -> bool {
        assert_compatible(self, other);
        self.congruence.leq(&other.congruence)
    }

    pub fn join(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self {
            congruence: self.congruence.join(&other.congruence),
            width: self.width,
            sign: self.sign,
        }
    }

    pub fn meet(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self {
            congruence: self.congruence.meet(&other.congruence),
            width: self.width,
            sign: self.sign,
        }
    }

    pub fn widening(&self, other: &Self) -> Self {
        self.join(other)
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        assert_compatible(self, other);
        Self {
            congruence: self.congruence.narrowing(&other.congruence),
            width: self.width,
            sign: self.sign,
        }
    }

    pub fn cast(&self, width: u32, sign: Sign) -> Self {
        if self.is_bottom() {
            return Self::bottom(width, sign);
        }
        Self::from_unbounded(self.congruence.clone(), width, sign)
    }
}

impl From<MachineInt> for IntCongruence {
    fn from(n: MachineInt) -> Self {
        Self::singleton_of(&n)
    }
}

impl fmt::Display for IntCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.congruence.fmt(f)
    }
}

impl fmt::Debug for IntCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.congruence, self.sign, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_power_of_two_moduli() {
        let c = IntCongruence::from_unbounded(Congruence::new(4, 1), 8, Sign::Unsigned);
        assert_eq!(c.to_congruence(), &Congruence::new(4, 1));
    }

    #[test]
    fn wrap_weakens_other_moduli() {
        let c = IntCongruence::from_unbounded(Congruence::new(6, 1), 8, Sign::Unsigned);
        assert_eq!(c.to_congruence(), &Congruence::new(2, 1));
    }

    #[test]
    fn wrap_singleton() {
        let c = IntCongruence::from_unbounded(
            Congruence::singleton_of(257),
            8,
            Sign::Unsigned,
        );
        assert_eq!(
            c.singleton(),
            Some(MachineInt::new(1, 8, Sign::Unsigned))
        );
    }
}
