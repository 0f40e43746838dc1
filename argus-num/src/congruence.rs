//! Arithmetic congruence `aℤ + b`.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

use crate::{Int, Interval};

/// A congruence class `aℤ + b` with `a ≥ 0`, or bottom.
///
/// `a = 0` denotes the singleton `{b}`. Normal form: `0 ≤ b < a` when
/// `a > 0`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Congruence {
    Bottom,
    Modular {
        /// Modulus, `≥ 0`.
        modulus: Int,
        /// Residue; within `[0, modulus)` when the modulus is positive.
        residue: Int,
    },
}

use Congruence::{Bottom, Modular};

impl Congruence {
    pub fn bottom() -> Self {
        Bottom
    }

    /// `1ℤ + 0`, the full set of integers.
    pub fn top() -> Self {
        Self::new(Int::one(), Int::zero())
    }

    /// The congruence `aℤ + b`, normalized.
    pub fn new(modulus: impl Into<Int>, residue: impl Into<Int>) -> Self {
        let modulus = modulus.into().abs();
        let residue = residue.into();
        if modulus.is_zero() {
            Modular { modulus, residue }
        } else {
            let residue = residue.mod_floor(&modulus);
            Modular { modulus, residue }
        }
    }

    /// The singleton `{n}`.
    pub fn singleton_of(n: impl Into<Int>) -> Self {
        Modular {
            modulus: Int::zero(),
            residue: n.into(),
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Bottom)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Modular { modulus, .. } if *modulus == Int::one())
    }

    /// The unique element, if the congruence is a singleton.
    pub fn singleton(&self) -> Option<&Int> {
        match self {
            Modular { modulus, residue } if modulus.is_zero() => Some(residue),
            _ => None,
        }
    }

    pub fn modulus(&self) -> Option<&Int> {
        match self {
            Modular { modulus, .. } => Some(modulus),
            Bottom => None,
        }
    }

    pub fn residue(&self) -> Option<&Int> {
        match self {
            Modular { residue, .. } => Some(residue),
            Bottom => None,
        }
    }

    pub fn contains(&self, n: &Int) -> bool {
        match self {
            Bottom => false,
            Modular { modulus, residue } => {
                if modulus.is_zero() {
                    n == residue
                } else {
                    n.mod_floor(modulus) == *residue
                }
            }
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Bottom, _) => true,
            (_, Bottom) => false,
            (Modular { modulus: a1, residue: b1 }, Modular { modulus: a2, residue: b2 }) => {
                if a2.is_zero() {
                    a1.is_zero() && b1 == b2
                } else {
                    // a₁ℤ + b₁ ⊆ a₂ℤ + b₂ iff a₂ | a₁ and b₁ ≡ b₂ [a₂]
                    (a1.is_multiple_of(a2) || a1.is_zero())
                        && b1.mod_floor(a2) == b2.mod_floor(a2)
                }
            }
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Bottom, c) | (c, Bottom) => c.clone(),
            (Modular { modulus: a1, residue: b1 }, Modular { modulus: a2, residue: b2 }) => {
                let diff = (b1 - b2).abs();
                let modulus = a1.gcd(a2).gcd(&diff);
                Self::new(modulus, b1.clone())
            }
        }
    }

    /// Exact intersection by the Chinese remainder theorem.
    pub fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Modular { modulus: a1, residue: b1 }, Modular { modulus: a2, residue: b2 }) => {
                if a1.is_zero() {
                    return if other.contains(b1) { self.clone() } else { Bottom };
                }
                if a2.is_zero() {
                    return if self.contains(b2) { other.clone() } else { Bottom };
                }
                let g = a1.gcd(a2);
                if !(b1 - b2).is_multiple_of(&g) {
                    return Bottom;
                }
                // x = b1 + a1·k, with b1 + a1·k ≡ b2 [a2].
                // Solve (a1/g)·k ≡ (b2-b1)/g [a2/g].
                let lcm = a1.lcm(a2);
                let a1g = a1 / &g;
                let a2g = a2 / &g;
                let target = (b2 - b1).div_floor(&g).mod_floor(&a2g);
                let mut k = Int::zero();
                let mut residue = b1.clone();
                // Walk the small quotient ring; moduli in analyzed code are
                // tiny (alignments and strides).
                while k < a2g {
                    if (&a1g * &k).mod_floor(&a2g) == target {
                        residue = b1 + &(a1 * &k);
                        break;
                    }
                    k = k + Int::one();
                }
                Self::new(lcm, residue)
            }
        }
    }

    /// Widening: the per-variable chain `a₁ | a₂ | …` of divisors is
    /// finite once the residue stabilizes, so join suffices.
    pub fn widening(&self, other: &Self) -> Self {
        self.join(other)
    }

    pub fn narrowing(&self, other: &Self) -> Self {
        // Refine only the top congruence; anything finer is kept.
        if self.is_top() {
            other.clone()
        } else {
            self.clone()
        }
    }

    /// Sound division: exact only on singletons dividing evenly.
    pub fn div(&self, other: &Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            _ => {
                if let (Some(a), Some(b)) = (self.singleton(), other.singleton()) {
                    if b.is_zero() {
                        Bottom
                    } else {
                        Self::singleton_of(a / b)
                    }
                } else {
                    Self::top()
                }
            }
        }
    }

    /// Sound remainder.
    pub fn rem(&self, other: &Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Modular { modulus: a1, residue: b1 }, Modular { modulus: a2, residue: b2 }) => {
                if let (Some(a), Some(b)) = (self.singleton(), other.singleton()) {
                    return if b.is_zero() {
                        Bottom
                    } else {
                        Self::singleton_of(a % b)
                    };
                }
                // x mod m preserves the congruence modulo gcd(a1, a2, b2).
                let g = a1.gcd(a2).gcd(b2);
                if g.is_zero() {
                    Self::top()
                } else {
                    Self::new(g, b1.clone())
                }
            }
        }
    }

    /// Interval of values compatible with the congruence, intersected with
    /// the given range. Used for reduction in the product domain.
    pub fn to_interval(&self) -> Interval {
        match self {
            Bottom => Interval::bottom(),
            Modular { modulus, residue } => {
                if modulus.is_zero() {
                    Interval::singleton_of(residue.clone())
                } else {
                    Interval::top()
                }
            }
        }
    }
}

impl Add for &Congruence {
    type Output = Congruence;

    fn add(self, rhs: &Congruence) -> Congruence {
        match (self, rhs) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (
                Modular { modulus: a1, residue: b1 },
                Modular { modulus: a2, residue: b2 },
            ) => Congruence::new(a1.gcd(a2), b1 + b2),
        }
    }
}

impl Sub for &Congruence {
    type Output = Congruence;

    fn sub(self, rhs: &Congruence) -> Congruence {
        self + &-rhs
    }
}

impl Mul for &Congruence {
    type Output = Congruence;

    fn mul(self, rhs: &Congruence) -> Congruence {
        match (self, rhs) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (
                Modular { modulus: a1, residue: b1 },
                Modular { modulus: a2, residue: b2 },
            ) => {
                let modulus = (a1 * a2).gcd(&(a1 * b2)).gcd(&(a2 * b1));
                Congruence::new(modulus, b1 * b2)
            }
        }
    }
}

impl Neg for &Congruence {
    type Output = Congruence;

    fn neg(self) -> Congruence {
        match self {
            Bottom => Bottom,
            Modular { modulus, residue } => Congruence::new(modulus.clone(), -residue),
        }
    }
}

impl fmt::Display for Congruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bottom => write!(f, "_|_"),
            Modular { modulus, residue } => {
                if modulus.is_zero() {
                    write!(f, "{{{residue}}}")
                } else {
                    write!(f, "{modulus}Z+{residue}")
                }
            }
        }
    }
}

impl fmt::Debug for Congruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_form() {
        assert_eq!(Congruence::new(4, 7), Congruence::new(4, 3));
        assert_eq!(Congruence::new(-4, -1), Congruence::new(4, 3));
    }

    #[test]
    fn join_of_singletons() {
        let j = Congruence::singleton_of(3).join(&Congruence::singleton_of(7));
        assert_eq!(j, Congruence::new(4, 3));
        assert!(j.contains(&Int::from(11)));
        assert!(!j.contains(&Int::from(4)));
    }

    #[test]
    fn meet_crt() {
        // x ≡ 1 [4] and x ≡ 3 [6]: solutions 9, 21, 33, ... = 12Z + 9
        let m = Congruence::new(4, 1).meet(&Congruence::new(6, 3));
        assert_eq!(m, Congruence::new(12, 9));

        // Incompatible residues
        assert!(Congruence::new(4, 1).meet(&Congruence::new(4, 2)).is_bottom());
    }

    #[test]
    fn arithmetic() {
        let a = Congruence::new(4, 1);
        let b = Congruence::new(6, 3);
        assert_eq!(&a + &b, Congruence::new(2, 0));
        assert_eq!(&a * &b, Congruence::new(2, 1));
    }

    #[test]
    fn leq() {
        assert!(Congruence::new(8, 3).leq(&Congruence::new(4, 3)));
        assert!(!Congruence::new(4, 3).leq(&Congruence::new(8, 3)));
        assert!(Congruence::singleton_of(7).leq(&Congruence::new(4, 3)));
    }
}
