//! Value arithmetic shared by the non-relational environments.

use argus_num::{Congruence, Int, Interval, IntervalCongruence};

use crate::separate::LatticeValue;

use super::NumBinOp;

/// A value lattice with sound arithmetic, usable as the codomain of a
/// non-relational environment.
pub trait NumValue: LatticeValue {
    fn singleton_of(n: &Int) -> Self;

    fn singleton(&self) -> Option<Int>;

    fn apply(op: NumBinOp, lhs: &Self, rhs: &Self) -> Self;

    fn neg(&self) -> Self;

    /// Interval over-approximation of the value.
    fn to_bounds(&self) -> Interval;

    /// Congruence over-approximation of the value.
    fn to_congruence(&self) -> Congruence;

    /// Best representation of an interval in this lattice.
    fn from_bounds(bounds: &Interval) -> Self;

    /// Best representation of an interval-congruence pair.
    fn from_interval_congruence(value: &IntervalCongruence) -> Self;

    /// Meet with interval information, used by constraint propagation.
    fn refine_bounds(&self, bounds: &Interval) -> Self {
        self.meet(&Self::from_bounds(bounds))
    }
}

impl NumValue for Interval {
    fn singleton_of(n: &Int) -> Self {
        Interval::singleton_of(n.clone())
    }

    fn singleton(&self) -> Option<Int> {
        Interval::singleton(self).cloned()
    }

    fn apply(op: NumBinOp, lhs: &Self, rhs: &Self) -> Self {
        match op {
            NumBinOp::Add => lhs + rhs,
            NumBinOp::Sub => lhs - rhs,
            NumBinOp::Mul => lhs.mul(rhs),
            NumBinOp::Div => lhs.div(rhs),
            NumBinOp::Rem => lhs.rem(rhs),
            NumBinOp::Shl => lhs.shl(rhs),
            NumBinOp::AShr => lhs.ashr(rhs),
            NumBinOp::And | NumBinOp::Or | NumBinOp::Xor => bitwise(op, lhs, rhs),
        }
    }

    fn neg(&self) -> Self {
        -self
    }

    fn to_bounds(&self) -> Interval {
        self.clone()
    }

    fn to_congruence(&self) -> Congruence {
        match Interval::singleton(self) {
            Some(n) => Congruence::singleton_of(n.clone()),
            None => {
                if self.is_bottom() {
                    Congruence::bottom()
                } else {
                    Congruence::top()
                }
            }
        }
    }

    fn from_bounds(bounds: &Interval) -> Self {
        bounds.clone()
    }

    fn from_interval_congruence(value: &IntervalCongruence) -> Self {
        value.interval().clone()
    }
}

/// Sound interval approximation of the bitwise operations.
fn bitwise(op: NumBinOp, lhs: &Interval, rhs: &Interval) -> Interval {
    if lhs.is_bottom() || rhs.is_bottom() {
        return Interval::bottom();
    }
    if let (Some(a), Some(b)) = (Interval::singleton(lhs), Interval::singleton(rhs)) {
        let n = match op {
            NumBinOp::And => a & b,
            NumBinOp::Or => a | b,
            NumBinOp::Xor => a ^ b,
            _ => unreachable!(),
        };
        return Interval::singleton_of(n);
    }
    let non_negative = |i: &Interval| *i.lb() >= argus_num::Bound::zero();
    if non_negative(lhs) && non_negative(rhs) {
        // Both operands non-negative: the result stays below the operand
        // magnitudes for AND, below the next power of two for OR/XOR.
        match op {
            NumBinOp::And => {
                let ub = lhs.ub().clone().min(rhs.ub().clone());
                Interval::new(argus_num::Bound::zero(), ub)
            }
            NumBinOp::Or | NumBinOp::Xor => {
                match (lhs.ub().number(), rhs.ub().number()) {
                    (Some(a), Some(b)) => {
                        let bits = a.bits().max(b.bits()) as u32;
                        Interval::new(Int::zero(), Int::pow2(bits) - Int::one())
                    }
                    _ => Interval::new(argus_num::Bound::zero(), argus_num::Bound::plus_infinity()),
                }
            }
            _ => unreachable!(),
        }
    } else {
        Interval::top()
    }
}

impl NumValue for Congruence {
    fn singleton_of(n: &Int) -> Self {
        Congruence::singleton_of(n.clone())
    }

    fn singleton(&self) -> Option<Int> {
        Congruence::singleton(self).cloned()
    }

    fn apply(op: NumBinOp, lhs: &Self, rhs: &Self) -> Self {
        if lhs.is_bottom() || rhs.is_bottom() {
            return Congruence::bottom();
        }
        match op {
            NumBinOp::Add => lhs + rhs,
            NumBinOp::Sub => lhs - rhs,
            NumBinOp::Mul => lhs * rhs,
            NumBinOp::Div => lhs.div(rhs),
            NumBinOp::Rem => lhs.rem(rhs),
            NumBinOp::Shl => {
                // x << n multiplies by 2^n when the amount is a constant.
                match Congruence::singleton(rhs).and_then(|n| n.to_u32()) {
                    Some(n) => lhs * &Congruence::singleton_of(Int::pow2(n)),
                    None => Congruence::top(),
                }
            }
            NumBinOp::AShr | NumBinOp::And | NumBinOp::Or | NumBinOp::Xor => {
                match (Congruence::singleton(lhs), Congruence::singleton(rhs)) {
                    (Some(a), Some(b)) => {
                        let result = match op {
                            NumBinOp::AShr => match b.to_u32() {
                                Some(n) => a.shr(n),
                                None => return Congruence::top(),
                            },
                            NumBinOp::And => a & b,
                            NumBinOp::Or => a | b,
                            NumBinOp::Xor => a ^ b,
                            _ => unreachable!(),
                        };
                        Congruence::singleton_of(result)
                    }
                    _ => Congruence::top(),
                }
            }
        }
    }

    fn neg(&self) -> Self {
        -self
    }

    fn to_bounds(&self) -> Interval {
        self.to_interval()
    }

    fn to_congruence(&self) -> Congruence {
        self.clone()
    }

    fn from_bounds(bounds: &Interval) -> Self {
        if bounds.is_bottom() {
            Congruence::bottom()
        } else {
            match Interval::singleton(bounds) {
                Some(n) => Congruence::singleton_of(n.clone()),
                None => Congruence::top(),
            }
        }
    }

    fn from_interval_congruence(value: &IntervalCongruence) -> Self {
        value.congruence().clone()
    }
}

impl NumValue for IntervalCongruence {
    fn singleton_of(n: &Int) -> Self {
        IntervalCongruence::singleton_of(n.clone())
    }

    fn singleton(&self) -> Option<Int> {
        IntervalCongruence::singleton(self).cloned()
    }

    fn apply(op: NumBinOp, lhs: &Self, rhs: &Self) -> Self {
        IntervalCongruence::new(
            NumValue::apply(op, lhs.interval(), rhs.interval()),
            NumValue::apply(op, lhs.congruence(), rhs.congruence()),
        )
    }

    fn neg(&self) -> Self {
        IntervalCongruence::new(-self.interval(), -self.congruence())
    }

    fn to_bounds(&self) -> Interval {
        self.interval().clone()
    }

    fn to_congruence(&self) -> Congruence {
        self.congruence().clone()
    }

    fn from_bounds(bounds: &Interval) -> Self {
        IntervalCongruence::from_interval(bounds.clone())
    }

    fn from_interval_congruence(value: &IntervalCongruence) -> Self {
        value.clone()
    }
}
