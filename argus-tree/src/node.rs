//! Tree nodes and bit twiddling helpers.

use std::sync::Arc;

pub(crate) type Tree<K, V> = Arc<Node<K, V>>;

#[derive(Debug)]
pub(crate) enum Node<K, V> {
    Leaf {
        key: K,
        value: V,
    },
    Branch {
        /// Common prefix of all keys below, with the branching bit and
        /// everything under it zeroed.
        prefix: u64,
        /// Single set bit: the highest bit on which the children differ.
        bit: u64,
        /// Cached number of leaves.
        size: usize,
        left: Tree<K, V>,
        right: Tree<K, V>,
    },
}

impl<K, V> Node<K, V> {
    pub(crate) fn size(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { size, .. } => *size,
        }
    }
}

/// Bits of `k` strictly above `m`, everything else zeroed.
pub(crate) fn mask(k: u64, m: u64) -> u64 {
    k & !(m | (m - 1))
}

/// Whether `k` lies below the prefix `p` with branching bit `m`.
pub(crate) fn match_prefix(k: u64, p: u64, m: u64) -> bool {
    mask(k, m) == p
}

/// Whether `k` goes to the left child (branching bit clear).
pub(crate) fn is_zero_bit(k: u64, m: u64) -> bool {
    k & m == 0
}

/// The highest bit on which the two prefixes differ.
pub(crate) fn branching_bit(p0: u64, p1: u64) -> u64 {
    let diff = p0 ^ p1;
    debug_assert!(diff != 0, "prefixes must differ");
    1u64 << (63 - diff.leading_zeros())
}

pub(crate) fn branch<K, V>(prefix: u64, bit: u64, left: Tree<K, V>, right: Tree<K, V>) -> Tree<K, V> {
    let size = left.size() + right.size();
    Arc::new(Node::Branch {
        prefix,
        bit,
        size,
        left,
        right,
    })
}

/// Make a branch, unless one side is empty.
pub(crate) fn branch_opt<K, V>(
    prefix: u64,
    bit: u64,
    left: Option<Tree<K, V>>,
    right: Option<Tree<K, V>>,
) -> Option<Tree<K, V>> {
    match (left, right) {
        (None, t) | (t, None) => t,
        (Some(l), Some(r)) => Some(branch(prefix, bit, l, r)),
    }
}

/// Join two non-empty trees with distinct prefixes.
pub(crate) fn join_trees<K, V>(
    p0: u64,
    t0: Tree<K, V>,
    p1: u64,
    t1: Tree<K, V>,
) -> Tree<K, V> {
    let m = branching_bit(p0, p1);
    if is_zero_bit(p0, m) {
        branch(mask(p0, m), m, t0, t1)
    } else {
        branch(mask(p0, m), m, t1, t0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_zeroes_low_bits() {
        assert_eq!(mask(0b1101_1010, 0b1000), 0b1101_0000);
        assert_eq!(mask(0b1101_1010, 0b1000_0000), 0b0);
    }

    #[test]
    fn branching_bit_is_highest_difference() {
        assert_eq!(branching_bit(0b0101, 0b0001), 0b0100);
        assert_eq!(branching_bit(1, 1 << 63), 1 << 63);
    }
}
