//! Persistent Patricia-tree map.

use std::fmt;
use std::sync::Arc;

use crate::node::{branch, branch_opt, is_zero_bit, join_trees, match_prefix, Node, Tree};
use crate::Indexable;

/// Operator driving [`PatriciaTreeMap::merge_with`].
///
/// The merge walks both trees structurally; the operator decides the fate of
/// each binding. `apply` combines a binding present on both sides;
/// `apply_left`/`apply_right` rewrite bindings present on a single side.
/// Returning `None` drops the binding. When [`default_is_absorbing`] is
/// true, one-sided subtrees are discarded wholesale without consulting
/// `apply_left`/`apply_right` (intersection-like semantics).
///
/// The same routine implements joins, meets, widenings and the cell
/// merge/compose operators of the memory domains; only the operator object
/// changes.
///
/// [`default_is_absorbing`]: MergeOperator::default_is_absorbing
pub trait MergeOperator<V> {
    fn apply(&mut self, left: &V, right: &V) -> Option<V>;

    fn apply_left(&mut self, left: &V) -> Option<V> {
        let _ = left;
        None
    }

    fn apply_right(&mut self, right: &V) -> Option<V> {
        let _ = right;
        None
    }

    fn default_is_absorbing(&self) -> bool {
        true
    }
}

/// A persistent map from keys to values, ordered by key index.
///
/// Clones are O(1) and share structure; updates copy only the path to the
/// affected leaf. Merge operations detect shared subtrees by pointer
/// identity and skip them, so combining two states costs time proportional
/// to their difference.
pub struct PatriciaTreeMap<K, V> {
    root: Option<Tree<K, V>>,
}

impl<K, V> Clone for PatriciaTreeMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for PatriciaTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PatriciaTreeMap<K, V> {
    /// The empty map.
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of bindings, from the cached node sizes.
    pub fn size(&self) -> usize {
        self.root.as_ref().map_or(0, |t| t.size())
    }

    /// Iterate bindings in strictly increasing key-index order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Indexable + Clone, V: Clone> PatriciaTreeMap<K, V> {
    /// Look up a key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut tree = self.root.as_deref()?;
        let idx = key.index();
        loop {
            match tree {
                Node::Leaf { key: k, value } => {
                    return (k.index() == idx).then_some(value);
                }
                Node::Branch { bit, left, right, .. } => {
                    tree = if is_zero_bit(idx, *bit) { left } else { right };
                }
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove a binding, if present.
    pub fn remove(&mut self, key: &K) {
        if let Some(root) = self.root.as_ref() {
            self.root = remove_rec(root, key.index());
        }
    }

    /// Map and filter values, sharing unchanged subtrees.
    pub fn transform(&self, mut f: impl FnMut(&K, &V) -> Option<V>) -> Self
    where
        V: PartialEq,
    {
        Self {
            root: self
                .root
                .as_ref()
                .and_then(|t| transform_rec(t, &mut f)),
        }
    }

    /// Generic structural merge; see [`MergeOperator`].
    ///
    /// The operator may carry state (the cell merge/compose operators update
    /// the surrounding scalar states as they walk), so no subtree is skipped
    /// on pointer identity here; use [`join_with`]/[`intersect_with`] for
    /// stateless idempotent combiners.
    ///
    /// [`join_with`]: PatriciaTreeMap::join_with
    /// [`intersect_with`]: PatriciaTreeMap::intersect_with
    pub fn merge_with(&self, other: &Self, op: &mut impl MergeOperator<V>) -> Self
    where
        V: PartialEq,
    {
        Self {
            root: merge_rec(self.root.as_ref(), other.root.as_ref(), op, false),
        }
    }

    /// Union: bindings on one side are kept, common bindings are combined.
    /// `None` from the combiner drops the binding.
    pub fn join_with(&self, other: &Self, combine: impl FnMut(&V, &V) -> Option<V>) -> Self
    where
        V: PartialEq,
    {
        struct Join<F>(F);
        impl<V: Clone, F: FnMut(&V, &V) -> Option<V>> MergeOperator<V> for Join<F> {
            fn apply(&mut self, left: &V, right: &V) -> Option<V> {
                (self.0)(left, right)
            }

            fn apply_left(&mut self, left: &V) -> Option<V> {
                Some(left.clone())
            }

            fn apply_right(&mut self, right: &V) -> Option<V> {
                Some(right.clone())
            }

            fn default_is_absorbing(&self) -> bool {
                false
            }
        }
        Self {
            root: merge_rec(
                self.root.as_ref(),
                other.root.as_ref(),
                &mut Join(combine),
                true,
            ),
        }
    }

    /// Intersection: only common bindings survive, combined pairwise.
    pub fn intersect_with(&self, other: &Self, combine: impl FnMut(&V, &V) -> Option<V>) -> Self
    where
        V: PartialEq,
    {
        struct Intersect<F>(F);
        impl<V, F: FnMut(&V, &V) -> Option<V>> MergeOperator<V> for Intersect<F> {
            fn apply(&mut self, left: &V, right: &V) -> Option<V> {
                (self.0)(left, right)
            }
        }
        Self {
            root: merge_rec(
                self.root.as_ref(),
                other.root.as_ref(),
                &mut Intersect(combine),
                true,
            ),
        }
    }

    /// Structural partial-order check with the absent-is-top convention:
    /// every binding of `other` must be matched by a `le`-smaller binding of
    /// `self`. Bails out on the first counterexample and on shared subtrees.
    pub fn leq(&self, other: &Self, mut le: impl FnMut(&V, &V) -> bool) -> bool {
        leq_rec(self.root.as_ref(), other.root.as_ref(), &mut le)
    }

    /// Structural equality with pointer-identity shortcuts.
    pub fn equals(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        equals_rec(self.root.as_ref(), other.root.as_ref())
    }
}

impl<K: Indexable + Clone, V: Clone + PartialEq> PatriciaTreeMap<K, V> {
    /// Insert a binding, replacing any existing one.
    pub fn insert(&mut self, key: K, value: V) {
        let idx = key.index();
        self.root = Some(match self.root.as_ref() {
            None => Arc::new(Node::Leaf { key, value }),
            Some(root) => insert_rec(root, key, idx, value),
        });
    }

    /// Insert a binding, combining with the existing value if present.
    pub fn insert_or_update(
        &mut self,
        key: K,
        value: V,
        mut combine: impl FnMut(&V, &V) -> V,
    ) {
        let existing = self.get(&key).cloned();
        let value = match existing {
            Some(old) => combine(&value, &old),
            None => value,
        };
        self.insert(key, value);
    }
}

fn insert_rec<K: Indexable + Clone, V: Clone + PartialEq>(
    tree: &Tree<K, V>,
    key: K,
    idx: u64,
    value: V,
) -> Tree<K, V> {
    match tree.as_ref() {
        Node::Leaf { key: k, value: v } => {
            if k.index() == idx {
                if *v == value {
                    tree.clone()
                } else {
                    Arc::new(Node::Leaf { key, value })
                }
            } else {
                let leaf = Arc::new(Node::Leaf { key, value });
                join_trees(idx, leaf, k.index(), tree.clone())
            }
        }
        Node::Branch {
            prefix,
            bit,
            left,
            right,
            ..
        } => {
            if match_prefix(idx, *prefix, *bit) {
                if is_zero_bit(idx, *bit) {
                    let new_left = insert_rec(left, key, idx, value);
                    if Arc::ptr_eq(&new_left, left) {
                        tree.clone()
                    } else {
                        branch(*prefix, *bit, new_left, right.clone())
                    }
                } else {
                    let new_right = insert_rec(right, key, idx, value);
                    if Arc::ptr_eq(&new_right, right) {
                        tree.clone()
                    } else {
                        branch(*prefix, *bit, left.clone(), new_right)
                    }
                }
            } else {
                let leaf = Arc::new(Node::Leaf { key, value });
                join_trees(idx, leaf, *prefix, tree.clone())
            }
        }
    }
}

fn remove_rec<K: Indexable, V>(tree: &Tree<K, V>, idx: u64) -> Option<Tree<K, V>> {
    match tree.as_ref() {
        Node::Leaf { key, .. } => {
            if key.index() == idx {
                None
            } else {
                Some(tree.clone())
            }
        }
        Node::Branch {
            prefix,
            bit,
            left,
            right,
            ..
        } => {
            if !match_prefix(idx, *prefix, *bit) {
                return Some(tree.clone());
            }
            if is_zero_bit(idx, *bit) {
                let new_left = remove_rec(left, idx);
                match new_left {
                    Some(l) if Arc::ptr_eq(&l, left) => Some(tree.clone()),
                    Some(l) => Some(branch(*prefix, *bit, l, right.clone())),
                    None => Some(right.clone()),
                }
            } else {
                let new_right = remove_rec(right, idx);
                match new_right {
                    Some(r) if Arc::ptr_eq(&r, right) => Some(tree.clone()),
                    Some(r) => Some(branch(*prefix, *bit, left.clone(), r)),
                    None => Some(left.clone()),
                }
            }
        }
    }
}

fn transform_rec<K: Clone, V: Clone + PartialEq>(
    tree: &Tree<K, V>,
    f: &mut impl FnMut(&K, &V) -> Option<V>,
) -> Option<Tree<K, V>> {
    match tree.as_ref() {
        Node::Leaf { key, value } => match f(key, value) {
            Some(v) if v == *value => Some(tree.clone()),
            Some(v) => Some(Arc::new(Node::Leaf {
                key: key.clone(),
                value: v,
            })),
            None => None,
        },
        Node::Branch {
            prefix,
            bit,
            left,
            right,
            ..
        } => {
            let new_left = transform_rec(left, f);
            let new_right = transform_rec(right, f);
            match (&new_left, &new_right) {
                (Some(l), Some(r)) if Arc::ptr_eq(l, left) && Arc::ptr_eq(r, right) => {
                    Some(tree.clone())
                }
                _ => branch_opt(*prefix, *bit, new_left, new_right),
            }
        }
    }
}

/// One-sided subtree under the merge: dropped when absorbing, rewritten
/// with the one-sided operator entry otherwise.
fn merge_one_sided<K: Clone, V: Clone + PartialEq>(
    tree: &Tree<K, V>,
    op: &mut impl MergeOperator<V>,
    left_side: bool,
) -> Option<Tree<K, V>> {
    if op.default_is_absorbing() {
        return None;
    }
    let mut f = |_: &K, v: &V| {
        if left_side {
            op.apply_left(v)
        } else {
            op.apply_right(v)
        }
    };
    transform_rec(tree, &mut f)
}

fn merge_rec<K: Indexable + Clone, V: Clone + PartialEq>(
    s: Option<&Tree<K, V>>,
    t: Option<&Tree<K, V>>,
    op: &mut impl MergeOperator<V>,
    idempotent: bool,
) -> Option<Tree<K, V>> {
    match (s, t) {
        (None, None) => None,
        (Some(s), None) => merge_one_sided(s, op, true),
        (None, Some(t)) => merge_one_sided(t, op, false),
        (Some(s), Some(t)) => {
            if idempotent && Arc::ptr_eq(s, t) {
                return Some(s.clone());
            }
            match (s.as_ref(), t.as_ref()) {
                (Node::Leaf { key, value }, Node::Leaf { key: tk, value: tv }) => {
                    if key.index() == tk.index() {
                        op.apply(value, tv).map(|v| {
                            if v == *value {
                                s.clone()
                            } else {
                                Arc::new(Node::Leaf {
                                    key: key.clone(),
                                    value: v,
                                })
                            }
                        })
                    } else {
                        let ls = merge_one_sided(s, op, true);
                        let lt = merge_one_sided(t, op, false);
                        match (ls, lt) {
                            (Some(a), Some(b)) => {
                                Some(join_trees(key.index(), a, tk.index(), b))
                            }
                            (a, b) => a.or(b),
                        }
                    }
                }
                (Node::Leaf { key, .. }, Node::Branch { prefix, bit, left, right, .. }) => {
                    let idx = key.index();
                    if match_prefix(idx, *prefix, *bit) {
                        let (new_left, new_right) = if is_zero_bit(idx, *bit) {
                            (
                                merge_rec(Some(s), Some(left), op, idempotent),
                                merge_one_sided(right, op, false),
                            )
                        } else {
                            (
                                merge_one_sided(left, op, false),
                                merge_rec(Some(s), Some(right), op, idempotent),
                            )
                        };
                        branch_opt(*prefix, *bit, new_left, new_right)
                    } else {
                        let ls = merge_one_sided(s, op, true);
                        let lt = merge_one_sided(t, op, false);
                        match (ls, lt) {
                            (Some(a), Some(b)) => Some(join_trees(idx, a, *prefix, b)),
                            (a, b) => a.or(b),
                        }
                    }
                }
                (Node::Branch { prefix, bit, left, right, .. }, Node::Leaf { key, .. }) => {
                    let idx = key.index();
                    if match_prefix(idx, *prefix, *bit) {
                        let (new_left, new_right) = if is_zero_bit(idx, *bit) {
                            (
                                merge_rec(Some(left), Some(t), op, idempotent),
                                merge_one_sided(right, op, true),
                            )
                        } else {
                            (
                                merge_one_sided(left, op, true),
                                merge_rec(Some(right), Some(t), op, idempotent),
                            )
                        };
                        branch_opt(*prefix, *bit, new_left, new_right)
                    } else {
                        let ls = merge_one_sided(s, op, true);
                        let lt = merge_one_sided(t, op, false);
                        match (ls, lt) {
                            (Some(a), Some(b)) => Some(join_trees(*prefix, a, idx, b)),
                            (a, b) => a.or(b),
                        }
                    }
                }
                (
                    Node::Branch {
                        prefix: p,
                        bit: m,
                        left: s_left,
                        right: s_right,
                        ..
                    },
                    Node::Branch {
                        prefix: q,
                        bit: n,
                        left: t_left,
                        right: t_right,
                        ..
                    },
                ) => {
                    if m == n && p == q {
                        let new_left = merge_rec(Some(s_left), Some(t_left), op, idempotent);
                        let new_right = merge_rec(Some(s_right), Some(t_right), op, idempotent);
                        match (&new_left, &new_right) {
                            (Some(l), Some(r))
                                if Arc::ptr_eq(l, s_left) && Arc::ptr_eq(r, s_right) =>
                            {
                                Some(s.clone())
                            }
                            (Some(l), Some(r))
                                if Arc::ptr_eq(l, t_left) && Arc::ptr_eq(r, t_right) =>
                            {
                                Some(t.clone())
                            }
                            _ => branch_opt(*p, *m, new_left, new_right),
                        }
                    } else if m < n && match_prefix(*q, *p, *m) {
                        // t fits inside one child of s
                        let (new_left, new_right) = if is_zero_bit(*q, *m) {
                            (
                                merge_rec(Some(s_left), Some(t), op, idempotent),
                                merge_one_sided(s_right, op, true),
                            )
                        } else {
                            (
                                merge_one_sided(s_left, op, true),
                                merge_rec(Some(s_right), Some(t), op, idempotent),
                            )
                        };
                        branch_opt(*p, *m, new_left, new_right)
                    } else if m > n && match_prefix(*p, *q, *n) {
                        // s fits inside one child of t
                        let (new_left, new_right) = if is_zero_bit(*p, *n) {
                            (
                                merge_rec(Some(s), Some(t_left), op, idempotent),
                                merge_one_sided(t_right, op, false),
                            )
                        } else {
                            (
                                merge_one_sided(t_left, op, false),
                                merge_rec(Some(s), Some(t_right), op, idempotent),
                            )
                        };
                        branch_opt(*q, *n, new_left, new_right)
                    } else {
                        // Prefixes disagree entirely
                        let ls = merge_one_sided(s, op, true);
                        let lt = merge_one_sided(t, op, false);
                        match (ls, lt) {
                            (Some(a), Some(b)) => Some(join_trees(*p, a, *q, b)),
                            (a, b) => a.or(b),
                        }
                    }
                }
            }
        }
    }
}

fn find_value<'a, K: Indexable, V>(tree: &'a Tree<K, V>, idx: u64) -> Option<&'a V> {
    match tree.as_ref() {
        Node::Leaf { key, value } => (key.index() == idx).then_some(value),
        Node::Branch { bit, left, right, .. } => {
            if is_zero_bit(idx, *bit) {
                find_value(left, idx)
            } else {
                find_value(right, idx)
            }
        }
    }
}

fn leq_rec<K: Indexable, V>(
    s: Option<&Tree<K, V>>,
    t: Option<&Tree<K, V>>,
    le: &mut impl FnMut(&V, &V) -> bool,
) -> bool {
    match (s, t) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(s), Some(t)) => {
            if Arc::ptr_eq(s, t) {
                return true;
            }
            match (s.as_ref(), t.as_ref()) {
                (Node::Leaf { key, value }, Node::Leaf { key: tk, value: tv }) => {
                    key.index() == tk.index() && le(value, tv)
                }
                (Node::Leaf { .. }, Node::Branch { .. }) => false,
                (Node::Branch { .. }, Node::Leaf { key, value }) => {
                    match find_value(s, key.index()) {
                        Some(sv) => le(sv, value),
                        None => false,
                    }
                }
                (
                    Node::Branch {
                        prefix: p,
                        bit: m,
                        left: s_left,
                        right: s_right,
                        ..
                    },
                    Node::Branch {
                        prefix: q,
                        bit: n,
                        left: t_left,
                        right: t_right,
                        ..
                    },
                ) => {
                    if s.size() < t.size() {
                        return false;
                    }
                    if m == n && p == q {
                        leq_rec(Some(s_left), Some(t_left), le)
                            && leq_rec(Some(s_right), Some(t_right), le)
                    } else if m < n && match_prefix(*q, *p, *m) {
                        if is_zero_bit(*q, *m) {
                            leq_rec(Some(s_left), Some(t), le)
                        } else {
                            leq_rec(Some(s_right), Some(t), le)
                        }
                    } else {
                        // t has bindings outside s
                        false
                    }
                }
            }
        }
    }
}

fn equals_rec<K: Indexable, V: PartialEq>(
    s: Option<&Tree<K, V>>,
    t: Option<&Tree<K, V>>,
) -> bool {
    match (s, t) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(s), Some(t)) => {
            if Arc::ptr_eq(s, t) {
                return true;
            }
            match (s.as_ref(), t.as_ref()) {
                (Node::Leaf { key, value }, Node::Leaf { key: tk, value: tv }) => {
                    key.index() == tk.index() && value == tv
                }
                (
                    Node::Branch {
                        prefix: p,
                        bit: m,
                        size: ss,
                        left: sl,
                        right: sr,
                    },
                    Node::Branch {
                        prefix: q,
                        bit: n,
                        size: ts,
                        left: tl,
                        right: tr,
                    },
                ) => {
                    ss == ts
                        && p == q
                        && m == n
                        && equals_rec(Some(sl), Some(tl))
                        && equals_rec(Some(sr), Some(tr))
                }
                _ => false,
            }
        }
    }
}

/// In-order iterator; left children first, so key indices are increasing.
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Node::Leaf { key, value } => return Some((key, value)),
                Node::Branch { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PatriciaTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Indexable + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for PatriciaTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PatriciaTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn map_of(entries: &[(u64, i64)]) -> PatriciaTreeMap<u64, i64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn insert_get_remove() {
        let mut m = PatriciaTreeMap::new();
        m.insert(3u64, "three");
        m.insert(1, "one");
        m.insert(3, "still three");
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(&3), Some(&"still three"));
        m.remove(&3);
        assert_eq!(m.get(&3), None);
        assert_eq!(m.size(), 1);
    }

    #[test]
    fn iteration_is_ordered() {
        let m = map_of(&[(9, 0), (2, 0), (77, 0), (0, 0), (31, 0)]);
        let keys: Vec<u64> = m.keys().copied().collect();
        assert_eq!(keys, vec![0, 2, 9, 31, 77]);
    }

    #[test]
    fn structural_sharing_on_copy() {
        let a = map_of(&[(1, 10), (2, 20)]);
        let mut b = a.clone();
        b.insert(3, 30);
        assert_eq!(a.size(), 2);
        assert_eq!(a.get(&3), None);
        assert_eq!(b.size(), 3);
    }

    #[test]
    fn insert_same_value_shares() {
        let a = map_of(&[(1, 10), (2, 20)]);
        let mut b = a.clone();
        b.insert(1, 10);
        assert!(a.equals(&b));
    }

    #[test]
    fn join_keeps_one_sided() {
        let a = map_of(&[(1, 1), (2, 2)]);
        let b = map_of(&[(2, 20), (3, 3)]);
        let j = a.join_with(&b, |x, y| Some(x + y));
        assert_eq!(j.get(&1), Some(&1));
        assert_eq!(j.get(&2), Some(&22));
        assert_eq!(j.get(&3), Some(&3));
    }

    #[test]
    fn join_can_drop() {
        let a = map_of(&[(1, 1), (2, 2)]);
        let b = map_of(&[(1, 1), (2, 3)]);
        let j = a.join_with(&b, |x, y| (x == y).then_some(*x));
        assert_eq!(j.get(&1), Some(&1));
        assert_eq!(j.get(&2), None);
    }

    #[test]
    fn intersect_drops_one_sided() {
        let a = map_of(&[(1, 1), (2, 2)]);
        let b = map_of(&[(2, 20), (3, 3)]);
        let i = a.intersect_with(&b, |x, y| Some(x + y));
        assert_eq!(i.size(), 1);
        assert_eq!(i.get(&2), Some(&22));
    }

    #[test]
    fn leq_absent_is_top() {
        let small = map_of(&[(1, 5), (2, 7)]);
        let large = map_of(&[(1, 5)]);
        // `small` has more constraints, so it is lower in the order.
        assert!(small.leq(&large, |a, b| a == b));
        assert!(!large.leq(&small, |a, b| a == b));
    }

    #[test]
    fn leq_compares_values() {
        let a = map_of(&[(1, 3)]);
        let b = map_of(&[(1, 5)]);
        assert!(a.leq(&b, |x, y| x <= y));
        assert!(!b.leq(&a, |x, y| x <= y));
    }

    #[test]
    fn transform_filters() {
        let m = map_of(&[(1, 1), (2, 2), (3, 3)]);
        let t = m.transform(|_, v| (v % 2 == 1).then_some(*v));
        assert_eq!(t.size(), 2);
        assert!(t.contains_key(&1));
        assert!(!t.contains_key(&2));
    }

    #[test]
    fn equals_ignores_history() {
        let mut a = map_of(&[(1, 1), (2, 2), (3, 3)]);
        a.remove(&2);
        let b = map_of(&[(3, 3), (1, 1)]);
        assert!(a.equals(&b));
    }
}

impl<K: Indexable + Clone, V: Clone + PartialEq> PartialEq for PatriciaTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K: Indexable + Clone, V: Clone + PartialEq> Eq for PatriciaTreeMap<K, V> {}
