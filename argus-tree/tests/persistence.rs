//! Persistence properties under random operation sequences.

use std::collections::BTreeMap;

use quickcheck::Arbitrary;
use quickcheck_macros::quickcheck;

use argus_tree::{PatriciaTreeMap, PatriciaTreeSet};

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // Narrow key space so removals actually hit existing keys.
        let key = u16::arbitrary(g) % 64;
        if bool::arbitrary(g) {
            Op::Insert(key, i32::arbitrary(g))
        } else {
            Op::Remove(key)
        }
    }
}

fn run(ops: &[Op]) -> (PatriciaTreeMap<u64, i32>, BTreeMap<u64, i32>) {
    let mut map = PatriciaTreeMap::new();
    let mut model = BTreeMap::new();
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                map.insert(u64::from(*k), *v);
                model.insert(u64::from(*k), *v);
            }
            Op::Remove(k) => {
                map.remove(&u64::from(*k));
                model.remove(&u64::from(*k));
            }
        }
    }
    (map, model)
}

#[quickcheck]
fn size_counts_surviving_keys(ops: Vec<Op>) -> bool {
    let (map, model) = run(&ops);
    map.size() == model.len()
}

#[quickcheck]
fn lookups_match_a_model(ops: Vec<Op>) -> bool {
    let (map, model) = run(&ops);
    (0u64..64).all(|k| map.get(&k) == model.get(&k))
}

#[quickcheck]
fn iteration_is_strictly_increasing(ops: Vec<Op>) -> bool {
    let (map, _) = run(&ops);
    let keys: Vec<u64> = map.keys().copied().collect();
    keys.windows(2).all(|w| w[0] < w[1])
}

#[quickcheck]
fn copies_are_independent(ops: Vec<Op>, fresh: u16) -> bool {
    let (a, model) = run(&ops);
    // Insert a key unused by `a` into a copy; `a` must be observably
    // unchanged.
    let fresh = u64::from(fresh) + 1_000;
    let mut b = a.clone();
    b.insert(fresh, -1);
    a.size() == model.len() && a.get(&fresh).is_none() && b.get(&fresh) == Some(&-1)
}

#[quickcheck]
fn set_behaves_like_a_set(ops: Vec<Op>) -> bool {
    let mut set = PatriciaTreeSet::new();
    let mut model = std::collections::BTreeSet::new();
    for op in &ops {
        match op {
            Op::Insert(k, _) => {
                set.insert(u64::from(*k));
                model.insert(u64::from(*k));
            }
            Op::Remove(k) => {
                set.remove(&u64::from(*k));
                model.remove(&u64::from(*k));
            }
        }
    }
    set.size() == model.len() && model.iter().all(|k| set.contains(k))
}
