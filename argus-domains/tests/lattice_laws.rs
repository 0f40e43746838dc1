//! Lattice laws and widening termination, checked on random values.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use argus_domains::lattice::AbstractDomain;
use argus_domains::num::{Dbm, IntervalCongruenceDomain, IntervalDomain, NumericDomain, Octagon};
use argus_domains::{ConstraintSystem, LinearConstraint, LinearExpression};
use argus_num::{Congruence, Int, Interval, IntervalCongruence};

/// A small random interval (possibly bottom or unbounded).
#[derive(Debug, Clone)]
struct AnyInterval(Interval);

impl Arbitrary for AnyInterval {
    fn arbitrary(g: &mut Gen) -> Self {
        let choice = u8::arbitrary(g) % 10;
        let a = i64::from(i8::arbitrary(g));
        let b = i64::from(i8::arbitrary(g));
        let ivl = match choice {
            0 => Interval::bottom(),
            1 => Interval::top(),
            2 => Interval::new(argus_num::Bound::minus_infinity(), argus_num::Bound::from(b)),
            3 => Interval::new(argus_num::Bound::from(a), argus_num::Bound::plus_infinity()),
            _ => Interval::new(a.min(b), a.max(b)),
        };
        AnyInterval(ivl)
    }
}

/// A small random congruence.
#[derive(Debug, Clone)]
struct AnyCongruence(Congruence);

impl Arbitrary for AnyCongruence {
    fn arbitrary(g: &mut Gen) -> Self {
        let choice = u8::arbitrary(g) % 8;
        let modulus = u8::arbitrary(g) % 12;
        let residue = i64::from(i8::arbitrary(g));
        let c = match choice {
            0 => Congruence::bottom(),
            1 => Congruence::top(),
            2 => Congruence::singleton_of(residue),
            _ => Congruence::new(i64::from(modulus), residue),
        };
        AnyCongruence(c)
    }
}

#[quickcheck]
fn interval_leq_reflexive(a: AnyInterval) -> bool {
    a.0.leq(&a.0)
}

#[quickcheck]
fn interval_leq_transitive(a: AnyInterval, b: AnyInterval, c: AnyInterval) -> bool {
    !(a.0.leq(&b.0) && b.0.leq(&c.0)) || a.0.leq(&c.0)
}

#[quickcheck]
fn interval_join_is_upper_bound(a: AnyInterval, b: AnyInterval) -> bool {
    let j = a.0.join(&b.0);
    a.0.leq(&j) && b.0.leq(&j)
}

#[quickcheck]
fn interval_meet_is_lower_bound(a: AnyInterval, b: AnyInterval) -> bool {
    let m = a.0.meet(&b.0);
    m.leq(&a.0) && m.leq(&b.0)
}

#[quickcheck]
fn interval_extremes(a: AnyInterval) -> bool {
    Interval::bottom().leq(&a.0) && a.0.leq(&Interval::top())
}

#[quickcheck]
fn interval_widening_covers_join(a: AnyInterval, b: AnyInterval) -> bool {
    let w = a.0.widening(&b.0);
    a.0.leq(&w) && b.0.leq(&w)
}

#[quickcheck]
fn interval_widening_terminates(chain: Vec<AnyInterval>) -> bool {
    // Fold an arbitrary chain through widening; it must reach a fixpoint
    // within a small number of steps (two bounds, each can jump once).
    let mut acc = Interval::bottom();
    let mut changes = 0;
    for x in chain {
        let next = acc.widening(&acc.join(&x.0));
        if next != acc {
            changes += 1;
        }
        acc = next;
    }
    changes <= 3
}

#[quickcheck]
fn interval_narrowing_stays_between(a: AnyInterval, b: AnyInterval) -> bool {
    // Narrowing refines a post-fixpoint: meet(a, b) <= narrow(a, b) <= a.
    let n = a.0.narrowing(&b.0);
    n.leq(&a.0) && a.0.meet(&b.0).leq(&n)
}

#[quickcheck]
fn congruence_leq_reflexive(a: AnyCongruence) -> bool {
    a.0.leq(&a.0)
}

#[quickcheck]
fn congruence_join_is_upper_bound(a: AnyCongruence, b: AnyCongruence) -> bool {
    let j = a.0.join(&b.0);
    a.0.leq(&j) && b.0.leq(&j)
}

#[quickcheck]
fn congruence_meet_is_lower_bound(a: AnyCongruence, b: AnyCongruence) -> bool {
    let m = a.0.meet(&b.0);
    m.leq(&a.0) && m.leq(&b.0)
}

#[quickcheck]
fn congruence_extremes(a: AnyCongruence) -> bool {
    Congruence::bottom().leq(&a.0) && a.0.leq(&Congruence::top())
}

#[quickcheck]
fn product_reduction_is_sound(a: AnyInterval, b: AnyCongruence) -> bool {
    // Every member of the reduced product is a member of both parts.
    let v = IntervalCongruence::new(a.0.clone(), b.0.clone());
    if v.is_bottom() {
        return true;
    }
    // Probe a few concrete points.
    (-300..300).all(|n| {
        let n = Int::from(n);
        !v.contains(&n) || (a.0.contains(&n) && b.0.contains(&n))
    })
}

#[quickcheck]
fn assignment_is_sound(a: i8, b: i8, c: i8) -> bool {
    // Concretize: x = a, then y := b*x + c must contain the concrete result.
    let mut d = IntervalDomain::<u64>::top();
    d.assign(&1, &LinearExpression::constant(i64::from(a)));
    let mut e = LinearExpression::term(1u64, i64::from(b));
    e.add_constant(&Int::from(i64::from(c)));
    d.assign(&2, &e);
    let concrete = i64::from(a) * i64::from(b) + i64::from(c);
    d.to_interval(&2).contains(&Int::from(concrete))
}

/// Random small environment for a numerical domain.
fn random_env<D: NumericDomain<u64> + AbstractDomain>(g: &mut Gen) -> D {
    let mut d = D::top();
    for var in 1u64..=3 {
        match u8::arbitrary(g) % 4 {
            0 => {}
            1 => {
                let n = i64::from(i8::arbitrary(g));
                d.assign(&var, &LinearExpression::constant(n));
            }
            2 => {
                let lo = i64::from(i8::arbitrary(g));
                let len = i64::from(u8::arbitrary(g) % 16);
                let mut csts = ConstraintSystem::new();
                csts.push(LinearConstraint::ge(
                    LinearExpression::var(var),
                    LinearExpression::constant(lo),
                ));
                csts.push(LinearConstraint::le(
                    LinearExpression::var(var),
                    LinearExpression::constant(lo + len),
                ));
                d.add_constraints(&csts);
            }
            _ => {
                // Relate the variable to its predecessor.
                if var > 1 {
                    let mut e = LinearExpression::var(var - 1);
                    e.add_constant(&Int::from(i64::from(i8::arbitrary(g))));
                    d.assign(&var, &e);
                }
            }
        }
    }
    d
}

macro_rules! domain_laws {
    ($name:ident, $domain:ty, $max_steps:expr) => {
        mod $name {
            use super::*;

            #[derive(Debug, Clone)]
            struct AnyState(std::rc::Rc<$domain>);

            impl Arbitrary for AnyState {
                fn arbitrary(g: &mut Gen) -> Self {
                    AnyState(std::rc::Rc::new(random_env::<$domain>(g)))
                }
            }

            #[quickcheck]
            fn leq_reflexive(a: AnyState) -> bool {
                a.0.leq(&a.0)
            }

            #[quickcheck]
            fn join_is_upper_bound(a: AnyState, b: AnyState) -> bool {
                let j = a.0.join(&b.0);
                a.0.leq(&j) && b.0.leq(&j)
            }

            #[quickcheck]
            fn meet_is_lower_bound(a: AnyState, b: AnyState) -> bool {
                let m = a.0.meet(&b.0);
                m.leq(&a.0) && m.leq(&b.0)
            }

            #[quickcheck]
            fn extremes(a: AnyState) -> bool {
                <$domain>::bottom().leq(&a.0) && a.0.leq(&<$domain>::top())
            }

            #[quickcheck]
            fn widening_is_upper_bound(a: AnyState, b: AnyState) -> bool {
                let w = a.0.widening(&b.0);
                a.0.leq(&w) && b.0.leq(&w)
            }

            #[quickcheck]
            fn widening_terminates(seeds: Vec<AnyState>) -> bool {
                let mut acc = <$domain>::bottom();
                let mut changes = 0;
                for x in &seeds {
                    let next = acc.widening(&acc.join(&x.0));
                    if !next.leq(&acc) || !acc.leq(&next) {
                        changes += 1;
                    }
                    acc = next;
                }
                // After the first step every change pushes at least one
                // constraint to infinity, and the constraint count is
                // fixed by the three variables in scope.
                changes <= $max_steps
            }
        }
    };
}

// Interval environment: three variables, two bounds each.
domain_laws!(interval_domain, IntervalDomain<u64>, 7);
// The congruence member descends through divisor chains before reaching
// top, so the product stabilizes later than the plain intervals.
domain_laws!(interval_congruence_domain, IntervalCongruenceDomain<u64>, 40);
// DBM over {0, x1, x2, x3}: twelve off-diagonal entries.
domain_laws!(dbm, Dbm<u64>, 13);
// Octagon over three variables: a 6x6 matrix of constraints.
domain_laws!(octagon, Octagon<u64>, 31);
