//! End-to-end scenarios through the full memory stack.

use argus_domains::ctx::{Context, MemLoc, Var};
use argus_domains::lattice::AbstractDomain;
use argus_domains::machine::{IntBinaryOp, IntOperand, WrapDomain};
use argus_domains::memory::{CellDomain, MemoryDomain, PartitioningDomain, SummaryDomain};
use argus_domains::nullity::Nullity;
use argus_domains::num::{Dbm, IntervalDomain};
use argus_domains::scalar::{CompositeDomain, ScalarDomain};
use argus_domains::{Literal, MachineIntDomain};
use argus_num::{Interval, MachineInt, Sign};
use pretty_assertions::assert_eq;

type Scalar = CompositeDomain<Var, MemLoc, WrapDomain<Var, IntervalDomain<Var>>>;
type Memory = CellDomain<Var, MemLoc, Scalar, Context>;
// Summaries are relational: the scalar state must carry equalities between
// input cells, output cells and registers across the composition, so they
// run over difference-bound matrices.
type ScalarDbm = CompositeDomain<Var, MemLoc, WrapDomain<Var, Dbm<Var>>>;
type Summary = SummaryDomain<Var, MemLoc, ScalarDbm, Context>;
type Partitioned = PartitioningDomain<Var, MemLoc, Memory>;

fn mi32(n: i64) -> MachineInt {
    MachineInt::new(n, 32, Sign::Signed)
}

fn size4() -> MachineInt {
    MachineInt::new(4, 64, Sign::Unsigned)
}

fn i32var(ctx: &Context, name: &str) -> Var {
    ctx.int_var(name, 32, Sign::Signed)
}

fn interval_of(state: &impl MachineIntDomain<Var>, x: &Var) -> Interval {
    state.int_to_interval(x).to_interval().clone()
}

#[test]
fn s1_interval_assign_then_read() {
    let ctx = Context::new();
    let x = i32var(&ctx, "x");
    let y = i32var(&ctx, "y");
    let z = i32var(&ctx, "z");
    let mut state = Memory::new(ctx.clone());

    state.int_assign(&x, &mi32(5));
    state.int_assign(&y, &mi32(7));
    state.int_apply(
        IntBinaryOp::Add,
        &z,
        &IntOperand::Var(x.clone()),
        &IntOperand::Var(y.clone()),
    );
    assert_eq!(interval_of(&state, &z), Interval::new(12, 12));
}

#[test]
fn s2_join_precision() {
    let ctx = Context::new();
    let x = i32var(&ctx, "x");
    let mut a = Memory::new(ctx.clone());
    a.int_assign(&x, &mi32(0));
    let mut b = Memory::new(ctx.clone());
    b.int_assign(&x, &mi32(10));

    let joined = a.join(&b);
    assert_eq!(interval_of(&joined, &x), Interval::new(0, 10));
}

#[test]
fn s3_cell_strong_update() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(42)), &size4());
    state.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
    assert_eq!(interval_of(&state, &x), Interval::new(42, 42));
}

#[test]
fn s4_cell_weak_update_through_two_bases() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let pm = ctx.ptr_var("pm");
    let pn = ctx.ptr_var("pn");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let n = ctx.mem("n");

    // Pre-state: &m holds 1, &n holds 2, and p points to either.
    let mut init = |state: &mut Memory, target: &MemLoc, value: i64, tmp: &Var| {
        state.pointer_assign_address(tmp, target, Nullity::NonNull);
        state.mem_write(tmp, &Literal::MachineInt(mi32(value)), &size4());
    };
    let mut a = Memory::new(ctx.clone());
    init(&mut a, &m, 1, &pm);
    init(&mut a, &n, 2, &pn);
    a.pointer_assign_var(&p, &pm);
    let mut b = a.clone();
    b.pointer_assign_var(&p, &pn);
    let mut state = a.join(&b);

    state.mem_write(&p, &Literal::MachineInt(mi32(3)), &size4());
    state.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
    assert_eq!(interval_of(&state, &x), Interval::new(1, 3));
}

#[test]
fn s5_null_dereference() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_null(&p);
    state.mem_read(&Literal::IntVar(x), &p, &size4());
    assert!(state.is_bottom());
}

#[test]
fn s6_partitioning() {
    let ctx = Context::new();
    let v = i32var(&ctx, "v");
    let x = i32var(&ctx, "x");

    let mut a = Partitioned::new(Memory::new(ctx.clone()));
    a.int_assign(&v, &mi32(0));
    a.int_assign(&x, &mi32(10));
    let mut b = Partitioned::new(Memory::new(ctx.clone()));
    b.int_assign(&v, &mi32(1));
    b.int_assign(&x, &mi32(20));

    a.partitioning_set_variable(&v);
    b.partitioning_set_variable(&v);
    let merged = a.join(&b);

    assert_eq!(merged.partitioning_variable(), Some(v.clone()));
    assert_eq!(merged.partition_count(), 2);
    assert_eq!(interval_of(&merged, &x), Interval::new(10, 20));

    let zero_branch = merged.partition_at(&mi32(0)).expect("v = 0 partition");
    assert_eq!(interval_of(zero_branch, &x), Interval::new(10, 10));
    let one_branch = merged.partition_at(&mi32(1)).expect("v = 1 partition");
    assert_eq!(interval_of(one_branch, &x), Interval::new(20, 20));
}

#[test]
fn uninitialized_read_through_pointer() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_undef(&p);
    state.mem_read(&Literal::IntVar(x), &p, &size4());
    assert!(state.is_bottom());
}

#[test]
fn overlapping_write_kills_old_cell() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let q = ctx.ptr_var("q");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(1)), &size4());
    // Write 4 bytes at offset 2: overlaps the cell at offset 0.
    state.pointer_assign_offset(
        &q,
        &p,
        &argus_domains::LinearExpression::constant(2),
    );
    state.mem_write(&q, &Literal::MachineInt(mi32(7)), &size4());
    // The old value at offset 0 must be gone.
    state.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
    assert!(interval_of(&state, &x).is_top());
}

#[test]
fn partially_overlapping_read_gives_up() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let q = ctx.ptr_var("q");
    let x = i32var(&ctx, "x");
    let y = i32var(&ctx, "y");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(5)), &size4());
    // Read 4 bytes at offset 2: straddles the cell at offset 0, so there
    // is no exact realization and the destination is given up.
    state.pointer_assign_offset(&q, &p, &argus_domains::LinearExpression::constant(2));
    state.mem_read(&Literal::IntVar(x.clone()), &q, &size4());
    assert!(!state.is_bottom());
    assert!(interval_of(&state, &x).is_top());
    // The straddled cell was not disturbed.
    state.mem_read(&Literal::IntVar(y.clone()), &p, &size4());
    assert_eq!(interval_of(&state, &y), Interval::new(5, 5));
}

#[test]
fn zero_reachable_zeroes_realized_cells() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(5)), &size4());
    state.mem_zero_reachable(&p);
    state.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
    assert_eq!(interval_of(&state, &x), Interval::new(0, 0));
}

#[test]
fn uninitialize_reachable_poisons_reads() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(5)), &size4());
    state.mem_uninitialize_reachable(&p);
    // Reading the now-uninitialized bytes is a definite error.
    state.mem_read(&Literal::IntVar(x), &p, &size4());
    assert!(state.is_bottom());
}

#[test]
fn memcpy_copies_known_cells() {
    let ctx = Context::new();
    let src = ctx.ptr_var("src");
    let dst = ctx.ptr_var("dst");
    let x = i32var(&ctx, "x");
    let a = ctx.mem("a");
    let b = ctx.mem("b");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&src, &a, Nullity::NonNull);
    state.pointer_assign_address(&dst, &b, Nullity::NonNull);
    state.mem_write(&src, &Literal::MachineInt(mi32(9)), &size4());
    state.mem_copy(
        &dst,
        &src,
        &Literal::MachineInt(MachineInt::new(4, 64, Sign::Unsigned)),
    );
    state.mem_read(&Literal::IntVar(x.clone()), &dst, &size4());
    assert_eq!(interval_of(&state, &x), Interval::new(9, 9));
}

#[test]
fn memset_zeroes_covered_cells() {
    let ctx = Context::new();
    let p = ctx.ptr_var("p");
    let x = i32var(&ctx, "x");
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.pointer_assign_address(&p, &m, Nullity::NonNull);
    state.mem_write(&p, &Literal::MachineInt(mi32(5)), &size4());
    state.mem_set(
        &p,
        &Literal::MachineInt(MachineInt::new(0, 32, Sign::Signed)),
        &Literal::MachineInt(MachineInt::new(4, 64, Sign::Unsigned)),
    );
    state.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
    assert_eq!(interval_of(&state, &x), Interval::new(0, 0));
}

#[test]
fn double_free_is_definite_error() {
    let ctx = Context::new();
    let m = ctx.mem("m");
    let mut state = Memory::new(ctx.clone());

    state.lifetime_assign_deallocated(&m);
    state.lifetime_assert_allocated(&m);
    assert!(state.is_bottom());
}

mod summary {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A summary writing `value` at offset 0 of `m` through pointer `name`.
    fn write_summary(ctx: &Context, m: &MemLoc, name: &str, value: i64) -> Summary {
        let p = ctx.ptr_var(name);
        let mut s = Summary::unchanged(ctx.clone());
        s.pointer_assign_address(&p, m, Nullity::NonNull);
        s.mem_write(&p, &Literal::MachineInt(mi32(value)), &size4());
        s
    }

    #[test]
    fn join_is_idempotent() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        let s = write_summary(&ctx, &m, "p", 11);
        let joined = s.join(&s);
        assert!(joined.equals(&s));
    }

    #[test]
    fn unchanged_is_not_top() {
        let ctx = Context::new();
        let u = Summary::unchanged(ctx.clone());
        assert!(!u.is_top());
        assert!(u.leq(&Summary::top()));
    }

    #[test]
    fn read_after_write_sees_the_value() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        let p = ctx.ptr_var("p");
        let x = i32var(&ctx, "x");
        let mut s = Summary::unchanged(ctx.clone());
        s.pointer_assign_address(&p, &m, Nullity::NonNull);
        s.mem_write(&p, &Literal::MachineInt(mi32(3)), &size4());
        s.mem_read(&Literal::IntVar(x.clone()), &p, &size4());
        assert_eq!(interval_of(&s, &x), Interval::new(3, 3));
    }

    #[test]
    fn compose_callee_wins() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        let caller = write_summary(&ctx, &m, "p", 1);
        let callee = write_summary(&ctx, &m, "q", 2);
        let composed = caller.compose(&callee);

        // After running both bodies the byte holds the callee's value.
        let q = ctx.ptr_var("q");
        let x = i32var(&ctx, "x2");
        let mut probe = composed;
        probe.mem_read(&Literal::IntVar(x.clone()), &q, &size4());
        assert_eq!(interval_of(&probe, &x), Interval::new(2, 2));
    }

    #[test]
    fn compose_reads_callers_write() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        // Caller writes 5; callee only reads the same 4 bytes into y.
        let caller = write_summary(&ctx, &m, "p", 5);

        let q = ctx.ptr_var("q");
        // Cells are unsigned; an unsigned destination keeps the read
        // relational through the composition.
        let y = ctx.int_var("y", 32, Sign::Unsigned);
        let mut callee = Summary::unchanged(ctx.clone());
        callee.pointer_assign_address(&q, &m, Nullity::NonNull);
        callee.mem_read(&Literal::IntVar(y.clone()), &q, &size4());

        let composed = caller.compose(&callee);
        // The callee's read is resolved against the caller's write.
        assert_eq!(interval_of(&composed, &y), Interval::new(5, 5));
    }

    #[test]
    fn join_keeps_one_sided_write_sound() {
        let ctx = Context::new();
        let m = ctx.mem("m");
        // One path writes 4, the other leaves memory untouched.
        let write = write_summary(&ctx, &m, "p", 4);
        let skip = Summary::unchanged(ctx.clone());
        let joined = write.join(&skip);
        assert!(write.leq(&joined));
        assert!(skip.leq(&joined));
    }
}
