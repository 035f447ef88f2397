use super::*;

use crate::smp::{BackendKind, SmpOpts};

#[test]
fn per_worker_sums_combine_to_total() {
    let ctx = SmpContext::new(SmpOpts {
        backend: BackendKind::Pool,
        threads: 4,
    })
    .unwrap();
    let tl = ThreadLocal::new(&ctx, || 0_u64);
    ctx.parallel_for(0, 10_000, 0, |b, e, tid| {
        tl.with(tid, |acc| *acc += (b..e).map(|i| i as u64).sum::<u64>());
        Ok(())
    })
    .unwrap();
    assert!(tl.slot_count() >= 1);
    assert_eq!(tl.combine(0, |a, b| a + b), 9_999 * 10_000 / 2);
}

#[test]
fn untouched_slots_are_skipped() {
    let tl = ThreadLocal::with_slots(4, Vec::<u8>::new);
    tl.with(2, |v| v.push(1));
    tl.with(6, |v| v.push(2));
    assert_eq!(tl.into_values(), vec![vec![1, 2]]);
}
