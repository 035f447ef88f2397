use super::*;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use proptest::prelude::*;

fn contexts() -> Vec<SmpContext> {
    vec![
        SmpContext::sequential(),
        SmpContext::new(SmpOpts {
            backend: BackendKind::Pool,
            threads: 2,
        })
        .unwrap(),
        SmpContext::new(SmpOpts {
            backend: BackendKind::Omp,
            threads: 3,
        })
        .unwrap(),
    ]
}

fn covered(ctx: &SmpContext, first: usize, last: usize, grain: usize) -> Vec<(usize, usize)> {
    let seen = Mutex::new(Vec::new());
    ctx.parallel_for(first, last, grain, |b, e, _| {
        seen.lock().unwrap().push((b, e));
        Ok(())
    })
    .unwrap();
    let mut v = seen.into_inner().unwrap();
    v.sort_unstable();
    v
}

#[test]
fn empty_range_never_calls_body() {
    for ctx in contexts() {
        let calls = AtomicUsize::new(0);
        ctx.parallel_for(5, 5, 0, |_, _, _| {
            calls.fetch_add(1, AtomicOrdering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(calls.load(AtomicOrdering::Relaxed), 0);
    }
}

#[test]
fn auto_grain_floors_to_one() {
    let ctx = SmpContext::sequential();
    assert_eq!(ctx.effective_grain(3, 0), 1);
    assert_eq!(ctx.effective_grain(100, 0), 25);
    assert_eq!(ctx.effective_grain(100, 7), 7);
}

#[test]
fn sub_ranges_are_contiguous_and_respect_grain() {
    for ctx in contexts() {
        let ranges = covered(&ctx, 3, 50, 10);
        assert_eq!(ranges.first().map(|r| r.0), Some(3));
        assert_eq!(ranges.last().map(|r| r.1), Some(50));
        for w in ranges.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
        assert!(ranges.iter().all(|(b, e)| e - b <= 10 && e > b));
    }
}

#[test]
fn thread_ids_stay_below_worker_count() {
    for ctx in contexts() {
        let n = ctx.estimated_thread_count();
        ctx.parallel_for(0, 1000, 1, |_, _, tid| {
            assert!(tid < n, "tid {tid} >= {n}");
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn lowest_failing_chunk_error_wins() {
    for ctx in contexts() {
        let err = ctx
            .parallel_for(0, 100, 10, |b, _, _| {
                if b >= 30 {
                    Err(VoxflowError::validation(format!("chunk {b}")))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "validation error: chunk 30");
    }
}

#[test]
fn failing_body_does_not_cancel_other_chunks() {
    for ctx in contexts() {
        let done = AtomicUsize::new(0);
        let res = ctx.parallel_for(0, 10, 1, |b, _, _| {
            done.fetch_add(1, AtomicOrdering::Relaxed);
            if b == 0 {
                Err(VoxflowError::validation("first"))
            } else {
                Ok(())
            }
        });
        assert!(res.is_err());
        assert_eq!(done.load(AtomicOrdering::Relaxed), 10);
    }
}

#[test]
fn panics_are_reraised_on_caller() {
    for ctx in contexts() {
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = ctx.parallel_for(0, 8, 1, |b, _, _| {
                if b == 5 {
                    panic!("boom");
                }
                Ok(())
            });
        }));
        assert!(r.is_err());
    }
}

#[test]
fn reduce_preserves_order_for_non_commutative_combine() {
    for ctx in contexts() {
        let s = ctx
            .parallel_reduce(
                0,
                26,
                3,
                String::new(),
                |b, e, _| Ok((b..e).map(|i| (b'a' + i as u8) as char).collect::<String>()),
                |a, b| a + &b,
            )
            .unwrap();
        assert_eq!(s, "abcdefghijklmnopqrstuvwxyz");
    }
}

#[test]
fn reduce_of_empty_range_is_init() {
    let ctx = SmpContext::sequential();
    let v = ctx
        .parallel_reduce(4, 4, 0, 42_i64, |_, _, _| Ok(1_i64), |a, b| a + b)
        .unwrap();
    assert_eq!(v, 42);
}

#[test]
fn nested_calls_run_inline() {
    for ctx in contexts() {
        let total = AtomicUsize::new(0);
        ctx.parallel_for(0, 4, 1, |_, _, outer| {
            ctx.parallel_for(0, 10, 1, |b, e, inner| {
                assert_eq!(inner, outer);
                total.fetch_add(e - b, AtomicOrdering::Relaxed);
                Ok(())
            })
        })
        .unwrap();
        assert_eq!(total.load(AtomicOrdering::Relaxed), 40);
    }
}

#[test]
fn fill_transform_sort() {
    for ctx in contexts() {
        let mut v = vec![0_u32; 1000];
        ctx.fill(&mut v, 7);
        assert!(v.iter().all(|&x| x == 7));

        let input: Vec<u32> = (0..1000).collect();
        ctx.transform(&input, &mut v, |x| x * 2).unwrap();
        assert_eq!(v[999], 1998);

        let mut short = vec![0_u32; 3];
        assert!(ctx.transform(&input, &mut short, |x| *x).is_err());

        let mut s: Vec<i32> = (0..500).rev().collect();
        ctx.sort(&mut s);
        assert!(s.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn sequential_resolves_to_one_thread() {
    let opts = SmpOpts {
        backend: BackendKind::Sequential,
        threads: 8,
    }
    .resolve(None);
    assert_eq!(opts.threads, 1);
}

#[test]
fn oversubscription_is_clamped() {
    let hw = hardware_concurrency();
    let opts = SmpOpts {
        backend: BackendKind::Omp,
        threads: hw + 5,
    }
    .resolve(None);
    assert_eq!(opts.threads, hw);
}

#[test]
fn omp_runs_static_blocks_on_its_own_pool() {
    let ctx = SmpContext::new(SmpOpts {
        backend: BackendKind::Omp,
        threads: 2,
    })
    .unwrap();
    let nt = ctx.estimated_thread_count();
    let seen = Mutex::new(Vec::new());
    for _ in 0..3 {
        ctx.parallel_for(0, 8, 1, |b, _, tid| {
            let name = std::thread::current().name().map(str::to_owned);
            seen.lock().unwrap().push((b, tid, name));
            Ok(())
        })
        .unwrap();
    }
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 24);
    for (b, tid, name) in seen {
        assert_eq!(tid, b * nt / 8, "item {b}");
        if nt > 1 {
            assert!(name.is_some_and(|n| n.starts_with("voxflow-smp-")));
        }
    }
}

proptest! {
    #[test]
    fn parallel_for_partitions_every_index_once(
        first in 0usize..50,
        len in 0usize..400,
        grain in 0usize..40,
    ) {
        let last = first + len;
        for ctx in contexts() {
            let hits: Vec<AtomicUsize> = (0..last).map(|_| AtomicUsize::new(0)).collect();
            ctx.parallel_for(first, last, grain, |b, e, _| {
                for h in &hits[b..e] {
                    h.fetch_add(1, AtomicOrdering::Relaxed);
                }
                Ok(())
            }).unwrap();
            for (i, h) in hits.iter().enumerate() {
                let want = usize::from(i >= first);
                prop_assert_eq!(h.load(AtomicOrdering::Relaxed), want);
            }
        }
    }
}
