use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use crate::array::EMPTY_RANGE;
use crate::smp::SmpContext;

#[test]
fn range_ignores_nan_and_keeps_extremes() {
    let a = AosArray::from_vec(1, vec![3.0_f64, -1.0, f64::NAN, 7.0, 2.0]).unwrap();
    assert_eq!(a.range(0), (-1.0, 7.0));
}

#[test]
fn range_includes_infinities_but_finite_range_does_not() {
    let a = AosArray::from_vec(1, vec![1.0_f32, f32::INFINITY, -2.0, f32::NEG_INFINITY]).unwrap();
    assert_eq!(a.range(0), (f64::NEG_INFINITY, f64::INFINITY));
    assert_eq!(a.finite_range(0), (-2.0, 1.0));
}

#[test]
fn empty_and_all_nan_ranges_are_inverted() {
    let a = AosArray::<f64>::new(2);
    assert_eq!(a.range(1), EMPTY_RANGE);
    let b = AosArray::from_vec(1, vec![f64::NAN, f64::NAN]).unwrap();
    assert_eq!(b.range(0), EMPTY_RANGE);
}

#[test]
fn range_cache_is_invalidated_by_writes() {
    let mut a = AosArray::from_vec(2, vec![1_i32, 10, 2, 20]).unwrap();
    assert_eq!(a.range(1), (10.0, 20.0));
    let stamp = a.cache.stamp();
    assert!(stamp >= a.mtime());
    assert_eq!(a.range(1), (10.0, 20.0));
    assert_eq!(a.cache.stamp(), stamp);

    a.set(0, 1, 99);
    assert!(a.mtime() > stamp);
    assert_eq!(a.range(1), (20.0, 99.0));
    assert_eq!(a.range(0), (1.0, 2.0));
}

#[test]
fn magnitude_range_over_tuples() {
    let a = AosArray::from_vec(2, vec![3.0_f64, 4.0, 0.0, 1.0]).unwrap();
    assert_eq!(a.magnitude_range(), (1.0, 5.0));
}

#[test]
fn checked_access_reports_index_out_of_range() {
    let mut a = AosArray::<u8>::zeros(2, 3).unwrap();
    assert!(matches!(
        a.try_get(2, 0),
        Err(VoxflowError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
        a.try_set(0, 3, 1),
        Err(VoxflowError::IndexOutOfRange { index: 3, len: 3 })
    ));
    a.try_set(1, 2, 9).unwrap();
    assert_eq!(a.try_get(1, 2).unwrap(), 9);
}

#[test]
fn append_doubles_capacity() {
    let mut a = AosArray::<u16>::new(2);
    let mut caps = Vec::new();
    for i in 0..100_u16 {
        assert_eq!(a.append(&[i, i + 1]).unwrap(), i as usize);
        caps.push(a.capacity());
    }
    assert_eq!(a.len(), 100);
    assert!(a.capacity() >= 100);
    caps.dedup();
    assert!(caps.len() <= 8, "too many reallocations: {caps:?}");
    assert!(a.append(&[1]).is_err());
}

#[test]
fn insert_tuple_grows_and_squeeze_trims() {
    let mut a = AosArray::<i64>::new(1);
    a.insert_tuple(4, &[7]).unwrap();
    assert_eq!(a.len(), 5);
    assert_eq!(a.get(4, 0), 7);
    assert_eq!(a.get(2, 0), 0);
    a.reserve(1000).unwrap();
    assert!(a.capacity() >= 1000);
    a.squeeze();
    assert!(a.capacity() < 1000);
    a.clear();
    assert!(a.is_empty());
}

#[test]
fn fill_and_fill_component() {
    let mut a = AosArray::<f32>::zeros(5000, 3).unwrap();
    a.fill(2.5);
    assert!(a.as_slice().iter().all(|&v| v == 2.5));
    a.fill_component(1, -1.0).unwrap();
    assert_eq!(a.range(1), (-1.0, -1.0));
    assert_eq!(a.range(2), (2.5, 2.5));
    assert!(a.fill_component(3, 0.0).is_err());
}

#[test]
fn iterate_covers_requested_tuples() {
    let a = AosArray::<u8>::zeros(1000, 1).unwrap();
    let ctx = SmpContext::sequential();
    let seen = AtomicUsize::new(0);
    a.iterate(&ctx, Some(100..400), 0, &|b, e, _| {
        assert!(b >= 100 && e <= 400);
        seen.fetch_add(e - b, Ordering::Relaxed);
        Ok(())
    })
    .unwrap();
    assert_eq!(seen.load(Ordering::Relaxed), 300);
    assert!(a.iterate(&ctx, Some(0..1001), 0, &|_, _, _| Ok(())).is_err());
}

#[test]
fn gather_and_copy_tuples_keep_layout() {
    let a = AosArray::from_vec(2, vec![0_u8, 1, 10, 11, 20, 21]).unwrap().named("v");
    let g = a.gather(&[2, 0]).unwrap();
    assert_eq!(g.name(), "v");
    assert_eq!(g.layout(), Layout::Aos);
    assert_eq!(g.tuple_f64(0), vec![20.0, 21.0]);

    let mut dst = AosArray::<u8>::zeros(3, 2).unwrap();
    dst.copy_tuples_from(g.as_ref(), &[(1, 0), (2, 1)]).unwrap();
    assert_eq!(dst.tuple(1), &[20, 21]);
    assert_eq!(dst.tuple(2), &[0, 1]);
    assert!(a.gather(&[3]).is_err());
}

#[test]
fn resize_changes_tuple_count() {
    let mut a = AosArray::<i16>::zeros(4, 2).unwrap();
    a.resize(2).unwrap();
    assert_eq!(a.number_of_values(), 4);
    a.resize_with_components(3, 4).unwrap();
    assert_eq!((a.len(), a.components()), (3, 4));
}

proptest! {
    #[test]
    fn range_matches_sequential_min_max(values in proptest::collection::vec(-1e6_f64..1e6, 0..300)) {
        let a = AosArray::from_vec(1, values.clone()).unwrap();
        let want = values.iter().fold(EMPTY_RANGE, |r, &v| (r.0.min(v), r.1.max(v)));
        prop_assert_eq!(a.range(0), want);
    }

    #[test]
    fn aos_soa_aos_preserves_values(values in proptest::collection::vec(any::<i32>(), 0..64)) {
        let n = values.len() / 2 * 2;
        let a = AosArray::from_vec(2, values[..n].to_vec()).unwrap();
        let back = a.to_soa().to_aos();
        prop_assert_eq!(back.as_slice(), a.as_slice());
    }
}

#[test]
fn zero_component_tuples_are_not_representable() {
    assert_eq!(AosArray::<f32>::new(0).components(), 1);
    assert_eq!(AosArray::<u8>::zeros(3, 0).unwrap().len(), 3);
    let err = AosArray::<f32>::from_vec(0, Vec::new()).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::BadInput);
}
