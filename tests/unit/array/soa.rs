use super::*;

#[test]
fn scaled_component_reads_scaled_values() {
    let mut a = SoaArray::from_buffers(vec![vec![10_i32, 20]]).unwrap();
    a.set_scale(0, Some(0.5)).unwrap();
    assert_eq!(a.get(0, 0), 5.0);
    assert_eq!(a.get(1, 0), 10.0);
    assert_eq!(a.get_raw(1, 0), 20);
    assert_eq!(a.range(0), (5.0, 10.0));
}

#[test]
fn set_divides_by_scale() {
    let mut a = SoaArray::<i16>::zeros(1, 1).unwrap();
    a.set_scale(0, Some(0.25)).unwrap();
    a.set(0, 0, 2.0);
    assert_eq!(a.get_raw(0, 0), 8);
}

#[test]
fn ragged_buffers_are_rejected() {
    assert!(SoaArray::from_buffers(vec![vec![1_u8], vec![]]).is_err());
    assert!(SoaArray::<u8>::from_buffers(vec![]).is_err());
}

#[test]
fn to_aos_interleaves_and_applies_scale() {
    let mut a = SoaArray::from_buffers(vec![vec![1.0_f64, 2.0], vec![4.0, 8.0]]).unwrap();
    a.set_scale(1, Some(0.5)).unwrap();
    let aos = a.to_aos();
    assert_eq!(aos.as_slice(), &[1.0, 2.0, 2.0, 4.0]);
}

#[test]
fn append_and_range_invalidation() {
    let mut a = SoaArray::<u32>::new(2);
    a.append(&[1, 5]).unwrap();
    a.append(&[3, 2]).unwrap();
    assert_eq!(a.range(1), (2.0, 5.0));
    a.set_raw(0, 1, 0);
    assert_eq!(a.range(1), (0.0, 2.0));
    assert!(a.append(&[1]).is_err());
}

#[test]
fn gather_keeps_scale() {
    let mut a = SoaArray::from_buffers(vec![vec![2_u8, 4, 6]]).unwrap().named("s");
    a.set_scale(0, Some(10.0)).unwrap();
    let g = a.gather(&[2, 1]).unwrap();
    assert_eq!(g.layout(), Layout::Soa);
    assert_eq!(g.component(0, 0), 60.0);
    assert_eq!(g.component(1, 0), 40.0);
}

#[test]
fn checked_access() {
    let a = SoaArray::<f32>::zeros(2, 2).unwrap();
    assert!(a.try_get(0, 2).is_err());
    assert!(a.try_component(2, 0).is_err());
}

#[test]
fn zero_component_tuples_are_not_representable() {
    assert_eq!(SoaArray::<i16>::new(0).components(), 1);
    let err = SoaArray::<i16>::from_buffers(Vec::new()).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::BadInput);
}
