use super::*;

#[test]
fn empty_function_evaluates_to_zero() {
    let f = PiecewiseFunction::new();
    assert!(f.is_empty());
    assert_eq!(f.value(3.0), 0.0);
    assert_eq!(f.range(), None);
    assert_eq!(ColorTransferFunction::new().value(1.0), [0.0; 3]);
}

#[test]
fn values_interpolate_and_clamp() {
    let f = PiecewiseFunction::linear(10.0, 0.0, 20.0, 1.0);
    assert_eq!(f.value(0.0), 0.0);
    assert!((f.value(15.0) - 0.5).abs() < 1e-12);
    assert_eq!(f.value(99.0), 1.0);
    assert_eq!(f.value(f64::NAN), 0.0);
    assert_eq!(f.range(), Some((10.0, 20.0)));
}

#[test]
fn points_stay_sorted_and_replace_duplicates() {
    let mut f = PiecewiseFunction::new();
    f.add_point(5.0, 1.0);
    f.add_point(1.0, 0.0);
    f.add_point(3.0, 0.2);
    f.add_point(3.0, 0.4);
    f.add_point(f64::INFINITY, 7.0);
    assert_eq!(f.points(), &[(1.0, 0.0), (3.0, 0.4), (5.0, 1.0)]);
    assert!(f.remove_point(3.0));
    assert!(!f.remove_point(3.0));
    assert_eq!(f.len(), 2);
}

#[test]
fn edits_bump_the_stamp() {
    let mut f = PiecewiseFunction::linear(0.0, 0.0, 1.0, 1.0);
    let before = f.mtime();
    f.add_point(0.5, 0.1);
    assert!(f.mtime() > before);
    let before = f.mtime();
    f.clear();
    assert!(f.mtime() > before);
}

#[test]
fn color_channels_interpolate_independently() {
    let c = ColorTransferFunction::linear(0.0, [1.0, 0.0, 0.0], 2.0, [0.0, 0.0, 1.0]);
    let mid = c.value(1.0);
    assert!((mid[0] - 0.5).abs() < 1e-12);
    assert_eq!(mid[1], 0.0);
    assert!((mid[2] - 0.5).abs() < 1e-12);
    assert_eq!(c.value(-4.0), [1.0, 0.0, 0.0]);
}

#[test]
fn smallest_gap_ignores_coincident_points() {
    assert_eq!(smallest_gap([0.0, 4.0, 1.0, 1.0].into_iter()), Some(1.0));
    assert_eq!(smallest_gap([2.0].into_iter()), None);
}
