use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [255, 255, 255, 0]), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let src = [255, 0, 0, 255];
    assert_eq!(over([0, 0, 0, 255], src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let src = [100, 110, 120, 200];
    assert_eq!(over([0, 0, 0, 0], src), src);
}

#[test]
fn half_covered_src_keeps_half_of_dst() {
    assert_eq!(over([0, 0, 200, 255], [128, 0, 0, 128]), [128, 0, 100, 255]);
}

#[test]
fn premultiply_round_trips_opaque_and_clears_transparent() {
    assert_eq!(premultiply([200, 100, 50, 255]), [200, 100, 50, 255]);
    assert_eq!(premultiply([200, 100, 50, 0]), [0, 0, 0, 0]);
    assert_eq!(premultiply([255, 255, 255, 128]), [128, 128, 128, 128]);
    assert_eq!(unpremultiply([128, 128, 128, 128]), [255, 255, 255, 128]);
    assert_eq!(unpremultiply([9, 9, 9, 0]), [0; 4]);
}
