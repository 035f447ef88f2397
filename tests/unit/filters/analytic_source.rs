use super::*;

use crate::pipeline::{ExecutiveOpts, Node, UpdateRequest};

#[test]
fn peak_is_at_the_centre() {
    let src = AnalyticImageSource::default();
    let centre = src.value([0, 0, 0]);
    // sin(0) = 0 on x/y, cos(0) = 1 on z.
    assert!((centre - (255.0 + 5.0)).abs() < 1e-9);
    assert!(src.value([10, 0, 0]) < centre);
}

#[test]
fn generates_only_the_requested_extent() {
    let src = AnalyticImageSource::cube(8).with_context(Arc::new(SmpContext::sequential()));
    let node = Node::with_opts(src, ExecutiveOpts::in_memory());
    let sub = Extent::new(2, 5, 0, 7, 3, 3);
    let out = node.update_port(0, &UpdateRequest::extent(sub)).unwrap();
    let img = out.as_image().unwrap();
    assert_eq!(img.extent(), sub);

    let scalars = img.scalars().unwrap();
    assert_eq!(scalars.name(), ANALYTIC_SCALARS);
    let reference = AnalyticImageSource::cube(8);
    let idx = sub.point_index([4, 6, 3]);
    let expected = reference.value([4, 6, 3]) as f32;
    assert_eq!(scalars.component(idx, 0), f64::from(expected));

    let log = node
        .inspect::<AnalyticImageSource, _>(|s| s.requested_extents())
        .unwrap();
    assert_eq!(log, vec![sub]);
}

#[test]
fn fingerprint_tracks_parameters() {
    let a = AnalyticImageSource::cube(8);
    let mut b = AnalyticImageSource::cube(8);
    assert_eq!(a.fingerprint(), b.fingerprint());
    b.maximum = 100.0;
    assert_ne!(a.fingerprint(), b.fingerprint());
}
