use super::*;

use std::sync::Arc;

use crate::array::AosArray;
use crate::pipeline::Information;

#[test]
fn kind_names_round_trip() {
    for k in [
        DataKind::Image,
        DataKind::Rectilinear,
        DataKind::Structured,
        DataKind::Unstructured,
        DataKind::Poly,
        DataKind::Composite,
    ] {
        assert_eq!(DataKind::parse(k.as_str()), Some(k));
    }
    assert!(DataKind::Image.is_structured());
    assert!(!DataKind::Poly.is_structured());
}

#[test]
fn clone_empty_keeps_variant_and_arrays() {
    let mut img = ImageData::new(Extent::new(0, 2, 0, 2, 0, 0));
    img.set_scalars(Arc::new(AosArray::<u8>::zeros(9, 1).unwrap().named("s")))
        .unwrap();
    let obj = DataObject::from(img);
    let empty = obj.clone_empty().unwrap();
    assert_eq!(empty.kind(), DataKind::Image);
    assert_eq!(empty.number_of_points(), 0);
    assert_eq!(
        empty.point_data().unwrap().get("s").unwrap().number_of_tuples(),
        0
    );
}

#[test]
fn composite_leaves_are_depth_first() {
    let leaf = |n: i32| Arc::new(DataObject::from(ImageData::new(Extent::new(0, n, 0, 0, 0, 0))));
    let mut inner = CompositeDataSet::new();
    inner.push_leaf(Some(leaf(1)), Information::new());
    inner.push_leaf(None, Information::new());
    let mut root = CompositeDataSet::new();
    root.push_leaf(Some(leaf(3)), Information::new());
    root.push_tree(inner, Information::new());

    let leaves = root.leaves();
    assert_eq!(leaves.len(), 3);
    assert_eq!(leaves[1].index, 1);
    assert!(leaves[2].data.is_none());

    let obj = DataObject::from(root);
    assert_eq!(obj.number_of_points(), 4 + 2);
    assert!(obj.point_data().is_none());
    assert!(obj.extent().is_none());

    let empty = obj.clone_empty().unwrap();
    let empty = empty.as_composite().unwrap();
    assert_eq!(empty.leaves().len(), 3);
    assert!(empty.leaves().iter().all(|l| l.data.is_none()));
}
