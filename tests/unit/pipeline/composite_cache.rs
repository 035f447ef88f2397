use super::*;

use crate::dataset::ImageData;
use crate::foundation::core::Extent;

fn leaf(n: i32) -> Arc<DataObject> {
    Arc::new(DataObject::from(ImageData::new(Extent::new(0, n, 0, 0, 0, 0))))
}

#[test]
fn hits_require_the_same_input() {
    let mut cache = DataObjectCache::new();
    let input = leaf(3);
    let output = leaf(1);
    assert!(cache.find(0, &input).is_none());

    cache.update(0, &input, Arc::clone(&output));
    assert!(cache.contains(0));
    let hit = cache.find(0, &input).unwrap();
    assert!(Arc::ptr_eq(&hit, &output));

    let other = leaf(3);
    assert!(cache.find(0, &other).is_none());
    assert!(cache.find(1, &input).is_none());
}

#[test]
fn finalize_drops_unused_entries() {
    let mut cache = DataObjectCache::new();
    let a = leaf(1);
    let b = leaf(2);
    cache.update(0, &a, leaf(0));
    cache.update(1, &b, leaf(0));
    assert_eq!(cache.finalize(), 0);

    assert!(cache.find(0, &a).is_some());
    assert_eq!(cache.finalize(), 1);
    assert_eq!(cache.len(), 1);
    assert!(!cache.contains(1));
}

#[test]
fn dropped_inputs_invalidate_entries() {
    let mut cache = DataObjectCache::new();
    let a = leaf(1);
    cache.update(0, &a, leaf(0));
    assert_eq!(cache.invalid_items(), 0);
    drop(a);
    assert_eq!(cache.invalid_items(), 1);
    cache.clear();
    assert!(cache.is_empty());
}
