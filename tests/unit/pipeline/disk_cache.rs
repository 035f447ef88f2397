use super::*;

use std::sync::Arc;

use crate::array::AosArray;
use crate::foundation::core::Extent;
use crate::pipeline::fingerprint::StableHasher;

fn key(n: u64) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_u64(n);
    h.finish()
}

fn image() -> ImageData {
    let ext = Extent::new(0, 2, 0, 1, 0, 0);
    let mut img = ImageData::new(ext).with_geometry([1.0, 2.0, 3.0], [0.5, 0.5, 1.0]);
    let values: Vec<u16> = (0..6).collect();
    img.set_scalars(Arc::new(AosArray::from_vec(1, values).unwrap().named("s")))
        .unwrap();
    img
}

#[test]
fn store_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path().join("nested")).unwrap();
    assert!(cache.load(key(1)).is_none());

    cache.store(key(1), &image()).unwrap();
    assert!(cache.path(key(1)).exists());
    let back = cache.load(key(1)).unwrap();
    assert_eq!(back.extent(), image().extent());
    assert_eq!(back.origin(), [1.0, 2.0, 3.0]);
    assert_eq!(back.scalars().unwrap().component(5, 0), 5.0);
    assert!(cache.load(key(2)).is_none());
}

#[test]
fn corrupt_entries_are_misses() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path()).unwrap();
    std::fs::write(cache.path(key(3)), b"garbage").unwrap();
    assert!(cache.load(key(3)).is_none());
}

#[test]
fn file_names_are_hex_fingerprints() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path()).unwrap();
    let name = cache.path(key(4));
    let name = name.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with(".vxi"));
    assert_eq!(name.len(), 32 + 4);
}
