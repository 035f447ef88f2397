use super::*;

use crate::pipeline::keys::{DATA_TYPE_NAME, SPACING, UPDATE_PIECE_NUMBER, WHOLE_EXTENT};

#[test]
fn typed_keys_round_trip() {
    let mut info = Information::new();
    let e = Extent::new(0, 9, 0, 9, 0, 0);
    info.set(&WHOLE_EXTENT, e);
    info.set(&SPACING, [1.0, 2.0, 3.0]);
    info.set(&DATA_TYPE_NAME, "image".to_owned());
    assert_eq!(info.get(&WHOLE_EXTENT), Some(e));
    assert_eq!(info.get(&SPACING), Some([1.0, 2.0, 3.0]));
    assert_eq!(info.get(&DATA_TYPE_NAME).as_deref(), Some("image"));
    assert_eq!(info.len(), 3);
}

#[test]
fn type_mismatch_reads_as_absent() {
    let mut info = Information::new();
    info.set_raw(UPDATE_PIECE_NUMBER.name(), InfoValue::String("x".into()));
    assert!(info.has(&UPDATE_PIECE_NUMBER));
    assert_eq!(info.get(&UPDATE_PIECE_NUMBER), None);
}

#[test]
fn unknown_keys_survive_copies() {
    let mut a = Information::new();
    a.set_raw("CUSTOM_KEY", InfoValue::IntVec(vec![1, 2]));
    let mut b = Information::new();
    b.copy_from(&a);
    assert_eq!(b.get_raw("CUSTOM_KEY"), Some(&InfoValue::IntVec(vec![1, 2])));
    b.remove(&WHOLE_EXTENT);
    assert_eq!(b.len(), 1);
    b.clear();
    assert!(b.is_empty());
}
