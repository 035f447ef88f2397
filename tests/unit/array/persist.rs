use super::*;

#[test]
fn aos_layout_matches_documented_bytes() {
    let a = AosArray::from_vec(1, vec![1_u16, 0x0203]).unwrap();
    let bytes = write_array(&a).unwrap();
    let mut want = vec![5_u8];
    want.extend_from_slice(&2_u64.to_le_bytes());
    want.push(1);
    want.extend_from_slice(&[1, 0, 3, 2]);
    assert_eq!(bytes, want);

    let back = read_array(&bytes, Layout::Aos).unwrap();
    let back = back.downcast_ref::<AosArray<u16>>().unwrap();
    assert_eq!(back.as_slice(), a.as_slice());
}

#[test]
fn soa_persists_scale_per_component() {
    let mut a = SoaArray::from_buffers(vec![vec![1_i8, -2], vec![3, 4]]).unwrap();
    a.set_scale(1, Some(0.5)).unwrap();
    let bytes = write_array(&a).unwrap();
    assert_eq!(bytes.len(), 1 + 8 + 1 + 2 * (8 + 2));

    let back = read_array(&bytes, Layout::Soa).unwrap();
    let back = back.downcast_ref::<SoaArray<i8>>().unwrap();
    assert_eq!(back.scale(0), None);
    assert_eq!(back.scale(1), Some(0.5));
    assert_eq!(back.get(1, 1), 2.0);
    assert_eq!(back.get_raw(1, 0), -2);
}

#[test]
fn truncated_and_unknown_inputs_fail_cleanly() {
    let a = AosArray::from_vec(2, vec![1.0_f64, 2.0, 3.0, 4.0]).unwrap();
    let bytes = write_array(&a).unwrap();
    assert!(matches!(
        read_array(&bytes[..bytes.len() - 1], Layout::Aos),
        Err(VoxflowError::Serde(_))
    ));
    let mut bad = bytes.clone();
    bad[0] = 99;
    assert!(read_array(&bad, Layout::Aos).is_err());
    let mut long = bytes;
    long.push(0);
    assert!(read_array(&long, Layout::Aos).is_err());
}

#[test]
fn image_round_trip_keeps_geometry_and_arrays() {
    let mut img = ImageData::new(Extent::new(0, 2, 0, 1, 0, 0));
    img.set_origin([1.0, 2.0, 3.0]);
    img.set_spacing([0.5, 0.5, 1.0]);
    let scalars = AosArray::from_vec(1, (0..6).map(|v| v as f32).collect::<Vec<f32>>())
        .unwrap()
        .named("density");
    img.set_scalars(Arc::new(scalars)).unwrap();

    let back = read_image(&write_image(&img).unwrap()).unwrap();
    assert_eq!(back.extent(), img.extent());
    assert_eq!(back.origin(), [1.0, 2.0, 3.0]);
    assert_eq!(back.spacing(), [0.5, 0.5, 1.0]);
    let s = back.scalars().unwrap();
    assert_eq!(s.name(), "density");
    assert_eq!(s.component(5, 0), 5.0);
    assert!(read_image(b"nope").is_err());
}

#[test]
fn more_components_than_the_header_holds_is_rejected() {
    let a = AosArray::<u8>::zeros(2, MAX_PERSISTED_COMPONENTS + 1).unwrap();
    let err = write_array(&a).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::BadInput);

    let b = SoaArray::<u8>::zeros(2, MAX_PERSISTED_COMPONENTS + 1).unwrap();
    assert!(matches!(write_array(&b), Err(VoxflowError::BadInput(_))));

    let mut img = ImageData::new(Extent::new(0, 1, 0, 0, 0, 0));
    img.point_data_mut().insert(Arc::new(a.named("wide"))).unwrap();
    assert!(matches!(write_image(&img), Err(VoxflowError::BadInput(_))));

    let widest = AosArray::<u8>::zeros(2, MAX_PERSISTED_COMPONENTS).unwrap();
    let bytes = write_array(&widest).unwrap();
    let back = read_array(&bytes, Layout::Aos).unwrap();
    assert_eq!(back.number_of_components(), MAX_PERSISTED_COMPONENTS);
    assert_eq!(back.number_of_tuples(), 2);
}
