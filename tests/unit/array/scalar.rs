use super::*;

#[test]
fn type_codes_round_trip() {
    for t in ScalarType::ALL {
        assert_eq!(ScalarType::from_code(t.code()).unwrap(), t);
    }
    assert_eq!(ScalarType::UInt8.code(), 3);
    assert_eq!(ScalarType::Float64.code(), 11);
    assert!(ScalarType::from_code(99).is_err());
}

#[test]
fn integer_narrowing_saturates() {
    assert_eq!(u8::from_f64(300.0), 255);
    assert_eq!(u8::from_f64(-4.0), 0);
    assert_eq!(i16::from_f64(f64::NAN), 0);
    assert_eq!(i32::from_f64(2.6), 3);
}

#[test]
fn nan_is_only_reported_for_floats() {
    assert!(f32::NAN.is_nan());
    assert!(Scalar::is_nan(f64::NAN));
    assert!(!Scalar::is_nan(7_u16));
}

#[test]
fn little_endian_bytes() {
    let mut out = Vec::new();
    0x0102_u16.write_le(&mut out);
    assert_eq!(out, vec![0x02, 0x01]);
    assert_eq!(u16::read_le(&out), 0x0102);
}

#[test]
fn dispatch_picks_matching_type() {
    let size = crate::dispatch_scalar!(ScalarType::Int64, T => std::mem::size_of::<T>());
    assert_eq!(size, 8);
}
