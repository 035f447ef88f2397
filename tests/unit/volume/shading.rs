use super::*;

fn matte() -> VolumeProperty {
    VolumeProperty {
        ambient: 0.2,
        diffuse: 0.8,
        specular: 0.0,
        ..VolumeProperty::default()
    }
}

#[test]
fn facing_gradient_is_fully_lit() {
    let t = ShadingTable::new(&matte());
    let out = t.shade([16384, 16384, 16384, 32767], [0.0, 0.0, 3.0], [0.0, 0.0, 1.0]);
    assert!((i32::from(out[0]) - 16384).abs() <= 2);
    assert_eq!(out[3], 32767);
}

#[test]
fn lighting_is_two_sided() {
    let t = ShadingTable::new(&matte());
    let a = t.shade([20000, 0, 0, 30000], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]);
    let b = t.shade([20000, 0, 0, 30000], [0.0, 0.0, -1.0], [0.0, 0.0, 1.0]);
    assert_eq!(a, b);
}

#[test]
fn grazing_and_zero_gradients_get_ambient_only() {
    let t = ShadingTable::new(&matte());
    let grazing = t.shade([20000, 0, 0, 30000], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    let flat = t.shade([20000, 0, 0, 30000], [0.0; 3], [0.0, 0.0, 1.0]);
    assert_eq!(grazing, flat);
    assert!((i32::from(flat[0]) - 4000).abs() <= 2);
}

#[test]
fn specular_highlight_scales_with_opacity() {
    let prop = VolumeProperty {
        ambient: 0.0,
        diffuse: 0.0,
        specular: 1.0,
        specular_power: 4.0,
        ..VolumeProperty::default()
    };
    let t = ShadingTable::new(&prop);
    let out = t.shade([0, 0, 0, 16384], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]);
    assert!((i32::from(out[0]) - 16384).abs() <= 2);
    assert_eq!(ShadingTable::cosine_index([0.0, 0.0, 2.0], [0.0, 0.0, 1.0]), Some(255));
    assert_eq!(ShadingTable::cosine_index([0.0; 3], [0.0, 0.0, 1.0]), None);
}
