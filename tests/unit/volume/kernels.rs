use super::*;

use proptest::prelude::*;

use crate::foundation::math::{fp_from_unit, fp_to_unit};

fn grey(alpha: f64) -> [u16; 4] {
    let a = fp_from_unit(alpha);
    [a, a, a, a]
}

#[test]
fn half_opaque_samples_accumulate_without_early_out() {
    let mut acc = CompositeAccumulator::new();
    for _ in 0..3 {
        assert!(!acc.add(grey(0.5)));
    }
    assert!((fp_to_unit(acc.alpha()) - 0.875).abs() < 1e-3);
    assert!(!acc.add(grey(0.5)));
    assert_eq!(acc.samples(), 4);
    assert!(!acc.is_opaque());
}

#[test]
fn dense_samples_stop_after_two() {
    let mut acc = CompositeAccumulator::new();
    assert!(!acc.add(grey(0.99)));
    assert!(acc.add(grey(0.99)));
    assert_eq!(acc.samples(), 2);
    assert!(acc.alpha() >= EARLY_OUT);
}

#[test]
fn accumulation_saturates() {
    let mut acc = CompositeAccumulator::new();
    for _ in 0..10 {
        acc.add([u16::MAX, u16::MAX, u16::MAX, 0x7FFF]);
    }
    let p = acc.pixel();
    assert!(p.iter().all(|&c| u32::from(c) <= FP_SCALE));
    assert_eq!(u32::from(p[3]), FP_SCALE);
}

#[test]
fn max_keeps_first_of_equal_maxima_and_ignores_nan() {
    let mut m = MaxAccumulator::new();
    m.add(0.3, [0.0; 3]);
    m.add(f64::NAN, [1.0, 0.0, 0.0]);
    m.add(0.7, [2.0, 0.0, 0.0]);
    m.add(0.7, [3.0, 0.0, 0.0]);
    assert_eq!(m.max(), Some((0.7, [2.0, 0.0, 0.0])));
    assert_eq!(m.samples(), 4);
}

fn line_volume(values: &[f32]) -> SampledVolume {
    SampledVolume::from_values([values.len(), 1, 1], values.to_vec()).unwrap()
}

fn caster<'a>(
    volume: &'a SampledVolume,
    tables: &'a RayCastTables,
    kernel: Kernel,
) -> RayCaster<'a> {
    RayCaster {
        volume,
        tables,
        shading: None,
        interpolation: Interpolation::Linear,
        sample_distance: 1.0,
        kernel,
        bounds: volume.bounds(),
    }
}

fn along_x() -> Ray {
    Ray {
        origin: [-1.0, 0.0, 0.0],
        dir: [1.0, 0.0, 0.0],
    }
}

#[test]
fn mip_returns_the_brightest_sample() {
    let vol = line_volume(&[0.1, 0.9, 0.4]);
    let mut tables = RayCastTables::new();
    tables
        .update(&VolumeProperty::ramp(0.0, 1.0), (0.0, 1.0), 1.0, BlendMode::MaximumIntensity)
        .unwrap();
    let r = caster(&vol, &tables, Kernel::Mip).cast(&along_x());
    assert_eq!(r.samples, 3);
    assert!(!r.early);
    assert!((fp_to_unit(u32::from(r.pixel[3])) - 0.9).abs() < 0.005);
}

#[test]
fn composite_ray_stops_when_opaque() {
    let vol = line_volume(&[1.0; 8]);
    let mut tables = RayCastTables::new();
    tables
        .update(&VolumeProperty::ramp(0.0, 1.0), (0.0, 1.0), 1.0, BlendMode::Composite)
        .unwrap();
    let r = caster(&vol, &tables, Kernel::Composite).cast(&along_x());
    assert!(r.early);
    assert_eq!(r.samples, 1);
    assert_eq!(u32::from(r.pixel[3]), FP_SCALE);
}

#[test]
fn missing_the_volume_is_transparent() {
    let vol = line_volume(&[1.0; 4]);
    let mut tables = RayCastTables::new();
    tables
        .update(&VolumeProperty::ramp(0.0, 1.0), (0.0, 1.0), 1.0, BlendMode::Composite)
        .unwrap();
    let ray = Ray {
        origin: [-1.0, 5.0, 0.0],
        dir: [1.0, 0.0, 0.0],
    };
    assert_eq!(caster(&vol, &tables, Kernel::Composite).cast(&ray), RayResult::default());
}

#[test]
fn flat_gradient_hides_homogeneous_regions() {
    let vol = line_volume(&[0.5; 6]);
    let mut prop = VolumeProperty::ramp(0.0, 1.0);
    prop.gradient_opacity = Some(crate::volume::transfer::PiecewiseFunction::linear(
        0.0, 0.0, 0.25, 1.0,
    ));
    let mut tables = RayCastTables::new();
    tables.update(&prop, (0.0, 1.0), 1.0, BlendMode::Composite).unwrap();
    let r = caster(&vol, &tables, Kernel::GradientOpacity).cast(&along_x());
    assert_eq!(r.pixel, [0; 4]);
    assert_eq!(r.samples, 6);
}

#[test]
fn kernel_selection() {
    let mut prop = VolumeProperty::default();
    assert_eq!(Kernel::select(BlendMode::Composite, &prop), Kernel::Composite);
    prop.shade = true;
    assert_eq!(Kernel::select(BlendMode::Composite, &prop), Kernel::CompositeShaded);
    prop.gradient_opacity = Some(Default::default());
    assert_eq!(Kernel::select(BlendMode::Composite, &prop), Kernel::GradientOpacity);
    assert_eq!(Kernel::select(BlendMode::MaximumIntensity, &prop), Kernel::Mip);
}

proptest! {
    #[test]
    fn accumulated_alpha_never_decreases(
        samples in prop::collection::vec(any::<[u16; 4]>(), 0..64),
    ) {
        let mut acc = CompositeAccumulator::new();
        let mut prev = acc.alpha();
        for s in samples {
            let opaque = acc.add(s);
            prop_assert!(acc.alpha() >= prev);
            prop_assert!(acc.alpha() <= FP_SCALE);
            prop_assert_eq!(opaque, acc.is_opaque());
            prev = acc.alpha();
        }
    }
}
