use super::*;

use crate::array::AosArray;
use crate::filters::AnalyticImageSource;
use crate::foundation::core::Extent;
use crate::pipeline::ExecutiveOpts;
use crate::volume::transfer::PiecewiseFunction;

fn cube(n: i32, value: f64) -> ImageData {
    let ext = Extent::new(0, n - 1, 0, n - 1, 0, n - 1);
    let mut img = ImageData::new(ext);
    let values = vec![value; ext.num_points()];
    img.set_scalars(Arc::new(AosArray::from_vec(1, values).unwrap().named("s")))
        .unwrap();
    img
}

fn mapper() -> FixedPointRayCastMapper {
    FixedPointRayCastMapper::new(VolumeProperty::ramp(0.0, 1.0))
        .with_context(Arc::new(SmpContext::sequential()))
        .with_abort_flag(AbortFlag::new())
}

#[test]
fn options_are_validated() {
    let img = cube(4, 1.0);
    let cam = Camera::framing(img.bounds());
    for opts in [
        RayCastOpts { image_sample_distance: 0, ..RayCastOpts::default() },
        RayCastOpts { image_sample_distance: 17, ..RayCastOpts::default() },
        RayCastOpts { sample_distance: 0.0, ..RayCastOpts::default() },
        RayCastOpts { tile_size: 0, ..RayCastOpts::default() },
    ] {
        let mut m = mapper().with_opts(opts);
        assert!(matches!(m.render(&img, &cam, [8, 8]), Err(VoxflowError::Validation(_))));
    }
    assert!(matches!(
        mapper().render(&img, &cam, [0, 8]),
        Err(VoxflowError::Validation(_))
    ));
}

#[test]
fn missing_scalars_are_bad_input() {
    let img = ImageData::new(Extent::new(0, 3, 0, 3, 0, 3));
    let cam = Camera::framing(img.bounds());
    assert!(matches!(
        mapper().render(&img, &cam, [4, 4]),
        Err(VoxflowError::BadInput(_))
    ));
}

#[test]
fn opaque_cube_covers_the_centre_only() {
    let img = cube(8, 1.0);
    let cam = Camera::framing(img.bounds());
    let mut m = mapper();
    let out = m.render(&img, &cam, [16, 16]).unwrap();
    assert_eq!((out.width(), out.height()), (16, 16));
    assert_eq!(out.pixel(8, 8).unwrap()[3], 0x7FFF);
    assert_eq!(out.pixel(0, 0).unwrap(), [0; 4]);
    let stats = m.last_stats();
    assert_eq!(stats.rays, 256);
    assert_eq!(stats.failed_tiles, 0);
    assert!(stats.early_terminations > 0);
    assert!(stats.samples >= stats.early_terminations);
}

#[test]
fn reduced_resolution_carries_the_pixel_scale() {
    let img = cube(4, 1.0);
    let cam = Camera::framing(img.bounds());
    let opts = RayCastOpts {
        image_sample_distance: 2,
        ..RayCastOpts::default()
    };
    let out = mapper().with_opts(opts).render(&img, &cam, [15, 9]).unwrap();
    assert_eq!((out.width(), out.height(), out.pixel_scale()), (8, 5, 2));
}

#[test]
fn tiling_does_not_change_the_picture() {
    let img = cube(6, 0.3);
    let cam = Camera::framing(img.bounds());
    let a = mapper().render(&img, &cam, [13, 11]).unwrap();
    let opts = RayCastOpts {
        tile_size: 3,
        ..RayCastOpts::default()
    };
    let b = mapper()
        .with_opts(opts)
        .with_context(Arc::new(SmpContext::new(crate::smp::SmpOpts::default()).unwrap()))
        .render(&img, &cam, [13, 11])
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn all_nan_volume_renders_transparent() {
    let img = cube(3, f64::NAN);
    let cam = Camera::framing(img.bounds());
    let mut m = mapper();
    let out = m.render(&img, &cam, [4, 4]).unwrap();
    assert_eq!(out.covered_pixels(), 0);
    assert_eq!(m.last_stats(), RayCastStats::default());
}

#[test]
fn abort_fails_the_pass() {
    let img = cube(4, 1.0);
    let cam = Camera::framing(img.bounds());
    let flag = AbortFlag::new();
    let mut m = mapper().with_abort_flag(flag.clone());
    flag.request();
    assert!(matches!(m.render(&img, &cam, [8, 8]), Err(VoxflowError::Aborted)));
    flag.clear();
    assert!(m.render(&img, &cam, [8, 8]).is_ok());
}

#[test]
fn degenerate_camera_is_rejected() {
    let img = cube(4, 1.0);
    let cam = Camera {
        position: [0.0; 3],
        focal_point: [0.0; 3],
        ..Camera::default()
    };
    assert!(matches!(
        mapper().render(&img, &cam, [4, 4]),
        Err(VoxflowError::NumericDomain(_))
    ));
}

#[test]
fn mip_along_a_line_picks_the_peak() {
    let mut img = ImageData::new(Extent::new(0, 2, 0, 0, 0, 0));
    img.set_scalars(Arc::new(
        AosArray::from_vec(1, vec![0.1f32, 0.9, 0.4]).unwrap().named("s"),
    ))
    .unwrap();
    let cam = Camera {
        position: [-1.0, 0.0, 0.0],
        focal_point: [0.0, 0.0, 0.0],
        ..Camera::default()
    }
    .parallel(1.0);
    let mut m = mapper().with_blend_mode(BlendMode::MaximumIntensity);
    assert_eq!(m.kernel(), Kernel::Mip);
    let out = m.render(&img, &cam, [1, 1]).unwrap();
    let alpha = f64::from(out.pixel(0, 0).unwrap()[3]) / 32767.0;
    assert!((alpha - 0.9).abs() < 0.005, "{alpha}");
    assert_eq!(m.last_stats().early_terminations, 0);
}

#[test]
fn shading_darkens_flat_regions() {
    let img = cube(8, 1.0);
    let cam = Camera::framing(img.bounds());
    let plain = mapper().render(&img, &cam, [16, 16]).unwrap();
    let mut m = mapper();
    m.property_mut().shade = true;
    assert_eq!(m.kernel(), Kernel::CompositeShaded);
    let shaded = m.render(&img, &cam, [16, 16]).unwrap();
    let (p, s) = (plain.pixel(8, 8).unwrap(), shaded.pixel(8, 8).unwrap());
    assert_eq!(p[3], s[3]);
    assert!(s[0] < p[0]);
}

#[test]
fn gradient_opacity_hides_constant_volumes() {
    let img = cube(6, 1.0);
    let cam = Camera::framing(img.bounds());
    let mut m = mapper();
    m.property_mut().gradient_opacity = Some(PiecewiseFunction::linear(0.0, 0.0, 1.0, 1.0));
    assert_eq!(m.kernel(), Kernel::GradientOpacity);
    let out = m.render(&img, &cam, [8, 8]).unwrap();
    assert_eq!(out.covered_pixels(), 0);
}

#[test]
fn tables_rebuild_only_when_inputs_change() {
    let img = cube(4, 1.0);
    let cam = Camera::framing(img.bounds());
    let mut m = mapper();
    m.render(&img, &cam, [4, 4]).unwrap();
    let stamp = m.tables().stamp();
    m.render(&img, &cam, [4, 4]).unwrap();
    assert_eq!(m.tables().stamp(), stamp);
    m.property_mut().scalar_opacity.add_point(0.5, 0.2);
    m.render(&img, &cam, [4, 4]).unwrap();
    assert!(m.tables().stamp() > stamp);
}

#[test]
fn render_port_pulls_through_the_pipeline() {
    let src = Node::with_opts(AnalyticImageSource::cube(10), ExecutiveOpts::in_memory());
    let mut m = FixedPointRayCastMapper::default()
        .with_context(Arc::new(SmpContext::sequential()))
        .with_abort_flag(AbortFlag::new());
    let cam = Camera::framing([0.0, 9.0, 0.0, 9.0, 0.0, 9.0]);
    let out = m.render_port(&src, 0, &cam, [12, 12]).unwrap();
    assert!(out.covered_pixels() > 0);
    assert_eq!(src.executive().request_data_count(), 1);
}
