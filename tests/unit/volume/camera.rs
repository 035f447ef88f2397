use super::*;

fn close(a: Vec3, b: Vec3) -> bool {
    (0..3).all(|i| (a[i] - b[i]).abs() < 1e-9)
}

#[test]
fn ray_clip_hits_and_misses() {
    let bounds = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
    let hit = Ray {
        origin: [0.5, 0.5, 5.0],
        dir: [0.0, 0.0, -1.0],
    };
    let (t0, t1) = hit.clip(bounds).unwrap();
    assert!((t0 - 4.0).abs() < 1e-12);
    assert!((t1 - 5.0).abs() < 1e-12);
    assert!(close(hit.at(t0), [0.5, 0.5, 1.0]));

    let miss = Ray {
        origin: [3.0, 0.5, 5.0],
        dir: [0.0, 0.0, -1.0],
    };
    assert_eq!(miss.clip(bounds), None);

    let behind = Ray {
        origin: [0.5, 0.5, 5.0],
        dir: [0.0, 0.0, 1.0],
    };
    assert_eq!(behind.clip(bounds), None);
}

#[test]
fn ray_starting_inside_clips_at_zero() {
    let r = Ray {
        origin: [0.5, 0.5, 0.5],
        dir: [1.0, 0.0, 0.0],
    };
    let (t0, t1) = r.clip([0.0, 1.0, 0.0, 1.0, 0.0, 1.0]).unwrap();
    assert_eq!(t0, 0.0);
    assert!((t1 - 0.5).abs() < 1e-12);
}

#[test]
fn default_basis_is_right_handed() {
    let b = Camera::default().basis().unwrap();
    assert!(close(b.forward, [0.0, 0.0, -1.0]));
    assert!(close(b.right, [1.0, 0.0, 0.0]));
    assert!(close(b.up, [0.0, 1.0, 0.0]));
}

#[test]
fn degenerate_camera_is_a_domain_error() {
    let cam = Camera {
        position: [0.0; 3],
        ..Camera::default()
    };
    assert!(matches!(cam.basis(), Err(VoxflowError::NumericDomain(_))));

    let cam = Camera {
        view_up: [0.0, 0.0, 1.0],
        ..Camera::default()
    };
    assert!(matches!(cam.basis(), Err(VoxflowError::NumericDomain(_))));
}

#[test]
fn centre_ray_points_at_the_focal_point() {
    let cam = Camera::framing([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]);
    let b = cam.basis().unwrap();
    let r = cam.ray(&b, 1, 1, 3, 3).unwrap();
    assert!(close(r.dir, b.forward));
    let (t0, _) = r.clip([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]).unwrap();
    assert!(close(r.at(t0), [5.0, 5.0, 10.0]));
}

#[test]
fn top_row_looks_up() {
    let cam = Camera::default();
    let b = cam.basis().unwrap();
    let top = cam.ray(&b, 0, 0, 4, 4).unwrap();
    let bottom = cam.ray(&b, 0, 3, 4, 4).unwrap();
    assert!(top.dir[1] > 0.0);
    assert!(bottom.dir[1] < 0.0);
    assert!(top.dir[0] < 0.0);
}

#[test]
fn parallel_rays_share_a_direction() {
    let cam = Camera::default().parallel(2.0);
    let b = cam.basis().unwrap();
    let a = cam.ray(&b, 0, 0, 2, 2).unwrap();
    let c = cam.ray(&b, 1, 1, 2, 2).unwrap();
    assert!(close(a.dir, c.dir));
    assert!(close(a.origin, [-1.0, 1.0, 1.0]));
    assert!(close(c.origin, [1.0, -1.0, 1.0]));
}
