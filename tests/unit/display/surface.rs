use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Rgba8Surface::new(3, 2).unwrap();
    assert_eq!(s.size(), (3, 2));
    assert_eq!(s.as_bytes().len(), 24);
    assert!(s.as_bytes().iter().all(|&b| b == 0));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn blend_composites_over_existing_content() {
    let mut s = Rgba8Surface::new(2, 1).unwrap();
    s.clear([0, 0, 255, 255]);
    s.blend_pixel(1, 0, [255, 0, 0, 255]);
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(1, 0), Some([255, 0, 0, 255]));
    s.blend_pixel(9, 9, [255, 255, 255, 255]);
}

#[test]
fn png_is_written_straight_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    let mut s = Rgba8Surface::new(2, 2).unwrap();
    s.clear([64, 0, 0, 128]);
    s.save_png(&path).unwrap();
    assert!(path.metadata().unwrap().len() > 0);
    assert_eq!(&s.to_straight_rgba8()[..4], &[128, 0, 0, 128]);
}
