use super::*;

use crate::display::surface::Rgba8Surface;

#[test]
fn tile_buffers_are_checked() {
    assert!(Tile::rgba8(2, 2, &[0; 16]).is_ok());
    assert!(matches!(Tile::rgba8(2, 2, &[0; 15]), Err(VoxflowError::BadInput(_))));
    assert!(matches!(Tile::fixed15(2, 2, &[[0; 4]; 3]), Err(VoxflowError::BadInput(_))));
}

#[test]
fn pixel_scale_is_bounded() {
    let mut h = ImageDisplayHelper::new();
    assert!(h.set_pixel_scale(0).is_err());
    assert!(h.set_pixel_scale(17).is_err());
    h.set_pixel_scale(16).unwrap();
    assert_eq!(h.pixel_scale(), 16);
}

#[test]
fn scaled_blit_replicates_pixels() {
    let data = [255, 0, 0, 255, 0, 255, 0, 255];
    let tile = Tile::rgba8(2, 1, &data).unwrap();
    let mut h = ImageDisplayHelper::new();
    h.set_pixel_scale(2).unwrap();
    let mut s = Rgba8Surface::new(4, 2).unwrap();
    let n = h.blit(&mut s, &tile, Rect::new(0, 0, 4, 2), (4, 2)).unwrap();
    assert_eq!(n, 8);
    assert_eq!(s.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(2, 0), Some([0, 255, 0, 255]));
}

#[test]
fn blit_clips_to_view_and_negative_offsets() {
    let data = [[0x7FFF; 4]; 4];
    let tile = Tile::fixed15(2, 2, &data).unwrap();
    let h = ImageDisplayHelper::new();
    let mut s = Rgba8Surface::new(3, 3).unwrap();
    let n = h.blit(&mut s, &tile, Rect::new(-1, 1, 2, 2), (3, 2)).unwrap();
    assert_eq!(n, 1);
    assert_eq!(s.pixel(0, 1), Some([255; 4]));
    assert_eq!(s.pixel(0, 2), Some([0; 4]));
}

#[test]
fn straight_tiles_are_premultiplied_on_upload() {
    let data = [255, 255, 255, 128];
    let tile = Tile::rgba8(1, 1, &data).unwrap();
    let mut h = ImageDisplayHelper::new();
    h.set_premultiplied_colors(false);
    let mut s = Rgba8Surface::new(1, 1).unwrap();
    h.blit(&mut s, &tile, Rect::new(0, 0, 1, 1), (1, 1)).unwrap();
    assert_eq!(s.pixel(0, 0), Some([128, 128, 128, 128]));
}
