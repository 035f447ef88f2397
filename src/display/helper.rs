//! Tile upload onto a render surface.

use crate::display::composite::premultiply;
use crate::display::surface::RenderSurface;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::foundation::math::fp_to_u8;

/// Largest supported `pixel_scale`.
pub const MAX_PIXEL_SCALE: u32 = 16;

/// Pixel storage of a [`Tile`].
#[derive(Clone, Copy, Debug)]
pub enum TilePixels<'a> {
    /// 8-bit RGBA, four bytes per pixel.
    Rgba8(&'a [u8]),
    /// 15-bit fixed-point RGBA.
    Fixed15(&'a [[u16; 4]]),
}

/// A borrowed block of pixels, row 0 at the top.
#[derive(Clone, Copy, Debug)]
pub struct Tile<'a> {
    width: u32,
    height: u32,
    pixels: TilePixels<'a>,
}

impl<'a> Tile<'a> {
    /// 8-bit tile; `data` must hold `4 * width * height` bytes.
    pub fn rgba8(width: u32, height: u32, data: &'a [u8]) -> VoxflowResult<Self> {
        Self::checked(width, height, data.len() / 4, data.len() % 4 == 0, TilePixels::Rgba8(data))
    }

    /// Fixed-point tile; `data` must hold `width * height` pixels.
    pub fn fixed15(width: u32, height: u32, data: &'a [[u16; 4]]) -> VoxflowResult<Self> {
        Self::checked(width, height, data.len(), true, TilePixels::Fixed15(data))
    }

    fn checked(
        width: u32,
        height: u32,
        len: usize,
        aligned: bool,
        pixels: TilePixels<'a>,
    ) -> VoxflowResult<Self> {
        if !aligned || len != width as usize * height as usize {
            return Err(VoxflowError::bad_input(format!(
                "tile {width}x{height} does not match its pixel buffer"
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel `(x, y)` narrowed to 8 bits, as stored.
    pub fn rgba8_at(&self, x: u32, y: u32) -> [u8; 4] {
        let i = y as usize * self.width as usize + x as usize;
        match self.pixels {
            TilePixels::Rgba8(d) => [d[4 * i], d[4 * i + 1], d[4 * i + 2], d[4 * i + 3]],
            TilePixels::Fixed15(d) => d[i].map(fp_to_u8),
        }
    }
}

/// Destination rectangle in surface pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left edge (may be negative).
    pub x: i64,
    /// Top edge (may be negative).
    pub y: i64,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Rect {
    /// Rectangle at `(x, y)`.
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Blits produced tiles onto a [`RenderSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDisplayHelper {
    premultiplied_colors: bool,
    pixel_scale: u32,
}

impl Default for ImageDisplayHelper {
    fn default() -> Self {
        Self {
            premultiplied_colors: true,
            pixel_scale: 1,
        }
    }
}

impl ImageDisplayHelper {
    /// Premultiplied input, no upsampling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether tiles already carry premultiplied colour.
    pub fn premultiplied_colors(&self) -> bool {
        self.premultiplied_colors
    }

    /// Set whether tiles already carry premultiplied colour.
    pub fn set_premultiplied_colors(&mut self, on: bool) {
        self.premultiplied_colors = on;
    }

    /// Upsampling factor.
    pub fn pixel_scale(&self) -> u32 {
        self.pixel_scale
    }

    /// Set the upsampling factor (1..=16).
    pub fn set_pixel_scale(&mut self, scale: u32) -> VoxflowResult<()> {
        if !(1..=MAX_PIXEL_SCALE).contains(&scale) {
            return Err(VoxflowError::validation(format!(
                "pixel scale must be in 1..={MAX_PIXEL_SCALE}, got {scale}"
            )));
        }
        self.pixel_scale = scale;
        Ok(())
    }

    /// Composite `tile` into `dest` on `surface`, each tile pixel covering
    /// `pixel_scale x pixel_scale` destination pixels. Output is clipped to `dest`, to
    /// `view_size` and to the surface. Returns the number of destination pixels touched.
    pub fn blit(
        &self,
        surface: &mut dyn RenderSurface,
        tile: &Tile<'_>,
        dest: Rect,
        view_size: (u32, u32),
    ) -> VoxflowResult<usize> {
        let s = i64::from(self.pixel_scale);
        let (sw, sh) = surface.size();
        let x_end = (dest.x + i64::from(dest.width))
            .min(dest.x + i64::from(tile.width()) * s)
            .min(i64::from(view_size.0.min(sw)));
        let y_end = (dest.y + i64::from(dest.height))
            .min(dest.y + i64::from(tile.height()) * s)
            .min(i64::from(view_size.1.min(sh)));
        let (x0, y0) = (dest.x.max(0), dest.y.max(0));

        let mut touched = 0;
        for y in y0..y_end {
            let ty = ((y - dest.y) / s) as u32;
            for x in x0..x_end {
                let tx = ((x - dest.x) / s) as u32;
                let raw = tile.rgba8_at(tx, ty);
                let px = if self.premultiplied_colors {
                    raw
                } else {
                    premultiply(raw)
                };
                surface.blend_pixel(x as u32, y as u32, px);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/helper.rs"]
mod tests;
