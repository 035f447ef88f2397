use crate::display::Tile;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::foundation::math::fp_to_u8;

/// Output of a ray-cast pass: premultiplied RGBA in 15-bit fixed point, row 0 at the top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RayCastImage {
    width: usize,
    height: usize,
    pixel_scale: u32,
    pixels: Vec<[u16; 4]>,
}

impl RayCastImage {
    /// Transparent image. Allocation failure is reported as `OutOfMemory`.
    pub fn new(width: usize, height: usize, pixel_scale: u32) -> VoxflowResult<Self> {
        let n = width
            .checked_mul(height)
            .ok_or_else(|| VoxflowError::out_of_memory(format!("image {width}x{height}")))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(n)
            .map_err(|_| VoxflowError::out_of_memory(format!("image {width}x{height}")))?;
        pixels.resize(n, [0; 4]);
        Ok(Self {
            width,
            height,
            pixel_scale,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Factor by which the image is to be upsampled for display.
    pub fn pixel_scale(&self) -> u32 {
        self.pixel_scale
    }

    /// Pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u16; 4]> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[[u16; 4]] {
        &self.pixels
    }

    /// Copy a `w`-wide block of rows to `(x0, y0)`, clipped to the image.
    pub fn write_block(&mut self, x0: usize, y0: usize, w: usize, block: &[[u16; 4]]) {
        if w == 0 {
            return;
        }
        for (row, src) in block.chunks(w).enumerate() {
            let y = y0 + row;
            if y >= self.height || x0 >= self.width {
                break;
            }
            let n = src.len().min(self.width - x0);
            let start = y * self.width + x0;
            self.pixels[start..start + n].copy_from_slice(&src[..n]);
        }
    }

    /// Pixels whose opacity is non-zero.
    pub fn covered_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0).count()
    }

    /// Premultiplied RGBA8 copy.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.map(fp_to_u8)).collect()
    }

    /// The whole image as a display tile.
    pub fn as_tile(&self) -> VoxflowResult<Tile<'_>> {
        let (w, h) = (
            u32::try_from(self.width).map_err(|_| VoxflowError::validation("image too wide"))?,
            u32::try_from(self.height).map_err(|_| VoxflowError::validation("image too tall"))?,
        );
        Tile::fixed15(w, h, &self.pixels)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/volume/image.rs"]
mod tests;
