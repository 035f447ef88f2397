use std::path::Path;

use anyhow::Context;

use crate::display::composite::{PremulRgba8, over, unpremultiply};
use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Destination of blitted tiles.
pub trait RenderSurface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    /// Composite a premultiplied pixel over `(x, y)`. Callers stay inside [`RenderSurface::size`].
    fn blend_pixel(&mut self, x: u32, y: u32, src: PremulRgba8);
}

/// Tightly packed premultiplied RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rgba8Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Rgba8Surface {
    /// Transparent frame.
    pub fn new(width: u32, height: u32) -> VoxflowResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| VoxflowError::validation(format!("surface {width}x{height} is too large")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| VoxflowError::out_of_memory(format!("surface of {len} bytes")))?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Fill with one premultiplied colour.
    pub fn clear(&mut self, color: PremulRgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = 4 * (y as usize * self.width as usize + x as usize);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Raw premultiplied bytes, row-major from the top.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Straight-alpha copy of the frame.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .flat_map(|p| unpremultiply([p[0], p[1], p[2], p[3]]))
            .collect()
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: &Path) -> VoxflowResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl RenderSurface for Rgba8Surface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn blend_pixel(&mut self, x: u32, y: u32, src: PremulRgba8) {
        let i = 4 * (y as usize * self.width as usize + x as usize);
        let Some(px) = self.data.get_mut(i..i + 4) else {
            return;
        };
        let out = over([px[0], px[1], px[2], px[3]], src);
        px.copy_from_slice(&out);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/surface.rs"]
mod tests;
