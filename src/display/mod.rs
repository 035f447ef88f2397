//! Presentation of ray-cast images on a render surface.

/// Premultiplied RGBA8 blending.
pub mod composite;
pub mod helper;
/// Render surfaces.
pub mod surface;

pub use composite::{PremulRgba8, over, premultiply, unpremultiply};
pub use helper::{ImageDisplayHelper, MAX_PIXEL_SCALE, Rect, Tile, TilePixels};
pub use surface::{RenderSurface, Rgba8Surface};
