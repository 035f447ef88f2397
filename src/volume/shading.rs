//! Phong lighting in fixed point with a headlight.

use crate::foundation::math::{FP_SCALE, fp_from_unit, fp_mul};
use crate::volume::camera::{Vec3, dot, normalize};
use crate::volume::property::VolumeProperty;

/// Entries of the cosine tables.
pub const COSINE_TABLE_SIZE: usize = 256;

/// Diffuse and specular terms indexed by the quantized `|n . l|`.
///
/// The light sits at the eye, so the half vector equals the light direction and both terms
/// share one cosine. Surfaces are lit from either side.
#[derive(Clone, Debug)]
pub struct ShadingTable {
    ambient: u32,
    diffuse: [u16; COSINE_TABLE_SIZE],
    specular: [u16; COSINE_TABLE_SIZE],
}

impl ShadingTable {
    /// Tables for the coefficients of `prop`.
    pub fn new(prop: &VolumeProperty) -> Self {
        let mut diffuse = [0u16; COSINE_TABLE_SIZE];
        let mut specular = [0u16; COSINE_TABLE_SIZE];
        for i in 0..COSINE_TABLE_SIZE {
            let c = i as f64 / (COSINE_TABLE_SIZE - 1) as f64;
            diffuse[i] = fp_from_unit(prop.diffuse * c);
            specular[i] = fp_from_unit(prop.specular * c.powf(prop.specular_power));
        }
        Self {
            ambient: u32::from(fp_from_unit(prop.ambient)),
            diffuse,
            specular,
        }
    }

    /// Cosine table index for `gradient` seen along `view_dir`; `None` for a zero gradient.
    pub fn cosine_index(gradient: Vec3, view_dir: Vec3) -> Option<usize> {
        let n = normalize(gradient)?;
        let c = dot(n, view_dir).abs().min(1.0);
        Some((c * (COSINE_TABLE_SIZE - 1) as f64).round() as usize)
    }

    /// Shade a premultiplied sample. A zero gradient receives ambient light only.
    pub fn shade(&self, rgba: [u16; 4], gradient: Vec3, view_dir: Vec3) -> [u16; 4] {
        let (kd, ks) = match Self::cosine_index(gradient, view_dir) {
            Some(i) => (u32::from(self.diffuse[i]), u32::from(self.specular[i])),
            None => (0, 0),
        };
        let k = (self.ambient + kd).min(FP_SCALE);
        let alpha = u32::from(rgba[3]);
        let highlight = fp_mul(ks, alpha);
        let mut out = rgba;
        for c in out.iter_mut().take(3) {
            *c = (fp_mul(u32::from(*c), k) + highlight).min(FP_SCALE) as u16;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/volume/shading.rs"]
mod tests;
