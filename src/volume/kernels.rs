//! Per-ray traversal and the compositing rules.

use crate::foundation::math::{FP_SCALE, fp_mul};
use crate::volume::camera::{Ray, Vec3, dot};
use crate::volume::property::{BlendMode, Interpolation, VolumeProperty};
use crate::volume::sampler::SampledVolume;
use crate::volume::shading::ShadingTable;
use crate::volume::tables::RayCastTables;

/// Accumulated opacity at which a composite ray stops.
pub const EARLY_OUT: u32 = 0x7F00;

/// Front-to-back compositing of premultiplied fixed-point samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeAccumulator {
    color: [u32; 3],
    alpha: u32,
    samples: u32,
}

impl CompositeAccumulator {
    /// Transparent start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend `src` (premultiplied RGB and opacity) behind what was accumulated so far.
    /// Returns `true` once the ray is opaque enough to stop.
    pub fn add(&mut self, src: [u16; 4]) -> bool {
        self.samples += 1;
        let remaining = FP_SCALE - self.alpha;
        for c in 0..3 {
            self.color[c] = (self.color[c] + fp_mul(remaining, u32::from(src[c]))).min(FP_SCALE);
        }
        self.alpha = (self.alpha + fp_mul(remaining, u32::from(src[3]))).min(FP_SCALE);
        self.is_opaque()
    }

    /// `true` when accumulated opacity reached [`EARLY_OUT`].
    pub fn is_opaque(&self) -> bool {
        self.alpha >= EARLY_OUT
    }

    /// Accumulated opacity.
    pub fn alpha(&self) -> u32 {
        self.alpha
    }

    /// Samples blended so far.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Premultiplied RGBA result.
    pub fn pixel(&self) -> [u16; 4] {
        [
            self.color[0] as u16,
            self.color[1] as u16,
            self.color[2] as u16,
            self.alpha as u16,
        ]
    }
}

/// Running maximum for maximum-intensity projection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaxAccumulator {
    best: Option<(f64, Vec3)>,
    samples: u32,
}

impl MaxAccumulator {
    /// No samples yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer scalar `s` found at voxel position `u`. NaN is ignored; the first of equal
    /// maxima is kept.
    pub fn add(&mut self, s: f64, u: Vec3) {
        self.samples += 1;
        if s.is_nan() {
            return;
        }
        match self.best {
            Some((m, _)) if m >= s => {}
            _ => self.best = Some((s, u)),
        }
    }

    /// Largest scalar and where it was found.
    pub fn max(&self) -> Option<(f64, Vec3)> {
        self.best
    }

    /// Samples offered so far.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Table colour of the maximum, optionally shaded; transparent without samples.
    pub fn pixel(
        &self,
        tables: &RayCastTables,
        shading: Option<(&ShadingTable, &SampledVolume, Vec3)>,
    ) -> [u16; 4] {
        let Some((s, u)) = self.best else {
            return [0; 4];
        };
        let rgba = tables.lookup(s);
        match shading {
            Some((table, volume, view)) => table.shade(rgba, volume.gradient(u), view),
            None => rgba,
        }
    }
}

/// Which inner loop a render uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kernel {
    /// Unshaded composite.
    Composite,
    /// Composite with Phong shading.
    CompositeShaded,
    /// Composite with opacity modulated by gradient magnitude (shaded when requested).
    GradientOpacity,
    /// Maximum-intensity projection.
    Mip,
}

impl Kernel {
    /// Kernel for a blend mode and property.
    pub fn select(blend: BlendMode, prop: &VolumeProperty) -> Self {
        match blend {
            BlendMode::MaximumIntensity => Self::Mip,
            BlendMode::Composite if prop.gradient_opacity.is_some() => Self::GradientOpacity,
            BlendMode::Composite if prop.shade => Self::CompositeShaded,
            BlendMode::Composite => Self::Composite,
        }
    }
}

/// Everything a ray needs, shared by all workers of one render.
pub(crate) struct RayCaster<'a> {
    pub volume: &'a SampledVolume,
    pub tables: &'a RayCastTables,
    pub shading: Option<&'a ShadingTable>,
    pub interpolation: Interpolation,
    pub sample_distance: f64,
    pub kernel: Kernel,
    pub bounds: [f64; 6],
}

/// Outcome of one ray.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RayResult {
    pub pixel: [u16; 4],
    pub samples: u32,
    pub early: bool,
}

impl RayCaster<'_> {
    /// Samples at `t0, t0 + d, ...` up to `t1`, then the kernel's blending rule.
    pub fn cast(&self, ray: &Ray) -> RayResult {
        let Some((t0, t1)) = ray.clip(self.bounds) else {
            return RayResult::default();
        };
        let steps = ((t1 - t0) / self.sample_distance + 1e-9).floor() as u64 + 1;
        let view = [-ray.dir[0], -ray.dir[1], -ray.dir[2]];

        if self.kernel == Kernel::Mip {
            let mut acc = MaxAccumulator::new();
            for i in 0..steps {
                let u = self.volume.to_voxel(ray.at(t0 + i as f64 * self.sample_distance));
                if let Some(s) = self.volume.sample(u, self.interpolation) {
                    acc.add(s, u);
                }
            }
            let shading = self.shading.map(|t| (t, self.volume, view));
            return RayResult {
                pixel: acc.pixel(self.tables, shading),
                samples: acc.samples(),
                early: false,
            };
        }

        let mut acc = CompositeAccumulator::new();
        let mut taken = 0;
        let mut early = false;
        for i in 0..steps {
            let u = self.volume.to_voxel(ray.at(t0 + i as f64 * self.sample_distance));
            let Some(s) = self.volume.sample(u, self.interpolation) else {
                continue;
            };
            taken += 1;
            let mut rgba = self.tables.lookup(s);
            if rgba[3] == 0 {
                continue;
            }
            let needs_gradient = self.kernel == Kernel::GradientOpacity || self.shading.is_some();
            let g = if needs_gradient { self.volume.gradient(u) } else { [0.0; 3] };
            if self.kernel == Kernel::GradientOpacity {
                let f = u32::from(self.tables.gradient_factor(dot(g, g).sqrt()));
                rgba = rgba.map(|c| fp_mul(u32::from(c), f) as u16);
                if rgba[3] == 0 {
                    continue;
                }
            }
            if let Some(table) = self.shading {
                rgba = table.shade(rgba, g, view);
            }
            if acc.add(rgba) {
                early = true;
                break;
            }
        }
        RayResult {
            pixel: acc.pixel(),
            samples: taken,
            early,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/volume/kernels.rs"]
mod tests;
