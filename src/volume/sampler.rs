//! Scalar reconstruction on a regular grid.

use std::sync::Arc;

use crate::dataset::ImageData;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::smp::SmpContext;
use crate::volume::camera::Vec3;
use crate::volume::property::Interpolation;

/// First component of an image's active scalars, copied to `f32` for sampling.
#[derive(Clone, Debug)]
pub struct SampledVolume {
    dims: [usize; 3],
    origin: Vec3,
    spacing: Vec3,
    values: Arc<Vec<f32>>,
    range: (f64, f64),
}

impl SampledVolume {
    /// Copy the active scalars of `img` (component 0).
    pub fn from_image(ctx: &SmpContext, img: &ImageData) -> VoxflowResult<Self> {
        let scalars = img
            .scalars()
            .ok_or_else(|| VoxflowError::bad_input("volume has no active scalars"))?;
        let spacing = img.spacing();
        if spacing.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(VoxflowError::bad_input(format!(
                "volume spacing must be positive, got {spacing:?}"
            )));
        }
        let ext = img.extent();
        let n = ext.num_points();
        let mut values = Vec::new();
        values
            .try_reserve_exact(n)
            .map_err(|_| VoxflowError::out_of_memory(format!("{n} volume samples")))?;
        values.resize(n, 0.0f32);
        ctx.parallel_for_slice_mut(&mut values, 0, |off, chunk, _| {
            for (i, v) in chunk.iter_mut().enumerate() {
                *v = scalars.component(off + i, 0) as f32;
            }
            Ok(())
        })?;
        let origin = img.origin();
        let lo = [ext.0[0], ext.0[2], ext.0[4]];
        Ok(Self {
            dims: ext.dimensions(),
            origin: [0, 1, 2].map(|a| origin[a] + f64::from(lo[a]) * spacing[a]),
            spacing,
            values: Arc::new(values),
            range: scalars.finite_range(0),
        })
    }

    /// Volume from raw samples (x fastest) with origin 0 and unit spacing.
    pub fn from_values(dims: [usize; 3], values: Vec<f32>) -> VoxflowResult<Self> {
        let n = dims[0] * dims[1] * dims[2];
        if values.len() != n {
            return Err(VoxflowError::bad_input(format!(
                "expected {n} samples for dims {dims:?}, got {}",
                values.len()
            )));
        }
        let range = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(crate::array::EMPTY_RANGE, |(lo, hi), &v| {
                (lo.min(f64::from(v)), hi.max(f64::from(v)))
            });
        Ok(Self {
            dims,
            origin: [0.0; 3],
            spacing: [1.0; 3],
            values: Arc::new(values),
            range,
        })
    }

    /// Points per axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Finite scalar range of the samples (inverted when there is none).
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// `[x0, x1, y0, y1, z0, z1]` in world coordinates.
    pub fn bounds(&self) -> [f64; 6] {
        let mut b = [0.0; 6];
        for a in 0..3 {
            b[2 * a] = self.origin[a];
            b[2 * a + 1] = self.origin[a] + self.dims[a].saturating_sub(1) as f64 * self.spacing[a];
        }
        b
    }

    /// World position → continuous voxel coordinates.
    pub fn to_voxel(&self, p: Vec3) -> Vec3 {
        [0, 1, 2].map(|a| (p[a] - self.origin[a]) / self.spacing[a])
    }

    fn at(&self, i: usize, j: usize, k: usize) -> f64 {
        f64::from(self.values[i + self.dims[0] * (j + self.dims[1] * k)])
    }

    fn inside(&self, u: Vec3) -> bool {
        (0..3).all(|a| u[a] >= 0.0 && u[a] <= self.dims[a].saturating_sub(1) as f64)
    }

    /// Scalar at voxel coordinates `u`, or `None` outside the grid.
    pub fn sample(&self, u: Vec3, interpolation: Interpolation) -> Option<f64> {
        if self.values.is_empty() || !self.inside(u) {
            return None;
        }
        match interpolation {
            Interpolation::Nearest => {
                let ijk = [0, 1, 2].map(|a| nearest(u[a], self.dims[a]));
                Some(self.at(ijk[0], ijk[1], ijk[2]))
            }
            Interpolation::Linear => Some(self.trilinear(u)),
        }
    }

    fn trilinear(&self, u: Vec3) -> f64 {
        let mut base = [0usize; 3];
        let mut frac = [0.0; 3];
        for a in 0..3 {
            if self.dims[a] < 2 {
                continue;
            }
            let i = (u[a].floor() as usize).min(self.dims[a] - 2);
            base[a] = i;
            frac[a] = u[a] - i as f64;
        }
        let step = [0, 1, 2].map(|a| usize::from(self.dims[a] > 1));
        let mut acc = 0.0;
        for corner in 0..8usize {
            let mut w = 1.0;
            let mut idx = [0usize; 3];
            for a in 0..3 {
                let hi = (corner >> a) & 1 == 1;
                idx[a] = base[a] + if hi { step[a] } else { 0 };
                w *= if hi { frac[a] } else { 1.0 - frac[a] };
            }
            if w == 0.0 {
                continue;
            }
            acc += w * self.at(idx[0], idx[1], idx[2]);
        }
        acc
    }

    /// Central-difference gradient (per world unit) at the voxel nearest to `u`.
    pub fn gradient(&self, u: Vec3) -> Vec3 {
        let ijk = [0, 1, 2].map(|a| nearest(u[a].max(0.0), self.dims[a]));
        let mut g = [0.0; 3];
        for a in 0..3 {
            let n = self.dims[a];
            if n < 2 {
                continue;
            }
            let (lo, hi) = (ijk[a].saturating_sub(1), (ijk[a] + 1).min(n - 1));
            let mut p = ijk;
            p[a] = hi;
            let fwd = self.at(p[0], p[1], p[2]);
            p[a] = lo;
            let back = self.at(p[0], p[1], p[2]);
            g[a] = (fwd - back) / ((hi - lo) as f64 * self.spacing[a]);
        }
        g
    }
}

/// Nearest index for coordinate `u` on an axis of `n` points; exact halves go down.
fn nearest(u: f64, n: usize) -> usize {
    let i = (u - 0.5).ceil().max(0.0) as usize;
    i.min(n.saturating_sub(1))
}

#[cfg(test)]
#[path = "../../tests/unit/volume/sampler.rs"]
mod tests;
