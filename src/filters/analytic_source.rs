use std::sync::{Arc, Mutex};

use crate::array::AosArray;
use crate::dataset::ImageData;
use crate::foundation::core::Extent;
use crate::foundation::error::VoxflowResult;
use crate::pipeline::algorithm::{Algorithm, requested_extent, set_output};
use crate::pipeline::fingerprint::{Fingerprint, StableHasher};
use crate::pipeline::information::Information;
use crate::pipeline::keys::{
    CAN_PRODUCE_SUB_EXTENT, MAXIMUM_NUMBER_OF_PIECES, ORIGIN, SPACING, WHOLE_EXTENT,
};
use crate::smp::{self, SmpContext};

/// Name of the produced scalar array.
pub const ANALYTIC_SCALARS: &str = "RTData";

/// Wavelet-style image source.
///
/// `v(i,j,k) = max * exp(-r² / 2σ²) + mx sin(fx x) + my sin(fy y) + mz cos(fz z)`, with
/// `(x, y, z)` the index offset from `center` scaled by the inverse whole-extent length.
/// Only the requested extent is generated.
#[derive(Clone, Debug)]
pub struct AnalyticImageSource {
    /// Extent the source can produce.
    pub whole_extent: Extent,
    /// Index-space centre of the Gaussian.
    pub center: [f64; 3],
    /// Peak of the Gaussian.
    pub maximum: f64,
    /// Gaussian standard deviation (normalized units).
    pub standard_deviation: f64,
    /// Frequencies of the per-axis waves.
    pub frequency: [f64; 3],
    /// Magnitudes of the per-axis waves.
    pub magnitude: [f64; 3],
    ctx: Option<Arc<SmpContext>>,
    requests: Arc<Mutex<Vec<Extent>>>,
}

impl Default for AnalyticImageSource {
    fn default() -> Self {
        Self::new(Extent::new(-10, 10, -10, 10, -10, 10))
    }
}

impl AnalyticImageSource {
    /// Source over `whole_extent`, centred at its middle.
    pub fn new(whole_extent: Extent) -> Self {
        let center = [0, 1, 2].map(|a| {
            let (lo, hi) = whole_extent.axis(a);
            (f64::from(lo) + f64::from(hi)) / 2.0
        });
        Self {
            whole_extent,
            center,
            maximum: 255.0,
            standard_deviation: 0.5,
            frequency: [60.0, 30.0, 40.0],
            magnitude: [10.0, 18.0, 5.0],
            ctx: None,
            requests: Arc::default(),
        }
    }

    /// Cube `[0, n-1]³`.
    pub fn cube(n: i32) -> Self {
        Self::new(Extent::new(0, n - 1, 0, n - 1, 0, n - 1))
    }

    /// Builder: run on `ctx` instead of the global SMP context.
    pub fn with_context(mut self, ctx: Arc<SmpContext>) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Extents generated so far, oldest first.
    pub fn requested_extents(&self) -> Vec<Extent> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Value at index `ijk`.
    pub fn value(&self, ijk: [i32; 3]) -> f64 {
        let mut sum = 0.0;
        let mut pos = [0.0; 3];
        for a in 0..3 {
            let (lo, hi) = self.whole_extent.axis(a);
            let scale = if hi > lo { 1.0 / f64::from(hi - lo) } else { 1.0 };
            pos[a] = scale * (f64::from(ijk[a]) - self.center[a]);
            sum += pos[a] * pos[a];
        }
        let sigma = self.standard_deviation;
        let gauss = self.maximum * (-sum / (2.0 * sigma * sigma)).exp();
        gauss
            + self.magnitude[0] * (self.frequency[0] * pos[0]).sin()
            + self.magnitude[1] * (self.frequency[1] * pos[1]).sin()
            + self.magnitude[2] * (self.frequency[2] * pos[2]).cos()
    }

    fn generate(&self, ext: Extent) -> VoxflowResult<ImageData> {
        let mut values = AosArray::<f32>::zeros(ext.num_points(), 1)?.named(ANALYTIC_SCALARS);
        let ctx = match &self.ctx {
            Some(c) => Arc::clone(c),
            None => smp::global(),
        };
        ctx.parallel_for_slice_mut(values.as_mut_slice(), 0, |off, chunk, _| {
            for (i, v) in chunk.iter_mut().enumerate() {
                *v = self.value(ext.point_ijk(off + i)) as f32;
            }
            Ok(())
        })?;
        values.modified();
        let mut img = ImageData::new(ext);
        img.set_scalars(Arc::new(values))?;
        Ok(img)
    }
}

impl Algorithm for AnalyticImageSource {
    fn name(&self) -> &str {
        "analytic_image_source"
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        let mut h = StableHasher::new();
        h.write_str("analytic_image_source");
        for v in self.whole_extent.0 {
            h.write_i64(i64::from(v));
        }
        for v in self
            .center
            .iter()
            .chain(&self.frequency)
            .chain(&self.magnitude)
            .chain([&self.maximum, &self.standard_deviation])
        {
            h.write_f64(*v);
        }
        Some(h.finish())
    }

    fn request_information(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let out = &mut outputs[0];
        out.set(&WHOLE_EXTENT, self.whole_extent);
        out.set(&ORIGIN, [0.0; 3]);
        out.set(&SPACING, [1.0; 3]);
        out.set(&CAN_PRODUCE_SUB_EXTENT, true);
        out.set(&MAXIMUM_NUMBER_OF_PIECES, -1);
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn request_data(
        &mut self,
        _inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let ext = requested_extent(&outputs[0])
            .unwrap_or(self.whole_extent)
            .intersect(self.whole_extent);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ext);
        tracing::debug!(%ext, "generating analytic image");
        let img = self.generate(ext)?;
        set_output(outputs, 0, img)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/analytic_source.rs"]
mod tests;
