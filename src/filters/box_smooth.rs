use std::sync::Arc;

use crate::array::AosArray;
use crate::dataset::{DataKind, ImageData};
use crate::foundation::core::Extent;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::algorithm::{
    Algorithm, InputPortSpec, as_image, input_object, requested_extent, set_output,
};
use crate::pipeline::fingerprint::{Fingerprint, StableHasher};
use crate::pipeline::information::Information;
use crate::smp;

/// Mean over a `(2r+1)` box around each point of the active scalars.
///
/// Declares a stencil of `radius`, so its input request is the output request grown by
/// `radius` and clamped to the whole extent. Boxes are clipped at the data boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBoxSmooth {
    /// Half-width of the box in points.
    pub radius: i32,
}

impl ImageBoxSmooth {
    /// Box of half-width `radius` (negative values act as `0`).
    pub fn new(radius: i32) -> Self {
        Self {
            radius: radius.max(0),
        }
    }
}

impl Default for ImageBoxSmooth {
    fn default() -> Self {
        Self::new(1)
    }
}

fn smooth(input: &ImageData, out_ext: Extent, radius: i32) -> VoxflowResult<ImageData> {
    let scalars = input
        .scalars()
        .ok_or_else(|| VoxflowError::bad_input("box smoothing needs active scalars"))?;
    let comps = scalars.number_of_components();
    let in_ext = input.extent();
    let mut values = AosArray::<f64>::zeros(out_ext.num_points(), comps)?.named(scalars.name());

    smp::global().parallel_for_slice_mut(values.as_mut_slice(), 0, |off, chunk, _| {
        for (n, v) in chunk.iter_mut().enumerate() {
            let flat = off + n;
            let (pt, comp) = (flat / comps, flat % comps);
            let centre = out_ext.point_ijk(pt);
            let lo = [0, 1, 2].map(|a| (centre[a] - radius).max(in_ext.axis(a).0));
            let hi = [0, 1, 2].map(|a| (centre[a] + radius).min(in_ext.axis(a).1));
            let mut sum = 0.0;
            let mut count = 0u32;
            for k in lo[2]..=hi[2] {
                for j in lo[1]..=hi[1] {
                    for i in lo[0]..=hi[0] {
                        sum += scalars.component(in_ext.point_index([i, j, k]), comp);
                        count += 1;
                    }
                }
            }
            *v = if count > 0 { sum / f64::from(count) } else { 0.0 };
        }
        Ok(())
    })?;
    values.modified();

    let mut out = ImageData::new(out_ext).with_geometry(input.origin(), input.spacing());
    out.set_scalars(Arc::new(values))?;
    Ok(out)
}

impl Algorithm for ImageBoxSmooth {
    fn name(&self) -> &str {
        "image_box_smooth"
    }

    fn input_ports(&self) -> Vec<InputPortSpec> {
        vec![InputPortSpec::new("input", &[DataKind::Image])]
    }

    fn stencil_width(&self) -> i32 {
        self.radius
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        let mut h = StableHasher::new();
        h.write_str("image_box_smooth");
        h.write_i64(i64::from(self.radius));
        Some(h.finish())
    }

    fn request_data(
        &mut self,
        inputs: &[Vec<Information>],
        outputs: &mut [Information],
    ) -> VoxflowResult<()> {
        let input = input_object(inputs, 0, 0)?;
        let img = as_image(&input)?;
        let out_ext = requested_extent(&outputs[0])
            .unwrap_or(img.extent())
            .intersect(img.extent());
        if out_ext.is_empty() {
            return set_output(outputs, 0, img.crop(Extent::EMPTY)?);
        }
        set_output(outputs, 0, smooth(img, out_ext, self.radius)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/box_smooth.rs"]
mod tests;
